//! `ems-spatial` — travel times, routes and hospital lookup.
//!
//! The simulation never computes travel times itself; it asks a
//! [`DistanceOracle`].  Two implementations ship here:
//!
//! | Type                  | Use                                                |
//! |-----------------------|----------------------------------------------------|
//! | [`RouteTable`]        | Precomputed cell-to-cell tables with logged fallback |
//! | [`StraightLineOracle`]| Constant-speed straight-line model (tests, demos)  |
//!
//! [`HospitalIndex`] answers "nearest emergency hospital" with an R-tree.

pub mod error;
pub mod hospital;
pub mod oracle;
pub mod straight_line;
pub mod table;


pub use error::{SpatialError, SpatialResult};
pub use hospital::{Hospital, HospitalIndex};
pub use oracle::{DistanceOracle, Route};
pub use straight_line::StraightLineOracle;
pub use table::{RouteTable, DEFAULT_ROUTE_SECS, DEFAULT_TRAVEL_SECS};
