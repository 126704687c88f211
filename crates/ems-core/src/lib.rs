//! `ems-core` — foundational types for the ambulance allocation toolkit.
//!
//! Every other `ems-*` crate depends on this one.  It holds the value types
//! that both the simulation engine and the optimizers speak: identifiers,
//! the time model, the spatial grid, the static station table, and the
//! two-shift `Allocation` chromosome.
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `StationId`, `AmbulanceId`, `IncidentId`, `HospitalId`|
//! | [`time`]        | `SimTime`, `ShiftType`                                |
//! | [`grid`]        | `Coordinate` (grid-snapped UTM cell)                  |
//! | [`station`]     | `BaseStation`, `StationTable`                         |
//! | [`allocation`]  | `Allocation` (one station list per shift)             |
//! | [`rng`]         | `SearchRng`                                           |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids, time and shift types.|

pub mod allocation;
pub mod error;
pub mod grid;
pub mod ids;
pub mod rng;
pub mod station;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use allocation::Allocation;
pub use error::{CoreError, CoreResult};
pub use grid::Coordinate;
pub use ids::{AmbulanceId, HospitalId, IncidentId, StationId};
pub use rng::SearchRng;
pub use station::{BaseStation, StationTable};
pub use time::{ShiftType, SimTime};
