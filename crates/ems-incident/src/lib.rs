//! `ems-incident` — the historical incident stream.
//!
//! | Module        | Contents                                               |
//! |---------------|--------------------------------------------------------|
//! | [`urgency`]   | `UrgencyLevel`, survival estimate                      |
//! | [`incident`]  | `Incident` record and its derived durations            |
//! | [`history`]   | `IncidentLog` — time-ordered, immutable incident list  |
//! | [`demand`]    | `DemandTable` — average calls per cell and hour-of-week|
//! | [`loader`]    | CSV loader with skip-and-report recovery               |

pub mod demand;
pub mod error;
pub mod history;
pub mod incident;
pub mod loader;
pub mod urgency;

#[cfg(test)]
mod tests;

pub use demand::DemandTable;
pub use error::{IncidentError, IncidentResult};
pub use history::IncidentLog;
pub use incident::Incident;
pub use loader::{load_incidents_csv, load_incidents_reader, LoadReport};
pub use urgency::UrgencyLevel;
