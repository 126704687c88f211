//! `ems-sim` — discrete-event replay of an incident history against one
//! ambulance allocation.
//!
//! # Event loop
//!
//! A run seeds one `NewCall` per incident inside `[start − buffer, end)` and
//! then repeatedly pops the earliest event:
//!
//! | Event            | Effect                                                  |
//! |------------------|---------------------------------------------------------|
//! | `NewCall`        | Rank available ambulances, dispatch, queue any shortfall |
//! | `SceneDeparture` | Start hospital transport or release the ambulance        |
//! | `JobCompletion`  | Release the ambulance, serve waiting calls               |
//! | `LocationUpdate` | Move an ambulance along its route                        |
//!
//! Before each event the engine checks for a day/night boundary and starts or
//! finishes shifts per station.
//!
//! Dispatched units start driving once the historical handling delay has
//! passed, less whatever the call already spent waiting.  Units sharing a
//! scene leave together, never before the last of them has arrived.
//!
//! # Sharing
//!
//! A [`Simulator`] owns only read-only data (incident log, oracle, station
//! and hospital tables, demand table) plus an append-only timeline cache, so
//! one instance serves any number of concurrent [`Simulator::simulate`]
//! calls.  Each call builds its own roster and queues.

pub mod ambulance;
pub mod config;
pub mod dispatch;
mod engine;
pub mod error;
pub mod event;
pub mod observer;
pub mod queue;
pub mod results;
pub mod simulator;
pub mod timeline;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use ambulance::{Ambulance, AmbulanceState};
pub use config::{DispatchPolicyKind, SimConfig};
pub use dispatch::{DispatchContext, DispatchKey, DispatchPolicy};
pub use error::{SimError, SimResult};
pub use event::{Call, Event, EventKind};
pub use observer::{NoopObserver, SimObserver};
pub use queue::{CallQueue, EventQueue};
pub use results::{ResponseRecord, SimulationResults};
pub use simulator::{Simulator, SimulatorBuilder};
pub use timeline::{TimelineCache, TimelineKey};
