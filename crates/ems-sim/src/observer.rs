//! Simulation observer trait for tracing and data collection.

use ems_core::{ShiftType, SimTime};

use crate::{EventKind, ResponseRecord};

/// Callbacks invoked by [`Simulator::simulate_with`][crate::Simulator::simulate_with]
/// as a run progresses.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example — event counter
///
/// ```rust,ignore
/// struct Counter(usize);
///
/// impl SimObserver for Counter {
///     fn on_event(&mut self, _time: SimTime, _kind: EventKind) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called for every popped event, before it is handled.
    fn on_event(&mut self, _time: SimTime, _kind: EventKind) {}

    /// Called when a response time is recorded.
    fn on_response(&mut self, _record: &ResponseRecord) {}

    /// Called after the engine switched to `shift`.
    fn on_shift_change(&mut self, _time: SimTime, _shift: ShiftType) {}

    /// Called once when the event queue is exhausted.
    fn on_sim_end(&mut self, _last_event: SimTime) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
