//! The historical incident record.
//!
//! An [`Incident`] is what the dispatch centre logged for one call.  It is
//! never mutated.  Durations the simulation needs (dispatch delay, time on
//! scene, time before an aborted job ended) are derived on demand; each has
//! a precondition on which timestamps are present, and asking for a
//! duration whose inputs are missing is an error rather than a guess.

use ems_core::{Coordinate, SimTime};

use crate::{IncidentError, IncidentResult, UrgencyLevel};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Incident {
    pub call_received:             SimTime,
    pub location:                  Coordinate,
    pub urgency:                   UrgencyLevel,
    pub dispatched:                SimTime,
    pub arrival_at_scene:          Option<SimTime>,
    pub departure_from_scene:      Option<SimTime>,
    /// When the transporting unit reached the hospital, if logged.
    pub arrival_at_hospital:       Option<SimTime>,
    /// When the non-transporting resources were free again.
    pub available_non_transport:   SimTime,
    /// When the transporting resources were free again.
    pub available_transport:       SimTime,
    pub non_transporting_vehicles: u32,
    pub transporting_vehicles:     u32,
}

impl Incident {
    /// Seconds between the call and the historical dispatch.
    pub fn dispatch_delay(&self) -> i64 {
        self.dispatched - self.call_received
    }

    /// Seconds between arriving at and leaving the scene.
    pub fn time_at_scene(&self) -> IncidentResult<i64> {
        let arrival = self.require(self.arrival_at_scene, "arrival at scene")?;
        let departure = self.require(self.departure_from_scene, "departure from scene")?;
        Ok(departure - arrival)
    }

    /// Seconds on scene for a job that ended without transport: from arrival
    /// until the resources were available again.  When the recorded
    /// non-transport availability precedes the arrival, the transport
    /// availability is used instead.
    pub fn time_at_scene_non_transport(&self) -> IncidentResult<i64> {
        let arrival = self.require(self.arrival_at_scene, "arrival at scene")?;
        let available = if arrival > self.available_non_transport {
            self.available_transport
        } else {
            self.available_non_transport
        };
        Ok(available - arrival)
    }

    /// Seconds from the call until an aborted job (no arrival recorded)
    /// released its resources.
    pub fn time_before_aborting(&self) -> IncidentResult<i64> {
        if self.call_received > self.available_non_transport {
            return Err(IncidentError::AbortedBeforeCall {
                call_received: self.call_received,
                available:     self.available_non_transport,
            });
        }
        Ok(self.available_non_transport - self.call_received)
    }

    /// `true` if the record shows the patient leaving the scene, i.e. the
    /// transport leg of the job is known from history.
    #[inline]
    pub fn has_transport_path(&self) -> bool {
        self.departure_from_scene.is_some()
    }

    /// `true` if no unit ever reached the scene.
    #[inline]
    pub fn is_aborted(&self) -> bool {
        self.arrival_at_scene.is_none()
    }

    /// Seconds the transporting unit stays at the hospital.  With `historic`
    /// set, the logged stay from hospital arrival to availability is used
    /// when it is present and not negative; otherwise the median handover
    /// for the urgency.
    pub fn hospital_time(&self, historic: bool) -> i64 {
        match self.arrival_at_hospital {
            Some(arrival) if historic && arrival <= self.available_transport => self.available_transport - arrival,
            _ => self.urgency.hospital_handover_secs(),
        }
    }

    /// Total number of vehicles the incident asked for.
    #[inline]
    pub fn demand(&self) -> u32 {
        self.non_transporting_vehicles + self.transporting_vehicles
    }

    fn require(&self, value: Option<SimTime>, field: &'static str) -> IncidentResult<SimTime> {
        value.ok_or(IncidentError::MissingTimestamp { call_received: self.call_received, field })
    }
}
