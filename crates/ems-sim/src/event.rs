//! Simulation events.

use ems_core::{AmbulanceId, IncidentId};
use ems_incident::Incident;

/// A request for vehicles at one incident.  A call that could only be
/// partly served is re-queued with the demand still open.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub incident:             IncidentId,
    pub transport_demand:     u32,
    pub non_transport_demand: u32,
    /// Whether serving this call records a response time.
    pub measurable:           bool,
}

impl Call {
    /// The call an incident raises.  An incident that asked for no vehicle is
    /// served by a single non-transporting unit.
    pub fn from_incident(id: IncidentId, incident: &Incident, measurable: bool) -> Self {
        let (transport, non_transport) = match incident.demand() {
            0 => (0, 1),
            _ => (incident.transporting_vehicles, incident.non_transporting_vehicles),
        };
        Self { incident: id, transport_demand: transport, non_transport_demand: non_transport, measurable }
    }

    #[inline]
    pub fn demand(&self) -> u32 {
        self.transport_demand + self.non_transport_demand
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    NewCall(Call),
    /// The units at an incident leave the scene.
    SceneDeparture {
        incident:   IncidentId,
        ambulances: Vec<AmbulanceId>,
    },
    /// One unit finishes its part of a job.
    JobCompletion {
        incident:  IncidentId,
        ambulance: AmbulanceId,
    },
    /// Advance a moving unit.  Ignored unless `epoch` is the unit's current
    /// movement epoch.
    LocationUpdate {
        ambulance: AmbulanceId,
        epoch:     u32,
    },
}

/// Payload-free discriminant of [`Event`], for observers and errors.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    NewCall,
    SceneDeparture,
    JobCompletion,
    LocationUpdate,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::NewCall(_)             => EventKind::NewCall,
            Event::SceneDeparture { .. }  => EventKind::SceneDeparture,
            Event::JobCompletion { .. }   => EventKind::JobCompletion,
            Event::LocationUpdate { .. }  => EventKind::LocationUpdate,
        }
    }
}
