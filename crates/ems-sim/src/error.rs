use ems_core::{AmbulanceId, CoreError, IncidentId, SimTime};
use ems_incident::IncidentError;
use thiserror::Error;

use crate::EventKind;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("{kind:?} event at {current} popped after an event at {previous}")]
    EventOutOfOrder {
        previous: SimTime,
        current:  SimTime,
        kind:     EventKind,
    },

    #[error("negative response time {response_secs} s for {incident} received {call_received}")]
    NegativeResponseTime {
        incident:      IncidentId,
        call_received: SimTime,
        response_secs: i64,
    },

    #[error("{incident}: {source}")]
    Incident {
        incident: IncidentId,
        #[source]
        source:   IncidentError,
    },

    #[error("{0} is not in the incident log")]
    UnknownIncident(IncidentId),

    #[error("{ambulance} cannot {action} while {state}")]
    IllegalTransition {
        ambulance: AmbulanceId,
        state:     &'static str,
        action:    &'static str,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type SimResult<T> = Result<T, SimError>;
