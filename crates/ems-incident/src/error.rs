use ems_core::{CoreError, SimTime};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IncidentError {
    #[error("incident received {call_received} has no {field} timestamp")]
    MissingTimestamp {
        call_received: SimTime,
        field:         &'static str,
    },

    #[error("aborted incident received {call_received} was available again at {available}, before the call")]
    AbortedBeforeCall {
        call_received: SimTime,
        available:     SimTime,
    },

    #[error("incident parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type IncidentResult<T> = Result<T, IncidentError>;
