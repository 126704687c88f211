use ems_core::{Allocation, CoreError, ShiftType, StationId};
use ems_sim::SimError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptimError {
    #[error("optimizer configuration error: {0}")]
    Config(String),

    #[error("simulating {allocation:?} failed: {source}")]
    Simulation {
        allocation: Allocation,
        #[source]
        source:     SimError,
    },

    #[error("simulation recorded no responses; fitness is undefined")]
    NoResponses,

    #[error("no station has spare capacity for the {shift} shift surplus of {station}")]
    Infeasible {
        shift:   ShiftType,
        station: StationId,
    },

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type OptimResult<T> = Result<T, OptimError>;
