//! Fitness functions.
//!
//! Lower is better everywhere.  [`SimulationFitness`] replays the configured
//! incident window against an allocation; tests and experiments can plug in
//! any other [`FitnessFunction`].

use std::sync::Arc;

use tracing::trace;

use ems_core::Allocation;
use ems_incident::UrgencyLevel;
use ems_sim::{SimConfig, SimulationResults, Simulator};

use crate::{ConstraintStrategy, FitnessConfig, OptimError, OptimResult};

pub trait FitnessFunction: Send + Sync {
    fn evaluate(&self, allocation: &Allocation) -> OptimResult<f64>;

    /// Fitness together with the per-urgency [`Objectives`], from a single
    /// evaluation.  Needed by the multi-objective search only.
    fn evaluate_objectives(&self, allocation: &Allocation) -> OptimResult<(f64, Objectives)> {
        let _ = allocation;
        Err(OptimError::Config("fitness function has no per-urgency objectives".into()))
    }
}

// ── Objectives ────────────────────────────────────────────────────────────────

/// Average response times (seconds) of the acute and the urgent calls, both
/// minimized.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Objectives {
    pub acute:  f64,
    pub urgent: f64,
}

impl Objectives {
    pub const fn new(acute: f64, urgent: f64) -> Self {
        Self { acute, urgent }
    }

    /// No worse on either objective and strictly better on one.
    pub fn dominates(&self, other: &Self) -> bool {
        self.acute <= other.acute
            && self.urgent <= other.urgent
            && (self.acute < other.acute || self.urgent < other.urgent)
    }

    #[inline]
    pub fn values(&self) -> [f64; 2] {
        [self.acute, self.urgent]
    }
}

/// Simulation-based fitness:
///
/// ```text
/// base    = use_urgency_fitness ? 1 − average survival : average response (s)
/// fitness = base + capacity violations × penalty factor   (Penalty strategy only)
/// ```
pub struct SimulationFitness {
    simulator:  Arc<Simulator>,
    sim_config: SimConfig,
    config:     FitnessConfig,
}

impl SimulationFitness {
    pub fn new(simulator: Arc<Simulator>, sim_config: SimConfig, config: FitnessConfig) -> OptimResult<Self> {
        sim_config.validate()?;
        Ok(Self { simulator, sim_config, config })
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    pub fn sim_config(&self) -> &SimConfig {
        &self.sim_config
    }

    pub fn config(&self) -> &FitnessConfig {
        &self.config
    }

    fn simulate(&self, allocation: &Allocation) -> OptimResult<SimulationResults> {
        self.simulator
            .simulate(allocation, &self.sim_config)
            .map_err(|source| OptimError::Simulation { allocation: allocation.clone(), source })
    }

    fn fitness_of(&self, results: &SimulationResults, allocation: &Allocation) -> OptimResult<f64> {
        let base = if self.config.use_urgency_fitness {
            1.0 - results.average_survival_rate().ok_or(OptimError::NoResponses)?
        } else {
            results.average_response_secs().ok_or(OptimError::NoResponses)?
        };
        let violations = match self.config.constraint_strategy {
            ConstraintStrategy::Penalty => allocation.capacity_violations(self.simulator.stations()),
            ConstraintStrategy::None | ConstraintStrategy::Repair => 0,
        };
        let fitness = base + violations as f64 * self.config.penalty_factor();
        trace!(responses = results.len(), base, violations, fitness, "evaluated allocation");
        Ok(fitness)
    }
}

impl FitnessFunction for SimulationFitness {
    fn evaluate(&self, allocation: &Allocation) -> OptimResult<f64> {
        let results = self.simulate(allocation)?;
        self.fitness_of(&results, allocation)
    }

    fn evaluate_objectives(&self, allocation: &Allocation) -> OptimResult<(f64, Objectives)> {
        let results = self.simulate(allocation)?;
        let fitness = self.fitness_of(&results, allocation)?;
        let average = |urgency| results.average_response_secs_for(urgency).ok_or(OptimError::NoResponses);
        let objectives = Objectives::new(average(UrgencyLevel::Acute)?, average(UrgencyLevel::Urgent)?);
        Ok((fitness, objectives))
    }
}
