//! The search problem shared by all optimizers.

use std::sync::Arc;

use ems_core::{Allocation, SearchRng, ShiftType, StationTable};
use ems_sim::{SimConfig, Simulator};
use ems_spatial::DistanceOracle;

use crate::{ConstraintStrategy, FitnessConfig, FitnessFunction, Initializer, OptimResult, SimulationFitness, Solution};

/// Stations, travel times, fitness and allocation size of one optimization.
///
/// Cheap to clone; everything heavy sits behind an `Arc` and is shared by
/// all worker threads.
#[derive(Clone)]
pub struct Problem {
    stations:            Arc<StationTable>,
    oracle:              Arc<dyn DistanceOracle>,
    fitness:             Arc<dyn FitnessFunction>,
    ambulances:          [usize; 2],
    constraint_strategy: ConstraintStrategy,
}

impl Problem {
    pub fn new(
        stations:            Arc<StationTable>,
        oracle:              Arc<dyn DistanceOracle>,
        fitness:             Arc<dyn FitnessFunction>,
        ambulances_day:      usize,
        ambulances_night:    usize,
        constraint_strategy: ConstraintStrategy,
    ) -> Self {
        Self {
            stations,
            oracle,
            fitness,
            ambulances: [ambulances_day, ambulances_night],
            constraint_strategy,
        }
    }

    /// Optimize allocations against `simulator` replaying `sim_config`.
    /// Shift sizes are taken from the simulation config.
    pub fn from_simulation(simulator: Arc<Simulator>, sim_config: SimConfig, config: FitnessConfig) -> OptimResult<Self> {
        let stations = simulator.shared_stations();
        let oracle = simulator.shared_oracle();
        let (day, night) = (sim_config.ambulances_day, sim_config.ambulances_night);
        let strategy = config.constraint_strategy;
        let fitness = SimulationFitness::new(simulator, sim_config, config)?;
        Ok(Self::new(stations, oracle, Arc::new(fitness), day, night, strategy))
    }

    pub fn stations(&self) -> &StationTable {
        &self.stations
    }

    #[inline]
    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn oracle(&self) -> &dyn DistanceOracle {
        self.oracle.as_ref()
    }

    pub fn fitness(&self) -> &dyn FitnessFunction {
        self.fitness.as_ref()
    }

    /// Ambulances on `shift`.
    pub fn ambulances(&self, shift: ShiftType) -> usize {
        self.ambulances[shift.index()]
    }

    pub fn constraint_strategy(&self) -> ConstraintStrategy {
        self.constraint_strategy
    }

    /// A fresh allocation of the right size from `initializer`.
    pub fn generate(&self, initializer: &dyn Initializer, rng: &mut SearchRng) -> Allocation {
        let [day, night] = ShiftType::ALL.map(|shift| initializer.initialize(self.ambulances(shift), &self.stations, rng));
        Allocation::new(day, night)
    }

    /// Apply the constraint strategy to a solution about to join a
    /// population.
    pub fn admit(&self, mut solution: Solution) -> OptimResult<Solution> {
        if self.constraint_strategy == ConstraintStrategy::Repair {
            solution.conform_to_constraints(&self.stations, self.oracle.as_ref())?;
        }
        Ok(solution)
    }
}
