//! The memetic layer: local-search improvement of offspring.

use ems_core::SearchRng;

use crate::neighborhood::best_neighbor;
use crate::{
    EvolutionStrategy, GaConfig, GeneticAlgorithm, NeighborhoodKind, OptimResult, Optimizer, Problem, RunStatistics,
    Solution,
};

impl EvolutionStrategy {
    /// Look one greedy step ahead of `individual` and, if the best neighbor
    /// is strictly fitter, take over its fitness (Baldwinian) or the
    /// neighbor itself (Lamarckian).
    pub fn improve(self, individual: &mut Solution, neighborhood: NeighborhoodKind, problem: &Problem) -> OptimResult<()> {
        if self == EvolutionStrategy::Darwinian {
            return Ok(());
        }
        let current = individual.fitness(problem.fitness())?;
        let Some(best) = best_neighbor(individual, neighborhood, problem)? else {
            return Ok(());
        };
        let best_fitness = best.rank_key();
        if best_fitness >= current {
            return Ok(());
        }
        match self {
            EvolutionStrategy::Darwinian  => {}
            EvolutionStrategy::Baldwinian => individual.adopt_fitness(best_fitness),
            EvolutionStrategy::Lamarckian => *individual = best,
        }
        Ok(())
    }
}

/// How offspring are improved, if at all.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Improvement {
    pub strategy:     EvolutionStrategy,
    pub neighborhood: NeighborhoodKind,
}

impl Improvement {
    /// Improve `individual` with the configured probability.
    pub fn apply(self, individual: &mut Solution, probability: f64, problem: &Problem, rng: &mut SearchRng) -> OptimResult<()> {
        if rng.gen_bool(probability) {
            self.strategy.improve(individual, self.neighborhood, problem)?;
        }
        Ok(())
    }
}

/// A genetic algorithm whose offspring get a local-search improvement with
/// `GaConfig::improve_probability`.
pub struct MemeticAlgorithm {
    ga: GeneticAlgorithm,
}

impl MemeticAlgorithm {
    pub fn new(
        problem:      Problem,
        config:       GaConfig,
        strategy:     EvolutionStrategy,
        neighborhood: NeighborhoodKind,
    ) -> OptimResult<Self> {
        let improvement = Improvement { strategy, neighborhood };
        Ok(Self { ga: GeneticAlgorithm::build(problem, config, Some(improvement))? })
    }

    pub fn population(&self) -> &crate::Population {
        self.ga.population()
    }
}

impl Optimizer for MemeticAlgorithm {
    fn optimize(&mut self) -> OptimResult<()> {
        self.ga.optimize()
    }

    fn optimal_solution(&self) -> Option<&Solution> {
        self.ga.optimal_solution()
    }

    fn run_statistics(&self) -> &RunStatistics {
        self.ga.run_statistics()
    }

    fn abbreviation(&self) -> &'static str {
        self.ga.abbreviation()
    }
}
