//! `ems-optim` — search for ambulance allocations that minimize the
//! simulated response time (or maximize survival).
//!
//! # Optimizers
//!
//! | Optimizer                          | Abbr. | Search                                             |
//! |------------------------------------|-------|----------------------------------------------------|
//! | [`GeneticAlgorithm`]               | GA    | Elitist generational GA, optional island phase     |
//! | [`MemeticAlgorithm`]               | MA    | GA whose offspring get a local-search improvement  |
//! | [`MultiObjectiveGeneticAlgorithm`] | MOGA  | Non-dominated sorting on acute and urgent response |
//! | [`StochasticLocalSearch`]          | SLS   | Greedy descent with noise and random restarts      |
//!
//! All of them work on a [`Problem`]: the station table, the distance
//! oracle, a [`FitnessFunction`] and the number of ambulances per shift.
//! Fitness is minimized.  The multi-objective search also needs
//! [`FitnessFunction::evaluate_objectives`].
//!
//! # Parallelism
//!
//! Population and neighborhood evaluation, offspring breeding and the island
//! phase run on Rayon.  Each parallel task gets its own child
//! [`SearchRng`](ems_core::SearchRng) derived on the coordinating thread.
//! Offspring enter a shared buffer in completion order, so a GA run is not
//! bit-for-bit reproducible from its seed.

pub mod config;
pub mod error;
pub mod fitness;
pub mod ga;
pub mod initializer;
pub mod memetic;
pub mod neighborhood;
pub mod nsga;
pub mod operators;
pub mod optimizer;
pub mod population;
pub mod problem;
pub mod sls;
pub mod solution;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{
    ConstraintStrategy, EvolutionStrategy, FitnessConfig, GaConfig, InitializerKind, NeighborhoodKind, ParentSelection,
    SlsConfig,
};
pub use error::{OptimError, OptimResult};
pub use fitness::{FitnessFunction, Objectives, SimulationFitness};
pub use ga::GeneticAlgorithm;
pub use initializer::Initializer;
pub use memetic::MemeticAlgorithm;
pub use nsga::MultiObjectiveGeneticAlgorithm;
pub use optimizer::{Optimizer, RunStatistics};
pub use population::{Population, NOVELTY_TOLERANCE};
pub use problem::Problem;
pub use sls::StochasticLocalSearch;
pub use solution::Solution;
