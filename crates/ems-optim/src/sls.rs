//! Stochastic local search over a single solution.
//!
//! Each step does one of:
//!
//! | Probability                        | Step                                      |
//! |------------------------------------|-------------------------------------------|
//! | `restart_probability`              | replace with a uniformly random solution   |
//! | `(1 − restart) × noise_probability` | move to a random forward neighbor          |
//! | otherwise                          | greedy move to the best neighbor           |
//!
//! The best solution seen is kept; the search stops after `max_tries` steps
//! or once the time budget is used up.

use std::time::Instant;

use tracing::{debug, info};

use ems_core::SearchRng;

use crate::initializer::Random;
use crate::neighborhood::{greedy_step, noise_step, restart_step};
use crate::{OptimResult, Optimizer, Problem, RunStatistics, SlsConfig, Solution};

pub struct StochasticLocalSearch {
    problem:    Problem,
    config:     SlsConfig,
    best:       Option<Solution>,
    statistics: RunStatistics,
}

impl StochasticLocalSearch {
    pub fn new(problem: Problem, config: SlsConfig) -> OptimResult<Self> {
        config.validate()?;
        Ok(Self { problem, config, best: None, statistics: RunStatistics::default() })
    }

    pub fn config(&self) -> &SlsConfig {
        &self.config
    }
}

impl Optimizer for StochasticLocalSearch {
    fn optimize(&mut self) -> OptimResult<()> {
        self.statistics.clear();
        self.best = None;
        let started = Instant::now();
        let mut rng = SearchRng::new(self.config.seed);
        let fitness = self.problem.fitness();
        let station_count = self.problem.station_count();

        let mut current = self.problem.admit(Solution::new(self.problem.generate(&Random, &mut rng)))?;
        let mut best_fitness = current.fitness(fitness)?;
        let mut best = current.clone();
        info!(optimizer = "SLS", initial = best_fitness, max_tries = self.config.max_tries, "starting");

        for step in 0..self.config.max_tries {
            if started.elapsed() >= self.config.max_running_time {
                info!(optimizer = "SLS", step, "time budget used up");
                break;
            }
            if rng.gen_bool(self.config.restart_probability) {
                restart_step(&mut current, &self.problem, &mut rng);
                debug!(step, "restart");
            } else if rng.gen_bool(self.config.noise_probability) {
                noise_step(&mut current, station_count, &mut rng);
            } else {
                greedy_step(&mut current, self.config.neighborhood, &self.problem)?;
            }
            current = self.problem.admit(current)?;

            let current_fitness = current.fitness(fitness)?;
            if current_fitness < best_fitness {
                best_fitness = current_fitness;
                best = current.clone();
            }
            self.statistics.record(best_fitness, current_fitness, None);
            if step % 100 == 0 {
                info!(optimizer = "SLS", step, best = best_fitness, current = current_fitness, "step");
            }
        }

        self.statistics.elapsed = started.elapsed();
        info!(
            optimizer = "SLS",
            steps = self.statistics.generations(),
            best = best_fitness,
            elapsed_secs = self.statistics.elapsed.as_secs_f64(),
            "finished"
        );
        self.best = Some(best);
        Ok(())
    }

    fn optimal_solution(&self) -> Option<&Solution> {
        self.best.as_ref()
    }

    fn run_statistics(&self) -> &RunStatistics {
        &self.statistics
    }

    fn abbreviation(&self) -> &'static str {
        "SLS"
    }
}
