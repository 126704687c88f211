//! The generational genetic algorithm.
//!
//! # Generation
//!
//! 1. Sort the population; the `elite_size` fittest are kept.
//! 2. Offspring are bred in parallel: each task runs a tournament (on
//!    fitness, or with novelty breaking near ties), crosses the two
//!    winners, mutates both children (and, in the memetic variant, improves
//!    them) and pushes them into a shared buffer.  The buffer is guarded by
//!    a mutex and never exceeds `population_size − elite_size`.
//! 3. The next generation is the survivors plus the offspring, evaluated in
//!    parallel and truncated to `population_size`.
//!
//! The loop stops between generations once the generation budget or the
//! wall-clock budget is used up.  Statistics are recorded for every
//! generation bred from and once more for the population returned.
//!
//! # Islands
//!
//! With `islands > 0`, that many independent populations first evolve for
//! `generations_per_island` generations in parallel.  Each is reduced to
//! `population_size / islands` and the survivors are merged into the
//! population that then evolves for `max_generations`.
//!
//! # Stagnation
//!
//! When diversity drops below `diversity_limit` and the best fitness has not
//! improved for `diversify_after` generations, every non-elite individual
//! is mutated with `diversify_mutation` per gene and re-evaluated.

use std::time::Instant;

use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{debug, info};

use ems_core::SearchRng;

use crate::memetic::Improvement;
use crate::operators::{crossover, mutate};
use crate::{GaConfig, OptimResult, Optimizer, ParentSelection, Population, Problem, RunStatistics, Solution};

pub struct GeneticAlgorithm {
    problem:     Problem,
    config:      GaConfig,
    improvement: Option<Improvement>,
    label:       &'static str,
    population:  Population,
    statistics:  RunStatistics,
}

impl GeneticAlgorithm {
    pub fn new(problem: Problem, config: GaConfig) -> OptimResult<Self> {
        Self::build(problem, config, None)
    }

    pub(crate) fn build(problem: Problem, config: GaConfig, improvement: Option<Improvement>) -> OptimResult<Self> {
        config.validate()?;
        Ok(Self {
            problem,
            config,
            improvement,
            label: if improvement.is_some() { "MA" } else { "GA" },
            population: Population::default(),
            statistics: RunStatistics::default(),
        })
    }

    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Final population of the last run.
    pub fn population(&self) -> &Population {
        &self.population
    }
}

impl Optimizer for GeneticAlgorithm {
    fn optimize(&mut self) -> OptimResult<()> {
        self.statistics.clear();
        let started = Instant::now();
        info!(optimizer = self.label, population = self.config.population_size, islands = self.config.islands, "starting");

        let evolution = Evolution {
            problem:     &self.problem,
            config:      &self.config,
            improvement: self.improvement,
            label:       self.label,
            started,
        };
        let mut rng = SearchRng::new(self.config.seed);

        let initial = if self.config.islands > 0 {
            evolution.islands(&mut rng)?
        } else {
            let initializer = self.config.initializer.initializer();
            Population::generate(self.config.population_size, &self.problem, initializer, &mut rng)?
        };
        self.population = evolution.evolve(initial, self.config.max_generations, &mut rng, Some(&mut self.statistics))?;
        self.statistics.elapsed = started.elapsed();

        info!(
            optimizer = self.label,
            generations = self.statistics.generations(),
            best = self.population.best_fitness(),
            elapsed_secs = self.statistics.elapsed.as_secs_f64(),
            "finished"
        );
        Ok(())
    }

    fn optimal_solution(&self) -> Option<&Solution> {
        self.population.best()
    }

    fn run_statistics(&self) -> &RunStatistics {
        &self.statistics
    }

    fn abbreviation(&self) -> &'static str {
        self.label
    }
}

// ── Evolution ─────────────────────────────────────────────────────────────────

/// Read-only state of one run, shared by the parallel tasks.
struct Evolution<'a> {
    problem:     &'a Problem,
    config:      &'a GaConfig,
    improvement: Option<Improvement>,
    label:       &'static str,
    started:     Instant,
}

impl Evolution<'_> {
    fn out_of_time(&self) -> bool {
        self.started.elapsed() >= self.config.max_running_time
    }

    /// Evolve `population` for up to `generations` generations.
    fn evolve(
        &self,
        mut population: Population,
        generations:    usize,
        rng:            &mut SearchRng,
        mut statistics: Option<&mut RunStatistics>,
    ) -> OptimResult<Population> {
        let station_count = self.problem.station_count();
        population.evaluate(self.problem.fitness())?;
        let mut best_so_far = population.best_fitness().unwrap_or(f64::INFINITY);
        let mut stagnant = 0usize;

        for generation in 0..generations {
            if self.out_of_time() {
                info!(optimizer = self.label, generation, "time budget used up");
                break;
            }
            self.record(&population, generation, statistics.as_deref_mut());
            population = self.next_generation(&mut population, generation, rng)?;

            let best = population.best_fitness().unwrap_or(f64::INFINITY);
            if best < best_so_far {
                best_so_far = best;
                stagnant = 0;
            } else {
                stagnant += 1;
            }
            if stagnant >= self.config.diversify_after
                && population.diversity(station_count) < self.config.diversity_limit
            {
                self.diversify(&mut population, rng)?;
                info!(
                    optimizer = self.label,
                    generation,
                    diversity = population.diversity(station_count),
                    "diversified stagnating population"
                );
                stagnant = 0;
            }
        }
        // The population handed back is recorded too.
        self.record(&population, generations, statistics);
        Ok(population)
    }

    fn record(&self, population: &Population, generation: usize, statistics: Option<&mut RunStatistics>) {
        let best = population.best_fitness().unwrap_or(f64::INFINITY);
        let average = population.average_fitness().unwrap_or(f64::INFINITY);
        let diversity = population.diversity(self.problem.station_count());
        if let Some(statistics) = statistics {
            statistics.record(best, average, Some(diversity));
        }
        info!(optimizer = self.label, generation, best, average, diversity, "generation");
    }

    fn next_generation(&self, population: &mut Population, generation: usize, rng: &mut SearchRng) -> OptimResult<Population> {
        let size = self.config.population_size;
        let elite = self.config.elite_size.min(population.len());
        let quota = size.saturating_sub(elite);
        let crossover_probability = self.config.crossover_probability(generation);
        let station_count = self.problem.station_count();

        population.sort();
        let parents: &Population = population;
        let buffer: Mutex<Vec<Solution>> = Mutex::new(Vec::with_capacity(quota));

        rng.children(quota.div_ceil(2))
            .into_par_iter()
            .try_for_each(|mut rng| -> OptimResult<()> {
                let k = self.config.tournament_size;
                let (a, b) = match self.config.selection {
                    ParentSelection::Tournament => parents.select_parents(k, &mut rng)?,
                    ParentSelection::Novelty => parents.select_diverse_parents(k, station_count, &mut rng)?,
                };
                let (mut x, mut y) = crossover(a, b, crossover_probability, &mut rng);
                mutate(&mut x, self.config.mutation_probability, station_count, &mut rng);
                mutate(&mut y, self.config.mutation_probability, station_count, &mut rng);
                if let Some(improvement) = self.improvement {
                    improvement.apply(&mut x, self.config.improve_probability, self.problem, &mut rng)?;
                    improvement.apply(&mut y, self.config.improve_probability, self.problem, &mut rng)?;
                }

                let mut buffer = buffer.lock();
                for child in [x, y] {
                    if buffer.len() < quota {
                        buffer.push(child);
                    }
                }
                Ok(())
            })?;

        let offspring = buffer.into_inner();
        let survivors = elite.max(size.saturating_sub(offspring.len())).min(parents.len());
        debug!(generation, offspring = offspring.len(), survivors, crossover_probability, "bred offspring");

        let mut next = Population::new(parents.individuals()[..survivors].to_vec());
        for child in offspring {
            next.add(child, self.problem)?;
        }
        next.evaluate(self.problem.fitness())?;
        next.reduce(size);
        Ok(next)
    }

    /// Heavy mutation of everyone outside the elite.
    fn diversify(&self, population: &mut Population, rng: &mut SearchRng) -> OptimResult<()> {
        let station_count = self.problem.station_count();
        let probability = self.config.diversify_mutation;
        let others = population.non_elite_mut(self.config.elite_size);
        let rngs = rng.children(others.len());
        others
            .par_iter_mut()
            .zip(rngs.into_par_iter())
            .for_each(|(individual, mut rng)| mutate(individual, probability, station_count, &mut rng));
        population.evaluate(self.problem.fitness())
    }

    /// Evolve the islands in parallel and merge their survivors.
    fn islands(&self, rng: &mut SearchRng) -> OptimResult<Population> {
        let islands = self.config.islands;
        let keep = self.config.population_size / islands;
        let initializer = self.config.initializer.initializer();

        let survivors: Vec<Population> = rng
            .children(islands)
            .into_par_iter()
            .enumerate()
            .map(|(island, mut rng)| -> OptimResult<Population> {
                let population = Population::generate(self.config.population_size, self.problem, initializer, &mut rng)?;
                let mut population = self.evolve(population, self.config.generations_per_island, &mut rng, None)?;
                debug!(island, best = population.best_fitness(), "island finished");
                population.reduce(keep);
                Ok(population)
            })
            .collect::<OptimResult<_>>()?;

        let mut merged = Population::default();
        for population in survivors {
            merged.merge(population);
        }
        info!(optimizer = self.label, islands, merged = merged.len(), best = merged.best_fitness(), "islands merged");
        Ok(merged)
    }
}
