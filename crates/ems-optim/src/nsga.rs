//! Multi-objective genetic algorithm on the acute and urgent average
//! response times.
//!
//! # Ranking
//!
//! Individuals are sorted into non-dominated fronts: front 0 is every
//! individual no other one dominates, front 1 is what front 0 leaves
//! undominated, and so on.  Within a front, the crowding distance is the
//! sum over both objectives of the normalized gap between an individual's
//! two neighbors; the two ends of a front are infinitely far.
//!
//! # Generation
//!
//! 1. `population_size` offspring are bred in parallel from tournaments that
//!    prefer the lower front, then the larger crowding distance.
//! 2. Parents and offspring are pooled and evaluated.
//! 3. Fronts are taken in order until `population_size` is reached; the
//!    front that does not fit is cut by crowding distance.
//!
//! There is no elite and no island phase.  The solution reported is the
//! front-0 individual with the best scalar fitness.

use std::cmp::Ordering;
use std::time::Instant;

use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{debug, info};

use ems_core::SearchRng;

use crate::operators::{crossover, mutate};
use crate::{GaConfig, Objectives, OptimError, OptimResult, Optimizer, Population, Problem, RunStatistics, Solution};

/// Where an individual stands in its population.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Standing {
    pub front:    usize,
    pub crowding: f64,
}

impl Standing {
    /// Lower front first, then larger crowding distance.
    pub fn preference(&self, other: &Self) -> Ordering {
        self.front.cmp(&other.front).then_with(|| other.crowding.total_cmp(&self.crowding))
    }
}

/// Indices of `objectives` grouped into non-dominated fronts, best first.
/// Indices within a front are ascending.
pub fn non_dominated_fronts(objectives: &[Objectives]) -> Vec<Vec<usize>> {
    let n = objectives.len();
    let mut dominated_by = vec![0usize; n];
    let mut dominates: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        for j in (i + 1)..n {
            if objectives[i].dominates(&objectives[j]) {
                dominates[i].push(j);
                dominated_by[j] += 1;
            } else if objectives[j].dominates(&objectives[i]) {
                dominates[j].push(i);
                dominated_by[i] += 1;
            }
        }
    }

    let mut fronts = Vec::new();
    let mut current: Vec<usize> = (0..n).filter(|&i| dominated_by[i] == 0).collect();
    while !current.is_empty() {
        let mut next = Vec::new();
        for &i in &current {
            for &j in &dominates[i] {
                dominated_by[j] -= 1;
                if dominated_by[j] == 0 {
                    next.push(j);
                }
            }
        }
        next.sort_unstable();
        fronts.push(std::mem::replace(&mut current, next));
    }
    fronts
}

/// Crowding distance of each member of `front`, in the order of `front`.
pub fn crowding_distances(objectives: &[Objectives], front: &[usize]) -> Vec<f64> {
    let mut distance = vec![0.0; front.len()];
    if front.len() <= 2 {
        distance.fill(f64::INFINITY);
        return distance;
    }
    for objective in 0..2 {
        let value = |slot: usize| objectives[front[slot]].values()[objective];
        let mut order: Vec<usize> = (0..front.len()).collect();
        order.sort_by(|&a, &b| value(a).total_cmp(&value(b)));

        let (first, last) = (order[0], order[order.len() - 1]);
        distance[first] = f64::INFINITY;
        distance[last] = f64::INFINITY;
        let range = value(last) - value(first);
        if !range.is_finite() || range <= 0.0 {
            continue;
        }
        for w in order.windows(3) {
            distance[w[1]] += (value(w[2]) - value(w[0])) / range;
        }
    }
    distance
}

/// Front and crowding distance of every individual.
pub fn standings(objectives: &[Objectives]) -> Vec<Standing> {
    let mut standings = vec![Standing { front: 0, crowding: 0.0 }; objectives.len()];
    for (front, members) in non_dominated_fronts(objectives).iter().enumerate() {
        for (&i, crowding) in members.iter().zip(crowding_distances(objectives, members)) {
            standings[i] = Standing { front, crowding };
        }
    }
    standings
}

// ── MultiObjectiveGeneticAlgorithm ────────────────────────────────────────────

pub struct MultiObjectiveGeneticAlgorithm {
    problem:    Problem,
    config:     GaConfig,
    population: Population,
    standings:  Vec<Standing>,
    statistics: RunStatistics,
}

impl MultiObjectiveGeneticAlgorithm {
    pub fn new(problem: Problem, config: GaConfig) -> OptimResult<Self> {
        config.validate()?;
        Ok(Self {
            problem,
            config,
            population: Population::default(),
            standings: Vec::new(),
            statistics: RunStatistics::default(),
        })
    }

    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Final population of the last run, ordered by front then crowding.
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// The non-dominated individuals of the final population.
    pub fn pareto_front(&self) -> impl Iterator<Item = &Solution> + '_ {
        self.population
            .iter()
            .zip(&self.standings)
            .filter(|(_, standing)| standing.front == 0)
            .map(|(solution, _)| solution)
    }

    fn out_of_time(&self, started: Instant) -> bool {
        started.elapsed() >= self.config.max_running_time
    }

    fn record(&mut self, generation: usize) {
        let best = self.optimal_solution().and_then(Solution::cached_fitness).unwrap_or(f64::INFINITY);
        let average = self.population.average_fitness().unwrap_or(f64::INFINITY);
        let diversity = self.population.diversity(self.problem.station_count());
        let front = self.standings.iter().filter(|s| s.front == 0).count();
        self.statistics.record(best, average, Some(diversity));
        info!(optimizer = "MOGA", generation, best, average, diversity, front, "generation");
    }

    /// Breed offspring, pool them with the parents and keep the best ranked.
    fn next_generation(&self, generation: usize, rng: &mut SearchRng) -> OptimResult<(Population, Vec<Standing>)> {
        let size = self.config.population_size;
        let crossover_probability = self.config.crossover_probability(generation);
        let station_count = self.problem.station_count();
        let buffer: Mutex<Vec<Solution>> = Mutex::new(Vec::with_capacity(size));

        rng.children(size.div_ceil(2))
            .into_par_iter()
            .try_for_each(|mut rng| -> OptimResult<()> {
                let (a, b) = self.select_parents(&mut rng)?;
                let (mut x, mut y) = crossover(a, b, crossover_probability, &mut rng);
                mutate(&mut x, self.config.mutation_probability, station_count, &mut rng);
                mutate(&mut y, self.config.mutation_probability, station_count, &mut rng);

                let mut buffer = buffer.lock();
                for child in [x, y] {
                    if buffer.len() < size {
                        buffer.push(child);
                    }
                }
                Ok(())
            })?;

        let offspring = buffer.into_inner();
        debug!(generation, offspring = offspring.len(), crossover_probability, "bred offspring");

        let mut pool = self.population.clone();
        for child in offspring {
            pool.add(child, &self.problem)?;
        }
        pool.evaluate_objectives(self.problem.fitness())?;
        survivors(pool, size)
    }

    /// Tournament on standing: draw `tournament_size` distinct individuals
    /// and return the two best placed.
    fn select_parents(&self, rng: &mut SearchRng) -> OptimResult<(&Solution, &Solution)> {
        let individuals = self.population.individuals();
        if individuals.is_empty() {
            return Err(OptimError::Config("tournament on an empty population".into()));
        }
        let mut tournament = rng.sample_indices(individuals.len(), self.config.tournament_size.max(1));
        tournament.sort_by(|&a, &b| self.standings[a].preference(&self.standings[b]));
        let first = tournament[0];
        let second = tournament.get(1).copied().unwrap_or(first);
        Ok((&individuals[first], &individuals[second]))
    }
}

/// Objectives of an evaluated population, in order.
fn objectives_of(population: &Population) -> OptimResult<Vec<Objectives>> {
    population
        .iter()
        .map(|s| s.cached_objectives().ok_or_else(|| OptimError::Config("individual has no objectives".into())))
        .collect()
}

/// The `size` best placed individuals of `pool`, ordered by standing, with
/// their standings recomputed among themselves.
fn survivors(pool: Population, size: usize) -> OptimResult<(Population, Vec<Standing>)> {
    let objectives = objectives_of(&pool)?;
    let placed = standings(&objectives);
    let mut order: Vec<usize> = (0..pool.len()).collect();
    order.sort_by(|&a, &b| placed[a].preference(&placed[b]));
    order.truncate(size);

    let mut slots: Vec<Option<Solution>> = pool.into_individuals().into_iter().map(Some).collect();
    let kept = Population::new(order.iter().filter_map(|&i| slots[i].take()).collect());
    let kept_standings = standings(&objectives_of(&kept)?);
    Ok((kept, kept_standings))
}

impl Optimizer for MultiObjectiveGeneticAlgorithm {
    fn optimize(&mut self) -> OptimResult<()> {
        self.statistics.clear();
        let started = Instant::now();
        info!(optimizer = "MOGA", population = self.config.population_size, "starting");

        let mut rng = SearchRng::new(self.config.seed);
        let initializer = self.config.initializer.initializer();
        let mut population = Population::generate(self.config.population_size, &self.problem, initializer, &mut rng)?;
        population.evaluate_objectives(self.problem.fitness())?;
        self.standings = standings(&objectives_of(&population)?);
        self.population = population;

        let generations = self.config.max_generations;
        for generation in 0..generations {
            if self.out_of_time(started) {
                info!(optimizer = "MOGA", generation, "time budget used up");
                break;
            }
            self.record(generation);
            let (population, standings) = self.next_generation(generation, &mut rng)?;
            self.population = population;
            self.standings = standings;
        }
        self.record(generations);
        self.statistics.elapsed = started.elapsed();

        info!(
            optimizer = "MOGA",
            generations = self.statistics.generations(),
            front = self.pareto_front().count(),
            best = self.optimal_solution().and_then(Solution::cached_fitness),
            elapsed_secs = self.statistics.elapsed.as_secs_f64(),
            "finished"
        );
        Ok(())
    }

    fn optimal_solution(&self) -> Option<&Solution> {
        self.pareto_front()
            .filter(|s| s.is_evaluated())
            .min_by(|a, b| a.rank_key().total_cmp(&b.rank_key()))
    }

    fn run_statistics(&self) -> &RunStatistics {
        &self.statistics
    }

    fn abbreviation(&self) -> &'static str {
        "MOGA"
    }
}
