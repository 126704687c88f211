//! A population of candidate solutions.
//!
//! Ranking methods (`sort`, `elite`, `reduce`) order by cached fitness,
//! ascending, with unevaluated individuals last; call
//! [`Population::evaluate`] first.  Sorting is stable, so equally fit
//! individuals keep their relative order.
//!
//! Parent selection is a tournament either on fitness alone
//! ([`Population::select_parents`]) or on fitness with novelty breaking
//! near ties ([`Population::select_diverse_parents`]).

use rayon::prelude::*;

use ems_core::{SearchRng, ShiftType};

use crate::{FitnessFunction, Initializer, OptimError, OptimResult, Problem, Solution};

/// Fitness difference below which novelty decides a diverse tournament.
pub const NOVELTY_TOLERANCE: f64 = 0.0005;

#[derive(Clone, Debug, Default)]
pub struct Population {
    individuals: Vec<Solution>,
}

impl Population {
    pub fn new(individuals: Vec<Solution>) -> Self {
        Self { individuals }
    }

    /// `size` fresh individuals from `initializer`, admitted under the
    /// problem's constraint strategy.
    pub fn generate(size: usize, problem: &Problem, initializer: &dyn Initializer, rng: &mut SearchRng) -> OptimResult<Self> {
        let mut population = Self::new(Vec::with_capacity(size));
        for _ in 0..size {
            population.add(Solution::new(problem.generate(initializer, rng)), problem)?;
        }
        Ok(population)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn individuals(&self) -> &[Solution] {
        &self.individuals
    }

    pub fn iter(&self) -> impl Iterator<Item = &Solution> + '_ {
        self.individuals.iter()
    }

    pub fn into_individuals(self) -> Vec<Solution> {
        self.individuals
    }

    /// Append `solution` after applying the constraint strategy.
    pub fn add(&mut self, solution: Solution, problem: &Problem) -> OptimResult<()> {
        self.individuals.push(problem.admit(solution)?);
        Ok(())
    }

    /// Append all of `other` as is.
    pub fn merge(&mut self, other: Population) {
        self.individuals.extend(other.individuals);
    }

    /// Evaluate every individual whose fitness is not cached, in parallel.
    pub fn evaluate(&mut self, fitness: &dyn FitnessFunction) -> OptimResult<()> {
        self.individuals
            .par_iter_mut()
            .try_for_each(|individual| individual.fitness(fitness).map(drop))
    }

    /// Evaluate the objectives (and with them the fitness) of every
    /// individual whose objectives are not cached, in parallel.
    pub fn evaluate_objectives(&mut self, fitness: &dyn FitnessFunction) -> OptimResult<()> {
        self.individuals
            .par_iter_mut()
            .try_for_each(|individual| individual.objectives(fitness).map(drop))
    }

    // ── Statistics ────────────────────────────────────────────────────────

    /// Mean fitness over the evaluated individuals.
    pub fn average_fitness(&self) -> Option<f64> {
        let (sum, n) = self
            .individuals
            .iter()
            .filter_map(Solution::cached_fitness)
            .fold((0.0, 0usize), |(s, n), f| (s + f, n + 1));
        (n > 0).then(|| sum / n as f64)
    }

    pub fn best_fitness(&self) -> Option<f64> {
        self.best().and_then(Solution::cached_fitness)
    }

    /// The fittest evaluated individual.
    pub fn best(&self) -> Option<&Solution> {
        self.individuals
            .iter()
            .filter(|s| s.is_evaluated())
            .min_by(|a, b| a.rank_key().total_cmp(&b.rank_key()))
    }

    /// Mean over shifts of the Shannon entropy of the station frequencies
    /// across the whole population, in base `station_count`.
    ///
    /// 0 when every individual uses a single station per shift, 1 when all
    /// stations are used equally often.
    pub fn diversity(&self, station_count: usize) -> f64 {
        if self.individuals.is_empty() || station_count < 2 {
            return 0.0;
        }
        let base = (station_count as f64).ln();
        let mut entropy = 0.0;
        for shift in ShiftType::ALL {
            let mut counts = vec![0usize; station_count];
            let mut total = 0usize;
            for individual in &self.individuals {
                for &gene in individual.allocation().shift(shift) {
                    if let Some(c) = counts.get_mut(gene.index()) {
                        *c += 1;
                        total += 1;
                    }
                }
            }
            if total == 0 {
                continue;
            }
            entropy -= counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / total as f64;
                    p * p.ln() / base
                })
                .sum::<f64>();
        }
        entropy / ShiftType::ALL.len() as f64
    }

    /// Mean [`Solution::distance`] from `solution` to the individuals.
    pub fn novelty(&self, solution: &Solution, station_count: usize) -> f64 {
        if self.individuals.is_empty() {
            return 0.0;
        }
        let total: u64 = self
            .individuals
            .iter()
            .map(|other| u64::from(solution.distance(other, station_count)))
            .sum();
        total as f64 / self.individuals.len() as f64
    }

    // ── Ranking ───────────────────────────────────────────────────────────

    pub fn sort(&mut self) {
        self.individuals.sort_by(|a, b| a.rank_key().total_cmp(&b.rank_key()));
    }

    /// The `n` fittest individuals.
    pub fn elite(&mut self, n: usize) -> &[Solution] {
        self.sort();
        &self.individuals[..n.min(self.individuals.len())]
    }

    /// Everyone except the `n` fittest.
    pub fn non_elite_mut(&mut self, n: usize) -> &mut [Solution] {
        self.sort();
        let n = n.min(self.individuals.len());
        &mut self.individuals[n..]
    }

    /// Keep the `size` fittest.
    pub fn reduce(&mut self, size: usize) {
        if size >= self.individuals.len() {
            return;
        }
        self.sort();
        self.individuals.truncate(size);
    }

    /// Tournament selection: draw `k` distinct individuals and return the
    /// two fittest.  A single-individual population returns it twice.
    pub fn select_parents(&self, k: usize, rng: &mut SearchRng) -> OptimResult<(&Solution, &Solution)> {
        if self.individuals.is_empty() {
            return Err(OptimError::Config("tournament on an empty population".into()));
        }
        let mut tournament: Vec<&Solution> = rng
            .sample_indices(self.individuals.len(), k.max(1))
            .into_iter()
            .map(|i| &self.individuals[i])
            .collect();
        tournament.sort_by(|a, b| a.rank_key().total_cmp(&b.rank_key()));
        let first = tournament[0];
        let second = tournament.get(1).copied().unwrap_or(first);
        Ok((first, second))
    }

    /// Tournament selection that favors novel individuals: of two
    /// contestants whose fitness differs by at most [`NOVELTY_TOLERANCE`],
    /// the one farther from the rest of the population wins.  Otherwise the
    /// fitter one does.
    pub fn select_diverse_parents(
        &self,
        k:             usize,
        station_count: usize,
        rng:           &mut SearchRng,
    ) -> OptimResult<(&Solution, &Solution)> {
        if self.individuals.is_empty() {
            return Err(OptimError::Config("tournament on an empty population".into()));
        }
        let contestants: Vec<(&Solution, f64)> = rng
            .sample_indices(self.individuals.len(), k.max(1))
            .into_iter()
            .map(|i| {
                let individual = &self.individuals[i];
                (individual, self.novelty(individual, station_count))
            })
            .collect();

        let beats = |a: &(&Solution, f64), b: &(&Solution, f64)| {
            let (fa, fb) = (a.0.rank_key(), b.0.rank_key());
            if (fa - fb).abs() > NOVELTY_TOLERANCE || !(fa - fb).is_finite() {
                fa < fb
            } else {
                a.1 > b.1
            }
        };
        let mut first = contestants[0];
        let mut second: Option<(&Solution, f64)> = None;
        for &contestant in &contestants[1..] {
            if beats(&contestant, &first) {
                second = Some(first);
                first = contestant;
            } else if second.is_none_or(|s| beats(&contestant, &s)) {
                second = Some(contestant);
            }
        }
        Ok((first.0, second.map_or(first.0, |s| s.0)))
    }
}
