//! Local-search neighborhoods and steps.
//!
//! | Neighborhood | Neighbors of a solution                              | Size             |
//! |--------------|------------------------------------------------------|------------------|
//! | Forward      | one gene advanced to the next station id (wrapping)   | genes            |
//! | Hamming      | one gene set to any other station id                  | genes × (n − 1)  |
//!
//! Neighbor fitness is evaluated in parallel; the call returns once every
//! neighbor is evaluated.

use rayon::prelude::*;

use ems_core::{SearchRng, ShiftType, StationId};

use crate::initializer::Random;
use crate::{NeighborhoodKind, OptimResult, Problem, Solution};

/// `solution` with gene `index` of `shift` advanced by one station.
pub fn forward_neighbor(solution: &Solution, shift: ShiftType, index: usize, station_count: usize) -> Solution {
    let current = solution.allocation().shift(shift)[index];
    let next = StationId(((current.index() + 1) % station_count) as u16);
    let mut neighbor = solution.clone();
    neighbor.set_gene(shift, index, next);
    neighbor
}

/// All neighbors of `solution`, in shift, gene, station order.
pub fn neighborhood(solution: &Solution, kind: NeighborhoodKind, station_count: usize) -> Vec<Solution> {
    let mut neighbors = Vec::new();
    for shift in ShiftType::ALL {
        let genes = solution.allocation().shift(shift);
        for (index, &current) in genes.iter().enumerate() {
            match kind {
                NeighborhoodKind::Forward => {
                    neighbors.push(forward_neighbor(solution, shift, index, station_count));
                }
                NeighborhoodKind::Hamming => {
                    for s in 0..station_count {
                        let station = StationId(s as u16);
                        if station != current {
                            let mut neighbor = solution.clone();
                            neighbor.set_gene(shift, index, station);
                            neighbors.push(neighbor);
                        }
                    }
                }
            }
        }
    }
    neighbors
}

/// The fittest neighbor, evaluated.  The first one wins ties.  `None` for a
/// solution without genes.
pub fn best_neighbor(solution: &Solution, kind: NeighborhoodKind, problem: &Problem) -> OptimResult<Option<Solution>> {
    let mut neighbors = neighborhood(solution, kind, problem.station_count());
    let fitness = problem.fitness();
    neighbors
        .par_iter_mut()
        .try_for_each(|neighbor| neighbor.fitness(fitness).map(drop))?;
    Ok(neighbors.into_iter().min_by(|a, b| a.rank_key().total_cmp(&b.rank_key())))
}

/// Steepest descent: move to the best neighbor unless it is worse than
/// `current`.  Returns whether the solution moved.
pub fn greedy_step(current: &mut Solution, kind: NeighborhoodKind, problem: &Problem) -> OptimResult<bool> {
    let fitness = current.fitness(problem.fitness())?;
    match best_neighbor(current, kind, problem)? {
        Some(best) if best.rank_key() <= fitness => {
            *current = best;
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Move to a random forward neighbor, whatever its fitness.
pub fn noise_step(current: &mut Solution, station_count: usize, rng: &mut SearchRng) {
    let shifts: Vec<ShiftType> = ShiftType::ALL
        .into_iter()
        .filter(|&s| !current.allocation().shift(s).is_empty())
        .collect();
    let Some(&shift) = rng.choose(&shifts) else {
        return;
    };
    let index = rng.gen_range(0..current.allocation().shift(shift).len());
    *current = forward_neighbor(current, shift, index, station_count);
}

/// Replace `current` with a uniformly random allocation.
pub fn restart_step(current: &mut Solution, problem: &Problem, rng: &mut SearchRng) {
    *current = Solution::new(problem.generate(&Random, rng));
}
