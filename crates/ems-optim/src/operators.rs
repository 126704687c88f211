//! Variation operators of the genetic algorithm.

use ems_core::{Allocation, SearchRng, ShiftType};

use crate::initializer::random_station;
use crate::Solution;

/// Single-point crossover, one cut per shift.
///
/// With probability `1 − probability` the parents are returned unchanged
/// (fitness caches included).  Otherwise each shift is cut at a uniformly
/// drawn interior point and the tails are swapped.  A shift with fewer than
/// two genes has no interior point and is copied.
pub fn crossover(a: &Solution, b: &Solution, probability: f64, rng: &mut SearchRng) -> (Solution, Solution) {
    if !rng.gen_bool(probability) {
        return (a.clone(), b.clone());
    }
    let mut child_a = Allocation::empty();
    let mut child_b = Allocation::empty();
    for shift in ShiftType::ALL {
        let genes_a = a.allocation().shift(shift);
        let genes_b = b.allocation().shift(shift);
        let len = genes_a.len().min(genes_b.len());
        let cut = if len >= 2 { rng.gen_range(1..len) } else { len };

        let head_a = &genes_a[..cut];
        let head_b = &genes_b[..cut];
        *child_a.shift_mut(shift) = head_a.iter().chain(&genes_b[cut..]).copied().collect();
        *child_b.shift_mut(shift) = head_b.iter().chain(&genes_a[cut..]).copied().collect();
    }
    (Solution::new(child_a), Solution::new(child_b))
}

/// Replace each gene with a uniformly drawn station with probability
/// `probability`.
pub fn mutate(solution: &mut Solution, probability: f64, station_count: usize, rng: &mut SearchRng) {
    for shift in ShiftType::ALL {
        for index in 0..solution.allocation().shift(shift).len() {
            if rng.gen_bool(probability) {
                let station = random_station(station_count, rng);
                solution.set_gene(shift, index, station);
            }
        }
    }
}
