//! Allocation initializers.
//!
//! | Kind                      | Draws                                                    |
//! |---------------------------|----------------------------------------------------------|
//! | `Random`                  | every gene uniformly                                      |
//! | `Uniform`                 | stations round-robin                                      |
//! | `UniformRandom`           | full round-robin passes, remainder without replacement    |
//! | `PopulationProportionate` | proportional to station population, drift repaired fairly |
//! | `SatisfyConstraintRandom` | uniformly among stations below capacity                   |
//! | `Mix`                     | `Random` 80 %, `PopulationProportionate` 10 %, `UniformRandom` 10 % |

use std::iter;

use ems_core::{SearchRng, StationId, StationTable};

use crate::InitializerKind;

pub trait Initializer: Send + Sync {
    /// `count` home stations.
    fn initialize(&self, count: usize, stations: &StationTable, rng: &mut SearchRng) -> Vec<StationId>;
}

impl InitializerKind {
    pub fn initializer(self) -> &'static dyn Initializer {
        match self {
            InitializerKind::Random                  => &Random,
            InitializerKind::Uniform                 => &Uniform,
            InitializerKind::UniformRandom           => &UniformRandom,
            InitializerKind::PopulationProportionate => &PopulationProportionate,
            InitializerKind::SatisfyConstraintRandom => &SatisfyConstraintRandom,
            InitializerKind::Mix                     => &Mix,
        }
    }
}

/// A uniformly drawn station id.  `station_count` must be positive.
#[inline]
pub(crate) fn random_station(station_count: usize, rng: &mut SearchRng) -> StationId {
    StationId(rng.gen_range(0..station_count) as u16)
}

// ── Variants ──────────────────────────────────────────────────────────────────

pub struct Random;

impl Initializer for Random {
    fn initialize(&self, count: usize, stations: &StationTable, rng: &mut SearchRng) -> Vec<StationId> {
        (0..count).map(|_| random_station(stations.len(), rng)).collect()
    }
}

pub struct Uniform;

impl Initializer for Uniform {
    fn initialize(&self, count: usize, stations: &StationTable, _rng: &mut SearchRng) -> Vec<StationId> {
        let ids: Vec<StationId> = stations.ids().collect();
        ids.iter().copied().cycle().take(count).collect()
    }
}

pub struct UniformRandom;

impl Initializer for UniformRandom {
    fn initialize(&self, count: usize, stations: &StationTable, rng: &mut SearchRng) -> Vec<StationId> {
        let ids: Vec<StationId> = stations.ids().collect();
        if ids.is_empty() {
            return Vec::new();
        }
        let passes = count / ids.len();
        let mut genes: Vec<StationId> = Vec::with_capacity(count);
        for _ in 0..passes {
            genes.extend_from_slice(&ids);
        }
        let rest = rng.sample_indices(ids.len(), count - genes.len());
        genes.extend(rest.into_iter().map(|i| ids[i]));
        genes
    }
}

/// Rounds `population weight × count` per station, then fixes the rounding
/// drift: a shortfall is filled at the most under-served stations first, a
/// surplus is taken from the most over-served ones first.
pub struct PopulationProportionate;

impl Initializer for PopulationProportionate {
    fn initialize(&self, count: usize, stations: &StationTable, _rng: &mut SearchRng) -> Vec<StationId> {
        let ids: Vec<StationId> = stations.ids().collect();
        let targets: Vec<f64> = ids.iter().map(|&id| stations.population_weight(id) * count as f64).collect();
        let rounded: Vec<usize> = targets.iter().map(|t| t.round() as usize).collect();

        let mut genes: Vec<StationId> = ids
            .iter()
            .zip(&rounded)
            .flat_map(|(&id, &k)| iter::repeat(id).take(k))
            .collect();

        // Station positions by ascending (target − rounded).
        let mut by_deviation: Vec<usize> = (0..ids.len()).collect();
        by_deviation.sort_by(|&a, &b| {
            let da = targets[a] - rounded[a] as f64;
            let db = targets[b] - rounded[b] as f64;
            da.total_cmp(&db)
        });

        if genes.len() < count {
            let missing = count - genes.len();
            genes.extend(by_deviation.iter().rev().cycle().take(missing).map(|&s| ids[s]));
        } else {
            let mut next = 0;
            while genes.len() > count {
                let station = ids[by_deviation[next % ids.len()]];
                if let Some(pos) = genes.iter().position(|&g| g == station) {
                    genes.remove(pos);
                }
                next += 1;
            }
        }
        genes
    }
}

/// Never exceeds a station's capacity while some station still has room.
/// Once every station is full the remaining genes are drawn uniformly.
pub struct SatisfyConstraintRandom;

impl Initializer for SatisfyConstraintRandom {
    fn initialize(&self, count: usize, stations: &StationTable, rng: &mut SearchRng) -> Vec<StationId> {
        let mut counts = vec![0u32; stations.len()];
        let mut genes = Vec::with_capacity(count);
        for _ in 0..count {
            let open: Vec<StationId> = stations
                .iter()
                .filter(|s| counts[s.id.index()] < s.capacity)
                .map(|s| s.id)
                .collect();
            let station = rng
                .choose(&open)
                .copied()
                .unwrap_or_else(|| random_station(stations.len(), rng));
            counts[station.index()] += 1;
            genes.push(station);
        }
        genes
    }
}

pub struct Mix;

impl Initializer for Mix {
    fn initialize(&self, count: usize, stations: &StationTable, rng: &mut SearchRng) -> Vec<StationId> {
        let p: f64 = rng.random();
        if p < 0.8 {
            Random.initialize(count, stations, rng)
        } else if p < 0.9 {
            PopulationProportionate.initialize(count, stations, rng)
        } else {
            UniformRandom.initialize(count, stations, rng)
        }
    }
}
