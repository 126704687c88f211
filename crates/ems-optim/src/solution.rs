//! A candidate allocation with its cached fitness.
//!
//! The fitness (and, for the multi-objective search, the per-urgency
//! objectives) is computed lazily and kept until the allocation changes.
//! Changes that leave the per-shift multiset of stations intact (a
//! reordering) keep the cache, since the simulation cannot tell them apart.

use std::hash::{Hash, Hasher};

use ems_core::{Allocation, ShiftType, StationId, StationTable};
use ems_spatial::DistanceOracle;

use crate::{FitnessFunction, Objectives, OptimError, OptimResult};

#[derive(Clone, Debug)]
pub struct Solution {
    allocation: Allocation,
    fitness:    Option<f64>,
    objectives: Option<Objectives>,
}

impl Solution {
    pub fn new(allocation: Allocation) -> Self {
        Self { allocation, fitness: None, objectives: None }
    }

    #[inline]
    pub fn allocation(&self) -> &Allocation {
        &self.allocation
    }

    pub fn into_allocation(self) -> Allocation {
        self.allocation
    }

    pub fn set_allocation(&mut self, allocation: Allocation) {
        if allocation != self.allocation {
            self.allocation = allocation;
            self.invalidate();
        }
    }

    /// Set gene `index` of `shift` to `station`.
    pub fn set_gene(&mut self, shift: ShiftType, index: usize, station: StationId) {
        let genes = self.allocation.shift_mut(shift);
        if genes[index] != station {
            genes[index] = station;
            self.invalidate();
        }
    }

    /// The fitness, evaluated on first use after a change.
    pub fn fitness(&mut self, function: &dyn FitnessFunction) -> OptimResult<f64> {
        if let Some(fitness) = self.fitness {
            return Ok(fitness);
        }
        let fitness = function.evaluate(&self.allocation)?;
        self.fitness = Some(fitness);
        Ok(fitness)
    }

    #[inline]
    pub fn cached_fitness(&self) -> Option<f64> {
        self.fitness
    }

    /// The objectives, evaluated on first use after a change.  Evaluating
    /// them caches the fitness as well.
    pub fn objectives(&mut self, function: &dyn FitnessFunction) -> OptimResult<Objectives> {
        if let Some(objectives) = self.objectives {
            return Ok(objectives);
        }
        let (fitness, objectives) = function.evaluate_objectives(&self.allocation)?;
        self.fitness = Some(fitness);
        self.objectives = Some(objectives);
        Ok(objectives)
    }

    #[inline]
    pub fn cached_objectives(&self) -> Option<Objectives> {
        self.objectives
    }

    fn invalidate(&mut self) {
        self.fitness = None;
        self.objectives = None;
    }

    /// Sum over shifts and stations of the difference in the number of
    /// ambulances placed there.  Gene order does not matter.
    pub fn distance(&self, other: &Solution, station_count: usize) -> u32 {
        ShiftType::ALL
            .into_iter()
            .map(|shift| {
                let ours = self.allocation.station_counts(shift, station_count);
                let theirs = other.allocation.station_counts(shift, station_count);
                ours.iter().zip(&theirs).map(|(a, b)| a.abs_diff(*b)).sum::<u32>()
            })
            .sum()
    }

    #[inline]
    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Take over a fitness value without touching the allocation.
    pub(crate) fn adopt_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    /// Sort key; unevaluated solutions rank last.
    #[inline]
    pub(crate) fn rank_key(&self) -> f64 {
        self.fitness.unwrap_or(f64::INFINITY)
    }

    pub fn capacity_violations(&self, stations: &StationTable) -> u32 {
        self.allocation.capacity_violations(stations)
    }

    /// Move every ambulance above a station's capacity to the station with
    /// spare capacity that is closest by travel time.  Ties go to the lower
    /// station id.
    ///
    /// Fails with [`OptimError::Infeasible`] when a shift has more
    /// ambulances than the stations can hold.
    pub fn conform_to_constraints(&mut self, stations: &StationTable, oracle: &dyn DistanceOracle) -> OptimResult<()> {
        let mut changed = false;
        for shift in ShiftType::ALL {
            let mut counts = self.allocation.station_counts(shift, stations.len());
            let genes = self.allocation.shift_mut(shift);

            for station in stations.iter() {
                let s = station.id.index();
                while counts[s] > station.capacity {
                    let target = stations
                        .iter()
                        .filter(|other| other.id != station.id && counts[other.id.index()] < other.capacity)
                        .min_by_key(|other| oracle.travel_time(station.coordinate, other.coordinate))
                        .ok_or(OptimError::Infeasible { shift, station: station.id })?;

                    if let Some(pos) = genes.iter().position(|&g| g == station.id) {
                        genes.remove(pos);
                    }
                    genes.push(target.id);
                    counts[s] -= 1;
                    counts[target.id.index()] += 1;
                    changed = true;
                }
            }
        }
        if changed {
            self.invalidate();
        }
        Ok(())
    }
}

impl PartialEq for Solution {
    fn eq(&self, other: &Self) -> bool {
        self.allocation == other.allocation
    }
}

impl Eq for Solution {}

impl Hash for Solution {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.allocation.hash(state);
    }
}
