//! The two-shift ambulance allocation.
//!
//! An [`Allocation`] is the chromosome every optimizer works on: one list of
//! home stations per shift, where entry `i` is the home station of the
//! `i`-th ambulance on that shift.  The same station may appear several
//! times.
//!
//! Equality and hashing look at the multiset of stations per shift, so two
//! allocations that only differ in list order compare equal.

use std::hash::{Hash, Hasher};

use crate::{ShiftType, StationId, StationTable};

#[derive(Clone, Debug, Default)]
pub struct Allocation {
    shifts: [Vec<StationId>; 2],
}

impl Allocation {
    pub fn new(day: Vec<StationId>, night: Vec<StationId>) -> Self {
        Self { shifts: [day, night] }
    }

    /// An allocation with no ambulances on either shift.
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn day(&self) -> &[StationId] {
        &self.shifts[0]
    }

    #[inline]
    pub fn night(&self) -> &[StationId] {
        &self.shifts[1]
    }

    #[inline]
    pub fn shift(&self, shift: ShiftType) -> &[StationId] {
        &self.shifts[shift.index()]
    }

    /// Mutable access to one shift.  Callers that own a cached fitness must
    /// invalidate it.
    #[inline]
    pub fn shift_mut(&mut self, shift: ShiftType) -> &mut Vec<StationId> {
        &mut self.shifts[shift.index()]
    }

    /// Total number of genes over both shifts.
    pub fn gene_count(&self) -> usize {
        self.shifts[0].len() + self.shifts[1].len()
    }

    /// Number of ambulances per station on `shift`, indexed by station id.
    pub fn station_counts(&self, shift: ShiftType, station_count: usize) -> Vec<u32> {
        let mut counts = vec![0u32; station_count];
        for &id in self.shift(shift) {
            if let Some(c) = counts.get_mut(id.index()) {
                *c += 1;
            }
        }
        counts
    }

    /// Sum over stations and shifts of `max(0, assigned − capacity)`.
    pub fn capacity_violations(&self, stations: &StationTable) -> u32 {
        let mut violations = 0;
        for shift in ShiftType::ALL {
            let counts = self.station_counts(shift, stations.len());
            for station in stations.iter() {
                violations += counts[station.id.index()].saturating_sub(station.capacity);
            }
        }
        violations
    }

    /// The shift list in canonical (sorted) order.
    fn sorted(&self, shift: ShiftType) -> Vec<StationId> {
        let mut ids = self.shift(shift).to_vec();
        ids.sort_unstable();
        ids
    }
}

impl PartialEq for Allocation {
    fn eq(&self, other: &Self) -> bool {
        ShiftType::ALL
            .iter()
            .all(|&s| self.shift(s).len() == other.shift(s).len() && self.sorted(s) == other.sorted(s))
    }
}

impl Eq for Allocation {}

impl Hash for Allocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for shift in ShiftType::ALL {
            self.sorted(shift).hash(state);
        }
    }
}
