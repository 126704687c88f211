//! Historical demand by grid cell and hour of the week.
//!
//! Only the predicted-demand dispatch policy reads this table.  A cell that
//! never saw a call has zero demand.

use rustc_hash::FxHashMap;

use ems_core::{Coordinate, SimTime};

use crate::IncidentLog;

/// Hours in a week; demand rows are indexed by [`SimTime::hour_of_week`].
pub const HOURS_PER_WEEK: usize = 168;

#[derive(Clone, Debug, Default)]
pub struct DemandTable {
    cells: FxHashMap<Coordinate, Box<[f64; HOURS_PER_WEEK]>>,
}

impl DemandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Average calls per hour-of-week and cell over the span of `log`.
    ///
    /// Every call counts once, regardless of how many vehicles it asked for.
    pub fn from_incidents(log: &IncidentLog) -> Self {
        let mut table = Self::new();
        let Some((first, last)) = log.span() else {
            return table;
        };
        let weeks = ((last - first) as f64 / (HOURS_PER_WEEK as f64 * 3_600.0)).ceil().max(1.0);
        for (_, incident) in log.iter() {
            let row = table.row_mut(incident.location);
            row[incident.call_received.hour_of_week()] += 1.0 / weeks;
        }
        table
    }

    /// Set the average demand of `cell` for one hour of the week.
    pub fn set(&mut self, cell: Coordinate, hour_of_week: usize, value: f64) {
        if hour_of_week < HOURS_PER_WEEK {
            self.row_mut(cell)[hour_of_week] = value;
        }
    }

    /// Average demand of `cell` in the hour of the week containing `time`.
    pub fn demand(&self, cell: Coordinate, time: SimTime) -> f64 {
        self.cells
            .get(&cell)
            .map_or(0.0, |row| row[time.hour_of_week()])
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn row_mut(&mut self, cell: Coordinate) -> &mut [f64; HOURS_PER_WEEK] {
        self.cells
            .entry(cell)
            .or_insert_with(|| Box::new([0.0; HOURS_PER_WEEK]))
    }
}
