//! Precomputed travel-time, route and neighbor tables.
//!
//! # Fallbacks
//!
//! | Query        | Unknown pair returns                       |
//! |--------------|--------------------------------------------|
//! | travel time  | [`DEFAULT_TRAVEL_SECS`]                    |
//! | route        | empty route of [`DEFAULT_ROUTE_SECS`]      |
//! | neighbors    | no neighbors                               |
//!
//! Each fallback is logged at `warn` level and counted; the count is
//! available from [`RouteTable::lookup_failures`] so a driver can report how
//! much of a run leaned on fallback values.
//!
//! # CSV format
//!
//! ```csv
//! from,to,seconds
//! 20262000006649000,20261000006652000,412
//! ```

use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::warn;

use ems_core::Coordinate;

use crate::{DistanceOracle, Route, SpatialError, SpatialResult};

/// Travel time assumed for a cell pair missing from the table.
pub const DEFAULT_TRAVEL_SECS: i64 = 60;

/// Travel time of the placeholder route returned for a missing pair.
pub const DEFAULT_ROUTE_SECS: i64 = 3_600;

#[derive(Default)]
pub struct RouteTable {
    travel:    FxHashMap<(Coordinate, Coordinate), i64>,
    routes:    FxHashMap<(Coordinate, Coordinate), Route>,
    neighbors: FxHashMap<Coordinate, Vec<Coordinate>>,
    failures:  AtomicU64,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_travel_time(&mut self, from: Coordinate, to: Coordinate, secs: i64) {
        self.travel.insert((from, to), secs);
    }

    pub fn insert_route(&mut self, from: Coordinate, to: Coordinate, route: Route) {
        self.routes.insert((from, to), route);
    }

    pub fn insert_neighbors(&mut self, cell: Coordinate, neighbors: Vec<Coordinate>) {
        self.neighbors.insert(cell, neighbors);
    }

    /// Number of queries answered with a fallback value so far.
    pub fn lookup_failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Load `from,to,seconds` rows (packed cell ids) from a CSV file.
    pub fn load_travel_times_csv(&mut self, path: &Path) -> SpatialResult<usize> {
        let file = std::fs::File::open(path)?;
        self.load_travel_times_reader(file)
    }

    /// Like [`RouteTable::load_travel_times_csv`] but accepts any `Read` source.
    pub fn load_travel_times_reader<R: Read>(&mut self, reader: R) -> SpatialResult<usize> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut loaded = 0;
        for result in csv_reader.deserialize::<TravelRecord>() {
            let row = result.map_err(|e| SpatialError::Parse(e.to_string()))?;
            self.insert_travel_time(
                Coordinate::from_id(row.from),
                Coordinate::from_id(row.to),
                row.seconds.round() as i64,
            );
            loaded += 1;
        }
        Ok(loaded)
    }

    fn note_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}

impl DistanceOracle for RouteTable {
    fn travel_time(&self, from: Coordinate, to: Coordinate) -> i64 {
        if from == to {
            return 0;
        }
        match self.travel.get(&(from, to)) {
            Some(&secs) => secs,
            None => {
                self.note_failure();
                warn!(%from, %to, fallback = DEFAULT_TRAVEL_SECS, "no travel time for cell pair");
                DEFAULT_TRAVEL_SECS
            }
        }
    }

    fn route(&self, from: Coordinate, to: Coordinate) -> Route {
        if from == to {
            return Route::default();
        }
        match self.routes.get(&(from, to)) {
            Some(route) => route.clone(),
            None => {
                self.note_failure();
                warn!(%from, %to, fallback = DEFAULT_ROUTE_SECS, "no route for cell pair");
                Route { cells: Vec::new(), total_secs: DEFAULT_ROUTE_SECS }
            }
        }
    }

    fn neighbors(&self, cell: Coordinate) -> Vec<Coordinate> {
        match self.neighbors.get(&cell) {
            Some(list) => list.clone(),
            None => {
                self.note_failure();
                warn!(%cell, "no neighbors for cell");
                Vec::new()
            }
        }
    }
}

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TravelRecord {
    from:    i64,
    to:      i64,
    seconds: f64,
}
