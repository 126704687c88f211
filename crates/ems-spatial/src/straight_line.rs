//! Constant-speed straight-line oracle.
//!
//! Travel time is the centroid distance divided by a fixed speed, rounded to
//! whole seconds.  Routes step through the grid cells on the straight line
//! between the two centroids.  Useful where no road data is available and in
//! tests, where exact travel times are needed.

use ems_core::Coordinate;

use crate::{DistanceOracle, Route};

#[derive(Debug, Clone)]
pub struct StraightLineOracle {
    /// Driving speed in meters per second.
    pub speed_mps:       f64,
    /// Cells within this many grid steps (Chebyshev distance) are neighbors.
    pub neighbor_radius: i64,
}

impl StraightLineOracle {
    pub fn new(speed_mps: f64, neighbor_radius: i64) -> Self {
        Self { speed_mps, neighbor_radius }
    }
}

impl Default for StraightLineOracle {
    /// 60 km/h, one ring of neighbors.
    fn default() -> Self {
        Self::new(60.0 / 3.6, 1)
    }
}

impl DistanceOracle for StraightLineOracle {
    fn travel_time(&self, from: Coordinate, to: Coordinate) -> i64 {
        if from == to || self.speed_mps <= 0.0 {
            return 0;
        }
        (from.euclidean_distance(to) / self.speed_mps).round() as i64
    }

    fn route(&self, from: Coordinate, to: Coordinate) -> Route {
        if from == to {
            return Route::default();
        }
        let de = (to.easting() - from.easting()) as f64;
        let dn = (to.northing() - from.northing()) as f64;
        let steps = (de.abs().max(dn.abs()) / ems_core::grid::GRID_SIZE as f64).ceil().max(1.0) as i64;

        let mut cells: Vec<Coordinate> = Vec::with_capacity(steps as usize);
        for i in 1..=steps {
            let f = i as f64 / steps as f64;
            let cell = Coordinate::from_utm(
                from.easting() + (de * f).round() as i64,
                from.northing() + (dn * f).round() as i64,
            );
            if cells.last() != Some(&cell) {
                cells.push(cell);
            }
        }
        Route { cells, total_secs: self.travel_time(from, to) }
    }

    fn neighbors(&self, cell: Coordinate) -> Vec<Coordinate> {
        let r = self.neighbor_radius;
        let mut out = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)).max(1) as usize);
        for de in -r..=r {
            for dn in -r..=r {
                if de != 0 || dn != 0 {
                    out.push(cell.offset_cells(de, dn));
                }
            }
        }
        out
    }
}
