//! Grid-snapped planar coordinates.
//!
//! All spatial data (incident locations, stations, travel-time tables) is
//! keyed by 1 km × 1 km cells of the UTM zone 33 grid.  A cell is identified
//! by a single integer that packs the south-west corner of the cell:
//!
//!   id = 20_000_000_000_000 + corner_easting × 10^7 + corner_northing
//!
//! where the easting is shifted by a false easting of 2 000 km before
//! snapping so that negative eastings still snap downwards.  Two coordinates
//! are equal iff they snap to the same cell.

use std::fmt;

/// Side length of one grid cell in meters.
pub const GRID_SIZE: i64 = 1_000;

/// Offset added to eastings before snapping.
pub const FALSE_EASTING: i64 = 2_000_000;

const ID_OFFSET:       i64 = 20_000_000_000_000;
const EASTING_FACTOR:  i64 = 10_000_000;

/// A grid cell.  The centroid of the cell stands in for every point inside it.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate {
    id: i64,
}

impl Coordinate {
    /// Snap a UTM (easting, northing) position in meters to its cell.
    pub fn from_utm(easting: i64, northing: i64) -> Coordinate {
        let corner_e = (easting + FALSE_EASTING).div_euclid(GRID_SIZE) * GRID_SIZE - FALSE_EASTING;
        let corner_n = northing.div_euclid(GRID_SIZE) * GRID_SIZE;
        Coordinate { id: ID_OFFSET + corner_e * EASTING_FACTOR + corner_n }
    }

    /// Rebuild a coordinate from a packed cell id.
    #[inline]
    pub fn from_id(id: i64) -> Coordinate {
        Coordinate { id }
    }

    #[inline]
    pub fn id(self) -> i64 {
        self.id
    }

    /// Easting of the cell centroid.
    pub fn easting(self) -> i64 {
        self.id.div_euclid(EASTING_FACTOR) - ID_OFFSET / EASTING_FACTOR + GRID_SIZE / 2
    }

    /// Northing of the cell centroid.
    pub fn northing(self) -> i64 {
        self.id.rem_euclid(EASTING_FACTOR) + GRID_SIZE / 2
    }

    /// Straight-line distance between centroids in meters.
    pub fn euclidean_distance(self, other: Coordinate) -> f64 {
        let de = (self.easting() - other.easting()) as f64;
        let dn = (self.northing() - other.northing()) as f64;
        de.hypot(dn)
    }

    /// City-block distance between centroids in meters.
    pub fn manhattan_distance(self, other: Coordinate) -> f64 {
        ((self.easting() - other.easting()).abs() + (self.northing() - other.northing()).abs()) as f64
    }

    /// The cell `de` cells east and `dn` cells north of this one.
    pub fn offset_cells(self, de: i64, dn: i64) -> Coordinate {
        Coordinate::from_utm(self.easting() + de * GRID_SIZE, self.northing() + dn * GRID_SIZE)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.easting(), self.northing())
    }
}
