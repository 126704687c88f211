//! The distance/route oracle interface.
//!
//! # Contract
//!
//! Oracles are total: every query returns a value.  A pair the oracle knows
//! nothing about yields a documented fallback and a logged warning, never an
//! error, so a gap in the travel-time data cannot abort a simulation run.
//!
//! # Thread safety
//!
//! Implementations must be `Send + Sync`; a single oracle is shared by every
//! concurrent simulation run of an optimizer.

use ems_core::Coordinate;

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a route query: the cells passed through, in order, and the
/// total driving time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Route {
    /// Intermediate cells from (excluding) the origin to (including) the
    /// destination.  Empty for a trivial route.
    pub cells: Vec<Coordinate>,
    /// Total travel time in seconds.
    pub total_secs: i64,
}

impl Route {
    /// `true` if the route has no cells to traverse.
    pub fn is_trivial(&self) -> bool {
        self.cells.is_empty()
    }

    /// The cell reached after `elapsed_secs` of driving, assuming the cells
    /// are spread evenly over the total time.  `None` before the first cell
    /// is reached.
    pub fn position_at(&self, elapsed_secs: i64) -> Option<Coordinate> {
        if self.cells.is_empty() {
            return None;
        }
        if self.total_secs <= 0 || elapsed_secs >= self.total_secs {
            return self.cells.last().copied();
        }
        let reached = (elapsed_secs.max(0) as i128 * self.cells.len() as i128 / self.total_secs as i128) as usize;
        reached.checked_sub(1).map(|i| self.cells[i])
    }
}

// ── DistanceOracle ────────────────────────────────────────────────────────────

/// Pluggable source of travel times, routes and cell neighborhoods.
pub trait DistanceOracle: Send + Sync {
    /// Driving time in seconds from `from` to `to`.  Zero when equal.
    fn travel_time(&self, from: Coordinate, to: Coordinate) -> i64;

    /// The route from `from` to `to`.
    fn route(&self, from: Coordinate, to: Coordinate) -> Route;

    /// Cells considered close to `cell`, excluding `cell` itself.
    fn neighbors(&self, cell: Coordinate) -> Vec<Coordinate>;
}
