//! Dispatch policies: how available ambulances are ranked for a call.
//!
//! # Ranking
//!
//! A policy turns each available ambulance into a [`DispatchKey`] of
//! `(penalty, travel)`.  Ambulances are sent in ascending order of
//! `penalty + travel`, ties broken by `travel` and then by ambulance id, so
//! a ranking is fully deterministic.  Distance-based policies put meters in
//! `travel`; every other policy uses oracle seconds, and penalties are
//! seconds as well.
//!
//! # Coverage penalties
//!
//! The coverage policies discourage sending the last units that protect an
//! area.  With `left` = units that would remain in the area after this call
//! takes what it needs:
//!
//! | `left` | Penalty (s) |
//! |--------|-------------|
//! | 0      | 600         |
//! | 1      | 180         |
//! | ≥ 2    | 0           |
//!
//! The penalty is scaled by the call's importance: acute calls are never
//! penalized, regular calls count double.  These thresholds are calibration
//! constants.

use std::cmp::Ordering;

use ems_core::SimTime;
use ems_incident::{DemandTable, Incident, UrgencyLevel};
use ems_spatial::DistanceOracle;

use crate::{Ambulance, DispatchPolicyKind};

/// Penalty when no other unit would remain in the area.
pub const LAST_UNIT_PENALTY_SECS: f64 = 600.0;

/// Penalty when exactly one other unit would remain in the area.
pub const SECOND_LAST_UNIT_PENALTY_SECS: f64 = 180.0;

/// Units within this driving time of each other cover the same area.
pub const NEARBY_RADIUS_SECS: i64 = 7 * 60;

/// Seconds of penalty per predicted call left uncovered in the next hour.
pub const UNCOVERED_DEMAND_PENALTY_SECS: f64 = 39.0;

// ── DispatchKey ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DispatchKey {
    pub penalty: f64,
    pub travel:  f64,
}

impl DispatchKey {
    pub fn travel_only(travel: f64) -> Self {
        Self { penalty: 0.0, travel }
    }

    #[inline]
    pub fn effective(&self) -> f64 {
        self.penalty + self.travel
    }

    /// Total order used to sort candidates.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.effective()
            .total_cmp(&other.effective())
            .then(self.travel.total_cmp(&other.travel))
    }
}

// ── Context ───────────────────────────────────────────────────────────────────

/// Everything a policy may look at when ranking one candidate.
pub struct DispatchContext<'a> {
    pub now:          SimTime,
    pub incident:     &'a Incident,
    /// Vehicles the call still needs.
    pub demand:       u32,
    /// Every unit that could take the call, the candidate included.  Busy
    /// units appear here only when redispatch or call booking is enabled.
    pub available:    &'a [&'a Ambulance],
    pub oracle:       &'a dyn DistanceOracle,
    pub demand_table: &'a DemandTable,
}

// ── DispatchPolicy trait ──────────────────────────────────────────────────────

pub trait DispatchPolicy: Send + Sync {
    fn rank(&self, ambulance: &Ambulance, ctx: &DispatchContext<'_>) -> DispatchKey;
}

impl DispatchPolicyKind {
    pub fn policy(self) -> &'static dyn DispatchPolicy {
        match self {
            DispatchPolicyKind::Euclidean               => &Euclidean,
            DispatchPolicyKind::Manhattan               => &Manhattan,
            DispatchPolicyKind::Fastest                 => &Fastest,
            DispatchPolicyKind::CoverageBaseStation     => &CoverageBaseStation,
            DispatchPolicyKind::CoverageNearby          => &CoverageNearby,
            DispatchPolicyKind::CoveragePredictedDemand => &CoveragePredictedDemand,
        }
    }
}

// ── Geometric policies ────────────────────────────────────────────────────────

pub struct Euclidean;

impl DispatchPolicy for Euclidean {
    fn rank(&self, ambulance: &Ambulance, ctx: &DispatchContext<'_>) -> DispatchKey {
        DispatchKey::travel_only(ambulance.location().euclidean_distance(ctx.incident.location))
    }
}

pub struct Manhattan;

impl DispatchPolicy for Manhattan {
    fn rank(&self, ambulance: &Ambulance, ctx: &DispatchContext<'_>) -> DispatchKey {
        DispatchKey::travel_only(ambulance.location().manhattan_distance(ctx.incident.location))
    }
}

pub struct Fastest;

impl DispatchPolicy for Fastest {
    fn rank(&self, ambulance: &Ambulance, ctx: &DispatchContext<'_>) -> DispatchKey {
        DispatchKey::travel_only(travel_to_scene(ambulance, ctx) as f64)
    }
}

// ── Coverage policies ─────────────────────────────────────────────────────────

pub struct CoverageBaseStation;

impl DispatchPolicy for CoverageBaseStation {
    fn rank(&self, ambulance: &Ambulance, ctx: &DispatchContext<'_>) -> DispatchKey {
        let travel = travel_to_scene(ambulance, ctx) as f64;
        let importance = importance(ctx.incident.urgency);
        if importance == 0.0 {
            return DispatchKey::travel_only(travel);
        }
        let at_station = ctx
            .available
            .iter()
            .filter(|other| other.base_station == ambulance.base_station)
            .count();
        let penalty = importance * step_penalty(units_left(at_station, ctx.demand));
        DispatchKey { penalty, travel }
    }
}

pub struct CoverageNearby;

impl DispatchPolicy for CoverageNearby {
    fn rank(&self, ambulance: &Ambulance, ctx: &DispatchContext<'_>) -> DispatchKey {
        let travel = travel_to_scene(ambulance, ctx) as f64;
        let importance = importance(ctx.incident.urgency);
        if importance == 0.0 {
            return DispatchKey::travel_only(travel);
        }
        let nearby = ctx
            .available
            .iter()
            .filter(|other| {
                other.id == ambulance.id
                    || ctx.oracle.travel_time(ambulance.location(), other.location()) <= NEARBY_RADIUS_SECS
            })
            .count();
        let penalty = importance * step_penalty(units_left(nearby, ctx.demand));
        DispatchKey { penalty, travel }
    }
}

/// Looks at the candidate's own cell and its oracle neighbors.  The
/// predicted demand there for the hour the candidate would reach the scene,
/// shared among the units that would remain, adds a continuous penalty on
/// top of the step penalty.
pub struct CoveragePredictedDemand;

impl DispatchPolicy for CoveragePredictedDemand {
    fn rank(&self, ambulance: &Ambulance, ctx: &DispatchContext<'_>) -> DispatchKey {
        let travel_secs = travel_to_scene(ambulance, ctx);
        let travel = travel_secs as f64;
        let importance = importance(ctx.incident.urgency);
        if importance == 0.0 {
            return DispatchKey::travel_only(travel);
        }

        let mut region = ctx.oracle.neighbors(ambulance.location());
        region.push(ambulance.location());
        let arrival = ctx.now.plus_secs(travel_secs);
        let predicted: f64 = region.iter().map(|&cell| ctx.demand_table.demand(cell, arrival)).sum();
        let supply = ctx
            .available
            .iter()
            .filter(|other| region.contains(&other.location()))
            .count();

        let left = units_left(supply, ctx.demand);
        let uncovered = UNCOVERED_DEMAND_PENALTY_SECS * predicted / (left as f64 + 1.0);
        DispatchKey { penalty: importance * (step_penalty(left) + uncovered), travel }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn travel_to_scene(ambulance: &Ambulance, ctx: &DispatchContext<'_>) -> i64 {
    ctx.oracle.travel_time(ambulance.location(), ctx.incident.location)
}

/// Weight of a coverage penalty for a call of `urgency`.
fn importance(urgency: UrgencyLevel) -> f64 {
    match urgency {
        UrgencyLevel::Acute => 0.0,
        u if u.is_regular() => 2.0,
        _                   => 1.0,
    }
}

fn units_left(units: usize, demand: u32) -> usize {
    units.saturating_sub(demand as usize)
}

fn step_penalty(left: usize) -> f64 {
    match left {
        0 => LAST_UNIT_PENALTY_SECS,
        1 => SECOND_LAST_UNIT_PENALTY_SECS,
        _ => 0.0,
    }
}
