//! A synthetic incident week around the Oslo stations.
//!
//! Calls are spread uniformly over the window and placed within a few
//! kilometers of a station drawn by catchment population, so busy stations
//! see proportionally more calls.

use ems_core::{Coordinate, SearchRng, SimTime, StationTable};
use ems_incident::{Incident, IncidentLog, UrgencyLevel};

/// Maximum distance of a call from its station, in grid cells.
const SPREAD_CELLS: i64 = 4;

/// `(urgency, cumulative share)` of the call mix.
const URGENCY_MIX: [(UrgencyLevel, f64); 3] = [
    (UrgencyLevel::Acute, 0.3),
    (UrgencyLevel::Urgent, 0.75),
    (UrgencyLevel::RegularUnplanned, 1.0),
];

pub fn incident_week(stations: &StationTable, from: SimTime, to: SimTime, calls: usize, seed: u64) -> IncidentLog {
    let mut rng = SearchRng::new(seed);
    let window = to.secs_since(from);
    let incidents = (0..calls)
        .map(|_| {
            let call = from.plus_secs(rng.gen_range(0..window));
            let location = location(stations, &mut rng);
            let draw: f64 = rng.random();
            let urgency = URGENCY_MIX
                .iter()
                .find(|(_, share)| draw < *share)
                .map_or(UrgencyLevel::RegularUnplanned, |(u, _)| *u);
            incident(call, location, urgency, &mut rng)
        })
        .collect();
    IncidentLog::new(incidents)
}

fn location(stations: &StationTable, rng: &mut SearchRng) -> Coordinate {
    let mut pick: f64 = rng.random();
    let station = stations
        .iter()
        .find(|s| {
            pick -= stations.population_weight(s.id);
            pick < 0.0
        })
        .or_else(|| stations.iter().last());
    let base = station.map_or(Coordinate::from_utm(262_948, 6_649_765), |s| s.coordinate);
    base.offset_cells(
        rng.gen_range(-SPREAD_CELLS..=SPREAD_CELLS),
        rng.gen_range(-SPREAD_CELLS..=SPREAD_CELLS),
    )
}

/// Two thirds of the calls end with a hospital transport.
fn incident(call: SimTime, location: Coordinate, urgency: UrgencyLevel, rng: &mut SearchRng) -> Incident {
    let dispatched = call.plus_secs(rng.gen_range(30..240));
    let arrival = dispatched.plus_secs(rng.gen_range(300..1_200));
    let on_scene = rng.gen_range(600..2_400);
    let transport = rng.gen_bool(2.0 / 3.0);
    let departure = transport.then(|| arrival.plus_secs(on_scene));
    let cleared = arrival.plus_secs(on_scene + if transport { rng.gen_range(1_200..3_000) } else { 0 });

    Incident {
        call_received:             call,
        location,
        urgency,
        dispatched,
        arrival_at_scene:          Some(arrival),
        departure_from_scene:      departure,
        arrival_at_hospital:       None,
        available_non_transport:   arrival.plus_secs(on_scene),
        available_transport:       cleared,
        non_transporting_vehicles: u32::from(!transport),
        transporting_vehicles:     u32::from(transport),
    }
}
