//! Unit tests for ems-incident.

use std::io::Cursor;

use ems_core::{Coordinate, SimTime};

use crate::{load_incidents_reader, DemandTable, Incident, IncidentError, IncidentLog, UrgencyLevel};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn t(h: u32, m: u32) -> SimTime {
    SimTime::from_ymd_hms(2017, 8, 7, h, m, 0).unwrap()
}

fn incident(call: SimTime) -> Incident {
    Incident {
        call_received:             call,
        location:                  Coordinate::from_utm(262_948, 6_649_765),
        urgency:                   UrgencyLevel::Urgent,
        dispatched:                call.plus_secs(60),
        arrival_at_scene:          Some(call.plus_secs(600)),
        departure_from_scene:      Some(call.plus_secs(1_800)),
        arrival_at_hospital:       None,
        available_non_transport:   call.plus_secs(3_600),
        available_transport:       call.plus_secs(4_200),
        non_transporting_vehicles: 0,
        transporting_vehicles:     1,
    }
}

const HEADER: &str = "call_received,easting,northing,urgency,dispatched,arrival_at_scene,departure_from_scene,available_non_transport,available_transport,non_transporting_vehicles,transporting_vehicles\n";

// ── UrgencyLevel ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod urgency_tests {
    use super::*;

    #[test]
    fn symbols_roundtrip() {
        for level in UrgencyLevel::ALL {
            assert_eq!(UrgencyLevel::from_symbol(level.symbol()), Some(level));
        }
        assert_eq!(UrgencyLevel::from_symbol(" V1 "), Some(UrgencyLevel::RegularUnplanned));
        assert_eq!(UrgencyLevel::from_symbol("X"), None);
    }

    #[test]
    fn regular_flag() {
        assert!(!UrgencyLevel::Acute.is_regular());
        assert!(!UrgencyLevel::Urgent.is_regular());
        assert!(UrgencyLevel::RegularPlanned.is_regular());
    }

    #[test]
    fn survival_is_a_probability_and_decreases() {
        for level in UrgencyLevel::ALL {
            let fast = level.survival_probability(60);
            let slow = level.survival_probability(3_600);
            assert!(fast > 0.0 && fast < 1.0);
            assert!(slow > 0.0 && slow < 1.0);
            assert!(fast > slow);
        }
        // Zero minutes: logistic(0.26).
        let p = UrgencyLevel::Acute.survival_probability(0);
        assert!((p - 1.0 / (1.0 + (-0.26f64).exp())).abs() < 1e-12);
    }
}

// ── Incident ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod incident_tests {
    use super::*;

    #[test]
    fn derived_durations() {
        let i = incident(t(10, 0));
        assert_eq!(i.dispatch_delay(), 60);
        assert_eq!(i.time_at_scene().unwrap(), 1_200);
        assert_eq!(i.time_at_scene_non_transport().unwrap(), 3_000);
        assert_eq!(i.time_before_aborting().unwrap(), 3_600);
        assert_eq!(i.demand(), 1);
        assert!(i.has_transport_path());
    }

    #[test]
    fn time_at_scene_requires_both_timestamps() {
        let mut i = incident(t(10, 0));
        i.departure_from_scene = None;
        assert!(matches!(
            i.time_at_scene(),
            Err(IncidentError::MissingTimestamp { field: "departure from scene", .. })
        ));
        i.arrival_at_scene = None;
        assert!(i.time_at_scene_non_transport().is_err());
    }

    #[test]
    fn non_transport_uses_transport_availability_when_earlier() {
        let mut i = incident(t(10, 0));
        i.available_non_transport = t(10, 5);
        assert_eq!(i.time_at_scene_non_transport().unwrap(), 4_200 - 600);
    }

    #[test]
    fn aborting_before_the_call_is_an_error() {
        let mut i = incident(t(10, 0));
        i.available_non_transport = t(9, 0);
        assert!(matches!(i.time_before_aborting(), Err(IncidentError::AbortedBeforeCall { .. })));
    }

    #[test]
    fn hospital_time_prefers_the_logged_stay() {
        let mut i = incident(t(10, 0));
        assert_eq!(i.hospital_time(true), 827);

        i.arrival_at_hospital = Some(t(11, 0));
        assert_eq!(i.hospital_time(true), 600);
        assert_eq!(i.hospital_time(false), 827);

        // Logged after the unit was already free again.
        i.arrival_at_hospital = Some(t(11, 20));
        assert_eq!(i.hospital_time(true), 827);
    }
}

// ── IncidentLog ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod log_tests {
    use super::*;

    #[test]
    fn sorted_and_windowed() {
        let log = IncidentLog::new(vec![incident(t(12, 0)), incident(t(9, 0)), incident(t(10, 30))]);
        assert_eq!(log.len(), 3);
        let calls: Vec<SimTime> = log.iter().map(|(_, i)| i.call_received).collect();
        assert_eq!(calls, vec![t(9, 0), t(10, 30), t(12, 0)]);

        let window = log.ids_between(t(10, 0), t(12, 0));
        assert_eq!(window.len(), 1);
        assert_eq!(log.get(window[0]).unwrap().call_received, t(10, 30));
        assert!(log.ids_between(t(13, 0), t(12, 0)).is_empty());
        assert_eq!(log.span(), Some((t(9, 0), t(12, 0))));
    }
}

// ── DemandTable ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod demand_tests {
    use super::*;

    #[test]
    fn counts_calls_per_hour_of_week() {
        let log = IncidentLog::new(vec![incident(t(10, 0)), incident(t(10, 20))]);
        let table = DemandTable::from_incidents(&log);
        let cell = Coordinate::from_utm(262_948, 6_649_765);
        assert!((table.demand(cell, t(10, 45)) - 2.0).abs() < 1e-12);
        assert_eq!(table.demand(cell, t(11, 0)), 0.0);
        assert_eq!(table.demand(cell.offset_cells(1, 0), t(10, 0)), 0.0);
    }

    #[test]
    fn explicit_values() {
        let mut table = DemandTable::new();
        let cell = Coordinate::from_utm(0, 0);
        table.set(cell, 13, 0.75);
        table.set(cell, 500, 9.0);
        assert_eq!(table.cell_count(), 1);
        assert_eq!(table.demand(cell, t(13, 10)), 0.75);
    }
}

// ── Loader ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader_tests {
    use super::*;

    #[test]
    fn loads_valid_rows() {
        let csv = format!(
            "{HEADER}\
2017-08-07 08:01:10,262948,6649765,A,2017-08-07 08:02:00,2017-08-07 08:10:00,2017-08-07 08:30:00,2017-08-07 09:10:00,2017-08-07 09:12:00,0,1\n\
2017-08-07 07:00:00,262948,6649765,H,2017-08-07 07:03:00,,,2017-08-07 07:40:00,,1,0\n"
        );
        let (log, report) = load_incidents_reader(Cursor::new(csv)).unwrap();
        assert_eq!(report.rows, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(log.len(), 2);

        let (_, first) = log.iter().next().unwrap();
        assert_eq!(first.urgency, UrgencyLevel::Urgent);
        assert!(first.is_aborted());
        assert_eq!(first.available_transport, first.available_non_transport);
        assert_eq!(first.arrival_at_hospital, None);
    }

    #[test]
    fn reads_optional_hospital_arrival_column() {
        let csv = format!(
            "{}arrival_at_hospital\n\
2017-08-07 08:01:10,262948,6649765,A,2017-08-07 08:02:00,2017-08-07 08:10:00,2017-08-07 08:30:00,2017-08-07 09:10:00,2017-08-07 09:12:00,0,1,2017-08-07 08:50:00\n",
            HEADER.trim_end().to_owned() + ","
        );
        let (log, report) = load_incidents_reader(Cursor::new(csv)).unwrap();
        assert_eq!(report.skipped, 0);
        let (_, only) = log.iter().next().unwrap();
        assert_eq!(only.arrival_at_hospital, Some(t(8, 50)));
        assert_eq!(only.hospital_time(true), 22 * 60);
    }

    #[test]
    fn malformed_rows_are_skipped_and_counted() {
        let csv = format!(
            "{HEADER}\
2017-08-07 08:01:10,262948,6649765,A,2017-08-07 08:02:00,,,2017-08-07 09:10:00,,0,1\n\
2017-08-07 08:05:00,262948,6649765,A,,,,2017-08-07 09:10:00,,0,1\n\
2017-08-07 08:06:00,262948,6649765,Q,2017-08-07 08:07:00,,,2017-08-07 09:10:00,,0,1\n\
not a time,262948,6649765,A,2017-08-07 08:07:00,,,2017-08-07 09:10:00,,0,1\n"
        );
        let (log, report) = load_incidents_reader(Cursor::new(csv)).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(report.skipped, 3);
        assert!((report.skipped_percent() - 75.0).abs() < 1e-9);
    }
}
