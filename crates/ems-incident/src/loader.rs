//! CSV incident loader.
//!
//! # CSV format
//!
//! One row per call, timestamps as `YYYY-MM-DD HH:MM:SS`, coordinates in
//! UTM zone 33 meters:
//!
//! ```csv
//! call_received,easting,northing,urgency,dispatched,arrival_at_scene,departure_from_scene,available_non_transport,available_transport,non_transporting_vehicles,transporting_vehicles
//! 2017-08-07 08:01:10,262948,6649765,A,2017-08-07 08:02:00,2017-08-07 08:10:00,2017-08-07 08:30:00,2017-08-07 09:10:00,2017-08-07 09:10:00,0,1
//! ```
//!
//! An optional `arrival_at_hospital` column may follow; files without it
//! load with no hospital arrivals.
//!
//! # Recovery
//!
//! A row that cannot be used is skipped, not fatal: unparsable fields, an
//! unknown urgency symbol, or a blank `dispatched` or
//! `available_non_transport`.  Skipped rows are counted and the share is
//! logged once loading finishes.  A blank `available_transport` falls back to
//! `available_non_transport`.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use ems_core::{Coordinate, SimTime};

use crate::{Incident, IncidentError, IncidentLog, IncidentResult, UrgencyLevel};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct IncidentRecord {
    call_received:             String,
    easting:                   f64,
    northing:                  f64,
    urgency:                   String,
    dispatched:                Option<String>,
    arrival_at_scene:          Option<String>,
    departure_from_scene:      Option<String>,
    #[serde(default)]
    arrival_at_hospital:       Option<String>,
    available_non_transport:   Option<String>,
    available_transport:       Option<String>,
    non_transporting_vehicles: u32,
    transporting_vehicles:     u32,
}

impl IncidentRecord {
    fn into_incident(self) -> Result<Incident, String> {
        let urgency = UrgencyLevel::from_symbol(&self.urgency)
            .ok_or_else(|| format!("unknown urgency {:?}", self.urgency))?;
        let dispatched = required(self.dispatched, "dispatched")?;
        let available_non_transport = required(self.available_non_transport, "available_non_transport")?;
        let available_transport = optional(self.available_transport)?.unwrap_or(available_non_transport);

        Ok(Incident {
            call_received: parse_time(&self.call_received)?,
            location: Coordinate::from_utm(self.easting.round() as i64, self.northing.round() as i64),
            urgency,
            dispatched,
            arrival_at_scene: optional(self.arrival_at_scene)?,
            departure_from_scene: optional(self.departure_from_scene)?,
            arrival_at_hospital: optional(self.arrival_at_hospital)?,
            available_non_transport,
            available_transport,
            non_transporting_vehicles: self.non_transporting_vehicles,
            transporting_vehicles: self.transporting_vehicles,
        })
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Row accounting for one load.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows:    usize,
    pub skipped: usize,
}

impl LoadReport {
    /// Skipped rows as a percentage of all data rows.
    pub fn skipped_percent(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            100.0 * self.skipped as f64 / self.rows as f64
        }
    }
}

/// Load incidents from a CSV file.
pub fn load_incidents_csv(path: &Path) -> IncidentResult<(IncidentLog, LoadReport)> {
    let file = std::fs::File::open(path)?;
    load_incidents_reader(file)
}

/// Like [`load_incidents_csv`] but accepts any `Read` source.
///
/// Useful for testing (pass a `std::io::Cursor`).
pub fn load_incidents_reader<R: Read>(reader: R) -> IncidentResult<(IncidentLog, LoadReport)> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut incidents: Vec<Incident> = Vec::new();
    let mut report = LoadReport::default();

    for (line, result) in csv_reader.deserialize::<IncidentRecord>().enumerate() {
        report.rows += 1;
        let parsed = match result {
            Ok(record) => record.into_incident(),
            Err(e) if e.is_io_error() => return Err(IncidentError::Parse(e.to_string())),
            Err(e) => Err(e.to_string()),
        };
        match parsed {
            Ok(incident) => incidents.push(incident),
            Err(reason) => {
                report.skipped += 1;
                debug!(row = line + 1, %reason, "skipping incident row");
            }
        }
    }

    info!(
        loaded = incidents.len(),
        skipped = report.skipped,
        skipped_percent = report.skipped_percent(),
        "incident log loaded"
    );
    Ok((IncidentLog::new(incidents), report))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_time(text: &str) -> Result<SimTime, String> {
    SimTime::parse(text).map_err(|e| e.to_string())
}

fn optional(field: Option<String>) -> Result<Option<SimTime>, String> {
    match field {
        Some(text) if !text.trim().is_empty() => parse_time(&text).map(Some),
        _ => Ok(None),
    }
}

fn required(field: Option<String>, name: &str) -> Result<SimTime, String> {
    optional(field)?.ok_or_else(|| format!("blank {name}"))
}
