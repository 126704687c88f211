//! The shared simulator and its builder.

use std::sync::Arc;

use tracing::debug;

use ems_core::{Allocation, IncidentId, StationTable};
use ems_incident::{DemandTable, IncidentLog};
use ems_spatial::{DistanceOracle, HospitalIndex};

use crate::engine::Run;
use crate::{NoopObserver, SimConfig, SimError, SimObserver, SimResult, SimulationResults, TimelineCache};

/// Read-only world model shared by every simulation run.
///
/// Create via [`SimulatorBuilder`].  `Simulator` is `Send + Sync`; wrap it in
/// an `Arc` to evaluate allocations from several threads at once.
pub struct Simulator {
    pub(crate) incidents: Arc<IncidentLog>,
    pub(crate) oracle:    Arc<dyn DistanceOracle>,
    pub(crate) stations:  Arc<StationTable>,
    pub(crate) hospitals: Arc<HospitalIndex>,
    pub(crate) demand:    Arc<DemandTable>,
    timelines:            TimelineCache,
}

impl Simulator {
    /// Replay the incident window of `config` against `allocation`.
    pub fn simulate(&self, allocation: &Allocation, config: &SimConfig) -> SimResult<SimulationResults> {
        self.simulate_with(allocation, config, &mut NoopObserver)
    }

    /// Like [`Simulator::simulate`], reporting progress to `observer`.
    pub fn simulate_with<O: SimObserver>(
        &self,
        allocation: &Allocation,
        config:     &SimConfig,
        observer:   &mut O,
    ) -> SimResult<SimulationResults> {
        config.validate()?;
        for shift in ems_core::ShiftType::ALL {
            for &station in allocation.shift(shift) {
                self.stations.get(station)?;
            }
        }
        let timeline = self.timeline(config);
        Run::new(self, config, allocation, &timeline)?.execute(observer)
    }

    /// Incidents of the configured call window, in call order.
    pub fn timeline(&self, config: &SimConfig) -> Arc<[IncidentId]> {
        let key = config.timeline_key();
        self.timelines.get_or_build(key, || {
            let ids = self.incidents.ids_between(key.from, key.to);
            debug!(from = %key.from, to = %key.to, incidents = ids.len(), "built incident timeline");
            ids
        })
    }

    pub fn incidents(&self) -> &IncidentLog {
        &self.incidents
    }

    pub fn stations(&self) -> &StationTable {
        &self.stations
    }

    pub fn oracle(&self) -> &dyn DistanceOracle {
        self.oracle.as_ref()
    }

    /// Shared handle to the station table, for callers that outlive a borrow.
    pub fn shared_stations(&self) -> Arc<StationTable> {
        Arc::clone(&self.stations)
    }

    pub fn shared_oracle(&self) -> Arc<dyn DistanceOracle> {
        Arc::clone(&self.oracle)
    }

    /// Number of memoized call windows.
    pub fn cached_timelines(&self) -> usize {
        self.timelines.len()
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Fluent builder for [`Simulator`].
///
/// # Required inputs
///
/// - [`IncidentLog`] — the historical calls
/// - a [`DistanceOracle`] — travel times and routes
///
/// # Optional inputs (have defaults)
///
/// | Method          | Default                     |
/// |-----------------|-----------------------------|
/// | `.stations(t)`  | `StationTable::oslo()`      |
/// | `.hospitals(h)` | `HospitalIndex::oslo()`     |
/// | `.demand(d)`    | Empty `DemandTable`         |
///
/// # Example
///
/// ```rust,ignore
/// let simulator = SimulatorBuilder::new(incidents, Arc::new(StraightLineOracle::default()))
///     .demand(DemandTable::from_incidents(&log))
///     .build()?;
/// let results = simulator.simulate(&allocation, &SimConfig::default())?;
/// ```
pub struct SimulatorBuilder {
    incidents: Arc<IncidentLog>,
    oracle:    Arc<dyn DistanceOracle>,
    stations:  Option<Arc<StationTable>>,
    hospitals: Option<Arc<HospitalIndex>>,
    demand:    Option<Arc<DemandTable>>,
}

impl SimulatorBuilder {
    pub fn new(incidents: impl Into<Arc<IncidentLog>>, oracle: Arc<dyn DistanceOracle>) -> Self {
        Self {
            incidents: incidents.into(),
            oracle,
            stations:  None,
            hospitals: None,
            demand:    None,
        }
    }

    pub fn stations(mut self, stations: impl Into<Arc<StationTable>>) -> Self {
        self.stations = Some(stations.into());
        self
    }

    pub fn hospitals(mut self, hospitals: impl Into<Arc<HospitalIndex>>) -> Self {
        self.hospitals = Some(hospitals.into());
        self
    }

    pub fn demand(mut self, demand: impl Into<Arc<DemandTable>>) -> Self {
        self.demand = Some(demand.into());
        self
    }

    pub fn build(self) -> SimResult<Simulator> {
        let stations = self.stations.unwrap_or_else(|| Arc::new(StationTable::oslo()));
        if stations.is_empty() {
            return Err(SimError::Config("station table is empty".into()));
        }
        Ok(Simulator {
            incidents: self.incidents,
            oracle:    self.oracle,
            stations,
            hospitals: self.hospitals.unwrap_or_else(|| Arc::new(HospitalIndex::oslo())),
            demand:    self.demand.unwrap_or_default(),
            timelines: TimelineCache::new(),
        })
    }
}
