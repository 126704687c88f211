//! Per-ambulance operational state.
//!
//! # State machine
//!
//! ```text
//!            start_shift              dispatch
//!  OffDuty ─────────────► Available ─────────► Dispatched ──┐
//!     ▲                    │  ▲  ▲                 │  ▲      │ begin_transport
//!     └────finish_shift────┘  │  └──complete_job───┤  │      ▼
//!                             │                    └──┘  Transporting
//!                             │                  redirect    │
//!                             └───────complete_job───────────┘
//! ```
//!
//! Transitions not drawn above are rejected with
//! [`SimError::IllegalTransition`].  Movement is tracked separately from the
//! state: an ambulance driving home after a job is already `Available` (or
//! `OffDuty`) while its [`Travel`] is still in progress.
//!
//! Every new trip bumps the ambulance's movement epoch.  Location updates
//! carry the epoch they were scheduled under, so updates left over from an
//! abandoned trip are recognised and dropped.

use ems_core::{AmbulanceId, Coordinate, IncidentId, SimTime, StationId};
use ems_spatial::{DistanceOracle, Route};

use crate::{SimError, SimResult};

// ── AmbulanceState ────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AmbulanceState {
    OffDuty,
    Available,
    /// Assigned to an incident.  `hospital` is set when the unit is to carry
    /// the patient.
    Dispatched {
        incident: IncidentId,
        hospital: Option<Coordinate>,
    },
    Transporting {
        incident: IncidentId,
        hospital: Coordinate,
    },
}

impl AmbulanceState {
    pub fn name(&self) -> &'static str {
        match self {
            AmbulanceState::OffDuty             => "off duty",
            AmbulanceState::Available           => "available",
            AmbulanceState::Dispatched { .. }   => "dispatched",
            AmbulanceState::Transporting { .. } => "transporting",
        }
    }
}

// ── Travel ────────────────────────────────────────────────────────────────────

/// One trip between two cells.
#[derive(Clone, Debug)]
pub struct Travel {
    pub origin:      Coordinate,
    pub destination: Coordinate,
    pub started:     SimTime,
    pub route:       Route,
}

// ── Ambulance ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Ambulance {
    pub id:           AmbulanceId,
    pub base_station: StationId,
    station_location: Coordinate,
    state:            AmbulanceState,
    location:         Coordinate,
    travel:           Option<Travel>,
    epoch:            u32,
    coverage_penalty: f64,
}

impl Ambulance {
    /// A new, off-duty ambulance parked at its station.
    pub fn new(id: AmbulanceId, base_station: StationId, station_location: Coordinate) -> Self {
        Self {
            id,
            base_station,
            station_location,
            state:            AmbulanceState::OffDuty,
            location:         station_location,
            travel:           None,
            epoch:            0,
            coverage_penalty: 0.0,
        }
    }

    #[inline]
    pub fn state(&self) -> AmbulanceState {
        self.state
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        self.state == AmbulanceState::Available
    }

    #[inline]
    pub fn is_off_duty(&self) -> bool {
        self.state == AmbulanceState::OffDuty
    }

    /// The incident the unit is working on, if any.
    pub fn incident(&self) -> Option<IncidentId> {
        match self.state {
            AmbulanceState::Dispatched { incident, .. } | AmbulanceState::Transporting { incident, .. } => {
                Some(incident)
            }
            _ => None,
        }
    }

    /// Last known cell.  Lags behind the true position by at most one
    /// location-update period while moving.
    #[inline]
    pub fn location(&self) -> Coordinate {
        self.location
    }

    #[inline]
    pub fn station_location(&self) -> Coordinate {
        self.station_location
    }

    #[inline]
    pub fn travel(&self) -> Option<&Travel> {
        self.travel.as_ref()
    }

    #[inline]
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Penalty the dispatch policy attached when this unit was last ranked
    /// and chosen.
    #[inline]
    pub fn coverage_penalty(&self) -> f64 {
        self.coverage_penalty
    }

    pub fn set_coverage_penalty(&mut self, penalty: f64) {
        self.coverage_penalty = penalty;
    }

    // ── Transitions ───────────────────────────────────────────────────────

    pub fn start_shift(&mut self) -> SimResult<()> {
        match self.state {
            AmbulanceState::OffDuty => {
                self.state = AmbulanceState::Available;
                Ok(())
            }
            _ => Err(self.illegal("start a shift")),
        }
    }

    pub fn finish_shift(&mut self) -> SimResult<()> {
        match self.state {
            AmbulanceState::Available => {
                self.state = AmbulanceState::OffDuty;
                Ok(())
            }
            _ => Err(self.illegal("finish a shift")),
        }
    }

    /// Send the ambulance to `scene`.  Returns the travel time in seconds.
    pub fn dispatch(
        &mut self,
        incident: IncidentId,
        scene:    Coordinate,
        hospital: Option<Coordinate>,
        now:      SimTime,
        oracle:   &dyn DistanceOracle,
    ) -> SimResult<i64> {
        if !self.is_available() {
            return Err(self.illegal("be dispatched"));
        }
        self.state = AmbulanceState::Dispatched { incident, hospital };
        Ok(self.begin_travel(scene, now, oracle))
    }

    /// Turn a unit that is on its way to one incident towards another.  The
    /// trip starts from wherever the unit is at `now`.  Returns the travel
    /// time in seconds.
    pub fn redirect(
        &mut self,
        incident: IncidentId,
        scene:    Coordinate,
        hospital: Option<Coordinate>,
        now:      SimTime,
        oracle:   &dyn DistanceOracle,
    ) -> SimResult<i64> {
        if !matches!(self.state, AmbulanceState::Dispatched { .. }) {
            return Err(self.illegal("be redirected"));
        }
        self.update_location(now);
        self.state = AmbulanceState::Dispatched { incident, hospital };
        Ok(self.begin_travel(scene, now, oracle))
    }

    /// Leave the scene for the hospital.  Returns the travel time in seconds.
    pub fn begin_transport(&mut self, now: SimTime, oracle: &dyn DistanceOracle) -> SimResult<i64> {
        match self.state {
            AmbulanceState::Dispatched { incident, hospital: Some(hospital) } => {
                self.arrive();
                self.state = AmbulanceState::Transporting { incident, hospital };
                Ok(self.begin_travel(hospital, now, oracle))
            }
            _ => Err(self.illegal("begin transport")),
        }
    }

    /// Finish the current job where the ambulance is and head back to the
    /// station.  Returns the travel time home in seconds.
    pub fn complete_job(&mut self, now: SimTime, oracle: &dyn DistanceOracle) -> SimResult<i64> {
        match self.state {
            AmbulanceState::Dispatched { .. } | AmbulanceState::Transporting { .. } => {
                self.arrive();
                self.state = AmbulanceState::Available;
                let station = self.station_location;
                Ok(self.begin_travel(station, now, oracle))
            }
            _ => Err(self.illegal("complete a job")),
        }
    }

    /// Move along the current trip to where the ambulance is at `now`.
    /// Returns `true` once the trip is over (or if there is none).
    pub fn update_location(&mut self, now: SimTime) -> bool {
        let Some(travel) = &self.travel else {
            return true;
        };
        let elapsed = now - travel.started;
        if elapsed >= travel.route.total_secs {
            self.arrive();
            return true;
        }
        if let Some(cell) = travel.route.position_at(elapsed) {
            self.location = cell;
        }
        false
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Jump to the destination of the current trip, if any.
    fn arrive(&mut self) {
        if let Some(travel) = self.travel.take() {
            self.location = travel.destination;
        }
    }

    fn begin_travel(&mut self, destination: Coordinate, now: SimTime, oracle: &dyn DistanceOracle) -> i64 {
        self.epoch = self.epoch.wrapping_add(1);
        let origin = self.location;
        let travel_secs = oracle.travel_time(origin, destination);
        if origin == destination {
            self.travel = None;
            return 0;
        }
        let mut route = oracle.route(origin, destination);
        route.total_secs = travel_secs;
        self.travel = Some(Travel { origin, destination, started: now, route });
        travel_secs
    }

    fn illegal(&self, action: &'static str) -> SimError {
        SimError::IllegalTransition { ambulance: self.id, state: self.state.name(), action }
    }
}
