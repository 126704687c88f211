//! Simulation configuration.
//!
//! Typically deserialized by the driver (enable the `serde` feature) and
//! passed by reference to every run.  Defaults reproduce the calibrated
//! week of 2017-08-07.

use ems_core::SimTime;

use crate::{SimError, SimResult, TimelineKey};

/// Which ranking the engine uses to pick ambulances for a call.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DispatchPolicyKind {
    /// Straight-line distance.
    Euclidean,
    /// City-block distance.
    Manhattan,
    /// Oracle travel time.
    #[default]
    Fastest,
    /// Travel time, penalized when the station would be left uncovered.
    CoverageBaseStation,
    /// Travel time, penalized when few units remain within seven minutes.
    CoverageNearby,
    /// Travel time, penalized by the predicted demand left uncovered.
    CoveragePredictedDemand,
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// First instant whose responses are recorded.
    pub start: SimTime,

    /// End of the call window (exclusive).  Jobs already started run to
    /// completion after it.
    pub end: SimTime,

    /// Warm-up window before `start`.  Calls inside it are simulated but not
    /// recorded.
    pub buffer_secs: i64,

    /// Ambulances on the day shift, used to size generated allocations.
    pub ambulances_day: usize,

    /// Ambulances on the night shift.
    pub ambulances_night: usize,

    pub dispatch_policy: DispatchPolicyKind,

    /// Interval between simulated position updates of a moving ambulance.
    pub update_location_period_secs: i64,

    /// Hour of the day the day shift starts.
    pub day_shift_start_hour: u32,

    /// Hour of the day the night shift starts.
    pub night_shift_start_hour: u32,

    /// Record responses to regular (non-emergency) calls too.
    pub record_regular_responses: bool,

    /// Let acute and urgent calls take a unit still driving to a non-acute
    /// single-unit job.  The robbed job is dispatched again.
    pub enable_redispatch: bool,

    /// Let a single-unit call book a unit that is carrying a patient.  The
    /// unit leaves for the call once it is done at the hospital.
    pub enable_queue_next: bool,

    /// Use the logged hospital stay where the incident has one instead of
    /// the median handover for its urgency.
    pub historic_hospital_time: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start:                       SimTime(1_502_064_000), // 2017-08-07 00:00
            end:                         SimTime(1_502_668_800), // 2017-08-14 00:00
            buffer_secs:                 4 * 3_600,
            ambulances_day:              45,
            ambulances_night:            29,
            dispatch_policy:             DispatchPolicyKind::default(),
            update_location_period_secs: 5 * 60,
            day_shift_start_hour:        8,
            night_shift_start_hour:      20,
            record_regular_responses:    false,
            enable_redispatch:           false,
            enable_queue_next:           false,
            historic_hospital_time:      false,
        }
    }
}

impl SimConfig {
    /// Start of the simulated call window, warm-up included.
    #[inline]
    pub fn first_call_time(&self) -> SimTime {
        self.start.plus_secs(-self.buffer_secs)
    }

    /// Key identifying the incident window of this configuration.
    pub fn timeline_key(&self) -> TimelineKey {
        TimelineKey { from: self.first_call_time(), to: self.end }
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.end <= self.start {
            return Err(SimError::Config(format!("end {} is not after start {}", self.end, self.start)));
        }
        if self.buffer_secs < 0 {
            return Err(SimError::Config("negative warm-up buffer".into()));
        }
        if self.update_location_period_secs <= 0 {
            return Err(SimError::Config("location update period must be positive".into()));
        }
        if self.day_shift_start_hour >= self.night_shift_start_hour || self.night_shift_start_hour > 23 {
            return Err(SimError::Config(format!(
                "shift hours day={} night={} must satisfy day < night <= 23",
                self.day_shift_start_hour, self.night_shift_start_hour
            )));
        }
        Ok(())
    }
}
