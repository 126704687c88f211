//! Output of one simulation run.

use ems_core::SimTime;
use ems_incident::UrgencyLevel;

/// One measured response.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ResponseRecord {
    pub call_received: SimTime,
    pub response_secs: i64,
    pub urgency:       UrgencyLevel,
}

impl ResponseRecord {
    pub fn survival_probability(&self) -> f64 {
        self.urgency.survival_probability(self.response_secs)
    }
}

/// All responses recorded in one run, in the order they were recorded.
#[derive(Clone, Debug, Default)]
pub struct SimulationResults {
    records: Vec<ResponseRecord>,
}

impl SimulationResults {
    pub fn new(records: Vec<ResponseRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ResponseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Survival estimate of every recorded response, in record order.
    pub fn survival_rates(&self) -> Vec<f64> {
        self.records.iter().map(ResponseRecord::survival_probability).collect()
    }

    /// Mean response time in seconds; `None` without records.
    pub fn average_response_secs(&self) -> Option<f64> {
        mean(self.records.iter().map(|r| r.response_secs as f64))
    }

    /// Mean survival estimate; `None` without records.
    pub fn average_survival_rate(&self) -> Option<f64> {
        mean(self.records.iter().map(ResponseRecord::survival_probability))
    }

    /// Mean response time over the responses of one urgency level.
    pub fn average_response_secs_for(&self, urgency: UrgencyLevel) -> Option<f64> {
        mean(
            self.records
                .iter()
                .filter(|r| r.urgency == urgency)
                .map(|r| r.response_secs as f64),
        )
    }

    /// Share of responses of `urgency` that arrived within `limit_secs`.
    pub fn share_within(&self, urgency: UrgencyLevel, limit_secs: i64) -> Option<f64> {
        mean(
            self.records
                .iter()
                .filter(|r| r.urgency == urgency)
                .map(|r| if r.response_secs <= limit_secs { 1.0 } else { 0.0 }),
        )
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
