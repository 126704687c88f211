//! The common optimizer interface.

use std::time::Duration;

use crate::{OptimResult, Solution};

pub trait Optimizer {
    /// Run the search to completion (generation, step or time budget).
    /// Discards the results of any earlier run.
    fn optimize(&mut self) -> OptimResult<()>;

    /// Best solution of the last run, `None` before the first.
    fn optimal_solution(&self) -> Option<&Solution>;

    fn run_statistics(&self) -> &RunStatistics;

    /// Short name used in logs and reports.
    fn abbreviation(&self) -> &'static str;
}

/// Per-generation (or per-step) progress series of one run.
///
/// Single-solution searches record their current fitness under `average`
/// and leave `diversity` empty.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunStatistics {
    pub best:      Vec<f64>,
    pub average:   Vec<f64>,
    pub diversity: Vec<f64>,
    pub elapsed:   Duration,
}

impl RunStatistics {
    pub fn record(&mut self, best: f64, average: f64, diversity: Option<f64>) {
        self.best.push(best);
        self.average.push(average);
        if let Some(d) = diversity {
            self.diversity.push(d);
        }
    }

    /// Generations (or steps) recorded.
    #[inline]
    pub fn generations(&self) -> usize {
        self.best.len()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
