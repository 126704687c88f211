//! Memoized per-configuration incident windows.
//!
//! Filtering the incident log down to a configuration's call window is the
//! same work for every run with that window.  `TimelineCache` keeps the
//! result per [`TimelineKey`]: lookups take a shared read lock, and the first
//! run that needs a missing window builds it under the write lock, so each
//! window is built exactly once.  Entries are never removed.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use ems_core::{IncidentId, SimTime};

/// Identifies the call window `[from, to)` of a configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimelineKey {
    pub from: SimTime,
    pub to:   SimTime,
}

#[derive(Default)]
pub struct TimelineCache {
    entries: RwLock<HashMap<TimelineKey, Arc<[IncidentId]>>>,
}

impl TimelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached window for `key`, building it with `build` on first use.
    pub fn get_or_build<F>(&self, key: TimelineKey, build: F) -> Arc<[IncidentId]>
    where
        F: FnOnce() -> Vec<IncidentId>,
    {
        if let Some(ids) = self.entries.read().get(&key) {
            return Arc::clone(ids);
        }
        let mut entries = self.entries.write();
        Arc::clone(entries.entry(key).or_insert_with(|| build().into()))
    }

    /// Number of cached windows.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
