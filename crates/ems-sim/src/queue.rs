//! The event queue and the waiting-call queue.
//!
//! # Event ordering
//!
//! `EventQueue` is a `BTreeMap<SimTime, VecDeque<Event>>`: events pop in
//! timestamp order and, within one timestamp, in the order they were pushed.
//! O(log T) push and pop where T = number of distinct pending timestamps.
//!
//! # Call ordering
//!
//! `CallQueue` keys waiting calls by (call-received time, incident id), so
//! calls are always retried oldest first, whether they were queued on
//! arrival or re-queued after a partial or failed retry.

use std::collections::{BTreeMap, VecDeque};

use ems_core::{IncidentId, SimTime};

use crate::{Call, Event};

// ── EventQueue ────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct EventQueue {
    inner: BTreeMap<SimTime, VecDeque<Event>>,
    /// Cached total event count for O(1) `len()`.
    total: usize,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time: SimTime, event: Event) {
        self.inner.entry(time).or_default().push_back(event);
        self.total += 1;
    }

    /// Remove and return the earliest event.
    pub fn pop(&mut self) -> Option<(SimTime, Event)> {
        let mut entry = self.inner.first_entry()?;
        let time = *entry.key();
        let event = entry.get_mut().pop_front();
        if entry.get().is_empty() {
            entry.remove();
        }
        let event = event?;
        self.total -= 1;
        Some((time, event))
    }

    /// Drop every scene departure and job completion of `incident`.
    /// Returns how many were dropped.
    pub fn cancel_jobs(&mut self, incident: IncidentId) -> usize {
        let before = self.total;
        self.inner.retain(|_, bucket| {
            bucket.retain(|event| match event {
                Event::SceneDeparture { incident: i, .. } | Event::JobCompletion { incident: i, .. } => *i != incident,
                _ => true,
            });
            !bucket.is_empty()
        });
        self.total = self.inner.values().map(VecDeque::len).sum();
        before - self.total
    }

    /// Timestamp of the earliest pending event.
    pub fn next_time(&self) -> Option<SimTime> {
        self.inner.keys().next().copied()
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

// ── CallQueue ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct CallQueue {
    inner: BTreeMap<(SimTime, IncidentId), Call>,
}

impl CallQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `call`, received at `received`.
    pub fn push(&mut self, received: SimTime, call: Call) {
        self.inner.insert((received, call.incident), call);
    }

    /// Remove and return the oldest waiting call.
    pub fn pop_front(&mut self) -> Option<Call> {
        self.inner.pop_first().map(|(_, call)| call)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
