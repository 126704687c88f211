//! The time-ordered incident list.

use ems_core::{IncidentId, SimTime};

use crate::Incident;

/// Immutable list of incidents sorted by call-received time.  Shared
/// read-only by every simulation run.
#[derive(Clone, Debug, Default)]
pub struct IncidentLog {
    incidents: Vec<Incident>,
}

impl IncidentLog {
    /// Sort `incidents` by call time.  The sort is stable, so records with the
    /// same call time keep their input order.
    pub fn new(mut incidents: Vec<Incident>) -> Self {
        incidents.sort_by_key(|i| i.call_received);
        Self { incidents }
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }

    pub fn get(&self, id: IncidentId) -> Option<&Incident> {
        self.incidents.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (IncidentId, &Incident)> + '_ {
        self.incidents
            .iter()
            .enumerate()
            .map(|(i, incident)| (IncidentId(i as u32), incident))
    }

    /// Ids of the incidents whose call was received in `[from, to)`, in call
    /// order.
    pub fn ids_between(&self, from: SimTime, to: SimTime) -> Vec<IncidentId> {
        let first = self.incidents.partition_point(|i| i.call_received < from);
        let last = self.incidents.partition_point(|i| i.call_received < to);
        (first..last.max(first)).map(|i| IncidentId(i as u32)).collect()
    }

    /// Call time of the first and last incident.
    pub fn span(&self) -> Option<(SimTime, SimTime)> {
        Some((self.incidents.first()?.call_received, self.incidents.last()?.call_received))
    }
}
