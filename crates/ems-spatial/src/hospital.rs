//! Emergency hospitals and nearest-hospital lookup.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) over the hospital cell centroids answers "which
//! hospital is closest to this incident" in O(log H).  Distances are planar
//! (UTM meters), which is exact enough inside one service area.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use ems_core::{Coordinate, HospitalId};

#[derive(Debug, Clone, PartialEq)]
pub struct Hospital {
    pub id:         HospitalId,
    pub name:       String,
    pub coordinate: Coordinate,
}

// ── R-tree entry ──────────────────────────────────────────────────────────────

/// A `[easting, northing]` point tagged with the hospital's position in the
/// index's list.
struct HospitalEntry {
    point: [f64; 2],
    slot:  usize,
}

impl RTreeObject for HospitalEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for HospitalEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let de = self.point[0] - point[0];
        let dn = self.point[1] - point[1];
        de * de + dn * dn
    }
}

// ── HospitalIndex ─────────────────────────────────────────────────────────────

pub struct HospitalIndex {
    hospitals: Vec<Hospital>,
    tree:      RTree<HospitalEntry>,
}

impl HospitalIndex {
    pub fn new(hospitals: Vec<Hospital>) -> Self {
        let entries = hospitals
            .iter()
            .enumerate()
            .map(|(slot, h)| HospitalEntry { point: centroid(h.coordinate), slot })
            .collect();
        Self { hospitals, tree: RTree::bulk_load(entries) }
    }

    /// Emergency hospitals of the Oslo / Akershus service area.
    pub fn oslo() -> Self {
        const TABLE: [(&str, i64, i64); 7] = [
            ("Ullevaal",        261_500, 6_652_400),
            ("Rikshospitalet",  260_500, 6_653_300),
            ("Aker",            264_200, 6_652_300),
            ("Ahus",            274_800, 6_651_200),
            ("Baerum",          245_600, 6_639_700),
            ("Diakonhjemmet",   259_300, 6_651_300),
            ("Lovisenberg",     262_700, 6_651_300),
        ];
        let hospitals = TABLE
            .iter()
            .enumerate()
            .map(|(i, &(name, e, n))| Hospital {
                id:         HospitalId(i as u16),
                name:       name.to_string(),
                coordinate: Coordinate::from_utm(e, n),
            })
            .collect();
        Self::new(hospitals)
    }

    pub fn len(&self) -> usize {
        self.hospitals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hospitals.is_empty()
    }

    /// The hospital closest to `location`, `None` if the index is empty.
    pub fn nearest(&self, location: Coordinate) -> Option<&Hospital> {
        self.tree
            .nearest_neighbor(&centroid(location))
            .map(|entry| &self.hospitals[entry.slot])
    }
}

fn centroid(c: Coordinate) -> [f64; 2] {
    [c.easting() as f64, c.northing() as f64]
}
