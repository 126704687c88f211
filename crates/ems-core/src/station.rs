//! The static base-station table.
//!
//! A [`StationTable`] is built once at start-up and shared read-only by
//! every simulation run and every optimizer task.  [`StationTable::oslo`]
//! returns the 19 stations of the Oslo and Akershus service area with their
//! catchment populations.  Per-shift capacities are calibration values.

use crate::{Coordinate, CoreError, CoreResult, StationId};

/// One ambulance depot.
#[derive(Clone, Debug, PartialEq)]
pub struct BaseStation {
    pub id:         StationId,
    pub name:       String,
    pub coordinate: Coordinate,
    /// Catchment population, used to derive the population weight.
    pub population: u32,
    /// Maximum number of ambulances the station can host in one shift.
    pub capacity:   u32,
}

/// Immutable, dense table of base stations indexed by [`StationId`].
#[derive(Clone, Debug)]
pub struct StationTable {
    stations:         Vec<BaseStation>,
    total_population: u64,
}

impl StationTable {
    /// Build a table.  Station ids must be exactly `0..n` in order.
    pub fn new(stations: Vec<BaseStation>) -> CoreResult<Self> {
        if stations.is_empty() {
            return Err(CoreError::InvalidStationTable("no stations".into()));
        }
        for (i, station) in stations.iter().enumerate() {
            if station.id.index() != i {
                return Err(CoreError::InvalidStationTable(format!(
                    "station {} listed at position {i}",
                    station.id
                )));
            }
        }
        let total_population = stations.iter().map(|s| s.population as u64).sum();
        Ok(Self { stations, total_population })
    }

    /// The Oslo / Akershus station set.
    pub fn oslo() -> Self {
        const TABLE: [(&str, i64, i64, u32, u32); 19] = [
            ("Eidsvoll",       287_187, 6_692_448,  36_967, 3),
            ("Nes",            304_199, 6_669_959,  22_392, 2),
            ("Ullensaker",     286_455, 6_671_754,  44_736, 4),
            ("Aurskog-Holand", 307_577, 6_642_937,  18_098, 2),
            ("Lorenskog",      275_840, 6_650_643, 102_552, 6),
            ("Nittedal",       270_631, 6_663_254,  19_432, 2),
            ("Brobekk",        267_085, 6_651_035,  79_480, 5),
            ("Sentrum",        262_948, 6_649_765, 137_493, 7),
            ("Ullevaal",       261_774, 6_652_003, 123_820, 6),
            ("Nordre Follo",   266_827, 6_627_037,  47_309, 3),
            ("Sondre Follo",   259_265, 6_621_267,  48_164, 3),
            ("Prinsdal",       265_048, 6_640_259,  94_080, 5),
            ("Asker",          244_478, 6_641_283,  49_820, 3),
            ("Baerum",         248_901, 6_648_585,  65_986, 4),
            ("Smestad",        259_127, 6_652_543,  99_298, 5),
            ("Ryen",           265_439, 6_646_945,  94_507, 5),
            ("Grorud",         270_248, 6_654_139,  81_692, 4),
            ("Skedsmokorset",  279_180, 6_657_962,  51_117, 3),
            ("Bekkestua",      253_295, 6_650_494,  83_909, 4),
        ];

        let stations: Vec<BaseStation> = TABLE
            .iter()
            .enumerate()
            .map(|(i, &(name, easting, northing, population, capacity))| BaseStation {
                id:         StationId(i as u16),
                name:       name.to_string(),
                coordinate: Coordinate::from_utm(easting, northing),
                population,
                capacity,
            })
            .collect();
        let total_population = stations.iter().map(|s| s.population as u64).sum();
        Self { stations, total_population }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn get(&self, id: StationId) -> CoreResult<&BaseStation> {
        self.stations.get(id.index()).ok_or(CoreError::UnknownStation(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &BaseStation> + '_ {
        self.stations.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = StationId> + '_ {
        self.stations.iter().map(|s| s.id)
    }

    /// Share of the total catchment population served by `id`, in `[0, 1]`.
    pub fn population_weight(&self, id: StationId) -> f64 {
        match self.stations.get(id.index()) {
            Some(s) if self.total_population > 0 => s.population as f64 / self.total_population as f64,
            _ => 0.0,
        }
    }

    /// Capacity of `id` per shift; unknown stations have no capacity.
    pub fn capacity(&self, id: StationId) -> u32 {
        self.stations.get(id.index()).map_or(0, |s| s.capacity)
    }

    /// Sum of all station capacities for one shift.
    pub fn total_capacity(&self) -> u32 {
        self.stations.iter().map(|s| s.capacity).sum()
    }
}
