//! Simulation time model.
//!
//! # Design
//!
//! Time is a plain count of seconds since the Unix epoch, held in
//! [`SimTime`].  Historical incident timestamps are wall-clock readings in the
//! service's local time zone; they are stored as if they were UTC so that
//! hour-of-day and day-of-week arithmetic stays exact integer math and no
//! time-zone database is consulted during a run.
//!
//! Integer seconds as the canonical unit means all event arithmetic is exact
//! and comparisons are O(1).  `chrono` is only used at the edges: parsing
//! dataset timestamps and rendering times for logs.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::{CoreError, CoreResult};

/// Timestamp layout used by the historical datasets.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SECS_PER_HOUR: i64 = 3_600;
const SECS_PER_DAY:  i64 = 86_400;

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An absolute point in simulated time, in seconds since the Unix epoch.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub i64);

impl SimTime {
    /// Build a timestamp from calendar fields.  Returns `None` for an
    /// impossible date or time.
    pub fn from_ymd_hms(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<SimTime> {
        let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, min, sec)?;
        Some(SimTime(naive.and_utc().timestamp()))
    }

    /// Parse a `YYYY-MM-DD HH:MM:SS` timestamp.
    pub fn parse(text: &str) -> CoreResult<SimTime> {
        NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT)
            .map(|naive| SimTime(naive.and_utc().timestamp()))
            .map_err(|e| CoreError::Parse(format!("timestamp {text:?}: {e}")))
    }

    #[inline]
    pub fn secs(self) -> i64 {
        self.0
    }

    /// The timestamp `secs` seconds after `self` (negative moves backwards).
    #[inline]
    pub fn plus_secs(self, secs: i64) -> SimTime {
        SimTime(self.0 + secs)
    }

    /// Signed seconds elapsed from `earlier` to `self`.
    #[inline]
    pub fn secs_since(self, earlier: SimTime) -> i64 {
        self.0 - earlier.0
    }

    /// Hour of the day, `0..24`.
    #[inline]
    pub fn hour_of_day(self) -> u32 {
        (self.0.rem_euclid(SECS_PER_DAY) / SECS_PER_HOUR) as u32
    }

    /// Day of the week with Monday = 0.  1970-01-01 was a Thursday.
    #[inline]
    pub fn weekday(self) -> u32 {
        (self.0.div_euclid(SECS_PER_DAY) + 3).rem_euclid(7) as u32
    }

    /// Hour of the week, `0..168`, starting Monday 00:00.
    #[inline]
    pub fn hour_of_week(self) -> usize {
        (self.weekday() * 24 + self.hour_of_day()) as usize
    }
}

impl std::ops::Sub for SimTime {
    type Output = i64;
    #[inline]
    fn sub(self, rhs: SimTime) -> i64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::from_timestamp(self.0, 0) {
            Some(dt) => write!(f, "{}", dt.naive_utc().format(TIMESTAMP_FORMAT)),
            None     => write!(f, "t{}", self.0),
        }
    }
}

// ── ShiftType ─────────────────────────────────────────────────────────────────

/// The two daily shifts of the service.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShiftType {
    Day,
    Night,
}

impl ShiftType {
    pub const ALL: [ShiftType; 2] = [ShiftType::Day, ShiftType::Night];

    /// The shift active at `time`, given the hour the day shift starts and
    /// the hour the night shift starts.
    pub fn at(time: SimTime, day_start_hour: u32, night_start_hour: u32) -> ShiftType {
        let hour = time.hour_of_day();
        if hour >= day_start_hour && hour < night_start_hour {
            ShiftType::Day
        } else {
            ShiftType::Night
        }
    }

    /// Position in [`ShiftType::ALL`], used to index per-shift arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            ShiftType::Day   => 0,
            ShiftType::Night => 1,
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftType::Day   => f.write_str("day"),
            ShiftType::Night => f.write_str("night"),
        }
    }
}
