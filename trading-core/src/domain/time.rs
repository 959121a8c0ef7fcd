//! `Datetime` and `TimeDelta` — the value types shared by the trading system
//! and the timer scheduler.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

const MICROS_PER_SEC: i64 = 1_000_000;
const MICROS_PER_DAY: i64 = MICROS_PER_SEC * 60 * 60 * 24;

/// An absolute instant at microsecond resolution.
///
/// Backed by `chrono::NaiveDateTime` truncated to microseconds on
/// construction, so `ticks()` always round-trips through `from_ticks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Datetime(NaiveDateTime);

impl Datetime {
    pub fn from_naive(dt: NaiveDateTime) -> Self {
        let micros = dt.and_utc().timestamp_micros();
        Self::from_unix_micros(micros)
    }

    /// Microseconds since the Unix epoch.
    pub fn from_unix_micros(micros: i64) -> Self {
        let dt = chrono::DateTime::from_timestamp_micros(micros)
            .expect("micros within chrono's representable range")
            .naive_utc();
        Datetime(dt)
    }

    pub fn unix_micros(&self) -> i64 {
        self.0.and_utc().timestamp_micros()
    }

    pub fn naive(&self) -> NaiveDateTime {
        self.0
    }

    /// Midnight of the same calendar day.
    pub fn start_of_day(&self) -> Datetime {
        Datetime(self.0.date().and_hms_opt(0, 0, 0).expect("midnight is valid"))
    }

    /// Time-of-day offset from midnight, as a `TimeDelta` in `[0, 24h)`.
    pub fn time_of_day(&self) -> TimeDelta {
        let midnight = self.start_of_day();
        TimeDelta::from_ticks(self.unix_micros() - midnight.unix_micros())
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// The current wall-clock instant. Used by the timer scheduler as its
    /// notion of "now"; the trading system itself never calls this since
    /// `runMoment` is driven entirely by the bar stream.
    pub fn now() -> Datetime {
        Datetime::from_naive(chrono::Utc::now().naive_utc())
    }

    /// The earliest representable instant.
    pub fn min_value() -> Datetime {
        Datetime(
            NaiveDate::from_ymd_opt(1, 1, 1)
                .expect("valid date")
                .and_hms_opt(0, 0, 0)
                .expect("valid time"),
        )
    }

    /// The latest representable instant.
    pub fn max_value() -> Datetime {
        Datetime(
            NaiveDate::from_ymd_opt(9999, 12, 31)
                .expect("valid date")
                .and_hms_micro_opt(23, 59, 59, 999_999)
                .expect("valid time"),
        )
    }
}

impl fmt::Display for Datetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S%.6f"))
    }
}

impl Add<TimeDelta> for Datetime {
    type Output = Datetime;

    fn add(self, rhs: TimeDelta) -> Datetime {
        Datetime::from_unix_micros(self.unix_micros() + rhs.ticks())
    }
}

impl Sub<TimeDelta> for Datetime {
    type Output = Datetime;

    fn sub(self, rhs: TimeDelta) -> Datetime {
        Datetime::from_unix_micros(self.unix_micros() - rhs.ticks())
    }
}

impl Sub<Datetime> for Datetime {
    type Output = TimeDelta;

    fn sub(self, rhs: Datetime) -> TimeDelta {
        TimeDelta::from_ticks(self.unix_micros() - rhs.unix_micros())
    }
}

/// A signed duration expressed as a tick count in microseconds.
///
/// When used to represent a time-of-day (as opposed to an elapsed span),
/// callers are expected to check [`TimeDelta::is_time_of_day`] — the type
/// itself does not restrict the range, matching spec.md's "bounded to
/// `[0, 24h)` when used as time-of-day" (a usage constraint, not an
/// invariant of every `TimeDelta`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeDelta(i64);

impl TimeDelta {
    pub const fn from_ticks(ticks: i64) -> Self {
        TimeDelta(ticks)
    }

    pub const fn from_micros(micros: i64) -> Self {
        TimeDelta(micros)
    }

    pub const fn from_millis(millis: i64) -> Self {
        TimeDelta(millis * 1_000)
    }

    pub const fn from_secs(secs: i64) -> Self {
        TimeDelta(secs * MICROS_PER_SEC)
    }

    pub const fn from_mins(mins: i64) -> Self {
        TimeDelta(mins * 60 * MICROS_PER_SEC)
    }

    pub const fn from_hours(hours: i64) -> Self {
        TimeDelta(hours * 60 * 60 * MICROS_PER_SEC)
    }

    pub const fn from_hms(h: i64, m: i64, s: i64) -> Self {
        TimeDelta(h * 3_600 * MICROS_PER_SEC + m * 60 * MICROS_PER_SEC + s * MICROS_PER_SEC)
    }

    pub const fn zero() -> Self {
        TimeDelta(0)
    }

    pub const fn one_day() -> Self {
        TimeDelta(MICROS_PER_DAY)
    }

    /// Integer tick count (microseconds). Always round-trips through
    /// `from_ticks`.
    pub const fn ticks(&self) -> i64 {
        self.0
    }

    /// Whether this delta is a valid time-of-day offset: `[0, 24h)`.
    pub fn is_time_of_day(&self) -> bool {
        self.0 >= 0 && self.0 < MICROS_PER_DAY
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Add for TimeDelta {
    type Output = TimeDelta;

    fn add(self, rhs: TimeDelta) -> TimeDelta {
        TimeDelta(self.0 + rhs.0)
    }
}

impl Sub for TimeDelta {
    type Output = TimeDelta;

    fn sub(self, rhs: TimeDelta) -> TimeDelta {
        TimeDelta(self.0 - rhs.0)
    }
}

/// Build a `Datetime` from a calendar date plus a time-of-day `TimeDelta`.
pub fn datetime_from_date_and_time(date: NaiveDate, time_of_day: TimeDelta) -> Datetime {
    debug_assert!(time_of_day.is_time_of_day());
    let midnight = Datetime::from_naive(date.and_hms_opt(0, 0, 0).expect("midnight is valid"));
    midnight + time_of_day
}

/// Extract the hour/minute/second component of a `Datetime`, ignoring date.
pub fn hms(dt: Datetime) -> (u32, u32, u32) {
    let n = dt.naive();
    (n.hour(), n.minute(), n.second())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_time_delta_round_trips() {
        let d = Datetime::from_unix_micros(1_700_000_000_000_000);
        let delta = TimeDelta::from_hours(3);
        let later = d + delta;
        assert_eq!(later - d, delta);
    }

    #[test]
    fn start_of_day_is_midnight() {
        let d = datetime_from_date_and_time(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            TimeDelta::from_hms(14, 30, 0),
        );
        let sod = d.start_of_day();
        assert_eq!(sod.time_of_day(), TimeDelta::zero());
        assert_eq!(sod.date(), d.date());
    }

    #[test]
    fn time_of_day_round_trips() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let tod = TimeDelta::from_hms(9, 30, 0);
        let d = datetime_from_date_and_time(date, tod);
        assert_eq!(d.time_of_day(), tod);
    }

    #[test]
    fn sentinels_order_correctly() {
        let mid = Datetime::from_unix_micros(0);
        assert!(Datetime::min_value() < mid);
        assert!(mid < Datetime::max_value());
    }

    #[test]
    fn time_of_day_bound_check() {
        assert!(TimeDelta::from_hms(0, 0, 0).is_time_of_day());
        assert!(TimeDelta::from_hms(23, 59, 59).is_time_of_day());
        assert!(!TimeDelta::from_hours(24).is_time_of_day());
        assert!(!TimeDelta::from_ticks(-1).is_time_of_day());
    }

    #[test]
    fn ticks_round_trip() {
        let delta = TimeDelta::from_ticks(123_456_789);
        assert_eq!(TimeDelta::from_ticks(delta.ticks()), delta);
    }
}
