//! Timeless holiday dates.

use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::DateError;

/// A date that is fixed across time zones, and therefore has no time.
///
/// Holidays name a calendar day, not an instant; `HolidayDate` keeps the
/// raw (day, month, year) triple and defers to [`chrono`] the moment an
/// actual timeline position is needed (see [`naive_date`](Self::naive_date)).
///
/// Ordering is chronological: by year, then month, then day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HolidayDate {
    /// Day of the month, 1-based.
    pub day: u8,
    /// Month of the year, 1-based.
    pub month: u8,
    /// Calendar year. Never negative.
    pub year: i32,
}

impl HolidayDate {
    /// Creates a holiday date, validating the component ranges.
    ///
    /// Rejects day 0 or above 31, month 0 or above 12, and negative years.
    /// Whether the triple names a real day of the calendar (e.g. 30
    /// February does not) is checked by [`naive_date`](Self::naive_date),
    /// not here, matching the looseness of a per-component check.
    pub fn new(day: u8, month: u8, year: i32) -> Result<Self, DateError> {
        if day == 0 || day > 31 || month == 0 || month > 12 || year < 0 {
            return Err(DateError::InvalidComponents { day, month, year });
        }
        Ok(Self { day, month, year })
    }

    /// Creates a holiday date from components known to be in range.
    ///
    /// Used by calculators whose formulas produce valid dates by
    /// construction. Out-of-range components are a caller bug.
    pub fn from_ymd(year: i32, month: u8, day: u8) -> Self {
        debug_assert!((1..=31).contains(&day), "day out of range: {day}");
        debug_assert!((1..=12).contains(&month), "month out of range: {month}");
        debug_assert!(year >= 0, "negative year: {year}");
        Self { day, month, year }
    }

    /// Converts to a [`NaiveDate`], or `None` if the triple does not name
    /// an existing day of the proleptic Gregorian calendar.
    pub fn naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, u32::from(self.month), u32::from(self.day))
    }

    /// Converts to a [`NaiveDateTime`] at midnight, or at noon when
    /// `at_noon` is set.
    ///
    /// Noon is the conventional anchor when the resulting value is going
    /// to be shifted across time zones: it keeps the calendar day stable
    /// for offsets up to half a day in either direction.
    pub fn naive_datetime(&self, at_noon: bool) -> Option<NaiveDateTime> {
        let date = self.naive_date()?;
        if at_noon {
            date.and_hms_opt(12, 0, 0)
        } else {
            date.and_hms_opt(0, 0, 0)
        }
    }
}

impl From<NaiveDate> for HolidayDate {
    fn from(date: NaiveDate) -> Self {
        Self {
            day: date.day() as u8,
            month: date.month() as u8,
            year: date.year(),
        }
    }
}

impl Ord for HolidayDate {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.year, self.month, self.day).cmp(&(other.year, other.month, other.day))
    }
}

impl PartialOrd for HolidayDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for HolidayDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}
