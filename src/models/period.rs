//! Calendar period helpers.
//!
//! This module contains the [`YearMonth`] type and the UTC day window used to
//! bound invoice queries and rule cutoffs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Returns the inclusive UTC window `[start, end]` covering `date`.
///
/// `end` is the last representable nanosecond of the day, so both bounds can
/// be compared with `<=`.
///
/// # Example
///
/// ```
/// use incentive_engine::models::day_window;
/// use chrono::NaiveDate;
///
/// let (start, end) = day_window(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
/// assert_eq!(start.to_rfc3339(), "2026-01-15T00:00:00+00:00");
/// assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
/// ```
pub fn day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    let end = start + TimeDelta::days(1) - TimeDelta::nanoseconds(1);
    (start, end)
}

/// A calendar month, written `YYYY-MM` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Creates a month, returning `None` for an out-of-range month number.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    /// The month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month number, 1-12.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The first day of the month.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    /// The last day of the month.
    pub fn last_day(&self) -> NaiveDate {
        self.first_day()
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    /// Number of calendar days in the month.
    ///
    /// # Example
    ///
    /// ```
    /// use incentive_engine::models::YearMonth;
    ///
    /// assert_eq!(YearMonth::new(2024, 2).unwrap().days(), 29);
    /// assert_eq!(YearMonth::new(2025, 2).unwrap().days(), 28);
    /// assert_eq!(YearMonth::new(2025, 4).unwrap().days(), 30);
    /// ```
    pub fn days(&self) -> u32 {
        self.last_day().day()
    }

    /// The last instant of the month, used as the monthly rule cutoff.
    pub fn end_cutoff(&self) -> DateTime<Utc> {
        day_window(self.last_day()).1
    }

    /// True when `date` falls inside this month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        YearMonth::of(date) == *self
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::validation("year_month", format!("'{}' is not YYYY-MM", s));

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// Number of calendar days in the month containing `date`.
pub fn days_in_month(date: NaiveDate) -> u32 {
    YearMonth::of(date).days()
}
