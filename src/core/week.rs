//! Week range tokens
//!
//! Weekly data folders are named `YYYYMMDD-YYYYMMDD`. The token is used as an
//! ordering and grouping key for accumulated observations.

use chrono::{Duration, NaiveDate};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y%m%d";

/// Error returned when a week token cannot be parsed
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid week range '{0}': expected YYYYMMDD-YYYYMMDD")]
pub struct WeekParseError(pub String);

/// An inclusive pair of dates identifying one reporting week
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl WeekRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// The two ranges immediately before this one
    ///
    /// Returns `[start-7d .. start, start-14d .. start-7d]`, newest first.
    pub fn preceding(&self) -> [WeekRange; 2] {
        let week = Duration::days(7);
        let p1 = WeekRange::new(self.start - week, self.start);
        let p2 = WeekRange::new(self.start - week - week, self.start - week);
        [p1, p2]
    }
}

impl FromStr for WeekRange {
    type Err = WeekParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || WeekParseError(s.to_string());
        let (a, b) = s.trim().split_once('-').ok_or_else(err)?;
        if a.len() != 8 || b.len() != 8 {
            return Err(err());
        }
        let start = NaiveDate::parse_from_str(a, DATE_FORMAT).map_err(|_| err())?;
        let end = NaiveDate::parse_from_str(b, DATE_FORMAT).map_err(|_| err())?;
        Ok(Self { start, end })
    }
}

impl fmt::Display for WeekRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}
