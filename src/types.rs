use crate::consts::{
    CENTURY_CYCLE, DAYS_IN_MONTH, DECEMBER, FEBRUARY, FEBRUARY_DAYS_LEAP, GREGORIAN_CYCLE,
    LEAP_YEAR_CYCLE, MAX_HOUR, MAX_MINUTE, MAX_SECOND, MAX_YEAR, MIN_DAY, MIN_YEAR,
};
use crate::FieldError;
use crate::prelude::*;
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A named sub-field of a date or time value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CalendarUnit {
    #[display(fmt = "DAY")]
    Day,
    #[display(fmt = "MONTH")]
    Month,
    #[display(fmt = "YEAR")]
    Year,
    #[display(fmt = "HOUR")]
    Hour,
    #[display(fmt = "MINUTE")]
    Minute,
    #[display(fmt = "SECOND")]
    Second,
    #[display(fmt = "AMPM")]
    AmPm,
}

impl CalendarUnit {
    pub const ALL: [Self; 7] = [
        Self::Day,
        Self::Month,
        Self::Year,
        Self::Hour,
        Self::Minute,
        Self::Second,
        Self::AmPm,
    ];
}

impl FromStr for CalendarUnit {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|unit| unit.to_string().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| FieldError::UnknownUnitName(trimmed.to_owned()))
    }
}

/// A normalized wall-clock date and time.
///
/// `month` is 0-based (`0` = January). The value is `Copy`, so every accessor
/// that hands one out gives the caller an independent snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
#[display(
    fmt = "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
    year,
    "month + 1",
    day,
    hour,
    minute,
    second
)]
#[serde(try_from = "DateTimeParts", into = "DateTimeParts")]
pub struct DateTime {
    pub(crate) year:   u16,
    pub(crate) month:  u8,
    pub(crate) day:    u8,
    pub(crate) hour:   u8,
    pub(crate) minute: u8,
    pub(crate) second: u8,
}

/// Serialized shape of [`DateTime`]; the month is 1-based on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct DateTimeParts {
    year:   u16,
    month:  u8,
    day:    u8,
    #[serde(default)]
    hour:   u8,
    #[serde(default)]
    minute: u8,
    #[serde(default)]
    second: u8,
}

impl TryFrom<DateTimeParts> for DateTime {
    type Error = FieldError;

    fn try_from(parts: DateTimeParts) -> Result<Self, Self::Error> {
        let month = parts.month.checked_sub(1).ok_or(FieldError::InvalidDate {
            year:  parts.year,
            month: parts.month,
            day:   parts.day,
        })?;
        Self::new(parts.year, month, parts.day, parts.hour, parts.minute, parts.second)
    }
}

/// Drops sub-second precision.
impl TryFrom<NaiveDateTime> for DateTime {
    type Error = FieldError;

    fn try_from(value: NaiveDateTime) -> Result<Self, Self::Error> {
        // Out-of-range years map to 0, which `new` rejects
        let year = u16::try_from(value.year()).unwrap_or(0);
        let small = |part: u32| u8::try_from(part).unwrap_or(u8::MAX);
        Self::new(
            year,
            small(value.month0()),
            small(value.day()),
            small(value.hour()),
            small(value.minute()),
            small(value.second()),
        )
    }
}

impl From<DateTime> for DateTimeParts {
    fn from(value: DateTime) -> Self {
        Self {
            year:   value.year,
            month:  value.month + 1,
            day:    value.day,
            hour:   value.hour,
            minute: value.minute,
            second: value.second,
        }
    }
}

impl DateTime {
    /// Creates a validated date-time. `month` is 0-based.
    ///
    /// # Errors
    /// Returns `FieldError::InvalidDate` or `FieldError::InvalidTime` when a
    /// component is out of range for its calendar position.
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Result<Self, FieldError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) || month > DECEMBER {
            return Err(FieldError::InvalidDate { year, month, day });
        }
        if !(MIN_DAY..=days_in_month(year, month)).contains(&day) {
            return Err(FieldError::InvalidDate { year, month, day });
        }
        if hour > MAX_HOUR || minute > MAX_MINUTE || second > MAX_SECOND {
            return Err(FieldError::InvalidTime { hour, minute, second });
        }
        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// Creates a validated date at midnight. `month` is 0-based.
    ///
    /// # Errors
    /// Returns `FieldError::InvalidDate` when the date does not exist.
    pub fn date(year: u16, month: u8, day: u8) -> Result<Self, FieldError> {
        Self::new(year, month, day, 0, 0, 0)
    }

    /// Converts seconds since the Unix epoch (UTC) into a date-time.
    ///
    /// # Errors
    /// Returns `FieldError::InvalidDate` when the instant falls outside the
    /// supported year range.
    pub fn from_unix_seconds(secs: i64) -> Result<Self, FieldError> {
        chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0)
            .ok_or(FieldError::InvalidDate {
                year:  0,
                month: 0,
                day:   0,
            })
            .and_then(|utc| Self::try_from(utc.naive_utc()))
    }

    pub const fn year(&self) -> u16 {
        self.year
    }

    /// 0-based month (`0` = January)
    pub const fn month(&self) -> u8 {
        self.month
    }

    pub const fn day(&self) -> u8 {
        self.day
    }

    /// Hour of day, `0..=23`
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    pub const fn minute(&self) -> u8 {
        self.minute
    }

    pub const fn second(&self) -> u8 {
        self.second
    }

    pub const fn is_pm(&self) -> bool {
        self.hour >= 12
    }

    /// Hour on a 12-hour clock face, `1..=12`
    pub const fn hour12(&self) -> u8 {
        match self.hour % 12 {
            0 => 12,
            h => h,
        }
    }

    pub const fn days_in_month(&self) -> u8 {
        days_in_month(self.year, self.month)
    }
}

// Helper functions

pub const fn is_leap_year(year: u16) -> bool {
    (year % LEAP_YEAR_CYCLE == 0 && year % CENTURY_CYCLE != 0) || (year % GREGORIAN_CYCLE == 0)
}

/// Days in a 0-based `month` of `year`.
pub const fn days_in_month(year: u16, month: u8) -> u8 {
    debug_assert!(month <= DECEMBER);

    if month == FEBRUARY && is_leap_year(year) {
        FEBRUARY_DAYS_LEAP
    } else {
        DAYS_IN_MONTH[month as usize]
    }
}
