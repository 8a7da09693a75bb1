//! Calendar arithmetic behind date and time fields.
//!
//! A [`CalendarValue`] pairs a [`DateTime`] with the *remembered day*: the day
//! of month the user last chose explicitly. Month and year changes clamp the
//! visible day to the target month's length but never lower the remembered
//! day, so moving back to a longer month restores it.
//!
//! Every operation runs against a draft copy and is committed at the end.

use chrono::Local;

use crate::consts::{
    DECEMBER, FEBRUARY, FEBRUARY_DAYS, HALF_DAY_HOURS, JANUARY, MAX_HOUR, MAX_MINUTE, MAX_SECOND,
    MAX_YEAR, MIN_DAY, MIN_YEAR, YEAR_DIGIT_SCALE,
};
use crate::types::{CalendarUnit, DateTime, days_in_month};
use crate::FieldError;

/// Old and new value of a committed calendar mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueChange {
    pub old: DateTime,
    pub new: DateTime,
}

impl ValueChange {
    pub const fn month_or_year_changed(&self) -> bool {
        self.old.year != self.new.year || self.old.month != self.new.month
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarValue {
    value:          DateTime,
    remembered_day: u8,
    /// `(year, month)` as of the last `take_month_year_changed`
    last_read:      (u16, u8),
}

/// Working copy a transaction mutates before it is committed.
#[derive(Debug, Clone, Copy)]
struct Draft {
    value:          DateTime,
    remembered_day: u8,
}

impl CalendarValue {
    pub const fn new(value: DateTime) -> Self {
        Self {
            value,
            remembered_day: value.day,
            last_read: (value.year, value.month),
        }
    }

    /// The current local wall-clock time.
    ///
    /// # Errors
    /// Returns `FieldError::InvalidDate` if the system clock lies outside the
    /// supported year range.
    pub fn now() -> Result<Self, FieldError> {
        DateTime::try_from(Local::now().naive_local()).map(Self::new)
    }

    /// The UTC time `secs` seconds after (or before) the Unix epoch.
    ///
    /// # Errors
    /// Returns `FieldError::InvalidDate` outside years 1 through 9999.
    pub fn from_unix_seconds(secs: i64) -> Result<Self, FieldError> {
        DateTime::from_unix_seconds(secs).map(Self::new)
    }

    /// A copy of the current value.
    pub const fn value(&self) -> DateTime {
        self.value
    }

    pub const fn remembered_day(&self) -> u8 {
        self.remembered_day
    }

    /// Replaces the value wholesale; its day becomes the remembered day.
    pub fn set_value(&mut self, value: DateTime) -> Option<ValueChange> {
        self.commit(Draft {
            value,
            remembered_day: value.day,
        })
    }

    /// Steps `unit` one position up or down, cascading into the next larger
    /// unit at its boundary. Rolling `AmPm` flips the half of the day.
    ///
    /// # Errors
    /// Never fails for calendar units; the `Result` matches [`set`](Self::set).
    pub fn roll(&mut self, unit: CalendarUnit, up: bool) -> Result<Option<ValueChange>, FieldError> {
        let mut draft = self.draft();
        match unit {
            CalendarUnit::Day => draft.roll_day(up),
            CalendarUnit::Month => draft.roll_month(up),
            CalendarUnit::Year => draft.roll_year(up),
            CalendarUnit::Hour => draft.roll_hour(up),
            CalendarUnit::Minute => draft.roll_minute(up),
            CalendarUnit::Second => draft.roll_second(up),
            CalendarUnit::AmPm => {
                draft.toggle_am_pm();
                true
            },
        };
        Ok(self.commit(draft))
    }

    /// Applies one typed digit to `unit`.
    ///
    /// The digit is appended to the current value when the result stays in
    /// range, so consecutive keystrokes build a multi-digit number; otherwise
    /// the digit alone becomes the value (a zero day or month becomes 1).
    /// Year entry sets the millennium digit only.
    ///
    /// # Errors
    /// Returns `FieldError::InvalidDigit` for digits above 9 and
    /// `FieldError::InvalidUnit` for `AmPm`.
    pub fn set(&mut self, unit: CalendarUnit, digit: u8) -> Result<Option<ValueChange>, FieldError> {
        if digit > 9 {
            return Err(FieldError::InvalidDigit(digit));
        }
        let mut draft = self.draft();
        match unit {
            CalendarUnit::Day => draft.set_day(digit),
            CalendarUnit::Month => draft.set_month(digit),
            CalendarUnit::Year => draft.set_year(digit),
            CalendarUnit::Hour => draft.value.hour = append_digit(draft.value.hour, digit, MAX_HOUR),
            CalendarUnit::Minute => draft.value.minute = append_digit(draft.value.minute, digit, MAX_MINUTE),
            CalendarUnit::Second => draft.value.second = append_digit(draft.value.second, digit, MAX_SECOND),
            CalendarUnit::AmPm => {
                tracing::error!(%unit, "digit entry is not defined for this unit");
                return Err(FieldError::InvalidUnit { unit });
            },
        }
        Ok(self.commit(draft))
    }

    /// Moves the hour into the other half of the day.
    pub fn toggle_am_pm(&mut self) -> Option<ValueChange> {
        let mut draft = self.draft();
        draft.toggle_am_pm();
        self.commit(draft)
    }

    /// Reports whether the month or year differs from the previous call, and
    /// makes the current month and year the new baseline.
    ///
    /// This is a destructive read: two consecutive calls with no change in
    /// between return `true` at most once.
    pub const fn take_month_year_changed(&mut self) -> bool {
        let current = (self.value.year, self.value.month);
        let changed = current.0 != self.last_read.0 || current.1 != self.last_read.1;
        self.last_read = current;
        changed
    }

    const fn draft(&self) -> Draft {
        Draft {
            value:          self.value,
            remembered_day: self.remembered_day,
        }
    }

    fn commit(&mut self, draft: Draft) -> Option<ValueChange> {
        let old = self.value;
        self.value = draft.value;
        self.remembered_day = draft.remembered_day;
        debug_assert!(self.value.day <= self.value.days_in_month());

        if old == self.value {
            return None;
        }
        tracing::trace!(%old, new = %self.value, remembered_day = self.remembered_day, "calendar value changed");
        Some(ValueChange { old, new: self.value })
    }
}

impl Draft {
    const fn days_in_month(&self) -> u8 {
        days_in_month(self.value.year, self.value.month)
    }

    /// Clamps the visible day to the current month without touching the
    /// remembered day.
    fn determine_day(&mut self) {
        self.value.day = self.remembered_day.min(self.days_in_month());
    }

    fn roll_day(&mut self, up: bool) -> bool {
        if up {
            if self.value.day < self.days_in_month() {
                self.value.day += 1;
            } else if self.roll_month(true) {
                self.value.day = MIN_DAY;
            } else {
                return false;
            }
        } else if self.value.day > MIN_DAY {
            self.value.day -= 1;
        } else if self.roll_month(false) {
            self.value.day = self.days_in_month();
        } else {
            return false;
        }
        self.remembered_day = self.value.day;
        true
    }

    fn roll_month(&mut self, up: bool) -> bool {
        if up {
            if self.value.month < DECEMBER {
                self.value.month += 1;
            } else if self.roll_year(true) {
                self.value.month = JANUARY;
            } else {
                return false;
            }
        } else if self.value.month > JANUARY {
            self.value.month -= 1;
        } else if self.roll_year(false) {
            self.value.month = DECEMBER;
        } else {
            return false;
        }
        self.determine_day();
        true
    }

    fn roll_year(&mut self, up: bool) -> bool {
        let year = if up {
            self.value.year.checked_add(1).filter(|&y| y <= MAX_YEAR)
        } else {
            self.value.year.checked_sub(1).filter(|&y| y >= MIN_YEAR)
        };
        let Some(year) = year else {
            return false;
        };
        self.value.year = year;
        if self.value.month == FEBRUARY && self.remembered_day > FEBRUARY_DAYS {
            self.determine_day();
        }
        true
    }

    fn roll_hour(&mut self, up: bool) -> bool {
        let hour = self.value.hour;
        match wrap(hour, MAX_HOUR, up) {
            Some(next) => self.value.hour = next,
            None if self.roll_day(up) => self.value.hour = if up { 0 } else { MAX_HOUR },
            None => return false,
        }
        true
    }

    fn roll_minute(&mut self, up: bool) -> bool {
        match wrap(self.value.minute, MAX_MINUTE, up) {
            Some(next) => self.value.minute = next,
            None if self.roll_hour(up) => self.value.minute = if up { 0 } else { MAX_MINUTE },
            None => return false,
        }
        true
    }

    fn roll_second(&mut self, up: bool) -> bool {
        match wrap(self.value.second, MAX_SECOND, up) {
            Some(next) => self.value.second = next,
            None if self.roll_minute(up) => self.value.second = if up { 0 } else { MAX_SECOND },
            None => return false,
        }
        true
    }

    fn set_day(&mut self, digit: u8) {
        let candidate = u16::from(self.value.day) * 10 + u16::from(digit);
        self.value.day = match u8::try_from(candidate) {
            Ok(day) if (MIN_DAY..=self.days_in_month()).contains(&day) => day,
            _ => digit.max(MIN_DAY),
        };
        self.remembered_day = self.value.day;
    }

    fn set_month(&mut self, digit: u8) {
        // Months are typed 1-based
        let candidate = u16::from(self.value.month + 1) * 10 + u16::from(digit);
        let month = match u8::try_from(candidate) {
            Ok(month) if (1..=DECEMBER + 1).contains(&month) => month,
            _ => digit.max(1),
        };
        self.value.day = MIN_DAY;
        self.value.month = month - 1;
        self.determine_day();
    }

    fn set_year(&mut self, digit: u8) {
        self.value.day = MIN_DAY;
        self.value.year = (u16::from(digit) * YEAR_DIGIT_SCALE).max(MIN_YEAR);
        self.determine_day();
    }

    const fn toggle_am_pm(&mut self) {
        if self.value.hour >= HALF_DAY_HOURS {
            self.value.hour -= HALF_DAY_HOURS;
        } else {
            self.value.hour += HALF_DAY_HOURS;
        }
    }
}

/// Next value of a `0..=max` counter, or `None` when it would wrap.
const fn wrap(value: u8, max: u8, up: bool) -> Option<u8> {
    if up {
        if value < max { Some(value + 1) } else { None }
    } else if value > 0 {
        Some(value - 1)
    } else {
        None
    }
}

fn append_digit(current: u8, digit: u8, max: u8) -> u8 {
    let candidate = u16::from(current) * 10 + u16::from(digit);
    u8::try_from(candidate).ok().filter(|&v| v <= max).unwrap_or(digit)
}
