//! The composition root a GUI layer drives.
//!
//! Phone, SSN, currency and percent fields are plain masked buffers. Date and
//! time fields add a [`CalendarValue`] and a [`FieldRing`]: typed digits and
//! arrow keys act on the selected sub-field, and the buffer text is re-rendered
//! from the calendar value after every change.

use std::fmt;

use crate::buffer::{MaskedBuffer, Motion};
use crate::calendar::{CalendarValue, ValueChange};
use crate::config::EditorConfig;
use crate::mask::FieldKind;
use crate::range::SelectionRange;
use crate::ring::FieldRing;
use crate::types::{CalendarUnit, DateTime};
use crate::{EditError, FieldError};

/// Callback fired after the calendar value of a date or time field changes.
pub type ValueListener = Box<dyn FnMut(&ValueChange)>;

/// Handle returned by [`FieldEditor::on_value_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

struct CalendarParts {
    value: CalendarValue,
    ring:  FieldRing,
}

pub struct FieldEditor {
    kind:          FieldKind,
    buffer:        MaskedBuffer,
    calendar:      Option<CalendarParts>,
    listeners:     Vec<(ListenerId, ValueListener)>,
    next_listener: usize,
}

impl fmt::Debug for FieldEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldEditor")
            .field("kind", &self.kind)
            .field("text", &self.buffer.text())
            .field("selection", &self.buffer.selection())
            .field("value", &self.value())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl FieldEditor {
    /// Creates an empty editor; date and time fields start at the current time.
    ///
    /// # Errors
    /// Returns `FieldError::InvalidDate` if the system clock is out of range.
    pub fn new(kind: FieldKind) -> Result<Self, FieldError> {
        Self::from_config(&EditorConfig::new(kind))
    }

    /// Creates a date or time editor holding `value`.
    ///
    /// # Errors
    /// Returns `FieldError::NoCalendar` for kinds without a calendar value.
    pub fn with_value(kind: FieldKind, value: DateTime) -> Result<Self, FieldError> {
        Self::from_config(&EditorConfig::new(kind).initial(value))
    }

    /// # Errors
    /// Returns `FieldError` if the initial value or text does not fit the kind.
    pub fn from_config(config: &EditorConfig) -> Result<Self, FieldError> {
        let kind = config.kind;
        let calendar = if kind.is_calendar() {
            let value = match config.initial {
                Some(value) => CalendarValue::new(value),
                None => CalendarValue::now()?,
            };
            let ring = if kind == FieldKind::Time {
                FieldRing::time()
            } else {
                FieldRing::date()
            };
            Some(CalendarParts { value, ring })
        } else if config.initial.is_some() {
            return Err(FieldError::NoCalendar { kind });
        } else {
            None
        };

        let mut editor = Self {
            kind,
            buffer: MaskedBuffer::new(kind.mask()),
            calendar,
            listeners: Vec::new(),
            next_listener: 0,
        };
        editor.buffer.set_type_over(config.type_over);
        if let Some(text) = &config.text {
            editor.set_text(text)?;
        }
        editor.refresh()?;
        tracing::debug!(%kind, text = %editor.render(), "field editor created");
        Ok(editor)
    }

    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// The current buffer text.
    pub fn render(&self) -> String {
        self.buffer.text()
    }

    /// Digits in the buffer, without separators.
    pub fn digits(&self) -> String {
        self.buffer.digits()
    }

    pub const fn caret(&self) -> usize {
        self.buffer.caret()
    }

    pub const fn selection(&self) -> SelectionRange {
        self.buffer.selection()
    }

    pub const fn type_over(&self) -> bool {
        self.buffer.type_over()
    }

    /// Switches between type-over and insert mode. Date and time fields keep
    /// their whole sub-field selected either way.
    ///
    /// # Errors
    /// Returns `RangeError` (wrapped) if the selected sub-field does not fit the buffer.
    pub fn set_type_over(&mut self, type_over: bool) -> Result<(), FieldError> {
        self.buffer.set_type_over(type_over);
        if let Some(range) = self.calendar.as_ref().map(|parts| parts.ring.selected_range()) {
            self.highlight(range)?;
        }
        Ok(())
    }

    /// # Errors
    /// Returns `RangeError` (wrapped) if the range does not fit the buffer.
    pub fn select_range(&mut self, start: usize, end: usize) -> Result<SelectionRange, FieldError> {
        Ok(self.buffer.select(start, end)?)
    }

    pub fn on_value_changed(&mut self, listener: impl FnMut(&ValueChange) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if no listener had that id.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    /// Copy of the calendar value of a date or time field.
    pub fn value(&self) -> Option<DateTime> {
        self.calendar.as_ref().map(|parts| parts.value.value())
    }

    /// # Errors
    /// Returns `FieldError::NoCalendar` for kinds without a calendar value.
    pub fn set_value(&mut self, value: DateTime) -> Result<(), FieldError> {
        let change = self.calendar_mut()?.value.set_value(value);
        self.commit(change)
    }

    /// Whether the month or year changed since the previous call. Destructive:
    /// the call itself resets the baseline. Always `false` without a calendar.
    pub fn take_month_year_changed(&mut self) -> bool {
        self.calendar
            .as_mut()
            .is_some_and(|parts| parts.value.take_month_year_changed())
    }

    /// Replaces the field text. Date and time fields parse it into their value.
    ///
    /// # Errors
    /// Returns `EditError` (wrapped) if the text does not fit the format.
    pub fn set_text(&mut self, text: &str) -> Result<(), FieldError> {
        if self.calendar.is_none() {
            self.buffer.set_text(text)?;
            return Ok(());
        }
        let mut scratch = MaskedBuffer::new(self.kind.mask());
        scratch.set_text(text)?;
        let current = self.value().ok_or(FieldError::NoCalendar { kind: self.kind })?;
        let value = parse_calendar_text(self.kind, &scratch.text(), current)?;
        self.set_value(value)
    }

    /// Inserts typed or pasted text at `offset`.
    ///
    /// On a date or time field each digit goes to the sub-field under
    /// `offset` (see [`set`](Self::set)), and `A`/`P` picks the half of the day.
    ///
    /// # Errors
    /// Returns `EditError` if the text is rejected; nothing changes then.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<SelectionRange, EditError> {
        if self.calendar.is_none() {
            return self.buffer.insert(offset, text);
        }
        self.calendar_input(offset, text)
    }

    /// # Errors
    /// Returns `EditError` if the removal is rejected. Date and time fields
    /// always reject with `EditError::ReadOnly`.
    pub fn remove(&mut self, offset: usize, length: usize) -> Result<SelectionRange, EditError> {
        if self.calendar.is_some() {
            tracing::debug!(offset, length, "remove ignored on calendar field");
            return Err(EditError::ReadOnly);
        }
        self.buffer.remove(offset, length)
    }

    /// Typing over a selection. On a date or time field this is the same as
    /// [`insert`](Self::insert) since the selection is always a whole sub-field.
    ///
    /// # Errors
    /// Returns `EditError` if either half is rejected; the text is then restored.
    pub fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<SelectionRange, EditError> {
        if self.calendar.is_none() {
            return self.buffer.replace(offset, length, text);
        }
        if text.is_empty() {
            return Err(EditError::ReadOnly);
        }
        self.calendar_input(offset, text)
    }

    /// Arrow/Home/End handling. On date and time fields Left and Right walk
    /// the sub-field ring. Returns `false` if the key was swallowed.
    pub fn navigate(&mut self, motion: Motion) -> bool {
        let Some(parts) = &self.calendar else {
            return self.buffer.navigate(motion);
        };
        let before = parts.ring.selected();
        let linked: Vec<CalendarUnit> = parts
            .ring
            .nodes()
            .iter()
            .filter(|node| node.is_linked())
            .map(|node| node.unit())
            .collect();
        let result = match motion {
            Motion::Left => self.select_previous(),
            Motion::Right => self.select_next(),
            Motion::Home => linked.first().map_or(Ok(self.selection()), |&unit| self.select(unit)),
            Motion::End => linked.last().map_or(Ok(self.selection()), |&unit| self.select(unit)),
        };
        result.is_ok() && self.selected_unit() != Some(before)
    }

    /// The selected sub-field of a date or time field.
    pub fn selected_unit(&self) -> Option<CalendarUnit> {
        self.calendar.as_ref().map(|parts| parts.ring.selected())
    }

    /// # Errors
    /// Returns `FieldError::NoCalendar` for kinds without sub-fields.
    pub fn select_next(&mut self) -> Result<SelectionRange, FieldError> {
        let range = self.calendar_mut()?.ring.select_next();
        self.highlight(range)
    }

    /// # Errors
    /// Returns `FieldError::NoCalendar` for kinds without sub-fields.
    pub fn select_previous(&mut self) -> Result<SelectionRange, FieldError> {
        let range = self.calendar_mut()?.ring.select_previous();
        self.highlight(range)
    }

    /// # Errors
    /// Returns `FieldError::UnknownField` if the field has no such sub-field.
    pub fn select(&mut self, unit: CalendarUnit) -> Result<SelectionRange, FieldError> {
        let range = self.calendar_mut()?.ring.select(unit)?;
        self.highlight(range)
    }

    /// Selects a sub-field by name (`"month"`, `"AMPM"`, ...).
    ///
    /// # Errors
    /// Returns `FieldError::UnknownUnitName` for unrecognised names.
    pub fn select_named(&mut self, name: &str) -> Result<SelectionRange, FieldError> {
        self.select(name.parse()?)
    }

    /// Steps a sub-field up or down with calendar carry.
    ///
    /// # Errors
    /// Returns `FieldError::InvalidUnit` if the field's format has no such
    /// sub-field.
    pub fn roll(&mut self, unit: CalendarUnit, up: bool) -> Result<(), FieldError> {
        let parts = self.supported(unit)?;
        let change = parts.value.roll(unit, up)?;
        self.commit(change)
    }

    /// Applies one typed digit to a sub-field.
    ///
    /// # Errors
    /// Returns `FieldError::InvalidUnit` if the field's format has no such
    /// sub-field, or `FieldError::InvalidDigit` for digits above 9.
    pub fn set(&mut self, unit: CalendarUnit, digit: u8) -> Result<(), FieldError> {
        let parts = self.supported(unit)?;
        let change = parts.value.set(unit, digit)?;
        self.commit(change)
    }

    /// # Errors
    /// Returns `FieldError::InvalidUnit` unless this is a time field.
    pub fn toggle_am_pm(&mut self) -> Result<(), FieldError> {
        let change = self.supported(CalendarUnit::AmPm)?.value.toggle_am_pm();
        self.commit(change)
    }

    fn calendar_mut(&mut self) -> Result<&mut CalendarParts, FieldError> {
        let kind = self.kind;
        self.calendar.as_mut().ok_or(FieldError::NoCalendar { kind })
    }

    /// Calendar parts, provided `unit` is one of this format's sub-fields.
    fn supported(&mut self, unit: CalendarUnit) -> Result<&mut CalendarParts, FieldError> {
        let kind = self.kind;
        match self.calendar.as_mut() {
            Some(parts) if parts.ring.contains(unit) => Ok(parts),
            _ => {
                tracing::error!(%kind, %unit, "unit not supported by field");
                Err(FieldError::InvalidUnit { unit })
            },
        }
    }

    fn highlight(&mut self, range: SelectionRange) -> Result<SelectionRange, FieldError> {
        Ok(self.buffer.select(range.start(), range.end())?)
    }

    /// Routes typed characters on a date or time field to the sub-field under
    /// `offset`. Everything is validated before anything is applied.
    fn calendar_input(&mut self, offset: usize, text: &str) -> Result<SelectionRange, EditError> {
        let len = text.chars().count();
        if offset + len > self.buffer.len() {
            tracing::debug!(offset, len, "calendar input runs past the mask");
            return Err(EditError::Overflow { offset, len });
        }
        let Some(parts) = self.calendar.as_mut() else {
            return Err(EditError::ReadOnly);
        };
        let unit = parts.ring.unit_at(offset).unwrap_or_else(|| parts.ring.selected());

        let mut keys = Vec::new();
        for (i, ch) in text.chars().enumerate() {
            let key = match (unit, ch.to_ascii_uppercase()) {
                (CalendarUnit::AmPm, half @ ('A' | 'P')) => Key::Half(half == 'P'),
                (CalendarUnit::AmPm, _) => return Err(EditError::InvalidChar { ch, offset: offset + i }),
                (_, digit) => digit
                    .to_digit(10)
                    .and_then(|d| u8::try_from(d).ok())
                    .map(Key::Digit)
                    .ok_or(EditError::InvalidChar { ch, offset: offset + i })?,
            };
            keys.push(key);
        }

        parts.ring.select_at(offset);
        let mut changes = Vec::new();
        for key in keys {
            let change = match key {
                Key::Digit(digit) => parts.value.set(unit, digit).map_err(|err| {
                    tracing::debug!(%err, "digit rejected by calendar");
                    EditError::InvalidChar {
                        ch: char::from(b'0' + digit),
                        offset,
                    }
                })?,
                Key::Half(pm) if parts.value.value().is_pm() != pm => parts.value.toggle_am_pm(),
                Key::Half(_) => None,
            };
            changes.extend(change);
        }

        self.refresh().map_err(|err| match err {
            FieldError::Edit(edit) => edit,
            _ => EditError::ReadOnly,
        })?;
        for change in &changes {
            self.notify(change);
        }
        Ok(self.selection())
    }

    /// Re-renders the buffer from the calendar value and re-highlights the
    /// selected sub-field.
    fn refresh(&mut self) -> Result<(), FieldError> {
        let Some(parts) = &self.calendar else {
            return Ok(());
        };
        let text = format_calendar(self.kind, parts.value.value());
        let range = parts.ring.selected_range();
        self.buffer.load(&text)?;
        self.buffer.select(range.start(), range.end())?;
        Ok(())
    }

    fn commit(&mut self, change: Option<ValueChange>) -> Result<(), FieldError> {
        self.refresh()?;
        if let Some(change) = change {
            self.notify(&change);
        }
        Ok(())
    }

    fn notify(&mut self, change: &ValueChange) {
        for (_, listener) in &mut self.listeners {
            listener(change);
        }
    }
}

/// One validated keystroke on a calendar sub-field.
#[derive(Debug, Clone, Copy)]
enum Key {
    Digit(u8),
    /// `true` for PM
    Half(bool),
}

fn format_calendar(kind: FieldKind, value: DateTime) -> String {
    if kind == FieldKind::Time {
        let half = if value.is_pm() { 'P' } else { 'A' };
        format!("{:02}:{:02} {half}M", value.hour12(), value.minute())
    } else {
        format!("{:02}/{:02}/{:04}", value.month() + 1, value.day(), value.year())
    }
}

/// Reads a rendered `MM/dd/yyyy` or `hh:mm a` text into a value, keeping the
/// parts of `base` the format does not show.
fn parse_calendar_text(kind: FieldKind, text: &str, base: DateTime) -> Result<DateTime, FieldError> {
    let chars: Vec<char> = text.chars().collect();
    let number = |start: usize, end: usize| -> Result<u16, EditError> {
        chars[start..end].iter().enumerate().try_fold(0u16, |acc, (i, ch)| {
            ch.to_digit(10)
                .and_then(|d| u16::try_from(d).ok())
                .map(|d| acc * 10 + d)
                .ok_or(EditError::InvalidChar {
                    ch:     *ch,
                    offset: start + i,
                })
        })
    };
    let small = |value: u16| u8::try_from(value).unwrap_or(u8::MAX);

    if kind == FieldKind::Time {
        let hour12 = number(0, 2)?;
        let minute = number(3, 5)?;
        let pm = chars.get(6).is_some_and(|ch| ch.eq_ignore_ascii_case(&'P'));
        if !(1..=12).contains(&hour12) {
            return Err(FieldError::InvalidTime {
                hour:   small(hour12),
                minute: small(minute),
                second: base.second(),
            });
        }
        let hour = small(hour12 % 12) + if pm { 12 } else { 0 };
        DateTime::new(base.year(), base.month(), base.day(), hour, small(minute), base.second())
    } else {
        let month = number(0, 2)?;
        let day = number(3, 5)?;
        let year = number(6, 10)?;
        let month = small(month).checked_sub(1).ok_or(FieldError::InvalidDate {
            year,
            month: 0,
            day: small(day),
        })?;
        DateTime::new(year, month, small(day), base.hour(), base.minute(), base.second())
    }
}
