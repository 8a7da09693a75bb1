//! Editing engine for structured input fields.
//!
//! A [`FieldEditor`] keeps a fixed-format text buffer (`MM/dd/yyyy`,
//! `(###)###-####`, ...) in step with keystrokes: digits shift or overwrite
//! around literal separators, date and time fields do calendar-correct
//! rolls, and arrow keys hop between sub-fields on a ring. Rendering and
//! event dispatch are left to the host toolkit.

mod buffer;
mod calendar;
mod config;
mod consts;
mod editor;
mod mask;
mod prelude;
mod range;
mod ring;
mod types;

pub use buffer::{MaskedBuffer, Motion};
pub use calendar::{CalendarValue, ValueChange};
pub use config::EditorConfig;
pub use consts::*;
pub use editor::{FieldEditor, ListenerId, ValueListener};
pub use mask::{FieldKind, FormatMask, MaskPolicy, Slot, SlotClass};
pub use range::{RangeError, SelectionRange};
pub use ring::{FieldNode, FieldRing, NodeId};
pub use types::{CalendarUnit, DateTime, days_in_month, is_leap_year};

/// A keystroke or paste the mask cannot take. The buffer is left as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Edit of {len} characters at offset {offset} runs past the mask")]
    Overflow { offset: usize, len: usize },

    #[error("Field already holds its maximum of {capacity} digits")]
    CapacityExceeded { capacity: usize },

    #[error("Character {ch:?} is not allowed at offset {offset}")]
    InvalidChar { ch: char, offset: usize },

    #[error("Offset {offset} is a fixed separator")]
    LiteralPosition { offset: usize },

    #[error("Removal at offset {offset} is not allowed for this format")]
    Guarded { offset: usize },

    #[error("Text of a date or time field cannot be deleted")]
    ReadOnly,
}

/// Errors from calendar and field-navigation operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// The unit is not part of this field's format. Indicates miswiring.
    #[error("Unit {unit} is not supported by this field")]
    InvalidUnit { unit: CalendarUnit },

    #[error("Field has no {unit} node")]
    UnknownField { unit: CalendarUnit },

    #[error("Unknown field name: {0}")]
    UnknownUnitName(String),

    #[error("Field ring must link at least one node, each exactly once")]
    MalformedRing,

    #[error("Invalid digit: {0} (must be 0-9)")]
    InvalidDigit(u8),

    #[error("Invalid date: year {year}, month index {month}, day {day}")]
    InvalidDate { year: u16, month: u8, day: u8 },

    #[error("Invalid time: {hour:02}:{minute:02}:{second:02}")]
    InvalidTime { hour: u8, minute: u8, second: u8 },

    #[error("A {kind} field has no calendar value")]
    NoCalendar { kind: FieldKind },

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Edit(#[from] EditError),
}
