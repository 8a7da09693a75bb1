use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// A half-open range of buffer offsets `[start, end)`.
/// The start offset must be less than or equal to the end offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[display(fmt = "{start}..{end}")]
#[serde(try_from = "(usize, usize)", into = "(usize, usize)")]
pub struct SelectionRange {
    start: usize,
    end:   usize,
}

/// Error type for selection range construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// Start offset is after end offset.
    #[error("Invalid selection: start ({start}) is after end ({end})")]
    Reversed { start: usize, end: usize },

    /// End offset lies past the buffer.
    #[error("Selection {start}..{end} exceeds buffer length {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },
}

impl SelectionRange {
    /// Creates a new selection range with validation.
    ///
    /// # Errors
    /// Returns `RangeError::Reversed` if start > end.
    pub const fn new(start: usize, end: usize) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a range and checks it fits inside a buffer of `len` characters.
    ///
    /// # Errors
    /// Returns `RangeError` if the range is reversed or extends past `len`.
    pub const fn within(start: usize, end: usize, len: usize) -> Result<Self, RangeError> {
        if end > len {
            return Err(RangeError::OutOfBounds { start, end, len });
        }
        Self::new(start, end)
    }

    /// Creates a range from two offsets given in either order.
    pub const fn ordered(a: usize, b: usize) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Empty range at `offset` (a plain caret)
    pub const fn collapsed(offset: usize) -> Self {
        Self {
            start: offset,
            end:   offset,
        }
    }

    /// One-character range starting at `offset`
    pub const fn slot(offset: usize) -> Self {
        Self {
            start: offset,
            end:   offset + 1,
        }
    }

    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn end(&self) -> usize {
        self.end
    }

    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Checks if the offset lies inside the range (an empty range contains its own offset)
    pub const fn contains(&self, offset: usize) -> bool {
        if self.is_empty() {
            offset == self.start
        } else {
            self.start <= offset && offset < self.end
        }
    }
}

impl TryFrom<(usize, usize)> for SelectionRange {
    type Error = RangeError;

    fn try_from((start, end): (usize, usize)) -> Result<Self, Self::Error> {
        Self::new(start, end)
    }
}

impl From<SelectionRange> for (usize, usize) {
    fn from(range: SelectionRange) -> Self {
        (range.start, range.end)
    }
}
