//! The masked text buffer and its edit algorithm.
//!
//! The buffer always holds exactly `mask.len()` characters. Edits either
//! succeed and report the new selection, or fail with an [`EditError`] and
//! leave the content untouched. A replace runs as remove-then-insert; if the
//! insert half is rejected the removed characters are put back.

use crate::consts::BLANK;
use crate::mask::{FormatMask, Slot};
use crate::range::{RangeError, SelectionRange};
use crate::EditError;

/// Caret motions the host forwards from arrow/Home/End keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motion {
    Home,
    End,
    Left,
    Right,
}

/// State before the remove half of a replace, kept until the insert half settles.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingRemoval {
    offset:    usize,
    content:   Vec<char>,
    selection: SelectionRange,
}

#[derive(Debug, Clone)]
pub struct MaskedBuffer {
    mask:      FormatMask,
    content:   Vec<char>,
    selection: SelectionRange,
    type_over: bool,
    replacing: bool,
    pending:   Option<PendingRemoval>,
}

impl MaskedBuffer {
    /// Creates a buffer holding the mask's blank content with the caret at the
    /// first editable slot.
    pub fn new(mask: FormatMask) -> Self {
        let content = mask.blank().chars().collect();
        let caret = mask.first_editable().unwrap_or(0);
        Self {
            mask,
            content,
            selection: SelectionRange::collapsed(caret),
            type_over: false,
            replacing: false,
            pending: None,
        }
    }

    pub const fn mask(&self) -> &FormatMask {
        &self.mask
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn text(&self) -> String {
        self.content.iter().collect()
    }

    /// Only the digits currently in the buffer, in order.
    pub fn digits(&self) -> String {
        self.content.iter().filter(|ch| ch.is_ascii_digit()).collect()
    }

    pub const fn selection(&self) -> SelectionRange {
        self.selection
    }

    pub const fn caret(&self) -> usize {
        self.selection.end()
    }

    pub const fn type_over(&self) -> bool {
        self.type_over
    }

    /// Switches between type-over and insert mode. Type-over always keeps a
    /// single editable slot selected; insert mode keeps a plain caret.
    pub fn set_type_over(&mut self, type_over: bool) {
        self.type_over = type_over;
        self.selection = if type_over {
            self.slot_selection_near(self.selection.start())
        } else {
            SelectionRange::collapsed(self.selection.start())
        };
    }

    /// # Errors
    /// Returns `RangeError` if the range does not fit the buffer.
    pub fn select(&mut self, start: usize, end: usize) -> Result<SelectionRange, RangeError> {
        self.selection = SelectionRange::within(start, end, self.len())?;
        Ok(self.selection)
    }

    /// # Errors
    /// Returns `RangeError::OutOfBounds` if `offset` lies past the buffer.
    pub fn set_caret(&mut self, offset: usize) -> Result<SelectionRange, RangeError> {
        self.select(offset, offset)
    }

    /// Replaces the whole content with pre-formatted text, e.g. a freshly
    /// rendered calendar value. The selection is preserved.
    ///
    /// # Errors
    /// Returns `EditError` if the text has the wrong length, breaks a literal,
    /// or puts an unacceptable character into a variable slot.
    pub fn load(&mut self, text: &str) -> Result<(), EditError> {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() != self.len() {
            return Err(EditError::Overflow {
                offset: 0,
                len:    chars.len(),
            });
        }
        if let Some((offset, &ch)) = chars
            .iter()
            .enumerate()
            .find(|&(i, &ch)| !(self.mask.accepts(i, ch) || (ch == BLANK && self.mask.is_variable(i))))
        {
            return Err(EditError::InvalidChar { ch, offset });
        }
        self.content = chars;
        Ok(())
    }

    /// Replaces everything with `text`, formatted or digits only, as if it
    /// were typed into an empty field.
    ///
    /// # Errors
    /// Returns `EditError` if `text` does not fit the mask; the content is
    /// then unchanged.
    pub fn set_text(&mut self, text: &str) -> Result<SelectionRange, EditError> {
        let mut fresh = Self::new(self.mask.clone());
        let selection = fresh.insert(0, text)?;
        self.content = fresh.content;
        self.selection = if self.type_over {
            self.slot_selection_near(selection.start())
        } else {
            selection
        };
        Ok(self.selection)
    }

    /// Inserts `text` at `offset`.
    ///
    /// In insert mode on a shifting mask, digits after `offset` move right to
    /// make room. In type-over mode, or on a fixed mask, characters overwrite
    /// their slots in place.
    ///
    /// # Errors
    /// Returns `EditError` when the text does not fit the mask. The buffer is
    /// unchanged, except that a rejected insert inside [`replace`](Self::replace)
    /// restores what the remove half took out.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<SelectionRange, EditError> {
        match self.apply_insert(offset, text) {
            Ok(selection) => {
                self.selection = selection;
                self.check_literals();
                Ok(selection)
            },
            Err(err) => {
                tracing::debug!(offset, text, %err, "rejected insert");
                if self.replacing {
                    self.restore_pending();
                }
                Err(err)
            },
        }
    }

    /// Removes `length` characters starting at `offset`.
    ///
    /// A literal is never deleted: an `offset` on a separator moves back one
    /// slot first.
    ///
    /// # Errors
    /// Returns `EditError` if the range runs past the buffer, cannot be moved
    /// off a literal, or hits the mask's guarded offset.
    pub fn remove(&mut self, offset: usize, length: usize) -> Result<SelectionRange, EditError> {
        match self.apply_remove(offset, length) {
            Ok(selection) => {
                self.selection = selection;
                self.check_literals();
                Ok(selection)
            },
            Err(err) => {
                tracing::debug!(offset, length, %err, "rejected remove");
                Err(err)
            },
        }
    }

    /// Removes `length` characters at `offset` and inserts `text` in their place
    /// as one transaction.
    ///
    /// # Errors
    /// Returns the `EditError` of whichever half failed; the content is then
    /// exactly what it was before the call.
    pub fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<SelectionRange, EditError> {
        self.replacing = true;
        let result = self
            .remove(offset, length)
            .and_then(|_| self.insert(offset, text));
        self.replacing = false;
        self.pending = None;
        result
    }

    /// Moves the caret or slot selection. Returns `false` when the motion was
    /// swallowed at an edge.
    pub fn navigate(&mut self, motion: Motion) -> bool {
        let before = self.selection;
        self.selection = if self.type_over {
            self.slot_motion(motion)
        } else {
            self.caret_motion(motion)
        };
        self.selection != before
    }

    fn slot_motion(&self, motion: Motion) -> SelectionRange {
        let current = self.selection.start();
        let target = match motion {
            Motion::Home => self.mask.first_editable(),
            Motion::End => self.mask.last_editable(),
            Motion::Right => self.mask.next_editable(current + 1),
            Motion::Left => current.checked_sub(1).and_then(|prev| self.mask.prev_editable(prev)),
        };
        target.map_or(self.selection, SelectionRange::slot)
    }

    fn caret_motion(&self, motion: Motion) -> SelectionRange {
        let caret = self.caret();
        let target = match motion {
            Motion::Home => self.mask.first_editable(),
            Motion::End => self.mask.last_editable().map(|last| last + 1),
            Motion::Left => caret.checked_sub(1),
            Motion::Right => (caret < self.len()).then_some(caret + 1),
        };
        target.map_or(self.selection, SelectionRange::collapsed)
    }

    fn slot_selection_near(&self, offset: usize) -> SelectionRange {
        self.mask
            .next_editable(offset)
            .or_else(|| self.mask.last_editable())
            .map_or(SelectionRange::collapsed(offset), SelectionRange::slot)
    }

    fn apply_insert(&mut self, offset: usize, text: &str) -> Result<SelectionRange, EditError> {
        let chars: Vec<char> = text.chars().collect();
        if offset > self.len() || offset + chars.len() > self.len() {
            return Err(EditError::Overflow {
                offset,
                len: chars.len(),
            });
        }
        if chars.is_empty() {
            return Ok(self.selection);
        }

        if self.mask.shifts() && !self.type_over {
            self.shift_insert(offset, &chars)
        } else {
            self.overwrite(offset, &chars)
        }
    }

    /// Insert-mode edit on a shifting mask: the digits at and after `offset`
    /// move right past the new ones, and literals are re-laid at their slots.
    fn shift_insert(&mut self, offset: usize, chars: &[char]) -> Result<SelectionRange, EditError> {
        let mut incoming = Vec::with_capacity(chars.len());
        for (i, &ch) in chars.iter().enumerate() {
            if ch.is_ascii_digit() {
                incoming.push(ch);
            } else if !self.is_mask_literal(ch) {
                return Err(EditError::InvalidChar { ch, offset: offset + i });
            }
        }

        let (before, after) = self.content.split_at(offset);
        let mut digits: Vec<char> = before.iter().copied().filter(char::is_ascii_digit).collect();
        let prefix = digits.len();
        digits.extend_from_slice(&incoming);
        let caret_index = digits.len();
        digits.extend(after.iter().copied().filter(char::is_ascii_digit));

        if digits.len() > self.mask.capacity() {
            return Err(EditError::CapacityExceeded {
                capacity: self.mask.capacity(),
            });
        }

        tracing::trace!(offset, prefix, added = incoming.len(), "shifting digits right");
        self.content = self.mask.render(&digits).chars().collect();
        let caret = self.mask.offset_of_variable(caret_index).unwrap_or(self.len());
        Ok(SelectionRange::collapsed(caret))
    }

    /// In-place edit: each character lands on the next slot that takes it,
    /// hopping over literals it does not itself match.
    fn overwrite(&mut self, offset: usize, chars: &[char]) -> Result<SelectionRange, EditError> {
        let mut scratch = self.content.clone();
        let mut pos = offset;

        for &ch in chars {
            if let Some(Slot::Literal(lit)) = self.mask.slot(pos) {
                if lit == ch {
                    pos += 1;
                    continue;
                }
                pos = self.mask.next_editable(pos).ok_or(EditError::Overflow {
                    offset,
                    len: chars.len(),
                })?;
            }
            if pos >= scratch.len() {
                return Err(EditError::Overflow {
                    offset,
                    len: chars.len(),
                });
            }
            if !self.mask.accepts(pos, ch) {
                return Err(EditError::InvalidChar { ch, offset: pos });
            }
            scratch[pos] = ch.to_ascii_uppercase();
            pos += 1;
        }

        let filled = scratch.iter().filter(|ch| ch.is_ascii_digit()).count();
        if filled > self.mask.capacity() {
            return Err(EditError::CapacityExceeded {
                capacity: self.mask.capacity(),
            });
        }

        self.content = scratch;
        tracing::trace!(offset, end = pos, "overwrote slots in place");
        // Type-over keeps the slot the edit started on selected
        Ok(if self.type_over {
            self.slot_selection_near(offset)
        } else {
            SelectionRange::collapsed(self.mask.next_editable(pos).unwrap_or(self.len()))
        })
    }

    fn apply_remove(&mut self, offset: usize, length: usize) -> Result<SelectionRange, EditError> {
        if length == 0 {
            return Ok(self.selection);
        }
        if offset + length > self.len() {
            return Err(EditError::Overflow { offset, len: length });
        }

        let offset = if self.mask.is_literal(offset) {
            offset
                .checked_sub(1)
                .filter(|&prev| self.mask.is_variable(prev))
                .ok_or(EditError::LiteralPosition { offset })?
        } else {
            offset
        };
        if self.mask.guards_remove_at(offset) {
            return Err(EditError::Guarded { offset });
        }
        let end = (offset + length).min(self.len());

        if self.replacing {
            self.pending = Some(PendingRemoval {
                offset,
                content: self.content.clone(),
                selection: self.selection,
            });
        }

        if self.mask.shifts() {
            let digits: Vec<char> = self.content[..offset]
                .iter()
                .chain(&self.content[end..])
                .copied()
                .filter(char::is_ascii_digit)
                .collect();
            tracing::trace!(offset, removed = end - offset, "shifting digits left");
            self.content = self.mask.render(&digits).chars().collect();
        } else {
            for i in offset..end {
                if self.mask.is_variable(i) {
                    self.content[i] = BLANK;
                }
            }
        }
        Ok(SelectionRange::collapsed(offset))
    }

    /// Puts back what the remove half of a failed replace took out.
    fn restore_pending(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        tracing::debug!(offset = pending.offset, "restoring text after rejected replace");
        self.content = pending.content;
        self.selection = pending.selection;
    }

    fn is_mask_literal(&self, ch: char) -> bool {
        (0..self.len()).any(|i| self.mask.slot(i) == Some(Slot::Literal(ch)))
    }

    fn check_literals(&self) {
        debug_assert!(
            self.mask.literals_intact(&self.content),
            "literal slot overwritten: {:?}",
            self.text()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::FieldKind;

    fn buffer(kind: FieldKind, text: &str) -> MaskedBuffer {
        let mut buf = MaskedBuffer::new(kind.mask());
        buf.load(text).unwrap();
        buf
    }

    #[test]
    fn test_new_buffer_is_blank() {
        let buf = MaskedBuffer::new(FormatMask::ssn());
        assert_eq!(buf.text(), "   -  -    ");
        assert_eq!(buf.caret(), 0);
        assert_eq!(buf.digits(), "");

        let phone = MaskedBuffer::new(FormatMask::phone());
        assert_eq!(phone.caret(), 1);
    }

    #[test]
    fn test_insert_shifts_digits_right() {
        let mut buf = MaskedBuffer::new(FormatMask::ssn());
        assert_eq!(buf.insert(1, "3").unwrap(), SelectionRange::collapsed(1));
        assert_eq!(buf.text(), "3  -  -    ");
        buf.insert(1, "3").unwrap();
        assert_eq!(buf.text(), "33 -  -    ");

        let mut buf = buffer(FieldKind::Ssn, "124-56-789 ");
        buf.insert(2, "3").unwrap();
        assert_eq!(buf.text(), "123-45-6789");
    }

    #[test]
    fn test_insert_caret_skips_literal() {
        let mut buf = MaskedBuffer::new(FormatMask::phone());
        let caret = buf.insert(1, "555").unwrap();
        assert_eq!(buf.text(), "(555)   -    ");
        assert_eq!(caret, SelectionRange::collapsed(5));
    }

    #[test]
    fn test_insert_accepts_formatted_paste() {
        let mut buf = MaskedBuffer::new(FormatMask::phone());
        buf.insert(0, "(555)123-4567").unwrap();
        assert_eq!(buf.text(), "(555)123-4567");
        assert_eq!(buf.caret(), 13);
    }

    #[test]
    fn test_insert_rejects_when_full() {
        let mut buf = buffer(FieldKind::Phone, "(555)123-4567");
        for offset in 0..13 {
            assert!(
                matches!(buf.insert(offset, "9"), Err(EditError::CapacityExceeded { capacity: 10 })),
                "insert at {offset} should be rejected"
            );
            assert_eq!(buf.text(), "(555)123-4567");
        }
    }

    #[test]
    fn test_insert_rejects_bad_characters() {
        let mut buf = buffer(FieldKind::Ssn, "12 -  -    ");
        assert!(matches!(
            buf.insert(2, "4x"),
            Err(EditError::InvalidChar { ch: 'x', offset: 3 })
        ));
        assert_eq!(buf.text(), "12 -  -    ");
        assert!(matches!(buf.insert(12, "1"), Err(EditError::Overflow { .. })));
        assert!(matches!(buf.insert(10, "12"), Err(EditError::Overflow { .. })));
    }

    #[test]
    fn test_type_over_overwrites_in_place() {
        let mut buf = buffer(FieldKind::Phone, "(555)123-4567");
        buf.set_type_over(true);
        let selection = buf.insert(2, "9").unwrap();
        assert_eq!(buf.text(), "(595)123-4567");
        assert_eq!(selection, SelectionRange::slot(2));
        assert_eq!(buf.selection(), SelectionRange::slot(2));

        let selection = buf.insert(3, "88").unwrap();
        assert_eq!(buf.text(), "(598)823-4567");
        assert_eq!(selection, SelectionRange::slot(3));
    }

    #[test]
    fn test_type_over_on_literal_selects_following_slot() {
        let mut buf = buffer(FieldKind::Phone, "(555)123-4567");
        buf.set_type_over(true);
        let selection = buf.insert(4, "7").unwrap();
        assert_eq!(buf.text(), "(555)723-4567");
        assert_eq!(selection, SelectionRange::slot(5));

        let selection = buf.insert(0, "1").unwrap();
        assert_eq!(buf.text(), "(155)723-4567");
        assert_eq!(selection, SelectionRange::slot(1));
    }

    #[test]
    fn test_type_over_at_last_slot_keeps_it_selected() {
        let mut buf = buffer(FieldKind::Ssn, "123-45-6789");
        buf.set_type_over(true);
        let selection = buf.insert(10, "0").unwrap();
        assert_eq!(buf.text(), "123-45-6780");
        assert_eq!(selection, SelectionRange::slot(10));
    }

    #[test]
    fn test_remove_shifts_digits_left() {
        let mut buf = buffer(FieldKind::Ssn, "123-45-6789");
        assert_eq!(buf.remove(1, 1).unwrap(), SelectionRange::collapsed(1));
        assert_eq!(buf.text(), "134-56-789 ");

        let mut buf = buffer(FieldKind::Phone, "(555)123-4567");
        buf.remove(5, 4).unwrap();
        assert_eq!(buf.text(), "(555)456-7   ");
    }

    #[test]
    fn test_remove_on_literal_steps_back() {
        let mut buf = buffer(FieldKind::Ssn, "123-45-6789");
        assert_eq!(buf.remove(3, 1).unwrap(), SelectionRange::collapsed(2));
        assert_eq!(buf.text(), "124-56-789 ");

        let mut phone = buffer(FieldKind::Phone, "(555)123-4567");
        assert!(matches!(phone.remove(0, 1), Err(EditError::LiteralPosition { offset: 0 })));
        assert_eq!(phone.text(), "(555)123-4567");
    }

    #[test]
    fn test_currency_refuses_first_slot_remove() {
        let mut buf = buffer(FieldKind::Currency, "$123456.78");
        assert!(matches!(buf.remove(1, 1), Err(EditError::Guarded { offset: 1 })));
        assert_eq!(buf.text(), "$123456.78");
        buf.remove(2, 1).unwrap();
        assert_eq!(buf.text(), "$134567.8 ");
    }

    #[test]
    fn test_fixed_mask_remove_blanks_in_place() {
        let mut buf = buffer(FieldKind::Date, "01/31/2024");
        buf.remove(3, 2).unwrap();
        assert_eq!(buf.text(), "01/  /2024");
    }

    #[test]
    fn test_replace_success() {
        let mut buf = buffer(FieldKind::Phone, "(555)123-4567");
        buf.replace(5, 3, "9").unwrap();
        assert_eq!(buf.text(), "(555)945-67  ");
    }

    #[test]
    fn test_replace_restores_on_invalid_text() {
        let mut buf = buffer(FieldKind::Phone, "(555)123-4567");
        buf.set_caret(8).unwrap();
        assert!(buf.replace(5, 3, "9z").is_err());
        assert_eq!(buf.text(), "(555)123-4567");
        assert_eq!(buf.caret(), 8);

        // Removing one digit and adding two overflows capacity
        assert!(matches!(
            buf.replace(5, 1, "00"),
            Err(EditError::CapacityExceeded { .. })
        ));
        assert_eq!(buf.text(), "(555)123-4567");
    }

    #[test]
    fn test_replace_restores_fixed_mask() {
        let mut buf = buffer(FieldKind::Date, "01/31/2024");
        assert!(buf.replace(3, 2, "x").is_err());
        assert_eq!(buf.text(), "01/31/2024");
    }

    #[test]
    fn test_failed_remove_in_replace_leaves_content() {
        let mut buf = buffer(FieldKind::Currency, "$123456.78");
        assert!(matches!(buf.replace(1, 1, "9"), Err(EditError::Guarded { .. })));
        assert_eq!(buf.text(), "$123456.78");
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut buf = MaskedBuffer::new(FormatMask::ssn());
        for round in 0..30 {
            let offset = round % buf.len();
            let _ = buf.insert(offset, "7");
            assert!(buf.digits().len() <= 9);
            assert_eq!(buf.len(), 11);
            assert!(buf.mask().literals_intact(&buf.text().chars().collect::<Vec<_>>()));
        }
        assert_eq!(buf.digits().len(), 9);
    }

    #[test]
    fn test_type_over_navigation() {
        struct TestCase {
            motion:   Motion,
            from:     usize,
            expected: usize,
            moved:    bool,
        }

        let cases = [
            TestCase {
                motion:   Motion::Right,
                from:     3,
                expected: 5,
                moved:    true,
            },
            TestCase {
                motion:   Motion::Left,
                from:     5,
                expected: 3,
                moved:    true,
            },
            TestCase {
                motion:   Motion::Left,
                from:     1,
                expected: 1,
                moved:    false,
            },
            TestCase {
                motion:   Motion::Right,
                from:     12,
                expected: 12,
                moved:    false,
            },
            TestCase {
                motion:   Motion::Home,
                from:     7,
                expected: 1,
                moved:    true,
            },
            TestCase {
                motion:   Motion::End,
                from:     7,
                expected: 12,
                moved:    true,
            },
        ];

        for case in &cases {
            let mut buf = buffer(FieldKind::Phone, "(555)123-4567");
            buf.set_type_over(true);
            buf.select(case.from, case.from + 1).unwrap();
            assert_eq!(buf.navigate(case.motion), case.moved, "{:?} from {}", case.motion, case.from);
            assert_eq!(buf.selection(), SelectionRange::slot(case.expected), "{:?} from {}", case.motion, case.from);
        }
    }

    #[test]
    fn test_insert_mode_navigation_suppressed_at_edges() {
        let mut buf = MaskedBuffer::new(FormatMask::ssn());
        buf.set_caret(0).unwrap();
        assert!(!buf.navigate(Motion::Left));
        assert_eq!(buf.caret(), 0);
        assert!(buf.navigate(Motion::Right));
        assert_eq!(buf.caret(), 1);

        buf.set_caret(11).unwrap();
        assert!(!buf.navigate(Motion::Right));
        assert_eq!(buf.caret(), 11);
        assert!(buf.navigate(Motion::Left));
        assert_eq!(buf.caret(), 10);
    }

    #[test]
    fn test_set_type_over_selects_editable_slot() {
        let mut buf = MaskedBuffer::new(FormatMask::ssn());
        buf.set_caret(3).unwrap();
        buf.set_type_over(true);
        assert_eq!(buf.selection(), SelectionRange::slot(4));
        buf.set_type_over(false);
        assert_eq!(buf.selection(), SelectionRange::collapsed(4));
    }

    #[test]
    fn test_set_text() {
        let mut buf = buffer(FieldKind::Currency, "$123456.78");
        buf.set_text("$42").unwrap();
        assert_eq!(buf.text(), "$42    .  ");

        buf.set_text("9876543210").unwrap_err();
        assert_eq!(buf.text(), "$42    .  ");

        let mut phone = MaskedBuffer::new(FormatMask::phone());
        phone.set_text("555-123-4567").unwrap();
        assert_eq!(phone.text(), "(555)123-4567");
        assert_eq!(phone.digits(), "5551234567");
    }

    #[test]
    fn test_load_validates() {
        let mut buf = MaskedBuffer::new(FormatMask::date());
        assert!(buf.load("01/31/2024").is_ok());
        assert!(matches!(buf.load("01-31-2024"), Err(EditError::InvalidChar { ch: '-', offset: 2 })));
        assert!(buf.load("01/31/24").is_err());
        assert_eq!(buf.text(), "01/31/2024");
    }
}
