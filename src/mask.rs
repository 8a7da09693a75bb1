//! Fixed-length text templates for structured input fields.
//!
//! A [`FormatMask`] is an ordered list of slots. Literal slots always hold
//! their separator character; variable slots hold a digit (or an AM/PM letter)
//! or the blank placeholder. Per-format differences live in [`MaskPolicy`]
//! rather than in separate mask types.

use serde::{Deserialize, Serialize};

use crate::consts::{
    AMPM_SLOT, BLANK, CURRENCY_TEMPLATE, DATE_TEMPLATE, DIGIT_SLOT, PERCENT_TEMPLATE,
    PHONE_TEMPLATE, SSN_TEMPLATE, TIME_TEMPLATE,
};
use crate::prelude::*;

/// The concrete field formats the engine knows about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    #[display(fmt = "date")]
    Date,
    #[display(fmt = "time")]
    Time,
    #[display(fmt = "phone")]
    Phone,
    #[display(fmt = "ssn")]
    Ssn,
    #[display(fmt = "currency")]
    Currency,
    #[display(fmt = "percent")]
    Percent,
}

impl FieldKind {
    /// Date and time fields are driven by a calendar value instead of free digit entry
    pub const fn is_calendar(self) -> bool {
        matches!(self, Self::Date | Self::Time)
    }

    pub fn mask(self) -> FormatMask {
        match self {
            Self::Date => FormatMask::date(),
            Self::Time => FormatMask::time(),
            Self::Phone => FormatMask::phone(),
            Self::Ssn => FormatMask::ssn(),
            Self::Currency => FormatMask::currency(),
            Self::Percent => FormatMask::percent(),
        }
    }
}

/// What a variable slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotClass {
    Digit,
    AmPmLetter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Literal(char),
    Variable(SlotClass),
}

/// Format-specific hooks layered over the shared edit algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskPolicy {
    /// Insert mode pushes later digits right and removal pulls them left
    pub shifts:         bool,
    /// Most digits the buffer may hold at once
    pub capacity:       usize,
    /// Offset at which removal is refused outright
    pub guarded_remove: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatMask {
    slots:  Vec<Slot>,
    policy: MaskPolicy,
}

impl FormatMask {
    /// Builds a mask from a template where `#` marks a digit slot, `a` marks an
    /// AM/PM letter slot and every other character is a literal.
    pub fn from_template(template: &str, policy: MaskPolicy) -> Self {
        let slots = template
            .chars()
            .map(|ch| match ch {
                DIGIT_SLOT => Slot::Variable(SlotClass::Digit),
                AMPM_SLOT => Slot::Variable(SlotClass::AmPmLetter),
                literal => Slot::Literal(literal),
            })
            .collect();
        Self { slots, policy }
    }

    /// `MM/dd/yyyy`
    pub fn date() -> Self {
        Self::fixed(DATE_TEMPLATE)
    }

    /// `hh:mm a`
    pub fn time() -> Self {
        Self::fixed(TIME_TEMPLATE)
    }

    /// `(###)###-####`
    pub fn phone() -> Self {
        Self::shifting(PHONE_TEMPLATE, None)
    }

    /// `###-##-####`
    pub fn ssn() -> Self {
        Self::shifting(SSN_TEMPLATE, None)
    }

    /// `$######.##`; the digit right after the dollar sign cannot be removed
    pub fn currency() -> Self {
        Self::shifting(CURRENCY_TEMPLATE, Some(1))
    }

    /// `###.##%`
    pub fn percent() -> Self {
        Self::shifting(PERCENT_TEMPLATE, None)
    }

    fn fixed(template: &str) -> Self {
        Self::from_template(
            template,
            MaskPolicy {
                shifts:         false,
                capacity:       count_digit_slots(template),
                guarded_remove: None,
            },
        )
    }

    fn shifting(template: &str, guarded_remove: Option<usize>) -> Self {
        Self::from_template(
            template,
            MaskPolicy {
                shifts: true,
                capacity: count_digit_slots(template),
                guarded_remove,
            },
        )
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub const fn policy(&self) -> MaskPolicy {
        self.policy
    }

    pub const fn shifts(&self) -> bool {
        self.policy.shifts
    }

    pub const fn capacity(&self) -> usize {
        self.policy.capacity
    }

    pub fn slot(&self, offset: usize) -> Option<Slot> {
        self.slots.get(offset).copied()
    }

    pub fn is_literal(&self, offset: usize) -> bool {
        matches!(self.slot(offset), Some(Slot::Literal(_)))
    }

    pub fn is_variable(&self, offset: usize) -> bool {
        matches!(self.slot(offset), Some(Slot::Variable(_)))
    }

    pub fn guards_remove_at(&self, offset: usize) -> bool {
        self.policy.guarded_remove == Some(offset)
    }

    /// Does the slot at `offset` accept `ch`?
    pub fn accepts(&self, offset: usize, ch: char) -> bool {
        match self.slot(offset) {
            Some(Slot::Literal(lit)) => lit == ch,
            Some(Slot::Variable(SlotClass::Digit)) => ch.is_ascii_digit(),
            Some(Slot::Variable(SlotClass::AmPmLetter)) => matches!(ch.to_ascii_uppercase(), 'A' | 'P'),
            None => false,
        }
    }

    /// Offsets of every variable slot, left to right.
    pub fn variable_offsets(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| matches!(slot, Slot::Variable(_)).then_some(i))
    }

    pub fn first_editable(&self) -> Option<usize> {
        self.variable_offsets().next()
    }

    pub fn last_editable(&self) -> Option<usize> {
        self.variable_offsets().last()
    }

    /// First variable slot at or after `offset`.
    pub fn next_editable(&self, offset: usize) -> Option<usize> {
        self.variable_offsets().find(|&i| i >= offset)
    }

    /// Last variable slot at or before `offset`.
    pub fn prev_editable(&self, offset: usize) -> Option<usize> {
        self.variable_offsets().take_while(|&i| i <= offset).last()
    }

    /// Offset of the `index`-th variable slot.
    pub fn offset_of_variable(&self, index: usize) -> Option<usize> {
        self.variable_offsets().nth(index)
    }

    /// Empty content: literals in place, blanks in every variable slot.
    pub fn blank(&self) -> String {
        self.slots
            .iter()
            .map(|slot| match slot {
                Slot::Literal(lit) => *lit,
                Slot::Variable(_) => BLANK,
            })
            .collect()
    }

    /// Lays `digits` into the variable slots from the left, blanking the rest.
    /// Digits beyond the last variable slot are dropped.
    pub fn render(&self, digits: &[char]) -> String {
        let mut remaining = digits.iter();
        self.slots
            .iter()
            .map(|slot| match slot {
                Slot::Literal(lit) => *lit,
                Slot::Variable(_) => remaining.next().copied().unwrap_or(BLANK),
            })
            .collect()
    }

    /// True when every literal slot of `content` carries its literal.
    pub fn literals_intact(&self, content: &[char]) -> bool {
        content.len() == self.len()
            && self.slots.iter().zip(content).all(|(slot, ch)| match slot {
                Slot::Literal(lit) => lit == ch,
                Slot::Variable(_) => true,
            })
    }
}

fn count_digit_slots(template: &str) -> usize {
    template.chars().filter(|&ch| ch == DIGIT_SLOT).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_shapes() {
        struct TestCase {
            kind:     FieldKind,
            len:      usize,
            capacity: usize,
            blank:    &'static str,
            shifts:   bool,
        }

        let cases = [
            TestCase {
                kind:     FieldKind::Date,
                len:      10,
                capacity: 8,
                blank:    "  /  /    ",
                shifts:   false,
            },
            TestCase {
                kind:     FieldKind::Time,
                len:      8,
                capacity: 4,
                blank:    "  :    M",
                shifts:   false,
            },
            TestCase {
                kind:     FieldKind::Phone,
                len:      13,
                capacity: 10,
                blank:    "(   )   -    ",
                shifts:   true,
            },
            TestCase {
                kind:     FieldKind::Ssn,
                len:      11,
                capacity: 9,
                blank:    "   -  -    ",
                shifts:   true,
            },
            TestCase {
                kind:     FieldKind::Currency,
                len:      10,
                capacity: 8,
                blank:    "$      .  ",
                shifts:   true,
            },
            TestCase {
                kind:     FieldKind::Percent,
                len:      7,
                capacity: 5,
                blank:    "   .  %",
                shifts:   true,
            },
        ];

        for case in &cases {
            let mask = case.kind.mask();
            assert_eq!(mask.len(), case.len, "{} length", case.kind);
            assert_eq!(mask.capacity(), case.capacity, "{} capacity", case.kind);
            assert_eq!(mask.blank(), case.blank, "{} blank", case.kind);
            assert_eq!(mask.shifts(), case.shifts, "{} shifting", case.kind);
        }
    }

    #[test]
    fn test_accepts() {
        let mask = FormatMask::time();
        assert!(mask.accepts(0, '7'));
        assert!(!mask.accepts(0, 'x'));
        assert!(mask.accepts(2, ':'));
        assert!(!mask.accepts(2, '1'));
        assert!(mask.accepts(6, 'p'));
        assert!(mask.accepts(6, 'A'));
        assert!(!mask.accepts(6, 'Q'));
        assert!(!mask.accepts(8, '1'));
    }

    #[test]
    fn test_editable_navigation() {
        let mask = FormatMask::phone();
        assert_eq!(mask.first_editable(), Some(1));
        assert_eq!(mask.last_editable(), Some(12));
        assert_eq!(mask.next_editable(4), Some(5));
        assert_eq!(mask.prev_editable(4), Some(3));
        assert_eq!(mask.prev_editable(0), None);
        assert_eq!(mask.next_editable(13), None);
        assert_eq!(mask.offset_of_variable(3), Some(5));
        assert_eq!(mask.offset_of_variable(10), None);
    }

    #[test]
    fn test_render_places_digits_around_literals() {
        let mask = FormatMask::phone();
        let digits: Vec<char> = "5551234567".chars().collect();
        assert_eq!(mask.render(&digits), "(555)123-4567");

        let partial: Vec<char> = "5551".chars().collect();
        assert_eq!(mask.render(&partial), "(555)1  -    ");

        let too_many: Vec<char> = "555123456789".chars().collect();
        assert_eq!(mask.render(&too_many), "(555)123-4567");
    }

    #[test]
    fn test_literals_intact() {
        let mask = FormatMask::ssn();
        let good: Vec<char> = "123-45-6789".chars().collect();
        let bad: Vec<char> = "123445-6789".chars().collect();
        assert!(mask.literals_intact(&good));
        assert!(!mask.literals_intact(&bad));
        assert!(!mask.literals_intact(&good[..5]));
    }

    #[test]
    fn test_currency_guard() {
        let mask = FormatMask::currency();
        assert!(mask.guards_remove_at(1));
        assert!(!mask.guards_remove_at(2));
        assert!(!FormatMask::percent().guards_remove_at(1));
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&FieldKind::Ssn).unwrap();
        assert_eq!(json, r#""ssn""#);
        let kind: FieldKind = serde_json::from_str(r#""currency""#).unwrap();
        assert_eq!(kind, FieldKind::Currency);
        assert!(FieldKind::Date.is_calendar());
        assert!(!FieldKind::Phone.is_calendar());
    }
}
