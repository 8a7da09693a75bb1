//! Circular navigation between the sub-fields of a date or time field.
//!
//! Nodes live in an arena and refer to each other by index, so the ring
//! needs no shared ownership. A node may exist without being linked into the
//! cycle; it can then only be reached with [`FieldRing::select`].

use std::collections::HashSet;

use crate::range::SelectionRange;
use crate::types::CalendarUnit;
use crate::prelude::*;
use crate::FieldError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From, Into, Display)]
#[display(fmt = "#{_0}")]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNode {
    unit:     CalendarUnit,
    range:    SelectionRange,
    next:     Option<NodeId>,
    previous: Option<NodeId>,
}

impl FieldNode {
    pub const fn unit(&self) -> CalendarUnit {
        self.unit
    }

    /// Buffer offsets highlighted when this node is selected
    pub const fn range(&self) -> SelectionRange {
        self.range
    }

    pub const fn is_linked(&self) -> bool {
        self.next.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRing {
    nodes:    Vec<FieldNode>,
    selected: NodeId,
}

impl FieldRing {
    /// Builds a ring from `fields`, linking the units named in `cycle` in that
    /// order. Fields left out of `cycle` exist but are never visited by
    /// next/previous.
    ///
    /// # Errors
    /// Returns `FieldError::MalformedRing` when `cycle` is empty, repeats a
    /// unit, or `fields` repeats a unit, and `FieldError::UnknownField` when
    /// `cycle` names a unit without a field.
    pub fn new(fields: &[(CalendarUnit, SelectionRange)], cycle: &[CalendarUnit]) -> Result<Self, FieldError> {
        let mut seen = HashSet::new();
        if cycle.is_empty() || !fields.iter().all(|(unit, _)| seen.insert(*unit)) {
            return Err(FieldError::MalformedRing);
        }
        let mut order = Vec::with_capacity(cycle.len());
        for unit in cycle {
            let index = fields
                .iter()
                .position(|(u, _)| u == unit)
                .ok_or(FieldError::UnknownField { unit: *unit })?;
            if order.contains(&index) {
                return Err(FieldError::MalformedRing);
            }
            order.push(index);
        }
        Ok(Self::link(fields, &order))
    }

    /// `MONTH ⇄ DAY ⇄ YEAR` over `MM/dd/yyyy`
    pub fn date() -> Self {
        Self::link(
            &[
                (CalendarUnit::Month, SelectionRange::ordered(0, 2)),
                (CalendarUnit::Day, SelectionRange::ordered(3, 5)),
                (CalendarUnit::Year, SelectionRange::ordered(6, 10)),
            ],
            &[0, 1, 2],
        )
    }

    /// `HOUR ⇄ MINUTE ⇄ AMPM` over `hh:mm a`. `SECOND` has a node (an empty
    /// range after the minutes) but is left out of the cycle.
    pub fn time() -> Self {
        Self::link(
            &[
                (CalendarUnit::Hour, SelectionRange::ordered(0, 2)),
                (CalendarUnit::Minute, SelectionRange::ordered(3, 5)),
                (CalendarUnit::AmPm, SelectionRange::ordered(6, 8)),
                (CalendarUnit::Second, SelectionRange::collapsed(5)),
            ],
            &[0, 1, 2],
        )
    }

    /// `order` holds valid, distinct indices into `fields`; the first is selected.
    fn link(fields: &[(CalendarUnit, SelectionRange)], order: &[usize]) -> Self {
        let mut nodes: Vec<FieldNode> = fields
            .iter()
            .map(|&(unit, range)| FieldNode {
                unit,
                range,
                next: None,
                previous: None,
            })
            .collect();
        for (i, &index) in order.iter().enumerate() {
            let next = order[(i + 1) % order.len()];
            let previous = order[(i + order.len() - 1) % order.len()];
            nodes[index].next = Some(NodeId(next));
            nodes[index].previous = Some(NodeId(previous));
        }
        Self {
            nodes,
            selected: NodeId(order.first().copied().unwrap_or_default()),
        }
    }

    fn node(&self, id: NodeId) -> &FieldNode {
        &self.nodes[id.0]
    }

    pub fn selected(&self) -> CalendarUnit {
        self.node(self.selected).unit
    }

    pub fn selected_range(&self) -> SelectionRange {
        self.node(self.selected).range
    }

    /// Number of nodes in the cycle
    pub fn cycle_len(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_linked()).count()
    }

    pub fn nodes(&self) -> &[FieldNode] {
        &self.nodes
    }

    pub fn contains(&self, unit: CalendarUnit) -> bool {
        self.nodes.iter().any(|node| node.unit == unit)
    }

    /// Moves to the next node. An unlinked node stays selected.
    pub fn select_next(&mut self) -> SelectionRange {
        if let Some(next) = self.node(self.selected).next {
            self.selected = next;
        }
        self.selected_range()
    }

    /// Moves to the previous node. An unlinked node stays selected.
    pub fn select_previous(&mut self) -> SelectionRange {
        if let Some(previous) = self.node(self.selected).previous {
            self.selected = previous;
        }
        self.selected_range()
    }

    /// Jumps straight to `unit`, linked or not.
    ///
    /// # Errors
    /// Returns `FieldError::UnknownField` if the ring has no node for `unit`.
    pub fn select(&mut self, unit: CalendarUnit) -> Result<SelectionRange, FieldError> {
        let index = self
            .nodes
            .iter()
            .position(|node| node.unit == unit)
            .ok_or(FieldError::UnknownField { unit })?;
        self.selected = NodeId(index);
        Ok(self.selected_range())
    }

    /// The linked field whose range covers `offset`. An offset just past a
    /// field's end (a caret after its last character) also counts.
    pub fn unit_at(&self, offset: usize) -> Option<CalendarUnit> {
        self.node_at(offset).map(|id| self.node(id).unit)
    }

    /// Selects the linked field covering `offset`, if any, and returns the
    /// unit selected afterwards.
    pub fn select_at(&mut self, offset: usize) -> CalendarUnit {
        if let Some(id) = self.node_at(offset) {
            self.selected = id;
        }
        self.selected()
    }

    fn node_at(&self, offset: usize) -> Option<NodeId> {
        let linked = || self.nodes.iter().enumerate().filter(|(_, node)| node.is_linked());
        linked()
            .find(|(_, node)| node.range.contains(offset))
            .or_else(|| linked().find(|(_, node)| node.range.end() == offset))
            .map(|(index, _)| NodeId(index))
    }
}
