//! # Interaction Row Renderer
//!
//! Hover and keyboard focus are transient UI state. They live here, keyed by row, and
//! never touch the Record Store. Column renderers ask for a row's
//! [`RowInteraction`] to decide whether to reveal action buttons (delete, lock) or
//! to show the status badge in the same slot.

use std::collections::HashMap;
use std::hash::Hash;

use crate::status::{Status, StatusBadge};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowInteraction {
    pub has_focus: bool,
    pub has_mouse: bool,
}

impl RowInteraction {
    /// Either hovered or focused.
    pub fn is_engaged(&self) -> bool {
        self.has_focus || self.has_mouse
    }
}

/// Low-level signals reported by the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionSignal {
    MouseEnter,
    MouseLeave,
    Focus,
    Blur,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    /// Add a variable to a group.
    Add,
    Delete,
    /// Shown on plain values; marks the value secret.
    Lock,
    /// Shown on secret values; makes the value plain again.
    Unlock,
    More,
}

/// What occupies the trailing slot of a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trailer {
    Action(RowAction),
    Badge(StatusBadge),
    Empty,
}

#[derive(Debug)]
pub struct InteractionTracker<K> {
    rows: HashMap<K, RowInteraction>,
}

impl<K> Default for InteractionTracker<K> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq + Copy> InteractionTracker<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a signal; returns whether the row's state changed.
    pub fn apply(&mut self, row: K, signal: InteractionSignal) -> bool {
        let entry = self.rows.entry(row).or_default();
        let before = *entry;
        match signal {
            InteractionSignal::MouseEnter => entry.has_mouse = true,
            InteractionSignal::MouseLeave => entry.has_mouse = false,
            InteractionSignal::Focus => entry.has_focus = true,
            InteractionSignal::Blur => entry.has_focus = false,
        }
        let changed = *entry != before;
        if !entry.is_engaged() {
            self.rows.remove(&row);
        }
        changed
    }

    pub fn state(&self, row: K) -> RowInteraction {
        self.rows.get(&row).copied().unwrap_or_default()
    }

    /// Drops state for rows that no longer exist.
    pub fn retain(&mut self, alive: impl Fn(&K) -> bool) {
        self.rows.retain(|k, _| alive(k));
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

/// Name cell: delete is revealed on hover or focus.
pub fn name_action(interaction: RowInteraction) -> Option<RowAction> {
    interaction.is_engaged().then_some(RowAction::Delete)
}

/// Value cell: lock toggle while engaged, status badge otherwise.
pub fn value_trailer(interaction: RowInteraction, is_secret: bool, status: Option<&Status>) -> Trailer {
    if interaction.is_engaged() {
        return Trailer::Action(lock_action(is_secret));
    }
    status_trailer(status)
}

/// The toggle offered for a value: the action names what activating it does.
pub fn lock_action(is_secret: bool) -> RowAction {
    if is_secret {
        RowAction::Unlock
    } else {
        RowAction::Lock
    }
}

pub fn status_trailer(status: Option<&Status>) -> Trailer {
    status.map_or(Trailer::Empty, |s| Trailer::Badge(s.badge()))
}
