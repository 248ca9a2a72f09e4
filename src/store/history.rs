//! Bounded undo/redo history of full pattern snapshots.

use std::collections::VecDeque;

use crate::core::domain::Pattern;

/// A fixed-capacity undo stack plus a redo stack of full [`Pattern`]
/// snapshots.
///
/// The undo stack always ends with the snapshot equal to the currently
/// displayed pattern: committing a mutation pushes the post-mutation state,
/// so undoing pops it and restores the entry beneath. When the stack is
/// full the oldest entry is evicted first; eviction only limits how far
/// back undo can travel, it never touches the newer entries.
///
/// Fresh mutations clear the redo stack; undo and redo themselves do not.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<Pattern>,
    redo: Vec<Pattern>,
    capacity: usize,
}

impl History {
    /// `capacity` is the maximum number of retained snapshots (at least 1,
    /// the seed).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            undo: VecDeque::with_capacity(capacity),
            redo: Vec::new(),
            capacity,
        }
    }

    /// Reset to a single seed snapshot.
    pub fn seed(&mut self, pattern: Pattern) {
        self.undo.clear();
        self.redo.clear();
        self.undo.push_back(pattern);
    }

    /// Discard everything.
    pub fn reset(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Record a committed mutation. Evicts the oldest snapshot when full and
    /// clears the redo stack.
    pub fn push(&mut self, pattern: Pattern) {
        if self.undo.len() == self.capacity {
            self.undo.pop_front();
            log::debug!("history full ({} snapshots); evicted oldest", self.capacity);
        }
        self.undo.push_back(pattern);
        self.redo.clear();
    }

    /// Step back one snapshot. Returns the pattern to restore, or `None`
    /// when only the seed remains.
    pub fn undo(&mut self) -> Option<Pattern> {
        if self.undo.len() <= 1 {
            return None;
        }
        let current = self.undo.pop_back().expect("non-empty undo stack");
        self.redo.push(current);
        self.undo.back().cloned()
    }

    /// Step forward one snapshot. Returns the pattern to restore, or `None`
    /// when nothing has been undone.
    pub fn redo(&mut self) -> Option<Pattern> {
        let pattern = self.redo.pop()?;
        self.undo.push_back(pattern.clone());
        Some(pattern)
    }

    /// Number of retained undo snapshots (including the seed).
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
