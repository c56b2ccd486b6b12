// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The trail: heap addresses that must be reset to unbound on backtracking.
//!
//! Only bindings that predate the most recent choice point need trailing
//! (the conditional trail discipline): a binding made after the current
//! choice point's heap mark is discarded for free when the heap itself is
//! truncated back to that mark.

#[cfg(test)]
mod trail_test;

use warren_core::Cell;

use crate::error::EngineError;
use crate::heap::Heap;

/// The machine's trail stack.
#[derive(Debug, Default)]
pub struct Trail {
    entries: Vec<u32>,
    limit: usize,
}

impl Trail {
    /// Create an empty trail bounded to `limit` entries.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { entries: Vec::new(), limit }
    }

    /// Current trail size, usable as an undo mark.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.entries.len() as u32
    }

    /// Whether the trail holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `addr` needs trailing given the heap size recorded at the
    /// most recent choice point (`boundary`): only bindings older than the
    /// current choice point must survive a later, shallower one.
    #[must_use]
    pub fn needs_trailing(addr: u32, boundary: u32) -> bool {
        addr < boundary
    }

    /// Record that `addr` was bound, so it can be unbound on backtracking.
    pub fn push(&mut self, addr: u32) -> Result<(), EngineError> {
        if self.entries.len() >= self.limit {
            return Err(EngineError::TrailExhausted { limit: self.limit });
        }
        self.entries.push(addr);
        Ok(())
    }

    /// Unwind every entry pushed since `mark`, resetting each addressed
    /// cell back to an unbound, self-referential variable.
    pub fn undo_to(&mut self, mark: u32, heap: &mut Heap) {
        while self.entries.len() > mark as usize {
            let addr = self.entries.pop().expect("len checked above");
            heap.write_cell(addr, Cell::unbound_var(addr));
        }
    }

    /// Drop every entry addressing heap at or above `threshold`.
    ///
    /// After a cut discards choice points, any entry pointing past the new
    /// topmost choice point's `heap_mark` protects nothing: the next
    /// backtrack to reach that choice point truncates the heap back to
    /// `heap_mark` regardless, wiping the cell the entry would have reset.
    /// Keeps the relative order of the surviving entries.
    pub fn tidy(&mut self, threshold: u32) {
        self.entries.retain(|&addr| addr < threshold);
    }
}
