// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Machine sizing configuration.

/// Fixed capacity limits for one machine instance.
///
/// All three are cell/entry counts, not byte sizes; the machine never
/// grows a region past its configured limit, returning
/// [`crate::error::EngineError`] instead of reallocating past it, since
/// runaway recursion should fail loudly rather than slowly exhaust host
/// memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineConfig {
    /// Maximum number of heap cells.
    pub heap_size: usize,
    /// Maximum number of control-stack entries (environments and choice
    /// points combined).
    pub stack_size: usize,
    /// Maximum number of trail entries.
    pub trail_size: usize,
    /// Number of argument/temporary registers (`X1..Xn`) available per
    /// call.
    pub num_registers: usize,
}

impl MachineConfig {
    /// Defaults sized for interactive use and small-to-medium programs.
    #[must_use]
    pub const fn new() -> Self {
        Self { heap_size: 1 << 20, stack_size: 1 << 16, trail_size: 1 << 16, num_registers: 256 }
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::new()
    }
}
