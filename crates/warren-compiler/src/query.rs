// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use std::collections::HashMap;

use warren_codec::{Instr, LocId};
use warren_core::VarId;

/// A compiled query: its goal sequence plus the environment-slot
/// assignment the runtime needs to read bindings back out after
/// `resolve` succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    /// The instruction sequence, ending in `Proceed` rather than
    /// `Deallocate`/`Execute` — a query never tail-calls away its own
    /// environment, since the environment is exactly what the caller
    /// wants to inspect.
    pub instrs: Vec<Instr>,
    /// Every distinct query variable's environment slot.
    pub var_slots: HashMap<VarId, LocId>,
}
