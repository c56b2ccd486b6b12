// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use warren_codec::Instr;

/// One compiled clause alternative — always exactly one per source
/// `Clause`. An embedded disjunction in the body compiles inline, as a
/// private choice-point chain inside this same instruction sequence (see
/// [`crate::disjunction`] and
/// [`crate::compiler::Compiler::compile_disjunction`]), rather than
/// multiplying out into separate `CompiledClause`s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledClause {
    /// The instruction sequence for this alternative, not yet placed at
    /// any code address.
    pub instrs: Vec<Instr>,
}

impl CompiledClause {
    /// Wrap an already-compiled instruction sequence.
    #[must_use]
    pub const fn new(instrs: Vec<Instr>) -> Self {
        Self { instrs }
    }
}
