// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The public, pull-based solving facade: compile, link, and iterate
//! solutions one at a time without exposing the byte code underneath.

#[cfg(test)]
mod resolver_test;

use std::collections::HashMap;

use warren_codec::{Label, LocId};
use warren_compiler::{Builtins, CompileError, Compiler};
use warren_core::{Clause, FunctorName, NameId, Term, VarId};

use crate::config::MachineConfig;
use crate::decode::decode_term;
use crate::error::{EngineError, LinkError};
use crate::linker::Linker;
use crate::machine::Machine;

/// One answer to a resolved query: every query variable's binding, fully
/// dereferenced and decoded back into a [`Term`].
///
/// A variable absent from its own binding (decoded to `Term::Var`) remains
/// unbound in this particular solution — not every query variable need be
/// grounded for the query as a whole to succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    /// Every query variable's binding, keyed by the variable id the front
    /// end assigned it.
    pub bindings: HashMap<VarId, Term>,
}

struct PendingQuery {
    entry: Label,
    var_slots: HashMap<VarId, LocId>,
    started: bool,
}

/// Compiles clauses and queries, links them, and drives the machine to
/// successive solutions.
pub struct Resolver {
    compiler: Compiler,
    linker: Linker,
    machine: Machine,
    nil: NameId,
    query: Option<PendingQuery>,
}

impl Resolver {
    /// Build an empty resolver — no clauses linked, no query pending.
    #[must_use]
    pub fn new(config: MachineConfig, builtins: Builtins) -> Self {
        Self { compiler: Compiler::new(builtins), linker: Linker::new(), machine: Machine::new(config), nil: builtins.nil, query: None }
    }

    /// Compile and link every alternative of one predicate at once.
    ///
    /// `clauses` must share the same head functor — this is how a whole
    /// predicate definition is (re)loaded, matching a Prolog top-level's
    /// reconsult semantics: a later call for the same functor replaces the
    /// earlier one outright rather than appending more alternatives.
    ///
    /// # Errors
    /// Returns [`LinkError`] if any clause fails to compile, or if
    /// `clauses` is non-empty but its head's functor does not pack into a
    /// [`warren_core::FunctorId`].
    pub fn add_predicate(&mut self, clauses: &[Clause]) -> Result<(), LinkError> {
        let Some(first) = clauses.first() else { return Ok(()) };
        let functor = first.head.functor().and_then(FunctorName::pack).ok_or(LinkError::Compile(CompileError::FunctorIdOverflow))?;
        let compiled = self.compiler.compile_predicate(clauses)?;
        self.linker.link_predicate(functor, compiled);
        Ok(())
    }

    /// Compile, link, and arm a new query, discarding any previous one.
    ///
    /// # Errors
    /// Returns [`LinkError`] if the query body fails to compile.
    pub fn set_query(&mut self, body: &[Term]) -> Result<(), LinkError> {
        let compiled = self.compiler.compile_query(body)?;
        let entry = self.linker.append_query(compiled.instrs);
        self.query = Some(PendingQuery { entry, var_slots: compiled.var_slots, started: false });
        Ok(())
    }

    /// Advance to the next solution of the current query, if any.
    ///
    /// The first call after [`Self::set_query`] runs the query from
    /// scratch; every subsequent call backtracks into the next
    /// alternative. Returns `Ok(None)` once the query is exhausted, or if
    /// no query is currently armed.
    ///
    /// # Errors
    /// Returns [`EngineError`] if the machine hits a configured resource
    /// limit or reaches an undefined procedure.
    pub fn resolve(&mut self) -> Result<Option<Solution>, EngineError> {
        let Some(query) = self.query.as_mut() else { return Ok(None) };
        let succeeded = if query.started {
            self.machine.redo(&self.linker)?
        } else {
            query.started = true;
            self.machine.solve(&self.linker, query.entry)?
        };
        if !succeeded {
            return Ok(None);
        }
        let env = self.machine.current_environment().expect("a succeeded query always leaves its own environment current");
        let bindings = query
            .var_slots
            .iter()
            .map(|(&var, &loc)| (var, decode_term(self.machine.heap(), env.slots[loc.as_u8() as usize], self.nil)))
            .collect();
        Ok(Some(Solution { bindings }))
    }

    /// Discard the machine's execution state and any pending query. Linked
    /// predicates survive a reset; only the live query and runtime state
    /// (heap, stacks, trail) are cleared.
    pub fn reset(&mut self) {
        self.machine.reset();
        self.query = None;
    }
}
