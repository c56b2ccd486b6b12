// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Assembling compiled predicates into one linked instruction stream.
//!
//! Linking only has to resolve the placeholder retry labels inside a
//! predicate's own choice-point chain — each alternative's `retry` always
//! points at the next alternative of the *same* predicate, a fact known
//! the moment all of its clauses are assembled. Calls between predicates
//! stay late-bound: `Call`/`Execute`/`MetaCall` carry a bare `FunctorId`
//! and are resolved against the call table at the moment the dispatch
//! loop actually executes them, so predicates can be linked in any order
//! and a still-missing callee only surfaces once a query actually tries
//! to reach it.

#[cfg(test)]
mod linker_test;

use std::collections::HashMap;

use tracing::debug;
use warren_codec::{encode_one, Choice, Code, Instr, Label};
use warren_compiler::{rebase_labels, CompiledClause, CompiledPredicate, UNRESOLVED};
use warren_core::FunctorId;

/// Owns the single linked instruction stream and the functor-to-entry-point
/// call table every `Call`/`Execute`/`MetaCall` is resolved against.
#[derive(Debug, Default)]
pub struct Linker {
    code: Code,
    call_table: HashMap<FunctorId, Label>,
}

impl Linker {
    /// An empty linker with no code and no known procedures.
    #[must_use]
    pub fn new() -> Self {
        Self { code: Code::new(), call_table: HashMap::new() }
    }

    /// Append a predicate's compiled clauses, patching its internal retry
    /// chain, and record its entry point in the call table.
    ///
    /// Calling this again for a `functor` already present replaces its
    /// entry point — later `add_to_domain` calls for the same predicate
    /// overwrite rather than append alternatives, matching how a Prolog
    /// top-level reconsults a predicate wholesale.
    pub fn link_predicate(&mut self, functor: FunctorId, predicate: CompiledPredicate) {
        let base = self.code.len() as u32;
        let starts = clause_starts(&predicate.clauses);

        for (i, mut clause) in predicate.clauses.into_iter().enumerate() {
            // Every intra-clause label (a disjunction's choice chain, its
            // `continue`, `\=/2`'s local `trust_me`) was compiled relative
            // to this clause's own start; now that it is placed at an
            // absolute code address, shift those labels to match.
            rebase_labels(&mut clause.instrs, base + starts[i]);
            let patched = patch_retry(clause, starts.get(i + 1).map(|&rel| Label::new(base + rel)));
            for instr in patched.instrs {
                self.code.emit(instr);
            }
        }

        debug!(functor = ?functor, entry = base, "linked predicate");
        self.call_table.insert(functor, Label::new(base));
    }

    /// The entry point for `functor`, if a predicate has been linked for
    /// it.
    #[must_use]
    pub fn lookup(&self, functor: FunctorId) -> Option<Label> {
        self.call_table.get(&functor).copied()
    }

    /// Append a query's instruction sequence and return where it starts.
    ///
    /// A query has no alternatives of its own, so nothing needs patching —
    /// it is simply appended to the same linked stream every `Call` inside
    /// it addresses relative to.
    pub fn append_query(&mut self, instrs: Vec<Instr>) -> Label {
        let base = self.code.len() as u32;
        for instr in instrs {
            self.code.emit(instr);
        }
        Label::new(base)
    }

    /// The linked instruction stream.
    #[must_use]
    pub fn code(&self) -> &Code {
        &self.code
    }
}

/// Byte offset of each clause relative to its predicate's own start,
/// including one past-the-end entry so `clause_starts[i + 1]` is always
/// valid to look up for every clause but the last.
fn clause_starts(clauses: &[CompiledClause]) -> Vec<u32> {
    let mut starts = Vec::with_capacity(clauses.len() + 1);
    let mut offset = 0u32;
    for clause in clauses {
        starts.push(offset);
        offset += clause.instrs.iter().map(|i| encode_one(i).len() as u32).sum::<u32>();
    }
    starts.push(offset);
    starts
}

/// Rewrite a clause's leading choice instruction's `UNRESOLVED` retry
/// label to point at `next`, if it has one and needs patching.
fn patch_retry(mut clause: CompiledClause, next: Option<Label>) -> CompiledClause {
    let Some(first) = clause.instrs.first_mut() else { return clause };
    match (first, next) {
        (Instr::Choice(Choice::TryMeElse { retry }), Some(next)) if *retry == UNRESOLVED => {
            *retry = next;
        }
        (Instr::Choice(Choice::RetryMeElse { retry }), Some(next)) if *retry == UNRESOLVED => {
            *retry = next;
        }
        _ => {}
    }
    clause
}
