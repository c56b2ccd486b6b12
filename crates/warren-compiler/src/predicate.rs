// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Stitching several clause alternatives into one predicate's
//! choice-point chain.

#[cfg(test)]
mod predicate_test;

use warren_codec::{Choice, Control, Cut, Instr, Label};

use crate::clause::CompiledClause;

/// A placeholder label the linker must rewrite once it knows where the
/// next alternative in the chain actually lands.
pub const UNRESOLVED: Label = Label::new(u32::MAX);

/// Shift every intra-clause label referenced by `instrs` forward by
/// `delta`, in place. Labels compiled inside a clause body (a
/// disjunction's choice chain, its `continue` past a branch, `\=/2`'s
/// local `trust_me`) are always relative to that clause's own start;
/// once the clause is placed at an absolute address — behind a choice
/// prefix assembled here, or behind another predicate's clauses once
/// linked — every such label needs rebasing by the same amount.
///
/// [`UNRESOLVED`] is left untouched: it is a sentinel the linker patches
/// separately, not a real intra-clause address.
pub fn rebase_labels(instrs: &mut [Instr], delta: u32) {
    let shift = |label: &mut Label| {
        if *label != UNRESOLVED {
            *label = Label::new(label.as_u32() + delta);
        }
    };
    for instr in instrs {
        match instr {
            Instr::Choice(Choice::TryMeElse { retry } | Choice::RetryMeElse { retry }) => shift(retry),
            Instr::Control(Control::Continue { target }) => shift(target),
            Instr::Cut(Cut::GetLevelLoc(_) | Cut::CutLoc(_) | Cut::NeckCut)
            | Instr::Choice(
                Choice::TrustMe
                | Choice::Try { .. }
                | Choice::Retry { .. }
                | Choice::Trust { .. }
                | Choice::SwitchOnTerm { .. }
                | Choice::SwitchOnConstant { .. }
                | Choice::SwitchOnStructure { .. },
            )
            | Instr::Get { .. }
            | Instr::Put { .. }
            | Instr::Unify(_)
            | Instr::Control(
                Control::Call { .. }
                | Control::Execute { .. }
                | Control::MetaCall { .. }
                | Control::Proceed
                | Control::Allocate { .. }
                | Control::Deallocate
                | Control::Fail,
            ) => {}
        }
    }
}

/// All compiled alternatives for one predicate, in the order they should
/// be tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPredicate {
    /// One entry per alternative, each already carrying its own
    /// choice-point prefix (`try_me_else`/`retry_me_else`/`trust_me`)
    /// when there is more than one.
    pub clauses: Vec<CompiledClause>,
}

/// Assemble a flat list of clause alternatives (already in try order)
/// into a `CompiledPredicate`, prefixing each with the choice instruction
/// appropriate to its position in the chain.
///
/// A predicate with a single alternative needs no choice point at all —
/// it is simply tried, and failure fails the call outright.
#[must_use]
pub fn assemble_predicate(alternatives: Vec<CompiledClause>) -> CompiledPredicate {
    let n = alternatives.len();
    if n <= 1 {
        return CompiledPredicate { clauses: alternatives };
    }
    let clauses = alternatives
        .into_iter()
        .enumerate()
        .map(|(i, mut alt)| {
            let prefix = if i == 0 {
                Instr::Choice(Choice::TryMeElse { retry: UNRESOLVED })
            } else if i == n - 1 {
                Instr::Choice(Choice::TrustMe)
            } else {
                Instr::Choice(Choice::RetryMeElse { retry: UNRESOLVED })
            };
            rebase_labels(&mut alt.instrs, prefix.byte_len() as u32);
            let mut instrs = Vec::with_capacity(alt.instrs.len() + 1);
            instrs.push(prefix);
            instrs.extend(alt.instrs);
            CompiledClause::new(instrs)
        })
        .collect();
    CompiledPredicate { clauses }
}
