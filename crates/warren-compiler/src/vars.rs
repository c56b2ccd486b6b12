// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Permanent-variable analysis.
//!
//! A variable that occurs in more than one goal of a clause (the head
//! counts as goal zero) must survive across a call and therefore lives in
//! an environment slot rather than a register, which a call's dispatch is
//! free to clobber. Query variables are always permanent: the whole query
//! is one environment whose bindings the caller inspects after `resolve`.

#[cfg(test)]
mod vars_test;

use std::collections::{HashMap, HashSet};

use warren_codec::LocId;
use warren_core::{Term, VarId};

/// Where a variable lives for the remainder of the clause being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarLoc {
    /// A permanent environment slot.
    Perm(LocId),
    /// A temporary register, valid only until the next call.
    Temp(warren_codec::RegId),
}

/// Collect every variable occurring anywhere within `term`, with
/// duplicates (used for per-goal membership tests).
pub fn collect_vars(term: &Term, out: &mut Vec<VarId>) {
    match term {
        Term::Var(v) => out.push(*v),
        Term::Atom(_) => {}
        Term::Struct(_, args) => args.iter().for_each(|a| collect_vars(a, out)),
        Term::List(elems, tail) => {
            elems.iter().for_each(|e| collect_vars(e, out));
            if let Some(tail) = tail {
                collect_vars(tail, out);
            }
        }
    }
}

/// The last goal index (0 = head, if present; 1.. = body) in which each
/// variable of `head`/`body` occurs.
#[must_use]
pub fn last_occurrence(head: Option<&Term>, body: &[Term]) -> HashMap<VarId, usize> {
    let goals: Vec<&Term> = head.into_iter().chain(body.iter()).collect();
    let mut last_seen = HashMap::new();
    for (goal_index, goal) in goals.iter().enumerate() {
        let mut occurrences = Vec::new();
        collect_vars(goal, &mut occurrences);
        for v in occurrences {
            last_seen.insert(v, goal_index);
        }
    }
    last_seen
}

/// Assign environment slots to every variable occurring in more than one
/// goal of a clause, in order of decreasing last-occurrence goal index
/// (ties broken by first occurrence across `head`, goal zero if present,
/// followed by `body`): the variable that dies earliest gets the
/// highest-numbered slot, so that a `call`'s `nvars` operand can trim the
/// environment by simply dropping the slots past a prefix count.
///
/// Returns the slot assignment plus the total number of permanent
/// variables (the environment size before the compiler reserves any
/// internal cut-barrier slot).
#[must_use]
pub fn classify_clause(head: Option<&Term>, body: &[Term]) -> HashMap<VarId, LocId> {
    let goals: Vec<&Term> = head.into_iter().chain(body.iter()).collect();
    let mut goal_membership: HashMap<VarId, HashSet<usize>> = HashMap::new();
    let mut first_seen: Vec<VarId> = Vec::new();
    for (goal_index, goal) in goals.iter().enumerate() {
        let mut occurrences = Vec::new();
        collect_vars(goal, &mut occurrences);
        for v in occurrences {
            if goal_membership.entry(v).or_default().insert(goal_index) && !first_seen.contains(&v)
            {
                first_seen.push(v);
            }
        }
    }
    let last_seen = last_occurrence(head, body);
    let mut permanents: Vec<VarId> =
        first_seen.into_iter().filter(|v| goal_membership[v].len() > 1).collect();
    permanents.sort_by_key(|v| std::cmp::Reverse(last_seen[v]));
    permanents.into_iter().enumerate().map(|(slot, v)| (v, LocId::new(slot as u8))).collect()
}

/// Assign every distinct query variable a slot, in first-occurrence
/// order. Queries have no head and no notion of a "single goal" variable
/// being safely temporary, since every binding must outlive the whole
/// resolution for the caller to observe it.
#[must_use]
pub fn classify_query(body: &[Term]) -> HashMap<VarId, LocId> {
    let mut occurrences = Vec::new();
    body.iter().for_each(|goal| collect_vars(goal, &mut occurrences));
    let mut slots = HashMap::new();
    let mut next_slot = 0u8;
    for v in occurrences {
        slots.entry(v).or_insert_with(|| {
            let slot = LocId::new(next_slot);
            next_slot += 1;
            slot
        });
    }
    slots
}
