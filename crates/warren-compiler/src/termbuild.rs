// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Term-to-instruction compilation shared by clause heads and call
//! arguments.
//!
//! Head matching is compiled breadth-first: a structure's own
//! `get_structure` plus one `unify_*` token per immediate argument are
//! emitted before descending into any argument that is itself compound.
//! Call-argument building is compiled depth-first post-order: a nested
//! subterm is fully built on the heap before the `put_structure`/`set_*`
//! tokens that reference it, so every register a `set_value` names is
//! already valid.

#[cfg(test)]
mod termbuild_test;

use std::collections::{HashMap, HashSet, VecDeque};

use warren_codec::{Get, Instr, LocId, Put, RegId, Unify};
use warren_core::{NameId, Term, VarId};

use crate::error::CompileError;

/// Permanent-variable bookkeeping spanning an entire clause (head plus
/// every body goal) or an entire query.
#[derive(Clone)]
pub struct ClauseCtx<'a> {
    perm_slots: &'a HashMap<VarId, LocId>,
    seen_perm: HashSet<VarId>,
    last_occurrence: Option<HashMap<VarId, usize>>,
}

impl<'a> ClauseCtx<'a> {
    /// Build a context over a precomputed permanent-slot assignment, with
    /// no notion of trimming: every permanent variable stays live for the
    /// whole body. This is what a query needs, since the caller inspects
    /// every binding only once resolution completes.
    #[must_use]
    pub fn new(perm_slots: &'a HashMap<VarId, LocId>) -> Self {
        Self { perm_slots, seen_perm: HashSet::new(), last_occurrence: None }
    }

    /// Build a context for a clause body, additionally carrying each
    /// permanent variable's last-occurrence goal index so
    /// [`Self::live_count_after`] can report a genuinely shrinking count.
    #[must_use]
    pub fn with_trimming(perm_slots: &'a HashMap<VarId, LocId>, last_occurrence: HashMap<VarId, usize>) -> Self {
        Self { perm_slots, seen_perm: HashSet::new(), last_occurrence: Some(last_occurrence) }
    }

    /// Whether `v` was assigned a permanent (environment) slot rather than
    /// living only in a temporary register for the goal that uses it.
    #[must_use]
    pub fn is_permanent(&self, v: VarId) -> bool {
        self.perm_slots.contains_key(&v)
    }

    fn first_occurrence(&mut self, v: VarId) -> bool {
        self.seen_perm.insert(v)
    }

    /// Whether a permanent variable has already been bound earlier in this
    /// clause. Used to pre-bind variables whose first occurrence falls
    /// inside a disjunction branch, before that branch's choice point is
    /// pushed, so every branch sees the same fresh slate.
    #[must_use]
    pub fn already_seen(&self, v: VarId) -> bool {
        self.seen_perm.contains(&v)
    }

    /// The environment slot reserved for permanent variable `v`.
    ///
    /// # Panics
    /// Panics if `v` was not assigned a permanent slot.
    #[must_use]
    pub fn perm_loc(&self, v: VarId) -> LocId {
        self.perm_slots[&v]
    }

    /// Mark `v` as already bound, without emitting an instruction for it.
    pub fn mark_seen(&mut self, v: VarId) {
        self.seen_perm.insert(v);
    }

    /// Number of permanent variables in this clause's user-level slot
    /// assignment (excluding any internal cut-barrier slot the compiler
    /// reserves separately).
    #[must_use]
    pub fn perm_count(&self) -> u8 {
        self.perm_slots.len() as u8
    }

    /// Number of permanent variables still live immediately after the
    /// goal at `goal_index` (0 = head) has run: those whose last
    /// occurrence is strictly later. Slots are assigned by
    /// [`crate::vars::classify_clause`] in decreasing last-occurrence
    /// order, so this is exactly the `nvars` a `call`/`meta_call` at this
    /// point should carry to let the next `allocate` trim dead slots.
    /// Without trimming data (a query context) every permanent variable
    /// is considered live for the whole body.
    #[must_use]
    pub fn live_count_after(&self, goal_index: usize) -> u8 {
        match &self.last_occurrence {
            Some(last) => self
                .perm_slots
                .keys()
                .filter(|v| last.get(v).copied().unwrap_or(usize::MAX) > goal_index)
                .count() as u8,
            None => self.perm_count(),
        }
    }
}

/// Temporary-register bookkeeping local to a single goal (the head counts
/// as one goal; each body/query goal gets its own).
struct GoalCtx {
    seen_temp: HashMap<VarId, RegId>,
    next_temp: u8,
}

impl GoalCtx {
    fn new(start: u8) -> Self {
        Self { seen_temp: HashMap::new(), next_temp: start }
    }

    fn fresh_temp(&mut self) -> RegId {
        let reg = RegId::new(self.next_temp);
        self.next_temp = self.next_temp.saturating_add(1);
        reg
    }
}

/// Resolve `term` as an explicit cons cell, for decomposing the sugared
/// `List` representation one element at a time. Returns `None` for the
/// empty list, resolving it against `nil`.
fn cons_or_nil(elems: &[Term], tail: &Option<Box<Term>>, nil: NameId) -> Result<Term, (Term, Term)> {
    if let Some((head, rest)) = elems.split_first() {
        let cdr = Term::List(rest.to_vec(), tail.clone());
        Err((head.clone(), cdr))
    } else {
        Ok(tail.as_deref().cloned().unwrap_or(Term::Atom(nil)))
    }
}

fn is_compound(term: &Term) -> bool {
    matches!(term, Term::Struct(..) | Term::List(..))
}

// ---------------------------------------------------------------------
// Head (matching) compilation.
// ---------------------------------------------------------------------

/// Compile a clause head's argument list into `get`/`unify` instructions.
pub fn compile_head(
    args: &[Term],
    ctx: &mut ClauseCtx<'_>,
    nil: NameId,
) -> Result<Vec<Instr>, CompileError> {
    let mut goal = GoalCtx::new(args.len() as u8);
    let mut out = Vec::new();
    let mut queue: VecDeque<(RegId, Term)> = args
        .iter()
        .enumerate()
        .map(|(i, t)| (RegId::new(i as u8), t.clone()))
        .collect();
    while let Some((reg, term)) = queue.pop_front() {
        emit_head_token(reg, term, ctx, &mut goal, &mut out, &mut queue, nil)?;
    }
    Ok(out)
}

fn emit_head_token(
    reg: RegId,
    term: Term,
    ctx: &mut ClauseCtx<'_>,
    goal: &mut GoalCtx,
    out: &mut Vec<Instr>,
    queue: &mut VecDeque<(RegId, Term)>,
    nil: NameId,
) -> Result<(), CompileError> {
    match term {
        Term::Var(v) => out.push(get_var_instr(reg, v, ctx, goal)),
        Term::Atom(name) => out.push(Instr::Get { op: Get::Constant(name), arg: reg }),
        Term::Struct(functor, args) => {
            let functor_id = functor.pack().ok_or(CompileError::FunctorIdOverflow)?;
            out.push(Instr::Get { op: Get::Structure(functor_id), arg: reg });
            for a in args {
                emit_head_child(a, ctx, goal, out, queue)?;
            }
        }
        Term::List(elems, tail) => match cons_or_nil(&elems, &tail, nil) {
            Ok(nil_term) => {
                emit_head_token(reg, nil_term, ctx, goal, out, queue, nil)?;
            }
            Err((car, cdr)) => {
                out.push(Instr::Get { op: Get::List, arg: reg });
                emit_head_child(car, ctx, goal, out, queue)?;
                emit_head_child(cdr, ctx, goal, out, queue)?;
            }
        },
    }
    Ok(())
}

fn emit_head_child(
    term: Term,
    ctx: &mut ClauseCtx<'_>,
    goal: &mut GoalCtx,
    out: &mut Vec<Instr>,
    queue: &mut VecDeque<(RegId, Term)>,
) -> Result<(), CompileError> {
    match term {
        Term::Var(v) => out.push(unify_var_instr(v, ctx, goal)),
        Term::Atom(name) => out.push(Instr::Unify(Unify::Constant(name))),
        compound => {
            let child_reg = goal.fresh_temp();
            out.push(Instr::Unify(Unify::VariableTemp(child_reg)));
            queue.push_back((child_reg, compound));
        }
    }
    Ok(())
}

fn get_var_instr(reg: RegId, v: VarId, ctx: &mut ClauseCtx<'_>, goal: &mut GoalCtx) -> Instr {
    if ctx.is_permanent(v) {
        let loc = ctx.perm_slots[&v];
        let op = if ctx.first_occurrence(v) { Get::VariableLoc(loc) } else { Get::ValueLoc(loc) };
        Instr::Get { op, arg: reg }
    } else if let Some(&existing) = goal.seen_temp.get(&v) {
        Instr::Get { op: Get::ValueTemp(existing), arg: reg }
    } else {
        goal.seen_temp.insert(v, reg);
        // The argument register already holds this variable's sole
        // reference; still emit `get_variable` so the register is
        // recorded in the bytecode stream for disassembly and so a later
        // occurrence via a *different* register compares correctly.
        Instr::Get { op: Get::VariableTemp(reg), arg: reg }
    }
}

fn unify_var_instr(v: VarId, ctx: &mut ClauseCtx<'_>, goal: &mut GoalCtx) -> Instr {
    if ctx.is_permanent(v) {
        let loc = ctx.perm_slots[&v];
        let op = if ctx.first_occurrence(v) { Unify::VariableLoc(loc) } else { Unify::ValueLoc(loc) };
        Instr::Unify(op)
    } else if let Some(&existing) = goal.seen_temp.get(&v) {
        Instr::Unify(Unify::ValueTemp(existing))
    } else {
        let reg = goal.fresh_temp();
        goal.seen_temp.insert(v, reg);
        Instr::Unify(Unify::VariableTemp(reg))
    }
}

// ---------------------------------------------------------------------
// Call-argument (building) compilation.
// ---------------------------------------------------------------------

/// Compile the argument list of an outgoing call. `unsafe_perm` marks
/// permanent variables whose *last* occurrence in the whole clause is
/// this call, so the deallocating tail call can copy them with
/// `put_unsafe_value` instead of `put_value`.
pub fn compile_call_args(
    args: &[Term],
    ctx: &mut ClauseCtx<'_>,
    unsafe_perm: &HashSet<VarId>,
    nil: NameId,
) -> Result<Vec<Instr>, CompileError> {
    let mut goal = GoalCtx::new(args.len() as u8);
    let mut out = Vec::new();
    for (i, term) in args.iter().enumerate() {
        build_term(term.clone(), RegId::new(i as u8), ctx, &mut goal, unsafe_perm, nil, &mut out)?;
    }
    Ok(out)
}

fn build_term(
    term: Term,
    reg: RegId,
    ctx: &mut ClauseCtx<'_>,
    goal: &mut GoalCtx,
    unsafe_perm: &HashSet<VarId>,
    nil: NameId,
    out: &mut Vec<Instr>,
) -> Result<(), CompileError> {
    match term {
        Term::Var(v) => out.push(put_var_instr(reg, v, ctx, goal, unsafe_perm)),
        Term::Atom(name) => out.push(Instr::Put { op: Put::Constant(name), arg: reg }),
        Term::Struct(functor, args) => {
            let mut children = Vec::with_capacity(args.len());
            for a in args {
                let child_reg = goal.fresh_temp();
                if is_compound(&a) {
                    build_term(a.clone(), child_reg, ctx, goal, unsafe_perm, nil, out)?;
                }
                children.push((child_reg, a));
            }
            let functor_id = functor.pack().ok_or(CompileError::FunctorIdOverflow)?;
            out.push(Instr::Put { op: Put::Structure(functor_id), arg: reg });
            for (child_reg, a) in children {
                out.push(set_child_instr(child_reg, a, ctx, goal, unsafe_perm));
            }
        }
        Term::List(elems, tail) => match cons_or_nil(&elems, &tail, nil) {
            Ok(nil_term) => build_term(nil_term, reg, ctx, goal, unsafe_perm, nil, out)?,
            Err((car, cdr)) => {
                let car_reg = goal.fresh_temp();
                let cdr_reg = goal.fresh_temp();
                if is_compound(&car) {
                    build_term(car.clone(), car_reg, ctx, goal, unsafe_perm, nil, out)?;
                }
                if is_compound(&cdr) {
                    build_term(cdr.clone(), cdr_reg, ctx, goal, unsafe_perm, nil, out)?;
                }
                out.push(Instr::Put { op: Put::List, arg: reg });
                out.push(set_child_instr(car_reg, car, ctx, goal, unsafe_perm));
                out.push(set_child_instr(cdr_reg, cdr, ctx, goal, unsafe_perm));
            }
        },
    }
    Ok(())
}

fn set_child_instr(
    reg: RegId,
    term: Term,
    ctx: &mut ClauseCtx<'_>,
    goal: &mut GoalCtx,
    unsafe_perm: &HashSet<VarId>,
) -> Instr {
    match term {
        Term::Var(v) => match put_var_instr(reg, v, ctx, goal, unsafe_perm) {
            Instr::Put { op: Put::VariableTemp(r), .. } => Instr::Unify(Unify::VariableTemp(r)),
            Instr::Put { op: Put::VariableLoc(l), .. } => Instr::Unify(Unify::VariableLoc(l)),
            Instr::Put { op: Put::ValueTemp(r), .. } => Instr::Unify(Unify::LocalValueTemp(r)),
            Instr::Put { op: Put::ValueLoc(l), .. } | Instr::Put { op: Put::UnsafeValueLoc(l), .. } => {
                Instr::Unify(Unify::LocalValueLoc(l))
            }
            _ => unreachable!("put_var_instr only returns variable/value puts"),
        },
        Term::Atom(name) => Instr::Unify(Unify::Constant(name)),
        // Compound children were already built on the heap by the
        // preceding post-order `build_term` call; `reg` already holds a
        // valid reference, so this must copy it (`set_value`), not bind
        // a fresh variable (`set_variable`), into the parent's slot.
        _ => Instr::Unify(Unify::ValueTemp(reg)),
    }
}

fn put_var_instr(
    reg: RegId,
    v: VarId,
    ctx: &mut ClauseCtx<'_>,
    goal: &mut GoalCtx,
    unsafe_perm: &HashSet<VarId>,
) -> Instr {
    if ctx.is_permanent(v) {
        let loc = ctx.perm_slots[&v];
        let op = if ctx.first_occurrence(v) {
            Put::VariableLoc(loc)
        } else if unsafe_perm.contains(&v) {
            Put::UnsafeValueLoc(loc)
        } else {
            Put::ValueLoc(loc)
        };
        Instr::Put { op, arg: reg }
    } else if let Some(&existing) = goal.seen_temp.get(&v) {
        Instr::Put { op: Put::ValueTemp(existing), arg: reg }
    } else {
        goal.seen_temp.insert(v, reg);
        Instr::Put { op: Put::VariableTemp(reg), arg: reg }
    }
}

// ---------------------------------------------------------------------
// Unification (`=/2`) compilation.
// ---------------------------------------------------------------------

/// Compile `lhs = rhs` as head-style matching: build `rhs` into register 0
/// the way a call argument would be, then match `lhs` against that same
/// register the way a clause head argument would be. A variable occurring
/// on both sides is handled correctly since both phases share one
/// [`GoalCtx`], started past register 0 so it can't be reused as a
/// temporary.
pub fn compile_unify(
    lhs: &Term,
    rhs: &Term,
    ctx: &mut ClauseCtx<'_>,
    unsafe_perm: &HashSet<VarId>,
    nil: NameId,
) -> Result<Vec<Instr>, CompileError> {
    let mut goal = GoalCtx::new(1);
    let mut out = Vec::new();
    build_term(rhs.clone(), RegId::new(0), ctx, &mut goal, unsafe_perm, nil, &mut out)?;
    let mut queue: VecDeque<(RegId, Term)> = VecDeque::new();
    emit_head_token(RegId::new(0), lhs.clone(), ctx, &mut goal, &mut out, &mut queue, nil)?;
    while let Some((reg, term)) = queue.pop_front() {
        emit_head_token(reg, term, ctx, &mut goal, &mut out, &mut queue, nil)?;
    }
    Ok(out)
}
