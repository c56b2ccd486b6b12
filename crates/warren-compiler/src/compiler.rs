// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Top-level clause and query compilation.

#[cfg(test)]
mod compiler_test;

use std::collections::{HashMap, HashSet};

use tracing::debug;
use warren_codec::{Choice, Control, Cut, Instr, Label, LocId, Put, RegId};
use warren_core::{Clause, Term, VarId};

use crate::builtins::Builtins;
use crate::clause::CompiledClause;
use crate::disjunction::{flatten_conjunction, flatten_disjunction};
use crate::error::CompileError;
use crate::observer::{CompilerObserver, NoopObserver};
use crate::predicate::{assemble_predicate, CompiledPredicate};
use crate::query::CompiledQuery;
use crate::termbuild::{compile_call_args, compile_head, compile_unify, ClauseCtx};
use crate::vars::{self, classify_clause, classify_query, last_occurrence};

/// Compiles Horn clauses and queries to Warren machine byte code.
pub struct Compiler {
    builtins: Builtins,
}

/// Compiler-reserved permanent slots layered on top of a clause's
/// user-level environment: a cut barrier, if some cut in the body isn't
/// guaranteed to be the first thing the clause runs, and a negation
/// scratch slot, if the body contains any `\=/2` goal. Both live at the
/// lowest slot numbers so trimming never truncates them away early.
#[derive(Debug, Clone, Copy)]
struct InternalSlots {
    barrier: Option<LocId>,
    last_cut_index: Option<usize>,
    neg_scratch: Option<LocId>,
    last_neg_index: Option<usize>,
}

/// Per-goal compilation parameters, bundled to keep `compile_goal` and its
/// helpers from growing an unbounded argument list as goals nest inside
/// disjunction branches.
#[derive(Debug, Clone, Copy)]
struct GoalSite<'s> {
    /// Index of the enclosing top-level body goal (shared by every
    /// sub-goal of a branch it contains; used only for error positions
    /// and, at the top level, for precise trimming).
    index: usize,
    /// Whether this goal is the clause's final goal along this control
    /// path — true for an ordinary top-level tail goal, or for a
    /// branch's own last goal when the enclosing disjunction is itself
    /// the clause's tail.
    is_last: bool,
    needs_env: bool,
    /// Whether `nvars_after` may use the precise per-goal live count.
    /// Disabled inside a disjunction branch: goal-index granularity
    /// can't tell which permanent variables a *specific branch* still
    /// needs, so branches conservatively report nothing as dead.
    trim: bool,
    internal: &'s InternalSlots,
    barrier_alive: bool,
    neg_alive: bool,
    /// Byte offset of this goal's first instruction relative to the
    /// clause's own start, for computing intra-clause jump targets.
    base_offset: u32,
    /// Whether no call has executed since clause entry along this
    /// control path — the precondition for compiling a cut as a cheap
    /// `neck_cut` instead of reading the reserved barrier slot.
    first_executable: bool,
}

impl Compiler {
    /// Build a compiler against a fixed set of built-in functor
    /// identities.
    #[must_use]
    pub const fn new(builtins: Builtins) -> Self {
        Self { builtins }
    }

    /// Compile every user source clause for one predicate into a single
    /// choice-point chain.
    ///
    /// # Errors
    /// Returns [`CompileError`] if any clause head or goal is malformed.
    pub fn compile_predicate(&self, clauses: &[Clause]) -> Result<CompiledPredicate, CompileError> {
        self.compile_predicate_with(clauses, &mut NoopObserver)
    }

    /// As [`Self::compile_predicate`], additionally notifying `observer`
    /// once per source clause.
    ///
    /// # Errors
    /// Returns [`CompileError`] if any clause head or goal is malformed.
    pub fn compile_predicate_with(
        &self,
        clauses: &[Clause],
        observer: &mut dyn CompilerObserver,
    ) -> Result<CompiledPredicate, CompileError> {
        let mut alternatives = Vec::new();
        for clause in clauses {
            let compiled = self.compile_clause(clause)?;
            observer.on_compilation(clause, &compiled);
            alternatives.extend(compiled);
        }
        Ok(assemble_predicate(alternatives))
    }

    /// Compile a single source clause into its `CompiledClause`. A body
    /// disjunction compiles inline as a local choice-point chain (see
    /// [`Self::compile_disjunction`]) rather than multiplying out into
    /// separate alternatives, so one source clause always yields exactly
    /// one compiled clause.
    ///
    /// # Errors
    /// Returns [`CompileError`] if the head or any goal is malformed.
    pub fn compile_clause(&self, clause: &Clause) -> Result<Vec<CompiledClause>, CompileError> {
        if !clause.head.is_callable() {
            return Err(CompileError::HeadNotCallable);
        }
        let args = head_args(&clause.head);
        debug!(goals = clause.body.len(), "compiling clause");
        let compiled = self.compile_clause_body(&clause.head, args, &clause.body)?;
        Ok(vec![compiled])
    }

    fn compile_clause_body(
        &self,
        head: &Term,
        head_args: &[Term],
        body: &[Term],
    ) -> Result<CompiledClause, CompileError> {
        let mut perm_slots = classify_clause(Some(head), body);
        let internal = reserve_internal_slots(body, &mut perm_slots, &self.builtins);
        let env_size = perm_slots.len() as u16
            + u16::from(internal.barrier.is_some())
            + u16::from(internal.neg_scratch.is_some());
        let needs_env = !body.is_empty()
            && (body.len() > 1
                || !perm_slots.is_empty()
                || internal.barrier.is_some()
                || internal.neg_scratch.is_some());

        let last_seen = last_occurrence(Some(head), body);
        let mut ctx = ClauseCtx::with_trimming(&perm_slots, last_seen.clone());
        let mut instrs = Vec::new();
        if needs_env {
            instrs.push(Instr::Control(Control::Allocate { nvars: env_size }));
        }
        if let Some(loc) = internal.barrier {
            instrs.push(Instr::Cut(Cut::GetLevelLoc(loc)));
        }
        instrs.extend(compile_head(head_args, &mut ctx, self.builtins.nil)?);

        let last_goal_index = body.len();
        let unsafe_vars: HashSet<VarId> = perm_slots
            .keys()
            .copied()
            .filter(|v| last_seen.get(v) == Some(&last_goal_index))
            .collect();
        let last_index = body.len().saturating_sub(1);
        for (i, goal) in body.iter().enumerate() {
            let is_last = i == last_index;
            let unsafe_here = if is_last { &unsafe_vars } else { &HashSet::new() };
            let base_offset = instrs.iter().map(Instr::byte_len).sum::<usize>() as u32;
            let site = GoalSite {
                index: i,
                is_last,
                needs_env,
                trim: true,
                internal: &internal,
                barrier_alive: internal.last_cut_index.is_some_and(|c| i < c),
                neg_alive: internal.last_neg_index.is_some_and(|c| i < c),
                base_offset,
                first_executable: i == 0,
            };
            instrs.extend(self.compile_goal(goal, &site, &mut ctx, unsafe_here)?);
        }
        if body.is_empty() {
            instrs.push(Instr::Control(Control::Proceed));
        }
        Ok(CompiledClause::new(instrs))
    }

    fn compile_goal(
        &self,
        goal: &Term,
        site: &GoalSite<'_>,
        ctx: &mut ClauseCtx<'_>,
        unsafe_vars: &HashSet<VarId>,
    ) -> Result<Vec<Instr>, CompileError> {
        let Term::Struct(functor, args) = goal else {
            let Term::Atom(_) = goal else {
                return Err(CompileError::GoalNotCallable { position: site.index });
            };
            if self.builtins.is_cut(functor_of_atom(goal)) {
                return Ok(vec![compile_cut(site.first_executable, site.internal.barrier)]);
            }
            return self.compile_ordinary_call(goal, site, ctx, unsafe_vars);
        };

        if self.builtins.is_cut(*functor) {
            return Ok(vec![compile_cut(site.first_executable, site.internal.barrier)]);
        }
        if *functor == self.builtins.call1 {
            if functor.arity != 1 {
                return Err(CompileError::BuiltinArityMismatch { name: "call", expected: 1, found: functor.arity });
            }
            let mut out = compile_call_args(&args[..1], ctx, unsafe_vars, self.builtins.nil)?;
            out.push(Instr::Control(Control::MetaCall { arg: RegId::new(0), nvars: nvars_after(ctx, site) }));
            return Ok(out);
        }
        if *functor == self.builtins.unify {
            if functor.arity != 2 {
                return Err(CompileError::BuiltinArityMismatch { name: "=", expected: 2, found: functor.arity });
            }
            return compile_unify(&args[0], &args[1], ctx, unsafe_vars, self.builtins.nil);
        }
        if self.builtins.is_not_unify(*functor) {
            if functor.arity != 2 {
                return Err(CompileError::BuiltinArityMismatch { name: "\\=", expected: 2, found: functor.arity });
            }
            return self.compile_not_unify(&args[0], &args[1], site, ctx, unsafe_vars);
        }
        if self.builtins.is_disjunction(*functor) {
            return self.compile_disjunction_goal(goal, site, ctx, unsafe_vars);
        }
        self.compile_ordinary_call(goal, site, ctx, unsafe_vars)
    }

    fn compile_ordinary_call(
        &self,
        goal: &Term,
        site: &GoalSite<'_>,
        ctx: &mut ClauseCtx<'_>,
        unsafe_vars: &HashSet<VarId>,
    ) -> Result<Vec<Instr>, CompileError> {
        let functor = goal.functor().expect("callable goal always has a functor");
        let args = match goal {
            Term::Struct(_, args) => args.as_slice(),
            Term::Atom(_) => &[],
            _ => unreachable!("non-callable goals are rejected before this point"),
        };
        let callee = functor.pack().ok_or(CompileError::FunctorIdOverflow)?;
        let mut out = compile_call_args(args, ctx, unsafe_vars, self.builtins.nil)?;
        if site.is_last && site.needs_env {
            out.push(Instr::Control(Control::Deallocate));
            out.push(Instr::Control(Control::Execute { callee }));
        } else if site.is_last {
            out.push(Instr::Control(Control::Execute { callee }));
        } else {
            out.push(Instr::Control(Control::Call { callee, nvars: nvars_after(ctx, site) }));
        }
        Ok(out)
    }

    /// Compile `lhs \= rhs` as a negation-as-failure idiom over
    /// [`compile_unify`]: push a local choice point, try the match, and
    /// cut-then-fail if it succeeds; failing to match instead falls
    /// through to the local `trust_me`, succeeding. Needs its own
    /// reserved scratch slot (distinct from any clause-level cut barrier)
    /// to record the choice-point depth the local cut targets.
    fn compile_not_unify(
        &self,
        lhs: &Term,
        rhs: &Term,
        site: &GoalSite<'_>,
        ctx: &mut ClauseCtx<'_>,
        unsafe_vars: &HashSet<VarId>,
    ) -> Result<Vec<Instr>, CompileError> {
        let scratch =
            site.internal.neg_scratch.expect("a \\=/2 goal always has a reserved negation-scratch slot");
        let match_instrs = compile_unify(lhs, rhs, ctx, unsafe_vars, self.builtins.nil)?;
        let get_level = Instr::Cut(Cut::GetLevelLoc(scratch));
        let cut = Instr::Cut(Cut::CutLoc(scratch));
        let fail = Instr::Control(Control::Fail);
        let before_trust: u32 = get_level.byte_len() as u32
            + 5 // try_me_else
            + match_instrs.iter().map(Instr::byte_len).sum::<usize>() as u32
            + cut.byte_len() as u32
            + fail.byte_len() as u32;
        let trust_target = site.base_offset + before_trust;
        let mut out = vec![get_level, Instr::Choice(Choice::TryMeElse { retry: Label::new(trust_target) })];
        out.extend(match_instrs);
        out.push(cut);
        out.push(fail);
        out.push(Instr::Choice(Choice::TrustMe));
        Ok(out)
    }

    /// Pre-bind any permanent variable whose first occurrence in the
    /// clause falls inside this disjunction, to a fresh heap variable,
    /// before the disjunction's own choice point is pushed. Branches
    /// share one [`ClauseCtx`], so without this, compiling branch A first
    /// would mark the variable seen before branch B compiles — wrongly
    /// treating it as already bound in a branch that never ran with A.
    /// Binding it ahead of the choice point instead means any branch's
    /// binding gets trailed and undone on backtracking into a sibling,
    /// giving every branch a genuinely fresh slate.
    fn compile_disjunction_goal(
        &self,
        goal: &Term,
        site: &GoalSite<'_>,
        ctx: &mut ClauseCtx<'_>,
        unsafe_vars: &HashSet<VarId>,
    ) -> Result<Vec<Instr>, CompileError> {
        let branches = flatten_disjunction(goal, &self.builtins);

        let mut vars_here = Vec::new();
        vars::collect_vars(goal, &mut vars_here);
        let mut fresh_perm: Vec<VarId> =
            vars_here.into_iter().filter(|v| ctx.is_permanent(*v) && !ctx.already_seen(*v)).collect();
        fresh_perm.sort_unstable();
        fresh_perm.dedup();

        let mut out = Vec::new();
        for v in fresh_perm {
            out.push(Instr::Put { op: Put::VariableLoc(ctx.perm_loc(v)), arg: RegId::new(0) });
            ctx.mark_seen(v);
        }
        let prelude_len = out.iter().map(Instr::byte_len).sum::<usize>() as u32;
        let branch_site = GoalSite { base_offset: site.base_offset + prelude_len, ..*site };
        out.extend(self.compile_disjunction(&branches, &branch_site, ctx, unsafe_vars)?);
        Ok(out)
    }

    /// Compile a disjunction's branches into a local choice-point chain:
    /// `try_me_else`/`retry_me_else`/`trust_me` guard each branch in
    /// turn, and every branch but the last ends in a `continue` jumping
    /// past the remaining alternatives. Branches share the enclosing
    /// environment and continuation — this never duplicates the clause's
    /// own head or the goals following the disjunction.
    fn compile_disjunction(
        &self,
        branches: &[Term],
        site: &GoalSite<'_>,
        ctx: &mut ClauseCtx<'_>,
        unsafe_vars: &HashSet<VarId>,
    ) -> Result<Vec<Instr>, CompileError> {
        let n = branches.len();
        let flattened: Vec<Vec<Term>> =
            branches.iter().map(|b| flatten_conjunction(b, &self.builtins)).collect();

        if n <= 1 {
            let goals = flattened.into_iter().next().unwrap_or_default();
            return self.compile_branch(&goals, site, ctx, unsafe_vars);
        }

        // Measure each branch's compiled length on a disposable clone of
        // the clause context: a variable's first occurrence inside a
        // branch must be decided exactly once, by the real compile pass
        // below, never twice.
        let mut branch_lens = Vec::with_capacity(n);
        for goals in &flattened {
            let mut probe = ctx.clone();
            let probe_site = GoalSite { base_offset: 0, ..*site };
            let instrs = self.compile_branch(goals, &probe_site, &mut probe, unsafe_vars)?;
            branch_lens.push(instrs.iter().map(Instr::byte_len).sum::<usize>() as u32);
        }

        let prefix_len = |i: usize| if i == n - 1 { 1u32 } else { 5u32 };
        const CONTINUE_LEN: u32 = 5;
        let mut starts = Vec::with_capacity(n);
        let mut running = 0u32;
        for i in 0..n {
            starts.push(running);
            running += prefix_len(i) + branch_lens[i];
            if i != n - 1 {
                running += CONTINUE_LEN;
            }
        }
        let end_offset = site.base_offset + running;

        let mut out = Vec::new();
        for (i, goals) in flattened.iter().enumerate() {
            let is_final = i == n - 1;
            let prefix = if i == 0 {
                Instr::Choice(Choice::TryMeElse { retry: Label::new(site.base_offset + starts[i + 1]) })
            } else if is_final {
                Instr::Choice(Choice::TrustMe)
            } else {
                Instr::Choice(Choice::RetryMeElse { retry: Label::new(site.base_offset + starts[i + 1]) })
            };
            out.push(prefix);
            let branch_base = site.base_offset + starts[i] + prefix_len(i);
            let branch_site = GoalSite { base_offset: branch_base, ..*site };
            out.extend(self.compile_branch(goals, &branch_site, ctx, unsafe_vars)?);
            if !is_final {
                out.push(Instr::Control(Control::Continue { target: Label::new(end_offset) }));
            }
        }
        Ok(out)
    }

    /// Compile one disjunction branch's goal sequence. Trimming is
    /// disabled (see [`GoalSite::trim`]); cut/negation slot liveness is
    /// reported unconditionally rather than by position, since a branch
    /// can't tell from goal-index alone when the slot truly dies.
    fn compile_branch(
        &self,
        goals: &[Term],
        site: &GoalSite<'_>,
        ctx: &mut ClauseCtx<'_>,
        unsafe_vars: &HashSet<VarId>,
    ) -> Result<Vec<Instr>, CompileError> {
        let mut out = Vec::new();
        let last_index = goals.len().saturating_sub(1);
        for (i, goal) in goals.iter().enumerate() {
            let is_last = site.is_last && i == last_index;
            let unsafe_here = if is_last { unsafe_vars } else { &HashSet::new() };
            let base_offset = site.base_offset + out.iter().map(Instr::byte_len).sum::<usize>() as u32;
            let goal_site = GoalSite {
                index: site.index,
                is_last,
                needs_env: site.needs_env,
                trim: false,
                internal: site.internal,
                barrier_alive: site.internal.barrier.is_some(),
                neg_alive: site.internal.neg_scratch.is_some(),
                base_offset,
                first_executable: site.first_executable && i == 0,
            };
            out.extend(self.compile_goal(goal, &goal_site, ctx, unsafe_here)?);
        }
        Ok(out)
    }

    /// Compile a query's goal sequence.
    ///
    /// # Errors
    /// Returns [`CompileError`] if any goal is malformed.
    pub fn compile_query(&self, body: &[Term]) -> Result<CompiledQuery, CompileError> {
        self.compile_query_with(body, &mut NoopObserver)
    }

    /// As [`Self::compile_query`], additionally notifying `observer`.
    ///
    /// # Errors
    /// Returns [`CompileError`] if any goal is malformed.
    pub fn compile_query_with(
        &self,
        body: &[Term],
        observer: &mut dyn CompilerObserver,
    ) -> Result<CompiledQuery, CompileError> {
        let var_slots = classify_query(body);
        let mut ctx = ClauseCtx::new(&var_slots);
        let no_internal = InternalSlots { barrier: None, last_cut_index: None, neg_scratch: None, last_neg_index: None };
        let mut instrs = vec![Instr::Control(Control::Allocate { nvars: var_slots.len() as u16 })];
        for (i, goal) in body.iter().enumerate() {
            // Queries never tail-deallocate: the caller inspects this
            // environment once the whole body has succeeded, so every
            // goal compiles as a non-last (environment-preserving) call.
            let base_offset = instrs.iter().map(Instr::byte_len).sum::<usize>() as u32;
            let site = GoalSite {
                index: i,
                is_last: false,
                needs_env: false,
                trim: true,
                internal: &no_internal,
                barrier_alive: false,
                neg_alive: false,
                base_offset,
                first_executable: i == 0,
            };
            instrs.extend(self.compile_goal(goal, &site, &mut ctx, &HashSet::new())?);
        }
        instrs.push(Instr::Control(Control::Proceed));
        let compiled = CompiledQuery { instrs, var_slots };
        observer.on_query_compilation(body, &compiled);
        Ok(compiled)
    }
}

fn head_args(head: &Term) -> &[Term] {
    match head {
        Term::Struct(_, args) => args.as_slice(),
        Term::Atom(_) => &[],
        _ => unreachable!("caller already verified the head is callable"),
    }
}

fn functor_of_atom(goal: &Term) -> warren_core::FunctorName {
    goal.functor().expect("atom always has a functor")
}

fn compile_cut(first_executable: bool, barrier: Option<LocId>) -> Instr {
    if first_executable {
        Instr::Cut(Cut::NeckCut)
    } else {
        let loc = barrier.expect("a cut not guaranteed to run first always has a reserved barrier slot");
        Instr::Cut(Cut::CutLoc(loc))
    }
}

/// `nvars` for a `Call`/`MetaCall` at this goal site: the permanent
/// variables still live afterward, plus the cut-barrier and
/// negation-scratch slots if reserved and not yet consumed — so the
/// runtime never trims away data a later instruction still needs. A
/// chain-rule clause (`!needs_env`) owns no environment of its own here;
/// it is still running inside whatever frame its caller allocated, so
/// `NO_TRIM` keeps that frame untouched instead of reporting a bogus
/// all-dead live count.
fn nvars_after(ctx: &ClauseCtx<'_>, site: &GoalSite<'_>) -> u8 {
    if !site.needs_env {
        return warren_codec::NO_TRIM;
    }
    let live = if site.trim { ctx.live_count_after(site.index + 1) } else { ctx.perm_count() };
    live + u8::from(site.barrier_alive) + u8::from(site.neg_alive)
}

/// Reserve a cut-barrier slot if `body` contains a cut that isn't
/// guaranteed to be the first thing the clause runs, and a
/// negation-scratch slot if `body` contains any `\=/2` goal, anywhere —
/// directly or nested inside a disjunction branch. Both slots are placed
/// below every user-level permanent variable (barrier at `Loc0`, scratch
/// just above it when both are needed), so trimming an environment down
/// to a live prefix can never truncate either away.
fn reserve_internal_slots(
    body: &[Term],
    perm_slots: &mut HashMap<VarId, LocId>,
    builtins: &Builtins,
) -> InternalSlots {
    let last_cut_index = body
        .iter()
        .enumerate()
        .filter(|(i, goal)| goal_needs_barrier(goal, *i == 0, builtins))
        .map(|(i, _)| i)
        .max();
    let last_neg_index = body
        .iter()
        .enumerate()
        .filter(|(_, goal)| goal_contains_not_unify(goal, builtins))
        .map(|(i, _)| i)
        .max();

    let shift = u8::from(last_cut_index.is_some()) + u8::from(last_neg_index.is_some());
    if shift > 0 {
        for loc in perm_slots.values_mut() {
            *loc = LocId::new(loc.as_u8() + shift);
        }
    }
    let barrier = last_cut_index.map(|_| LocId::new(0));
    let neg_scratch = last_neg_index.map(|_| LocId::new(u8::from(barrier.is_some())));
    InternalSlots { barrier, last_cut_index, neg_scratch, last_neg_index }
}

/// Whether `goal` contains a cut (directly, or nested inside a
/// disjunction branch) that is *not* guaranteed to be the first thing
/// executed since clause entry along its control path — the case a
/// `neck_cut` can't handle, since by the time it runs some other call may
/// already have overwritten the machine's live cut-parent depth.
fn goal_needs_barrier(goal: &Term, first_executable: bool, builtins: &Builtins) -> bool {
    if is_cut(goal, builtins) {
        return !first_executable;
    }
    if let Term::Struct(functor, _) = goal {
        if builtins.is_disjunction(*functor) {
            return flatten_disjunction(goal, builtins).iter().any(|branch| {
                flatten_conjunction(branch, builtins)
                    .iter()
                    .enumerate()
                    .any(|(i, g)| goal_needs_barrier(g, first_executable && i == 0, builtins))
            });
        }
    }
    false
}

/// Whether `goal` contains a `\=/2` goal, directly or nested inside a
/// disjunction or conjunction sub-structure.
fn goal_contains_not_unify(goal: &Term, builtins: &Builtins) -> bool {
    match goal {
        Term::Struct(functor, _) if builtins.is_not_unify(*functor) => true,
        Term::Struct(functor, args) if builtins.is_disjunction(*functor) || builtins.is_conjunction(*functor) => {
            args.iter().any(|a| goal_contains_not_unify(a, builtins))
        }
        _ => false,
    }
}

fn is_cut(goal: &Term, builtins: &Builtins) -> bool {
    goal.functor().is_some_and(|f| builtins.is_cut(f))
}
