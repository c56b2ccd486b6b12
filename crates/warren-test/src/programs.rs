// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Small, reusable programs exercising one corner of the machine each:
//! a ground fact, structural matching, conjunction chaining across two
//! predicates, disjunction, cut, meta-call, and list append. Each loader
//! installs its predicates on an already-built [`TestEngine`] and leaves
//! issuing the query itself to the caller, so the same program can be
//! driven by more than one test.

#[cfg(test)]
mod programs_test;

use crate::engine::TestEngine;

/// `p(a).`
pub fn load_atomic_fact(engine: &mut TestEngine) {
    let a = engine.atom("a");
    let head = engine.struct_("p", vec![a]);
    let fact = engine.fact(head);
    engine.load(vec![fact]).expect("a single ground fact always compiles");
}

/// `p(f(a, Y)).`
pub fn load_structural_fact(engine: &mut TestEngine) {
    let a = engine.atom("a");
    let y = engine.var("Y");
    let f = engine.struct_("f", vec![a, y]);
    let head = engine.struct_("p", vec![f]);
    let fact = engine.fact(head);
    engine.load(vec![fact]).expect("a fact with one free argument always compiles");
}

/// `p(X) :- q(X), r(X). q(1). q(2). r(2).`
pub fn load_conjunction_across_calls(engine: &mut TestEngine) {
    let x = engine.var("X");
    let p_head = engine.struct_("p", vec![x]);
    let x = engine.var("X");
    let q_call = engine.struct_("q", vec![x]);
    let x = engine.var("X");
    let r_call = engine.struct_("r", vec![x]);
    let p_clause = engine.clause(p_head, vec![q_call, r_call]);
    engine.load(vec![p_clause]).expect("p/1's single clause always compiles");

    let one = engine.atom("1");
    let q1_head = engine.struct_("q", vec![one]);
    let q1 = engine.fact(q1_head);
    let two = engine.atom("2");
    let q2_head = engine.struct_("q", vec![two]);
    let q2 = engine.fact(q2_head);
    engine.load(vec![q1, q2]).expect("q/1's two facts always compile");

    let two = engine.atom("2");
    let r_head = engine.struct_("r", vec![two]);
    let r1 = engine.fact(r_head);
    engine.load(vec![r1]).expect("r/1's single fact always compiles");
}

/// `p(X) :- (X = a ; X = b).`
pub fn load_disjunction(engine: &mut TestEngine) {
    let x = engine.var("X");
    let p_head = engine.struct_("p", vec![x]);

    let x_left = engine.var("X");
    let a = engine.atom("a");
    let left = engine.unify_goal(x_left, a);

    let x_right = engine.var("X");
    let b = engine.atom("b");
    let right = engine.unify_goal(x_right, b);

    let disjunction = engine.disjunction_goal(left, right);
    let p_clause = engine.clause(p_head, vec![disjunction]);
    engine.load(vec![p_clause]).expect("p/1's single clause always compiles");
}

/// `p(X) :- q(X), !. p(_) :- «always fails». q(1). q(2).`
///
/// The source scenario's second clause body is a bare `fail/0`; this
/// machine has no such built-in, so the clause instead carries a goal
/// guaranteed to fail by construction (see [`TestEngine::never`]) —
/// equivalent for the purpose this clause serves, which is only ever to
/// be reached and then discarded.
pub fn load_cut_prunes_second_alternative(engine: &mut TestEngine) {
    let x = engine.var("X");
    let p1_head = engine.struct_("p", vec![x]);
    let x = engine.var("X");
    let q_call = engine.struct_("q", vec![x]);
    let cut = engine.cut();
    let p1 = engine.clause(p1_head, vec![q_call, cut]);

    let anon = engine.var("Ignored");
    let p2_head = engine.struct_("p", vec![anon]);
    let always_fails = engine.never();
    let p2 = engine.clause(p2_head, vec![always_fails]);
    engine.load(vec![p1, p2]).expect("p/1's two clauses always compile");

    let one = engine.atom("1");
    let q1_head = engine.struct_("q", vec![one]);
    let q1 = engine.fact(q1_head);
    let two = engine.atom("2");
    let q2_head = engine.struct_("q", vec![two]);
    let q2 = engine.fact(q2_head);
    engine.load(vec![q1, q2]).expect("q/1's two facts always compile");
}

/// `q(7).` — the target of a `call/1` meta-call built separately by the
/// caller via [`TestEngine::call_goal`].
pub fn load_meta_call_target(engine: &mut TestEngine) {
    let seven = engine.atom("7");
    let head = engine.struct_("q", vec![seven]);
    let fact = engine.fact(head);
    engine.load(vec![fact]).expect("a single ground fact always compiles");
}

/// `append([], L, L). append([H|T], L, [H|R]) :- append(T, L, R).`
pub fn load_append(engine: &mut TestEngine) {
    let nil = TestEngine::list(Vec::new(), None);
    let l = engine.var("L");
    let l2 = engine.var("L");
    let base_head = engine.struct_("append", vec![nil, l, l2]);
    let base = engine.fact(base_head);

    let h = engine.var("H");
    let t = engine.var("T");
    let cons_in = TestEngine::list(vec![h], Some(t));
    let l = engine.var("L");
    let h = engine.var("H");
    let r = engine.var("R");
    let cons_out = TestEngine::list(vec![h], Some(r));
    let step_head = engine.struct_("append", vec![cons_in, l, cons_out]);

    let t = engine.var("T");
    let l = engine.var("L");
    let r = engine.var("R");
    let recur_call = engine.struct_("append", vec![t, l, r]);
    let step = engine.clause(step_head, vec![recur_call]);

    engine.load(vec![base, step]).expect("append/3's two clauses always compile");
}
