// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Property-based checks for the seven invariants a Warren machine must
//! hold.
//!
//! Three of the seven (code roundtrip, compilation idempotence, and
//! unification soundness) are observable straight through the public
//! surface this workspace exposes and are tested here exactly as stated.
//! The remaining four name heap/trail/stack internals (`deref`
//! idempotence, the exact pointers a popped choice point restores,
//! environment-frame sizing, which choice points a cut discards) that
//! `warren-vm` deliberately keeps private — `Resolver` is a black box by
//! design. Those are verified directly against the internal state in
//! `warren-vm`'s own unit tests (`backtracking_restores_heap_and_bindings`,
//! `neck_cut_prunes_remaining_alternatives`); here they are restated as
//! the externally observable behaviour that would break first if the
//! internal guarantee ever slipped: repeated resolution staying
//! deterministic, cut leaving exactly one solution no matter how many
//! alternatives followed it, and a long call chain still resolving
//! correctly regardless of its length.

use proptest::prelude::*;
use warren_codec::{decode_one, encode_one, Choice, Control, Cut, Get, Instr, Label, Put, Unify};
use warren_compiler::{Builtins, Compiler};
use warren_core::{Clause, FunctorName, NameId};
use warren_test::{render_term, standard_builtins, TestEngine};

fn reg(n: u8) -> warren_codec::RegId {
    warren_codec::RegId::new(n)
}

fn loc(n: u8) -> warren_codec::LocId {
    warren_codec::LocId::new(n)
}

fn packed_functor(name: u32, arity: u8) -> warren_core::FunctorId {
    FunctorName::new(NameId::new(name), arity).pack().expect("small ids always pack")
}

/// One representative instruction from each of the six opcode groups,
/// with small but varied operands.
fn arbitrary_instr() -> impl Strategy<Value = Instr> {
    prop_oneof![
        (0u8..8, 0u32..50).prop_map(|(r, n)| Instr::Get { op: Get::Constant(NameId::new(n)), arg: reg(r) }),
        (0u8..8, 0u8..4).prop_map(|(r, a)| Instr::Get { op: Get::VariableLoc(loc(a)), arg: reg(r) }),
        (0u8..8, 0u32..50, 0u8..4).prop_map(|(r, n, a)| Instr::Put { op: Put::Structure(packed_functor(n, a)), arg: reg(r) }),
        (0u8..8).prop_map(|r| Instr::Put { op: Put::VariableTemp(reg(r)), arg: reg(r) }),
        (0u8..4).prop_map(|c| Instr::Unify(Unify::Void { count: c })),
        (0u32..50).prop_map(|n| Instr::Unify(Unify::Constant(NameId::new(n)))),
        (0u32..50, 0u8..4, 0u8..8).prop_map(|(n, a, v)| Instr::Control(Control::Call { callee: packed_functor(n, a), nvars: v })),
        (0u16..200).prop_map(|n| Instr::Control(Control::Allocate { nvars: n })),
        Just(Instr::Control(Control::Proceed)),
        (0u32..1000).prop_map(|l| Instr::Choice(Choice::TryMeElse { retry: Label::new(l) })),
        Just(Instr::Choice(Choice::TrustMe)),
        (0u8..4).prop_map(|l| Instr::Cut(Cut::GetLevelLoc(loc(l)))),
        Just(Instr::Cut(Cut::NeckCut)),
    ]
}

proptest! {
    /// Property 6: `decode(encode(i)) == i` for every structured
    /// instruction, and the byte length `encode` actually wrote matches
    /// what `Instr::byte_len` predicts without encoding.
    #[test]
    fn code_roundtrips_through_its_byte_encoding(instr in arbitrary_instr()) {
        let bytes = encode_one(&instr);
        prop_assert_eq!(bytes.len(), instr.byte_len());
        let (decoded, consumed) = decode_one(&bytes, 0).expect("freshly encoded bytes always decode");
        prop_assert_eq!(decoded, instr);
        prop_assert_eq!(consumed, bytes.len());
    }
}

fn builtins() -> Builtins {
    let mut interner = warren_core::TableInterner::new();
    standard_builtins(&mut interner)
}

proptest! {
    /// Property 7: compiling the same clause twice, independently,
    /// produces byte-for-byte identical instruction sequences.
    #[test]
    fn compiling_the_same_clause_twice_is_deterministic(arity in 1u8..4, name in 0u32..20) {
        let head = warren_core::Term::Struct(
            FunctorName::new(NameId::new(name), arity),
            (0..arity).map(|i| warren_core::Term::Var(warren_core::VarId::new(u32::from(i)))).collect(),
        );
        let clause = Clause::new(head, Vec::new(), u32::from(arity));
        let compiler = Compiler::new(builtins());

        let first = compiler.compile_predicate(std::slice::from_ref(&clause)).expect("a ground-arity fact always compiles");
        let second = compiler.compile_predicate(std::slice::from_ref(&clause)).expect("a ground-arity fact always compiles");
        prop_assert_eq!(first, second);
    }
}

/// A handful of distinct atom names to build ground terms from; kept
/// small so equal/unequal draws are both common.
fn atom_name() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("alpha"), Just("beta"), Just("gamma")]
}

proptest! {
    /// Property 2: unification succeeds iff both sides decode to equal
    /// terms. With two ground atoms this reduces to `a = b` succeeding
    /// exactly when the two names are the same string.
    #[test]
    fn ground_atoms_unify_iff_they_are_the_same_atom(left in atom_name(), right in atom_name()) {
        let mut engine = TestEngine::new();
        let a = engine.atom(left);
        let b = engine.atom(right);
        let goal = engine.unify_goal(a, b);
        engine.query(vec![goal]).unwrap();
        let succeeded = engine.next_solution().unwrap().is_some();
        prop_assert_eq!(succeeded, left == right);
    }
}

proptest! {
    /// Cut discards precisely: regardless of how many further
    /// alternatives a predicate offers after the one that is cut to, a
    /// clause ending in `!` leaves exactly one solution.
    #[test]
    fn cut_leaves_one_solution_no_matter_how_many_alternatives_follow(extra_alternatives in 0u32..8) {
        let mut engine = TestEngine::new();
        let x = engine.var("X");
        let p_head = engine.struct_("p", vec![x]);
        let x = engine.var("X");
        let q_call = engine.struct_("q", vec![x]);
        let cut = engine.cut();
        let p_clause = engine.clause(p_head, vec![q_call, cut]);
        engine.load(vec![p_clause]).unwrap();

        let mut q_facts = Vec::new();
        for n in 0..=extra_alternatives {
            let atom = engine.atom(&n.to_string());
            let head = engine.struct_("q", vec![atom]);
            q_facts.push(engine.fact(head));
        }
        engine.load(q_facts).unwrap();

        let x = engine.var("X");
        let query = engine.struct_("p", vec![x]);
        engine.query(vec![query]).unwrap();
        let x_id = engine.var_id("X");

        let solution = engine.next_solution().unwrap().expect("q/1's first alternative always matches");
        prop_assert_eq!(render_term(&solution.bindings[&x_id], &engine.interner), "0");
        prop_assert_eq!(engine.next_solution().unwrap(), None);
    }
}

proptest! {
    /// Environment trimming keeps long call chains correct: a clause
    /// whose body is a chain of N calls, each permanent variable live
    /// across the whole chain, still resolves to the right binding
    /// regardless of N.
    #[test]
    fn a_long_conjunction_chain_still_resolves_correctly(chain_len in 1u32..12) {
        let mut engine = TestEngine::new();
        let x = engine.var("X");
        let p_head = engine.struct_("p", vec![x]);
        let mut body = Vec::new();
        for i in 0..chain_len {
            let x = engine.var("X");
            let call = engine.struct_(&format!("step{i}"), vec![x]);
            body.push(call);
        }
        let p_clause = engine.clause(p_head, body);
        engine.load(vec![p_clause]).unwrap();

        for i in 0..chain_len {
            let a = engine.atom("a");
            let head = engine.struct_(&format!("step{i}"), vec![a]);
            let fact = engine.fact(head);
            engine.load(vec![fact]).unwrap();
        }

        let x = engine.var("X");
        let query = engine.struct_("p", vec![x]);
        engine.query(vec![query]).unwrap();
        let x_id = engine.var_id("X");

        let solution = engine.next_solution().unwrap().expect("every step in the chain holds for X = a");
        prop_assert_eq!(render_term(&solution.bindings[&x_id], &engine.interner), "a");
    }
}

proptest! {
    /// `deref` idempotence, restated in black-box terms: resetting and
    /// re-running the same query against the same loaded program is
    /// deterministic — resolution never leaves stray bindings behind
    /// that would perturb a later run, which is exactly what a
    /// non-idempotent dereference chain would produce.
    #[test]
    fn reset_and_rerun_of_the_same_query_is_deterministic(repeats in 1u32..5) {
        let mut engine = TestEngine::new();
        let a = engine.atom("a");
        let head = engine.struct_("p", vec![a]);
        let fact = engine.fact(head);
        engine.load(vec![fact]).unwrap();

        let mut renders = Vec::new();
        for _ in 0..repeats {
            let x = engine.var("X");
            let query = engine.struct_("p", vec![x]);
            engine.query(vec![query]).unwrap();
            let x_id = engine.var_id("X");
            let solution = engine.next_solution().unwrap().expect("p(a) always unifies with p(X)");
            renders.push(render_term(&solution.bindings[&x_id], &engine.interner));
            engine.reset();
        }
        prop_assert!(renders.iter().all(|r| r == "a"));
    }
}
