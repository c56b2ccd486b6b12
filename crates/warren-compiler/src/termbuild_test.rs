// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;
use warren_core::FunctorName;

const NIL: NameId = NameId::new(999);

fn var(n: u32) -> Term {
    Term::Var(VarId::new(n))
}

fn atom(n: u32) -> Term {
    Term::Atom(NameId::new(n))
}

fn structure(name: u32, args: Vec<Term>) -> Term {
    Term::Struct(FunctorName::new(NameId::new(name), args.len() as u8), args)
}

#[test]
fn head_with_bare_variable_arguments() {
    let slots = HashMap::new();
    let mut ctx = ClauseCtx::new(&slots);
    let args = vec![var(0), var(1)];
    let instrs = compile_head(&args, &mut ctx, NIL).unwrap();
    assert_eq!(instrs.len(), 2);
    assert!(matches!(instrs[0], Instr::Get { op: Get::VariableTemp(_), arg } if arg == RegId::new(0)));
    assert!(matches!(instrs[1], Instr::Get { op: Get::VariableTemp(_), arg } if arg == RegId::new(1)));
}

#[test]
fn head_repeated_variable_unifies_against_first() {
    let slots = HashMap::new();
    let mut ctx = ClauseCtx::new(&slots);
    let args = vec![var(0), var(0)];
    let instrs = compile_head(&args, &mut ctx, NIL).unwrap();
    assert!(matches!(instrs[0], Instr::Get { op: Get::VariableTemp(_), .. }));
    assert!(matches!(instrs[1], Instr::Get { op: Get::ValueTemp(_), .. }));
}

#[test]
fn head_structure_emits_get_structure_then_children() {
    let slots = HashMap::new();
    let mut ctx = ClauseCtx::new(&slots);
    let args = vec![structure(1, vec![var(0), atom(2)])];
    let instrs = compile_head(&args, &mut ctx, NIL).unwrap();
    assert!(matches!(instrs[0], Instr::Get { op: Get::Structure(_), arg } if arg == RegId::new(0)));
    assert!(matches!(instrs[1], Instr::Unify(Unify::VariableTemp(_))));
    assert!(matches!(instrs[2], Instr::Unify(Unify::Constant(_))));
}

#[test]
fn head_permanent_variable_uses_loc() {
    let mut slots = HashMap::new();
    slots.insert(VarId::new(0), LocId::new(0));
    let mut ctx = ClauseCtx::new(&slots);
    let args = vec![var(0)];
    let instrs = compile_head(&args, &mut ctx, NIL).unwrap();
    assert!(matches!(instrs[0], Instr::Get { op: Get::VariableLoc(l), .. } if l == LocId::new(0)));
}

#[test]
fn call_args_build_compound_children_before_parent() {
    let slots = HashMap::new();
    let mut ctx = ClauseCtx::new(&slots);
    let unsafe_perm = HashSet::new();
    let args = vec![structure(1, vec![atom(2)])];
    let instrs = compile_call_args(&args, &mut ctx, &unsafe_perm, NIL).unwrap();
    // child built first: put_structure for the nested 1-arity functor, then its
    // constant argument, THEN the outer put_structure referencing it by value.
    assert!(matches!(instrs[0], Instr::Put { op: Put::Structure(_), .. }));
    assert!(matches!(instrs[1], Instr::Unify(Unify::Constant(_))));
    assert!(matches!(instrs[2], Instr::Put { op: Put::Structure(_), .. }));
    assert!(matches!(instrs[3], Instr::Unify(Unify::ValueTemp(_))));
}

#[test]
fn unsafe_value_used_for_last_occurrence_permanent_var() {
    let mut slots = HashMap::new();
    slots.insert(VarId::new(0), LocId::new(0));
    let mut ctx = ClauseCtx::new(&slots);
    ctx.first_occurrence(VarId::new(0)); // pretend already bound earlier
    let mut unsafe_perm = HashSet::new();
    unsafe_perm.insert(VarId::new(0));
    let args = vec![var(0)];
    let instrs = compile_call_args(&args, &mut ctx, &unsafe_perm, NIL).unwrap();
    assert!(matches!(instrs[0], Instr::Put { op: Put::UnsafeValueLoc(_), .. }));
}

#[test]
fn empty_list_argument_compiles_to_nil_constant() {
    let slots = HashMap::new();
    let mut ctx = ClauseCtx::new(&slots);
    let args = vec![Term::List(vec![], None)];
    let instrs = compile_head(&args, &mut ctx, NIL).unwrap();
    assert!(matches!(instrs[0], Instr::Get { op: Get::Constant(n), .. } if n == NIL));
}

#[test]
fn non_empty_list_compiles_to_get_list_with_two_children() {
    let slots = HashMap::new();
    let mut ctx = ClauseCtx::new(&slots);
    let args = vec![Term::List(vec![atom(1)], None)];
    let instrs = compile_head(&args, &mut ctx, NIL).unwrap();
    assert!(matches!(instrs[0], Instr::Get { op: Get::List, .. }));
    assert!(matches!(instrs[1], Instr::Unify(Unify::Constant(_))));
    // cdr is the (empty) tail, queued for its own turn as a nil constant.
    assert!(instrs.iter().any(|i| matches!(i, Instr::Get { op: Get::Constant(n), .. } if *n == NIL)));
}
