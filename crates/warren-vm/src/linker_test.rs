// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;
use warren_codec::{Control, Cut};
use warren_core::NameId;

fn functor(n: u32, arity: u8) -> FunctorId {
    warren_core::FunctorName::new(NameId::new(n), arity).pack().unwrap()
}

fn fact() -> CompiledClause {
    CompiledClause::new(vec![Instr::Control(Control::Proceed)])
}

#[test]
fn single_clause_predicate_needs_no_patching() {
    let mut linker = Linker::new();
    let predicate = warren_compiler::assemble_predicate(vec![fact()]);
    linker.link_predicate(functor(1, 0), predicate);
    let entry = linker.lookup(functor(1, 0)).unwrap();
    assert_eq!(entry, Label::new(0));
}

#[test]
fn multi_clause_predicate_patches_retry_chain() {
    let mut linker = Linker::new();
    let predicate = warren_compiler::assemble_predicate(vec![fact(), fact(), fact()]);
    linker.link_predicate(functor(2, 0), predicate);
    let entry = linker.lookup(functor(2, 0)).unwrap();
    let (first, next) = linker.code().decode_at(entry.as_u32()).unwrap();
    let Instr::Choice(Choice::TryMeElse { retry }) = first else { panic!("expected try_me_else") };
    assert_ne!(retry, UNRESOLVED);
    let (second, next) = linker.code().decode_at(next).unwrap();
    let Instr::Choice(Choice::RetryMeElse { retry }) = second else { panic!("expected retry_me_else") };
    assert_ne!(retry, UNRESOLVED);
    let (third, _) = linker.code().decode_at(next).unwrap();
    assert!(matches!(third, Instr::Choice(Choice::TrustMe)));
}

#[test]
fn later_predicates_append_after_earlier_ones() {
    let mut linker = Linker::new();
    linker.link_predicate(functor(1, 0), warren_compiler::assemble_predicate(vec![fact()]));
    let first_entry = linker.lookup(functor(1, 0)).unwrap();
    linker.link_predicate(functor(2, 0), warren_compiler::assemble_predicate(vec![fact()]));
    let second_entry = linker.lookup(functor(2, 0)).unwrap();
    assert!(second_entry.as_u32() > first_entry.as_u32());
}

#[test]
fn unknown_functor_has_no_entry_point() {
    let linker = Linker::new();
    assert!(linker.lookup(functor(9, 0)).is_none());
}

#[test]
fn cut_barrier_clauses_still_link_cleanly() {
    let mut linker = Linker::new();
    let clause = CompiledClause::new(vec![
        Instr::Cut(Cut::GetLevelLoc(warren_codec::LocId::new(0))),
        Instr::Control(Control::Proceed),
    ]);
    linker.link_predicate(functor(3, 0), warren_compiler::assemble_predicate(vec![clause]));
    assert!(linker.lookup(functor(3, 0)).is_some());
}
