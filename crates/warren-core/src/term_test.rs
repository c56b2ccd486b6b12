// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for the ingress term AST.

use super::*;

fn atom(id: u32) -> Term {
    Term::Atom(NameId::new(id))
}

#[test]
fn atom_functor_has_arity_zero() {
    let functor = atom(1).functor().unwrap();
    assert_eq!(functor.arity, 0);
}

#[test]
fn struct_functor_reports_arity() {
    let functor = FunctorName::new(NameId::new(5), 2);
    let term = Term::Struct(functor, vec![atom(1), atom(2)]);
    assert_eq!(term.functor(), Some(functor));
}

#[test]
fn var_and_list_have_no_functor() {
    assert_eq!(Term::Var(VarId::new(0)).functor(), None);
    assert_eq!(Term::List(vec![atom(1)], None).functor(), None);
}

#[test]
fn only_atoms_and_structs_are_callable() {
    assert!(atom(1).is_callable());
    assert!(Term::Struct(FunctorName::new(NameId::new(1), 1), vec![atom(2)]).is_callable());
    assert!(!Term::Var(VarId::new(0)).is_callable());
    assert!(!Term::List(vec![], None).is_callable());
}

#[test]
fn fact_has_empty_body() {
    let clause = Clause::new(atom(1), vec![], 0);
    assert!(clause.is_fact());
}

#[test]
#[should_panic(expected = "clause head must be an atom or structure")]
fn clause_rejects_variable_head() {
    let _ = Clause::new(Term::Var(VarId::new(0)), vec![], 1);
}

#[test]
fn query_sentence_has_no_head() {
    let sentence = Sentence::query(vec![atom(1)], 0);
    assert!(sentence.is_query());
    assert!(sentence.into_clause().is_none());
}

#[test]
fn clause_sentence_converts_to_clause() {
    let sentence = Sentence::clause(atom(1), vec![atom(2)], 1);
    assert!(!sentence.is_query());
    let clause = sentence.into_clause().unwrap();
    assert_eq!(clause.head, atom(1));
    assert_eq!(clause.body, vec![atom(2)]);
}
