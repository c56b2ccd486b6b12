// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;
use warren_core::{FunctorName, Term};

fn builtins() -> Builtins {
    Builtins {
        conjunction: FunctorName::new(NameId::new(200), 2),
        disjunction: FunctorName::new(NameId::new(201), 2),
        cut: FunctorName::new(NameId::new(202), 0),
        call1: FunctorName::new(NameId::new(203), 1),
        unify: FunctorName::new(NameId::new(204), 2),
        not_unify: FunctorName::new(NameId::new(205), 2),
        nil: NameId::new(206),
    }
}

fn test_config() -> MachineConfig {
    MachineConfig { heap_size: 4096, stack_size: 256, trail_size: 256, num_registers: 16 }
}

fn atom(n: u32) -> Term {
    Term::Atom(NameId::new(n))
}

fn var(n: u32) -> Term {
    Term::Var(VarId::new(n))
}

fn structure(n: u32, args: Vec<Term>) -> Term {
    Term::Struct(FunctorName::new(NameId::new(n), args.len() as u8), args)
}

/// `likes(mary, wine).` `?- likes(mary, What).` — a single fact, read back
/// through a full compile-link-solve-decode round trip.
#[test]
fn fact_resolves_and_decodes_its_binding() {
    let mut resolver = Resolver::new(test_config(), builtins());
    let mary = 10;
    let wine = 11;
    resolver.add_predicate(&[Clause::new(structure(1, vec![atom(mary), atom(wine)]), vec![], 0)]).unwrap();

    resolver.set_query(&[structure(1, vec![atom(mary), var(0)])]).unwrap();
    let solution = resolver.resolve().unwrap().expect("the fact should match");
    assert_eq!(solution.bindings[&VarId::new(0)], atom(wine));
    assert_eq!(resolver.resolve().unwrap(), None);
}

/// `color(red). color(blue).` `?- color(X).` yields both colors in clause
/// order, then exhausts.
#[test]
fn disjunction_yields_every_solution_in_order() {
    let mut resolver = Resolver::new(test_config(), builtins());
    let red = 20;
    let blue = 21;
    resolver
        .add_predicate(&[
            Clause::new(structure(2, vec![atom(red)]), vec![], 0),
            Clause::new(structure(2, vec![atom(blue)]), vec![], 0),
        ])
        .unwrap();

    resolver.set_query(&[structure(2, vec![var(0)])]).unwrap();
    let first = resolver.resolve().unwrap().unwrap();
    assert_eq!(first.bindings[&VarId::new(0)], atom(red));
    let second = resolver.resolve().unwrap().unwrap();
    assert_eq!(second.bindings[&VarId::new(0)], atom(blue));
    assert_eq!(resolver.resolve().unwrap(), None);
}

/// `parent(tom, bob). parent(bob, ann). grandparent(X, Z) :- parent(X, Y),
/// parent(Y, Z).` — a two-goal conjunction chaining across two calls, each
/// goal binding a different permanent variable the next goal depends on.
#[test]
fn conjunction_chains_bindings_across_calls() {
    let mut resolver = Resolver::new(test_config(), builtins());
    let (tom, bob, ann) = (30, 31, 32);
    resolver
        .add_predicate(&[Clause::new(structure(3, vec![atom(tom), atom(bob)]), vec![], 0)])
        .unwrap();
    resolver
        .add_predicate(&[Clause::new(structure(3, vec![atom(bob), atom(ann)]), vec![], 0)])
        .unwrap();
    // grandparent(X, Z) :- parent(X, Y), parent(Y, Z).
    resolver
        .add_predicate(&[Clause::new(
            structure(4, vec![var(0), var(2)]),
            vec![structure(3, vec![var(0), var(1)]), structure(3, vec![var(1), var(2)])],
            3,
        )])
        .unwrap();

    resolver.set_query(&[structure(4, vec![atom(tom), var(9)])]).unwrap();
    let solution = resolver.resolve().unwrap().expect("tom is bob's parent, bob is ann's parent");
    assert_eq!(solution.bindings[&VarId::new(9)], atom(ann));
}

/// `?- X = f(a, b).` — `=/2` binds a fresh query variable to a freshly
/// built structure, decoded back as a nested `Term`.
#[test]
fn unify_builtin_binds_a_query_variable_to_a_structure() {
    let mut resolver = Resolver::new(test_config(), builtins());
    let b = builtins();
    let (a, bb) = (40, 41);
    resolver
        .set_query(&[Term::Struct(b.unify, vec![var(0), structure(5, vec![atom(a), atom(bb)])])])
        .unwrap();
    let solution = resolver.resolve().unwrap().unwrap();
    assert_eq!(solution.bindings[&VarId::new(0)], structure(5, vec![atom(a), atom(bb)]));
}

/// Resetting clears runtime state but not the call table: the same query
/// can be solved again from scratch.
#[test]
fn reset_allows_resolving_the_same_query_again() {
    let mut resolver = Resolver::new(test_config(), builtins());
    let n = 50;
    resolver.add_predicate(&[Clause::new(structure(6, vec![atom(n)]), vec![], 0)]).unwrap();
    resolver.set_query(&[structure(6, vec![var(0)])]).unwrap();
    assert!(resolver.resolve().unwrap().is_some());

    resolver.reset();
    resolver.set_query(&[structure(6, vec![var(0)])]).unwrap();
    let solution = resolver.resolve().unwrap().expect("predicates survive reset");
    assert_eq!(solution.bindings[&VarId::new(0)], atom(n));
}
