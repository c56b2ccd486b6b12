// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The ingress term AST.
//!
//! This is the tree a front end (parser, REPL, embedding) hands the
//! compiler — plain structural data, with no notion of heap addresses,
//! registers or byte code yet. `Sentence` is what a front end actually
//! produces per top-level read: a program clause has a head, a query does
//! not.

#[cfg(test)]
mod term_test;

use crate::functor::{FunctorName, NameId, VarId};

/// A term as written by the front end, before compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// A logic variable, identified by its source name.
    Var(VarId),
    /// An atom: a functor of arity zero.
    Atom(NameId),
    /// A compound term: a named functor applied to one or more arguments.
    Struct(FunctorName, Vec<Term>),
    /// A list, written as an explicit spine of elements plus an optional
    /// tail (`None` means the list is proper, closed by `[]`).
    List(Vec<Term>, Option<Box<Term>>),
}

impl Term {
    /// The term's principal functor, if it has one.
    ///
    /// Variables have no functor. Atoms report their own name at arity
    /// zero. Lists report the conventional `'.'/2` functor without
    /// requiring the caller to know its interned name id ahead of time —
    /// callers that need the real functor should handle `List` directly.
    #[must_use]
    pub fn functor(&self) -> Option<FunctorName> {
        match self {
            Self::Var(_) | Self::List(..) => None,
            Self::Atom(name) => Some(FunctorName::new(*name, 0)),
            Self::Struct(functor, _) => Some(*functor),
        }
    }

    /// Whether this term can appear as a goal (a clause head or a body
    /// element): atoms and structures, not bare variables or lists.
    #[must_use]
    pub const fn is_callable(&self) -> bool {
        matches!(self, Self::Atom(_) | Self::Struct(..))
    }
}

/// A resolved program clause: a head plus a (possibly empty) body.
///
/// `var_count` is the number of distinct variables across head and body,
/// computed by the front end during parsing; the compiler uses it to size
/// the clause's environment frame before doing its own permanent-variable
/// analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    /// The clause head. Must be `Term::Atom` or `Term::Struct`.
    pub head: Term,
    /// The clause body, as a conjunction of goals. Empty means a fact.
    pub body: Vec<Term>,
    /// Distinct variable count across `head` and `body`.
    pub var_count: u32,
}

impl Clause {
    /// Build a clause, panicking if `head` is not callable.
    ///
    /// Front ends are expected to only ever construct callable heads; this
    /// is a construction-time assertion, not a recoverable parse error.
    #[must_use]
    pub fn new(head: Term, body: Vec<Term>, var_count: u32) -> Self {
        assert!(head.is_callable(), "clause head must be an atom or structure");
        Self { head, body, var_count }
    }

    /// Whether this clause is a fact (no body goals).
    #[must_use]
    pub fn is_fact(&self) -> bool {
        self.body.is_empty()
    }
}

/// A single top-level unit read by the front end: either a program clause
/// or a query.
///
/// A query is represented as a headless sentence: `head` is `None` and
/// `body` carries the goals to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// `Some` for a program clause, `None` for a query.
    pub head: Option<Term>,
    /// The goals: the clause body, or the query itself.
    pub body: Vec<Term>,
    /// Distinct variable count across `head` and `body`.
    pub var_count: u32,
}

impl Sentence {
    /// Build a program-clause sentence.
    #[must_use]
    pub fn clause(head: Term, body: Vec<Term>, var_count: u32) -> Self {
        assert!(head.is_callable(), "clause head must be an atom or structure");
        Self { head: Some(head), body, var_count }
    }

    /// Build a query sentence.
    #[must_use]
    pub fn query(body: Vec<Term>, var_count: u32) -> Self {
        Self { head: None, body, var_count }
    }

    /// Whether this sentence is a query (headless).
    #[must_use]
    pub const fn is_query(&self) -> bool {
        self.head.is_none()
    }

    /// Convert into a `Clause`, if this sentence has a head.
    #[must_use]
    pub fn into_clause(self) -> Option<Clause> {
        let head = self.head?;
        Some(Clause { head, body: self.body, var_count: self.var_count })
    }
}
