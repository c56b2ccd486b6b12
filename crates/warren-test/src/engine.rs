// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! A small stateful test harness wrapping a [`TableInterner`] and a
//! [`Resolver`] together, so a test can write a program as friendly
//! strings (`engine.atom("a")`, `engine.var("X")`) instead of juggling
//! raw interned ids by hand.

#[cfg(test)]
mod engine_test;

use std::collections::HashSet;

use warren_compiler::Builtins;
use warren_core::{Clause, FunctorName, Interner, TableInterner, Term, VarId};
use warren_vm::{EngineError, LinkError, MachineConfig, Resolver, Solution};

/// Intern the five functor identities the compiler treats specially,
/// against a fresh interner, the way a real front end would resolve them
/// once at startup.
#[must_use]
pub fn standard_builtins(interner: &mut TableInterner) -> Builtins {
    Builtins {
        conjunction: FunctorName::new(interner.intern_name(","), 2),
        disjunction: FunctorName::new(interner.intern_name(";"), 2),
        cut: FunctorName::new(interner.intern_name("!"), 0),
        call1: FunctorName::new(interner.intern_name("call"), 1),
        unify: FunctorName::new(interner.intern_name("="), 2),
        not_unify: FunctorName::new(interner.intern_name("\\="), 2),
        nil: interner.intern_name("[]"),
    }
}

/// Compiles, links and resolves a program written against a shared
/// [`TableInterner`], driving it the same way a real embedding would
/// drive [`Resolver`] — only with friendly names standing in for a
/// parser front end.
pub struct TestEngine {
    /// The name table backing every `atom`/`var`/`struct_` call. Public so
    /// a test can render a [`Solution`]'s bindings back to readable names.
    pub interner: TableInterner,
    builtins: Builtins,
    resolver: Resolver,
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEngine {
    /// Build an engine with a fresh interner, the standard builtins, and
    /// default machine sizing.
    #[must_use]
    pub fn new() -> Self {
        let mut interner = TableInterner::new();
        let builtins = standard_builtins(&mut interner);
        Self { interner, builtins, resolver: Resolver::new(MachineConfig::default(), builtins) }
    }

    /// Intern `name` as an atom (a zero-arity functor).
    pub fn atom(&mut self, name: &str) -> Term {
        Term::Atom(self.interner.intern_name(name))
    }

    /// Intern `name` as a logic variable.
    ///
    /// Variable names are interned engine-wide, not per clause: writing
    /// `engine.var("X")` twice within one clause correctly yields the same
    /// occurrence, but reusing the same name in two unrelated clauses of
    /// the same predicate is also safe — the compiler only ever looks at
    /// the variables appearing within one clause's own head and body.
    pub fn var(&mut self, name: &str) -> Term {
        Term::Var(self.interner.intern_var(name))
    }

    /// Build a structure term, interning its functor name and deriving
    /// its arity from `args.len()`.
    pub fn struct_(&mut self, name: &str, args: Vec<Term>) -> Term {
        let name_id = self.interner.intern_name(name);
        Term::Struct(FunctorName::new(name_id, args.len() as u8), args)
    }

    /// Build a list term from its elements and an optional tail.
    #[must_use]
    pub fn list(items: Vec<Term>, tail: Option<Term>) -> Term {
        Term::List(items, tail.map(Box::new))
    }

    /// The cut goal (`!`).
    pub fn cut(&mut self) -> Term {
        Term::Atom(self.builtins.cut.name)
    }

    /// The `=/2` goal, unifying `a` and `b` without committing to a
    /// clause.
    #[must_use]
    pub fn unify_goal(&self, a: Term, b: Term) -> Term {
        Term::Struct(self.builtins.unify, vec![a, b])
    }

    /// The `\=/2` goal, succeeding iff `a` and `b` do not unify.
    #[must_use]
    pub fn not_unify_goal(&self, a: Term, b: Term) -> Term {
        Term::Struct(self.builtins.not_unify, vec![a, b])
    }

    /// The `;/2` disjunction goal, expanded by the compiler into one
    /// clause alternative per branch.
    #[must_use]
    pub fn disjunction_goal(&self, left: Term, right: Term) -> Term {
        Term::Struct(self.builtins.disjunction, vec![left, right])
    }

    /// A goal guaranteed to fail: `X \= X` for a fresh `X`, never
    /// unifiable with itself only because `\=` demands the opposite.
    pub fn never(&mut self) -> Term {
        let marker = self.atom("__never__");
        self.not_unify_goal(marker.clone(), marker)
    }

    /// The `call/1` meta-call goal.
    #[must_use]
    pub fn call_goal(&self, inner: Term) -> Term {
        Term::Struct(self.builtins.call1, vec![inner])
    }

    /// Build a clause, counting its distinct variables automatically.
    #[must_use]
    pub fn clause(&self, head: Term, body: Vec<Term>) -> Clause {
        let mut vars = HashSet::new();
        collect_vars(&head, &mut vars);
        for goal in &body {
            collect_vars(goal, &mut vars);
        }
        Clause::new(head, body, vars.len() as u32)
    }

    /// Build a fact (a clause with an empty body).
    #[must_use]
    pub fn fact(&self, head: Term) -> Clause {
        self.clause(head, Vec::new())
    }

    /// Compile, link and install every alternative of one predicate.
    ///
    /// # Errors
    /// Returns [`LinkError`] if any clause fails to compile.
    pub fn load(&mut self, clauses: Vec<Clause>) -> Result<(), LinkError> {
        self.resolver.add_predicate(&clauses)
    }

    /// Compile, link and arm a query, discarding any previous one.
    ///
    /// # Errors
    /// Returns [`LinkError`] if the query body fails to compile.
    pub fn query(&mut self, goals: Vec<Term>) -> Result<(), LinkError> {
        self.resolver.set_query(&goals)
    }

    /// Advance to the next solution of the armed query, if any.
    ///
    /// # Errors
    /// Returns [`EngineError`] if the machine hits a resource limit or an
    /// undefined procedure.
    pub fn next_solution(&mut self) -> Result<Option<Solution>, EngineError> {
        self.resolver.resolve()
    }

    /// Intern `name` and look up its [`VarId`] — useful to read a
    /// [`Solution`]'s bindings back out by the same friendly name a test
    /// built its query with.
    pub fn var_id(&mut self, name: &str) -> VarId {
        self.interner.intern_var(name)
    }

    /// Discard runtime state and any pending query; linked predicates
    /// survive.
    pub fn reset(&mut self) {
        self.resolver.reset();
    }
}

fn collect_vars(term: &Term, out: &mut HashSet<VarId>) {
    match term {
        Term::Var(v) => {
            out.insert(*v);
        }
        Term::Atom(_) => {}
        Term::Struct(_, args) => {
            for arg in args {
                collect_vars(arg, out);
            }
        }
        Term::List(items, tail) => {
            for item in items {
                collect_vars(item, out);
            }
            if let Some(tail) = tail {
                collect_vars(tail, out);
            }
        }
    }
}
