// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Reading a solved query's bindings back off the heap as [`Term`] trees.
//!
//! This is the mirror image of `warren_compiler::termbuild`'s call-argument
//! building: where that module walks a `Term` to emit `put`/`unify`
//! instructions, [`decode_term`] walks the heap cells those instructions
//! built and reconstructs the `Term` they denote.

use warren_core::{Cell, FunctorName, NameId, Term, VarId};

use crate::heap::Heap;

/// Reconstruct the term a (possibly still partly unbound) cell denotes.
///
/// `nil` is the atom a proper list's spine is closed by — the same id the
/// compiler was given when it built the list in the first place — so a
/// `List` tail can be reported as `None` rather than `Some(Term::Atom(nil))`.
/// An unbound variable decodes to `Term::Var` carrying its own heap address
/// as a synthetic [`VarId`]: it names no source variable, only distinctness
/// from every other still-unbound binding in the same solution.
#[must_use]
pub fn decode_term(heap: &Heap, cell: Cell, nil: NameId) -> Term {
    match heap.deref(cell) {
        Cell::Ref(addr) => Term::Var(VarId::new(addr)),
        Cell::Con(name) => Term::Atom(name),
        Cell::Str(addr) => {
            let FunctorName { name, arity } = heap.read_functor_header(addr).unpack();
            let args = (0..u32::from(arity)).map(|i| decode_term(heap, heap.read_cell(addr + 1 + i), nil)).collect();
            Term::Struct(FunctorName::new(name, arity), args)
        }
        Cell::Lis(addr) => decode_list(heap, addr, nil),
    }
}

fn decode_list(heap: &Heap, mut pair_addr: u32, nil: NameId) -> Term {
    let mut elems = Vec::new();
    loop {
        elems.push(decode_term(heap, heap.read_cell(pair_addr), nil));
        match heap.deref(heap.read_cell(pair_addr + 1)) {
            Cell::Con(n) if n == nil => return Term::List(elems, None),
            Cell::Lis(next) => pair_addr = next,
            other => return Term::List(elems, Some(Box::new(decode_term(heap, other, nil)))),
        }
    }
}

#[cfg(test)]
mod decode_test;
