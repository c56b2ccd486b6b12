// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;
use warren_core::FunctorName;

#[test]
fn push_then_read_round_trips() {
    let mut heap = Heap::new(16);
    let addr = heap.push_cell(Cell::Con(warren_core::NameId::new(7))).unwrap();
    assert_eq!(heap.read_cell(addr), Cell::Con(warren_core::NameId::new(7)));
}

#[test]
fn push_past_limit_is_exhausted() {
    let mut heap = Heap::new(1);
    heap.push_cell(Cell::Ref(0)).unwrap();
    let err = heap.push_cell(Cell::Ref(1)).unwrap_err();
    assert_eq!(err, EngineError::HeapExhausted { limit: 1 });
}

#[test]
fn truncate_discards_trailing_cells() {
    let mut heap = Heap::new(16);
    heap.push_cell(Cell::Ref(0)).unwrap();
    let mark = heap.len();
    heap.push_cell(Cell::Ref(1)).unwrap();
    heap.truncate(mark);
    assert_eq!(heap.len(), mark);
}

#[test]
fn unbound_var_derefs_to_itself() {
    let mut heap = Heap::new(16);
    let addr = heap.push_cell(Cell::Ref(0)).unwrap();
    heap.write_cell(addr, Cell::unbound_var(addr));
    assert_eq!(heap.deref(Cell::Ref(addr)), Cell::Ref(addr));
}

#[test]
fn deref_follows_chain_to_bound_value() {
    let mut heap = Heap::new(16);
    let a = heap.push_cell(Cell::Ref(0)).unwrap();
    heap.write_cell(a, Cell::unbound_var(a));
    let b = heap.push_cell(Cell::Ref(0)).unwrap();
    heap.write_cell(b, Cell::unbound_var(b));
    // bind a -> b, then b -> a constant
    heap.write_cell(a, Cell::Ref(b));
    heap.write_cell(b, Cell::Con(warren_core::NameId::new(3)));
    assert_eq!(heap.deref(Cell::Ref(a)), Cell::Con(warren_core::NameId::new(3)));
}

#[test]
fn functor_header_round_trips() {
    let mut heap = Heap::new(16);
    let functor = FunctorName::new(warren_core::NameId::new(5), 2).pack().unwrap();
    let addr = heap.push_functor_header(functor).unwrap();
    assert_eq!(heap.read_functor_header(addr), functor);
}
