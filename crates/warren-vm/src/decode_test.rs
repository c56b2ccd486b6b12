// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;
use crate::heap::Heap;

const NIL: NameId = NameId::new(0);

#[test]
fn unbound_variable_decodes_to_a_synthetic_var() {
    let mut heap = Heap::new(16);
    let addr = heap.push_raw(0).unwrap();
    heap.write_cell(addr, Cell::unbound_var(addr));
    assert_eq!(decode_term(&heap, Cell::Ref(addr), NIL), Term::Var(VarId::new(addr)));
}

#[test]
fn atomic_constant_decodes_directly() {
    let heap = Heap::new(16);
    let name = NameId::new(5);
    assert_eq!(decode_term(&heap, Cell::Con(name), NIL), Term::Atom(name));
}

#[test]
fn structure_decodes_with_all_arguments() {
    let mut heap = Heap::new(16);
    let f = FunctorName::new(NameId::new(7), 2).pack().unwrap();
    let header = heap.push_functor_header(f).unwrap();
    heap.push_cell(Cell::Con(NameId::new(1))).unwrap();
    heap.push_cell(Cell::Con(NameId::new(2))).unwrap();
    let decoded = decode_term(&heap, Cell::Str(header), NIL);
    assert_eq!(
        decoded,
        Term::Struct(FunctorName::new(NameId::new(7), 2), vec![Term::Atom(NameId::new(1)), Term::Atom(NameId::new(2))])
    );
}

#[test]
fn proper_list_decodes_with_no_tail() {
    let mut heap = Heap::new(16);
    // [1, 2] as nested Lis cells, terminated by the nil atom.
    let second_pair = heap.len();
    heap.push_cell(Cell::Con(NameId::new(2))).unwrap();
    heap.push_cell(Cell::Con(NIL)).unwrap();
    let first_pair = heap.len();
    heap.push_cell(Cell::Con(NameId::new(1))).unwrap();
    heap.push_cell(Cell::Lis(second_pair)).unwrap();

    let decoded = decode_term(&heap, Cell::Lis(first_pair), NIL);
    assert_eq!(decoded, Term::List(vec![Term::Atom(NameId::new(1)), Term::Atom(NameId::new(2))], None));
}

#[test]
fn improper_list_reports_its_non_nil_tail() {
    let mut heap = Heap::new(16);
    let tail_addr = heap.push_raw(0).unwrap();
    heap.write_cell(tail_addr, Cell::unbound_var(tail_addr));
    let pair = heap.len();
    heap.push_cell(Cell::Con(NameId::new(1))).unwrap();
    heap.push_cell(Cell::Ref(tail_addr)).unwrap();

    let decoded = decode_term(&heap, Cell::Lis(pair), NIL);
    assert_eq!(decoded, Term::List(vec![Term::Atom(NameId::new(1))], Some(Box::new(Term::Var(VarId::new(tail_addr))))));
}
