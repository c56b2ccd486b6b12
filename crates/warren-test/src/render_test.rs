// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;
use crate::engine::TestEngine;
use warren_core::VarId;

#[test]
fn atom_renders_its_interned_name() {
    let mut engine = TestEngine::new();
    let wine = engine.atom("wine");
    assert_eq!(render_term(&wine, &engine.interner), "wine");
}

#[test]
fn structure_renders_functor_and_comma_separated_args() {
    let mut engine = TestEngine::new();
    let a = engine.atom("a");
    let b = engine.atom("b");
    let f = engine.struct_("f", vec![a, b]);
    assert_eq!(render_term(&f, &engine.interner), "f(a, b)");
}

#[test]
fn list_renders_with_a_pipe_tail() {
    let mut engine = TestEngine::new();
    let h = engine.atom("h");
    let t = engine.var("T");
    let list = TestEngine::list(vec![h], Some(t));
    assert_eq!(render_term(&list, &engine.interner), "[h|T]");
}

#[test]
fn unknown_variable_id_renders_as_a_synthetic_name() {
    let engine = TestEngine::new();
    let synthetic = Term::Var(VarId::new(999));
    assert_eq!(render_term(&synthetic, &engine.interner), "_G999");
}
