// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Shared integration-test support for the Warren workspace.
//!
//! [`TestEngine`] wraps a [`warren_core::TableInterner`] and a
//! [`warren_vm::Resolver`] together so a test can write a program and a
//! query as friendly strings (`engine.atom("a")`, `engine.var("X")`)
//! instead of juggling raw interned ids by hand — there is no parser
//! front end in this workspace, so this is the stand-in every other test
//! crate drives the pipeline through. [`programs`] collects a handful of
//! small reusable programs built on top of it; [`render_term`] turns a
//! resolved [`warren_vm::Solution`]'s bindings back into readable text
//! for assertion failure messages.

mod engine;
pub mod programs;
mod render;

pub use engine::{standard_builtins, TestEngine};
pub use render::render_term;
