// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! # Warren core
//!
//! Foundational types shared by every crate in the Warren machine family:
//!
//! - Interned functor and variable names (`NameId`, `VarId`, `FunctorName`,
//!   `FunctorId`) and the `Interner` contract the host supplies.
//! - The tagged 32-bit heap cell (`Cell`) and its bit-level codec.
//! - The ingress AST (`Term`, `Clause`, `Sentence`) consumed from a parser
//!   front end that lives outside this workspace.
//!
//! This crate never parses source text and never owns an interning table —
//! both are the host's responsibility. `TableInterner` is the one exception:
//! a small `HashMap`-backed `Interner` kept here purely so the rest of the
//! workspace (and its tests) can drive the pipeline without a real front end.

mod cell;
mod functor;
mod interner;
mod term;

pub use cell::{Cell, Tag};
pub use functor::{FunctorId, FunctorName, NameId, VarId};
pub use interner::{Interner, TableInterner};
pub use term::{Clause, Sentence, Term};
