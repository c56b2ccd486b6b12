// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Byte-coded instructions for the Warren machine family.
//!
//! This crate owns the instruction set (`Instr` and its operand types) and
//! the fixed-length byte encoding used to ship a compiled clause across a
//! process boundary or persist it to disk. The compiler builds `Instr`
//! values directly; the runtime either executes them in memory or decodes
//! them back from bytes first — both paths agree on exactly the same
//! opcode table.

mod codec;
mod display;
mod error;
mod instr;
mod label;
mod reg;

pub use codec::{decode_one, encode_one, Code};
pub use error::CodecError;
pub use instr::{Choice, Control, Cut, Get, Instr, Put, Unify, NO_TRIM};
pub use label::Label;
pub use reg::{LocId, RegId};
