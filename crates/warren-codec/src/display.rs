// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Textual disassembly: `mnemonic operand, operand` for every [`Instr`].
//!
//! Operands are rendered as raw ids (`X3`, `Y1`, `L12`, `#7`) rather than
//! resolved names — this layer has no interner to resolve them against,
//! only the byte-coded operands themselves.

#[cfg(test)]
mod display_test;

use std::fmt;

use crate::instr::{Choice, Control, Cut, Get, Instr, Put, Unify};
use crate::label::Label;
use crate::reg::{LocId, RegId};
use warren_core::{FunctorId, NameId};

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get { op, arg } => write!(f, "{}", GetLine(*op, *arg)),
            Self::Put { op, arg } => write!(f, "{}", PutLine(*op, *arg)),
            Self::Unify(u) => write!(f, "{u}"),
            Self::Control(c) => write!(f, "{c}"),
            Self::Choice(c) => write!(f, "{c}"),
            Self::Cut(c) => write!(f, "{c}"),
        }
    }
}

struct GetLine(Get, RegId);

impl fmt::Display for GetLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(op, arg) = self;
        match op {
            Get::VariableTemp(r) => write!(f, "get_variable_temp {r}, {arg}"),
            Get::VariableLoc(l) => write!(f, "get_variable_loc {l}, {arg}"),
            Get::ValueTemp(r) => write!(f, "get_value_temp {r}, {arg}"),
            Get::ValueLoc(l) => write!(f, "get_value_loc {l}, {arg}"),
            Get::Constant(name) => write!(f, "get_constant {}, {arg}", Name(*name)),
            Get::Structure(functor) => write!(f, "get_structure {}, {arg}", Functor(*functor)),
            Get::List => write!(f, "get_list {arg}"),
        }
    }
}

struct PutLine(Put, RegId);

impl fmt::Display for PutLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(op, arg) = self;
        match op {
            Put::VariableLoc(l) => write!(f, "put_variable_loc {l}, {arg}"),
            Put::VariableTemp(r) => write!(f, "put_variable_temp {r}, {arg}"),
            Put::ValueLoc(l) => write!(f, "put_value_loc {l}, {arg}"),
            Put::ValueTemp(r) => write!(f, "put_value_temp {r}, {arg}"),
            Put::UnsafeValueLoc(l) => write!(f, "put_unsafe_value_loc {l}, {arg}"),
            Put::Constant(name) => write!(f, "put_constant {}, {arg}", Name(*name)),
            Put::Structure(functor) => write!(f, "put_structure {}, {arg}", Functor(*functor)),
            Put::List => write!(f, "put_list {arg}"),
        }
    }
}

impl fmt::Display for Unify {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void { count } => write!(f, "unify_void {count}"),
            Self::VariableTemp(r) => write!(f, "unify_variable_temp {r}"),
            Self::VariableLoc(l) => write!(f, "unify_variable_loc {l}"),
            Self::ValueTemp(r) => write!(f, "unify_value_temp {r}"),
            Self::ValueLoc(l) => write!(f, "unify_value_loc {l}"),
            Self::LocalValueTemp(r) => write!(f, "unify_local_value_temp {r}"),
            Self::LocalValueLoc(l) => write!(f, "unify_local_value_loc {l}"),
            Self::Constant(name) => write!(f, "unify_constant {}", Name(*name)),
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call { callee, nvars } => write!(f, "call {}, {nvars}", Functor(*callee)),
            Self::Execute { callee } => write!(f, "execute {}", Functor(*callee)),
            Self::MetaCall { arg, nvars } => write!(f, "meta_call {arg}, {nvars}"),
            Self::Proceed => write!(f, "proceed"),
            Self::Allocate { nvars } => write!(f, "allocate {nvars}"),
            Self::Deallocate => write!(f, "deallocate"),
            Self::Fail => write!(f, "fail"),
            Self::Continue { target } => write!(f, "continue {target}"),
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TryMeElse { retry } => write!(f, "try_me_else {retry}"),
            Self::RetryMeElse { retry } => write!(f, "retry_me_else {retry}"),
            Self::TrustMe => write!(f, "trust_me"),
            Self::Try { clause } => write!(f, "try {clause}"),
            Self::Retry { clause } => write!(f, "retry {clause}"),
            Self::Trust { clause } => write!(f, "trust {clause}"),
            Self::SwitchOnTerm { on_var, on_const, on_list, on_struct } => {
                write!(f, "switch_on_term {on_var}, {on_const}, {on_list}, {on_struct}")
            }
            Self::SwitchOnConstant { table } => write!(f, "switch_on_constant {table}"),
            Self::SwitchOnStructure { table } => write!(f, "switch_on_structure {table}"),
        }
    }
}

impl fmt::Display for Cut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetLevelLoc(l) => write!(f, "get_level {l}"),
            Self::NeckCut => write!(f, "neck_cut"),
            Self::CutLoc(l) => write!(f, "cut {l}"),
        }
    }
}

impl fmt::Display for RegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X{}", self.as_u8())
    }
}

impl fmt::Display for LocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Y{}", self.as_u8())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.as_u32())
    }
}

struct Name(NameId);

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0.as_u32())
    }
}

struct Functor(FunctorId);

impl fmt::Display for Functor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unpacked = self.0.unpack();
        write!(f, "#{}/{}", unpacked.name.as_u32(), unpacked.arity)
    }
}
