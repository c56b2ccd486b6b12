// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Fixed-length byte encoding for [`Instr`].
//!
//! Every instruction starts with a one-byte opcode; the operands that
//! follow have a length fixed by the opcode alone, so a reader never needs
//! to look past the opcode byte to know how far to advance. Registers and
//! slot indices are one byte, labels and interned ids are four, and the
//! `allocate` frame size is two — wide enough for any clause this machine
//! can compile, narrow enough to keep common instructions small.

#[cfg(test)]
mod codec_test;

use warren_core::{FunctorId, NameId};

use crate::error::CodecError;
use crate::instr::{Choice, Control, Cut, Get, Instr, Put, Unify};
use crate::label::Label;
use crate::reg::{LocId, RegId};

/// Opcode byte values. Grouped to match [`crate::instr::Instr`]'s variant
/// groups; values are an implementation detail, never exposed to callers
/// beyond round-tripping through [`encode_one`]/[`decode_one`].
mod op {
    pub const GET_VARIABLE_TEMP: u8 = 0;
    pub const GET_VARIABLE_LOC: u8 = 1;
    pub const GET_VALUE_TEMP: u8 = 2;
    pub const GET_VALUE_LOC: u8 = 3;
    pub const GET_CONSTANT: u8 = 4;
    pub const GET_STRUCTURE: u8 = 5;
    pub const GET_LIST: u8 = 6;

    pub const PUT_VARIABLE_LOC: u8 = 7;
    pub const PUT_VARIABLE_TEMP: u8 = 8;
    pub const PUT_VALUE_LOC: u8 = 9;
    pub const PUT_VALUE_TEMP: u8 = 10;
    pub const PUT_UNSAFE_VALUE_LOC: u8 = 11;
    pub const PUT_CONSTANT: u8 = 12;
    pub const PUT_STRUCTURE: u8 = 13;
    pub const PUT_LIST: u8 = 14;

    pub const UNIFY_VOID: u8 = 15;
    pub const UNIFY_VARIABLE_TEMP: u8 = 16;
    pub const UNIFY_VARIABLE_LOC: u8 = 17;
    pub const UNIFY_VALUE_TEMP: u8 = 18;
    pub const UNIFY_VALUE_LOC: u8 = 19;
    pub const UNIFY_LOCAL_VALUE_TEMP: u8 = 20;
    pub const UNIFY_LOCAL_VALUE_LOC: u8 = 21;
    pub const UNIFY_CONSTANT: u8 = 22;

    pub const CALL: u8 = 23;
    pub const EXECUTE: u8 = 24;
    pub const META_CALL: u8 = 25;
    pub const PROCEED: u8 = 26;
    pub const ALLOCATE: u8 = 27;
    pub const DEALLOCATE: u8 = 28;
    pub const CONTINUE: u8 = 41;
    pub const FAIL: u8 = 42;

    pub const TRY_ME_ELSE: u8 = 29;
    pub const RETRY_ME_ELSE: u8 = 30;
    pub const TRUST_ME: u8 = 31;
    pub const TRY: u8 = 32;
    pub const RETRY: u8 = 33;
    pub const TRUST: u8 = 34;
    pub const SWITCH_ON_TERM: u8 = 35;
    pub const SWITCH_ON_CONSTANT: u8 = 36;
    pub const SWITCH_ON_STRUCTURE: u8 = 37;

    pub const GET_LEVEL_LOC: u8 = 38;
    pub const NECK_CUT: u8 = 39;
    pub const CUT_LOC: u8 = 40;
}

/// A flat, already-linked instruction stream.
///
/// Offsets into `bytes` are exactly the addresses `Label`s refer to; the
/// runtime's program counter is one such offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Code {
    bytes: Vec<u8>,
}

impl Code {
    /// An empty instruction stream.
    #[must_use]
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Append an instruction, returning the offset it was written at —
    /// the address a `Label` targeting it should use.
    pub fn emit(&mut self, instr: Instr) -> u32 {
        let offset = self.bytes.len() as u32;
        encode_into(&instr, &mut self.bytes);
        offset
    }

    /// Number of bytes emitted so far; also the offset the next
    /// instruction would land at.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether no instructions have been emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode the instruction at `offset`, returning it and the offset of
    /// the next instruction.
    pub fn decode_at(&self, offset: u32) -> Result<(Instr, u32), CodecError> {
        let (instr, len) = decode_one(&self.bytes, offset as usize)?;
        Ok((instr, offset + len as u32))
    }

    /// The raw byte representation, as it would be shipped across a
    /// process boundary.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Encode a single instruction to its fixed-length byte form.
#[must_use]
pub fn encode_one(instr: &Instr) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(instr, &mut out);
    out
}

/// Decode a single instruction starting at `offset`, returning it plus the
/// number of bytes consumed.
pub fn decode_one(bytes: &[u8], offset: usize) -> Result<(Instr, usize), CodecError> {
    let mut reader = Reader { bytes, pos: offset };
    let opcode = reader.read_u8()?;
    let instr = decode_body(opcode, &mut reader)?;
    Ok((instr, reader.pos - offset))
}

fn encode_into(instr: &Instr, out: &mut Vec<u8>) {
    match instr {
        Instr::Get { op, arg } => encode_get(*op, *arg, out),
        Instr::Put { op, arg } => encode_put(*op, *arg, out),
        Instr::Unify(u) => encode_unify(*u, out),
        Instr::Control(c) => encode_control(*c, out),
        Instr::Choice(c) => encode_choice(*c, out),
        Instr::Cut(c) => encode_cut(*c, out),
    }
}

fn encode_get(get: Get, arg: RegId, out: &mut Vec<u8>) {
    match get {
        Get::VariableTemp(r) => {
            out.push(op::GET_VARIABLE_TEMP);
            push_reg(out, arg);
            push_reg(out, r);
        }
        Get::VariableLoc(l) => {
            out.push(op::GET_VARIABLE_LOC);
            push_reg(out, arg);
            push_loc(out, l);
        }
        Get::ValueTemp(r) => {
            out.push(op::GET_VALUE_TEMP);
            push_reg(out, arg);
            push_reg(out, r);
        }
        Get::ValueLoc(l) => {
            out.push(op::GET_VALUE_LOC);
            push_reg(out, arg);
            push_loc(out, l);
        }
        Get::Constant(name) => {
            out.push(op::GET_CONSTANT);
            push_reg(out, arg);
            push_name(out, name);
        }
        Get::Structure(functor) => {
            out.push(op::GET_STRUCTURE);
            push_reg(out, arg);
            push_functor(out, functor);
        }
        Get::List => {
            out.push(op::GET_LIST);
            push_reg(out, arg);
        }
    }
}

fn encode_put(put: Put, arg: RegId, out: &mut Vec<u8>) {
    match put {
        Put::VariableLoc(l) => {
            out.push(op::PUT_VARIABLE_LOC);
            push_reg(out, arg);
            push_loc(out, l);
        }
        Put::VariableTemp(r) => {
            out.push(op::PUT_VARIABLE_TEMP);
            push_reg(out, arg);
            push_reg(out, r);
        }
        Put::ValueLoc(l) => {
            out.push(op::PUT_VALUE_LOC);
            push_reg(out, arg);
            push_loc(out, l);
        }
        Put::ValueTemp(r) => {
            out.push(op::PUT_VALUE_TEMP);
            push_reg(out, arg);
            push_reg(out, r);
        }
        Put::UnsafeValueLoc(l) => {
            out.push(op::PUT_UNSAFE_VALUE_LOC);
            push_reg(out, arg);
            push_loc(out, l);
        }
        Put::Constant(name) => {
            out.push(op::PUT_CONSTANT);
            push_reg(out, arg);
            push_name(out, name);
        }
        Put::Structure(functor) => {
            out.push(op::PUT_STRUCTURE);
            push_reg(out, arg);
            push_functor(out, functor);
        }
        Put::List => {
            out.push(op::PUT_LIST);
            push_reg(out, arg);
        }
    }
}

fn encode_unify(unify: Unify, out: &mut Vec<u8>) {
    match unify {
        Unify::Void { count } => {
            out.push(op::UNIFY_VOID);
            out.push(count);
        }
        Unify::VariableTemp(r) => {
            out.push(op::UNIFY_VARIABLE_TEMP);
            push_reg(out, r);
        }
        Unify::VariableLoc(l) => {
            out.push(op::UNIFY_VARIABLE_LOC);
            push_loc(out, l);
        }
        Unify::ValueTemp(r) => {
            out.push(op::UNIFY_VALUE_TEMP);
            push_reg(out, r);
        }
        Unify::ValueLoc(l) => {
            out.push(op::UNIFY_VALUE_LOC);
            push_loc(out, l);
        }
        Unify::LocalValueTemp(r) => {
            out.push(op::UNIFY_LOCAL_VALUE_TEMP);
            push_reg(out, r);
        }
        Unify::LocalValueLoc(l) => {
            out.push(op::UNIFY_LOCAL_VALUE_LOC);
            push_loc(out, l);
        }
        Unify::Constant(name) => {
            out.push(op::UNIFY_CONSTANT);
            push_name(out, name);
        }
    }
}

fn encode_control(control: Control, out: &mut Vec<u8>) {
    match control {
        Control::Call { callee, nvars } => {
            out.push(op::CALL);
            push_functor(out, callee);
            out.push(nvars);
        }
        Control::Execute { callee } => {
            out.push(op::EXECUTE);
            push_functor(out, callee);
        }
        Control::MetaCall { arg, nvars } => {
            out.push(op::META_CALL);
            push_reg(out, arg);
            out.push(nvars);
        }
        Control::Proceed => out.push(op::PROCEED),
        Control::Allocate { nvars } => {
            out.push(op::ALLOCATE);
            out.extend_from_slice(&nvars.to_le_bytes());
        }
        Control::Deallocate => out.push(op::DEALLOCATE),
        Control::Fail => out.push(op::FAIL),
        Control::Continue { target } => {
            out.push(op::CONTINUE);
            push_label(out, target);
        }
    }
}

fn encode_choice(choice: Choice, out: &mut Vec<u8>) {
    match choice {
        Choice::TryMeElse { retry } => {
            out.push(op::TRY_ME_ELSE);
            push_label(out, retry);
        }
        Choice::RetryMeElse { retry } => {
            out.push(op::RETRY_ME_ELSE);
            push_label(out, retry);
        }
        Choice::TrustMe => out.push(op::TRUST_ME),
        Choice::Try { clause } => {
            out.push(op::TRY);
            push_label(out, clause);
        }
        Choice::Retry { clause } => {
            out.push(op::RETRY);
            push_label(out, clause);
        }
        Choice::Trust { clause } => {
            out.push(op::TRUST);
            push_label(out, clause);
        }
        Choice::SwitchOnTerm { on_var, on_const, on_list, on_struct } => {
            out.push(op::SWITCH_ON_TERM);
            push_label(out, on_var);
            push_label(out, on_const);
            push_label(out, on_list);
            push_label(out, on_struct);
        }
        Choice::SwitchOnConstant { table } => {
            out.push(op::SWITCH_ON_CONSTANT);
            push_label(out, table);
        }
        Choice::SwitchOnStructure { table } => {
            out.push(op::SWITCH_ON_STRUCTURE);
            push_label(out, table);
        }
    }
}

fn encode_cut(cut: Cut, out: &mut Vec<u8>) {
    match cut {
        Cut::GetLevelLoc(l) => {
            out.push(op::GET_LEVEL_LOC);
            push_loc(out, l);
        }
        Cut::NeckCut => out.push(op::NECK_CUT),
        Cut::CutLoc(l) => {
            out.push(op::CUT_LOC);
            push_loc(out, l);
        }
    }
}

fn push_reg(out: &mut Vec<u8>, r: RegId) {
    out.push(r.as_u8());
}

fn push_loc(out: &mut Vec<u8>, l: LocId) {
    out.push(l.as_u8());
}

fn push_name(out: &mut Vec<u8>, name: NameId) {
    out.extend_from_slice(&name.as_u32().to_le_bytes());
}

fn push_functor(out: &mut Vec<u8>, functor: FunctorId) {
    out.extend_from_slice(&functor.as_u32().to_le_bytes());
}

fn push_label(out: &mut Vec<u8>, label: Label) {
    out.extend_from_slice(&label.as_u32().to_le_bytes());
}

/// A cursor over an instruction byte stream, tracking the read position so
/// [`CodecError`]s can report where decoding failed.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn read_u8(&mut self) -> Result<u8, CodecError> {
        let byte = *self
            .bytes
            .get(self.pos)
            .ok_or(CodecError::UnexpectedEof { offset: self.pos })?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_u16(&mut self) -> Result<u16, CodecError> {
        let bytes = self.read_array::<2>()?;
        Ok(u16::from_le_bytes(bytes))
    }

    fn read_u32(&mut self) -> Result<u32, CodecError> {
        let bytes = self.read_array::<4>()?;
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let end = self.pos + N;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or(CodecError::UnexpectedEof { offset: self.pos })?;
        self.pos = end;
        Ok(slice.try_into().expect("slice length matches N by construction"))
    }

    fn read_reg(&mut self) -> Result<RegId, CodecError> {
        self.read_u8().map(RegId::new)
    }

    fn read_loc(&mut self) -> Result<LocId, CodecError> {
        self.read_u8().map(LocId::new)
    }

    fn read_name(&mut self) -> Result<NameId, CodecError> {
        self.read_u32().map(NameId::new)
    }

    fn read_functor(&mut self) -> Result<FunctorId, CodecError> {
        self.read_u32().map(FunctorId::from_raw)
    }

    fn read_label(&mut self) -> Result<Label, CodecError> {
        self.read_u32().map(Label::new)
    }
}

#[expect(clippy::too_many_lines, reason = "one flat match over every opcode is clearer than splitting it")]
fn decode_body(opcode: u8, r: &mut Reader<'_>) -> Result<Instr, CodecError> {
    let opcode_offset = r.pos - 1;
    Ok(match opcode {
        op::GET_VARIABLE_TEMP => {
            let arg = r.read_reg()?;
            Instr::Get { op: Get::VariableTemp(r.read_reg()?), arg }
        }
        op::GET_VARIABLE_LOC => {
            let arg = r.read_reg()?;
            Instr::Get { op: Get::VariableLoc(r.read_loc()?), arg }
        }
        op::GET_VALUE_TEMP => {
            let arg = r.read_reg()?;
            Instr::Get { op: Get::ValueTemp(r.read_reg()?), arg }
        }
        op::GET_VALUE_LOC => {
            let arg = r.read_reg()?;
            Instr::Get { op: Get::ValueLoc(r.read_loc()?), arg }
        }
        op::GET_CONSTANT => {
            let arg = r.read_reg()?;
            Instr::Get { op: Get::Constant(r.read_name()?), arg }
        }
        op::GET_STRUCTURE => {
            let arg = r.read_reg()?;
            Instr::Get { op: Get::Structure(r.read_functor()?), arg }
        }
        op::GET_LIST => Instr::Get { op: Get::List, arg: r.read_reg()? },

        op::PUT_VARIABLE_LOC => {
            let arg = r.read_reg()?;
            Instr::Put { op: Put::VariableLoc(r.read_loc()?), arg }
        }
        op::PUT_VARIABLE_TEMP => {
            let arg = r.read_reg()?;
            Instr::Put { op: Put::VariableTemp(r.read_reg()?), arg }
        }
        op::PUT_VALUE_LOC => {
            let arg = r.read_reg()?;
            Instr::Put { op: Put::ValueLoc(r.read_loc()?), arg }
        }
        op::PUT_VALUE_TEMP => {
            let arg = r.read_reg()?;
            Instr::Put { op: Put::ValueTemp(r.read_reg()?), arg }
        }
        op::PUT_UNSAFE_VALUE_LOC => {
            let arg = r.read_reg()?;
            Instr::Put { op: Put::UnsafeValueLoc(r.read_loc()?), arg }
        }
        op::PUT_CONSTANT => {
            let arg = r.read_reg()?;
            Instr::Put { op: Put::Constant(r.read_name()?), arg }
        }
        op::PUT_STRUCTURE => {
            let arg = r.read_reg()?;
            Instr::Put { op: Put::Structure(r.read_functor()?), arg }
        }
        op::PUT_LIST => Instr::Put { op: Put::List, arg: r.read_reg()? },

        op::UNIFY_VOID => Instr::Unify(Unify::Void { count: r.read_u8()? }),
        op::UNIFY_VARIABLE_TEMP => Instr::Unify(Unify::VariableTemp(r.read_reg()?)),
        op::UNIFY_VARIABLE_LOC => Instr::Unify(Unify::VariableLoc(r.read_loc()?)),
        op::UNIFY_VALUE_TEMP => Instr::Unify(Unify::ValueTemp(r.read_reg()?)),
        op::UNIFY_VALUE_LOC => Instr::Unify(Unify::ValueLoc(r.read_loc()?)),
        op::UNIFY_LOCAL_VALUE_TEMP => Instr::Unify(Unify::LocalValueTemp(r.read_reg()?)),
        op::UNIFY_LOCAL_VALUE_LOC => Instr::Unify(Unify::LocalValueLoc(r.read_loc()?)),
        op::UNIFY_CONSTANT => Instr::Unify(Unify::Constant(r.read_name()?)),

        op::CALL => {
            let callee = r.read_functor()?;
            Instr::Control(Control::Call { callee, nvars: r.read_u8()? })
        }
        op::EXECUTE => Instr::Control(Control::Execute { callee: r.read_functor()? }),
        op::META_CALL => {
            let arg = r.read_reg()?;
            Instr::Control(Control::MetaCall { arg, nvars: r.read_u8()? })
        }
        op::PROCEED => Instr::Control(Control::Proceed),
        op::ALLOCATE => Instr::Control(Control::Allocate { nvars: r.read_u16()? }),
        op::DEALLOCATE => Instr::Control(Control::Deallocate),
        op::FAIL => Instr::Control(Control::Fail),
        op::CONTINUE => Instr::Control(Control::Continue { target: r.read_label()? }),

        op::TRY_ME_ELSE => Instr::Choice(Choice::TryMeElse { retry: r.read_label()? }),
        op::RETRY_ME_ELSE => Instr::Choice(Choice::RetryMeElse { retry: r.read_label()? }),
        op::TRUST_ME => Instr::Choice(Choice::TrustMe),
        op::TRY => Instr::Choice(Choice::Try { clause: r.read_label()? }),
        op::RETRY => Instr::Choice(Choice::Retry { clause: r.read_label()? }),
        op::TRUST => Instr::Choice(Choice::Trust { clause: r.read_label()? }),
        op::SWITCH_ON_TERM => {
            let on_var = r.read_label()?;
            let on_const = r.read_label()?;
            let on_list = r.read_label()?;
            let on_struct = r.read_label()?;
            Instr::Choice(Choice::SwitchOnTerm { on_var, on_const, on_list, on_struct })
        }
        op::SWITCH_ON_CONSTANT => Instr::Choice(Choice::SwitchOnConstant { table: r.read_label()? }),
        op::SWITCH_ON_STRUCTURE => Instr::Choice(Choice::SwitchOnStructure { table: r.read_label()? }),

        op::GET_LEVEL_LOC => Instr::Cut(Cut::GetLevelLoc(r.read_loc()?)),
        op::NECK_CUT => Instr::Cut(Cut::NeckCut),
        op::CUT_LOC => Instr::Cut(Cut::CutLoc(r.read_loc()?)),

        other => return Err(CodecError::UnknownOpcode { opcode: other, offset: opcode_offset }),
    })
}
