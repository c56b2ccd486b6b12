// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The Warren machine instruction set.
//!
//! Instructions fall into six groups: [`Get`]/[`Unify`] read and match
//! against existing heap structure, [`Put`] builds fresh structure for an
//! outgoing call, [`Control`] sequences calls and environments,
//! [`Choice`] drives backtracking and first-argument indexing, and
//! [`Cut`] prunes choice points. Every variant here has a single,
//! fixed-length byte encoding in [`crate::codec`].

#[cfg(test)]
mod instr_test;

use warren_core::{FunctorId, NameId};

use crate::label::Label;
use crate::reg::{LocId, RegId};

/// A single byte-coded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    /// Match the contents of argument register `arg` against `op`.
    Get { op: Get, arg: RegId },
    /// Build fresh structure into argument register `arg`.
    Put { op: Put, arg: RegId },
    /// Match or build one argument of a structure/list already selected by
    /// a preceding `Get`/`Put` (read or write mode is a runtime, not
    /// compile-time, property).
    Unify(Unify),
    /// Call sequencing and environment management.
    Control(Control),
    /// Choice-point management and first-argument indexing.
    Choice(Choice),
    /// Cut barrier setup and execution.
    Cut(Cut),
}

/// Operations matching an argument register against existing heap data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Get {
    /// Bind a fresh temporary register to the argument.
    VariableTemp(RegId),
    /// Bind a fresh permanent variable slot to the argument.
    VariableLoc(LocId),
    /// Unify the argument against an already-bound temporary register.
    ValueTemp(RegId),
    /// Unify the argument against an already-bound permanent variable.
    ValueLoc(LocId),
    /// Unify the argument against an atomic constant.
    Constant(NameId),
    /// Unify the argument against a structure, entering read or write mode
    /// for the `Unify` instructions that follow.
    Structure(FunctorId),
    /// Unify the argument against a list cell, entering read or write mode
    /// for the two `Unify` instructions that follow (car, then cdr).
    List,
}

/// Operations building fresh structure into an argument register ahead of
/// a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Put {
    /// Bind a fresh permanent variable slot and copy its reference into
    /// the argument register.
    VariableLoc(LocId),
    /// Bind a fresh temporary register and copy its reference into the
    /// argument register.
    VariableTemp(RegId),
    /// Copy an already-bound permanent variable into the argument
    /// register.
    ValueLoc(LocId),
    /// Copy an already-bound temporary register into the argument
    /// register.
    ValueTemp(RegId),
    /// Copy a permanent variable that may still be unbound and is not
    /// needed after this call; dereferences through the stack rather than
    /// the heap to avoid stranding the frame it lives in.
    UnsafeValueLoc(LocId),
    /// Load an atomic constant into the argument register.
    Constant(NameId),
    /// Begin building a structure into the argument register; the
    /// following `Unify` instructions supply its arguments.
    Structure(FunctorId),
    /// Begin building a list cell into the argument register; the two
    /// `Unify` instructions that follow supply car and cdr.
    List,
}

/// Operations matching or building one argument slot of a structure or
/// list cell selected by the preceding `Get`/`Put`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unify {
    /// Skip `count` anonymous singleton variables.
    Void { count: u8 },
    /// Bind a fresh temporary register to this argument slot.
    VariableTemp(RegId),
    /// Bind a fresh permanent variable slot to this argument slot.
    VariableLoc(LocId),
    /// Unify this slot against an already-bound temporary register.
    ValueTemp(RegId),
    /// Unify this slot against an already-bound permanent variable.
    ValueLoc(LocId),
    /// Like `ValueTemp`, but in write mode copies rather than binds — used
    /// when the same variable occurs earlier in the same structure.
    LocalValueTemp(RegId),
    /// Like `ValueLoc`, but in write mode copies rather than binds.
    LocalValueLoc(LocId),
    /// Unify this slot against an atomic constant.
    Constant(NameId),
}

/// Sentinel `nvars` value meaning "no environment of this clause's own is
/// active here, do not trim". A chain-rule clause (no `Allocate`) borrows
/// its caller's environment for the length of its one-goal body; a call
/// compiled inside it has no permanent variables of its own to report, but
/// physically trimming would truncate the *caller's* frame instead. Real
/// live-counts never reach this value since a clause's own environment
/// tops out far below [`u8::MAX`] permanent variables.
pub const NO_TRIM: u8 = u8::MAX;

/// Call sequencing and environment management.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Call a procedure, keeping the current environment on the stack as
    /// the continuation. `nvars` is the number of permanent variables
    /// still live after the call returns, used to trim the environment on
    /// success, or [`NO_TRIM`] when no owned environment is active.
    Call { callee: FunctorId, nvars: u8 },
    /// Tail-call a procedure, reusing the current environment instead of
    /// pushing a continuation.
    Execute { callee: FunctorId },
    /// Call whatever callable term the argument register currently
    /// denotes, resolved against the call table at run time rather than
    /// at link time. Used to compile the `call/1` meta-predicate. `nvars`
    /// is as for [`Control::Call`].
    MetaCall { arg: RegId, nvars: u8 },
    /// Return control to the calling continuation.
    Proceed,
    /// Push a new environment frame sized to hold `nvars` permanent
    /// variables.
    Allocate { nvars: u16 },
    /// Pop the current environment frame, restoring the caller's
    /// continuation and cut barrier.
    Deallocate,
    /// Fail unconditionally, triggering backtracking. Used by the `\=/2`
    /// negation-as-failure idiom after its local choice point is cut.
    Fail,
    /// Jump to `target` within the current clause, with no other effect.
    /// Used to skip past the remaining alternatives of an inline
    /// disjunction once one of them has succeeded.
    Continue { target: Label },
}

/// Choice-point management and first-argument indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Push a choice point before trying the first of several clauses;
    /// `retry` is where execution resumes on backtracking.
    TryMeElse { retry: Label },
    /// Retry the next of several clauses, updating the choice point's
    /// retry address.
    RetryMeElse { retry: Label },
    /// Try the last of several clauses, popping the choice point.
    TrustMe,
    /// First-argument-indexed variant of `TryMeElse` jumping to `clause`.
    Try { clause: Label },
    /// First-argument-indexed variant of `RetryMeElse`.
    Retry { clause: Label },
    /// First-argument-indexed variant of `TrustMe`.
    Trust { clause: Label },
    /// Dispatch on the type of the dereferenced first argument.
    SwitchOnTerm { on_var: Label, on_const: Label, on_list: Label, on_struct: Label },
    /// Dispatch among clauses keyed by a constant first argument.
    SwitchOnConstant { table: Label },
    /// Dispatch among clauses keyed by a structure first argument.
    SwitchOnStructure { table: Label },
}

/// Cut barrier setup and execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cut {
    /// Record the current choice-point depth into a permanent variable,
    /// establishing this clause's cut barrier.
    GetLevelLoc(LocId),
    /// Discard all choice points created since clause entry (used for a
    /// cut appearing before any call, where no barrier slot is needed).
    NeckCut,
    /// Discard all choice points created since the barrier recorded in
    /// the given permanent variable.
    CutLoc(LocId),
}

impl Instr {
    /// The number of bytes [`crate::codec::encode_one`] writes for this
    /// instruction, computed from the opcode tag alone so the linker can
    /// size forward patches without encoding twice.
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        // opcode byte + arg-register byte (Get/Put only) + operand bytes.
        match self {
            Self::Get { op, .. } => {
                2 + match op {
                    Get::VariableTemp(_) | Get::VariableLoc(_) | Get::ValueTemp(_) | Get::ValueLoc(_) => 1,
                    Get::Constant(_) | Get::Structure(_) => 4,
                    Get::List => 0,
                }
            }
            Self::Put { op, .. } => {
                2 + match op {
                    Put::VariableLoc(_) | Put::VariableTemp(_) | Put::ValueLoc(_) | Put::ValueTemp(_) | Put::UnsafeValueLoc(_) => 1,
                    Put::Constant(_) | Put::Structure(_) => 4,
                    Put::List => 0,
                }
            }
            Self::Unify(u) => {
                1 + match u {
                    Unify::Void { .. }
                    | Unify::VariableTemp(_)
                    | Unify::VariableLoc(_)
                    | Unify::ValueTemp(_)
                    | Unify::ValueLoc(_)
                    | Unify::LocalValueTemp(_)
                    | Unify::LocalValueLoc(_) => 1,
                    Unify::Constant(_) => 4,
                }
            }
            Self::Control(c) => match c {
                Control::Call { .. } => 6,
                Control::Execute { .. } => 5,
                Control::MetaCall { .. } => 3,
                Control::Proceed | Control::Deallocate | Control::Fail => 1,
                Control::Allocate { .. } => 3,
                Control::Continue { .. } => 5,
            },
            Self::Choice(c) => match c {
                Choice::TryMeElse { .. }
                | Choice::RetryMeElse { .. }
                | Choice::Try { .. }
                | Choice::Retry { .. }
                | Choice::Trust { .. }
                | Choice::SwitchOnConstant { .. }
                | Choice::SwitchOnStructure { .. } => 5,
                Choice::TrustMe => 1,
                Choice::SwitchOnTerm { .. } => 17,
            },
            Self::Cut(c) => match c {
                Cut::GetLevelLoc(_) | Cut::CutLoc(_) => 2,
                Cut::NeckCut => 1,
            },
        }
    }
}
