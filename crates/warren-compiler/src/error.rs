// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use thiserror::Error;

/// Errors the compiler can raise against malformed input.
///
/// These are all static properties of the source clause/query; anything
/// that depends on what else has been loaded (an undefined callee, say)
/// is a linking concern and belongs to `warren-vm`, not here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    /// A clause head was not callable (a bare variable or a list).
    #[error("clause head must be an atom or a compound term")]
    HeadNotCallable,
    /// A body or query goal was not callable.
    #[error("goal at position {position} must be an atom or a compound term")]
    GoalNotCallable {
        /// Zero-based position of the offending goal within the body.
        position: usize,
    },
    /// A built-in was invoked with the wrong arity (e.g. `call/2`).
    #[error("built-in {name} expects arity {expected}, found {found}")]
    BuiltinArityMismatch {
        /// The built-in's name, for diagnostics.
        name: &'static str,
        /// The arity the built-in requires.
        expected: u8,
        /// The arity actually found at the call site.
        found: u8,
    },
    /// A functor name/arity pair did not fit into a packed `FunctorId`.
    #[error("functor name id does not fit in a packed functor id")]
    FunctorIdOverflow,
}
