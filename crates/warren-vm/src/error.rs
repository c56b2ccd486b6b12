// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use thiserror::Error;
use warren_core::FunctorId;

/// Errors raised while the byte-code dispatch loop is running.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The heap grew past the configured limit.
    #[error("heap exhausted (limit {limit} cells)")]
    HeapExhausted {
        /// The configured heap cell limit.
        limit: usize,
    },
    /// The control stack (environments and choice points) grew past the
    /// configured limit.
    #[error("control stack exhausted (limit {limit} entries)")]
    StackExhausted {
        /// The configured control stack limit.
        limit: usize,
    },
    /// The trail grew past the configured limit.
    #[error("trail exhausted (limit {limit} entries)")]
    TrailExhausted {
        /// The configured trail limit.
        limit: usize,
    },
    /// A `call`/`execute` targeted a functor with no entry in the call
    /// table — raised at first `resolve()` after linking, not at clause
    /// emission time, since clauses may be added out of order across
    /// several `add_to_domain` calls before the callee exists.
    #[error("no clauses for {functor:?}")]
    UndefinedProcedure {
        /// The callee that has no matching clauses.
        functor: FunctorId,
    },
    /// A byte-coded instruction stream failed to decode.
    #[error("bytecode decode error: {0}")]
    Codec(#[from] warren_codec::CodecError),
}

/// Errors raised while adding clauses or queries to the machine's domain.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    /// A clause failed to compile.
    #[error("compile error: {0}")]
    Compile(#[from] warren_compiler::CompileError),
}
