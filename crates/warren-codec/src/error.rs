// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use thiserror::Error;

/// Errors raised while decoding a byte-coded instruction stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The stream ended in the middle of an instruction or operand.
    #[error("unexpected end of instruction stream at offset {offset}")]
    UnexpectedEof {
        /// Byte offset where decoding ran out of input.
        offset: usize,
    },
    /// The leading byte at `offset` does not name a known opcode.
    #[error("unknown opcode {opcode:#04x} at offset {offset}")]
    UnknownOpcode {
        /// The unrecognized opcode byte.
        opcode: u8,
        /// Byte offset the opcode was read from.
        offset: usize,
    },
}
