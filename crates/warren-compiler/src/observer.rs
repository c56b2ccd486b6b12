// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use warren_core::{Clause, Term};

use crate::clause::CompiledClause;
use crate::query::CompiledQuery;

/// Hook for observing compilation as it happens — used by tooling
/// (disassemblers, tracing front ends) that want to react to each unit as
/// it is compiled without threading extra plumbing through the compiler's
/// return values.
pub trait CompilerObserver {
    /// Called after a program clause has been compiled.
    fn on_compilation(&mut self, source: &Clause, compiled: &[CompiledClause]) {
        let _ = (source, compiled);
    }

    /// Called after a query has been compiled.
    fn on_query_compilation(&mut self, source: &[Term], compiled: &CompiledQuery) {
        let _ = (source, compiled);
    }
}

/// An observer that does nothing, for callers with no tooling attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl CompilerObserver for NoopObserver {}
