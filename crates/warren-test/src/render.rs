// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Rendering a decoded [`Term`] back to a readable string for assertion
//! failure messages, resolving every name through an [`Interner`] instead
//! of printing raw ids.

#[cfg(test)]
mod render_test;

use std::fmt::Write as _;

use warren_core::{Interner, Term};

/// Render `term` using `interner` to resolve every atom, functor and
/// variable name it carries.
///
/// A variable the interner has never seen (the synthetic ids
/// `warren_vm::decode_term` invents for still-unbound heap cells) renders
/// as `_G<id>` rather than panicking — solutions routinely carry these.
#[must_use]
pub fn render_term(term: &Term, interner: &dyn Interner) -> String {
    let mut out = String::new();
    write_term(term, interner, &mut out);
    out
}

fn write_term(term: &Term, interner: &dyn Interner, out: &mut String) {
    match term {
        Term::Var(v) => match interner.var_name_of(*v) {
            Some(name) => out.push_str(name),
            None => {
                let _ = write!(out, "_G{}", v.as_u32());
            }
        },
        Term::Atom(name) => out.push_str(interner.name_of(*name).unwrap_or("?")),
        Term::Struct(functor, args) => {
            out.push_str(interner.name_of(functor.name).unwrap_or("?"));
            out.push('(');
            write_args(args, interner, out);
            out.push(')');
        }
        Term::List(items, tail) => {
            out.push('[');
            write_args(items, interner, out);
            if let Some(tail) = tail {
                out.push('|');
                write_term(tail, interner, out);
            }
            out.push(']');
        }
    }
}

fn write_args(args: &[Term], interner: &dyn Interner, out: &mut String) {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_term(arg, interner, out);
    }
}
