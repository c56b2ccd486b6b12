// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The dispatch loop: fetch, decode, execute, one instruction at a time.
//!
//! [`Machine`] owns every piece of mutable execution state — heap, trail,
//! registers, environments and choice points, the program counter and its
//! supporting registers — but holds none of the *linked code* itself; that
//! lives in a [`crate::linker::Linker`] passed into [`Machine::solve`] and
//! [`Machine::redo`], since several machines could in principle share one
//! linked domain.

#[cfg(test)]
mod machine_test;

use warren_codec::{Choice, Control, Cut, Get, Instr, Label, LocId, Put, RegId, Unify};
use warren_core::{Cell, FunctorId, FunctorName};

use crate::config::MachineConfig;
use crate::error::EngineError;
use crate::heap::Heap;
use crate::linker::Linker;
use crate::registers::Registers;
use crate::stack::{ChoicePoint, Continuation, Environment, Stack};
use crate::trail::Trail;

/// Continuation value meaning "the query has been satisfied" rather than
/// "jump to this address" — `Proceed` checks for it instead of chasing a
/// dangling return address off the end of the query's own code.
const HALT: Label = Label::new(u32::MAX);

/// Whether a `Get`/`Put` structure or list instruction's arguments are
/// being matched against existing heap data or built fresh.
#[derive(Debug, Clone, Copy)]
enum Mode {
    /// Matching existing structure; `addr` is the next argument cell.
    Read { addr: u32 },
    /// Building fresh structure by pushing cells as each `Unify` runs.
    Write,
}

/// What the dispatch loop should do after one instruction.
enum Outcome {
    /// Move on to the next instruction in sequence.
    Advance,
    /// Jump to an absolute instruction offset.
    Jump(Label),
    /// `Control::Proceed` executed; the loop decides whether that means
    /// the query succeeded or control returns to a caller.
    Proceed,
    /// Matching failed; backtrack into the most recent choice point.
    Fail,
}

/// The Warren machine's complete runtime state.
#[derive(Debug)]
pub struct Machine {
    config: MachineConfig,
    heap: Heap,
    trail: Trail,
    registers: Registers,
    stack: Stack,
    pc: u32,
    cp: Label,
    ce: Option<u32>,
    /// Choice-point depth captured at the most recent `Call`/`Execute`/
    /// `MetaCall` dispatch — what a neck cut (one with no reserved barrier
    /// slot) cuts back to.
    cut_parent: u32,
    mode: Option<Mode>,
}

impl Machine {
    /// Build a machine sized by `config`.
    #[must_use]
    pub fn new(config: MachineConfig) -> Self {
        Self {
            config,
            heap: Heap::new(config.heap_size),
            trail: Trail::new(config.trail_size),
            registers: Registers::new(config.num_registers),
            stack: Stack::new(config.stack_size),
            pc: 0,
            cp: HALT,
            ce: None,
            cut_parent: 0,
            mode: None,
        }
    }

    /// Discard all execution state, ready for a fresh query.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    /// The heap, for solution readback.
    #[must_use]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// The environment currently in scope, if any — for a query that
    /// just succeeded, this is the query's own environment, holding every
    /// query variable's binding.
    #[must_use]
    pub fn current_environment(&self) -> Option<&Environment> {
        self.ce.map(|idx| self.stack.environment(idx))
    }

    /// Read an argument register directly — used to seed a query's initial
    /// arguments before a fresh [`Machine::solve`].
    pub fn set_register(&mut self, r: RegId, value: Cell) {
        self.registers.set(r, value);
    }

    /// Run from scratch starting at `entry`, stopping at the first
    /// solution or overall failure.
    pub fn solve(&mut self, linker: &Linker, entry: Label) -> Result<bool, EngineError> {
        self.reset();
        self.pc = entry.as_u32();
        self.cp = HALT;
        self.ce = None;
        self.cut_parent = 0;
        self.run(linker)
    }

    /// Backtrack into the next alternative and run until the next
    /// solution or overall failure. Only meaningful after a prior
    /// [`Machine::solve`]/`redo` returned `Ok(true)`.
    pub fn redo(&mut self, linker: &Linker) -> Result<bool, EngineError> {
        if !self.backtrack()? {
            return Ok(false);
        }
        self.run(linker)
    }

    fn run(&mut self, linker: &Linker) -> Result<bool, EngineError> {
        loop {
            let (instr, next_pc) = linker.code().decode_at(self.pc)?;
            match self.execute(instr, linker, next_pc)? {
                Outcome::Advance => self.pc = next_pc,
                Outcome::Jump(label) => self.pc = label.as_u32(),
                Outcome::Proceed => {
                    // A query never tail-deallocates (its environment must
                    // survive for solution readback), so its own last goal
                    // is still dispatched through `Call`, whose return
                    // address is the query's own trailing `Proceed`. That
                    // makes `cp` point right back at the instruction we
                    // just ran — indistinguishable from a real forward
                    // continuation except that it is self-referential, so
                    // that coincidence doubles as the top-level success
                    // signal alongside the plain `cp == HALT` case (a
                    // query with an empty body).
                    if self.cp == HALT || self.cp.as_u32() == self.pc {
                        return Ok(true);
                    }
                    self.pc = self.cp.as_u32();
                }
                Outcome::Fail => {
                    if !self.backtrack()? {
                        return Ok(false);
                    }
                }
            }
        }
    }

    fn execute(&mut self, instr: Instr, linker: &Linker, next_pc: u32) -> Result<Outcome, EngineError> {
        match instr {
            Instr::Get { op, arg } => self.do_get(op, arg),
            Instr::Put { op, arg } => {
                self.do_put(op, arg)?;
                Ok(Outcome::Advance)
            }
            Instr::Unify(u) => self.do_unify(u),
            Instr::Control(c) => self.do_control(c, linker, next_pc),
            Instr::Choice(c) => self.do_choice(c),
            Instr::Cut(c) => self.do_cut(c),
        }
    }

    // --- get -----------------------------------------------------------

    fn do_get(&mut self, op: Get, arg: RegId) -> Result<Outcome, EngineError> {
        match op {
            Get::VariableTemp(r) => {
                let v = self.registers.get(arg);
                self.registers.set(r, v);
                Ok(Outcome::Advance)
            }
            Get::VariableLoc(l) => {
                let v = self.registers.get(arg);
                self.set_env_slot(l, v);
                Ok(Outcome::Advance)
            }
            Get::ValueTemp(r) => self.unify_outcome(self.registers.get(arg), self.registers.get(r)),
            Get::ValueLoc(l) => {
                let slot = self.env_slot(l);
                self.unify_outcome(self.registers.get(arg), slot)
            }
            Get::Constant(name) => {
                let cell = self.heap.deref(self.registers.get(arg));
                match cell {
                    Cell::Con(n) if n == name => Ok(Outcome::Advance),
                    Cell::Ref(addr) => {
                        self.bind(addr, Cell::Con(name))?;
                        Ok(Outcome::Advance)
                    }
                    _ => Ok(Outcome::Fail),
                }
            }
            Get::Structure(functor) => {
                let cell = self.heap.deref(self.registers.get(arg));
                match cell {
                    Cell::Str(addr) if self.heap.read_functor_header(addr) == functor => {
                        self.mode = Some(Mode::Read { addr: addr + 1 });
                        Ok(Outcome::Advance)
                    }
                    Cell::Ref(var_addr) => {
                        let header_addr = self.heap.push_functor_header(functor)?;
                        self.bind(var_addr, Cell::Str(header_addr))?;
                        self.mode = Some(Mode::Write);
                        Ok(Outcome::Advance)
                    }
                    _ => Ok(Outcome::Fail),
                }
            }
            Get::List => {
                let cell = self.heap.deref(self.registers.get(arg));
                match cell {
                    Cell::Lis(addr) => {
                        self.mode = Some(Mode::Read { addr });
                        Ok(Outcome::Advance)
                    }
                    Cell::Ref(var_addr) => {
                        let pair_addr = self.heap.len();
                        self.bind(var_addr, Cell::Lis(pair_addr))?;
                        self.mode = Some(Mode::Write);
                        Ok(Outcome::Advance)
                    }
                    _ => Ok(Outcome::Fail),
                }
            }
        }
    }

    fn unify_outcome(&mut self, a: Cell, b: Cell) -> Result<Outcome, EngineError> {
        Ok(if self.unify(a, b)? { Outcome::Advance } else { Outcome::Fail })
    }

    // --- put -------------------------------------------------------------

    fn do_put(&mut self, op: Put, arg: RegId) -> Result<(), EngineError> {
        match op {
            Put::VariableLoc(l) => {
                let addr = self.new_var()?;
                self.set_env_slot(l, Cell::Ref(addr));
                self.registers.set(arg, Cell::Ref(addr));
            }
            Put::VariableTemp(r) => {
                let addr = self.new_var()?;
                self.registers.set(r, Cell::Ref(addr));
                self.registers.set(arg, Cell::Ref(addr));
            }
            Put::ValueLoc(l) => {
                let v = self.env_slot(l);
                self.registers.set(arg, v);
            }
            Put::ValueTemp(r) => {
                let v = self.registers.get(r);
                self.registers.set(arg, v);
            }
            // An "unsafe" permanent variable risks referencing a stack
            // frame that is about to vanish in the classical WAM, where a
            // Y slot can itself be the binding site. Here environments
            // grow append-only and every variable is born on the heap, so
            // the hazard never arises and this behaves exactly like
            // `ValueLoc` — the compiler still distinguishes the two to
            // keep its own safety analysis standard.
            Put::UnsafeValueLoc(l) => {
                let v = self.env_slot(l);
                self.registers.set(arg, v);
            }
            Put::Constant(name) => self.registers.set(arg, Cell::Con(name)),
            Put::Structure(functor) => {
                let header_addr = self.heap.push_functor_header(functor)?;
                self.registers.set(arg, Cell::Str(header_addr));
                self.mode = Some(Mode::Write);
            }
            Put::List => {
                let pair_addr = self.heap.len();
                self.registers.set(arg, Cell::Lis(pair_addr));
                self.mode = Some(Mode::Write);
            }
        }
        Ok(())
    }

    // --- unify (structure/list argument slots) --------------------------

    fn do_unify(&mut self, u: Unify) -> Result<Outcome, EngineError> {
        match self.mode.expect("unify instruction outside a structure/list match or build") {
            Mode::Read { addr } => self.do_unify_read(u, addr),
            Mode::Write => {
                self.do_unify_write(u)?;
                Ok(Outcome::Advance)
            }
        }
    }

    fn do_unify_read(&mut self, u: Unify, addr: u32) -> Result<Outcome, EngineError> {
        let outcome = match u {
            Unify::Void { count } => {
                self.mode = Some(Mode::Read { addr: addr + u32::from(count) });
                return Ok(Outcome::Advance);
            }
            Unify::VariableTemp(r) => {
                let v = self.heap.read_cell(addr);
                self.registers.set(r, v);
                Outcome::Advance
            }
            Unify::VariableLoc(l) => {
                let v = self.heap.read_cell(addr);
                self.set_env_slot(l, v);
                Outcome::Advance
            }
            Unify::ValueTemp(r) | Unify::LocalValueTemp(r) => {
                let cell = self.heap.read_cell(addr);
                let reg = self.registers.get(r);
                self.unify_outcome(cell, reg)?
            }
            Unify::ValueLoc(l) | Unify::LocalValueLoc(l) => {
                let cell = self.heap.read_cell(addr);
                let slot = self.env_slot(l);
                self.unify_outcome(cell, slot)?
            }
            Unify::Constant(name) => match self.heap.deref(self.heap.read_cell(addr)) {
                Cell::Con(n) if n == name => Outcome::Advance,
                Cell::Ref(a) => {
                    self.bind(a, Cell::Con(name))?;
                    Outcome::Advance
                }
                _ => Outcome::Fail,
            },
        };
        self.mode = Some(Mode::Read { addr: addr + 1 });
        Ok(outcome)
    }

    fn do_unify_write(&mut self, u: Unify) -> Result<(), EngineError> {
        match u {
            Unify::Void { count } => {
                for _ in 0..count {
                    self.new_var()?;
                }
            }
            Unify::VariableTemp(r) => {
                let addr = self.new_var()?;
                self.registers.set(r, Cell::Ref(addr));
            }
            Unify::VariableLoc(l) => {
                let addr = self.new_var()?;
                self.set_env_slot(l, Cell::Ref(addr));
            }
            Unify::ValueTemp(r) | Unify::LocalValueTemp(r) => {
                let v = self.registers.get(r);
                self.heap.push_cell(v)?;
            }
            Unify::ValueLoc(l) | Unify::LocalValueLoc(l) => {
                let v = self.env_slot(l);
                self.heap.push_cell(v)?;
            }
            Unify::Constant(name) => {
                self.heap.push_cell(Cell::Con(name))?;
            }
        }
        Ok(())
    }

    // --- control ---------------------------------------------------------

    fn do_control(&mut self, c: Control, linker: &Linker, next_pc: u32) -> Result<Outcome, EngineError> {
        match c {
            Control::Call { callee, nvars } => {
                self.trim_environment(nvars);
                self.dispatch_call(linker, callee, Some(next_pc))
            }
            Control::Execute { callee } => self.dispatch_call(linker, callee, None),
            Control::MetaCall { arg, nvars } => {
                self.trim_environment(nvars);
                let Some(functor) = self.callable_functor(arg) else { return Ok(Outcome::Fail) };
                self.dispatch_call(linker, functor, Some(next_pc))
            }
            Control::Proceed => Ok(Outcome::Proceed),
            Control::Allocate { nvars } => {
                let slots = vec![Cell::Ref(0); nvars as usize];
                let cont = Continuation { pc: self.cp, env: self.ce };
                let idx = self.stack.push_environment(slots, cont)?;
                self.ce = Some(idx);
                Ok(Outcome::Advance)
            }
            Control::Deallocate => {
                let idx = self.ce.expect("deallocate with no active environment");
                let cont = self.stack.environment(idx).cont;
                self.cp = cont.pc;
                self.ce = cont.env;
                Ok(Outcome::Advance)
            }
            Control::Fail => Ok(Outcome::Fail),
            Control::Continue { target } => Ok(Outcome::Jump(target)),
        }
    }

    /// Resolve `callee` against the call table and jump to it. `next_pc`
    /// is `Some` for a call that expects to be returned to (`Call`,
    /// `MetaCall`) and `None` for a tail call (`Execute`), which inherits
    /// the current continuation unchanged.
    fn dispatch_call(&mut self, linker: &Linker, callee: FunctorId, next_pc: Option<u32>) -> Result<Outcome, EngineError> {
        let target = linker.lookup(callee).ok_or(EngineError::UndefinedProcedure { functor: callee })?;
        if let Some(next_pc) = next_pc {
            self.cp = Label::new(next_pc);
        }
        self.cut_parent = self.stack.choice_depth();
        Ok(Outcome::Jump(target))
    }

    /// Shrink the current environment to `nvars` slots — the permanent
    /// variables the compiler determined are still live past this call.
    /// Slots beyond that are dead by construction (no later instruction
    /// in this clause addresses them), so dropping them now is safe and
    /// frees their heap references immediately rather than waiting for
    /// the whole frame to deallocate. A no-op when no environment is
    /// active, or when `nvars` is [`warren_codec::NO_TRIM`]: a chain-rule
    /// clause compiles its calls with that sentinel because it never
    /// allocated its own frame, so `self.ce` here still names its
    /// caller's environment, which this call must not touch.
    fn trim_environment(&mut self, nvars: u8) {
        if nvars == warren_codec::NO_TRIM {
            return;
        }
        let Some(idx) = self.ce else { return };
        let slots = &mut self.stack.environment_mut(idx).slots;
        let nvars = nvars as usize;
        if nvars < slots.len() {
            slots.truncate(nvars);
        }
    }

    /// Resolve the callable term in `arg` to the functor it denotes,
    /// loading its arguments into registers `X1..Xn` first — `call/1`'s
    /// argument may be a bare atom or a fully-built structure.
    fn callable_functor(&mut self, arg: RegId) -> Option<FunctorId> {
        match self.heap.deref(self.registers.get(arg)) {
            Cell::Con(name) => FunctorName::new(name, 0).pack(),
            Cell::Str(addr) => {
                let functor = self.heap.read_functor_header(addr);
                for i in 0..u32::from(functor.arity()) {
                    let cell = self.heap.read_cell(addr + 1 + i);
                    self.registers.set(RegId::new((i + 1) as u8), cell);
                }
                Some(functor)
            }
            _ => None,
        }
    }

    // --- choice ------------------------------------------------------------

    fn do_choice(&mut self, c: Choice) -> Result<Outcome, EngineError> {
        match c {
            Choice::TryMeElse { retry } => {
                self.push_choice_point(retry)?;
                Ok(Outcome::Advance)
            }
            Choice::RetryMeElse { retry } => {
                if let Some(top) = self.stack.top_choice_mut() {
                    top.retry = retry;
                }
                Ok(Outcome::Advance)
            }
            Choice::TrustMe => {
                self.stack.pop_choice();
                Ok(Outcome::Advance)
            }
            Choice::Try { clause } => {
                self.push_choice_point(clause)?;
                Ok(Outcome::Jump(clause))
            }
            Choice::Retry { clause } => {
                if let Some(top) = self.stack.top_choice_mut() {
                    top.retry = clause;
                }
                Ok(Outcome::Jump(clause))
            }
            Choice::Trust { clause } => {
                self.stack.pop_choice();
                Ok(Outcome::Jump(clause))
            }
            Choice::SwitchOnTerm { on_var, on_const, on_list, on_struct } => {
                let target = match self.heap.deref(self.registers.get(RegId::new(1))) {
                    Cell::Ref(_) => on_var,
                    Cell::Con(_) => on_const,
                    Cell::Lis(_) => on_list,
                    Cell::Str(_) => on_struct,
                };
                Ok(Outcome::Jump(target))
            }
            // Hash-keyed dispatch tables aren't modeled; this compiler
            // never emits these, always falling back to the linear
            // try/retry/trust chain for first-argument selection.
            Choice::SwitchOnConstant { .. } | Choice::SwitchOnStructure { .. } => Ok(Outcome::Fail),
        }
    }

    fn push_choice_point(&mut self, retry: Label) -> Result<(), EngineError> {
        let cp = ChoicePoint {
            retry,
            saved_args: self.registers.snapshot(),
            cont: Continuation { pc: self.cp, env: self.ce },
            heap_mark: self.heap.len(),
            trail_mark: self.trail.len(),
        };
        self.stack.push_choice(cp)?;
        Ok(())
    }

    // --- cut -----------------------------------------------------------

    fn do_cut(&mut self, c: Cut) -> Result<Outcome, EngineError> {
        match c {
            Cut::GetLevelLoc(l) => {
                self.set_env_slot(l, Cell::Ref(self.cut_parent));
                Ok(Outcome::Advance)
            }
            Cut::NeckCut => {
                self.cut_to(self.cut_parent);
                Ok(Outcome::Advance)
            }
            Cut::CutLoc(l) => {
                let Cell::Ref(depth) = self.env_slot(l) else {
                    unreachable!("cut barrier slot always holds a captured choice-point depth")
                };
                self.cut_to(depth);
                Ok(Outcome::Advance)
            }
        }
    }

    /// Discard every choice point more recent than `depth`, then tidy the
    /// trail to match: any entry addressing heap at or past the surviving
    /// top choice point's `heap_mark` is compacted away, since a future
    /// backtrack to that choice point truncates the heap past it anyway.
    fn cut_to(&mut self, depth: u32) {
        self.stack.cut_to(depth);
        let hb = self.stack.top_choice().map_or(0, |cp| cp.heap_mark);
        self.trail.tidy(hb);
    }

    // --- shared helpers --------------------------------------------------

    fn env_slot(&self, l: LocId) -> Cell {
        let idx = self.ce.expect("permanent variable access with no active environment");
        self.stack.environment(idx).slots[l.as_u8() as usize]
    }

    fn set_env_slot(&mut self, l: LocId, value: Cell) {
        let idx = self.ce.expect("permanent variable access with no active environment");
        self.stack.environment_mut(idx).slots[l.as_u8() as usize] = value;
    }

    /// Allocate a fresh, unbound variable cell on the heap.
    fn new_var(&mut self) -> Result<u32, EngineError> {
        let addr = self.heap.push_raw(0)?;
        self.heap.write_cell(addr, Cell::unbound_var(addr));
        Ok(addr)
    }

    /// Bind `addr` to `value`, trailing it first if the binding predates
    /// the most recent choice point.
    fn bind(&mut self, addr: u32, value: Cell) -> Result<(), EngineError> {
        let boundary = self.stack.top_choice().map_or(0, |cp| cp.heap_mark);
        if Trail::needs_trailing(addr, boundary) {
            self.trail.push(addr)?;
        }
        self.heap.write_cell(addr, value);
        Ok(())
    }

    /// Recursively unify two (possibly unbound) cells.
    fn unify(&mut self, a: Cell, b: Cell) -> Result<bool, EngineError> {
        let a = self.heap.deref(a);
        let b = self.heap.deref(b);
        match (a, b) {
            (Cell::Ref(x), Cell::Ref(y)) if x == y => Ok(true),
            (Cell::Ref(x), Cell::Ref(y)) => {
                let (keep, other) = if x <= y { (x, y) } else { (y, x) };
                self.bind(other, Cell::Ref(keep))?;
                Ok(true)
            }
            (Cell::Ref(addr), other) | (other, Cell::Ref(addr)) => {
                self.bind(addr, other)?;
                Ok(true)
            }
            (Cell::Con(x), Cell::Con(y)) => Ok(x == y),
            (Cell::Str(sa), Cell::Str(sb)) => {
                let fa = self.heap.read_functor_header(sa);
                let fb = self.heap.read_functor_header(sb);
                if fa != fb {
                    return Ok(false);
                }
                for i in 0..u32::from(fa.arity()) {
                    let ca = self.heap.read_cell(sa + 1 + i);
                    let cb = self.heap.read_cell(sb + 1 + i);
                    if !self.unify(ca, cb)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Cell::Lis(la), Cell::Lis(lb)) => {
                let car_a = self.heap.read_cell(la);
                let car_b = self.heap.read_cell(lb);
                if !self.unify(car_a, car_b)? {
                    return Ok(false);
                }
                let cdr_a = self.heap.read_cell(la + 1);
                let cdr_b = self.heap.read_cell(lb + 1);
                self.unify(cdr_a, cdr_b)
            }
            _ => Ok(false),
        }
    }

    fn backtrack(&mut self) -> Result<bool, EngineError> {
        let Some(cp) = self.stack.top_choice().cloned() else { return Ok(false) };
        self.trail.undo_to(cp.trail_mark, &mut self.heap);
        self.heap.truncate(cp.heap_mark);
        self.registers.restore(&cp.saved_args);
        self.cp = cp.cont.pc;
        self.ce = cp.cont.env;
        self.pc = cp.retry.as_u32();
        Ok(true)
    }
}
