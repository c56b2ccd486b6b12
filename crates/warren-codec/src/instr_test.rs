// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;
use crate::codec::encode_one;

#[test]
fn byte_len_matches_the_actual_encoding_for_every_group() {
    let instrs = [
        Instr::Get { op: Get::Constant(NameId::new(1)), arg: RegId::new(0) },
        Instr::Get { op: Get::List, arg: RegId::new(0) },
        Instr::Put { op: Put::Structure(FunctorId::from_raw(0x0203)), arg: RegId::new(1) },
        Instr::Unify(Unify::Void { count: 2 }),
        Instr::Unify(Unify::Constant(NameId::new(7))),
        Instr::Control(Control::Call { callee: FunctorId::from_raw(0x0102), nvars: 2 }),
        Instr::Control(Control::Proceed),
        Instr::Control(Control::Allocate { nvars: 3 }),
        Instr::Choice(Choice::TryMeElse { retry: Label::new(0) }),
        Instr::Choice(Choice::SwitchOnTerm { on_var: Label::new(1), on_const: Label::new(2), on_list: Label::new(3), on_struct: Label::new(4) }),
        Instr::Cut(Cut::NeckCut),
        Instr::Cut(Cut::GetLevelLoc(LocId::new(0))),
    ];
    for instr in instrs {
        assert_eq!(instr.byte_len(), encode_one(&instr).len(), "{instr:?}");
    }
}

#[test]
fn get_carries_its_argument_register() {
    let instr = Instr::Get { op: Get::VariableTemp(RegId::new(1)), arg: RegId::new(0) };
    match instr {
        Instr::Get { arg, .. } => assert_eq!(arg, RegId::new(0)),
        _ => panic!("expected Get"),
    }
}

#[test]
fn control_call_carries_continuation_size() {
    let instr = Control::Call { callee: FunctorId::from_raw(0x0102), nvars: 2 };
    match instr {
        Control::Call { nvars, .. } => assert_eq!(nvars, 2),
        _ => panic!("expected Call"),
    }
}

#[test]
fn choice_switch_on_term_carries_four_targets() {
    let choice = Choice::SwitchOnTerm {
        on_var: Label::new(1),
        on_const: Label::new(2),
        on_list: Label::new(3),
        on_struct: Label::new(4),
    };
    assert_eq!(
        choice,
        Choice::SwitchOnTerm {
            on_var: Label::new(1),
            on_const: Label::new(2),
            on_list: Label::new(3),
            on_struct: Label::new(4),
        }
    );
}
