// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;
use proptest::prelude::*;

fn sample_instrs() -> Vec<Instr> {
    vec![
        Instr::Get { op: Get::VariableTemp(RegId::new(1)), arg: RegId::new(0) },
        Instr::Get { op: Get::Structure(FunctorId::from_raw(0x0103)), arg: RegId::new(1) },
        Instr::Put { op: Put::Constant(NameId::new(9)), arg: RegId::new(2) },
        Instr::Put { op: Put::UnsafeValueLoc(LocId::new(1)), arg: RegId::new(0) },
        Instr::Unify(Unify::Void { count: 3 }),
        Instr::Unify(Unify::LocalValueTemp(RegId::new(2))),
        Instr::Control(Control::Call { callee: FunctorId::from_raw(0x0201), nvars: 4 }),
        Instr::Control(Control::MetaCall { arg: RegId::new(0), nvars: 0 }),
        Instr::Control(Control::Allocate { nvars: 300 }),
        Instr::Control(Control::Proceed),
        Instr::Control(Control::Fail),
        Instr::Control(Control::Continue { target: Label::new(7) }),
        Instr::Choice(Choice::TryMeElse { retry: Label::new(42) }),
        Instr::Choice(Choice::SwitchOnTerm {
            on_var: Label::new(1),
            on_const: Label::new(2),
            on_list: Label::new(3),
            on_struct: Label::new(4),
        }),
        Instr::Cut(Cut::GetLevelLoc(LocId::new(0))),
        Instr::Cut(Cut::NeckCut),
    ]
}

#[test]
fn every_sample_instruction_round_trips() {
    for instr in sample_instrs() {
        let bytes = encode_one(&instr);
        let (decoded, consumed) = decode_one(&bytes, 0).unwrap();
        assert_eq!(decoded, instr);
        assert_eq!(consumed, bytes.len());
    }
}

#[test]
fn code_buffer_decodes_sequentially() {
    let mut code = Code::new();
    let instrs = sample_instrs();
    let mut offsets = Vec::new();
    for instr in &instrs {
        offsets.push(code.emit(*instr));
    }
    for (instr, offset) in instrs.iter().zip(offsets) {
        let (decoded, _next) = code.decode_at(offset).unwrap();
        assert_eq!(&decoded, instr);
    }
}

#[test]
fn truncated_operand_is_unexpected_eof() {
    let bytes = encode_one(&Instr::Control(Control::Call {
        callee: FunctorId::from_raw(1),
        nvars: 1,
    }));
    let truncated = &bytes[..bytes.len() - 1];
    assert!(matches!(decode_one(truncated, 0), Err(CodecError::UnexpectedEof { .. })));
}

#[test]
fn unknown_opcode_is_rejected() {
    let bytes = [0xFFu8];
    assert!(matches!(
        decode_one(&bytes, 0),
        Err(CodecError::UnknownOpcode { opcode: 0xFF, offset: 0 })
    ));
}

proptest! {
    #[test]
    fn allocate_nvars_round_trips(nvars in 0u16..=u16::MAX) {
        let instr = Instr::Control(Control::Allocate { nvars });
        let bytes = encode_one(&instr);
        let (decoded, _) = decode_one(&bytes, 0).unwrap();
        prop_assert_eq!(decoded, instr);
    }

    #[test]
    fn functor_id_round_trips_through_get_structure(raw in any::<u32>()) {
        let instr = Instr::Get { op: Get::Structure(FunctorId::from_raw(raw)), arg: RegId::new(0) };
        let bytes = encode_one(&instr);
        let (decoded, _) = decode_one(&bytes, 0).unwrap();
        prop_assert_eq!(decoded, instr);
    }
}
