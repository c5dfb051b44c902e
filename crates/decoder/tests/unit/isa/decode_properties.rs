//! # Instruction Decode Properties
//!
//! Whole-instruction behavior of the decoder: operand lists, consumed sizes,
//! failure sizes and forward progress over a byte stream.

use gfxdis_core::common::{DecodeStatus, RegClass, Register};
use gfxdis_core::isa::instruction::{BitField, Opcode, Operand};
use gfxdis_core::isa::metadata::{InstrDesc, InstrFlags, MetadataTable, OperandInfo, OperandName, OperandType};
use gfxdis_core::isa::table::{DecoderTables, FieldDecoder, SrcSpec, TableId};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::builder::tables::{VOP1_MOV, V_MOV_B32, le_bytes, tagged_entry, vop1, vop1_desc, vop1_entry};
use crate::common::harness::TestDecoder;

fn mov_decoder(preset: &str) -> TestDecoder {
    let tables = DecoderTables::new().with_table(TableId::Gfx9W32, vec![vop1_entry(V_MOV_B32, VOP1_MOV)]);
    let info = MetadataTable::new().with_desc(V_MOV_B32, vop1_desc("v_mov_b32"));
    TestDecoder::new(preset, tables, info)
}

fn v(index: u16) -> Operand {
    Operand::Register(Register::Vgpr { index, dwords: 1 })
}

/// A register move decodes to its two operands in four bytes.
#[test]
fn register_move() {
    let out = mov_decoder("gfx900").decode(&le_bytes(&[vop1(VOP1_MOV, 1, 256 + 2)]));
    assert_eq!(out.status, DecodeStatus::Success);
    assert_eq!(out.size, 4);
    assert!(out.comments.is_empty());
    let inst = out.instruction.unwrap();
    assert_eq!(inst.opcode, V_MOV_B32);
    assert_eq!(inst.operands, vec![v(1), v(2)]);
}

/// A literal source extends the instruction to eight bytes.
#[test]
fn literal_source_extends_size() {
    let bytes = le_bytes(&[vop1(VOP1_MOV, 3, 255), 0x4049_0FDB, vop1(VOP1_MOV, 0, 256)]);
    let out = mov_decoder("gfx900").decode(&bytes);
    assert_eq!(out.status, DecodeStatus::Success);
    assert_eq!(out.size, 8);
    assert_eq!(
        out.instruction.unwrap().operands,
        vec![v(3), Operand::Immediate(0x4049_0FDB)]
    );
}

/// A literal missing from the window fails the instruction.
#[test]
fn truncated_literal_fails() {
    let bytes = le_bytes(&[vop1(VOP1_MOV, 3, 255)]);
    let out = mov_decoder("gfx900").decode(&bytes);
    assert_eq!(out.status, DecodeStatus::Fail);
    assert_eq!(out.size, 4);
}

/// Empty input consumes nothing.
#[test]
fn empty_input() {
    let out = mov_decoder("gfx900").decode(&[]);
    assert_eq!(out.status, DecodeStatus::Fail);
    assert_eq!(out.size, 0);
}

/// `decode_all` steps over undecodable words and tracks addresses.
#[test]
fn decode_all_makes_progress() {
    let dec = mov_decoder("gfx900");
    let mut bytes = le_bytes(&[vop1(VOP1_MOV, 1, 256 + 2), 0xFFFF_FFFF, vop1(VOP1_MOV, 4, 128)]);
    bytes.extend_from_slice(&[0xAB, 0xCD]);

    let outcomes = dec.disasm.decode_all(&bytes, 0x1000, None);
    let summary: Vec<_> = outcomes.iter().map(|o| (o.address, o.status, o.size)).collect();
    assert_eq!(
        summary,
        vec![
            (0x1000, DecodeStatus::Success, 4),
            (0x1004, DecodeStatus::Fail, 4),
            (0x1008, DecodeStatus::Success, 4),
            (0x100C, DecodeStatus::Fail, 2),
        ]
    );
    assert_eq!(
        outcomes[2].instruction.as_ref().unwrap().operands,
        vec![v(4), Operand::Immediate(0)]
    );
}

const FMAAK: Opcode = Opcode(70);

/// `v_fmaak`-style instruction: a deferred source and a constant field.
fn fmaak_decoder(with_kimm: bool) -> TestDecoder {
    let mut fields = vec![
        (BitField::new(8, 8), FieldDecoder::Reg(RegClass::VGPR_32)),
        (BitField::new(16, 9), FieldDecoder::Src(SrcSpec::new(32, 32).deferred())),
    ];
    let table = if with_kimm {
        fields.push((BitField::new(32, 32), FieldDecoder::KImm));
        TableId::Gfx9W64
    } else {
        TableId::Gfx9W32
    };
    let schema = vec![
        OperandInfo::reg(OperandName::Vdst, RegClass::VGPR_32),
        OperandInfo::src(OperandName::Src0).with_type(OperandType::DeferredFp32),
        OperandInfo::imm(OperandName::Imm),
    ];

    let tables = DecoderTables::new().with_table(table, vec![tagged_entry(FMAAK, 0x42, &fields)]);
    let info = MetadataTable::new().with_desc(FMAAK, InstrDesc::new("v_fmaak_f32", InstrFlags::VOP3, schema));
    TestDecoder::new("gfx900", tables, info)
}

/// The constant field fills every deferred source slot.
#[test]
fn deferred_literal_spliced() {
    let word = 0x42u64 | 1 << 8 | 255 << 16 | 0x4049_0FDBu64 << 32;
    let out = fmaak_decoder(true).decode(&word.to_le_bytes());
    assert_eq!(out.status, DecodeStatus::Success);
    assert_eq!(out.size, 8);
    assert_eq!(
        out.instruction.unwrap().operands,
        vec![v(1), Operand::Immediate(0x4049_0FDB), Operand::Immediate(0x4049_0FDB)]
    );
}

/// A deferred source with no literal is rejected with an error comment.
#[test]
fn deferred_literal_missing() {
    let word = 0x42u32 | 1 << 8 | 255 << 16;
    let out = fmaak_decoder(false).decode(&word.to_le_bytes());
    assert_eq!(out.status, DecodeStatus::Fail);
    assert_eq!(out.size, 4);
    assert_eq!(out.comments, vec!["Error: deferred immediate without a decoded literal".to_owned()]);
}

const IMAGE_SAMPLE_NSA: Opcode = Opcode(90);

/// A gfx10 NSA image sample: `vdata, vaddr0, vaddr1..vaddr5, srsrc, dmask`.
///
/// The 64-bit word carries vdata, vaddr0, srsrc and dmask; the other five
/// address registers follow as one byte each.
fn nsa_decoder() -> TestDecoder {
    let vgpr = FieldDecoder::Reg(RegClass::VGPR_32);
    let tables = DecoderTables::new().with_table(
        TableId::Gfx10W64,
        vec![tagged_entry(
            IMAGE_SAMPLE_NSA,
            0x30,
            &[
                (BitField::new(8, 8), vgpr),
                (BitField::new(16, 8), vgpr),
                (BitField::new(24, 8), FieldDecoder::Reg(RegClass::SGPR_128)),
                (BitField::new(32, 4), FieldDecoder::Imm { signed: false }),
            ],
        )],
    );
    let mut operands = vec![
        OperandInfo::reg(OperandName::Vdata, RegClass::VGPR_32),
        OperandInfo::reg(OperandName::Vaddr0, RegClass::VGPR_32),
    ];
    for name in ["vaddr1", "vaddr2", "vaddr3", "vaddr4", "vaddr5"] {
        operands.push(OperandInfo::reg(OperandName::Other(name), RegClass::VGPR_32));
    }
    operands.push(OperandInfo::reg(OperandName::Srsrc, RegClass::SGPR_128));
    operands.push(OperandInfo::imm(OperandName::Dmask));
    let info = MetadataTable::new().with_desc(
        IMAGE_SAMPLE_NSA,
        InstrDesc::new("image_sample_nsa", InstrFlags::MIMG, operands),
    );
    TestDecoder::new("gfx1030", tables, info)
}

/// `image_sample v0, [v9, a...], s[0:3] dmask:0x1` followed by its address bytes.
fn nsa_bytes(addresses: [u8; 8]) -> Vec<u8> {
    let word = 0x30u64 | 9 << 16 | 1 << 32;
    let mut bytes = word.to_le_bytes().to_vec();
    bytes.extend_from_slice(&addresses);
    bytes
}

/// The NSA address bytes complete the operand list and count toward the size.
#[test]
fn nsa_addresses_decoded() {
    let dec = nsa_decoder();
    let out = dec.decode(&nsa_bytes([10, 11, 12, 13, 14, 0, 0, 0]));
    assert_eq!(out.status, DecodeStatus::Success);
    assert_eq!(out.size, 16);
    let inst = out.instruction.unwrap();
    let desc = dec.disasm.info().desc(IMAGE_SAMPLE_NSA).unwrap();
    assert_eq!(inst.len(), desc.num_operands());
    assert_eq!(
        inst.operands,
        vec![
            v(0),
            v(9),
            v(10),
            v(11),
            v(12),
            v(13),
            v(14),
            Operand::Register(Register::Sgpr { index: 0, dwords: 4 }),
            Operand::Immediate(1),
        ]
    );
}

/// One byte short of the padded address block fails the whole instruction.
#[test]
fn nsa_addresses_short() {
    let mut bytes = nsa_bytes([10, 11, 12, 13, 14, 0, 0, 0]);
    let _ = bytes.pop();
    let out = nsa_decoder().decode(&bytes);
    assert_eq!(out.status, DecodeStatus::Fail);
    assert_eq!(out.size, 4);
    assert!(out.instruction.is_none());
    assert_eq!(out.comments, vec!["Error: NSA address bytes truncated: need 8, have 7".to_owned()]);
}

/// Warnings from operand decoding reach the caller.
#[test]
fn warnings_are_returned() {
    let tables = DecoderTables::new().with_table(
        TableId::Gfx9W32,
        vec![tagged_entry(
            Opcode(80),
            0x11,
            &[(BitField::new(8, 9), FieldDecoder::Src(SrcSpec::new(64, 64)))],
        )],
    );
    let dec = TestDecoder::new("gfx900", tables, MetadataTable::new());
    let word = 0x11u32 | 3 << 8;
    let out = dec.decode(&word.to_le_bytes());
    assert_eq!(out.status, DecodeStatus::Success);
    assert_eq!(out.comments, vec!["Warning: SGPR_64: scalar reg isn't aligned 3".to_owned()]);
    assert_eq!(
        out.instruction.unwrap().operands,
        vec![Operand::Register(Register::Sgpr { index: 2, dwords: 2 })]
    );
}

proptest! {
    /// With no tables every input fails and consumes `min(4, len)` bytes.
    #[test]
    fn unmatched_input_fail_size(bytes in proptest::collection::vec(any::<u8>(), 1..32)) {
        let dec = TestDecoder::new("gfx1100", DecoderTables::new(), MetadataTable::new());
        let out = dec.decode(&bytes);
        prop_assert_eq!(out.status, DecodeStatus::Fail);
        prop_assert_eq!(out.size, bytes.len().min(4));
        prop_assert!(out.instruction.is_none());
    }

    /// `decode_all` always terminates and covers the input exactly.
    #[test]
    fn decode_all_covers_input(words in proptest::collection::vec(any::<u32>(), 0..16), tail in 0usize..4) {
        let dec = mov_decoder("gfx900");
        let mut bytes = le_bytes(&words);
        bytes.extend(std::iter::repeat_n(0u8, tail));
        let outcomes = dec.disasm.decode_all(&bytes, 0, None);
        let total: usize = outcomes.iter().map(|o| o.size).sum();
        prop_assert_eq!(total, bytes.len());
        prop_assert!(outcomes.iter().all(|o| o.size > 0));
    }

    /// Every successful decode carries exactly its schema's operands.
    #[test]
    fn success_matches_schema(
        word in any::<u32>(),
        vdata in any::<u8>(),
        vaddr0 in any::<u8>(),
        addresses in proptest::array::uniform8(any::<u8>()),
    ) {
        let mov = mov_decoder("gfx900");
        let nsa = nsa_decoder();
        let image = u64::from(0x30u8)
            | u64::from(vdata) << 8
            | u64::from(vaddr0) << 16
            | u64::from(word & 0xF) << 32;
        let mut image_bytes = image.to_le_bytes().to_vec();
        image_bytes.extend_from_slice(&addresses);

        for (dec, bytes) in [(&mov, word.to_le_bytes().to_vec()), (&nsa, image_bytes)] {
            let out = dec.decode(&bytes);
            if out.status == DecodeStatus::Success {
                let inst = out.instruction.unwrap();
                let desc = dec.disasm.info().desc(inst.opcode).unwrap();
                prop_assert_eq!(inst.len(), desc.num_operands());
            }
        }
    }
}
