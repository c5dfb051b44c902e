//! # Operand Decoding Tests
//!
//! Covers the general source space (VGPR, AGPR, SGPR, TTMP, inline constants,
//! literals and named registers) and the specialized field decoders, across
//! the generations where their ranges differ.

use gfxdis_core::common::error::DecodeError;
use gfxdis_core::common::{RegisterFile, Register, SpecialRegister};
use gfxdis_core::config::Target;
use gfxdis_core::isa::context::DecodeContext;
use gfxdis_core::isa::instruction::Operand;
use gfxdis_core::isa::operand::{OperandDecoder, OperandResult};
use gfxdis_core::isa::table::SrcSpec;
use mockall::predicate::eq;
use proptest::prelude::*;
use rstest::rstest;

use crate::common::harness::target;
use crate::common::mocks::symbolizer::MockBranchSymbolizer;

const S32: SrcSpec = SrcSpec::new(32, 32);

/// Decode one source value with no trailing bytes.
fn src(preset: &str, spec: SrcSpec, val: u32) -> OperandResult {
    let target = target(preset);
    let regs = RegisterFile::new();
    let ops = OperandDecoder::new(&target, &regs);
    let mut ctx = DecodeContext::new(&[], 0, None);
    ops.src(&mut ctx, spec, val)
}

fn reg(r: Register) -> OperandResult {
    Ok(Operand::Register(r))
}

fn special(r: SpecialRegister) -> OperandResult {
    reg(Register::Special(r))
}

/// Inline integers cover 0..=64 and -1..=-16.
#[rstest]
#[case(128, 0)]
#[case(129, 1)]
#[case(192, 64)]
#[case(193, -1)]
#[case(208, -16)]
fn inline_integers(#[case] val: u32, #[case] value: i64) {
    assert_eq!(OperandDecoder::int_imm(val), value);
    assert_eq!(src("gfx900", S32, val), Ok(Operand::Immediate(value)));
}

/// Inline floats are returned as bit patterns of the operand's width.
#[rstest]
#[case(16, 242, 0x3C00)]
#[case(32, 242, 0x3F80_0000)]
#[case(0, 243, 0xBF80_0000)]
#[case(64, 240, 0x3FE0_0000_0000_0000)]
#[case(32, 248, 0x3E22_F983)]
fn inline_floats(#[case] width: u16, #[case] val: u32, #[case] bits: i64) {
    assert_eq!(OperandDecoder::fp_imm(width, val), Ok(bits));
}

/// An inline float of an unsupported width is an error.
#[test]
fn inline_float_bad_width() {
    assert_eq!(OperandDecoder::fp_imm(8, 240), Err(DecodeError::UnsupportedWidth(8)));
}

/// Bit 8 selects the VGPR file; bit 9 selects AGPRs.
#[test]
fn vector_registers() {
    assert_eq!(src("gfx900", S32, 256 + 7), reg(Register::Vgpr { index: 7, dwords: 1 }));
    assert_eq!(
        src("gfx900", SrcSpec::new(64, 64), 256 + 7),
        reg(Register::Vgpr { index: 7, dwords: 2 })
    );
    assert_eq!(src("gfx90a", S32, 512 + 256 + 3), reg(Register::Agpr { index: 3, dwords: 1 }));
    assert_eq!(
        src("gfx900", S32.forcing(256), 12),
        reg(Register::Vgpr { index: 12, dwords: 1 })
    );
}

/// SGPR range ends at 101 before GFX10 and at 105 from GFX10.
#[test]
fn sgpr_limit_depends_on_generation() {
    assert_eq!(src("gfx900", S32, 101), reg(Register::Sgpr { index: 101, dwords: 1 }));
    assert_eq!(src("gfx900", S32, 102), special(SpecialRegister::FlatScratchLo));
    assert_eq!(src("gfx1030", S32, 102), reg(Register::Sgpr { index: 102, dwords: 1 }));
    assert_eq!(src("gfx1030", S32, 106), special(SpecialRegister::VccLo));
}

/// A misaligned scalar tuple rounds down and leaves a warning.
#[test]
fn misaligned_sgpr_pair_warns() {
    let target = target("gfx900");
    let regs = RegisterFile::new();
    let ops = OperandDecoder::new(&target, &regs);
    let mut ctx = DecodeContext::new(&[], 0, None);

    let op = ops.src(&mut ctx, SrcSpec::new(64, 64), 5);
    assert_eq!(op, reg(Register::Sgpr { index: 4, dwords: 2 }));
    assert_eq!(ctx.comments(), ["Warning: SGPR_64: scalar reg isn't aligned 5"]);

    let _ = ops.src(&mut ctx, SrcSpec::new(64, 64), 6);
    assert_eq!(ctx.comments().len(), 1);
}

/// TTMPs start at 112 on GFX8 and at 108 from GFX9.
#[test]
fn ttmp_range_by_generation() {
    assert_eq!(src("gfx900", S32, 108), reg(Register::Ttmp { index: 0, dwords: 1 }));
    assert_eq!(src("gfx803", S32, 108), special(SpecialRegister::TbaLo));
    assert_eq!(src("gfx803", S32, 112), reg(Register::Ttmp { index: 0, dwords: 1 }));
    assert_eq!(src("gfx900", S32, 123), reg(Register::Ttmp { index: 15, dwords: 1 }));
}

/// `m0` and `null` swap encodings on GFX11.
#[rstest]
#[case("gfx1030", 124, SpecialRegister::M0)]
#[case("gfx1030", 125, SpecialRegister::Null)]
#[case("gfx1100", 124, SpecialRegister::Null)]
#[case("gfx1100", 125, SpecialRegister::M0)]
fn m0_null_swap(#[case] preset: &str, #[case] val: u32, #[case] expected: SpecialRegister) {
    assert_eq!(src(preset, S32, val), special(expected));
}

/// 64-bit named registers.
#[test]
fn special_registers_64() {
    let spec = SrcSpec::new(64, 64);
    assert_eq!(src("gfx900", spec, 106), special(SpecialRegister::Vcc));
    assert_eq!(src("gfx900", spec, 126), special(SpecialRegister::Exec));
    assert_eq!(src("gfx900", spec, 235), special(SpecialRegister::SharedBase));
    assert_eq!(src("gfx900", spec, 124), Err(DecodeError::UnknownOperandEncoding(124)));
}

/// Unassigned values and unsupported widths are errors.
#[test]
fn unknown_encodings() {
    assert_eq!(src("gfx900", S32, 209), Err(DecodeError::UnknownOperandEncoding(209)));
    assert_eq!(
        src("gfx900", SrcSpec::new(128, 0), 106),
        Err(DecodeError::UnsupportedWidth(128))
    );
}

/// The literal is read once per attempt and shared by later references.
#[test]
fn literal_read_once() {
    let target = target("gfx900");
    let regs = RegisterFile::new();
    let ops = OperandDecoder::new(&target, &regs);
    let bytes = [0x78, 0x56, 0x34, 0x12, 0xFF, 0xFF, 0xFF, 0xFF];
    let mut ctx = DecodeContext::new(&bytes, 0, None);

    assert_eq!(ops.src(&mut ctx, S32, 255), Ok(Operand::Immediate(0x1234_5678)));
    assert_eq!(ctx.cursor.consumed(), 4);
    assert_eq!(ops.src(&mut ctx, S32, 255), Ok(Operand::Immediate(0x1234_5678)));
    assert_eq!(ctx.cursor.consumed(), 4);
}

/// A 64-bit floating-point literal lands in the high half.
#[test]
fn fp64_literal_high_half() {
    let target = target("gfx900");
    let regs = RegisterFile::new();
    let ops = OperandDecoder::new(&target, &regs);
    let bytes = 0x4009_21FBu32.to_le_bytes();
    let mut ctx = DecodeContext::new(&bytes, 0, None);

    let op = ops.src(&mut ctx, SrcSpec::new(64, 64).fp(), 255);
    assert_eq!(op, Ok(Operand::Immediate(0x4009_21FB_0000_0000)));
    assert_eq!(ctx.literal().map(|lit| lit.value), Some(0x4009_21FB));
}

/// Fewer than four trailing bytes cannot hold a literal.
#[test]
fn truncated_literal() {
    let target = target("gfx900");
    let regs = RegisterFile::new();
    let ops = OperandDecoder::new(&target, &regs);
    let bytes = [1, 2];
    let mut ctx = DecodeContext::new(&bytes, 0, None);

    assert_eq!(
        ops.src(&mut ctx, S32, 255),
        Err(DecodeError::LiteralTruncated { available: 2 })
    );
    assert_eq!(ctx.cursor.consumed(), 0);
}

/// Deferred sources keep the literal marker instead of reading bytes.
#[test]
fn deferred_literal_marker() {
    let target = target("gfx1100");
    let regs = RegisterFile::new();
    let ops = OperandDecoder::new(&target, &regs);
    let bytes = [0xAA; 4];
    let mut ctx = DecodeContext::new(&bytes, 0, None);

    assert_eq!(ops.src(&mut ctx, S32.deferred(), 255), Ok(Operand::Immediate(255)));
    assert_eq!(ctx.cursor.consumed(), 0);
    assert!(ctx.literal().is_none());
}

/// Two equal mandatory literals agree; a different one conflicts.
#[test]
fn mandatory_literal_conflicts() {
    let target = target("gfx1100");
    let regs = RegisterFile::new();
    let ops = OperandDecoder::new(&target, &regs);
    let mut ctx = DecodeContext::new(&[], 0, None);

    assert_eq!(ops.mandatory_literal(&mut ctx, 0x4120_0000), Ok(Operand::Immediate(0x4120_0000)));
    assert_eq!(ops.mandatory_literal(&mut ctx, 0x4120_0000), Ok(Operand::Immediate(0x4120_0000)));
    assert_eq!(
        ops.mandatory_literal(&mut ctx, 0x3F80_0000),
        Err(DecodeError::ConflictingLiteral {
            held: 0x4120_0000,
            found: 0x3F80_0000,
        })
    );
}

/// Branch targets resolve through the symbolizer.
#[test]
fn branch_target_symbolized() {
    let target = target("gfx900");
    let regs = RegisterFile::new();
    let ops = OperandDecoder::new(&target, &regs);
    let mut sym = MockBranchSymbolizer::new();
    let _ = sym
        .expect_resolve_branch_target()
        .with(eq(0x110))
        .times(1)
        .returning(|_| Some("loop".to_owned()));
    let mut ctx = DecodeContext::new(&[], 0x100, Some(&mut sym));

    assert_eq!(ops.branch_target(&mut ctx, 3), Operand::Expr("loop".to_owned()));
}

/// Negative offsets are sign-extended; a miss keeps the raw offset.
#[test]
fn branch_target_backwards_unresolved() {
    let target = target("gfx900");
    let regs = RegisterFile::new();
    let ops = OperandDecoder::new(&target, &regs);
    let mut sym = MockBranchSymbolizer::new();
    let _ = sym
        .expect_resolve_branch_target()
        .with(eq(0x100))
        .times(1)
        .returning(|_| None);
    let mut ctx = DecodeContext::new(&[], 0x100, Some(&mut sym));

    assert_eq!(ops.branch_target(&mut ctx, 0xFFFF), Operand::Immediate(0xFFFF));
}

/// Without a symbolizer the raw offset is kept.
#[test]
fn branch_target_without_symbolizer() {
    let target = target("gfx900");
    let regs = RegisterFile::new();
    let ops = OperandDecoder::new(&target, &regs);
    let mut ctx = DecodeContext::new(&[], 0, None);
    assert_eq!(ops.branch_target(&mut ctx, 8), Operand::Immediate(8));
}

/// Scalar memory offsets are 20-bit unsigned on GFX8, 21-bit signed on
/// GFX9-11 and 24-bit signed on GFX12.
#[rstest]
#[case("gfx803", 0x1F_FFFF, 0xF_FFFF)]
#[case("gfx900", 0x1F_FFFF, -1)]
#[case("gfx900", 0x0F_FFFF, 0xF_FFFF)]
#[case("gfx1200", 0xFF_FFFF, -1)]
#[case("gfx1200", 0x1F_FFFF, 0x1F_FFFF)]
fn smem_offsets(#[case] preset: &str, #[case] imm: u64, #[case] offset: i64) {
    let target = target(preset);
    let regs = RegisterFile::new();
    let ops = OperandDecoder::new(&target, &regs);
    assert_eq!(ops.smem_offset(imm), Operand::Immediate(offset));
}

/// 16-bit VGPR halves in the full and low-128 forms.
#[test]
fn vgpr16_forms() {
    let target = target("gfx1100");
    let regs = RegisterFile::new();
    let ops = OperandDecoder::new(&target, &regs);
    assert_eq!(ops.vgpr16(0x205, false), reg(Register::Vgpr16 { index: 5, hi: true }));
    assert_eq!(ops.vgpr16(0x005, false), reg(Register::Vgpr16 { index: 5, hi: false }));
    assert_eq!(ops.vgpr16(0x85, true), reg(Register::Vgpr16 { index: 5, hi: true }));
}

/// SDWA sources fold scalars and constants into the 9-bit field on GFX9.
#[test]
fn sdwa_sources() {
    let gfx9 = target("gfx900");
    let vi = target("gfx803");
    let regs = RegisterFile::new();
    let mut ctx = DecodeContext::new(&[], 0, None);

    let ops = OperandDecoder::new(&gfx9, &regs);
    assert_eq!(ops.sdwa_src(&mut ctx, 32, 3), reg(Register::Vgpr { index: 3, dwords: 1 }));
    assert_eq!(ops.sdwa_src(&mut ctx, 32, 256 + 10), reg(Register::Sgpr { index: 10, dwords: 1 }));
    assert_eq!(ops.sdwa_src(&mut ctx, 32, 256 + 128), Ok(Operand::Immediate(0)));
    assert_eq!(ops.sdwa_src(&mut ctx, 32, 256 + 106), special(SpecialRegister::VccLo));

    let ops = OperandDecoder::new(&vi, &regs);
    assert_eq!(ops.sdwa_src(&mut ctx, 32, 3), reg(Register::Vgpr { index: 3, dwords: 1 }));
}

/// The SDWA compare destination defaults to `vcc` at the wave width.
#[test]
fn sdwa_vopc_destinations() {
    let gfx9 = target("gfx900");
    let gfx10 = target("gfx1030");
    let regs = RegisterFile::new();
    let mut ctx = DecodeContext::new(&[], 0, None);

    let ops = OperandDecoder::new(&gfx9, &regs);
    assert_eq!(ops.sdwa_vopc_dst(&mut ctx, 0), special(SpecialRegister::Vcc));
    assert_eq!(ops.sdwa_vopc_dst(&mut ctx, 0x80 | 4), reg(Register::Sgpr { index: 4, dwords: 2 }));
    assert_eq!(ops.sdwa_vopc_dst(&mut ctx, 0x80 | 126), special(SpecialRegister::Exec));

    let ops = OperandDecoder::new(&gfx10, &regs);
    assert_eq!(ops.sdwa_vopc_dst(&mut ctx, 0), special(SpecialRegister::VccLo));
    assert_eq!(ops.sdwa_vopc_dst(&mut ctx, 0x80 | 5), reg(Register::Sgpr { index: 5, dwords: 1 }));
}

/// The condition mask is as wide as the wavefront.
#[test]
fn bool_register_width() {
    let regs = RegisterFile::new();
    let mut ctx = DecodeContext::new(&[], 0, None);
    let wave64 = target("gfx900");
    let wave32 = target("gfx1100");

    assert_eq!(
        OperandDecoder::new(&wave64, &regs).bool_reg(&mut ctx, 106),
        special(SpecialRegister::Vcc)
    );
    assert_eq!(
        OperandDecoder::new(&wave32, &regs).bool_reg(&mut ctx, 106),
        special(SpecialRegister::VccLo)
    );
}

proptest! {
    /// Register and constant values decode the same way every time.
    #[test]
    fn non_literal_sources_are_pure(val in 0u32..512, wide in any::<bool>()) {
        prop_assume!(val != 255);
        let spec = if wide { SrcSpec::new(64, 64) } else { S32 };
        let target = Target::preset("gfx1030").unwrap();
        let regs = RegisterFile::new();
        let ops = OperandDecoder::new(&target, &regs);
        let mut ctx = DecodeContext::new(&[], 0, None);
        let first = ops.src(&mut ctx, spec, val);
        let second = ops.src(&mut ctx, spec, val);
        prop_assert_eq!(first, second);
        prop_assert_eq!(ctx.cursor.consumed(), 0);
    }
}
