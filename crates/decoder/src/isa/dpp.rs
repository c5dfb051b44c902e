//! DPP operand reconstruction.
//!
//! DPP encodings drop operands that the VOP3/VOP3P/VOPC schemas still model.
//! The conversions here insert them back, rebuilding `op_sel` and the packed
//! negate masks from the per-source modifier bits, and check the DPP8 `fi`
//! marker that tells a genuine DPP8 word from an unrelated 64-bit encoding.

use crate::common::error::DecodeStatus;
use crate::common::reg::Register;
use crate::isa::encoding::{dpp8, src_mods};
use crate::isa::instruction::{Instruction, Operand};
use crate::isa::metadata::{InstrDesc, InstrFlags, OperandName};
use crate::isa::normalize::{insert_if_short, insert_named};

/// Modifier masks gathered from `src0..2_modifiers`, one bit per source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VopModifiers {
    /// `op_sel`; bit 3 is the destination select on non-packed forms.
    pub op_sel: i64,
    /// `op_sel_hi` (packed forms).
    pub op_sel_hi: i64,
    /// `neg_lo` (packed forms).
    pub neg_lo: i64,
    /// `neg_hi` (packed forms).
    pub neg_hi: i64,
}

const SRC_MODIFIERS: [OperandName; 3] = [
    OperandName::Src0Modifiers,
    OperandName::Src1Modifiers,
    OperandName::Src2Modifiers,
];

/// Gathers the modifier masks of a decoded instruction.
///
/// Modifier slots the schema has but the instruction does not (yet) carry
/// count as zero.
pub fn collect_vop_modifiers(inst: &Instruction, desc: &InstrDesc, is_vop3p: bool) -> VopModifiers {
    let mut mods = VopModifiers::default();
    for (j, name) in SRC_MODIFIERS.into_iter().enumerate() {
        let Some(idx) = desc.named_index(name) else {
            continue;
        };
        let val = inst.imm(idx).unwrap_or(0);
        let bit = |mask: i64| i64::from(val & mask != 0) << j;
        mods.op_sel |= bit(src_mods::OP_SEL_0);
        if is_vop3p {
            mods.op_sel_hi |= bit(src_mods::OP_SEL_1);
            mods.neg_lo |= bit(src_mods::NEG);
            mods.neg_hi |= bit(src_mods::NEG_HI);
        } else if j == 0 {
            mods.op_sel |= i64::from(val & src_mods::DST_OP_SEL != 0) << 3;
        }
    }
    mods
}

/// Returns true for MAC forms whose `old` operand is not tied.
pub fn is_mac_dpp(desc: &InstrDesc) -> bool {
    desc.named_index(OperandName::Old)
        .is_some_and(|old| desc.tied_to(old).is_none())
}

fn convert_mac_dpp(inst: &mut Instruction, desc: &InstrDesc) {
    let _ = insert_named(inst, desc, OperandName::Old, Operand::Register(Register::NoRegister));
    let _ = insert_named(inst, desc, OperandName::Src2Modifiers, Operand::Immediate(0));
}

/// Returns true if the `fi` operand holds a DPP8 marker value.
pub fn is_valid_dpp8(inst: &Instruction, desc: &InstrDesc) -> bool {
    desc.named_index(OperandName::Fi)
        .and_then(|idx| inst.imm(idx))
        .is_some_and(|fi| fi == dpp8::FI_0 || fi == dpp8::FI_1)
}

/// Completes a DPP8 instruction and validates its `fi` marker.
///
/// # Returns
///
/// `Success` for a genuine DPP8 encoding, `SoftFail` otherwise.
pub fn convert_dpp8(inst: &mut Instruction, desc: &InstrDesc) -> DecodeStatus {
    if desc.is_any(InstrFlags::VOP3P) {
        convert_vop3p_dpp(inst, desc);
    } else if desc.is_any(InstrFlags::VOPC | InstrFlags::VOPC64_DPP) {
        convert_vopc_dpp(inst, desc);
    } else {
        if is_mac_dpp(desc) {
            convert_mac_dpp(inst, desc);
        }
        if inst.len() < desc.num_operands() && desc.has_named(OperandName::OpSel) {
            let mods = collect_vop_modifiers(inst, desc, false);
            let _ = insert_named(inst, desc, OperandName::OpSel, Operand::Immediate(mods.op_sel));
        } else {
            let _ = insert_if_short(inst, desc, OperandName::Src0Modifiers, Operand::Immediate(0));
            let _ = insert_if_short(inst, desc, OperandName::Src1Modifiers, Operand::Immediate(0));
        }
    }
    if is_valid_dpp8(inst, desc) {
        DecodeStatus::Success
    } else {
        DecodeStatus::SoftFail
    }
}

/// Completes a VOP3 DPP16 instruction.
pub fn convert_vop3_dpp(inst: &mut Instruction, desc: &InstrDesc) {
    if is_mac_dpp(desc) {
        convert_mac_dpp(inst, desc);
    }
    if inst.len() < desc.num_operands() && desc.has_named(OperandName::OpSel) {
        let mods = collect_vop_modifiers(inst, desc, false);
        let _ = insert_named(inst, desc, OperandName::OpSel, Operand::Immediate(mods.op_sel));
    }
}

/// Completes a VOP3P DPP instruction.
pub fn convert_vop3p_dpp(inst: &mut Instruction, desc: &InstrDesc) {
    let mods = collect_vop_modifiers(inst, desc, true);
    let _ = insert_if_short(inst, desc, OperandName::VdstIn, Operand::Immediate(0));
    let _ = insert_if_short(inst, desc, OperandName::OpSel, Operand::Immediate(mods.op_sel));
    let _ = insert_if_short(inst, desc, OperandName::OpSelHi, Operand::Immediate(mods.op_sel_hi));
    let _ = insert_if_short(inst, desc, OperandName::NegLo, Operand::Immediate(mods.neg_lo));
    let _ = insert_if_short(inst, desc, OperandName::NegHi, Operand::Immediate(mods.neg_hi));
}

/// Completes a VOPC DPP instruction.
pub fn convert_vopc_dpp(inst: &mut Instruction, desc: &InstrDesc) {
    let _ = insert_if_short(inst, desc, OperandName::Old, Operand::Register(Register::NoRegister));
    let _ = insert_if_short(inst, desc, OperandName::Src0Modifiers, Operand::Immediate(0));
    let _ = insert_if_short(inst, desc, OperandName::Src1Modifiers, Operand::Immediate(0));
}

/// Completes a 96-bit DPP16 instruction of any VOP3 flavor.
pub fn convert_vop_dpp(inst: &mut Instruction, desc: &InstrDesc) {
    if desc.is_any(InstrFlags::VOP3P) {
        convert_vop3p_dpp(inst, desc);
    } else if desc.is_any(InstrFlags::VOPC64_DPP) {
        convert_vopc_dpp(inst, desc);
    } else {
        convert_vop3_dpp(inst, desc);
    }
}
