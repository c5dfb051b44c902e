//! Image instruction resolution.
//!
//! Image opcodes come in size variants that differ only in how many data and
//! address registers they name. The decode tables always produce one fixed
//! variant; this module works out the real sizes from the decoded fields and
//! switches to the matching variant:
//! 1. **Dimensions:** Coordinate and gradient counts per `dim` encoding.
//! 2. **Address Size:** Extra arguments, coordinates, LOD and gradients, packed under A16/G16.
//! 3. **NSA Expansion:** Splicing non-sequential address registers from trailing bytes.
//! 4. **Variant Selection:** Re-targeting the opcode and widening `vdata` or the address tuple.

use tracing::debug;

use crate::common::error::DecodeError;
use crate::common::reg::{Register, RegisterInfo};
use crate::config::{Features, Target};
use crate::isa::context::DecodeContext;
use crate::isa::instruction::{Instruction, Operand};
use crate::isa::metadata::{InstrDesc, InstrFlags, InstrInfo, MimgBaseOpcodeInfo, OperandName};

/// Shape of one image dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MimgDimInfo {
    /// Assembly name (`SQ_RSRC_IMG_*` suffix).
    pub name: &'static str,
    /// Value of the `dim` field.
    pub encoding: u8,
    /// Number of coordinates.
    pub num_coords: u8,
    /// Number of derivative values.
    pub num_gradients: u8,
    /// Arrayed dimension.
    pub array: bool,
}

/// Dimensions by `dim` encoding.
pub const MIMG_DIMS: [MimgDimInfo; 8] = [
    MimgDimInfo { name: "1D", encoding: 0, num_coords: 1, num_gradients: 2, array: false },
    MimgDimInfo { name: "2D", encoding: 1, num_coords: 2, num_gradients: 4, array: false },
    MimgDimInfo { name: "3D", encoding: 2, num_coords: 3, num_gradients: 6, array: false },
    MimgDimInfo { name: "CUBE", encoding: 3, num_coords: 3, num_gradients: 4, array: false },
    MimgDimInfo { name: "1D_ARRAY", encoding: 4, num_coords: 2, num_gradients: 2, array: true },
    MimgDimInfo { name: "2D_ARRAY", encoding: 5, num_coords: 3, num_gradients: 4, array: true },
    MimgDimInfo { name: "2D_MSAA", encoding: 6, num_coords: 3, num_gradients: 4, array: false },
    MimgDimInfo { name: "2D_MSAA_ARRAY", encoding: 7, num_coords: 4, num_gradients: 4, array: true },
];

/// Looks up a dimension by its `dim` field value.
pub fn dim_by_encoding(encoding: i64) -> Option<&'static MimgDimInfo> {
    MIMG_DIMS.iter().find(|dim| i64::from(dim.encoding) == encoding)
}

/// Number of address registers an image operation needs.
///
/// With A16, coordinates are packed two per register. Gradients are packed
/// when the opcode is a G16 form, or when A16 is set on a target without
/// separate G16 support.
///
/// # Arguments
///
/// * `base` - Properties of the image operation.
/// * `dim` - Dimension from the `dim` field.
/// * `a16` - 16-bit addresses.
/// * `g16_supported` - The target has dedicated G16 opcodes.
pub fn addr_size(base: &MimgBaseOpcodeInfo, dim: &MimgDimInfo, a16: bool, g16_supported: bool) -> u32 {
    let mut words = u32::from(base.num_extra_args);
    let components = if base.coordinates { u32::from(dim.num_coords) } else { 0 }
        + u32::from(base.lod_or_clamp_or_mip);
    words += if a16 { components.div_ceil(2) } else { components };
    if base.gradients {
        let gradients = u32::from(dim.num_gradients);
        if (a16 && !g16_supported) || base.g16 {
            words += (gradients / 2).next_multiple_of(2);
        } else {
            words += gradients;
        }
    }
    words
}

/// Splices the non-sequential address registers of an NSA image instruction.
///
/// The schema lists `srsrc - vaddr0 - 1` extra address slots after `vaddr0`.
/// Their register numbers follow the instruction as one byte each, padded to
/// whole dwords.
///
/// # Errors
///
/// * `DecodeError::NsaTruncated` - The trailing bytes are too short.
/// * `DecodeError::UnknownRegister` - A byte does not name a register of its slot's class.
pub fn expand_nsa(
    ctx: &mut DecodeContext<'_>,
    regs: &dyn RegisterInfo,
    desc: &InstrDesc,
    inst: &mut Instruction,
) -> Result<(), DecodeError> {
    let (Some(vaddr0), Some(srsrc)) = (
        desc.named_index(OperandName::Vaddr0),
        desc.named_index(OperandName::Srsrc),
    ) else {
        return Ok(());
    };
    let args = srsrc.saturating_sub(vaddr0 + 1);
    if args == 0 {
        return Ok(());
    }
    let needed = 4 * args.div_ceil(4);
    let available = ctx.cursor.remaining();
    let bytes = ctx
        .cursor
        .read_bytes(needed)
        .ok_or(DecodeError::NsaTruncated { needed, available })?;
    for (i, &byte) in bytes.iter().take(args).enumerate() {
        let slot = vaddr0 + 1 + i;
        let class = desc
            .operands
            .get(slot)
            .and_then(|op| op.reg_class)
            .ok_or(DecodeError::MissingOperand(OperandName::Vaddr0))?;
        let reg = regs
            .register(class, u32::from(byte))
            .ok_or(DecodeError::UnknownRegister { class, index: u32::from(byte) })?;
        let _ = inst.insert(slot, Operand::Register(reg));
    }
    Ok(())
}

fn named_imm(inst: &Instruction, desc: &InstrDesc, name: OperandName) -> Option<i64> {
    desc.named_index(name).and_then(|idx| inst.imm(idx))
}

/// Widens `reg` to the register class of `slot` in the schema of `desc`.
fn widen(regs: &dyn RegisterInfo, reg: Register, desc: &InstrDesc, slot: usize) -> Option<Register> {
    let class = desc.operands.get(slot)?.reg_class?;
    regs.matching_super_reg(regs.sub0(reg), class)
}

/// Re-targets an image instruction to the variant matching its real sizes.
///
/// Missing metadata, an absent variant or a register tuple that would run past
/// the end of its file leave the instruction exactly as decoded.
///
/// # Errors
///
/// `DecodeError::MissingOperand` if `dmask` or `vdata` is absent.
pub fn convert_mimg(
    target: &Target,
    info: &dyn InstrInfo,
    regs: &dyn RegisterInfo,
    inst: &mut Instruction,
) -> Result<(), DecodeError> {
    let Some(desc) = info.desc(inst.opcode) else {
        return Ok(());
    };
    let Some(mimg) = info.mimg_info(inst.opcode) else {
        debug!(opcode = %inst.opcode, "image opcode without variant metadata");
        return Ok(());
    };
    let Some(base) = info.mimg_base_info(mimg.base_opcode) else {
        debug!(opcode = %inst.opcode, "image base opcode without metadata");
        return Ok(());
    };
    let vdata_idx = desc
        .named_index(OperandName::Vdata)
        .ok_or(DecodeError::MissingOperand(OperandName::Vdata))?;

    if base.bvh {
        inst.push(Operand::Immediate(i64::from(base.a16)));
        return Ok(());
    }

    let vdst_idx = desc.named_index(OperandName::Vdst);
    let vaddr0_idx = desc.named_index(OperandName::Vaddr0);
    let rsrc_name = if desc.is_any(InstrFlags::MIMG) {
        OperandName::Srsrc
    } else {
        OperandName::Rsrc
    };
    let rsrc_idx = desc.named_index(rsrc_name);
    let is_gather4 = desc.is_any(InstrFlags::GATHER4);
    let is_vsample = desc.is_any(InstrFlags::VSAMPLE);

    let mut addr = u32::from(mimg.vaddr_dwords);
    let mut is_nsa = false;
    let mut is_partial_nsa = false;
    if target.is_gfx10_plus() {
        let Some(dim) = named_imm(inst, desc, OperandName::Dim).and_then(dim_by_encoding) else {
            debug!(opcode = %inst.opcode, "image instruction without a known dim");
            return Ok(());
        };
        let a16 = named_imm(inst, desc, OperandName::A16).is_some_and(|v| v != 0);
        addr = addr_size(base, dim, a16, target.has(Features::G16));
        is_nsa = mimg.encoding.is_nsa();
        if !is_nsa {
            if !is_vsample && addr > 12 {
                addr = 16;
            }
        } else if addr > u32::from(mimg.vaddr_dwords) {
            if !target.has(Features::PARTIAL_NSA_ENCODING) {
                return Ok(());
            }
            is_partial_nsa = true;
        }
    }

    let dmask = named_imm(inst, desc, OperandName::Dmask)
        .ok_or(DecodeError::MissingOperand(OperandName::Dmask))?
        & 0xF;
    let mut dst = if is_gather4 { 4 } else { dmask.count_ones().max(1) };
    let d16 = named_imm(inst, desc, OperandName::D16).is_some_and(|v| v != 0);
    if d16 && target.has_packed_d16() {
        dst = dst.div_ceil(2);
    }
    if named_imm(inst, desc, OperandName::Tfe).is_some_and(|v| v != 0) {
        dst += 1;
    }

    if dst == u32::from(mimg.vdata_dwords) && addr == u32::from(mimg.vaddr_dwords) {
        return Ok(());
    }
    let Some(new_opcode) = info.mimg_opcode(mimg.base_opcode, mimg.encoding, dst as u8, addr as u8) else {
        debug!(opcode = %inst.opcode, dst, addr, "no image variant for resolved sizes");
        return Ok(());
    };
    let Some(new_desc) = info.desc(new_opcode) else {
        return Ok(());
    };

    let mut new_vdata = None;
    if dst != u32::from(mimg.vdata_dwords) {
        let vdata = inst
            .reg(vdata_idx)
            .ok_or(DecodeError::MissingOperand(OperandName::Vdata))?;
        let Some(wide) = widen(regs, vdata, new_desc, vdata_idx) else {
            return Ok(());
        };
        new_vdata = Some(wide);
    }

    let vaddr_sa_idx = if is_partial_nsa {
        rsrc_idx.map(|idx| idx - 1)
    } else {
        vaddr0_idx
    };
    let mut new_vaddr_sa = None;
    if target.has(Features::NSA_ENCODING)
        && (!is_nsa || is_partial_nsa)
        && addr != u32::from(mimg.vaddr_dwords)
    {
        let Some(slot) = vaddr_sa_idx else {
            return Ok(());
        };
        let Some(wide) = inst.reg(slot).and_then(|reg| widen(regs, reg, new_desc, slot)) else {
            return Ok(());
        };
        new_vaddr_sa = Some((slot, wide));
    }

    inst.opcode = new_opcode;
    if let Some(wide) = new_vdata {
        let _ = inst.set(vdata_idx, Operand::Register(wide));
        if let Some(vdst) = vdst_idx {
            let _ = inst.set(vdst, Operand::Register(wide));
        }
    }
    if let Some((slot, wide)) = new_vaddr_sa {
        let _ = inst.set(slot, Operand::Register(wide));
    } else if is_nsa {
        if let Some(vaddr0) = vaddr0_idx {
            let start = vaddr0 + addr as usize;
            inst.remove_range(start, vaddr0 + usize::from(mimg.vaddr_dwords));
        }
    }
    Ok(())
}
