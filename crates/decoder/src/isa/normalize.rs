//! Post-decode operand normalization.
//!
//! Decode tables emit only the operands an encoding carries, while schemas
//! describe the maximal form. After a match, a short list of fixups brings the
//! operand list back in line with the schema. The list is selected once from
//! the opcode's class flags and applied in dependency order:
//! 1. **Implicit Operands:** MAC `src2_modifiers`, DS `gds`, buffer `tfe`/`swz`, EXP `vm`/`compr`, VINTERP `op_sel`, SDWA `clamp`/`sdst`/`omod`.
//! 2. **Cache Policy:** Returning atomics always carry GLC.
//! 3. **Images:** NSA address splicing and variant resolution.
//! 4. **Ties and Literals:** `vdst_in` follows its tied operand; deferred literals are spliced in.

use tracing::debug;

use crate::common::error::DecodeError;
use crate::common::reg::{Register, RegisterInfo, SpecialRegister};
use crate::config::{Features, Target};
use crate::isa::context::DecodeContext;
use crate::isa::encoding::{LITERAL_CONST, cpol};
use crate::isa::instruction::{Instruction, Operand};
use crate::isa::metadata::{InstrDesc, InstrFlags, InstrInfo, OperandName};
use crate::isa::mimg;

/// Inserts `op` at the schema position of `name`.
///
/// # Returns
///
/// `false` if the schema has no such operand or the position is past the end.
pub fn insert_named(inst: &mut Instruction, desc: &InstrDesc, name: OperandName, op: Operand) -> bool {
    desc.named_index(name)
        .is_some_and(|idx| inst.insert(idx, op))
}

/// Inserts `op` at the position of `name`, but only while operands are missing.
pub fn insert_if_short(inst: &mut Instruction, desc: &InstrDesc, name: OperandName, op: Operand) -> bool {
    inst.len() < desc.num_operands() && insert_named(inst, desc, name, op)
}

/// One normalization step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fixup {
    /// MAC: zero `src2_modifiers`.
    MacSrc2Modifiers,
    /// DS on targets without GDS: `gds = 0`.
    DsGds,
    /// MUBUF/FLAT/SMRD: insert or complete `cpol`.
    CachePolicy,
    /// MUBUF/MTBUF on GFX90A: `tfe = 0` (the bit encodes ACC).
    Gfx90aTfe,
    /// MUBUF/MTBUF: `swz = 0`.
    Swizzle,
    /// MIMG: splice NSA address registers, then resolve the variant.
    NsaAddress,
    /// MIMG/VIMAGE/VSAMPLE: resolve the variant.
    ImageVariant,
    /// EXP on GFX11+: `vm = 0`, `compr = 0`.
    Export,
    /// VINTERP: `op_sel = 0` when not encoded.
    Interp,
    /// SDWA: `clamp`, `sdst` or `omod`.
    Sdwa,
    /// `vdst_in` must equal its tied operand.
    TiedVdstIn,
    /// Splice the deferred literal into `immDeferred` and sentinel slots.
    DeferredLiteral,
}

/// Selects the fixups for a decoded instruction.
///
/// # Arguments
///
/// * `target` - Active target.
/// * `desc` - Schema of the decoded opcode.
/// * `is_sdwa` - The instruction came from an SDWA table.
pub fn select(target: &Target, desc: &InstrDesc, is_sdwa: bool) -> Vec<Fixup> {
    let mut fixups = Vec::new();
    if desc.is_any(InstrFlags::MAC) {
        fixups.push(Fixup::MacSrc2Modifiers);
    }
    if desc.is_any(InstrFlags::DS) && !target.has_gds() {
        fixups.push(Fixup::DsGds);
    }
    if desc.is_any(InstrFlags::MUBUF | InstrFlags::FLAT | InstrFlags::SMRD) && desc.has_named(OperandName::Cpol) {
        fixups.push(Fixup::CachePolicy);
    }
    let buffer = desc.is_any(InstrFlags::MTBUF | InstrFlags::MUBUF);
    if buffer && target.is_gfx90a() && desc.has_named(OperandName::Tfe) {
        fixups.push(Fixup::Gfx90aTfe);
    }
    if buffer && desc.has_named(OperandName::Swz) {
        fixups.push(Fixup::Swizzle);
    }
    if desc.is_any(InstrFlags::MIMG) {
        fixups.push(Fixup::NsaAddress);
    }
    if desc.is_any(InstrFlags::VIMAGE | InstrFlags::VSAMPLE) {
        fixups.push(Fixup::ImageVariant);
    }
    if desc.is_any(InstrFlags::EXP) {
        fixups.push(Fixup::Export);
    }
    if desc.is_any(InstrFlags::VINTERP) {
        fixups.push(Fixup::Interp);
    }
    if is_sdwa {
        fixups.push(Fixup::Sdwa);
    }
    if desc
        .named_index(OperandName::VdstIn)
        .is_some_and(|idx| desc.tied_to(idx).is_some())
    {
        fixups.push(Fixup::TiedVdstIn);
    }
    if desc.has_named(OperandName::Imm) && !desc.is_any(InstrFlags::SOPK) {
        fixups.push(Fixup::DeferredLiteral);
    }
    fixups
}

/// Collaborators the fixups consult.
#[derive(Clone, Copy)]
pub struct Normalizer<'d> {
    /// Active target.
    pub target: &'d Target,
    /// Instruction metadata.
    pub info: &'d dyn InstrInfo,
    /// Register metadata.
    pub regs: &'d dyn RegisterInfo,
}

impl std::fmt::Debug for Normalizer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("target", self.target)
            .finish_non_exhaustive()
    }
}

impl Normalizer<'_> {
    /// Applies every selected fixup to `inst`.
    ///
    /// # Errors
    ///
    /// The first fixup error; the instruction must then be rejected.
    pub fn run(&self, ctx: &mut DecodeContext<'_>, inst: &mut Instruction, is_sdwa: bool) -> Result<(), DecodeError> {
        let Some(desc) = self.info.desc(inst.opcode) else {
            return Ok(());
        };
        for fixup in select(self.target, desc, is_sdwa) {
            self.apply(ctx, inst, fixup).inspect_err(|err| {
                debug!(?fixup, opcode = %inst.opcode, %err, "fixup rejected instruction");
            })?;
        }
        Ok(())
    }

    /// Applies one fixup.
    ///
    /// The schema is looked up again for every step, since image resolution
    /// may change the opcode.
    pub fn apply(&self, ctx: &mut DecodeContext<'_>, inst: &mut Instruction, fixup: Fixup) -> Result<(), DecodeError> {
        let desc = self
            .info
            .desc(inst.opcode)
            .ok_or(DecodeError::UnknownOpcode(inst.opcode))?;
        let zero = Operand::Immediate(0);
        match fixup {
            Fixup::MacSrc2Modifiers => {
                let _ = insert_named(inst, desc, OperandName::Src2Modifiers, zero);
            }
            Fixup::DsGds => {
                let _ = insert_named(inst, desc, OperandName::Gds, zero);
            }
            Fixup::CachePolicy => Self::cache_policy(inst, desc),
            Fixup::Gfx90aTfe => {
                let _ = insert_named(inst, desc, OperandName::Tfe, zero);
            }
            Fixup::Swizzle => {
                let _ = insert_named(inst, desc, OperandName::Swz, zero);
            }
            Fixup::NsaAddress => {
                mimg::expand_nsa(ctx, self.regs, desc, inst)?;
                mimg::convert_mimg(self.target, self.info, self.regs, inst)?;
            }
            Fixup::ImageVariant => mimg::convert_mimg(self.target, self.info, self.regs, inst)?,
            Fixup::Export => {
                if self.target.has(Features::GFX11_INSTS) {
                    let _ = insert_named(inst, desc, OperandName::Vm, zero.clone());
                    let _ = insert_named(inst, desc, OperandName::Compr, zero);
                }
            }
            Fixup::Interp => {
                let _ = insert_if_short(inst, desc, OperandName::OpSel, zero);
            }
            Fixup::Sdwa => self.sdwa(inst, desc),
            Fixup::TiedVdstIn => Self::tied_vdst_in(inst, desc)?,
            Fixup::DeferredLiteral => Self::deferred_literal(ctx, inst, desc)?,
        }
        Ok(())
    }

    fn cache_policy(inst: &mut Instruction, desc: &InstrDesc) {
        let Some(pos) = desc.named_index(OperandName::Cpol) else {
            return;
        };
        let glc = if desc.is_any(InstrFlags::IS_ATOMIC_RET) { cpol::GLC } else { 0 };
        if inst.len() <= pos {
            let _ = insert_named(inst, desc, OperandName::Cpol, Operand::Immediate(glc));
        } else if glc != 0 {
            if let Some(value) = inst.imm(pos) {
                let _ = inst.set(pos, Operand::Immediate(value | glc));
            }
        }
    }

    fn sdwa(&self, inst: &mut Instruction, desc: &InstrDesc) {
        let zero = Operand::Immediate(0);
        if self.target.is_gfx9() || self.target.is_gfx10() {
            if desc.has_named(OperandName::Sdst) {
                let _ = insert_named(inst, desc, OperandName::Clamp, zero);
            }
        } else if self.target.is_vi() {
            if desc.has_named(OperandName::Sdst) {
                let vcc = Operand::Register(Register::Special(SpecialRegister::Vcc));
                let _ = insert_named(inst, desc, OperandName::Sdst, vcc);
            } else {
                let _ = insert_named(inst, desc, OperandName::Omod, zero);
            }
        }
    }

    fn tied_vdst_in(inst: &mut Instruction, desc: &InstrDesc) -> Result<(), DecodeError> {
        let Some(idx) = desc.named_index(OperandName::VdstIn) else {
            return Ok(());
        };
        let Some(tied) = desc.tied_to(idx) else {
            return Ok(());
        };
        let tied_reg = inst
            .reg(tied)
            .ok_or(DecodeError::MissingOperand(OperandName::VdstIn))?;
        if inst.reg(idx) == Some(tied_reg) {
            return Ok(());
        }
        if inst.len() > idx {
            inst.remove_range(idx, idx + 1);
        }
        let _ = insert_named(inst, desc, OperandName::VdstIn, Operand::Register(tied_reg));
        Ok(())
    }

    fn deferred_literal(ctx: &DecodeContext<'_>, inst: &mut Instruction, desc: &InstrDesc) -> Result<(), DecodeError> {
        let literal = ctx.literal().ok_or(DecodeError::MissingLiteral)?;
        let value = i64::from(literal.value);
        let _ = insert_named(inst, desc, OperandName::ImmDeferred, Operand::Immediate(value));
        for (idx, slot) in desc.operands.iter().enumerate() {
            if slot.ty.is_deferred() && inst.imm(idx) == Some(i64::from(LITERAL_CONST)) {
                let _ = inst.set(idx, Operand::Immediate(value));
            }
        }
        Ok(())
    }
}
