//! Instruction metadata consumed by the decoder.
//!
//! The decoder never builds instruction schemas itself; it queries them through
//! the `InstrInfo` trait. This module provides:
//! 1. **Schemas:** Per-opcode operand lists with names, types, register classes and tied constraints.
//! 2. **Class Flags:** The per-opcode flag bits that select post-decode fixups.
//! 3. **Image Tables:** MIMG opcode variants keyed by (base opcode, encoding, data size, address size).
//! 4. **`MetadataTable`:** An in-memory `InstrInfo` for callers that load metadata at run time.

use std::collections::HashMap;
use std::fmt;

use bitflags::bitflags;

use crate::common::reg::RegClass;
use crate::isa::instruction::Opcode;

/// Name of a schema operand.
///
/// Fixups locate operands by name, never by position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum OperandName {
    Vdst,
    VdstX,
    VdstY,
    Sdst,
    Src0,
    Src0Modifiers,
    Src1,
    Src1Modifiers,
    Src2,
    Src2Modifiers,
    Old,
    VdstIn,
    OpSel,
    OpSelHi,
    NegLo,
    NegHi,
    Dpp8,
    DppCtrl,
    Fi,
    Clamp,
    Omod,
    Gds,
    Cpol,
    Tfe,
    Swz,
    Vdata,
    Data0,
    Data1,
    Vaddr0,
    Srsrc,
    Rsrc,
    Dmask,
    Dim,
    A16,
    D16,
    Imm,
    ImmDeferred,
    Vm,
    Compr,
    Simm16,
    Offset,
    /// Any operand the fixups do not refer to.
    Other(&'static str),
}

impl OperandName {
    /// Assembly-level spelling of the operand name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vdst => "vdst",
            Self::VdstX => "vdstX",
            Self::VdstY => "vdstY",
            Self::Sdst => "sdst",
            Self::Src0 => "src0",
            Self::Src0Modifiers => "src0_modifiers",
            Self::Src1 => "src1",
            Self::Src1Modifiers => "src1_modifiers",
            Self::Src2 => "src2",
            Self::Src2Modifiers => "src2_modifiers",
            Self::Old => "old",
            Self::VdstIn => "vdst_in",
            Self::OpSel => "op_sel",
            Self::OpSelHi => "op_sel_hi",
            Self::NegLo => "neg_lo",
            Self::NegHi => "neg_hi",
            Self::Dpp8 => "dpp8",
            Self::DppCtrl => "dpp_ctrl",
            Self::Fi => "fi",
            Self::Clamp => "clamp",
            Self::Omod => "omod",
            Self::Gds => "gds",
            Self::Cpol => "cpol",
            Self::Tfe => "tfe",
            Self::Swz => "swz",
            Self::Vdata => "vdata",
            Self::Data0 => "data0",
            Self::Data1 => "data1",
            Self::Vaddr0 => "vaddr0",
            Self::Srsrc => "srsrc",
            Self::Rsrc => "rsrc",
            Self::Dmask => "dmask",
            Self::Dim => "dim",
            Self::A16 => "a16",
            Self::D16 => "d16",
            Self::Imm => "imm",
            Self::ImmDeferred => "immDeferred",
            Self::Vm => "vm",
            Self::Compr => "compr",
            Self::Simm16 => "simm16",
            Self::Offset => "offset",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for OperandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of value a schema operand holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum OperandType {
    /// A register from the operand's class.
    #[default]
    Register,
    /// A register or an inline/literal constant.
    Source,
    /// A plain immediate (modifiers, offsets, flags).
    Immediate,
    /// 32-bit float source whose literal is resolved after the table match.
    DeferredFp32,
    /// 16-bit float source whose literal is resolved after the table match.
    DeferredFp16,
}

impl OperandType {
    /// Returns true for the deferred-literal source types.
    #[inline]
    pub const fn is_deferred(self) -> bool {
        matches!(self, Self::DeferredFp32 | Self::DeferredFp16)
    }
}

/// One schema slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OperandInfo {
    /// Operand name.
    pub name: OperandName,
    /// Value kind.
    pub ty: OperandType,
    /// Register class for register slots.
    pub reg_class: Option<RegClass>,
    /// Index of the operand this slot must equal.
    pub tied_to: Option<usize>,
}

impl OperandInfo {
    /// A register slot of class `class`.
    pub const fn reg(name: OperandName, class: RegClass) -> Self {
        Self {
            name,
            ty: OperandType::Register,
            reg_class: Some(class),
            tied_to: None,
        }
    }

    /// A register-or-constant source slot.
    pub const fn src(name: OperandName) -> Self {
        Self {
            name,
            ty: OperandType::Source,
            reg_class: None,
            tied_to: None,
        }
    }

    /// An immediate slot.
    pub const fn imm(name: OperandName) -> Self {
        Self {
            name,
            ty: OperandType::Immediate,
            reg_class: None,
            tied_to: None,
        }
    }

    /// Returns the slot with a different value type.
    #[must_use]
    pub const fn with_type(mut self, ty: OperandType) -> Self {
        self.ty = ty;
        self
    }

    /// Returns the slot tied to schema index `idx`.
    #[must_use]
    pub const fn tied(mut self, idx: usize) -> Self {
        self.tied_to = Some(idx);
        self
    }
}

bitflags! {
    /// Per-opcode class flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InstrFlags: u32 {
        /// VOP3 encoding.
        const VOP3 = 1 << 0;
        /// Packed-math VOP3P encoding.
        const VOP3P = 1 << 1;
        /// Vector compare.
        const VOPC = 1 << 2;
        /// VOPC promoted to VOP3 with DPP.
        const VOPC64_DPP = 1 << 3;
        /// Data-parallel-primitive form.
        const DPP = 1 << 4;
        /// Sub-dword addressing form.
        const SDWA = 1 << 5;
        /// Local/global data share access.
        const DS = 1 << 6;
        /// Untyped buffer access.
        const MUBUF = 1 << 7;
        /// Typed buffer access.
        const MTBUF = 1 << 8;
        /// Flat, global or scratch access.
        const FLAT = 1 << 9;
        /// Scalar memory access.
        const SMRD = 1 << 10;
        /// Image access (pre-GFX12 encoding).
        const MIMG = 1 << 11;
        /// GFX12 image access without sampler.
        const VIMAGE = 1 << 12;
        /// GFX12 image sample.
        const VSAMPLE = 1 << 13;
        /// Export.
        const EXP = 1 << 14;
        /// GFX11+ parameter interpolation.
        const VINTERP = 1 << 15;
        /// Scalar with 16-bit inline constant.
        const SOPK = 1 << 16;
        /// Atomic that returns the pre-op value.
        const IS_ATOMIC_RET = 1 << 17;
        /// Image gather4 (always four components).
        const GATHER4 = 1 << 18;
        /// Multiply-accumulate with tied `src2`.
        const MAC = 1 << 19;
    }
}

/// Schema and flags of one opcode.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct InstrDesc {
    /// Mnemonic, for diagnostics.
    pub name: String,
    /// Class flags.
    pub flags: InstrFlags,
    /// Schema slots in operand order.
    pub operands: Vec<OperandInfo>,
}

impl InstrDesc {
    /// Creates a schema.
    pub fn new(name: impl Into<String>, flags: InstrFlags, operands: Vec<OperandInfo>) -> Self {
        Self {
            name: name.into(),
            flags,
            operands,
        }
    }

    /// Number of schema slots.
    #[inline]
    pub fn num_operands(&self) -> usize {
        self.operands.len()
    }

    /// Schema index of the operand called `name`.
    pub fn named_index(&self, name: OperandName) -> Option<usize> {
        self.operands.iter().position(|op| op.name == name)
    }

    /// Returns true if the schema has an operand called `name`.
    #[inline]
    pub fn has_named(&self, name: OperandName) -> bool {
        self.named_index(name).is_some()
    }

    /// Index the slot at `idx` is tied to.
    #[inline]
    pub fn tied_to(&self, idx: usize) -> Option<usize> {
        self.operands.get(idx).and_then(|op| op.tied_to)
    }

    /// Returns true if any flag in `flags` is set.
    #[inline]
    pub const fn is_any(&self, flags: InstrFlags) -> bool {
        self.flags.intersects(flags)
    }
}

/// Encoding family of an image instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum MimgEncoding {
    Gfx6,
    Gfx8,
    Gfx90a,
    Gfx10Default,
    Gfx10Nsa,
    Gfx11Default,
    Gfx11Nsa,
    Gfx12,
}

impl MimgEncoding {
    /// Returns true for encodings whose address registers are listed individually.
    #[inline]
    pub const fn is_nsa(self) -> bool {
        matches!(self, Self::Gfx10Nsa | Self::Gfx11Nsa | Self::Gfx12)
    }
}

/// Variant record of one image opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MimgInfo {
    /// The concrete opcode.
    pub opcode: Opcode,
    /// Operation shared by all size variants.
    pub base_opcode: u32,
    /// Encoding family.
    pub encoding: MimgEncoding,
    /// Data register count of this variant.
    pub vdata_dwords: u8,
    /// Address register count of this variant.
    pub vaddr_dwords: u8,
}

/// Properties shared by every size variant of an image operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct MimgBaseOpcodeInfo {
    /// Base opcode number.
    pub base_opcode: u32,
    /// Writes memory.
    pub store: bool,
    /// Atomic; `vdst` mirrors `vdata`.
    pub atomic: bool,
    /// Always returns four components.
    pub gather4: bool,
    /// Address words besides coordinates and gradients (offset, bias, compare...).
    pub num_extra_args: u8,
    /// Takes derivatives.
    pub gradients: bool,
    /// Derivatives are 16-bit by opcode.
    pub g16: bool,
    /// Takes coordinates.
    pub coordinates: bool,
    /// Takes an LOD, clamp or mip argument.
    pub lod_or_clamp_or_mip: bool,
    /// Supports D16 data.
    pub has_d16: bool,
    /// Ray intersection; address layout is fixed.
    pub bvh: bool,
    /// Ray intersection uses 16-bit addresses.
    pub a16: bool,
}

/// Read-only instruction metadata interface.
pub trait InstrInfo {
    /// Schema of `opcode`.
    fn desc(&self, opcode: Opcode) -> Option<&InstrDesc>;

    /// Image variant record of `opcode`.
    fn mimg_info(&self, opcode: Opcode) -> Option<&MimgInfo>;

    /// Base operation record.
    fn mimg_base_info(&self, base_opcode: u32) -> Option<&MimgBaseOpcodeInfo>;

    /// Variant of `base_opcode` with the given encoding and sizes.
    fn mimg_opcode(
        &self,
        base_opcode: u32,
        encoding: MimgEncoding,
        vdata_dwords: u8,
        vaddr_dwords: u8,
    ) -> Option<Opcode>;
}

/// In-memory instruction metadata.
#[derive(Clone, Debug, Default)]
pub struct MetadataTable {
    descs: HashMap<Opcode, InstrDesc>,
    mimg: HashMap<Opcode, MimgInfo>,
    mimg_base: HashMap<u32, MimgBaseOpcodeInfo>,
}

impl MetadataTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the schema of `opcode`.
    #[must_use]
    pub fn with_desc(mut self, opcode: Opcode, desc: InstrDesc) -> Self {
        let _ = self.descs.insert(opcode, desc);
        self
    }

    /// Registers an image variant.
    #[must_use]
    pub fn with_mimg(mut self, info: MimgInfo) -> Self {
        let _ = self.mimg.insert(info.opcode, info);
        self
    }

    /// Registers an image base operation.
    #[must_use]
    pub fn with_mimg_base(mut self, info: MimgBaseOpcodeInfo) -> Self {
        let _ = self.mimg_base.insert(info.base_opcode, info);
        self
    }
}

impl InstrInfo for MetadataTable {
    fn desc(&self, opcode: Opcode) -> Option<&InstrDesc> {
        self.descs.get(&opcode)
    }

    fn mimg_info(&self, opcode: Opcode) -> Option<&MimgInfo> {
        self.mimg.get(&opcode)
    }

    fn mimg_base_info(&self, base_opcode: u32) -> Option<&MimgBaseOpcodeInfo> {
        self.mimg_base.get(&base_opcode)
    }

    fn mimg_opcode(
        &self,
        base_opcode: u32,
        encoding: MimgEncoding,
        vdata_dwords: u8,
        vaddr_dwords: u8,
    ) -> Option<Opcode> {
        self.mimg
            .values()
            .find(|info| {
                info.base_opcode == base_opcode
                    && info.encoding == encoding
                    && info.vdata_dwords == vdata_dwords
                    && info.vaddr_dwords == vaddr_dwords
            })
            .map(|info| info.opcode)
    }
}
