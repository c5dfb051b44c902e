//! Decode table interface.
//!
//! Decode tables are generated offline from the ISA description and consumed
//! here read-only. This module provides:
//! 1. **Table Identity:** `TableId` names every table the cascade may consult.
//! 2. **Entries:** A (mask, pattern, feature predicate) key plus the opcode and its operand directives.
//! 3. **Field Decoders:** The closed set of operand decoders a directive can name.
//! 4. **Sources:** The `TableSource` lookup trait and the in-memory `DecoderTables`.

use std::collections::HashMap;

use crate::common::reg::RegClass;
use crate::config::Features;
use crate::isa::instruction::{BitField, Opcode};

/// Identity of a generated decode table.
///
/// The suffix is the instruction word width the table keys on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum TableId {
    Dpp8Gfx11W96,
    Dpp8Gfx11Fake16W96,
    Dpp8Gfx12W96,
    Dpp8Gfx12Fake16W96,
    DppGfx11W96,
    DppGfx11Fake16W96,
    DppGfx12W96,
    DppGfx12Fake16W96,
    Gfx11W96,
    Gfx12W96,

    Gfx10BW64,
    Dpp8W64,
    Dpp8Gfx11W64,
    Dpp8Gfx11Fake16W64,
    Dpp8Gfx12W64,
    Dpp8Gfx12Fake16W64,
    DppW64,
    DppGfx11W64,
    DppGfx11Fake16W64,
    DppGfx12W64,
    DppGfx12Fake16W64,
    SdwaW64,
    Sdwa9W64,
    Sdwa10W64,
    Gfx80UnpackedW64,
    Gfx9DlW64,

    Gfx8W32,
    AmdgpuW32,
    Gfx9W32,
    Gfx90aW32,
    Gfx10BW32,
    Gfx10W32,
    Gfx11W32,
    Gfx11Fake16W32,
    Gfx12W32,
    Gfx12Fake16W32,

    Gfx940W64,
    Gfx90aW64,
    Gfx8W64,
    AmdgpuW64,
    Gfx9W64,
    Gfx10W64,
    Gfx12W64,
    Gfx12Fake16W64,
    Gfx11W64,
    Gfx11Fake16W64,
    WmmaGfx11W64,
}

impl TableId {
    /// Generator-side table name, used in trace output.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dpp8Gfx11W96 => "DPP8GFX1196",
            Self::Dpp8Gfx11Fake16W96 => "DPP8GFX11_FAKE1696",
            Self::Dpp8Gfx12W96 => "DPP8GFX1296",
            Self::Dpp8Gfx12Fake16W96 => "DPP8GFX12_FAKE1696",
            Self::DppGfx11W96 => "DPPGFX1196",
            Self::DppGfx11Fake16W96 => "DPPGFX11_FAKE1696",
            Self::DppGfx12W96 => "DPPGFX1296",
            Self::DppGfx12Fake16W96 => "DPPGFX12_FAKE1696",
            Self::Gfx11W96 => "GFX1196",
            Self::Gfx12W96 => "GFX1296",
            Self::Gfx10BW64 => "GFX10_B64",
            Self::Dpp8W64 => "DPP864",
            Self::Dpp8Gfx11W64 => "DPP8GFX1164",
            Self::Dpp8Gfx11Fake16W64 => "DPP8GFX11_FAKE1664",
            Self::Dpp8Gfx12W64 => "DPP8GFX1264",
            Self::Dpp8Gfx12Fake16W64 => "DPP8GFX12_FAKE1664",
            Self::DppW64 => "DPP64",
            Self::DppGfx11W64 => "DPPGFX1164",
            Self::DppGfx11Fake16W64 => "DPPGFX11_FAKE1664",
            Self::DppGfx12W64 => "DPPGFX1264",
            Self::DppGfx12Fake16W64 => "DPPGFX12_FAKE1664",
            Self::SdwaW64 => "SDWA64",
            Self::Sdwa9W64 => "SDWA964",
            Self::Sdwa10W64 => "SDWA1064",
            Self::Gfx80UnpackedW64 => "GFX80_UNPACKED64",
            Self::Gfx9DlW64 => "GFX9_DL64",
            Self::Gfx8W32 => "GFX832",
            Self::AmdgpuW32 => "AMDGPU32",
            Self::Gfx9W32 => "GFX932",
            Self::Gfx90aW32 => "GFX90A32",
            Self::Gfx10BW32 => "GFX10_B32",
            Self::Gfx10W32 => "GFX1032",
            Self::Gfx11W32 => "GFX1132",
            Self::Gfx11Fake16W32 => "GFX11_FAKE1632",
            Self::Gfx12W32 => "GFX1232",
            Self::Gfx12Fake16W32 => "GFX12_FAKE1632",
            Self::Gfx940W64 => "GFX94064",
            Self::Gfx90aW64 => "GFX90A64",
            Self::Gfx8W64 => "GFX864",
            Self::AmdgpuW64 => "AMDGPU64",
            Self::Gfx9W64 => "GFX964",
            Self::Gfx10W64 => "GFX1064",
            Self::Gfx12W64 => "GFX1264",
            Self::Gfx12Fake16W64 => "GFX12_FAKE1664",
            Self::Gfx11W64 => "GFX1164",
            Self::Gfx11Fake16W64 => "GFX11_FAKE1664",
            Self::WmmaGfx11W64 => "WMMAGFX1164",
        }
    }
}

/// How a general source field is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SrcSpec {
    /// Semantic operand width in bits; selects register classes.
    pub width: u16,
    /// Width of inline float constants (0 behaves as 32).
    pub imm_width: u16,
    /// A literal is returned as the sentinel and resolved later.
    pub mandatory_literal: bool,
    /// Floating-point context; 64-bit literals land in the high half.
    pub is_fp: bool,
    /// Bits OR'ed into the raw value before decoding (forces VGPR or AGPR space).
    pub force_bits: u32,
}

impl SrcSpec {
    /// A register-or-constant source of `width` bits with `imm_width` inline floats.
    pub const fn new(width: u16, imm_width: u16) -> Self {
        Self {
            width,
            imm_width,
            mandatory_literal: false,
            is_fp: false,
            force_bits: 0,
        }
    }

    /// Returns the source with deferred literal handling.
    #[must_use]
    pub const fn deferred(mut self) -> Self {
        self.mandatory_literal = true;
        self
    }

    /// Returns the source in floating-point context.
    #[must_use]
    pub const fn fp(mut self) -> Self {
        self.is_fp = true;
        self
    }

    /// Returns the source with `bits` forced on in the raw value.
    #[must_use]
    pub const fn forcing(mut self, bits: u32) -> Self {
        self.force_bits = bits;
        self
    }
}

/// Operand decoder named by a table directive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldDecoder {
    /// Register of `class` at the raw index.
    Reg(RegClass),
    /// General 9/10-bit source operand.
    Src(SrcSpec),
    /// 16-bit VGPR half; the `Lo128` form has a 7-bit index and the half in bit 7.
    Vgpr16 {
        /// 8-bit field addressing only the low 128 VGPRs.
        lo128: bool,
    },
    /// True16 source: a 16-bit VGPR half or a scalar/constant.
    SrcT16 {
        /// 9-bit field addressing only the low 128 VGPRs.
        lo128: bool,
    },
    /// Load/store data that may be AGPR or VGPR, of `width` bits.
    AvLdSt(u16),
    /// Mandatory literal carried in the field itself.
    KImm,
    /// VOPD Y destination; its low bit is implied by the X destination.
    VopdDstY,
    /// Wave-size condition mask register.
    BoolReg,
    /// Named barrier operand.
    SplitBarrier,
    /// SDWA source of `bits` width (16 or 32).
    SdwaSrc(u16),
    /// SDWA compare destination.
    SdwaVopcDst,
    /// SOPP branch offset; resolved through the symbolizer.
    BranchTarget,
    /// Scalar memory offset.
    SmemOffset,
    /// Plain immediate.
    Imm {
        /// Sign-extend from the field width.
        signed: bool,
    },
    /// Copy of an operand already decoded at this index.
    Tied(usize),
}

/// One operand directive: where the raw bits live and how to decode them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OperandDirective {
    /// Raw field.
    pub field: BitField,
    /// Decoder to apply.
    pub decoder: FieldDecoder,
}

/// A decode table entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableEntry {
    /// Bits that take part in the match.
    pub mask: u128,
    /// Required value of the masked bits.
    pub pattern: u128,
    /// Features the target must have.
    pub required: Features,
    /// Opcode produced on a match.
    pub opcode: Opcode,
    /// Operand directives, producing operands in order.
    pub operands: Vec<OperandDirective>,
}

impl TableEntry {
    /// Creates an entry with no feature predicate and no operands.
    pub const fn new(opcode: Opcode, mask: u128, pattern: u128) -> Self {
        Self {
            mask,
            pattern,
            required: Features::empty(),
            opcode,
            operands: Vec::new(),
        }
    }

    /// Returns the entry gated on `features`.
    #[must_use]
    pub const fn requires(mut self, features: Features) -> Self {
        self.required = features;
        self
    }

    /// Returns the entry with one more operand directive.
    #[must_use]
    pub fn operand(mut self, field: BitField, decoder: FieldDecoder) -> Self {
        self.operands.push(OperandDirective { field, decoder });
        self
    }

    /// Returns true if `word` matches and the target has the required features.
    #[inline]
    pub fn matches(&self, word: u128, features: Features) -> bool {
        word & self.mask == self.pattern && features.contains(self.required)
    }
}

/// Lookup of decode tables by identity.
pub trait TableSource {
    /// Entries of `id` in priority order, or `None` if the table is absent.
    fn table(&self, id: TableId) -> Option<&[TableEntry]>;
}

/// In-memory decode tables.
#[derive(Clone, Debug, Default)]
pub struct DecoderTables {
    tables: HashMap<TableId, Vec<TableEntry>>,
}

impl DecoderTables {
    /// Creates an empty set of tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces table `id` with `entries`.
    #[must_use]
    pub fn with_table(mut self, id: TableId, entries: Vec<TableEntry>) -> Self {
        let _ = self.tables.insert(id, entries);
        self
    }

    /// Appends `entry` to table `id`.
    pub fn push(&mut self, id: TableId, entry: TableEntry) {
        self.tables.entry(id).or_default().push(entry);
    }
}

impl TableSource for DecoderTables {
    fn table(&self, id: TableId) -> Option<&[TableEntry]> {
        self.tables.get(&id).map(Vec::as_slice)
    }
}
