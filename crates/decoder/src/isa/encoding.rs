//! Operand encoding values.
//!
//! Fixed numeric ranges of the source-operand space, the SDWA operand space and
//! the modifier bit layouts. These are properties of the ISA, not of any table.

/// First SGPR encoding.
pub const SGPR_MIN: u32 = 0;
/// Last SGPR encoding before GFX10.
pub const SGPR_MAX_SI: u32 = 101;
/// Last SGPR encoding on GFX10 and newer.
pub const SGPR_MAX_GFX10: u32 = 105;

/// First TTMP encoding on GFX8.
pub const TTMP_VI_MIN: u32 = 112;
/// Last TTMP encoding on GFX8.
pub const TTMP_VI_MAX: u32 = 123;
/// First TTMP encoding on GFX9 and newer.
pub const TTMP_GFX9PLUS_MIN: u32 = 108;
/// Last TTMP encoding on GFX9 and newer.
pub const TTMP_GFX9PLUS_MAX: u32 = 123;

/// First inline integer constant (value 0).
pub const INLINE_INTEGER_C_MIN: u32 = 128;
/// Last non-negative inline integer constant (value 64).
pub const INLINE_INTEGER_C_POSITIVE_MAX: u32 = 192;
/// Last inline integer constant (value -16).
pub const INLINE_INTEGER_C_MAX: u32 = 208;

/// First inline floating-point constant (0.5).
pub const INLINE_FLOATING_C_MIN: u32 = 240;
/// Last inline floating-point constant (1/(2*pi)).
pub const INLINE_FLOATING_C_MAX: u32 = 248;

/// A 32-bit literal follows the instruction word.
pub const LITERAL_CONST: u32 = 255;

/// First VGPR encoding in the 9-bit source space.
pub const VGPR_MIN: u32 = 256;
/// Last VGPR encoding in the 9-bit source space.
pub const VGPR_MAX: u32 = 511;
/// Bit that marks a vector register in the 9/10-bit source space.
pub const IS_VGPR: u32 = 256;
/// Bit that selects AGPRs over VGPRs in the 10-bit source space.
pub const IS_AGPR: u32 = 512;

/// Inline float bit patterns, indexed by `value - INLINE_FLOATING_C_MIN`.
pub const INLINE_F32: [u32; 9] = [
    0x3F00_0000, // 0.5
    0xBF00_0000, // -0.5
    0x3F80_0000, // 1.0
    0xBF80_0000, // -1.0
    0x4000_0000, // 2.0
    0xC000_0000, // -2.0
    0x4080_0000, // 4.0
    0xC080_0000, // -4.0
    0x3E22_F983, // 1/(2*pi)
];

/// Double-precision inline float bit patterns.
pub const INLINE_F64: [u64; 9] = [
    0x3FE0_0000_0000_0000,
    0xBFE0_0000_0000_0000,
    0x3FF0_0000_0000_0000,
    0xBFF0_0000_0000_0000,
    0x4000_0000_0000_0000,
    0xC000_0000_0000_0000,
    0x4010_0000_0000_0000,
    0xC010_0000_0000_0000,
    0x3FC4_5F30_6DC9_C882,
];

/// Half-precision inline float bit patterns.
pub const INLINE_F16: [u16; 9] = [
    0x3800, 0xB800, 0x3C00, 0xBC00, 0x4000, 0xC000, 0x4400, 0xC400, 0x3118,
];

/// SDWA (GFX9+) source operand space.
pub mod sdwa9 {
    /// First VGPR.
    pub const SRC_VGPR_MIN: u32 = 0;
    /// Last VGPR.
    pub const SRC_VGPR_MAX: u32 = 255;
    /// First SGPR; also the base the scalar space is rebased from.
    pub const SRC_SGPR_MIN: u32 = 256;
    /// Last SGPR before GFX10.
    pub const SRC_SGPR_MAX_SI: u32 = 357;
    /// Last SGPR on GFX10.
    pub const SRC_SGPR_MAX_GFX10: u32 = 361;
    /// First TTMP.
    pub const SRC_TTMP_MIN: u32 = 364;
    /// Last TTMP.
    pub const SRC_TTMP_MAX: u32 = 379;

    /// VOPC destination: set when an explicit SGPR destination is encoded.
    pub const VOPC_DST_VCC_MASK: u32 = 0x80;
    /// VOPC destination: SGPR number.
    pub const VOPC_DST_SGPR_MASK: u32 = 0x7F;
}

/// DPP8 `fi` field markers that confirm a genuine DPP8 encoding.
pub mod dpp8 {
    /// Fetch-inactive disabled.
    pub const FI_0: i64 = 0xE9;
    /// Fetch-inactive enabled.
    pub const FI_1: i64 = 0xEA;
}

/// Source modifier bits carried in `srcN_modifiers`.
pub mod src_mods {
    /// Negate.
    pub const NEG: i64 = 1 << 0;
    /// Absolute value (VOP3) or negate high half (VOP3P).
    pub const NEG_HI: i64 = 1 << 1;
    /// Select high half for the low result.
    pub const OP_SEL_0: i64 = 1 << 2;
    /// Select high half for the high result.
    pub const OP_SEL_1: i64 = 1 << 3;
    /// Destination op_sel, shares the `OP_SEL_1` bit on `src0_modifiers`.
    pub const DST_OP_SEL: i64 = 1 << 3;
}

/// Cache policy bits.
pub mod cpol {
    /// Globally coherent; returning atomics always set it.
    pub const GLC: i64 = 1;
}
