//! Operand value decoding.
//!
//! Maps raw operand fields to registers, inline constants and literals. The
//! source-operand space is a union that changes with the target generation:
//! 1. **Vector Registers:** Bit 8 marks a VGPR; bit 9 (10-bit fields) selects AGPRs.
//! 2. **Scalar Registers:** SGPRs and trap temporaries, indexed in aligned groups for tuples.
//! 3. **Constants:** Inline integers, inline floats and the trailing 32-bit literal.
//! 4. **Named Registers:** `vcc`, `exec`, `m0`, apertures and the other special sources.
//!
//! Besides the general source decoder this module implements every field
//! decoder a table directive can name (`FieldDecoder`).

use std::fmt;

use tracing::warn;

use crate::common::error::DecodeError;
use crate::common::reg::{RegClass, RegKind, Register, RegisterInfo, SpecialRegister, scalar_shift};
use crate::config::Target;
use crate::isa::context::{DecodeContext, Literal};
use crate::isa::encoding::{
    INLINE_F16, INLINE_F32, INLINE_F64, INLINE_FLOATING_C_MAX, INLINE_FLOATING_C_MIN,
    INLINE_INTEGER_C_MAX, INLINE_INTEGER_C_MIN, INLINE_INTEGER_C_POSITIVE_MAX, IS_AGPR, IS_VGPR,
    LITERAL_CONST, SGPR_MAX_GFX10, SGPR_MAX_SI, TTMP_GFX9PLUS_MAX, TTMP_GFX9PLUS_MIN, TTMP_VI_MAX,
    TTMP_VI_MIN, VGPR_MAX, VGPR_MIN, sdwa9,
};
use crate::isa::instruction::{Instruction, Operand, sign_extend};
use crate::isa::metadata::{InstrDesc, InstrFlags, OperandName};
use crate::isa::table::{FieldDecoder, OperandDirective, SrcSpec};

/// Result of decoding one operand field.
pub type OperandResult = Result<Operand, DecodeError>;

/// Decoder of raw operand fields for one target.
pub struct OperandDecoder<'d> {
    target: &'d Target,
    regs: &'d dyn RegisterInfo,
}

impl fmt::Debug for OperandDecoder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperandDecoder")
            .field("target", self.target)
            .finish_non_exhaustive()
    }
}

/// Class of `kind` registers wide enough for a `width`-bit operand.
///
/// Sub-dword operands live in full 32-bit registers.
const fn class_for(kind: RegKind, width: u16) -> RegClass {
    RegClass::new(kind, if width < 32 { 32 } else { width })
}

impl<'d> OperandDecoder<'d> {
    /// Creates a decoder for `target` resolving registers through `regs`.
    pub fn new(target: &'d Target, regs: &'d dyn RegisterInfo) -> Self {
        Self { target, regs }
    }

    /// Highest SGPR encoding of the target.
    #[inline]
    pub fn sgpr_max(&self) -> u32 {
        if self.target.is_gfx10_plus() {
            SGPR_MAX_GFX10
        } else {
            SGPR_MAX_SI
        }
    }

    /// TTMP number for a raw scalar value, if it lies in the TTMP range.
    pub fn ttmp_index(&self, val: u32) -> Option<u32> {
        let (min, max) = if self.target.is_gfx9_plus() {
            (TTMP_GFX9PLUS_MIN, TTMP_GFX9PLUS_MAX)
        } else {
            (TTMP_VI_MIN, TTMP_VI_MAX)
        };
        (min..=max).contains(&val).then(|| val - min)
    }

    /// Register of `class` at `index`.
    ///
    /// # Errors
    ///
    /// `DecodeError::UnknownRegister` if the class has no such member.
    pub fn reg(&self, class: RegClass, index: u32) -> OperandResult {
        self.regs
            .register(class, index)
            .map(Operand::Register)
            .ok_or(DecodeError::UnknownRegister { class, index })
    }

    /// Scalar register of `class` from a raw SGPR or TTMP number.
    ///
    /// Tuples are indexed in aligned groups. A misaligned number still decodes
    /// (rounded down) and leaves a warning comment.
    pub fn sreg(&self, ctx: &mut DecodeContext<'_>, class: RegClass, val: u32) -> OperandResult {
        let shift = scalar_shift(class.bits);
        if val % (1 << shift) != 0 {
            warn!(%class, val, "scalar register is not aligned");
            ctx.comment(format!("Warning: {class}: scalar reg isn't aligned {val}"));
        }
        self.reg(class, val >> shift)
    }

    /// Decodes a general 9/10-bit source field.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Per-call state; the literal slot and cursor may be updated.
    /// * `spec` - Operand width, inline-constant width and literal handling.
    /// * `raw` - Field value before `spec.force_bits` is applied.
    pub fn src(&self, ctx: &mut DecodeContext<'_>, spec: SrcSpec, raw: u32) -> OperandResult {
        let raw = raw | spec.force_bits;
        let is_agpr = raw & IS_AGPR != 0;
        let val = raw & (IS_AGPR - 1);
        if (VGPR_MIN..=VGPR_MAX).contains(&val) {
            let kind = if is_agpr { RegKind::Agpr } else { RegKind::Vgpr };
            return self.reg(class_for(kind, spec.width), val - VGPR_MIN);
        }
        self.non_vgpr_src(ctx, spec, val & 0xFF)
    }

    /// Decodes the scalar/constant half (`val < 256`) of the source space.
    pub fn non_vgpr_src(&self, ctx: &mut DecodeContext<'_>, spec: SrcSpec, val: u32) -> OperandResult {
        if val <= self.sgpr_max() {
            return self.sreg(ctx, class_for(RegKind::Sgpr, spec.width), val);
        }
        if let Some(idx) = self.ttmp_index(val) {
            return self.sreg(ctx, class_for(RegKind::Ttmp, spec.width), idx);
        }
        if (INLINE_INTEGER_C_MIN..=INLINE_INTEGER_C_MAX).contains(&val) {
            return Ok(Operand::Immediate(Self::int_imm(val)));
        }
        if (INLINE_FLOATING_C_MIN..=INLINE_FLOATING_C_MAX).contains(&val) {
            return Self::fp_imm(spec.imm_width, val).map(Operand::Immediate);
        }
        if val == LITERAL_CONST {
            if spec.mandatory_literal {
                return Ok(Operand::Immediate(i64::from(LITERAL_CONST)));
            }
            return self.literal(ctx, spec.is_fp && spec.imm_width == 64);
        }
        match spec.width {
            16 | 32 => self.special_reg32(val),
            64 => self.special_reg64(val),
            width => Err(DecodeError::UnsupportedWidth(width)),
        }
    }

    /// Value of an inline integer constant (128..=208).
    #[inline]
    pub const fn int_imm(val: u32) -> i64 {
        if val <= INLINE_INTEGER_C_POSITIVE_MAX {
            val as i64 - INLINE_INTEGER_C_MIN as i64
        } else {
            INLINE_INTEGER_C_POSITIVE_MAX as i64 - val as i64
        }
    }

    /// Bit pattern of an inline float constant (240..=248) at `imm_width` bits.
    ///
    /// # Errors
    ///
    /// `DecodeError::UnsupportedWidth` for widths other than 0, 16, 32 and 64.
    pub fn fp_imm(imm_width: u16, val: u32) -> Result<i64, DecodeError> {
        let idx = (val - INLINE_FLOATING_C_MIN) as usize;
        match imm_width {
            0 | 32 => Ok(i64::from(INLINE_F32[idx])),
            64 => Ok(INLINE_F64[idx] as i64),
            16 => Ok(i64::from(INLINE_F16[idx])),
            width => Err(DecodeError::UnsupportedWidth(width)),
        }
    }

    /// Reads (once per attempt) and returns the trailing literal.
    ///
    /// With `extend_fp64` on the first reference the word becomes the high half
    /// of a 64-bit floating-point value.
    ///
    /// # Errors
    ///
    /// `DecodeError::LiteralTruncated` if fewer than four bytes remain.
    pub fn literal(&self, ctx: &mut DecodeContext<'_>, extend_fp64: bool) -> OperandResult {
        let lit = match ctx.literal() {
            Some(lit) => lit,
            None => {
                let available = ctx.cursor.remaining();
                let value = ctx
                    .cursor
                    .read_u32()
                    .ok_or(DecodeError::LiteralTruncated { available })?;
                let value64 = if extend_fp64 {
                    u64::from(value) << 32
                } else {
                    u64::from(value)
                };
                let lit = Literal { value, value64 };
                ctx.set_literal(lit);
                lit
            }
        };
        Ok(Operand::Immediate(if extend_fp64 {
            lit.value64 as i64
        } else {
            i64::from(lit.value)
        }))
    }

    /// Takes the field itself as the instruction's literal.
    ///
    /// # Errors
    ///
    /// `DecodeError::ConflictingLiteral` if a different literal is already held.
    pub fn mandatory_literal(&self, ctx: &mut DecodeContext<'_>, val: u32) -> OperandResult {
        if let Some(held) = ctx.literal() {
            if held.value != val {
                return Err(DecodeError::ConflictingLiteral {
                    held: held.value,
                    found: val,
                });
            }
        }
        ctx.set_literal(Literal {
            value: val,
            value64: u64::from(val),
        });
        Ok(Operand::Immediate(i64::from(val)))
    }

    /// Named register for a 32-bit (or narrower) operand.
    pub fn special_reg32(&self, val: u32) -> OperandResult {
        use SpecialRegister as S;
        let gfx11 = self.target.is_gfx11_plus();
        let reg = match val {
            102 => S::FlatScratchLo,
            103 => S::FlatScratchHi,
            104 => S::XnackMaskLo,
            105 => S::XnackMaskHi,
            106 => S::VccLo,
            107 => S::VccHi,
            108 => S::TbaLo,
            109 => S::TbaHi,
            110 => S::TmaLo,
            111 => S::TmaHi,
            124 => {
                if gfx11 {
                    S::Null
                } else {
                    S::M0
                }
            }
            125 => {
                if gfx11 {
                    S::M0
                } else {
                    S::Null
                }
            }
            126 => S::ExecLo,
            127 => S::ExecHi,
            235 => S::SharedBaseLo,
            236 => S::SharedLimitLo,
            237 => S::PrivateBaseLo,
            238 => S::PrivateLimitLo,
            239 => S::PopsExitingWaveId,
            251 => S::Vccz,
            252 => S::Execz,
            253 => S::Scc,
            254 => S::LdsDirect,
            _ => return Err(DecodeError::UnknownOperandEncoding(val)),
        };
        Ok(Operand::Register(Register::Special(reg)))
    }

    /// Named register for a 64-bit operand.
    pub fn special_reg64(&self, val: u32) -> OperandResult {
        use SpecialRegister as S;
        let gfx11 = self.target.is_gfx11_plus();
        let reg = match val {
            102 => S::FlatScratch,
            104 => S::XnackMask,
            106 => S::Vcc,
            108 => S::Tba,
            110 => S::Tma,
            124 if gfx11 => S::Null,
            125 if !gfx11 => S::Null,
            126 => S::Exec,
            235 => S::SharedBase,
            236 => S::SharedLimit,
            237 => S::PrivateBase,
            238 => S::PrivateLimit,
            239 => S::PopsExitingWaveId,
            251 => S::Vccz,
            252 => S::Execz,
            253 => S::Scc,
            _ => return Err(DecodeError::UnknownOperandEncoding(val)),
        };
        Ok(Operand::Register(Register::Special(reg)))
    }

    /// SDWA source of `width` bits.
    ///
    /// GFX9 and GFX10 fold scalar registers and constants into the same 9-bit
    /// field as VGPRs; GFX8 only encodes VGPRs.
    pub fn sdwa_src(&self, ctx: &mut DecodeContext<'_>, width: u16, val: u32) -> OperandResult {
        if self.target.is_vi() {
            return self.reg(class_for(RegKind::Vgpr, width), val);
        }
        let sgpr_max = if self.target.is_gfx10_plus() {
            sdwa9::SRC_SGPR_MAX_GFX10
        } else {
            sdwa9::SRC_SGPR_MAX_SI
        };
        if (sdwa9::SRC_VGPR_MIN..=sdwa9::SRC_VGPR_MAX).contains(&val) {
            return self.reg(class_for(RegKind::Vgpr, width), val - sdwa9::SRC_VGPR_MIN);
        }
        if (sdwa9::SRC_SGPR_MIN..=sgpr_max).contains(&val) {
            return self.sreg(ctx, class_for(RegKind::Sgpr, width), val - sdwa9::SRC_SGPR_MIN);
        }
        if (sdwa9::SRC_TTMP_MIN..=sdwa9::SRC_TTMP_MAX).contains(&val) {
            return self.sreg(ctx, class_for(RegKind::Ttmp, width), val - sdwa9::SRC_TTMP_MIN);
        }
        let sval = val - sdwa9::SRC_SGPR_MIN;
        if (INLINE_INTEGER_C_MIN..=INLINE_INTEGER_C_MAX).contains(&sval) {
            return Ok(Operand::Immediate(Self::int_imm(sval)));
        }
        if (INLINE_FLOATING_C_MIN..=INLINE_FLOATING_C_MAX).contains(&sval) {
            return Self::fp_imm(width, sval).map(Operand::Immediate);
        }
        self.special_reg32(sval)
    }

    /// SDWA compare destination: `vcc` unless an explicit scalar is encoded.
    pub fn sdwa_vopc_dst(&self, ctx: &mut DecodeContext<'_>, val: u32) -> OperandResult {
        let wave64 = !self.target.is_wave32();
        let width = if wave64 { 64 } else { 32 };
        if val & sdwa9::VOPC_DST_VCC_MASK == 0 {
            let vcc = if wave64 {
                SpecialRegister::Vcc
            } else {
                SpecialRegister::VccLo
            };
            return Ok(Operand::Register(Register::Special(vcc)));
        }
        let val = val & sdwa9::VOPC_DST_SGPR_MASK;
        if let Some(idx) = self.ttmp_index(val) {
            return self.sreg(ctx, class_for(RegKind::Ttmp, width), idx);
        }
        if val > self.sgpr_max() {
            return if wave64 {
                self.special_reg64(val)
            } else {
                self.special_reg32(val)
            };
        }
        self.sreg(ctx, class_for(RegKind::Sgpr, width), val)
    }

    /// Condition mask register, as wide as the wavefront.
    pub fn bool_reg(&self, ctx: &mut DecodeContext<'_>, val: u32) -> OperandResult {
        let width = if self.target.is_wave32() { 32 } else { 64 };
        self.src(ctx, SrcSpec::new(width, 0), val)
    }

    /// 16-bit VGPR half.
    ///
    /// The full form carries the VGPR in bits 0-7 and the half in bit 9; the
    /// `lo128` form carries it in bits 0-6 and the half in bit 7.
    pub fn vgpr16(&self, val: u32, lo128: bool) -> OperandResult {
        let (idx, hi) = if lo128 {
            (val & 0x7F, val & (1 << 7) != 0)
        } else {
            (val & 0xFF, val & (1 << 9) != 0)
        };
        self.reg(RegClass::VGPR_16, idx * 2 + u32::from(hi))
    }

    /// True16 source: a VGPR half when bit 8 is set, otherwise a 16-bit scalar or constant.
    pub fn src_t16(&self, ctx: &mut DecodeContext<'_>, val: u32, lo128: bool) -> OperandResult {
        if val & IS_VGPR != 0 {
            return self.vgpr16(val, lo128);
        }
        self.non_vgpr_src(ctx, SrcSpec::new(16, 16), val & 0xFF)
    }

    /// Load/store data that may live in AGPRs.
    ///
    /// On GFX90A the AGPR bit is not encoded for the data operand; it follows
    /// `vdst` (or `data0` for the second DS data operand).
    pub fn av_ldst(
        &self,
        ctx: &mut DecodeContext<'_>,
        inst: &Instruction,
        desc: &InstrDesc,
        width: u16,
        val: u32,
    ) -> OperandResult {
        let mut val = val;
        if self.target.is_gfx90a() {
            let is_ds = desc.is_any(InstrFlags::DS);
            let data_name = if is_ds {
                OperandName::Data0
            } else {
                OperandName::Vdata
            };
            let data_idx = desc.named_index(data_name);
            let is_agpr_at = |idx: Option<usize>| {
                idx.and_then(|i| inst.reg(i))
                    .is_some_and(Register::is_agpr)
            };
            if data_idx == Some(inst.len()) && is_agpr_at(desc.named_index(OperandName::Vdst)) {
                val |= IS_AGPR;
            }
            if is_ds && desc.named_index(OperandName::Data1) == Some(inst.len()) && is_agpr_at(data_idx) {
                val |= IS_AGPR;
            }
        } else {
            val &= IS_AGPR - 1;
        }
        self.src(ctx, SrcSpec::new(width, 0), val | IS_VGPR)
    }

    /// VOPD `vdstY`: bit 0 is the complement of `vdstX`'s bit 0.
    pub fn vopd_dst_y(&self, inst: &Instruction, desc: &InstrDesc, val: u32) -> OperandResult {
        let x = desc
            .named_index(OperandName::VdstX)
            .and_then(|idx| inst.reg(idx))
            .ok_or(DecodeError::MissingOperand(OperandName::VdstX))?;
        let val = val | (!u32::from(x.encoding()) & 1);
        self.reg(RegClass::VGPR_32, val)
    }

    /// SOPP branch target.
    ///
    /// The target is `address + 4 + sext18(imm * 4)`. A symbolizer hit yields a
    /// symbolic operand; otherwise the raw offset is kept.
    pub fn branch_target(&self, ctx: &mut DecodeContext<'_>, imm: u64) -> Operand {
        let offset = sign_extend(imm.wrapping_mul(4) & 0x3_FFFF, 18);
        let target = ctx.address.wrapping_add(4).wrapping_add_signed(offset);
        match ctx.resolve_branch_target(target) {
            Some(name) => Operand::Expr(name),
            None => Operand::Immediate(imm as i64),
        }
    }

    /// Scalar memory offset.
    pub fn smem_offset(&self, imm: u64) -> Operand {
        let offset = if self.target.is_gfx12_plus() {
            sign_extend(imm, 24)
        } else if self.target.is_vi() {
            (imm & 0xF_FFFF) as i64
        } else {
            sign_extend(imm, 21)
        };
        Operand::Immediate(offset)
    }

    /// Decodes one directive against `word`.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Per-call state.
    /// * `inst` - Operands decoded so far; some decoders depend on them.
    /// * `desc` - Schema of the matched opcode, when the metadata has one.
    /// * `directive` - Field location and decoder.
    /// * `word` - Instruction word the table matched.
    pub fn decode_field(
        &self,
        ctx: &mut DecodeContext<'_>,
        inst: &Instruction,
        desc: Option<&InstrDesc>,
        directive: &OperandDirective,
        word: u128,
    ) -> OperandResult {
        let raw = directive.field.extract(word);
        let val = raw as u32;
        let need_desc = || desc.ok_or(DecodeError::UnknownOpcode(inst.opcode));
        match directive.decoder {
            FieldDecoder::Reg(class) => self.reg(class, val),
            FieldDecoder::Src(spec) => self.src(ctx, spec, val),
            FieldDecoder::Vgpr16 { lo128 } => self.vgpr16(val, lo128),
            FieldDecoder::SrcT16 { lo128 } => self.src_t16(ctx, val, lo128),
            FieldDecoder::AvLdSt(width) => self.av_ldst(ctx, inst, need_desc()?, width, val),
            FieldDecoder::KImm => self.mandatory_literal(ctx, val),
            FieldDecoder::VopdDstY => self.vopd_dst_y(inst, need_desc()?, val),
            FieldDecoder::BoolReg => self.bool_reg(ctx, val),
            FieldDecoder::SplitBarrier => self.src(ctx, SrcSpec::new(32, 0), val),
            FieldDecoder::SdwaSrc(width) => self.sdwa_src(ctx, width, val),
            FieldDecoder::SdwaVopcDst => self.sdwa_vopc_dst(ctx, val),
            FieldDecoder::BranchTarget => Ok(self.branch_target(ctx, raw)),
            FieldDecoder::SmemOffset => Ok(self.smem_offset(raw)),
            FieldDecoder::Imm { signed } => Ok(Operand::Immediate(if signed {
                sign_extend(raw, u32::from(directive.field.width))
            } else {
                raw as i64
            })),
            FieldDecoder::Tied(idx) => inst
                .operand(idx)
                .cloned()
                .ok_or(DecodeError::MissingOperand(OperandName::Other("tied"))),
        }
    }
}
