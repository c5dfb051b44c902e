//! Table cascade.
//!
//! Several instruction shapes share their leading bits, so a window is tried
//! against tables in a fixed priority order, longest and most specific
//! encodings first. The order is data: `CASCADE` lists every step, and the
//! driver walks it with a single loop.
//!
//! Each step names:
//! 1. **Width:** How many bytes form the instruction word (12, 8 or 4).
//! 2. **Tables:** One table, or a pair where the second holds the fake16 forms.
//! 3. **Gate:** Target features the step requires.
//! 4. **Fixup:** The conversion a match must pass before it is accepted.

use crate::common::error::DecodeStatus;
use crate::config::Features;
use crate::isa::dpp;
use crate::isa::instruction::Instruction;
use crate::isa::metadata::{InstrDesc, InstrFlags, OperandName};
use crate::isa::table::TableId;

/// Instruction word width of a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WordWidth {
    /// 96-bit words (GFX11+ VOP3 DPP forms).
    W96,
    /// 64-bit words.
    W64,
    /// 32-bit words.
    W32,
}

impl WordWidth {
    /// Width in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            Self::W96 => 12,
            Self::W64 => 8,
            Self::W32 => 4,
        }
    }
}

/// Conversion applied to a step's match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepFixup {
    /// Accept as decoded.
    None,
    /// Complete the DPP8 operands and require a valid `fi` marker.
    Dpp8,
    /// As `Dpp8`, but only for opcodes that have a `dpp8` operand.
    Dpp8IfPresent,
    /// Rebuild VOP3/VOP3P/VOPC DPP16 operands.
    VopDpp,
    /// Rebuild VOPC DPP16 operands for compare opcodes.
    VopcDpp,
    /// Mark the match as SDWA for the normalizer.
    Sdwa,
}

impl StepFixup {
    /// Applies the fixup to a fresh match.
    ///
    /// # Returns
    ///
    /// The status of the candidate. Only `Success` ends the cascade.
    pub fn apply(self, inst: &mut Instruction, desc: Option<&InstrDesc>) -> DecodeStatus {
        let Some(desc) = desc else {
            return match self {
                Self::Dpp8 => DecodeStatus::SoftFail,
                _ => DecodeStatus::Success,
            };
        };
        match self {
            Self::None | Self::Sdwa => DecodeStatus::Success,
            Self::Dpp8 => dpp::convert_dpp8(inst, desc),
            Self::Dpp8IfPresent => {
                if desc.has_named(OperandName::Dpp8) {
                    dpp::convert_dpp8(inst, desc)
                } else {
                    DecodeStatus::Success
                }
            }
            Self::VopDpp => {
                dpp::convert_vop_dpp(inst, desc);
                DecodeStatus::Success
            }
            Self::VopcDpp => {
                if desc.is_any(InstrFlags::VOPC) {
                    dpp::convert_vopc_dpp(inst, desc);
                }
                DecodeStatus::Success
            }
        }
    }
}

/// One cascade step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CascadeStep {
    /// Word width.
    pub width: WordWidth,
    /// Tables, tried in order; the first match decides the step.
    pub tables: &'static [TableId],
    /// Features the target must have.
    pub gate: Features,
    /// Conversion applied to a match.
    pub fixup: StepFixup,
}

const fn step(width: WordWidth, tables: &'static [TableId], fixup: StepFixup) -> CascadeStep {
    CascadeStep {
        width,
        tables,
        gate: Features::empty(),
        fixup,
    }
}

const fn gated(width: WordWidth, tables: &'static [TableId], gate: Features) -> CascadeStep {
    CascadeStep {
        width,
        tables,
        gate,
        fixup: StepFixup::None,
    }
}

use StepFixup as F;
use TableId as T;
use WordWidth as W;

/// Every cascade step in priority order.
///
/// 96-bit steps only run on GFX11 and newer.
pub static CASCADE: &[CascadeStep] = &[
    step(W::W96, &[T::Dpp8Gfx11W96, T::Dpp8Gfx11Fake16W96], F::Dpp8),
    step(W::W96, &[T::Dpp8Gfx12W96, T::Dpp8Gfx12Fake16W96], F::Dpp8),
    step(W::W96, &[T::DppGfx11W96, T::DppGfx11Fake16W96], F::VopDpp),
    step(W::W96, &[T::DppGfx12W96, T::DppGfx12Fake16W96], F::VopDpp),
    step(W::W96, &[T::Gfx11W96], F::None),
    step(W::W96, &[T::Gfx12W96], F::None),
    CascadeStep {
        width: W::W64,
        tables: &[T::Gfx10BW64],
        gate: Features::GFX10_B_ENCODING,
        fixup: F::Dpp8IfPresent,
    },
    step(W::W64, &[T::Dpp8W64], F::Dpp8),
    step(W::W64, &[T::Dpp8Gfx11W64, T::Dpp8Gfx11Fake16W64], F::Dpp8),
    step(W::W64, &[T::Dpp8Gfx12W64, T::Dpp8Gfx12Fake16W64], F::Dpp8),
    step(W::W64, &[T::DppW64], F::None),
    step(W::W64, &[T::DppGfx11W64, T::DppGfx11Fake16W64], F::VopcDpp),
    step(W::W64, &[T::DppGfx12W64, T::DppGfx12Fake16W64], F::VopcDpp),
    step(W::W64, &[T::SdwaW64], F::Sdwa),
    step(W::W64, &[T::Sdwa9W64], F::Sdwa),
    step(W::W64, &[T::Sdwa10W64], F::Sdwa),
    gated(W::W64, &[T::Gfx80UnpackedW64], Features::UNPACKED_D16_VMEM),
    gated(W::W64, &[T::Gfx9DlW64], Features::FMA_MIX_INSTS),
    step(W::W32, &[T::Gfx8W32], F::None),
    step(W::W32, &[T::AmdgpuW32], F::None),
    step(W::W32, &[T::Gfx9W32], F::None),
    gated(W::W32, &[T::Gfx90aW32], Features::GFX90A_INSTS),
    gated(W::W32, &[T::Gfx10BW32], Features::GFX10_B_ENCODING),
    step(W::W32, &[T::Gfx10W32], F::None),
    step(W::W32, &[T::Gfx11W32, T::Gfx11Fake16W32], F::None),
    step(W::W32, &[T::Gfx12W32, T::Gfx12Fake16W32], F::None),
    gated(W::W64, &[T::Gfx940W64], Features::GFX940_INSTS),
    gated(W::W64, &[T::Gfx90aW64], Features::GFX90A_INSTS),
    step(W::W64, &[T::Gfx8W64], F::None),
    step(W::W64, &[T::AmdgpuW64], F::None),
    step(W::W64, &[T::Gfx9W64], F::None),
    step(W::W64, &[T::Gfx10W64], F::None),
    step(W::W64, &[T::Gfx12W64, T::Gfx12Fake16W64], F::None),
    step(W::W64, &[T::Gfx11W64, T::Gfx11Fake16W64], F::None),
    step(W::W64, &[T::WmmaGfx11W64], F::None),
];
