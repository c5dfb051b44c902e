//! Target description for the decoder.
//!
//! This module defines the capability set that every table-selection and
//! field-interpretation decision is made against. It provides:
//! 1. **Generations:** The ISA families (GFX8 through GFX12) that change operand ranges.
//! 2. **Features:** Named boolean capabilities that gate tables and fixups.
//! 3. **Presets:** Ready-made targets for common processors.
//!
//! A `Target` is supplied as JSON (`Target::from_json`), by name (`Target::preset`),
//! or built directly. It is immutable once handed to a decoder.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer};

use crate::common::error::ConfigError;

/// Default configuration constants for targets.
mod defaults {
    /// Code object version assumed when none is given (COV5).
    pub const CODE_OBJECT_VERSION: u32 = 5;

    /// Maximum instruction length in bytes for targets without long encodings.
    pub const MAX_INST_BYTES_BASE: usize = 8;

    /// Maximum instruction length when a VOP3 literal may trail a 64-bit encoding.
    pub const MAX_INST_BYTES_VOP3_LITERAL: usize = 12;

    /// Maximum instruction length when non-sequential image addresses are encoded.
    pub const MAX_INST_BYTES_NSA: usize = 20;

    /// Number of SGPRs per allocation granule in the kernel descriptor.
    pub const SGPR_ENCODING_GRANULE: u32 = 8;
}

/// ISA generation of the target processor.
///
/// Ordering follows release order, so `generation >= Generation::Gfx10`
/// reads as "GFX10 or newer".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Generation {
    /// GCN3 / Volcanic Islands (gfx8xx).
    #[serde(alias = "vi")]
    Gfx8,
    /// Vega and CDNA (gfx9xx).
    #[default]
    Gfx9,
    /// RDNA1 and RDNA2 (gfx10xx).
    Gfx10,
    /// RDNA3 (gfx11xx).
    Gfx11,
    /// RDNA4 (gfx12xx).
    Gfx12,
}

bitflags! {
    /// Named capabilities of a target.
    ///
    /// Flag names match the spelling accepted in JSON target files.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Features: u32 {
        /// GCN3 instruction encoding.
        const GCN3_ENCODING = 1 << 0;
        /// GFX10.3 (`_B`) encoding additions.
        const GFX10_B_ENCODING = 1 << 1;
        /// CDNA2 instructions; AGPR/VGPR unified load/store data.
        const GFX90A_INSTS = 1 << 2;
        /// CDNA3 instructions.
        const GFX940_INSTS = 1 << 3;
        /// GFX11 instructions (EXP without `vm`/`compr` bits).
        const GFX11_INSTS = 1 << 4;
        /// D16 memory data is unpacked, one component per register.
        const UNPACKED_D16_VMEM = 1 << 5;
        /// FMA-mix instructions replace MAD-mix.
        const FMA_MIX_INSTS = 1 << 6;
        /// Wavefront of 32 lanes.
        const WAVEFRONT_SIZE32 = 1 << 7;
        /// Scratch is addressed by hardware, no flat scratch init SGPRs.
        const ARCHITECTED_FLAT_SCRATCH = 1 << 8;
        /// Non-sequential image address encoding.
        const NSA_ENCODING = 1 << 9;
        /// Partial NSA: trailing address components packed in the last register.
        const PARTIAL_NSA_ENCODING = 1 << 10;
        /// 16-bit image gradients.
        const G16 = 1 << 11;
        /// Global data share is present.
        const GDS = 1 << 12;
        /// VOP3 encodings may carry a trailing literal.
        const VOP3_LITERAL = 1 << 13;
        /// Dual-issue VOPD instructions.
        const VOPD = 1 << 14;
        /// Kernel arguments may be preloaded into user SGPRs.
        const KERNARG_PRELOAD = 1 << 15;
    }
}

/// Immutable description of the processor being decoded for.
///
/// # Examples
///
/// ```
/// use gfxdis_core::config::{Features, Generation, Target};
///
/// let json = r#"{ "generation": "gfx10", "features": ["WAVEFRONT_SIZE32", "NSA_ENCODING"] }"#;
/// let target = Target::from_json(json).unwrap();
/// assert_eq!(target.generation, Generation::Gfx10);
/// assert!(target.features.contains(Features::NSA_ENCODING));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Target {
    /// ISA generation.
    #[serde(default)]
    pub generation: Generation,
    /// Enabled capabilities.
    #[serde(default, deserialize_with = "deserialize_features")]
    pub features: Features,
    /// HSA code object version, used by the kernel descriptor reader.
    #[serde(default = "Target::default_code_object_version")]
    pub code_object_version: u32,
}

impl Default for Target {
    fn default() -> Self {
        Self {
            generation: Generation::default(),
            features: Features::empty(),
            code_object_version: defaults::CODE_OBJECT_VERSION,
        }
    }
}

fn deserialize_features<'de, D>(deserializer: D) -> Result<Features, D::Error>
where
    D: Deserializer<'de>,
{
    let names = Vec::<String>::deserialize(deserializer)?;
    names.iter().try_fold(Features::empty(), |acc, name| {
        Features::from_name(name)
            .map(|flag| acc | flag)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown feature `{name}`")))
    })
}

impl Target {
    const fn default_code_object_version() -> u32 {
        defaults::CODE_OBJECT_VERSION
    }

    /// Creates a target from a generation and feature set.
    pub const fn new(generation: Generation, features: Features) -> Self {
        Self {
            generation,
            features,
            code_object_version: defaults::CODE_OBJECT_VERSION,
        }
    }

    /// Parses a target from JSON.
    ///
    /// Missing fields take their defaults; unknown feature names are rejected.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the target for a named processor.
    ///
    /// # Arguments
    ///
    /// * `name` - Processor name such as `"gfx90a"` or `"gfx1100"`.
    ///
    /// # Returns
    ///
    /// The preset target, or `None` if the name is not known.
    pub fn preset(name: &str) -> Option<Self> {
        let (generation, features) = match name {
            "gfx803" => (
                Generation::Gfx8,
                Features::GCN3_ENCODING | Features::UNPACKED_D16_VMEM | Features::GDS,
            ),
            "gfx900" => (Generation::Gfx9, Features::GCN3_ENCODING | Features::GDS),
            "gfx906" => (
                Generation::Gfx9,
                Features::GCN3_ENCODING | Features::GDS | Features::FMA_MIX_INSTS,
            ),
            "gfx90a" => (
                Generation::Gfx9,
                Features::GCN3_ENCODING
                    | Features::GDS
                    | Features::FMA_MIX_INSTS
                    | Features::GFX90A_INSTS,
            ),
            "gfx940" => (
                Generation::Gfx9,
                Features::GCN3_ENCODING
                    | Features::FMA_MIX_INSTS
                    | Features::GFX90A_INSTS
                    | Features::GFX940_INSTS
                    | Features::ARCHITECTED_FLAT_SCRATCH
                    | Features::KERNARG_PRELOAD,
            ),
            "gfx1030" => (
                Generation::Gfx10,
                Features::GFX10_B_ENCODING
                    | Features::NSA_ENCODING
                    | Features::G16
                    | Features::GDS
                    | Features::VOP3_LITERAL
                    | Features::FMA_MIX_INSTS
                    | Features::WAVEFRONT_SIZE32,
            ),
            "gfx1100" => (
                Generation::Gfx11,
                Features::GFX11_INSTS
                    | Features::NSA_ENCODING
                    | Features::PARTIAL_NSA_ENCODING
                    | Features::G16
                    | Features::GDS
                    | Features::VOP3_LITERAL
                    | Features::VOPD
                    | Features::FMA_MIX_INSTS
                    | Features::ARCHITECTED_FLAT_SCRATCH
                    | Features::WAVEFRONT_SIZE32,
            ),
            "gfx1200" => (
                Generation::Gfx12,
                Features::GFX11_INSTS
                    | Features::NSA_ENCODING
                    | Features::PARTIAL_NSA_ENCODING
                    | Features::G16
                    | Features::VOP3_LITERAL
                    | Features::VOPD
                    | Features::FMA_MIX_INSTS
                    | Features::ARCHITECTED_FLAT_SCRATCH
                    | Features::WAVEFRONT_SIZE32,
            ),
            _ => return None,
        };
        Some(Self::new(generation, features))
    }

    /// Returns a copy with `features` added.
    #[must_use]
    pub const fn with_features(mut self, features: Features) -> Self {
        self.features = self.features.union(features);
        self
    }

    /// Returns a copy with a different code object version.
    #[must_use]
    pub const fn with_code_object_version(mut self, version: u32) -> Self {
        self.code_object_version = version;
        self
    }

    /// Returns true if every flag in `features` is enabled.
    #[inline]
    pub const fn has(&self, features: Features) -> bool {
        self.features.contains(features)
    }

    /// Returns true for GFX8 (Volcanic Islands).
    #[inline]
    pub fn is_vi(&self) -> bool {
        self.generation == Generation::Gfx8
    }

    /// Returns true for exactly GFX9.
    #[inline]
    pub fn is_gfx9(&self) -> bool {
        self.generation == Generation::Gfx9
    }

    /// Returns true for GFX9 and newer.
    #[inline]
    pub fn is_gfx9_plus(&self) -> bool {
        self.generation >= Generation::Gfx9
    }

    /// Returns true for exactly GFX10.
    #[inline]
    pub fn is_gfx10(&self) -> bool {
        self.generation == Generation::Gfx10
    }

    /// Returns true for GFX10 and newer.
    #[inline]
    pub fn is_gfx10_plus(&self) -> bool {
        self.generation >= Generation::Gfx10
    }

    /// Returns true for exactly GFX11.
    #[inline]
    pub fn is_gfx11(&self) -> bool {
        self.generation == Generation::Gfx11
    }

    /// Returns true for GFX11 and newer.
    #[inline]
    pub fn is_gfx11_plus(&self) -> bool {
        self.generation >= Generation::Gfx11
    }

    /// Returns true for GFX12 and newer.
    #[inline]
    pub fn is_gfx12_plus(&self) -> bool {
        self.generation >= Generation::Gfx12
    }

    /// Returns true if the target has CDNA2 instructions.
    #[inline]
    pub const fn is_gfx90a(&self) -> bool {
        self.has(Features::GFX90A_INSTS)
    }

    /// Returns true if the wavefront is 32 lanes wide.
    #[inline]
    pub const fn is_wave32(&self) -> bool {
        self.has(Features::WAVEFRONT_SIZE32)
    }

    /// Returns true if scratch is architected (no flat scratch init).
    #[inline]
    pub const fn has_architected_flat_scratch(&self) -> bool {
        self.has(Features::ARCHITECTED_FLAT_SCRATCH)
    }

    /// Returns true if D16 image data is packed two components per register.
    #[inline]
    pub const fn has_packed_d16(&self) -> bool {
        !self.has(Features::UNPACKED_D16_VMEM)
    }

    /// Returns true if the global data share exists.
    #[inline]
    pub const fn has_gds(&self) -> bool {
        self.has(Features::GDS)
    }

    /// Returns the longest instruction, in bytes, the target can encode.
    pub const fn max_instruction_bytes(&self) -> usize {
        if self.has(Features::NSA_ENCODING) {
            defaults::MAX_INST_BYTES_NSA
        } else if self.has(Features::VOP3_LITERAL) {
            defaults::MAX_INST_BYTES_VOP3_LITERAL
        } else {
            defaults::MAX_INST_BYTES_BASE
        }
    }

    /// Returns the VGPR allocation granule used by the kernel descriptor.
    ///
    /// # Arguments
    ///
    /// * `wave32` - Wavefront width read from the descriptor, if known. Falls back
    ///   to the target's own wavefront feature when `None`.
    pub const fn vgpr_encoding_granule(&self, wave32: Option<bool>) -> u32 {
        if self.is_gfx90a() {
            return 8;
        }
        let wave32 = match wave32 {
            Some(flag) => flag,
            None => self.is_wave32(),
        };
        if wave32 { 8 } else { 4 }
    }

    /// Returns the SGPR allocation granule used by the kernel descriptor.
    pub const fn sgpr_encoding_granule(&self) -> u32 {
        defaults::SGPR_ENCODING_GRANULE
    }
}
