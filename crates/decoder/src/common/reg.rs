//! Register file model.
//!
//! This module describes the registers an operand can name and how register
//! classes are indexed. It provides:
//! 1. **Registers:** Vector, accumulation, scalar and trap-temporary tuples, 16-bit halves, and named hardware registers.
//! 2. **Classes:** A (kind, width) pair naming a set of equally sized registers.
//! 3. **Lookup:** The `RegisterInfo` query interface and the built-in `RegisterFile` implementation.
//!
//! Scalar tuples are aligned: a 64-bit class starts on even SGPRs and classes of
//! 96 bits or wider start on multiples of four. Vector tuples are unaligned.

use std::fmt;

/// Number of architectural VGPRs (and AGPRs) per lane.
pub const NUM_VGPRS: u32 = 256;

/// Number of addressable SGPRs (`s0`..`s105`).
pub const NUM_SGPRS: u32 = 106;

/// Number of trap temporary SGPRs (`ttmp0`..`ttmp15`).
pub const NUM_TTMPS: u32 = 16;

/// Family a register class belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegKind {
    /// Vector general-purpose registers.
    Vgpr,
    /// Accumulation vector registers (CDNA).
    Agpr,
    /// Scalar general-purpose registers.
    Sgpr,
    /// Trap handler temporaries.
    Ttmp,
    /// 16-bit halves of VGPRs (true16 encodings).
    Vgpr16,
}

/// A register class: every register of one kind and one width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegClass {
    /// Register family.
    pub kind: RegKind,
    /// Width of each member in bits.
    pub bits: u16,
}

impl RegClass {
    /// Single VGPRs.
    pub const VGPR_32: Self = Self::new(RegKind::Vgpr, 32);
    /// VGPR pairs.
    pub const VREG_64: Self = Self::new(RegKind::Vgpr, 64);
    /// VGPR quads.
    pub const VREG_128: Self = Self::new(RegKind::Vgpr, 128);
    /// Single AGPRs.
    pub const AGPR_32: Self = Self::new(RegKind::Agpr, 32);
    /// Single SGPRs.
    pub const SGPR_32: Self = Self::new(RegKind::Sgpr, 32);
    /// Aligned SGPR pairs.
    pub const SGPR_64: Self = Self::new(RegKind::Sgpr, 64);
    /// Aligned SGPR quads.
    pub const SGPR_128: Self = Self::new(RegKind::Sgpr, 128);
    /// Single trap temporaries.
    pub const TTMP_32: Self = Self::new(RegKind::Ttmp, 32);
    /// 16-bit VGPR halves.
    pub const VGPR_16: Self = Self::new(RegKind::Vgpr16, 16);

    /// Creates a class of `kind` registers that are `bits` wide.
    pub const fn new(kind: RegKind, bits: u16) -> Self {
        Self { kind, bits }
    }

    /// Number of 32-bit registers each member spans.
    #[inline]
    pub const fn dwords(self) -> u32 {
        if self.bits < 32 { 1 } else { self.bits as u32 / 32 }
    }

    /// Alignment, in 32-bit registers, of the first register of a member.
    #[inline]
    pub const fn alignment(self) -> u32 {
        match self.kind {
            RegKind::Sgpr | RegKind::Ttmp => scalar_alignment(self.bits),
            RegKind::Vgpr | RegKind::Agpr | RegKind::Vgpr16 => 1,
        }
    }

    /// Returns true if `bits` is a width the class kind supports.
    pub const fn is_valid(self) -> bool {
        match self.kind {
            RegKind::Vgpr16 => self.bits == 16,
            RegKind::Vgpr | RegKind::Agpr => matches!(
                self.bits,
                32 | 64 | 96 | 128 | 160 | 192 | 224 | 256 | 288 | 320 | 352 | 384 | 512 | 1024
            ),
            RegKind::Sgpr | RegKind::Ttmp => matches!(
                self.bits,
                32 | 64 | 96 | 128 | 160 | 192 | 224 | 256 | 288 | 320 | 352 | 384 | 512
            ),
        }
    }
}

/// Shift applied to a raw scalar field for a class of this width.
///
/// 32-bit classes are indexed directly, 64-bit classes in pairs, and wider
/// classes in quads.
pub const fn scalar_shift(bits: u16) -> u32 {
    match bits {
        0..=32 => 0,
        33..=64 => 1,
        _ => 2,
    }
}

const fn scalar_alignment(bits: u16) -> u32 {
    1 << scalar_shift(bits)
}

impl fmt::Display for RegClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.bits) {
            (RegKind::Vgpr16, _) => write!(f, "VGPR_16"),
            (RegKind::Vgpr, 32) => write!(f, "VGPR_32"),
            (RegKind::Vgpr, bits) => write!(f, "VReg_{bits}"),
            (RegKind::Agpr, 32) => write!(f, "AGPR_32"),
            (RegKind::Agpr, bits) => write!(f, "AReg_{bits}"),
            (RegKind::Sgpr, bits) => write!(f, "SGPR_{bits}"),
            (RegKind::Ttmp, bits) => write!(f, "TTMP_{bits}"),
        }
    }
}

/// Named hardware registers reachable through the scalar operand space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum SpecialRegister {
    FlatScratchLo,
    FlatScratchHi,
    FlatScratch,
    XnackMaskLo,
    XnackMaskHi,
    XnackMask,
    VccLo,
    VccHi,
    Vcc,
    TbaLo,
    TbaHi,
    Tba,
    TmaLo,
    TmaHi,
    Tma,
    M0,
    Null,
    ExecLo,
    ExecHi,
    Exec,
    SharedBaseLo,
    SharedBase,
    SharedLimitLo,
    SharedLimit,
    PrivateBaseLo,
    PrivateBase,
    PrivateLimitLo,
    PrivateLimit,
    PopsExitingWaveId,
    Vccz,
    Execz,
    Scc,
    LdsDirect,
}

impl SpecialRegister {
    /// Assembly name of the register.
    pub const fn name(self) -> &'static str {
        match self {
            Self::FlatScratchLo => "flat_scratch_lo",
            Self::FlatScratchHi => "flat_scratch_hi",
            Self::FlatScratch => "flat_scratch",
            Self::XnackMaskLo => "xnack_mask_lo",
            Self::XnackMaskHi => "xnack_mask_hi",
            Self::XnackMask => "xnack_mask",
            Self::VccLo => "vcc_lo",
            Self::VccHi => "vcc_hi",
            Self::Vcc => "vcc",
            Self::TbaLo => "tba_lo",
            Self::TbaHi => "tba_hi",
            Self::Tba => "tba",
            Self::TmaLo => "tma_lo",
            Self::TmaHi => "tma_hi",
            Self::Tma => "tma",
            Self::M0 => "m0",
            Self::Null => "null",
            Self::ExecLo => "exec_lo",
            Self::ExecHi => "exec_hi",
            Self::Exec => "exec",
            Self::SharedBaseLo | Self::SharedBase => "src_shared_base",
            Self::SharedLimitLo | Self::SharedLimit => "src_shared_limit",
            Self::PrivateBaseLo | Self::PrivateBase => "src_private_base",
            Self::PrivateLimitLo | Self::PrivateLimit => "src_private_limit",
            Self::PopsExitingWaveId => "src_pops_exiting_wave_id",
            Self::Vccz => "src_vccz",
            Self::Execz => "src_execz",
            Self::Scc => "src_scc",
            Self::LdsDirect => "src_lds_direct",
        }
    }
}

/// A concrete register operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Register {
    /// Placeholder for an operand slot that names no register.
    NoRegister,
    /// `dwords` consecutive VGPRs starting at `index`.
    Vgpr {
        /// First VGPR.
        index: u16,
        /// Tuple length in 32-bit registers.
        dwords: u16,
    },
    /// `dwords` consecutive AGPRs starting at `index`.
    Agpr {
        /// First AGPR.
        index: u16,
        /// Tuple length in 32-bit registers.
        dwords: u16,
    },
    /// `dwords` consecutive SGPRs starting at `index`.
    Sgpr {
        /// First SGPR.
        index: u16,
        /// Tuple length in 32-bit registers.
        dwords: u16,
    },
    /// `dwords` consecutive trap temporaries starting at `index`.
    Ttmp {
        /// First TTMP.
        index: u16,
        /// Tuple length in 32-bit registers.
        dwords: u16,
    },
    /// Low or high half of a VGPR.
    Vgpr16 {
        /// VGPR number.
        index: u16,
        /// High half when set.
        hi: bool,
    },
    /// A named hardware register.
    Special(SpecialRegister),
}

impl Register {
    /// Returns the first 32-bit register of a tuple, or the register itself.
    #[must_use]
    pub const fn first_dword(self) -> Self {
        match self {
            Self::Vgpr { index, .. } => Self::Vgpr { index, dwords: 1 },
            Self::Agpr { index, .. } => Self::Agpr { index, dwords: 1 },
            Self::Sgpr { index, .. } => Self::Sgpr { index, dwords: 1 },
            Self::Ttmp { index, .. } => Self::Ttmp { index, dwords: 1 },
            other => other,
        }
    }

    /// Returns true for AGPRs of any width.
    pub const fn is_agpr(self) -> bool {
        matches!(self, Self::Agpr { .. })
    }

    /// Hardware encoding of the register within its file.
    ///
    /// For tuples this is the number of the first register.
    pub const fn encoding(self) -> u16 {
        match self {
            Self::Vgpr { index, .. }
            | Self::Agpr { index, .. }
            | Self::Sgpr { index, .. }
            | Self::Ttmp { index, .. } => index,
            Self::Vgpr16 { index, hi } => index * 2 + hi as u16,
            Self::NoRegister | Self::Special(_) => 0,
        }
    }
}

fn write_tuple(f: &mut fmt::Formatter<'_>, prefix: &str, index: u16, dwords: u16) -> fmt::Result {
    if dwords <= 1 {
        write!(f, "{prefix}{index}")
    } else {
        write!(f, "{prefix}[{index}:{}]", index + dwords - 1)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NoRegister => write!(f, "_"),
            Self::Vgpr { index, dwords } => write_tuple(f, "v", index, dwords),
            Self::Agpr { index, dwords } => write_tuple(f, "a", index, dwords),
            Self::Sgpr { index, dwords } => write_tuple(f, "s", index, dwords),
            Self::Ttmp { index, dwords } => write_tuple(f, "ttmp", index, dwords),
            Self::Vgpr16 { index, hi } => write!(f, "v{index}.{}", if hi { 'h' } else { 'l' }),
            Self::Special(reg) => f.write_str(reg.name()),
        }
    }
}

/// Read-only register metadata queried by the decoder.
pub trait RegisterInfo {
    /// Number of members in `class`.
    fn class_size(&self, class: RegClass) -> u32;

    /// The member of `class` at `index`, or `None` past the end.
    fn register(&self, class: RegClass, index: u32) -> Option<Register>;

    /// The member of `class` whose first 32-bit register is `reg`.
    fn matching_super_reg(&self, reg: Register, class: RegClass) -> Option<Register>;

    /// The first 32-bit register of `reg`.
    fn sub0(&self, reg: Register) -> Register {
        reg.first_dword()
    }
}

/// Built-in register file of GCN/RDNA targets.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegisterFile;

impl RegisterFile {
    /// Creates the register file model.
    pub const fn new() -> Self {
        Self
    }

    const fn file_size(kind: RegKind) -> u32 {
        match kind {
            RegKind::Vgpr | RegKind::Agpr => NUM_VGPRS,
            RegKind::Sgpr => NUM_SGPRS,
            RegKind::Ttmp => NUM_TTMPS,
            RegKind::Vgpr16 => NUM_VGPRS * 2,
        }
    }

    const fn make(kind: RegKind, first: u32, dwords: u32) -> Register {
        let index = first as u16;
        let dwords = dwords as u16;
        match kind {
            RegKind::Vgpr => Register::Vgpr { index, dwords },
            RegKind::Agpr => Register::Agpr { index, dwords },
            RegKind::Sgpr => Register::Sgpr { index, dwords },
            RegKind::Ttmp => Register::Ttmp { index, dwords },
            RegKind::Vgpr16 => Register::Vgpr16 {
                index: index / 2,
                hi: first % 2 == 1,
            },
        }
    }
}

impl RegisterInfo for RegisterFile {
    fn class_size(&self, class: RegClass) -> u32 {
        if !class.is_valid() {
            return 0;
        }
        let total = Self::file_size(class.kind);
        let dwords = class.dwords();
        if class.kind == RegKind::Vgpr16 {
            return total;
        }
        if dwords > total {
            return 0;
        }
        (total - dwords) / class.alignment() + 1
    }

    fn register(&self, class: RegClass, index: u32) -> Option<Register> {
        if index >= self.class_size(class) {
            return None;
        }
        let first = index * class.alignment();
        Some(Self::make(class.kind, first, class.dwords()))
    }

    fn matching_super_reg(&self, reg: Register, class: RegClass) -> Option<Register> {
        let (kind, first) = match reg.first_dword() {
            Register::Vgpr { index, .. } => (RegKind::Vgpr, u32::from(index)),
            Register::Agpr { index, .. } => (RegKind::Agpr, u32::from(index)),
            Register::Sgpr { index, .. } => (RegKind::Sgpr, u32::from(index)),
            Register::Ttmp { index, .. } => (RegKind::Ttmp, u32::from(index)),
            _ => return None,
        };
        if kind != class.kind || !class.is_valid() || first % class.alignment() != 0 {
            return None;
        }
        if first + class.dwords() > Self::file_size(kind) {
            return None;
        }
        Some(Self::make(kind, first, class.dwords()))
    }
}
