//! Decode status and error definitions.
//!
//! This module defines how failures travel through the decoder. It provides:
//! 1. **Status:** The three-valued outcome of one decode call (`Fail`, `SoftFail`, `Success`).
//! 2. **Operand errors:** Field-level failures that abort a single table attempt.
//! 3. **Record errors:** Terminal failures for kernel descriptors, code objects and target files.

use std::fmt;

use thiserror::Error;

use crate::common::reg::RegClass;
use crate::isa::instruction::Opcode;
use crate::isa::metadata::OperandName;

/// Outcome of a decode attempt.
///
/// Variants are ordered by quality, so combining two statuses with `min`
/// keeps the worse one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DecodeStatus {
    /// No interpretation of the bytes was found.
    Fail,
    /// The bytes matched structurally but a secondary validity check failed.
    ///
    /// The instruction is populated but unverified.
    SoftFail,
    /// The instruction is fully valid.
    Success,
}

impl DecodeStatus {
    /// Returns true for `Success` and `SoftFail`.
    #[inline]
    pub const fn is_matched(self) -> bool {
        !matches!(self, Self::Fail)
    }

    /// Returns the worse of two statuses.
    #[inline]
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        self.min(other)
    }
}

impl fmt::Display for DecodeStatus {
    /// Formats the status the way disassembly listings label it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fail => write!(f, "fail"),
            Self::SoftFail => write!(f, "soft-fail"),
            Self::Success => write!(f, "success"),
        }
    }
}

/// Field-level decode failure.
///
/// An operand error aborts only the table attempt that produced it; the
/// cascade then moves on to the next table.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The index does not name a register of the class.
    #[error("{class}: unknown register {index}")]
    UnknownRegister {
        /// Register class that was indexed.
        class: RegClass,
        /// Offending index within the class.
        index: u32,
    },

    /// The raw value is neither a register, an inline constant nor a named register.
    #[error("unknown operand encoding {0}")]
    UnknownOperandEncoding(u32),

    /// A literal was referenced but fewer than four bytes remain.
    #[error("cannot read literal, inst bytes left {available}")]
    LiteralTruncated {
        /// Bytes left after the instruction word.
        available: usize,
    },

    /// Two literal references in one instruction carry different values.
    #[error("More than one unique literal is illegal")]
    ConflictingLiteral {
        /// Literal already held by the instruction.
        held: u32,
        /// Value of the later reference.
        found: u32,
    },

    /// A deferred literal operand was declared but no literal was decoded.
    #[error("deferred immediate without a decoded literal")]
    MissingLiteral,

    /// The trailing NSA address bytes are shorter than the instruction declares.
    #[error("NSA address bytes truncated: need {needed}, have {available}")]
    NsaTruncated {
        /// Bytes required by the address operand count.
        needed: usize,
        /// Bytes left in the window.
        available: usize,
    },

    /// The operand width has no register class or special-register table.
    #[error("unsupported operand width of {0} bits")]
    UnsupportedWidth(u16),

    /// A fixup needed an operand the instruction does not carry.
    #[error("operand `{0}` is missing")]
    MissingOperand(OperandName),

    /// The matched opcode has no instruction description.
    #[error("no description for opcode {0}")]
    UnknownOpcode(Opcode),
}

/// Kernel descriptor failure.
///
/// Any of these is terminal for the whole 64-byte record.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum KernelDescriptorError {
    /// The record is not exactly 64 bytes.
    #[error("kernel descriptor must be {expected} bytes, got {actual}")]
    Size {
        /// Required record size.
        expected: usize,
        /// Size supplied.
        actual: usize,
    },

    /// The record does not start on a 64-byte boundary.
    #[error("kernel descriptor at {0:#x} is not 64-byte aligned")]
    Misaligned(u64),

    /// A bit with no directive on this target is set.
    #[error("reserved bits set in {field} at offset {offset}: {value:#x}")]
    ReservedBits {
        /// Name of the word or field.
        field: &'static str,
        /// Byte offset of the word within the record.
        offset: usize,
        /// The offending bits.
        value: u64,
    },

    /// The granulated SGPR count must be zero on GFX10 and newer.
    #[error("granulated wavefront SGPR count {0} is not encodable on this target")]
    SgprCount(u32),

    /// The symbol is a legacy `amd_kernel_code_t` header, which is not decoded.
    #[error("amd_kernel_code_t headers are not supported")]
    LegacyKernelCode,
}

/// Target configuration failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[error("invalid target description: {0}")]
    Json(#[from] serde_json::Error),
}

/// Code object loading failure.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The file is not a readable ELF object.
    #[error("failed to parse code object: {0}")]
    Parse(String),

    /// The object has no executable text section.
    #[error("code object has no .text section")]
    MissingText,

    /// A symbol points outside its section's data.
    #[error("symbol `{name}` at {address:#x} lies outside its section")]
    SymbolOutOfBounds {
        /// Symbol name.
        name: String,
        /// Symbol address.
        address: u64,
    },
}

impl From<object::Error> for LoaderError {
    fn from(err: object::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
