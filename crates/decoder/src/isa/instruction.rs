//! Decoded instruction model and bit-field extraction.
//!
//! Provides the structured result of a decode (`Instruction`, `Operand`) and the
//! helpers that pull operand fields out of an instruction word. Words of every
//! length (32, 64 and 96 bits) are carried in the low bits of a `u128`.

use std::fmt;

use crate::common::reg::Register;

/// Opcode identifier as assigned by the decode tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Opcode(pub u32);

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One argument of a decoded instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    /// A register reference.
    Register(Register),
    /// An integer or raw bit pattern.
    Immediate(i64),
    /// A resolved symbolic branch target.
    Expr(String),
}

impl Operand {
    /// Returns the immediate value, if this is an immediate.
    #[inline]
    pub const fn imm(&self) -> Option<i64> {
        match self {
            Self::Immediate(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the register, if this is a register reference.
    #[inline]
    pub const fn reg(&self) -> Option<Register> {
        match self {
            Self::Register(r) => Some(*r),
            _ => None,
        }
    }
}

impl From<Register> for Operand {
    fn from(reg: Register) -> Self {
        Self::Register(reg)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(r) => write!(f, "{r}"),
            Self::Immediate(v) => write!(f, "{v:#x}"),
            Self::Expr(name) => f.write_str(name),
        }
    }
}

/// A decoded instruction: opcode plus ordered operands.
///
/// Operand order follows the opcode's schema in the instruction metadata.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Instruction {
    /// Opcode identifier.
    pub opcode: Opcode,
    /// Operands in schema order.
    pub operands: Vec<Operand>,
}

impl Instruction {
    /// Creates an instruction with no operands.
    pub const fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            operands: Vec::new(),
        }
    }

    /// Number of operands currently present.
    #[inline]
    pub fn len(&self) -> usize {
        self.operands.len()
    }

    /// Returns true if no operands are present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.operands.is_empty()
    }

    /// Appends an operand.
    #[inline]
    pub fn push(&mut self, op: Operand) {
        self.operands.push(op);
    }

    /// Inserts an operand at `idx`, shifting later operands right.
    ///
    /// # Returns
    ///
    /// `false` (and no change) if `idx` lies past the end of the list.
    pub fn insert(&mut self, idx: usize, op: Operand) -> bool {
        if idx > self.operands.len() {
            return false;
        }
        self.operands.insert(idx, op);
        true
    }

    /// Returns the operand at `idx`.
    #[inline]
    pub fn operand(&self, idx: usize) -> Option<&Operand> {
        self.operands.get(idx)
    }

    /// Returns the immediate at `idx`, if present and immediate.
    #[inline]
    pub fn imm(&self, idx: usize) -> Option<i64> {
        self.operands.get(idx).and_then(Operand::imm)
    }

    /// Returns the register at `idx`, if present and a register.
    #[inline]
    pub fn reg(&self, idx: usize) -> Option<Register> {
        self.operands.get(idx).and_then(Operand::reg)
    }

    /// Replaces the operand at `idx`.
    ///
    /// # Returns
    ///
    /// `false` if `idx` is out of range.
    pub fn set(&mut self, idx: usize, op: Operand) -> bool {
        self.operands.get_mut(idx).map(|slot| *slot = op).is_some()
    }

    /// Removes the operands in `start..end`, clamped to the list.
    pub fn remove_range(&mut self, start: usize, end: usize) {
        let end = end.min(self.operands.len());
        if start < end {
            drop(self.operands.drain(start..end));
        }
    }
}

/// A contiguous bit field of an instruction word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BitField {
    /// Lowest bit of the field.
    pub lo: u8,
    /// Field width in bits (at most 64).
    pub width: u8,
}

impl BitField {
    /// Creates a field covering `width` bits starting at `lo`.
    pub const fn new(lo: u8, width: u8) -> Self {
        Self { lo, width }
    }

    /// Field that reads nothing, for directives that take no raw bits.
    pub const NONE: Self = Self { lo: 0, width: 0 };

    /// Extracts the field from `word`.
    #[inline]
    pub fn extract(self, word: u128) -> u64 {
        word.field(self.lo as u32, self.width as u32)
    }
}

/// Trait for extracting fields from instruction words.
pub trait InstructionBits {
    /// Extracts `width` bits starting at bit `lo`.
    fn field(&self, lo: u32, width: u32) -> u64;

    /// Extracts a single bit.
    fn bit(&self, pos: u32) -> bool {
        self.field(pos, 1) != 0
    }
}

impl InstructionBits for u128 {
    #[inline(always)]
    fn field(&self, lo: u32, width: u32) -> u64 {
        if width == 0 || lo >= 128 {
            return 0;
        }
        let mask = if width >= 64 { u64::MAX } else { (1u64 << width) - 1 };
        ((*self >> lo) as u64) & mask
    }
}

/// Sign-extends the low `bits` bits of `value`.
#[inline]
pub const fn sign_extend(value: u64, bits: u32) -> i64 {
    if bits == 0 || bits >= 64 {
        return value as i64;
    }
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}
