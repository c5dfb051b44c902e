//! Common building blocks shared by the instruction and descriptor decoders.
//!
//! This module provides:
//! 1. **Byte Cursor:** Little-endian consumption of instruction and descriptor bytes.
//! 2. **Error Handling:** Decode status plus operand, descriptor, loader and config errors.
//! 3. **Registers:** Register classes, concrete registers and the register file model.

/// Little-endian byte cursor.
pub mod cursor;

/// Decode status and error types.
pub mod error;

/// Register classes and the register file model.
pub mod reg;

pub use cursor::ByteCursor;
pub use error::{ConfigError, DecodeError, DecodeStatus, KernelDescriptorError, LoaderError};
pub use reg::{RegClass, RegKind, Register, RegisterFile, RegisterInfo, SpecialRegister};
