//! GCN/RDNA GPU instruction decoder.
//!
//! This crate recovers structured instructions from AMDGPU machine code and
//! decodes the kernel descriptors that accompany it:
//! 1. **Common:** Byte cursor, decode status and errors, register classes and the register file.
//! 2. **Config:** Target generation and feature set, loadable from JSON.
//! 3. **ISA:** Operand decoding, decode table matching, the table cascade and operand normalization.
//! 4. **HSA:** The 64-byte kernel descriptor record and its `.amdhsa_*` directives.
//! 5. **Loader:** Text and symbols of an ELF code object.
//!
//! Decode tables and instruction metadata are generated from the ISA
//! description outside this crate and supplied through the `TableSource` and
//! `InstrInfo` traits.
//!
//! # Examples
//!
//! ```
//! use gfxdis_core::common::{DecodeStatus, RegClass};
//! use gfxdis_core::config::Target;
//! use gfxdis_core::isa::instruction::{BitField, Opcode};
//! use gfxdis_core::isa::metadata::{InstrDesc, InstrFlags, MetadataTable, OperandInfo, OperandName};
//! use gfxdis_core::isa::table::{DecoderTables, FieldDecoder, SrcSpec, TableEntry, TableId};
//! use gfxdis_core::Disassembler;
//!
//! // v_mov_b32 v1, v2 (VOP1, gfx9)
//! let mov = Opcode(1);
//! let tables = DecoderTables::new().with_table(
//!     TableId::Gfx9W32,
//!     vec![
//!         TableEntry::new(mov, 0xFE01_FE00, 0x7E00_0200)
//!             .operand(BitField::new(17, 8), FieldDecoder::Reg(RegClass::VGPR_32))
//!             .operand(BitField::new(0, 9), FieldDecoder::Src(SrcSpec::new(32, 0))),
//!     ],
//! );
//! let info = MetadataTable::new().with_desc(
//!     mov,
//!     InstrDesc::new(
//!         "v_mov_b32",
//!         InstrFlags::empty(),
//!         vec![
//!             OperandInfo::reg(OperandName::Vdst, RegClass::VGPR_32),
//!             OperandInfo::src(OperandName::Src0),
//!         ],
//!     ),
//! );
//! let target = Target::preset("gfx900").unwrap();
//! let disasm = Disassembler::new(target, tables, info);
//! let out = disasm.get_instruction(&[0x02, 0x03, 0x02, 0x7E], 0, None);
//! assert_eq!(out.status, DecodeStatus::Success);
//! assert_eq!(out.size, 4);
//! ```

/// Common types (cursor, status and errors, registers).
pub mod common;
/// Target description (generation, features, presets).
pub mod config;
/// HSA kernel descriptor decoding.
pub mod hsa;
/// Instruction decoding (operands, tables, cascade, normalization).
pub mod isa;
/// ELF code object loading.
pub mod loader;

/// Decoder status; `Success`, `SoftFail` or `Fail`.
pub use crate::common::error::DecodeStatus;
/// Target description; build with `Target::preset` or `Target::from_json`.
pub use crate::config::Target;
/// Decoded kernel descriptor and the symbol-start hook.
pub use crate::hsa::{KernelDescriptor, decode_kernel_descriptor, on_symbol_start};
/// Instruction decoder; construct with `Disassembler::new`.
pub use crate::isa::decode::{DecodeOutcome, Disassembler};
/// Parsed code object.
pub use crate::loader::CodeObject;
