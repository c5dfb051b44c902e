//! Instruction decoding.
//!
//! Everything between raw code bytes and a fully-populated `Instruction`.
//!
//! # Layers
//!
//! * `instruction`, `encoding`, `metadata`, `table`: the data model and the read-only collaborators.
//! * `operand`, `walker`: field decoding and single-table matching.
//! * `cascade`, `dpp`: the table priority list and the DPP fixups a match must pass.
//! * `normalize`, `mimg`: post-decode operand completion.
//! * `decode`: the driver that ties it together.

/// Table cascade: priority order, gates and per-step fixups.
pub mod cascade;

/// Per-call decode state (cursor, literal slot, comments, symbolizer).
pub mod context;

/// Top-level decoder and decode outcomes.
pub mod decode;

/// DPP8/DPP16 operand reconstruction.
pub mod dpp;

/// Encoding constants: register ranges, inline constants, modifier bits.
pub mod encoding;

/// Instruction, operand and bit-field types.
pub mod instruction;

/// Operand schemas, class flags and image variant metadata.
pub mod metadata;

/// Image address sizing, NSA expansion and variant selection.
pub mod mimg;

/// Post-decode operand normalization.
pub mod normalize;

/// Raw operand field decoding.
pub mod operand;

/// Branch target symbolization.
pub mod symbol;

/// Decode table entries, field decoders and table sources.
pub mod table;

/// Single-table matching.
pub mod walker;

pub use decode::{DecodeOutcome, Disassembler};
pub use instruction::{Instruction, Opcode, Operand};
pub use symbol::{SectionSymbol, SectionSymbolizer, Symbolizer};
