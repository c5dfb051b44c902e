//! Per-call decode state.
//!
//! Everything that changes while one instruction is decoded lives here rather
//! than in the decoder, so a single `Disassembler` can be shared freely:
//! 1. **Cursor:** The byte window, positioned after the instruction word.
//! 2. **Literal Slot:** The trailing 32-bit literal, read at most once per table attempt.
//! 3. **Comments:** Diagnostics handed back to the caller with the result.
//! 4. **Symbolizer:** Optional branch target resolver.

use std::fmt;

use crate::common::cursor::ByteCursor;
use crate::isa::symbol::Symbolizer;

/// Literal held by the current table attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Literal {
    /// The 32-bit word as read.
    pub value: u32,
    /// The value for 64-bit floating-point operands.
    ///
    /// Equals `value` unless the first reference placed it in the high half.
    pub value64: u64,
}

/// Scratch state of one top-level decode call.
pub struct DecodeContext<'a> {
    /// Window being decoded.
    pub cursor: ByteCursor<'a>,
    /// Load address of the first byte of the window.
    pub address: u64,
    literal: Option<Literal>,
    comments: Vec<String>,
    symbolizer: Option<&'a mut dyn Symbolizer>,
}

impl fmt::Debug for DecodeContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeContext")
            .field("cursor", &self.cursor)
            .field("address", &self.address)
            .field("literal", &self.literal)
            .field("comments", &self.comments)
            .field("symbolizer", &self.symbolizer.is_some())
            .finish()
    }
}

impl<'a> DecodeContext<'a> {
    /// Creates the context for decoding `bytes` loaded at `address`.
    pub fn new(bytes: &'a [u8], address: u64, symbolizer: Option<&'a mut dyn Symbolizer>) -> Self {
        Self {
            cursor: ByteCursor::new(bytes),
            address,
            literal: None,
            comments: Vec::new(),
            symbolizer,
        }
    }

    /// Forgets any literal read by a previous table attempt.
    #[inline]
    pub fn reset_literal(&mut self) {
        self.literal = None;
    }

    /// The literal held by the current attempt.
    #[inline]
    pub const fn literal(&self) -> Option<Literal> {
        self.literal
    }

    /// Records `literal` as the one literal of this attempt.
    #[inline]
    pub fn set_literal(&mut self, literal: Literal) {
        self.literal = Some(literal);
    }

    /// Appends a diagnostic for the caller.
    pub fn comment(&mut self, text: impl Into<String>) {
        self.comments.push(text.into());
    }

    /// Diagnostics recorded so far.
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Drops diagnostics recorded after the first `len`.
    pub fn truncate_comments(&mut self, len: usize) {
        self.comments.truncate(len);
    }

    /// Takes the recorded diagnostics, leaving none behind.
    pub fn take_comments(&mut self) -> Vec<String> {
        std::mem::take(&mut self.comments)
    }

    /// Asks the symbolizer, if any, for a name at `target`.
    pub fn resolve_branch_target(&mut self, target: u64) -> Option<String> {
        self.symbolizer
            .as_mut()
            .and_then(|sym| sym.resolve_branch_target(target))
    }
}
