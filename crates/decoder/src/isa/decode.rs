//! Top-level instruction decoder.
//!
//! `Disassembler` ties the pieces together for one target:
//! 1. **Window:** The input is cut to the longest instruction the target can encode.
//! 2. **Cascade:** Every `CASCADE` step reads its word and tries its tables; the first accepted match wins.
//!    A match that fails its step's fixup is discarded along with its diagnostics.
//! 3. **Normalization:** The winner's operand list is completed against its schema.
//! 4. **Size:** The bytes consumed by the word, its literal and any NSA tail; on failure `min(4, len)`.
//!
//! The decoder holds only immutable collaborators. All scratch state of a call
//! lives in a `DecodeContext`, so a `Disassembler` may be shared across threads.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::common::error::DecodeStatus;
use crate::common::reg::{RegisterFile, RegisterInfo};
use crate::config::Target;
use crate::isa::cascade::{CASCADE, StepFixup, WordWidth};
use crate::isa::context::DecodeContext;
use crate::isa::instruction::Instruction;
use crate::isa::metadata::InstrInfo;
use crate::isa::normalize::Normalizer;
use crate::isa::operand::OperandDecoder;
use crate::isa::symbol::Symbolizer;
use crate::isa::table::TableSource;
use crate::isa::walker::try_table;

/// Bytes consumed when nothing decodes.
const FAIL_SIZE: usize = 4;

/// Result of decoding one instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// Load address of the first byte.
    pub address: u64,
    /// Quality of the result.
    pub status: DecodeStatus,
    /// The instruction; `None` on `Fail`.
    pub instruction: Option<Instruction>,
    /// Bytes consumed. Never zero for a non-empty window.
    pub size: usize,
    /// Diagnostics produced while decoding.
    pub comments: Vec<String>,
}

impl DecodeOutcome {
    fn fail(address: u64, available: usize, comments: Vec<String>) -> Self {
        Self {
            address,
            status: DecodeStatus::Fail,
            instruction: None,
            size: FAIL_SIZE.min(available),
            comments,
        }
    }
}

/// A match from one cascade step.
struct Candidate {
    inst: Instruction,
    is_sdwa: bool,
}

/// Instruction decoder for one target.
#[derive(Clone)]
pub struct Disassembler {
    target: Target,
    tables: Arc<dyn TableSource + Send + Sync>,
    info: Arc<dyn InstrInfo + Send + Sync>,
    regs: Arc<dyn RegisterInfo + Send + Sync>,
}

impl fmt::Debug for Disassembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disassembler")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl Disassembler {
    /// Creates a decoder using the built-in register file.
    ///
    /// # Arguments
    ///
    /// * `target` - Processor to decode for.
    /// * `tables` - Generated decode tables.
    /// * `info` - Instruction metadata matching the tables.
    pub fn new(
        target: Target,
        tables: impl TableSource + Send + Sync + 'static,
        info: impl InstrInfo + Send + Sync + 'static,
    ) -> Self {
        Self {
            target,
            tables: Arc::new(tables),
            info: Arc::new(info),
            regs: Arc::new(RegisterFile::new()),
        }
    }

    /// Replaces the register metadata.
    #[must_use]
    pub fn with_register_info(mut self, regs: impl RegisterInfo + Send + Sync + 'static) -> Self {
        self.regs = Arc::new(regs);
        self
    }

    /// The target this decoder was built for.
    pub const fn target(&self) -> &Target {
        &self.target
    }

    /// Instruction metadata used by this decoder.
    pub fn info(&self) -> &dyn InstrInfo {
        self.info.as_ref()
    }

    /// Decodes one instruction from the front of `bytes`.
    ///
    /// # Arguments
    ///
    /// * `bytes` - Code starting at the instruction; may extend past it.
    /// * `address` - Load address of `bytes[0]`, used for branch targets.
    /// * `symbolizer` - Optional resolver for branch targets.
    ///
    /// # Returns
    ///
    /// The outcome. A `Fail` consumes `min(4, bytes.len())` bytes so callers
    /// always make progress.
    pub fn get_instruction(
        &self,
        bytes: &[u8],
        address: u64,
        symbolizer: Option<&mut dyn Symbolizer>,
    ) -> DecodeOutcome {
        let window = &bytes[..bytes.len().min(self.target.max_instruction_bytes())];
        let symbolizer = symbolizer.map(|s| s as &mut dyn Symbolizer);
        let mut ctx = DecodeContext::new(window, address, symbolizer);
        let ops = OperandDecoder::new(&self.target, self.regs.as_ref());

        let mut accepted: Option<Candidate> = None;

        'cascade: for step in CASCADE {
            if step.width == WordWidth::W96 && !self.target.is_gfx11_plus() {
                continue;
            }
            if !self.target.has(step.gate) {
                continue;
            }
            ctx.cursor.restore(0);
            let word = match step.width {
                WordWidth::W96 => ctx.cursor.read_u96(),
                WordWidth::W64 => ctx.cursor.read_u64().map(u128::from),
                WordWidth::W32 => ctx.cursor.read_u32().map(u128::from),
            };
            let Some(word) = word else {
                continue;
            };
            let mark = ctx.comments().len();
            for &id in step.tables {
                let Ok(Some(mut inst)) = try_table(
                    &ops,
                    &self.target,
                    self.info.as_ref(),
                    &mut ctx,
                    self.tables.as_ref(),
                    id,
                    word,
                ) else {
                    ctx.truncate_comments(mark);
                    continue;
                };
                let desc = self.info.desc(inst.opcode);
                if step.fixup.apply(&mut inst, desc) == DecodeStatus::Success {
                    accepted = Some(Candidate {
                        inst,
                        is_sdwa: step.fixup == StepFixup::Sdwa,
                    });
                    break 'cascade;
                }
                debug!(table = id.name(), "discarding soft-failed candidate");
                ctx.truncate_comments(mark);
                break;
            }
        }

        let Some(Candidate { mut inst, is_sdwa }) = accepted else {
            trace!(address, "no table matched");
            return DecodeOutcome::fail(address, bytes.len(), ctx.take_comments());
        };

        let normalizer = Normalizer {
            target: &self.target,
            info: self.info.as_ref(),
            regs: self.regs.as_ref(),
        };
        if let Err(err) = normalizer.run(&mut ctx, &mut inst, is_sdwa) {
            ctx.comment(format!("Error: {err}"));
            return DecodeOutcome::fail(address, bytes.len(), ctx.take_comments());
        }
        DecodeOutcome {
            address,
            status: DecodeStatus::Success,
            instruction: Some(inst),
            size: ctx.cursor.consumed(),
            comments: ctx.take_comments(),
        }
    }

    /// Decodes every instruction in `bytes`.
    ///
    /// Decoding resumes after each outcome's size, so undecodable words are
    /// reported and skipped rather than ending the walk.
    pub fn decode_all(
        &self,
        bytes: &[u8],
        address: u64,
        mut symbolizer: Option<&mut dyn Symbolizer>,
    ) -> Vec<DecodeOutcome> {
        let mut out = Vec::new();
        let mut offset = 0;
        while offset < bytes.len() {
            let sym = symbolizer.as_mut().map(|s| &mut **s as &mut dyn Symbolizer);
            let outcome = self.get_instruction(&bytes[offset..], address.wrapping_add(offset as u64), sym);
            let size = outcome.size;
            out.push(outcome);
            if size == 0 {
                break;
            }
            offset += size;
        }
        out
    }
}
