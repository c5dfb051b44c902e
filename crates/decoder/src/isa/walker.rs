//! Decode table walker.
//!
//! Matches an instruction word against one table and decodes the operands of
//! the first matching entry. There is no backtracking inside a table: once an
//! entry matches, its operand errors fail the whole attempt.

use tracing::{debug, trace};

use crate::common::error::DecodeError;
use crate::config::Target;
use crate::isa::context::DecodeContext;
use crate::isa::instruction::Instruction;
use crate::isa::metadata::InstrInfo;
use crate::isa::operand::OperandDecoder;
use crate::isa::table::{TableId, TableSource};

/// Attempts one table against `word`.
///
/// The literal slot is cleared before the attempt. On a miss or an operand
/// error the cursor and the comment buffer are put back as they were, so the
/// next attempt sees the same window.
///
/// # Arguments
///
/// * `ops` - Operand decoder for the active target.
/// * `target` - Active target; its features gate entries.
/// * `info` - Instruction metadata, consulted by context-dependent decoders.
/// * `ctx` - Per-call state, with the cursor positioned after `word`.
/// * `tables` - Table source; an absent table is a miss.
/// * `id` - Table to try.
/// * `word` - Instruction word of the hypothesized width.
///
/// # Returns
///
/// * `Ok(Some(inst))` - An entry matched and every operand decoded.
/// * `Ok(None)` - No entry matched.
///
/// # Errors
///
/// The first operand error of the matched entry.
pub fn try_table(
    ops: &OperandDecoder<'_>,
    target: &Target,
    info: &dyn InstrInfo,
    ctx: &mut DecodeContext<'_>,
    tables: &dyn TableSource,
    id: TableId,
    word: u128,
) -> Result<Option<Instruction>, DecodeError> {
    ctx.reset_literal();
    let Some(entries) = tables.table(id) else {
        return Ok(None);
    };
    let Some(entry) = entries
        .iter()
        .find(|entry| entry.matches(word, target.features))
    else {
        trace!(table = id.name(), word = format_args!("{word:#x}"), "no match");
        return Ok(None);
    };

    let pos = ctx.cursor.consumed();
    let comments = ctx.comments().len();
    let desc = info.desc(entry.opcode);
    let mut inst = Instruction::new(entry.opcode);
    for directive in &entry.operands {
        match ops.decode_field(ctx, &inst, desc, directive, word) {
            Ok(op) => inst.push(op),
            Err(err) => {
                debug!(table = id.name(), opcode = %entry.opcode, %err, "operand decode failed");
                ctx.cursor.restore(pos);
                ctx.truncate_comments(comments);
                ctx.reset_literal();
                return Err(err);
            }
        }
    }
    trace!(table = id.name(), opcode = %entry.opcode, operands = inst.len(), "matched");
    Ok(Some(inst))
}
