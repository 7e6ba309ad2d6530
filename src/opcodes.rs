//! Edit scripts derived from matching blocks.

use crate::models::{MatchBlock, OpTag, Opcode};
use std::iter;
use thiserror::Error;

/// Caller-supplied matching blocks that cannot describe the two sequences.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidBlocks {
    #[error("block {index} ({a}, {b}, {size}) runs past the sequence ends ({len_a}, {len_b})")]
    OutOfBounds {
        index: usize,
        a: usize,
        b: usize,
        size: usize,
        len_a: usize,
        len_b: usize,
    },
    #[error("block {index} starts at ({a}, {b}) before the previous block ends at ({a_end}, {b_end})")]
    Overlap {
        index: usize,
        a: usize,
        b: usize,
        a_end: usize,
        b_end: usize,
    },
}

/// Opcodes that fail to tile the sequences exactly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TilingError {
    #[error("opcode {index} starts at ({a0}, {b0}), expected ({expected_a}, {expected_b})")]
    Gap {
        index: usize,
        a0: usize,
        b0: usize,
        expected_a: usize,
        expected_b: usize,
    },
    #[error("opcode {index} has tag {tag} but spans {a_len}/{b_len} elements")]
    WrongTag {
        index: usize,
        tag: OpTag,
        a_len: usize,
        b_len: usize,
    },
    #[error("opcodes {index} and {next} share tag {tag}")]
    Unmerged { index: usize, next: usize, tag: OpTag },
    #[error("opcodes cover ({covered_a}, {covered_b}) of ({len_a}, {len_b})")]
    Incomplete {
        covered_a: usize,
        covered_b: usize,
        len_a: usize,
        len_b: usize,
    },
}

/// Build the edit script for sequences of `len_a` and `len_b` elements.
///
/// `matches` must be ordered and non-overlapping on both sides, as returned
/// by [`find_matches`](crate::matcher::find_matches). The trailing sentinel
/// is optional.
pub fn build_opcodes(
    matches: &[MatchBlock],
    len_a: usize,
    len_b: usize,
) -> Result<Vec<Opcode>, InvalidBlocks> {
    let mut prev_end = (0, 0);
    for (index, block) in matches.iter().enumerate() {
        if block.a_end() > len_a || block.b_end() > len_b {
            return Err(InvalidBlocks::OutOfBounds {
                index,
                a: block.a,
                b: block.b,
                size: block.size,
                len_a,
                len_b,
            });
        }
        if block.a < prev_end.0 || block.b < prev_end.1 {
            return Err(InvalidBlocks::Overlap {
                index,
                a: block.a,
                b: block.b,
                a_end: prev_end.0,
                b_end: prev_end.1,
            });
        }
        prev_end = (block.a_end(), block.b_end());
    }

    Ok(opcodes_from_blocks(matches, len_a, len_b))
}

/// Walk validated blocks, emitting a gap opcode before each block and an
/// `Equal` for the block itself. Same-tag neighbours are merged.
pub(crate) fn opcodes_from_blocks(
    matches: &[MatchBlock],
    len_a: usize,
    len_b: usize,
) -> Vec<Opcode> {
    let mut opcodes: Vec<Opcode> = Vec::with_capacity(matches.len() * 2);
    let (mut i, mut j) = (0, 0);

    let sentinel = MatchBlock::new(len_a, len_b, 0);
    for block in matches.iter().copied().chain(iter::once(sentinel)) {
        if let Some(tag) = OpTag::for_gap(block.a - i, block.b - j) {
            push_merged(&mut opcodes, Opcode::new(tag, i, block.a, j, block.b));
        }
        if block.size > 0 {
            push_merged(
                &mut opcodes,
                Opcode::new(OpTag::Equal, block.a, block.a_end(), block.b, block.b_end()),
            );
        }
        i = block.a_end();
        j = block.b_end();
    }

    opcodes
}

fn push_merged(opcodes: &mut Vec<Opcode>, op: Opcode) {
    match opcodes.last_mut() {
        Some(last) if last.tag == op.tag && last.a1 == op.a0 && last.b1 == op.b0 => {
            last.a1 = op.a1;
            last.b1 = op.b1;
        }
        // Adjacent gaps of different kinds (caller-supplied empty blocks)
        // collapse into one replace
        Some(last)
            if last.tag != OpTag::Equal && op.tag != OpTag::Equal && last.a1 == op.a0 && last.b1 == op.b0 =>
        {
            last.tag = OpTag::Replace;
            last.a1 = op.a1;
            last.b1 = op.b1;
        }
        _ => opcodes.push(op),
    }
}

/// Check that opcodes chain without gaps or overlaps, carry tags that match
/// their spans, never repeat a tag, and cover both sequences.
pub fn verify_tiling(opcodes: &[Opcode], len_a: usize, len_b: usize) -> Result<(), TilingError> {
    let (mut a, mut b) = (0, 0);

    for (index, op) in opcodes.iter().enumerate() {
        if op.a0 != a || op.b0 != b || op.a1 < op.a0 || op.b1 < op.b0 {
            return Err(TilingError::Gap {
                index,
                a0: op.a0,
                b0: op.b0,
                expected_a: a,
                expected_b: b,
            });
        }

        let tag_fits = match op.tag {
            OpTag::Equal => op.a_len() == op.b_len() && op.a_len() > 0,
            tag => OpTag::for_gap(op.a_len(), op.b_len()) == Some(tag),
        };
        if !tag_fits {
            return Err(TilingError::WrongTag {
                index,
                tag: op.tag,
                a_len: op.a_len(),
                b_len: op.b_len(),
            });
        }

        if let Some(next) = opcodes.get(index + 1) {
            if next.tag == op.tag {
                return Err(TilingError::Unmerged {
                    index,
                    next: index + 1,
                    tag: op.tag,
                });
            }
        }

        a = op.a1;
        b = op.b1;
    }

    if a != len_a || b != len_b {
        return Err(TilingError::Incomplete {
            covered_a: a,
            covered_b: b,
            len_a,
            len_b,
        });
    }

    Ok(())
}
