//! Label - Complement labels and circular label search
//!
//! A label is a run of nops. Its complement is taken symbol-wise:
//!
//! ```text
//! a ↔ b      c ↔ c
//! ```
//!
//! The mapping is its own inverse, so `complement(complement(l)) == l`.
//! Replication code marks a location with one label and finds it from
//! elsewhere by searching for the complement.

use super::{Instruction, Opcode};

/// Complement of a single nop. Non-nops map to themselves.
pub const fn complement_nop(op: Opcode) -> Opcode {
    match op {
        Opcode::NOP_A => Opcode::NOP_B,
        Opcode::NOP_B => Opcode::NOP_A,
        other => other,
    }
}

/// Symbol-wise complement of a label
pub fn complement(label: &[Opcode]) -> Vec<Opcode> {
    label.iter().map(|&op| complement_nop(op)).collect()
}

/// Search forward from `start_pos + 1`, wrapping around the buffer, for the
/// first window whose opcodes equal the complement of `label`.
///
/// Returns the offset from `start_pos` (in `1..=len`) of the window's first
/// position. Each start position is tried at most once; windows themselves
/// may wrap past the end. An empty label never matches.
pub fn find_complement_label(
    buffer: &[Instruction],
    label: &[Opcode],
    start_pos: usize,
) -> Option<usize> {
    let len = buffer.len();
    if label.is_empty() || len == 0 {
        return None;
    }

    let target = complement(label);
    (1..=len).find(|&offset| {
        let pos = start_pos + offset;
        target
            .iter()
            .enumerate()
            .all(|(i, &op)| buffer[(pos + i) % len].opcode == op)
    })
}

/// Whether the most recently copied opcodes spell the complement of `label`.
///
/// An empty label matches trivially; a history shorter than the label never
/// matches.
pub fn tail_matches_complement(history: &[Opcode], label: &[Opcode]) -> bool {
    if history.len() < label.len() {
        return false;
    }
    let tail = &history[history.len() - label.len()..];
    tail.iter()
        .zip(label)
        .all(|(&copied, &want)| copied == complement_nop(want))
}
