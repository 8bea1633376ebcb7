//! Instruction - Decoded genome positions
//!
//! ## Decoding
//!
//! ```text
//! opcodes:   HSearch  NopB  NopA  Swap-Stk  NopA  HCopy
//!               ↓       ↓     ↓      ↓        ↓      ↓
//! decoded:   HSearch[b,a]  a     b  Swap-Stk[a]  a  HCopy
//! ```
//!
//! Every opcode keeps its own position. A non-nop instruction additionally
//! records the run of nops that immediately follows it (up to the table's
//! modifier cap) as its modifiers. The nops stay in place so that labels can
//! be searched for, copied and skipped by position.

use super::Opcode;
use crate::error::{CpuError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default cap on modifiers attached to one instruction
pub const MAX_MODIFIERS: usize = 3;

/// A decoded instruction: opcode plus attached nop modifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    /// Operation opcode
    pub opcode: Opcode,
    /// Nops following this instruction, in order
    pub modifiers: Vec<Opcode>,
}

impl Instruction {
    /// Create an instruction without modifiers
    pub fn new(opcode: Opcode) -> Self {
        Self { opcode, modifiers: Vec::new() }
    }

    /// Create an instruction with explicit modifiers
    pub fn with_modifiers(opcode: Opcode, modifiers: Vec<Opcode>) -> Self {
        Self { opcode, modifiers }
    }

    /// The neutral filler written by allocation
    pub fn filler() -> Self {
        Self::new(Opcode::NOP_A)
    }

    pub fn is_nop(&self) -> bool {
        self.opcode.is_nop()
    }

    pub fn has_modifiers(&self) -> bool {
        !self.modifiers.is_empty()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        for m in &self.modifiers {
            match m.modifier_letter() {
                Some(letter) => write!(f, "{}", letter)?,
                None => write!(f, "?{}", m)?,
            }
        }
        Ok(())
    }
}

/// An immutable, non-empty sequence of decoded instructions
///
/// Only constructible by decoding an opcode stream, so every instruction's
/// modifiers always agree with the positions that follow it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Genome {
    instructions: Vec<Instruction>,
}

impl Genome {
    /// Decode an opcode stream, attaching up to `max_modifiers` trailing nops
    /// to each non-nop instruction.
    pub fn decode(opcodes: &[Opcode], max_modifiers: usize) -> Result<Self> {
        if opcodes.is_empty() {
            return Err(CpuError::EmptyGenome);
        }

        let instructions = opcodes
            .iter()
            .enumerate()
            .map(|(pos, &opcode)| {
                if opcode.is_nop() {
                    return Instruction::new(opcode);
                }
                let modifiers = opcodes[pos + 1..]
                    .iter()
                    .take_while(|op| op.is_nop())
                    .take(max_modifiers)
                    .copied()
                    .collect();
                Instruction::with_modifiers(opcode, modifiers)
            })
            .collect();

        Ok(Self { instructions })
    }

    /// Decode using the default modifier cap
    pub fn from_opcodes(opcodes: &[Opcode]) -> Result<Self> {
        Self::decode(opcodes, MAX_MODIFIERS)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn get(&self, pos: usize) -> Option<&Instruction> {
        self.instructions.get(pos)
    }

    /// Opcode stream (one per position)
    pub fn opcodes(&self) -> Vec<Opcode> {
        self.instructions.iter().map(|i| i.opcode).collect()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Always false for a decoded genome; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }
}

impl<'a> IntoIterator for &'a Genome {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}
