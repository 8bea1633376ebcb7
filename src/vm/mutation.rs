//! Copy mutation - Pluggable per-copy mutation policy
//!
//! `HCopy` consults the CPU's mutator once per copied instruction. The core
//! fixes no rate or distribution; callers install whatever policy their
//! experiment needs. [`NoMutation`] is the default and copies exactly.

use super::{Instruction, InstructionTable, Opcode};
use rand::Rng;

/// Decides whether a copied instruction is altered on its way to the write head.
pub trait CopyMutator: Send {
    /// Return a replacement opcode, or `None` to copy faithfully.
    fn mutate(&mut self, copied: &Instruction, table: &InstructionTable) -> Option<Opcode>;
}

/// Faithful copying.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMutation;

impl CopyMutator for NoMutation {
    fn mutate(&mut self, _copied: &Instruction, _table: &InstructionTable) -> Option<Opcode> {
        None
    }
}

/// Point mutation: with probability `rate`, replace the copied opcode by one
/// drawn uniformly from the table (which may be the same opcode).
#[derive(Debug, Clone)]
pub struct PointMutation<R> {
    rate: f64,
    rng: R,
}

impl<R: Rng> PointMutation<R> {
    /// Create with a per-copy rate, clamped to [0, 1].
    pub fn new(rate: f64, rng: R) -> Self {
        let rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        Self { rate, rng }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl<R: Rng + Send> CopyMutator for PointMutation<R> {
    fn mutate(&mut self, _copied: &Instruction, table: &InstructionTable) -> Option<Opcode> {
        if self.rate <= 0.0 || !self.rng.gen_bool(self.rate) {
            return None;
        }
        let id = self.rng.gen_range(0..table.len());
        Some(Opcode(id as u8))
    }
}

impl<F> CopyMutator for F
where
    F: FnMut(&Instruction, &InstructionTable) -> Option<Opcode> + Send,
{
    fn mutate(&mut self, copied: &Instruction, table: &InstructionTable) -> Option<Opcode> {
        self(copied, table)
    }
}
