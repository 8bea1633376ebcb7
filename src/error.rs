//! Error types for orgcpu

use crate::vm::Opcode;
use thiserror::Error;

/// orgcpu error type
#[derive(Debug, Error)]
pub enum CpuError {
    /// Instruction name registered twice
    #[error("Instruction already registered: {0}")]
    DuplicateInstruction(String),

    /// Instruction name not in the table
    #[error("Unknown instruction: {0}")]
    UnknownInstruction(String),

    /// Opcode id not in the table
    #[error("Unknown opcode: {0}")]
    UnknownOpcode(Opcode),

    /// Opcode space exhausted
    #[error("Instruction table full ({0} opcodes)")]
    TableFull(usize),

    /// First modifier of an instruction is not a nop
    #[error("Invalid modifier: {0} is not a nop")]
    InvalidModifier(Opcode),

    /// Genomes must hold at least one instruction
    #[error("Genome is empty")]
    EmptyGenome,

    /// Organism was killed by an earlier fault
    #[error("Organism faulted: {0}")]
    Faulted(String),

    /// Text genome parse error
    #[error("Parse error at token '{token}': {message}")]
    Parse { token: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CpuError>;
