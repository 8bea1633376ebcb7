//! Modifier - Resolution of nop modifiers to register and head targets
//!
//! The first modifier of an instruction redirects its target:
//!
//! ```text
//! Modifier   Register   Head
//!   a           0       inst
//!   b           1       read
//!   c           2       write
//! (none)     default   default
//! ```
//!
//! Every redirectable instruction goes through [`first_modifier_to_index`].
//! Only the first modifier is consulted; the rest of the run is label material.

use super::Opcode;
use crate::error::{CpuError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resolve the first modifier to a register/head index, or `default_index`
/// when there are no modifiers.
///
/// A non-nop in first position is an invariant violation and kills the
/// organism executing it.
pub fn first_modifier_to_index(modifiers: &[Opcode], default_index: usize) -> Result<usize> {
    match modifiers.first() {
        None => Ok(default_index),
        Some(&op) if op.is_nop() => Ok(op.index()),
        Some(&op) => Err(CpuError::InvalidModifier(op)),
    }
}

/// Resolve the first modifier to a head selector
pub fn first_modifier_to_head(modifiers: &[Opcode], default_head: Head) -> Result<Head> {
    let idx = first_modifier_to_index(modifiers, default_head.index())?;
    Ok(Head::from_index(idx).unwrap_or(default_head))
}

/// One of the four CPU heads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Head {
    /// Instruction pointer
    Inst,
    /// Copy source
    Read,
    /// Copy destination
    Write,
    /// Jump/loop target
    Flow,
}

impl Head {
    pub const ALL: [Head; 4] = [Head::Inst, Head::Read, Head::Write, Head::Flow];

    /// Head addressed by a modifier index. Flow has no modifier code.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Inst),
            1 => Some(Self::Read),
            2 => Some(Self::Write),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Inst => 0,
            Self::Read => 1,
            Self::Write => 2,
            Self::Flow => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Inst => "IP",
            Self::Read => "RH",
            Self::Write => "WH",
            Self::Flow => "FH",
        }
    }
}

impl fmt::Display for Head {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
