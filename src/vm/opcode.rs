//! Opcode - Instruction ids assigned by the instruction table
//!
//! Ids are handed out in registration order. The three nops are always
//! registered first, so their ids are fixed:
//!
//! | Id | Name | Modifier letter | Register / head |
//! |----|------|-----------------|-----------------|
//! | 0  | NopA | `a`             | 0 / inst        |
//! | 1  | NopB | `b`             | 1 / read        |
//! | 2  | NopC | `c`             | 2 / write       |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Instruction opcode (1 byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Opcode(pub u8);

impl Opcode {
    /// No-op A, modifier `a`
    pub const NOP_A: Self = Self(0);
    /// No-op B, modifier `b`
    pub const NOP_B: Self = Self(1);
    /// No-op C, modifier `c`
    pub const NOP_C: Self = Self(2);

    /// Number of nop opcodes
    pub const NOP_COUNT: usize = 3;

    /// Raw id
    pub const fn id(self) -> u8 {
        self.0
    }

    /// Raw id as a table index
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is one of the three nops
    pub const fn is_nop(self) -> bool {
        (self.0 as usize) < Self::NOP_COUNT
    }

    /// Nop for a register/head index (0, 1, 2)
    pub const fn nop_for_index(index: usize) -> Option<Self> {
        if index < Self::NOP_COUNT {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// Modifier letter for a nop (`a`, `b`, `c`)
    pub const fn modifier_letter(self) -> Option<char> {
        match self.0 {
            0 => Some('a'),
            1 => Some('b'),
            2 => Some('c'),
            _ => None,
        }
    }

    /// Nop for a modifier letter
    pub const fn from_modifier_letter(letter: char) -> Option<Self> {
        match letter {
            'a' => Some(Self::NOP_A),
            'b' => Some(Self::NOP_B),
            'c' => Some(Self::NOP_C),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
