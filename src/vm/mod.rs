//! Organism VM - Self-replicating virtual CPU
//!
//! A genome is a sequence of single-opcode positions. Nops that follow an
//! instruction act as its modifiers, redirecting which register or head it
//! uses, and runs of nops double as labels for self-inspection.
//!
//! ## Execution
//!
//! ```text
//! step: fetch working[IP] → table[opcode].exec(cpu, inst) → IP += 1 (mod len)
//! ```
//!
//! ## Replication
//!
//! Self-replication is plain instruction side effects:
//!
//! ```text
//! HAlloc    working buffer doubles; r0 = parent length
//! HSearch   flow head finds the copy-loop label
//! HCopy     working[WH] = working[RH]; RH += 1; WH += 1
//! HDivide   once RH ≥ parent length: offspring = working[..RH]; CPU resets
//! ```
//!
//! ## Registers and Heads
//!
//! ```text
//! Registers: A (r0)  B (r1)  C (r2)          i32, wrapping
//! Heads:     IP  RH  WH  FH                  wrap mod working length
//! Stacks:    two bounded stacks, one active
//! ```
//!
//! ## Example Genome
//!
//! ```text
//! ; copy loop, labelled `a` at the HCopy
//! HAlloc SetFlowa MovHeadc HSearchb Swap-Stka
//! HCopy GetHeadb IfLessc MovHead HDivide
//! ```

mod binary;
mod config;
mod cpu;
mod instruction;
pub mod label;
mod library;
mod modifier;
mod mutation;
mod opcode;
mod table;
mod text;

pub use binary::{deserialize, load_from_file, save_to_file, serialize, HEADER_SIZE};
pub use config::CpuConfig;
pub use cpu::{
    complement_index, CpuSnapshot, OffspringSink, ReplicationPhase, VirtualCpu, NUM_REGS,
    NUM_STACKS,
};
pub use instruction::{Genome, Instruction, MAX_MODIFIERS};
pub use label::{complement, find_complement_label, tail_matches_complement};
pub use library::register_standard;
pub use modifier::{first_modifier_to_head, first_modifier_to_index, Head};
pub use mutation::{CopyMutator, NoMutation, PointMutation};
pub use opcode::Opcode;
pub use table::{ExecFn, InstructionMeta, InstructionTable};
pub use text::{format_genome, parse_genome};

/// Magic bytes for .orgb binary genomes
pub const GENOME_MAGIC: [u8; 4] = [0x4F, 0x52, 0x47, 0x4E]; // "ORGN"

/// Current version of the binary format
pub const GENOME_VERSION: u16 = 0x0001;
