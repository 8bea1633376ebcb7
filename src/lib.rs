//! # orgcpu - Virtual CPU for Digital Organisms
//!
//! Execution engine for self-replicating programs. An organism's genome is
//! a sequence of instructions that can allocate space, copy itself, find
//! its own labels and split off an offspring, all as ordinary instruction
//! side effects.
//!
//! ## Core Components
//!
//! - **InstructionTable**: shared, read-only map from names to opcodes and executors
//! - **VirtualCpu**: registers, stacks, four heads and a resizable working buffer
//! - **Genome**: decoded, immutable instruction sequence
//! - **CopyMutator**: pluggable per-copy mutation policy
//!
//! ## Design Principles
//!
//! - **One CPU per organism**: no shared mutable state, no locks
//! - **Data-driven dispatch**: executors are plain `fn` pointers in a table
//! - **Local faults**: a bad instruction kills its organism, never the process
//! - **Wrapping arithmetic**: identical overflow behaviour on every build
//!
//! ## Example
//!
//! ```ignore
//! use orgcpu::{load_path, Genome, InstructionTable, VirtualCpu};
//!
//! let table = InstructionTable::shared();
//! let genome = load_path("replicator.org", &table)?;
//! let mut cpu = VirtualCpu::new(genome, table);
//!
//! let mut offspring = Vec::new();
//! cpu.run(10_000, &mut |g: Genome| offspring.push(g))?;
//! println!("{}", cpu.dump_state());
//! ```

// Organism VM - instruction table, CPU, codecs
pub mod vm;
pub use vm::{
    // Core types
    VirtualCpu, Genome, Instruction, Opcode, Head,
    InstructionTable, InstructionMeta, CpuConfig,
    ReplicationPhase, CpuSnapshot, OffspringSink,
    // Mutation
    CopyMutator, NoMutation, PointMutation,
    // Text format
    parse_genome, format_genome,
};

// Error types
mod error;
pub use error::{CpuError, Result};

// Genome loader - clean API for loading .org/.orgb files
pub mod loader;
pub use loader::{GenomeFormat, GenomeLoader, load_path, load_string};
