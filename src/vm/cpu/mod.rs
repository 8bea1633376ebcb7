//! Virtual CPU - Execution state and the fetch/execute loop
//!
//! One CPU runs one organism. It owns its registers, stacks, heads and the
//! working copy of the genome; the genome itself and the instruction table
//! are shared read-only.
//!
//! Each [`VirtualCpu::step`] executes exactly one instruction:
//!
//! ```text
//! fetch working[IP] → executor(cpu, inst) → IP = (IP + 1) mod len
//! ```
//!
//! Executors that move the instruction pointer do so relative to that final
//! advance. A fault in an executor kills this organism only: the CPU records
//! it and refuses to step again.

mod ops_control;
mod ops_math;
mod ops_replication;

use super::{
    CopyMutator, CpuConfig, Genome, Head, Instruction, InstructionTable, NoMutation, Opcode,
};
use crate::error::{CpuError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Number of general-purpose registers
pub const NUM_REGS: usize = 3;

/// Number of stacks
pub const NUM_STACKS: usize = 2;

/// Register compared against `idx` by the branch instructions.
pub const fn complement_index(idx: usize) -> usize {
    (idx + 1) % NUM_REGS
}

/// Progress of the current replication cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReplicationPhase {
    /// Nothing allocated yet
    #[default]
    Fresh,
    /// Working buffer grown, nothing copied
    Allocated,
    /// Copying, read head still inside the parent
    Copying,
    /// Read head has crossed the parent length; HDivide will succeed
    DivideReady,
    /// Offspring produced, not yet acknowledged via `is_divided`
    Divided,
}

/// Receives offspring produced during [`VirtualCpu::run`].
///
/// Any `FnMut(Genome)` closure is a sink.
pub trait OffspringSink {
    fn accept(&mut self, offspring: Genome);
}

impl<F: FnMut(Genome)> OffspringSink for F {
    fn accept(&mut self, offspring: Genome) {
        self(offspring)
    }
}

/// The virtual CPU.
pub struct VirtualCpu {
    table: Arc<InstructionTable>,
    config: CpuConfig,
    genome: Arc<Genome>,
    working: Vec<Instruction>,
    regs: [i32; NUM_REGS],
    stacks: [VecDeque<i32>; NUM_STACKS],
    active_stack: usize,
    inst_ptr: usize,
    read_head: usize,
    write_head: usize,
    flow_head: usize,
    copied_history: Vec<Opcode>,
    output_history: Vec<i32>,
    input_queue: VecDeque<i32>,
    mutator: Box<dyn CopyMutator>,
    phase: ReplicationPhase,
    offspring: Option<Genome>,
    divided: bool,
    fault: Option<String>,
    steps: u64,
}

impl VirtualCpu {
    /// Create a CPU for `genome` with the default configuration.
    pub fn new(genome: impl Into<Arc<Genome>>, table: Arc<InstructionTable>) -> Self {
        Self::with_config(genome, table, CpuConfig::default())
    }

    pub fn with_config(
        genome: impl Into<Arc<Genome>>,
        table: Arc<InstructionTable>,
        config: CpuConfig,
    ) -> Self {
        let genome = genome.into();
        let working = genome.instructions().to_vec();
        Self {
            table,
            config,
            genome,
            working,
            regs: [0; NUM_REGS],
            stacks: [VecDeque::new(), VecDeque::new()],
            active_stack: 0,
            inst_ptr: 0,
            read_head: 0,
            write_head: 0,
            flow_head: 0,
            copied_history: Vec::new(),
            output_history: Vec::new(),
            input_queue: VecDeque::new(),
            mutator: Box::new(NoMutation),
            phase: ReplicationPhase::Fresh,
            offspring: None,
            divided: false,
            fault: None,
            steps: 0,
        }
    }

    /// Install a copy-mutation policy.
    pub fn set_mutator(&mut self, mutator: impl CopyMutator + 'static) {
        self.mutator = Box::new(mutator);
    }

    /// Full reset onto a (possibly different) genome.
    ///
    /// Clears all state including output history, pending input, pending
    /// offspring and any recorded fault. The mutator is kept.
    pub fn reset(&mut self, genome: impl Into<Arc<Genome>>) {
        self.genome = genome.into();
        self.reset_hardware();
        self.output_history.clear();
        self.input_queue.clear();
        self.offspring = None;
        self.divided = false;
        self.fault = None;
        self.steps = 0;
    }

    /// Reset registers, stacks, heads and working buffer to a fresh copy of
    /// the genome. Output history and pending input survive.
    fn reset_hardware(&mut self) {
        self.working.clear();
        self.working.extend_from_slice(self.genome.instructions());
        self.regs = [0; NUM_REGS];
        for stack in &mut self.stacks {
            stack.clear();
        }
        self.active_stack = 0;
        self.inst_ptr = 0;
        self.read_head = 0;
        self.write_head = 0;
        self.flow_head = 0;
        self.copied_history.clear();
        self.phase = ReplicationPhase::Fresh;
    }

    /// Execute one instruction and return its opcode.
    ///
    /// # Errors
    /// An executor fault (e.g. a non-nop modifier) kills the organism: the
    /// error is returned and every later call fails with `Faulted`.
    pub fn step(&mut self) -> Result<Opcode> {
        if let Some(reason) = &self.fault {
            return Err(CpuError::Faulted(reason.clone()));
        }

        let inst = self.working[self.inst_ptr].clone();
        let table = Arc::clone(&self.table);
        let exec = match table.get(inst.opcode) {
            Ok(meta) => meta.exec,
            Err(e) => return Err(self.kill(e)),
        };

        log::trace!("step {} IP={} {}", self.steps, self.inst_ptr, table.name(inst.opcode));

        if let Err(e) = exec(self, &inst) {
            return Err(self.kill(e));
        }
        self.advance_ip(1);
        self.steps += 1;
        Ok(inst.opcode)
    }

    /// Step until `max_steps` have run, handing each offspring to `sink`.
    ///
    /// Returns the number of offspring produced.
    pub fn run<S: OffspringSink + ?Sized>(&mut self, max_steps: u64, sink: &mut S) -> Result<usize> {
        let mut births = 0;
        for _ in 0..max_steps {
            self.step()?;
            if self.is_divided() {
                if let Some(offspring) = self.take_offspring() {
                    sink.accept(offspring);
                    births += 1;
                }
            }
        }
        Ok(births)
    }

    fn kill(&mut self, err: CpuError) -> CpuError {
        log::warn!("Organism faulted at IP={} after {} steps: {}", self.inst_ptr, self.steps, err);
        self.fault = Some(err.to_string());
        err
    }

    // =========================================================================
    // Division handoff
    // =========================================================================

    /// Whether a division completed since the last call (one-shot).
    pub fn is_divided(&mut self) -> bool {
        std::mem::take(&mut self.divided)
    }

    /// Take the offspring produced by the most recent division.
    pub fn take_offspring(&mut self) -> Option<Genome> {
        self.offspring.take()
    }

    pub fn replication_phase(&self) -> ReplicationPhase {
        if self.divided {
            return ReplicationPhase::Divided;
        }
        match self.phase {
            ReplicationPhase::Copying if self.read_head >= self.genome.len() => {
                ReplicationPhase::DivideReady
            }
            phase => phase,
        }
    }

    // =========================================================================
    // Heads
    // =========================================================================

    fn wrap(&self, pos: usize) -> usize {
        pos % self.working.len()
    }

    fn wrap_signed(&self, pos: i64) -> usize {
        pos.rem_euclid(self.working.len() as i64) as usize
    }

    fn advance_ip(&mut self, n: usize) {
        self.inst_ptr = self.wrap(self.inst_ptr + n);
    }

    /// Re-validate every head against the current working length.
    fn normalize_heads(&mut self) {
        self.inst_ptr = self.wrap(self.inst_ptr);
        self.read_head = self.wrap(self.read_head);
        self.write_head = self.wrap(self.write_head);
        self.flow_head = self.wrap(self.flow_head);
    }

    pub fn head(&self, head: Head) -> usize {
        match head {
            Head::Inst => self.inst_ptr,
            Head::Read => self.read_head,
            Head::Write => self.write_head,
            Head::Flow => self.flow_head,
        }
    }

    /// Move a head; the position wraps into the working buffer.
    pub fn set_head(&mut self, head: Head, pos: usize) {
        let pos = self.wrap(pos);
        match head {
            Head::Inst => self.inst_ptr = pos,
            Head::Read => self.read_head = pos,
            Head::Write => self.write_head = pos,
            Head::Flow => self.flow_head = pos,
        }
    }

    // =========================================================================
    // Stacks
    // =========================================================================

    fn stack_push(&mut self, value: i32) {
        if self.config.stack_depth == 0 {
            return;
        }
        let stack = &mut self.stacks[self.active_stack];
        if stack.len() >= self.config.stack_depth {
            stack.pop_front();
        }
        stack.push_back(value);
    }

    fn stack_pop(&mut self) -> i32 {
        self.stacks[self.active_stack].pop_back().unwrap_or(0)
    }

    fn stack_swap(&mut self) {
        self.active_stack = (self.active_stack + 1) % NUM_STACKS;
    }

    /// Stack contents, bottom to top.
    pub fn stack(&self, which: usize) -> Vec<i32> {
        self.stacks
            .get(which)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn active_stack(&self) -> usize {
        self.active_stack
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn registers(&self) -> &[i32; NUM_REGS] {
        &self.regs
    }

    /// # Panics
    /// If `idx >= NUM_REGS`.
    pub fn register(&self, idx: usize) -> i32 {
        self.regs[idx]
    }

    /// # Panics
    /// If `idx >= NUM_REGS`.
    pub fn set_register(&mut self, idx: usize, value: i32) {
        self.regs[idx] = value;
    }

    /// Queue a value for the next `IO` instruction to read.
    pub fn push_input(&mut self, value: i32) {
        self.input_queue.push_back(value);
    }

    pub fn pending_inputs(&self) -> usize {
        self.input_queue.len()
    }

    pub fn output_history(&self) -> &[i32] {
        &self.output_history
    }

    pub fn copied_history(&self) -> &[Opcode] {
        &self.copied_history
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn working(&self) -> &[Instruction] {
        &self.working
    }

    pub fn table(&self) -> &Arc<InstructionTable> {
        &self.table
    }

    pub fn config(&self) -> &CpuConfig {
        &self.config
    }

    /// Instructions executed since the last full reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    pub fn fault(&self) -> Option<&str> {
        self.fault.as_deref()
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            registers: self.regs,
            stacks: [self.stack(0), self.stack(1)],
            active_stack: self.active_stack,
            inst_ptr: self.inst_ptr,
            read_head: self.read_head,
            write_head: self.write_head,
            flow_head: self.flow_head,
            genome_len: self.genome.len(),
            working: self
                .working
                .iter()
                .map(|i| self.table.name(i.opcode).to_string())
                .collect(),
            copied_history: self.copied_history.clone(),
            output_history: self.output_history.clone(),
            phase: self.replication_phase(),
            steps: self.steps,
            fault: self.fault.clone(),
        }
    }

    /// Human-readable dump of the full CPU state.
    pub fn dump_state(&self) -> String {
        self.snapshot().to_string()
    }
}

impl fmt::Debug for VirtualCpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtualCpu(IP={} RH={} WH={} FH={} regs={:?} len={}/{})",
            self.inst_ptr,
            self.read_head,
            self.write_head,
            self.flow_head,
            self.regs,
            self.working.len(),
            self.genome.len(),
        )
    }
}

/// Serializable copy of a CPU's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSnapshot {
    pub registers: [i32; NUM_REGS],
    /// Bottom to top
    pub stacks: [Vec<i32>; NUM_STACKS],
    pub active_stack: usize,
    pub inst_ptr: usize,
    pub read_head: usize,
    pub write_head: usize,
    pub flow_head: usize,
    pub genome_len: usize,
    /// Instruction name per working-buffer position
    pub working: Vec<String>,
    pub copied_history: Vec<Opcode>,
    pub output_history: Vec<i32>,
    pub phase: ReplicationPhase,
    pub steps: u64,
    pub fault: Option<String>,
}

impl fmt::Display for CpuSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "steps: {}  phase: {:?}", self.steps, self.phase)?;
        if let Some(fault) = &self.fault {
            writeln!(f, "FAULT: {}", fault)?;
        }
        writeln!(f, "regs:  A={} B={} C={}", self.registers[0], self.registers[1], self.registers[2])?;
        writeln!(f, "heads: IP={} RH={} WH={} FH={}",
            self.inst_ptr, self.read_head, self.write_head, self.flow_head)?;
        for (i, stack) in self.stacks.iter().enumerate() {
            let marker = if i == self.active_stack { "*" } else { " " };
            writeln!(f, "stack{}{} {:?}", i, marker, stack)?;
        }
        writeln!(f, "outputs: {:?}", self.output_history)?;
        writeln!(f, "copied: {} instructions", self.copied_history.len())?;
        writeln!(f, "working ({} / genome {}):", self.working.len(), self.genome_len)?;
        for (pos, name) in self.working.iter().enumerate() {
            let mut heads = Vec::new();
            if pos == self.inst_ptr { heads.push("IP"); }
            if pos == self.read_head { heads.push("RH"); }
            if pos == self.write_head { heads.push("WH"); }
            if pos == self.flow_head { heads.push("FH"); }
            if heads.is_empty() {
                writeln!(f, "  {:4} {}", pos, name)?;
            } else {
                writeln!(f, "  {:4} {:10} <- {}", pos, name, heads.join(" "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(super) fn table() -> Arc<InstructionTable> {
        InstructionTable::shared()
    }

    pub(super) fn cpu(names: &[&str]) -> VirtualCpu {
        let genome = table().decode_names(names).unwrap();
        VirtualCpu::new(genome, table())
    }

    pub(super) fn run_steps(cpu: &mut VirtualCpu, n: usize) {
        for _ in 0..n {
            cpu.step().unwrap();
        }
    }

    /// Minimal self-replicator:
    /// allocate, aim the write head at the new half, mark the loop start with
    /// a label, then copy until the read head reaches the parent length.
    pub(super) const REPLICATOR: [&str; 16] = [
        "HAlloc",
        "SetFlow", "NopA",     // FH = r0 (parent length)
        "MovHead", "NopC",     // WH = FH
        "HSearch", "NopB",     // FH = just past the complement label
        "Swap-Stk", "NopA",    // carries the complement label
        "HCopy",               // loop start
        "GetHead", "NopB",     // r2 = RH
        "IfLess", "NopC",      // r2 < r0 ?
        "MovHead",             // IP = FH
        "HDivide",
    ];

    #[test]
    fn test_new_cpu_state() {
        let cpu = cpu(&["Inc", "Dec"]);
        assert_eq!(cpu.registers(), &[0, 0, 0]);
        for head in Head::ALL {
            assert_eq!(cpu.head(head), 0);
        }
        assert_eq!(cpu.working(), cpu.genome().instructions());
        assert_eq!(cpu.active_stack(), 0);
        assert_eq!(cpu.replication_phase(), ReplicationPhase::Fresh);
    }

    #[test]
    fn test_nops_are_identities() {
        let mut cpu = cpu(&["NopA", "NopB", "NopC"]);
        let before = cpu.snapshot();
        run_steps(&mut cpu, 3);
        let after = cpu.snapshot();

        assert_eq!(after.steps, 3);
        assert_eq!(CpuSnapshot { steps: 0, ..after }, before);
    }

    #[test]
    fn test_step_returns_opcode_and_advances() {
        let mut cpu = cpu(&["Inc", "Dec", "IO"]);
        assert_eq!(cpu.step().unwrap(), Opcode(5));
        assert_eq!(cpu.head(Head::Inst), 1);
        assert_eq!(cpu.step().unwrap(), Opcode(6));
        assert_eq!(cpu.step().unwrap(), Opcode(15));
        assert_eq!(cpu.head(Head::Inst), 0);
    }

    #[test]
    fn test_invalid_modifier_kills_organism() {
        let table = table();
        let inc = table.lookup("Inc").unwrap();
        let genome = table.decode_names(&["Inc", "Dec"]).unwrap();
        let mut cpu = VirtualCpu::new(genome, table.clone());

        // Corrupt the working buffer behind the decoder's back
        cpu.working[0] = Instruction::with_modifiers(inc, vec![inc]);

        assert!(matches!(cpu.step(), Err(CpuError::InvalidModifier(op)) if op == inc));
        assert!(cpu.is_faulted());
        assert!(matches!(cpu.step(), Err(CpuError::Faulted(_))));

        cpu.reset(cpu.genome().clone());
        assert!(!cpu.is_faulted());
        assert!(cpu.step().is_ok());
    }

    #[test]
    fn test_unknown_opcode_faults() {
        let mut cpu = cpu(&["Inc"]);
        cpu.working[0] = Instruction::new(Opcode(200));
        assert!(matches!(cpu.step(), Err(CpuError::UnknownOpcode(Opcode(200)))));
        assert!(cpu.is_faulted());
    }

    #[test]
    fn test_set_head_wraps() {
        let mut cpu = cpu(&["NopA"; 10]);
        cpu.set_head(Head::Write, 13);
        assert_eq!(cpu.head(Head::Write), 3);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut cpu = cpu(&["Inc", "IO", "Push"]);
        cpu.push_input(4);
        run_steps(&mut cpu, 3);
        assert!(!cpu.output_history().is_empty());

        let other = table().decode_names(&["Dec"]).unwrap();
        cpu.reset(other.clone());
        assert_eq!(cpu.genome(), &other);
        assert_eq!(cpu.working(), other.instructions());
        assert_eq!(cpu.registers(), &[0, 0, 0]);
        assert!(cpu.output_history().is_empty());
        assert_eq!(cpu.pending_inputs(), 0);
        assert!(cpu.stack(0).is_empty());
        assert_eq!(cpu.steps(), 0);
    }

    #[test]
    fn test_dump_state_mentions_heads() {
        let mut cpu = cpu(&["Inc", "Dec"]);
        cpu.step().unwrap();
        let dump = cpu.dump_state();
        assert!(dump.contains("regs:  A=0 B=1 C=0"));
        assert!(dump.contains("Dec"));
        assert!(dump.contains("<- IP"));
    }

    #[test]
    fn test_snapshot_serializes() {
        let cpu = cpu(&["Inc", "NopB"]);
        let json = serde_json::to_string(&cpu.snapshot()).unwrap();
        let restored: CpuSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cpu.snapshot());
    }

    #[test]
    fn test_cpus_run_on_separate_threads() {
        let table = table();
        let genome = Arc::new(table.decode_names(&REPLICATOR).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let mut cpu = VirtualCpu::new(genome.clone(), table.clone());
                std::thread::spawn(move || {
                    let mut offspring = Vec::new();
                    cpu.run(500, &mut |g: Genome| offspring.push(g)).unwrap();
                    offspring
                })
            })
            .collect();

        for handle in handles {
            let offspring = handle.join().unwrap();
            assert!(!offspring.is_empty());
            assert!(offspring.iter().all(|g| g == genome.as_ref()));
        }
    }
}
