//! Instruction Table - Registration, lookup and dispatch metadata
//!
//! The table maps instruction names to opcodes and opcodes to executors.
//! It is built once at startup, then shared read-only (behind an `Arc`)
//! by every CPU in the process.
//!
//! NopA, NopB and NopC are registered by the constructor, so their ids are
//! always 0, 1 and 2 and nop checks are a compare, not a lookup.

use super::{Genome, Instruction, Opcode, VirtualCpu};
use crate::error::{CpuError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Executor signature: CPU state and the decoded instruction, passed explicitly.
pub type ExecFn = fn(&mut VirtualCpu, &Instruction) -> Result<()>;

/// Metadata for a single registered instruction.
#[derive(Clone)]
pub struct InstructionMeta {
    /// Assigned opcode
    pub opcode: Opcode,
    /// Name used by the text format (e.g. "HCopy")
    pub name: String,
    /// Executor
    pub exec: ExecFn,
    /// Number of modifier arguments the instruction reads
    pub arg_count: usize,
    /// Human-readable description
    pub description: String,
}

impl fmt::Debug for InstructionMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstructionMeta")
            .field("opcode", &self.opcode)
            .field("name", &self.name)
            .field("arg_count", &self.arg_count)
            .field("description", &self.description)
            .finish()
    }
}

fn exec_nop(_cpu: &mut VirtualCpu, _inst: &Instruction) -> Result<()> {
    Ok(())
}

/// The instruction table.
pub struct InstructionTable {
    /// Registered instructions, indexed by opcode id.
    entries: Vec<InstructionMeta>,
    /// Name → opcode.
    name_map: HashMap<String, Opcode>,
    /// Cached nop ids (NopA, NopB, NopC).
    nop_ids: [Opcode; Opcode::NOP_COUNT],
    /// Cap on modifiers attached to one instruction when decoding.
    max_modifiers: usize,
}

impl InstructionTable {
    /// Largest number of opcodes a table can hold.
    pub const CAPACITY: usize = 256;

    /// Create a table holding only the three nops.
    pub fn new() -> Self {
        Self::with_max_modifiers(super::MAX_MODIFIERS)
    }

    /// Create a table with a custom modifier cap.
    pub fn with_max_modifiers(max_modifiers: usize) -> Self {
        let mut table = Self {
            entries: Vec::new(),
            name_map: HashMap::new(),
            nop_ids: [Opcode::NOP_A, Opcode::NOP_B, Opcode::NOP_C],
            max_modifiers,
        };
        let nops = [
            ("NopA", "No-operation A"),
            ("NopB", "No-operation B"),
            ("NopC", "No-operation C"),
        ];
        for (i, (name, desc)) in nops.into_iter().enumerate() {
            let opcode = Opcode(i as u8);
            table.name_map.insert(name.to_string(), opcode);
            table.entries.push(InstructionMeta {
                opcode,
                name: name.to_string(),
                exec: exec_nop,
                arg_count: 0,
                description: desc.to_string(),
            });
        }
        table
    }

    /// Table with the full standard instruction set.
    pub fn standard() -> Result<Self> {
        let mut table = Self::new();
        super::library::register_standard(&mut table)?;
        Ok(table)
    }

    /// Process-wide standard table, built on first use.
    ///
    /// # Panics
    /// If the standard library fails to register. That is a startup-time
    /// configuration error, not something a running organism can cause.
    pub fn shared() -> Arc<InstructionTable> {
        static SHARED: OnceLock<Arc<InstructionTable>> = OnceLock::new();
        SHARED
            .get_or_init(|| {
                let table = Self::standard().expect("standard instruction library is valid");
                log::debug!("Built standard instruction table ({} opcodes)", table.len());
                Arc::new(table)
            })
            .clone()
    }

    /// Register an instruction and return its opcode.
    ///
    /// # Errors
    /// `DuplicateInstruction` if the name is taken, `TableFull` once the
    /// opcode space is exhausted.
    pub fn register(
        &mut self,
        name: &str,
        exec: ExecFn,
        arg_count: usize,
        description: &str,
    ) -> Result<Opcode> {
        if self.name_map.contains_key(name) {
            return Err(CpuError::DuplicateInstruction(name.to_string()));
        }
        if self.entries.len() >= Self::CAPACITY {
            return Err(CpuError::TableFull(self.entries.len()));
        }

        let opcode = Opcode(self.entries.len() as u8);
        self.name_map.insert(name.to_string(), opcode);
        self.entries.push(InstructionMeta {
            opcode,
            name: name.to_string(),
            exec,
            arg_count,
            description: description.to_string(),
        });
        Ok(opcode)
    }

    /// Opcode for a name.
    pub fn lookup(&self, name: &str) -> Result<Opcode> {
        self.name_map
            .get(name)
            .copied()
            .ok_or_else(|| CpuError::UnknownInstruction(name.to_string()))
    }

    /// Opcode for a name, if registered.
    pub fn try_lookup(&self, name: &str) -> Option<Opcode> {
        self.name_map.get(name).copied()
    }

    /// Metadata (including executor) for an opcode.
    pub fn get(&self, opcode: Opcode) -> Result<&InstructionMeta> {
        self.entries
            .get(opcode.index())
            .ok_or(CpuError::UnknownOpcode(opcode))
    }

    /// Name of an opcode, or "?" if unregistered.
    pub fn name(&self, opcode: Opcode) -> &str {
        self.entries
            .get(opcode.index())
            .map(|m| m.name.as_str())
            .unwrap_or("?")
    }

    pub fn contains(&self, opcode: Opcode) -> bool {
        opcode.index() < self.entries.len()
    }

    /// Whether the opcode is one of the cached nops.
    pub fn is_nop(&self, opcode: Opcode) -> bool {
        self.nop_ids.contains(&opcode)
    }

    /// Cached nop ids (NopA, NopB, NopC).
    pub fn nop_ids(&self) -> [Opcode; Opcode::NOP_COUNT] {
        self.nop_ids
    }

    pub fn max_modifiers(&self) -> usize {
        self.max_modifiers
    }

    /// Decode an opcode stream into a genome, rejecting unknown opcodes.
    pub fn decode(&self, opcodes: &[Opcode]) -> Result<Genome> {
        if let Some(&bad) = opcodes.iter().find(|op| !self.contains(**op)) {
            return Err(CpuError::UnknownOpcode(bad));
        }
        Genome::decode(opcodes, self.max_modifiers)
    }

    /// Decode a sequence of instruction names into a genome.
    pub fn decode_names<S: AsRef<str>>(&self, names: &[S]) -> Result<Genome> {
        let opcodes = names
            .iter()
            .map(|n| self.lookup(n.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.decode(&opcodes)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InstructionMeta> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true: the nops are always present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InstructionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InstructionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstructionTable({} instructions, max {} modifiers)",
            self.entries.len(),
            self.max_modifiers,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec_test(_cpu: &mut VirtualCpu, _inst: &Instruction) -> Result<()> {
        Ok(())
    }

    #[test]
    fn test_nops_registered_first() {
        let table = InstructionTable::new();
        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup("NopA").unwrap(), Opcode::NOP_A);
        assert_eq!(table.lookup("NopB").unwrap(), Opcode::NOP_B);
        assert_eq!(table.lookup("NopC").unwrap(), Opcode::NOP_C);
        assert!(table.is_nop(Opcode::NOP_C));
    }

    #[test]
    fn test_register_and_lookup() {
        let mut table = InstructionTable::new();
        let op = table.register("Test", exec_test, 1, "Test instruction").unwrap();
        assert_eq!(op, Opcode(3));
        assert_eq!(table.lookup("Test").unwrap(), op);
        assert_eq!(table.name(op), "Test");
        assert_eq!(table.get(op).unwrap().arg_count, 1);
        assert!(!table.is_nop(op));
    }

    #[test]
    fn test_reject_duplicate_name() {
        let mut table = InstructionTable::new();
        table.register("Test", exec_test, 0, "").unwrap();
        let err = table.register("Test", exec_test, 0, "").unwrap_err();
        assert!(matches!(err, CpuError::DuplicateInstruction(name) if name == "Test"));
        assert!(table.register("NopA", exec_test, 0, "").is_err());
    }

    #[test]
    fn test_unknown_lookups() {
        let table = InstructionTable::new();
        assert!(matches!(table.lookup("Bogus"), Err(CpuError::UnknownInstruction(_))));
        assert!(matches!(table.get(Opcode(40)), Err(CpuError::UnknownOpcode(Opcode(40)))));
        assert_eq!(table.name(Opcode(40)), "?");
    }

    #[test]
    fn test_table_full() {
        let mut table = InstructionTable::new();
        for i in 3..InstructionTable::CAPACITY {
            table.register(&format!("Op{}", i), exec_test, 0, "").unwrap();
        }
        assert!(matches!(
            table.register("OneTooMany", exec_test, 0, ""),
            Err(CpuError::TableFull(256))
        ));
    }

    #[test]
    fn test_standard_table() {
        let table = InstructionTable::standard().unwrap();
        assert_eq!(table.len(), 25);
        assert_eq!(table.lookup("IfNEq").unwrap(), Opcode(3));
        assert_eq!(table.lookup("SetFlow").unwrap(), Opcode(24));
        assert!(table.iter().all(|m| !m.description.is_empty()));
    }

    #[test]
    fn test_shared_is_singleton() {
        let a = InstructionTable::shared();
        let b = InstructionTable::shared();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_decode_rejects_unknown_opcode() {
        let table = InstructionTable::new();
        assert!(matches!(
            table.decode(&[Opcode::NOP_A, Opcode(99)]),
            Err(CpuError::UnknownOpcode(Opcode(99)))
        ));
    }

    #[test]
    fn test_decode_names() {
        let table = InstructionTable::standard().unwrap();
        let genome = table.decode_names(&["Inc", "NopB", "IO"]).unwrap();
        assert_eq!(genome.len(), 3);
        assert_eq!(genome.instructions()[0].modifiers, vec![Opcode::NOP_B]);
    }
}
