//! Replication instructions: allocate, copy, search, divide
//!
//! ```text
//! Fresh ──HAlloc──► Allocated ──HCopy──► Copying ──(RH ≥ parent len)──► DivideReady
//!   ▲                                                                       │
//!   └──────────────────────────── HDivide (offspring handed off) ◄──────────┘
//! ```

use super::{ReplicationPhase, VirtualCpu};
use crate::error::Result;
use crate::vm::label::find_complement_label;
use crate::vm::Instruction;
use std::sync::Arc;

impl VirtualCpu {
    pub(crate) fn inst_h_alloc(&mut self, _inst: &Instruction) -> Result<()> {
        let old_len = self.working.len();
        let new_len = match old_len.checked_mul(2) {
            Some(n) if n <= self.config.max_working_len => n,
            _ => {
                log::debug!("HAlloc ignored: {} x 2 exceeds limit {}", old_len, self.config.max_working_len);
                return Ok(());
            }
        };

        self.working.resize(new_len, Instruction::filler());
        self.regs[0] = self.genome.len() as i32;
        if self.phase == ReplicationPhase::Fresh {
            self.phase = ReplicationPhase::Allocated;
        }
        self.normalize_heads();
        log::debug!("HAlloc: working buffer {} -> {}", old_len, new_len);
        Ok(())
    }

    pub(crate) fn inst_h_copy(&mut self, _inst: &Instruction) -> Result<()> {
        let mut copied = self.working[self.read_head].clone();
        let table = Arc::clone(&self.table);
        if let Some(opcode) = self.mutator.mutate(&copied, &table) {
            copied.opcode = opcode;
            if table.is_nop(opcode) {
                copied.modifiers.clear();
            }
        }

        self.copied_history.push(copied.opcode);
        self.working[self.write_head] = copied;
        self.read_head = self.wrap(self.read_head + 1);
        self.write_head = self.wrap(self.write_head + 1);
        self.phase = ReplicationPhase::Copying;
        Ok(())
    }

    pub(crate) fn inst_h_search(&mut self, inst: &Instruction) -> Result<()> {
        match find_complement_label(&self.working, &inst.modifiers, self.inst_ptr) {
            Some(offset) => {
                let label_len = inst.modifiers.len();
                self.regs[1] = offset as i32;
                self.regs[2] = label_len as i32;
                self.flow_head = self.wrap(self.inst_ptr + offset + label_len);
            }
            None => {
                self.regs[1] = 0;
                self.regs[2] = 0;
                self.flow_head = self.wrap(self.inst_ptr + 1);
            }
        }
        Ok(())
    }

    pub(crate) fn inst_h_divide(&mut self, _inst: &Instruction) -> Result<()> {
        let parent_len = self.genome.len();
        if self.read_head < parent_len {
            return Ok(());
        }

        let opcodes: Vec<_> = self.working[..self.read_head]
            .iter()
            .map(|i| i.opcode)
            .collect();
        let offspring = self.table.decode(&opcodes)?;
        log::debug!("HDivide: offspring of {} instructions after {} steps", offspring.len(), self.steps);

        self.reset_hardware();
        // Next advance wraps to 0
        self.inst_ptr = parent_len - 1;
        self.offspring = Some(offspring);
        self.divided = true;
        Ok(())
    }
}
