//! Branch, head and label instructions

use super::{complement_index, VirtualCpu};
use crate::error::Result;
use crate::vm::label::tail_matches_complement;
use crate::vm::{first_modifier_to_head, first_modifier_to_index, Head, Instruction};

impl VirtualCpu {
    /// Shared branch rule: skip the next instruction unless `cond` holds for
    /// the focal register and its complement, and always step over the
    /// modifier if one was consumed.
    fn branch(&mut self, inst: &Instruction, cond: fn(i32, i32) -> bool) -> Result<()> {
        let idx_1 = first_modifier_to_index(&inst.modifiers, 1)?;
        let idx_2 = complement_index(idx_1);
        if !cond(self.regs[idx_1], self.regs[idx_2]) {
            self.advance_ip(1);
        }
        if inst.has_modifiers() {
            self.advance_ip(1);
        }
        Ok(())
    }

    pub(crate) fn inst_if_not_equal(&mut self, inst: &Instruction) -> Result<()> {
        self.branch(inst, |a, b| a != b)
    }

    pub(crate) fn inst_if_less(&mut self, inst: &Instruction) -> Result<()> {
        self.branch(inst, |a, b| a < b)
    }

    pub(crate) fn inst_mov_head(&mut self, inst: &Instruction) -> Result<()> {
        let head = first_modifier_to_head(&inst.modifiers, Head::Inst)?;
        match head {
            // Land on FH after the step's own advance
            Head::Inst => {
                self.inst_ptr = self.wrap(self.flow_head + self.working.len() - 1);
            }
            other => self.set_head(other, self.flow_head),
        }
        Ok(())
    }

    pub(crate) fn inst_jmp_head(&mut self, inst: &Instruction) -> Result<()> {
        let head = first_modifier_to_head(&inst.modifiers, Head::Inst)?;
        let pos = self.wrap_signed(self.head(head) as i64 + self.regs[2] as i64);
        self.set_head(head, pos);
        Ok(())
    }

    pub(crate) fn inst_get_head(&mut self, inst: &Instruction) -> Result<()> {
        let head = first_modifier_to_head(&inst.modifiers, Head::Inst)?;
        self.regs[2] = self.head(head) as i32;
        Ok(())
    }

    pub(crate) fn inst_set_flow(&mut self, inst: &Instruction) -> Result<()> {
        let idx = first_modifier_to_index(&inst.modifiers, 2)?;
        self.flow_head = self.wrap_signed(self.regs[idx] as i64);
        Ok(())
    }

    pub(crate) fn inst_if_label(&mut self, inst: &Instruction) -> Result<()> {
        self.advance_ip(inst.modifiers.len());
        if !tail_matches_complement(&self.copied_history, &inst.modifiers) {
            self.advance_ip(1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{cpu, run_steps};
    use crate::vm::Head;

    #[test]
    fn test_if_not_equal_skips_when_equal() {
        let mut cpu = cpu(&["IfNEq", "Inc", "Dec"]);
        cpu.set_register(1, 5);
        cpu.set_register(2, 5);

        run_steps(&mut cpu, 1);
        assert_eq!(cpu.head(Head::Inst), 2);
        run_steps(&mut cpu, 1);
        // Only Dec ran
        assert_eq!(cpu.registers(), &[0, 4, 5]);
    }

    #[test]
    fn test_if_not_equal_executes_when_different() {
        let mut cpu = cpu(&["IfNEq", "Inc", "Dec"]);
        cpu.set_register(1, 5);
        cpu.set_register(2, 6);

        run_steps(&mut cpu, 1);
        assert_eq!(cpu.head(Head::Inst), 1);
        run_steps(&mut cpu, 1);
        assert_eq!(cpu.register(1), 6);
    }

    #[test]
    fn test_branch_modifier_is_skipped_too() {
        // Equal: skip the modifier and Inc
        let mut skipped = cpu(&["IfNEq", "NopB", "Inc", "Dec"]);
        skipped.set_register(1, 5);
        skipped.set_register(2, 5);
        run_steps(&mut skipped, 1);
        assert_eq!(skipped.head(Head::Inst), 3);

        // Different: skip only the modifier
        let mut taken = cpu(&["IfNEq", "NopB", "Inc", "Dec"]);
        taken.set_register(1, 5);
        taken.set_register(2, 6);
        run_steps(&mut taken, 1);
        assert_eq!(taken.head(Head::Inst), 2);
    }

    #[test]
    fn test_branch_modifier_selects_registers() {
        // IfNEq a compares A with B
        let mut cpu = cpu(&["IfNEq", "NopA", "Inc", "Dec"]);
        cpu.set_register(0, 1);
        cpu.set_register(1, 1);
        cpu.set_register(2, 9);
        run_steps(&mut cpu, 1);
        assert_eq!(cpu.head(Head::Inst), 3);
    }

    #[test]
    fn test_if_less() {
        let mut less = cpu(&["IfLess", "Inc", "Dec"]);
        less.set_register(1, 2);
        less.set_register(2, 3);
        run_steps(&mut less, 1);
        assert_eq!(less.head(Head::Inst), 1);

        let mut equal = cpu(&["IfLess", "Inc", "Dec"]);
        equal.set_register(1, 3);
        equal.set_register(2, 3);
        run_steps(&mut equal, 1);
        assert_eq!(equal.head(Head::Inst), 2);

        // IfLess c compares C with A
        let mut redirected = cpu(&["IfLess", "NopC", "Inc", "Dec"]);
        redirected.set_register(2, -1);
        run_steps(&mut redirected, 1);
        assert_eq!(redirected.head(Head::Inst), 2);
    }

    #[test]
    fn test_get_head() {
        let mut cpu = cpu(&["GetHead", "GetHead", "NopB", "NopA"]);
        run_steps(&mut cpu, 1);
        assert_eq!(cpu.register(2), 0);

        cpu.set_head(Head::Read, 3);
        run_steps(&mut cpu, 1);
        assert_eq!(cpu.register(2), 3);
    }

    #[test]
    fn test_set_flow_wraps_register_value() {
        let mut cpu = cpu(&["SetFlow", "SetFlow", "NopA", "Inc", "Dec"]);
        cpu.set_register(2, 7);
        cpu.set_register(0, -1);

        run_steps(&mut cpu, 1);
        assert_eq!(cpu.head(Head::Flow), 2);

        run_steps(&mut cpu, 1);
        assert_eq!(cpu.head(Head::Flow), 4);
    }

    #[test]
    fn test_mov_head_moves_ip_to_flow() {
        let mut cpu = cpu(&["MovHead", "Inc", "Inc", "Dec"]);
        cpu.set_head(Head::Flow, 3);
        run_steps(&mut cpu, 1);
        assert_eq!(cpu.head(Head::Inst), 3);
        run_steps(&mut cpu, 1);
        assert_eq!(cpu.register(1), -1);
    }

    #[test]
    fn test_mov_head_to_flow_at_zero_wraps() {
        let mut cpu = cpu(&["Inc", "MovHead", "Dec"]);
        run_steps(&mut cpu, 2);
        assert_eq!(cpu.head(Head::Inst), 0);
    }

    #[test]
    fn test_mov_head_moves_read_and_write() {
        let mut cpu = cpu(&["MovHead", "NopB", "MovHead", "NopC", "Inc"]);
        cpu.set_head(Head::Flow, 4);
        run_steps(&mut cpu, 4);
        assert_eq!(cpu.head(Head::Read), 4);
        assert_eq!(cpu.head(Head::Write), 4);
        assert_eq!(cpu.head(Head::Inst), 4);
    }

    #[test]
    fn test_jmp_head_wraps_both_ways() {
        let mut cpu = cpu(&["JmpHead", "NopC", "JmpHead", "NopB", "Inc"]);
        cpu.set_register(2, 7);
        run_steps(&mut cpu, 1);
        // WH: 0 + 7 mod 5
        assert_eq!(cpu.head(Head::Write), 2);

        cpu.set_register(2, -3);
        run_steps(&mut cpu, 2);
        // RH: 0 - 3 mod 5
        assert_eq!(cpu.head(Head::Read), 2);
    }

    #[test]
    fn test_jmp_head_moves_ip() {
        let mut cpu = cpu(&["JmpHead", "Inc", "Inc", "Dec"]);
        cpu.set_register(2, 2);
        run_steps(&mut cpu, 1);
        // 0 + 2, then the step's advance
        assert_eq!(cpu.head(Head::Inst), 3);
    }

    #[test]
    fn test_if_label_without_copy_skips() {
        let mut cpu = cpu(&["IfLabel", "NopA", "Inc", "Dec"]);
        run_steps(&mut cpu, 1);
        // Past the label and past Inc
        assert_eq!(cpu.head(Head::Inst), 3);
    }

    #[test]
    fn test_if_label_after_matching_copy_executes() {
        // Copy NopB (complement of the label `a`) then test for it
        let mut cpu = cpu(&["NopB", "HCopy", "IfLabel", "NopA", "Inc", "Dec"]);
        cpu.set_head(Head::Write, 5);
        run_steps(&mut cpu, 3);
        assert_eq!(cpu.copied_history().len(), 1);
        assert_eq!(cpu.head(Head::Inst), 4);
        run_steps(&mut cpu, 1);
        assert_eq!(cpu.register(1), 1);
    }
}
