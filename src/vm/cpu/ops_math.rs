//! Arithmetic, stack and IO instructions
//!
//! All register arithmetic wraps on overflow.

use super::VirtualCpu;
use crate::error::Result;
use crate::vm::{first_modifier_to_index, Instruction};

impl VirtualCpu {
    fn target_reg(inst: &Instruction) -> Result<usize> {
        first_modifier_to_index(&inst.modifiers, 1)
    }

    pub(crate) fn inst_inc(&mut self, inst: &Instruction) -> Result<()> {
        let idx = Self::target_reg(inst)?;
        self.regs[idx] = self.regs[idx].wrapping_add(1);
        Ok(())
    }

    pub(crate) fn inst_dec(&mut self, inst: &Instruction) -> Result<()> {
        let idx = Self::target_reg(inst)?;
        self.regs[idx] = self.regs[idx].wrapping_sub(1);
        Ok(())
    }

    pub(crate) fn inst_shift_right(&mut self, inst: &Instruction) -> Result<()> {
        let idx = Self::target_reg(inst)?;
        self.regs[idx] >>= 1;
        Ok(())
    }

    pub(crate) fn inst_shift_left(&mut self, inst: &Instruction) -> Result<()> {
        let idx = Self::target_reg(inst)?;
        self.regs[idx] = self.regs[idx].wrapping_shl(1);
        Ok(())
    }

    // Sources are always B and C; only the destination follows the modifier.

    pub(crate) fn inst_add(&mut self, inst: &Instruction) -> Result<()> {
        let idx = Self::target_reg(inst)?;
        self.regs[idx] = self.regs[1].wrapping_add(self.regs[2]);
        Ok(())
    }

    pub(crate) fn inst_sub(&mut self, inst: &Instruction) -> Result<()> {
        let idx = Self::target_reg(inst)?;
        self.regs[idx] = self.regs[1].wrapping_sub(self.regs[2]);
        Ok(())
    }

    pub(crate) fn inst_nand(&mut self, inst: &Instruction) -> Result<()> {
        let idx = Self::target_reg(inst)?;
        self.regs[idx] = !(self.regs[1] & self.regs[2]);
        Ok(())
    }

    pub(crate) fn inst_push(&mut self, inst: &Instruction) -> Result<()> {
        let idx = Self::target_reg(inst)?;
        self.stack_push(self.regs[idx]);
        Ok(())
    }

    pub(crate) fn inst_pop(&mut self, inst: &Instruction) -> Result<()> {
        let idx = Self::target_reg(inst)?;
        self.regs[idx] = self.stack_pop();
        Ok(())
    }

    pub(crate) fn inst_swap_stack(&mut self, _inst: &Instruction) -> Result<()> {
        self.stack_swap();
        Ok(())
    }

    pub(crate) fn inst_io(&mut self, inst: &Instruction) -> Result<()> {
        let idx = Self::target_reg(inst)?;
        self.output_history.push(self.regs[idx]);
        if let Some(input) = self.input_queue.pop_front() {
            self.regs[idx] = input;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{cpu, run_steps};
    use crate::vm::{CpuConfig, InstructionTable, VirtualCpu};

    #[test]
    fn test_inc_dec_default_register() {
        let mut cpu = cpu(&["Inc", "Inc", "Dec"]);
        run_steps(&mut cpu, 2);
        assert_eq!(cpu.registers(), &[0, 2, 0]);
        run_steps(&mut cpu, 1);
        assert_eq!(cpu.registers(), &[0, 1, 0]);
    }

    #[test]
    fn test_modifier_redirects_register() {
        let mut cpu = cpu(&["Inc", "NopA", "Dec", "NopC"]);
        run_steps(&mut cpu, 4);
        assert_eq!(cpu.registers(), &[1, 0, -1]);
    }

    #[test]
    fn test_inc_dec_roundtrip_at_boundaries() {
        for value in [0, 1, -1, 42, i32::MAX, i32::MIN, i32::MAX - 1, i32::MIN + 1] {
            let mut forward = cpu(&["Inc", "Dec"]);
            forward.set_register(1, value);
            run_steps(&mut forward, 2);
            assert_eq!(forward.register(1), value);

            let mut backward = cpu(&["Dec", "Inc"]);
            backward.set_register(1, value);
            run_steps(&mut backward, 2);
            assert_eq!(backward.register(1), value);
        }
    }

    #[test]
    fn test_overflow_wraps() {
        let mut cpu = cpu(&["Inc", "ShiftL", "NopC"]);
        cpu.set_register(1, i32::MAX);
        cpu.set_register(2, i32::MIN);
        run_steps(&mut cpu, 2);
        assert_eq!(cpu.register(1), i32::MIN);
        assert_eq!(cpu.register(2), 0);
    }

    #[test]
    fn test_two_source_ops_always_read_b_and_c() {
        let mut cpu = cpu(&["Add", "NopA", "Sub", "Nand", "NopC"]);
        cpu.set_register(0, 100);
        cpu.set_register(1, 6);
        cpu.set_register(2, 4);

        run_steps(&mut cpu, 2); // Add a, NopA
        assert_eq!(cpu.registers(), &[10, 6, 4]);

        run_steps(&mut cpu, 1); // Sub → B
        assert_eq!(cpu.registers(), &[10, 2, 4]);

        run_steps(&mut cpu, 1); // Nand c
        assert_eq!(cpu.register(2), !(2 & 4));
        assert_eq!(cpu.register(0), 10);
    }

    #[test]
    fn test_add_overflow_wraps() {
        let mut cpu = cpu(&["Add", "Sub"]);
        cpu.set_register(1, i32::MAX);
        cpu.set_register(2, 1);
        run_steps(&mut cpu, 1);
        assert_eq!(cpu.register(1), i32::MIN);
        run_steps(&mut cpu, 1);
        assert_eq!(cpu.register(1), i32::MAX);
    }

    #[test]
    fn test_shift_right_is_arithmetic() {
        let mut cpu = cpu(&["ShiftR", "ShiftR"]);
        cpu.set_register(1, -7);
        run_steps(&mut cpu, 1);
        assert_eq!(cpu.register(1), -4);
        run_steps(&mut cpu, 1);
        assert_eq!(cpu.register(1), -2);
    }

    #[test]
    fn test_push_pop_and_swap() {
        let mut cpu = cpu(&["Push", "Swap-Stk", "Pop", "NopA", "Swap-Stk", "Pop", "NopC"]);
        cpu.set_register(0, 9);
        cpu.set_register(1, 7);

        run_steps(&mut cpu, 2);
        assert_eq!(cpu.stack(0), vec![7]);
        assert_eq!(cpu.active_stack(), 1);

        // Other stack is empty: pop yields 0
        run_steps(&mut cpu, 2);
        assert_eq!(cpu.register(0), 0);

        run_steps(&mut cpu, 3);
        assert_eq!(cpu.active_stack(), 0);
        assert_eq!(cpu.register(2), 7);
        assert!(cpu.stack(0).is_empty());
    }

    #[test]
    fn test_stack_depth_drops_oldest() {
        let table = InstructionTable::shared();
        let genome = table.decode_names(&["Push", "Inc"]).unwrap();
        let mut cpu = VirtualCpu::with_config(genome, table, CpuConfig::default().with_stack_depth(3));

        run_steps(&mut cpu, 10); // pushes 0, 1, 2, 3, 4
        assert_eq!(cpu.stack(0), vec![2, 3, 4]);
    }

    #[test]
    fn test_io_outputs_then_reads_input() {
        let mut cpu = cpu(&["IO", "IO", "NopC", "IO"]);
        cpu.set_register(1, 3);
        cpu.set_register(2, 8);
        cpu.push_input(50);

        run_steps(&mut cpu, 1);
        assert_eq!(cpu.output_history(), &[3]);
        assert_eq!(cpu.register(1), 50);

        run_steps(&mut cpu, 3); // IO c, NopC, IO
        assert_eq!(cpu.output_history(), &[3, 8, 50]);
        // No input left: register unchanged
        assert_eq!(cpu.register(2), 8);
        assert_eq!(cpu.register(1), 50);
    }
}
