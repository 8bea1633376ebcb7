//! Standard instruction library
//!
//! | Id | Name     | Default | Effect                                          |
//! |----|----------|---------|-------------------------------------------------|
//! | 0  | NopA     |         | none; modifier `a`                              |
//! | 1  | NopB     |         | none; modifier `b`                              |
//! | 2  | NopC     |         | none; modifier `c`                              |
//! | 3  | IfNEq    | r1      | skip next unless r[x] != r[x+1]                 |
//! | 4  | IfLess   | r1      | skip next unless r[x] < r[x+1]                  |
//! | 5  | Inc      | r1      | r[x] += 1                                       |
//! | 6  | Dec      | r1      | r[x] -= 1                                       |
//! | 7  | Pop      | r1      | r[x] = pop                                      |
//! | 8  | Push     | r1      | push r[x]                                       |
//! | 9  | Swap-Stk |         | toggle active stack                             |
//! | 10 | ShiftR   | r1      | r[x] >>= 1                                      |
//! | 11 | ShiftL   | r1      | r[x] <<= 1                                      |
//! | 12 | Add      | r1      | r[x] = r1 + r2                                  |
//! | 13 | Sub      | r1      | r[x] = r1 - r2                                  |
//! | 14 | Nand     | r1      | r[x] = !(r1 & r2)                               |
//! | 15 | IO       | r1      | output r[x], then load next input into r[x]     |
//! | 16 | HAlloc   |         | double working buffer; r0 = genome length       |
//! | 17 | HDivide  |         | split off offspring if read head is past parent |
//! | 18 | HCopy    |         | working[WH] = working[RH]; advance both         |
//! | 19 | HSearch  | label   | find complement label; set r1, r2, FH           |
//! | 20 | MovHead  | IP      | head = FH                                       |
//! | 21 | JmpHead  | IP      | head += r2                                      |
//! | 22 | GetHead  | IP      | r2 = head                                       |
//! | 23 | IfLabel  | label   | skip next unless label was just copied          |
//! | 24 | SetFlow  | r2      | FH = r[x]                                       |

use super::{InstructionTable, VirtualCpu};
use crate::error::Result;

/// Register the standard instruction set (after the nops) in fixed order.
pub fn register_standard(table: &mut InstructionTable) -> Result<()> {
    table.register("IfNEq", VirtualCpu::inst_if_not_equal, 1,
        "Skip next inst unless register values differ")?;
    table.register("IfLess", VirtualCpu::inst_if_less, 1,
        "Skip next inst unless focal register is less than its complement")?;
    table.register("Inc", VirtualCpu::inst_inc, 1, "Increment value in register")?;
    table.register("Dec", VirtualCpu::inst_dec, 1, "Decrement value in register")?;
    table.register("Pop", VirtualCpu::inst_pop, 1, "Pop value from active stack into register")?;
    table.register("Push", VirtualCpu::inst_push, 1, "Push register's value onto active stack")?;
    table.register("Swap-Stk", VirtualCpu::inst_swap_stack, 0, "Swap which stack is active")?;
    table.register("ShiftR", VirtualCpu::inst_shift_right, 1,
        "Shift register value right by one bit")?;
    table.register("ShiftL", VirtualCpu::inst_shift_left, 1,
        "Shift register value left by one bit")?;
    table.register("Add", VirtualCpu::inst_add, 1,
        "Add registers B and C, store result in given register")?;
    table.register("Sub", VirtualCpu::inst_sub, 1,
        "Subtract register C from B, store result in given register")?;
    table.register("Nand", VirtualCpu::inst_nand, 1,
        "NAND registers B and C, store result in given register")?;
    table.register("IO", VirtualCpu::inst_io, 1,
        "Output value in given register, then place next input in that register")?;
    table.register("HAlloc", VirtualCpu::inst_h_alloc, 0, "Allocate memory for offspring")?;
    table.register("HDivide", VirtualCpu::inst_h_divide, 0, "Attempt to split off offspring")?;
    table.register("HCopy", VirtualCpu::inst_h_copy, 0,
        "Copy instruction from read head to write head")?;
    table.register("HSearch", VirtualCpu::inst_h_search, 3, "Search for label complement")?;
    table.register("MovHead", VirtualCpu::inst_mov_head, 1, "Move a given head to the flow head")?;
    table.register("JmpHead", VirtualCpu::inst_jmp_head, 1,
        "Move a given head by a relative amount")?;
    table.register("GetHead", VirtualCpu::inst_get_head, 1, "Get location of a given head")?;
    table.register("IfLabel", VirtualCpu::inst_if_label, 3,
        "Execute next inst only if label complement was the last thing copied")?;
    table.register("SetFlow", VirtualCpu::inst_set_flow, 1, "Set flow head to register value")?;
    Ok(())
}
