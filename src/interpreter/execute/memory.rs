//! Memory unit execution.
//!
//! Handles moves between registers and stack memory, plus push and pop.
//!
//! # Addressing
//!
//! There is no separate frame or base register. The effective offset of a
//! stack-relative move is `SP - imm * 4`, with SP used directly as a byte
//! index into the stack buffer.

use crate::interpreter::decode::Instruction;
use crate::interpreter::state::{ExecutionContext, SP_REG};
use crate::interpreter::traits::ExecError;

/// Bytes moved by push and pop.
const WORD: i32 = 4;

/// Memory unit for stack loads, stores, push and pop.
pub struct MemoryUnit;

impl MemoryUnit {
    /// `r2 = mem[SP - imm * 4]`
    pub fn load_from_stack(
        instr: &Instruction,
        ctx: &mut ExecutionContext,
    ) -> Result<(), ExecError> {
        let offset = ctx.stack_slot(instr.imm());
        let value = ctx.stack.load32(offset)?;
        ctx.registers.write(instr.second_register, value)
    }

    /// `mem[SP - imm * 4] = r1`
    pub fn store_to_stack(
        instr: &Instruction,
        ctx: &mut ExecutionContext,
    ) -> Result<(), ExecError> {
        let offset = ctx.stack_slot(instr.imm());
        let value = ctx.registers.read(instr.first_register)?;
        ctx.stack.store32(offset, value)
    }

    /// `SP -= 4; mem[SP] = r1`
    ///
    /// `pushl r6` stores the decremented stack pointer. SP only moves once
    /// the store has succeeded.
    pub fn push(instr: &Instruction, ctx: &mut ExecutionContext) -> Result<(), ExecError> {
        let sp = ctx.sp().wrapping_sub(WORD);
        let value = if instr.first_register == SP_REG {
            sp
        } else {
            ctx.registers.read(instr.first_register)?
        };
        ctx.stack.store32(sp as i64, value)?;
        ctx.registers.set_sp(sp);
        Ok(())
    }

    /// `r1 = mem[SP]; SP += 4`
    ///
    /// SP is incremented after the register write, so `popl r6` leaves the
    /// popped value plus four in SP.
    pub fn pop(instr: &Instruction, ctx: &mut ExecutionContext) -> Result<(), ExecError> {
        let value = ctx.stack.load32(ctx.sp() as i64)?;
        ctx.registers.write(instr.first_register, value)?;
        ctx.registers.set_sp(ctx.sp().wrapping_add(WORD));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::state::MemoryPolicy;

    #[test]
    fn test_store_then_load_slot() {
        let mut ctx = ExecutionContext::default();
        ctx.registers.set_sp(1000);
        ctx.registers.write(3, 1234).unwrap();

        MemoryUnit::store_to_stack(&Instruction::mov_reg_mem(3, 2), &mut ctx).unwrap();
        assert_eq!(ctx.stack.load32(992).unwrap(), 1234);

        MemoryUnit::load_from_stack(&Instruction::mov_mem_reg(2, 7), &mut ctx).unwrap();
        assert_eq!(ctx.registers.read(7).unwrap(), 1234);
    }

    #[test]
    fn test_negative_slot_addresses_above_sp() {
        let mut ctx = ExecutionContext::default();
        ctx.registers.set_sp(1016);
        ctx.stack.store32(1020, -9).unwrap();

        MemoryUnit::load_from_stack(&Instruction::mov_mem_reg(-1, 0), &mut ctx).unwrap();
        assert_eq!(ctx.registers.read(0).unwrap(), -9);
    }

    #[test]
    fn test_load_out_of_range_faults() {
        // SP at the top: slot 0 addresses bytes 1024..1028
        let mut ctx = ExecutionContext::default();
        let err =
            MemoryUnit::load_from_stack(&Instruction::mov_mem_reg(0, 0), &mut ctx).unwrap_err();
        assert!(matches!(err, ExecError::MemoryFault { offset: 1024, capacity: 1024 }));
    }

    #[test]
    fn test_lenient_load_reads_zero() {
        let mut ctx = ExecutionContext::new(1024, MemoryPolicy::Lenient);
        ctx.registers.write(0, 5).unwrap();
        MemoryUnit::load_from_stack(&Instruction::mov_mem_reg(0, 0), &mut ctx).unwrap();
        assert_eq!(ctx.registers.read(0).unwrap(), 0);
    }

    #[test]
    fn test_push_pop_roundtrip() {
        let mut ctx = ExecutionContext::default();
        ctx.registers.write(0, 7).unwrap();

        MemoryUnit::push(&Instruction::push(0), &mut ctx).unwrap();
        assert_eq!(ctx.sp(), 1020);
        assert_eq!(ctx.stack.load32(1020).unwrap(), 7);

        ctx.registers.write(0, 0).unwrap();
        MemoryUnit::pop(&Instruction::pop(0), &mut ctx).unwrap();
        assert_eq!(ctx.registers.read(0).unwrap(), 7);
        assert_eq!(ctx.sp(), 1024);
    }

    #[test]
    fn test_push_and_pop_stack_pointer() {
        let mut ctx = ExecutionContext::default();
        MemoryUnit::push(&Instruction::push(SP_REG), &mut ctx).unwrap();
        assert_eq!(ctx.stack.load32(1020).unwrap(), 1020);

        MemoryUnit::pop(&Instruction::pop(SP_REG), &mut ctx).unwrap();
        assert_eq!(ctx.sp(), 1024);
    }

    #[test]
    fn test_push_bad_register_leaves_sp() {
        let mut ctx = ExecutionContext::default();
        let err = MemoryUnit::push(&Instruction::push(20), &mut ctx).unwrap_err();
        assert!(matches!(err, ExecError::RegisterFault { index: 20 }));
        assert_eq!(ctx.sp(), 1024);
    }

    #[test]
    fn test_push_full_stack_leaves_sp() {
        let mut ctx = ExecutionContext::new(4, MemoryPolicy::Strict);
        MemoryUnit::push(&Instruction::push(SP_REG), &mut ctx).unwrap();
        assert_eq!(ctx.stack.load32(0).unwrap(), 0);

        let err = MemoryUnit::push(&Instruction::push(1), &mut ctx).unwrap_err();
        assert!(matches!(err, ExecError::MemoryFault { offset: -4, .. }));
        assert_eq!(ctx.sp(), 0);
    }

    #[test]
    fn test_pop_empty_stack_faults() {
        let mut ctx = ExecutionContext::default();
        let err = MemoryUnit::pop(&Instruction::pop(1), &mut ctx).unwrap_err();
        assert!(matches!(err, ExecError::MemoryFault { offset: 1024, .. }));
    }
}
