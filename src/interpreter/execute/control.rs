//! Control unit execution.
//!
//! Handles control flow:
//!
//! - **Branch**: je, jl, jle, jge, jbe and the unconditional jmp
//! - **Call/Return**: return addresses live on the stack
//!
//! Every taken transfer lands at `pc + imm + 4`, i.e. the offset is relative
//! to the following instruction. A `ret` with the stack pointer at its reset
//! value has nowhere to return to and ends the program instead.

use crate::interpreter::decode::{Instruction, Opcode};
use crate::interpreter::state::ExecutionContext;
use crate::interpreter::traits::{ExecError, ExecuteResult, Flags};

/// Control unit for branches, calls, and returns.
pub struct ControlUnit;

impl ControlUnit {
    /// Execute a conditional or unconditional branch.
    pub fn branch(instr: &Instruction, ctx: &ExecutionContext) -> ExecuteResult {
        let flags = ctx.flags();
        if Self::evaluate_condition(instr.opcode, flags) {
            let target = Self::get_branch_target(instr, ctx);
            log::debug!(
                "{} taken at 0x{:04X} -> {} ({:?})",
                instr.opcode.mnemonic(),
                ctx.pc(),
                target,
                flags
            );
            ExecuteResult::Branch { target }
        } else {
            log::debug!(
                "{} not taken at 0x{:04X} ({:?})",
                instr.opcode.mnemonic(),
                ctx.pc(),
                flags
            );
            ExecuteResult::Continue
        }
    }

    /// Push the return address and jump to the callee.
    pub fn call(
        instr: &Instruction,
        ctx: &mut ExecutionContext,
    ) -> Result<ExecuteResult, ExecError> {
        let return_addr = ctx.pc().wrapping_add(4);
        ctx.push(return_addr as i32)?;
        Ok(ExecuteResult::Branch {
            target: Self::get_branch_target(instr, ctx),
        })
    }

    /// Pop the return address, or halt when the call stack is empty.
    pub fn ret(ctx: &mut ExecutionContext) -> Result<ExecuteResult, ExecError> {
        if ctx.stack_is_empty() {
            log::debug!("ret at 0x{:04X} with empty stack, halting", ctx.pc());
            return Ok(ExecuteResult::Halt);
        }
        let target = ctx.pop()?;
        Ok(ExecuteResult::Branch {
            target: target as i64,
        })
    }

    /// Evaluate a branch condition against the flags.
    ///
    /// Non-branch opcodes never take the branch.
    pub fn evaluate_condition(opcode: Opcode, flags: Flags) -> bool {
        match opcode {
            Opcode::Jmp => true,
            Opcode::Je => flags.zero,
            Opcode::Jl => flags.less(),
            Opcode::Jle => flags.less() || flags.zero,
            Opcode::Jge => !flags.less(),
            Opcode::Jbe => flags.zero || flags.carry,
            _ => false,
        }
    }

    /// `pc + imm + 4`
    fn get_branch_target(instr: &Instruction, ctx: &ExecutionContext) -> i64 {
        ctx.pc() as i64 + instr.imm() as i64 + 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every combination of the four flag bits.
    fn all_flags() -> impl Iterator<Item = Flags> {
        (0u8..16).map(|bits| Flags {
            zero: bits & 1 != 0,
            sign: bits & 2 != 0,
            carry: bits & 4 != 0,
            overflow: bits & 8 != 0,
        })
    }

    #[test]
    fn test_branch_policy_all_flag_combinations() {
        for flags in all_flags() {
            let less = flags.sign != flags.overflow;
            assert_eq!(ControlUnit::evaluate_condition(Opcode::Je, flags), flags.zero);
            assert_eq!(ControlUnit::evaluate_condition(Opcode::Jl, flags), less);
            assert_eq!(ControlUnit::evaluate_condition(Opcode::Jle, flags), less || flags.zero);
            assert_eq!(ControlUnit::evaluate_condition(Opcode::Jge, flags), !less);
            assert_eq!(
                ControlUnit::evaluate_condition(Opcode::Jbe, flags),
                flags.zero || flags.carry
            );
            assert!(ControlUnit::evaluate_condition(Opcode::Jmp, flags));
        }
    }

    #[test]
    fn test_branch_reads_flags_register() {
        let mut ctx = ExecutionContext::default();
        ctx.set_pc(8);
        let je = Instruction::jump(Opcode::Je, 12);

        assert_eq!(ControlUnit::branch(&je, &ctx), ExecuteResult::Continue);

        ctx.registers.write(16, 0x40).unwrap();
        assert_eq!(ControlUnit::branch(&je, &ctx), ExecuteResult::Branch { target: 24 });
    }

    #[test]
    fn test_backward_branch() {
        let mut ctx = ExecutionContext::default();
        ctx.set_pc(16);
        let jmp = Instruction::jump(Opcode::Jmp, -12);
        assert_eq!(ControlUnit::branch(&jmp, &ctx), ExecuteResult::Branch { target: 8 });

        // Targets before the program are reported, not wrapped
        let jmp = Instruction::jump(Opcode::Jmp, -100);
        assert_eq!(ControlUnit::branch(&jmp, &ctx), ExecuteResult::Branch { target: -80 });
    }

    #[test]
    fn test_call_return_symmetry() {
        let mut ctx = ExecutionContext::default();
        ctx.push(55).unwrap();
        let sp_before = ctx.sp();

        // call at A = 0x20 with K = 0x10
        ctx.set_pc(0x20);
        let result = ControlUnit::call(&Instruction::jump(Opcode::Call, 0x10), &mut ctx).unwrap();
        assert_eq!(result, ExecuteResult::Branch { target: 0x34 });
        assert_eq!(ctx.sp(), sp_before - 4);
        assert_eq!(ctx.stack.load32(ctx.sp() as i64).unwrap(), 0x24);

        ctx.set_pc(0x34);
        let result = ControlUnit::ret(&mut ctx).unwrap();
        assert_eq!(result, ExecuteResult::Branch { target: 0x24 });
        assert_eq!(ctx.sp(), sp_before);
    }

    #[test]
    fn test_call_on_full_stack_faults() {
        let mut ctx = ExecutionContext::new(4, crate::interpreter::state::MemoryPolicy::Strict);
        ctx.push(55).unwrap();
        ctx.set_pc(0x10);

        let err = ControlUnit::call(&Instruction::jump(Opcode::Call, 0x20), &mut ctx).unwrap_err();
        assert!(matches!(err, ExecError::MemoryFault { offset: -4, .. }));
        assert_eq!(ctx.sp(), 0);
        assert_eq!(ctx.stack.load32(0).unwrap(), 55);
    }

    #[test]
    fn test_ret_on_empty_stack_halts() {
        let mut ctx = ExecutionContext::default();
        ctx.set_pc(0x40);
        assert_eq!(ControlUnit::ret(&mut ctx).unwrap(), ExecuteResult::Halt);
        assert_eq!(ctx.sp(), 1024);
    }

    #[test]
    fn test_ret_uses_initial_sp_of_context() {
        let mut ctx = ExecutionContext::new(64, crate::interpreter::state::MemoryPolicy::Strict);
        assert_eq!(ControlUnit::ret(&mut ctx).unwrap(), ExecuteResult::Halt);
    }
}
