//! Fast executor implementation.
//!
//! The `FastExecutor` applies one instruction per call with no pipeline or
//! timing model. Dispatch is a single exhaustive match on the opcode, so
//! every defined operation is routed to exactly one execution unit.
//!
//! # Execution Model
//!
//! 1. Register operands are read before the destination is written
//! 2. A fault aborts the instruction; the program counter is not advanced
//! 3. Control flow changes are reported back to the fetch loop, which owns PC
//! 4. Undefined opcodes are no-ops

use crate::interpreter::decode::{Instruction, Opcode};
use crate::interpreter::state::ExecutionContext;
use crate::interpreter::traits::{Console, ExecError, ExecuteResult, Executor};

use super::control::ControlUnit;
use super::io::ConsoleUnit;
use super::memory::MemoryUnit;
use super::scalar::ScalarAlu;

/// Fast executor that applies each instruction immediately.
///
/// It is suitable for:
/// - Running programs from the CLI
/// - Functional tests
/// - Debug stepping
#[derive(Debug, Default)]
pub struct FastExecutor {
    /// Undefined opcodes skipped so far.
    unknown_skipped: u64,
}

impl FastExecutor {
    /// Create a new fast executor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of undefined opcodes executed as no-ops.
    pub fn unknown_skipped(&self) -> u64 {
        self.unknown_skipped
    }
}

impl Executor for FastExecutor {
    fn execute<C: Console>(
        &mut self,
        instr: &Instruction,
        ctx: &mut ExecutionContext,
        console: &mut C,
    ) -> Result<ExecuteResult, ExecError> {
        let result = match instr.opcode {
            Opcode::SubImm => ScalarAlu::sub_imm(instr, ctx).map(|_| ExecuteResult::Continue),
            Opcode::AddRegReg => {
                ScalarAlu::add_reg_reg(instr, ctx).map(|_| ExecuteResult::Continue)
            }
            Opcode::AddImm => ScalarAlu::add_imm(instr, ctx).map(|_| ExecuteResult::Continue),
            Opcode::MulRegReg => {
                ScalarAlu::mul_reg_reg(instr, ctx).map(|_| ExecuteResult::Continue)
            }
            Opcode::ShrOne => ScalarAlu::shr_one(instr, ctx).map(|_| ExecuteResult::Continue),
            Opcode::MovRegReg => {
                ScalarAlu::mov_reg_reg(instr, ctx).map(|_| ExecuteResult::Continue)
            }
            Opcode::MovImmReg => ScalarAlu::mov_imm(instr, ctx).map(|_| ExecuteResult::Continue),
            Opcode::Cmp => ScalarAlu::compare(instr, ctx).map(|_| ExecuteResult::Continue),

            Opcode::MovMemReg => {
                MemoryUnit::load_from_stack(instr, ctx).map(|_| ExecuteResult::Continue)
            }
            Opcode::MovRegMem => {
                MemoryUnit::store_to_stack(instr, ctx).map(|_| ExecuteResult::Continue)
            }
            Opcode::Push => MemoryUnit::push(instr, ctx).map(|_| ExecuteResult::Continue),
            Opcode::Pop => MemoryUnit::pop(instr, ctx).map(|_| ExecuteResult::Continue),

            Opcode::Je | Opcode::Jl | Opcode::Jle | Opcode::Jge | Opcode::Jbe | Opcode::Jmp => {
                Ok(ControlUnit::branch(instr, ctx))
            }
            Opcode::Call => ControlUnit::call(instr, ctx),
            Opcode::Ret => ControlUnit::ret(ctx),

            Opcode::Print => {
                ConsoleUnit::print(instr, ctx, console).map(|_| ExecuteResult::Continue)
            }
            Opcode::Read => ConsoleUnit::read(instr, ctx, console).map(|_| ExecuteResult::Continue),

            // Undefined encodings are skipped, not rejected
            Opcode::Unknown(code) => {
                log::debug!("undefined opcode {} at 0x{:04X}, skipping", code, ctx.pc());
                self.unknown_skipped += 1;
                Ok(ExecuteResult::Continue)
            }
        }?;

        // Update statistics
        ctx.record_instruction(1);

        Ok(result)
    }
}
