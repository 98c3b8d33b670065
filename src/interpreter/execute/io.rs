//! Console unit: the print and read opcodes.

use crate::interpreter::decode::Instruction;
use crate::interpreter::state::ExecutionContext;
use crate::interpreter::traits::{Console, ExecError};

/// Console unit for register output and input.
pub struct ConsoleUnit;

impl ConsoleUnit {
    /// Emit `r1` to the console.
    pub fn print<C: Console>(
        instr: &Instruction,
        ctx: &ExecutionContext,
        console: &mut C,
    ) -> Result<(), ExecError> {
        let value = ctx.registers.read(instr.first_register)?;
        console.print_value(value)
    }

    /// Read one integer into `r1`.
    ///
    /// At end of input the register keeps its value.
    pub fn read<C: Console>(
        instr: &Instruction,
        ctx: &mut ExecutionContext,
        console: &mut C,
    ) -> Result<(), ExecError> {
        // Fault on a bad register before blocking for input
        ctx.registers.read(instr.first_register)?;

        match console.read_value()? {
            Some(value) => ctx.registers.write(instr.first_register, value),
            None => {
                log::warn!(
                    "readr r{} at 0x{:04X}: end of input, register unchanged",
                    instr.first_register,
                    ctx.pc()
                );
                Ok(())
            }
        }
    }
}
