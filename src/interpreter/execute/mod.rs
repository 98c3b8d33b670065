//! Execution units.
//!
//! This module provides the execution logic for decoded instructions.
//! Each unit handles a specific category of operations:
//!
//! | Unit | Operations |
//! |------|------------|
//! | Scalar ALU | subl, addl, imull, shrl, register/immediate movl, cmpl |
//! | Memory | stack-relative movl, pushl, popl |
//! | Control | je, jl, jle, jge, jbe, jmp, call, ret |
//! | Console | printr, readr |
//!
//! # Example
//!
//! ```
//! use tiny86_emu::interpreter::execute::FastExecutor;
//! use tiny86_emu::interpreter::traits::{Console, ExecError, Executor};
//! use tiny86_emu::interpreter::{ExecutionContext, Instruction};
//!
//! struct Capture(Vec<i32>);
//!
//! impl Console for Capture {
//!     fn print_value(&mut self, value: i32) -> Result<(), ExecError> {
//!         self.0.push(value);
//!         Ok(())
//!     }
//!     fn read_value(&mut self) -> Result<Option<i32>, ExecError> {
//!         Ok(None)
//!     }
//! }
//!
//! let mut executor = FastExecutor::new();
//! let mut ctx = ExecutionContext::default();
//! let mut console = Capture(Vec::new());
//!
//! executor.execute(&Instruction::mov_imm(0, 5), &mut ctx, &mut console).unwrap();
//! executor.execute(&Instruction::print(0), &mut ctx, &mut console).unwrap();
//! assert_eq!(console.0, vec![5]);
//! ```

mod control;
mod fast_executor;
mod io;
mod memory;
mod scalar;

pub use control::ControlUnit;
pub use fast_executor::FastExecutor;
pub use io::ConsoleUnit;
pub use memory::MemoryUnit;
pub use scalar::ScalarAlu;
