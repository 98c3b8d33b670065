//! Fetch-decode-execute loop.
//!
//! The `CoreInterpreter` ties a decoded program to an executor. It owns the
//! program counter protocol and the halt conditions.
//!
//! # Execution Model
//!
//! 1. If PC equals the end-of-program address, halt
//! 2. Fetch the instruction at `program[PC / 4]`
//! 3. Execute it
//! 4. Handle result (advance PC by 4, branch, or halt on empty-stack `ret`)
//!
//! # Example
//!
//! ```no_run
//! use std::io;
//! use tiny86_emu::{CoreInterpreter, ExecutionContext, Instruction, Program, StreamConsole};
//!
//! let program: Program = [Instruction::mov_imm(0, 5), Instruction::print(0)]
//!     .into_iter()
//!     .collect();
//! let mut ctx = ExecutionContext::default();
//! let mut console = StreamConsole::new(io::stdin().lock(), io::stdout());
//!
//! let outcome = CoreInterpreter::default().run(&program, &mut ctx, &mut console).unwrap();
//! println!("{}", outcome);
//! ```

mod interpreter;

pub use interpreter::{CoreInterpreter, CoreStatus, RunOutcome, StepResult};
