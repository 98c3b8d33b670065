//! Modular tiny86 interpreter.
//!
//! This module provides the instruction decoder, machine state, execution
//! units and the fetch loop. It is designed for:
//!
//! - **Faithful semantics**: wrapping 32-bit arithmetic, compare flags in r16,
//!   stack-pointer-relative addressing and both halt paths
//! - **Hardened state**: register and stack accesses are bounds-checked and
//!   surface as [`ExecError`] instead of corrupting memory
//! - **Easy testing**: the [`Console`] trait lets tests script input and
//!   capture output without touching stdio
//!
//! # Architecture
//!
//! The interpreter is organized into several submodules:
//!
//! - [`decode`]: 4-byte instruction words to [`Instruction`]s
//! - [`execute`]: Execution units (scalar ALU, memory, control, console)
//! - [`state`]: Machine state (registers, stack memory, context)
//! - [`core`]: Fetch-decode-execute loop and halt protocol
//! - [`test_runner`]: Harness for running programs against scripted I/O
//!
//! # Example
//!
//! ```
//! use tiny86_emu::interpreter::{Instruction, RunOutcome, TestRunner};
//!
//! let result = TestRunner::new()
//!     .run_instructions(&[Instruction::mov_imm(0, 5), Instruction::print(0)])
//!     .unwrap();
//!
//! assert_eq!(result.outcome, RunOutcome::EndOfProgram);
//! assert_eq!(result.output, "5 (0x5)\n");
//! ```

pub mod traits;
pub mod decode;
pub mod state;
pub mod execute;
pub mod core;
pub mod test_runner;

// Re-export key types for convenience
pub use traits::{Console, DecodeError, ExecError, ExecuteResult, Executor, Flags};

// Decoder types
pub use decode::{decode_program, Instruction, Opcode, Program};

// State types
pub use state::{ExecutionContext, MemoryPolicy, RegisterFile, StackMemory};

// Execute types
pub use execute::{ConsoleUnit, ControlUnit, FastExecutor, MemoryUnit, ScalarAlu};

// Core types
pub use self::core::{CoreInterpreter, CoreStatus, RunOutcome, StepResult};

// Test harness
pub use test_runner::{TestResult, TestRunner};
