//! tiny86-emu library
//!
//! Core emulation logic for a small 32-bit machine with a fixed-width
//! 4-byte instruction encoding, a 17-entry register file and a word-aligned
//! stack memory.

pub mod config;
pub mod device;
pub mod interpreter;
pub mod parser;

pub use config::Config;
pub use device::StreamConsole;
pub use interpreter::{
    CoreInterpreter, ExecError, ExecutionContext, FastExecutor, Instruction, MemoryPolicy, Opcode,
    Program, RunOutcome,
};
pub use parser::ProgramImage;
