//! Test harness for running tiny86 programs.
//!
//! This module provides utilities for building programs, feeding them
//! scripted input, running them to completion and inspecting the output and
//! final machine state.
//!
//! # Example
//!
//! ```
//! use tiny86_emu::interpreter::test_runner::TestRunner;
//! use tiny86_emu::interpreter::Instruction;
//!
//! let result = TestRunner::new()
//!     .with_input("41")
//!     .run_instructions(&[
//!         Instruction::read(0),
//!         Instruction::add_imm(0, 1),
//!         Instruction::print(0),
//!     ])
//!     .unwrap();
//!
//! assert_eq!(result.output, "42 (0x2a)\n");
//! assert_eq!(result.register(0), 42);
//! ```

use std::io::Cursor;

use anyhow::{Context, Result};

use crate::device::StreamConsole;
use crate::interpreter::core::{CoreInterpreter, RunOutcome};
use crate::interpreter::decode::{decode_program, Instruction, Program};
use crate::interpreter::state::{ExecutionContext, MemoryPolicy, DEFAULT_STACK_SIZE};

/// Result of a test run.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// How the program finished.
    pub outcome: RunOutcome,
    /// Everything the program printed.
    pub output: String,
    /// Final machine state.
    pub context: ExecutionContext,
}

impl TestResult {
    /// Final value of a register. Panics on an index outside the file.
    pub fn register(&self, reg: u8) -> i32 {
        self.context.registers.as_slice()[reg as usize]
    }

    /// Printed lines without their trailing newlines.
    pub fn output_lines(&self) -> Vec<&str> {
        self.output.lines().collect()
    }
}

/// Test runner for tiny86 programs.
///
/// Wraps a [`CoreInterpreter`] and an in-memory console.
#[derive(Debug, Clone)]
pub struct TestRunner {
    input: String,
    stack_size: usize,
    policy: MemoryPolicy,
    step_limit: Option<u64>,
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRunner {
    /// Create a runner with the reference machine configuration and a
    /// generous step limit, so runaway programs fail instead of hanging.
    pub fn new() -> Self {
        Self {
            input: String::new(),
            stack_size: DEFAULT_STACK_SIZE,
            policy: MemoryPolicy::Strict,
            step_limit: Some(1_000_000),
        }
    }

    /// Text served to the read opcode.
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }

    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }

    pub fn with_memory_policy(mut self, policy: MemoryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// `None` runs without a limit.
    pub fn with_step_limit(mut self, limit: Option<u64>) -> Self {
        self.step_limit = limit;
        self
    }

    /// Run a program built from instructions.
    pub fn run_instructions(&self, instructions: &[Instruction]) -> Result<TestResult> {
        let program: Program = instructions.iter().copied().collect();
        self.run_program(&program)
    }

    /// Decode and run a raw program image.
    pub fn run_bytes(&self, bytes: &[u8]) -> Result<TestResult> {
        let program = decode_program(bytes).context("Failed to decode program")?;
        self.run_program(&program)
    }

    /// Run a decoded program to completion.
    pub fn run_program(&self, program: &Program) -> Result<TestResult> {
        let mut ctx = ExecutionContext::new(self.stack_size, self.policy);
        let mut console = StreamConsole::new(Cursor::new(self.input.as_bytes()), Vec::new());
        let mut interpreter = CoreInterpreter::default().with_step_limit(self.step_limit);

        let outcome = interpreter
            .run(program, &mut ctx, &mut console)
            .with_context(|| format!("execution aborted at pc 0x{:04x}", ctx.pc()))?;

        let output = String::from_utf8(console.into_writer())
            .context("program output is not UTF-8")?;

        Ok(TestResult {
            outcome,
            output,
            context: ctx,
        })
    }
}
