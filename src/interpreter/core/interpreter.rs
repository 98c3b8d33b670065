//! Core interpreter implementation.
//!
//! The interpreter manages the fetch-decode-execute loop over a decoded
//! [`Program`].

use std::fmt;

use crate::interpreter::decode::{Instruction, Program};
use crate::interpreter::execute::FastExecutor;
use crate::interpreter::state::ExecutionContext;
use crate::interpreter::traits::{Console, ExecError, ExecuteResult, Executor};

/// How a program finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// PC reached the end-of-program address.
    EndOfProgram,
    /// `ret` executed with an empty call stack.
    EmptyStackReturn,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfProgram => write!(f, "reached end of program"),
            Self::EmptyStackReturn => write!(f, "returned with empty call stack"),
        }
    }
}

/// Core execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoreStatus {
    /// Core is ready to execute.
    #[default]
    Ready,
    /// Core has halted (normal termination).
    Halted(RunOutcome),
    /// Core aborted on an execution fault.
    Faulted,
}

/// Result of a single step execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// Continue executing next instruction.
    Continue,
    /// Program finished.
    Halted(RunOutcome),
    /// An earlier step faulted; nothing was executed.
    Faulted,
}

/// Fetch-decode-execute loop.
///
/// The program and machine state are passed to every step, so one
/// interpreter can be pointed at a fresh context after [`reset`](Self::reset).
///
/// # Default Configuration
///
/// The default configuration uses `FastExecutor`.
pub struct CoreInterpreter<E = FastExecutor>
where
    E: Executor,
{
    /// Execution unit.
    executor: E,
    /// Current core status.
    status: CoreStatus,
    /// Abort after this many instructions.
    step_limit: Option<u64>,
    /// Last executed instruction (for debugging).
    last_instruction: Option<Instruction>,
}

impl Default for CoreInterpreter<FastExecutor> {
    fn default() -> Self {
        Self::new(FastExecutor::new())
    }
}

impl<E> CoreInterpreter<E>
where
    E: Executor,
{
    /// Create a new interpreter with the given executor.
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            status: CoreStatus::Ready,
            step_limit: None,
            last_instruction: None,
        }
    }

    /// Abort with [`ExecError::StepLimitExceeded`] after `limit` instructions.
    pub fn with_step_limit(mut self, limit: Option<u64>) -> Self {
        self.step_limit = limit;
        self
    }

    /// Get the current core status.
    pub fn status(&self) -> CoreStatus {
        self.status
    }

    /// Check if the core is halted.
    pub fn is_halted(&self) -> bool {
        matches!(self.status, CoreStatus::Halted(_))
    }

    /// Get the executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Get the last executed instruction (for debugging).
    pub fn last_instruction(&self) -> Option<&Instruction> {
        self.last_instruction.as_ref()
    }

    /// Execute a single instruction.
    ///
    /// A fault is returned once; afterwards the core reports
    /// [`StepResult::Faulted`] until it is reset.
    pub fn step<C: Console>(
        &mut self,
        program: &Program,
        ctx: &mut ExecutionContext,
        console: &mut C,
    ) -> Result<StepResult, ExecError> {
        match self.status {
            CoreStatus::Halted(outcome) => return Ok(StepResult::Halted(outcome)),
            CoreStatus::Faulted => return Ok(StepResult::Faulted),
            CoreStatus::Ready => {}
        }

        let result = self.step_inner(program, ctx, console);
        match &result {
            Ok(StepResult::Halted(outcome)) => {
                log::debug!("halted at 0x{:04X}: {}", ctx.pc(), outcome);
                self.status = CoreStatus::Halted(*outcome);
            }
            Ok(_) => {}
            Err(e) => {
                log::debug!("fault at 0x{:04X}: {}", ctx.pc(), e);
                self.status = CoreStatus::Faulted;
            }
        }
        result
    }

    fn step_inner<C: Console>(
        &mut self,
        program: &Program,
        ctx: &mut ExecutionContext,
        console: &mut C,
    ) -> Result<StepResult, ExecError> {
        let pc = ctx.pc();
        let end = program.end_pc();

        // Falling off the end is a normal halt
        if pc == end {
            return Ok(StepResult::Halted(RunOutcome::EndOfProgram));
        }
        if pc % 4 != 0 {
            return Err(ExecError::MisalignedPc { pc });
        }
        let instr = program.fetch(pc).ok_or(ExecError::PcOutOfRange {
            pc: pc as i64,
            end,
        })?;

        if let Some(limit) = self.step_limit {
            if ctx.instructions >= limit {
                return Err(ExecError::StepLimitExceeded { limit });
            }
        }

        log::trace!("0x{:04X}: {:<20} {:?}", pc, instr.disassemble(), ctx.registers);

        let result = self.executor.execute(instr, ctx, console)?;
        self.last_instruction = Some(*instr);

        match result {
            ExecuteResult::Continue => {
                ctx.advance_pc(4);
                Ok(StepResult::Continue)
            }

            ExecuteResult::Branch { target } => {
                let target = u32::try_from(target)
                    .map_err(|_| ExecError::PcOutOfRange { pc: target, end })?;
                ctx.set_pc(target);
                Ok(StepResult::Continue)
            }

            ExecuteResult::Halt => Ok(StepResult::Halted(RunOutcome::EmptyStackReturn)),
        }
    }

    /// Run until the program halts or faults.
    pub fn run<C: Console>(
        &mut self,
        program: &Program,
        ctx: &mut ExecutionContext,
        console: &mut C,
    ) -> Result<RunOutcome, ExecError> {
        loop {
            match self.step(program, ctx, console)? {
                StepResult::Continue => continue,
                StepResult::Halted(outcome) => return Ok(outcome),
                StepResult::Faulted => return Err(ExecError::CoreFaulted { pc: ctx.pc() }),
            }
        }
    }

    /// Reset the interpreter state.
    pub fn reset(&mut self) {
        self.status = CoreStatus::Ready;
        self.last_instruction = None;
    }
}
