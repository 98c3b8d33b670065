//! Execution context.
//!
//! The `ExecutionContext` holds all machine state needed to execute
//! instructions: the register file, stack memory, program counter and
//! execution statistics. It is owned by a single run; nothing else reads or
//! mutates it while the program executes.

use super::registers::RegisterFile;
use super::stack::{MemoryPolicy, StackMemory, DEFAULT_STACK_SIZE};
use crate::interpreter::traits::{ExecError, Flags};

/// Bytes pushed or popped by one stack operation.
const WORD: i32 = 4;

/// Complete machine state for one run.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Architectural registers.
    pub registers: RegisterFile,
    /// Stack memory.
    pub stack: StackMemory,
    /// Program counter (byte address).
    pc: u32,
    /// Stack pointer value that means "call stack empty".
    initial_sp: i32,
    /// Instructions executed so far.
    pub instructions: u64,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(DEFAULT_STACK_SIZE, MemoryPolicy::Strict)
    }
}

impl ExecutionContext {
    /// Create a fresh context with `stack_size` bytes of stack.
    ///
    /// All registers start at zero except the stack pointer, which starts at
    /// the top of the stack. `stack_size` is expected to be a word multiple
    /// that fits in an `i32`; the configuration layer validates this.
    pub fn new(stack_size: usize, policy: MemoryPolicy) -> Self {
        let initial_sp = i32::try_from(stack_size).unwrap_or(i32::MAX);
        let mut registers = RegisterFile::new();
        registers.set_sp(initial_sp);

        Self {
            registers,
            stack: StackMemory::new(stack_size, policy),
            pc: 0,
            initial_sp,
            instructions: 0,
        }
    }

    #[inline]
    pub fn pc(&self) -> u32 {
        self.pc
    }

    #[inline]
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    /// Advance PC by `bytes`.
    #[inline]
    pub fn advance_pc(&mut self, bytes: u32) {
        self.pc = self.pc.wrapping_add(bytes);
    }

    #[inline]
    pub fn sp(&self) -> i32 {
        self.registers.sp()
    }

    /// Stack pointer value at reset.
    pub fn initial_sp(&self) -> i32 {
        self.initial_sp
    }

    /// True when the stack pointer is back at its reset value.
    pub fn stack_is_empty(&self) -> bool {
        self.registers.sp() == self.initial_sp
    }

    /// Current condition flags.
    pub fn flags(&self) -> Flags {
        Flags::from_bits(self.registers.flags())
    }

    pub fn set_flags(&mut self, flags: Flags) {
        self.registers.set_flags(flags.bits());
    }

    /// `SP -= 4; mem[SP] = value`
    pub fn push(&mut self, value: i32) -> Result<(), ExecError> {
        let sp = self.registers.sp().wrapping_sub(WORD);
        self.stack.store32(sp as i64, value)?;
        self.registers.set_sp(sp);
        Ok(())
    }

    /// `value = mem[SP]; SP += 4`
    pub fn pop(&mut self) -> Result<i32, ExecError> {
        let sp = self.registers.sp();
        let value = self.stack.load32(sp as i64)?;
        self.registers.set_sp(sp.wrapping_add(WORD));
        Ok(value)
    }

    /// Byte offset addressed by a stack-relative operand: `SP - slot * 4`.
    pub fn stack_slot(&self, slot: i32) -> i64 {
        self.registers.sp() as i64 - slot as i64 * WORD as i64
    }

    /// Record executed instructions.
    #[inline]
    pub fn record_instruction(&mut self, count: u64) {
        self.instructions += count;
    }
}
