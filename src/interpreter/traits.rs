//! Core traits for the interpreter.
//!
//! These traits define the abstraction boundaries between the fetch loop and
//! the parts it drives:
//!
//! - `Executor`: applies one decoded instruction to the execution context
//! - `Console`: the byte streams behind the print and read opcodes
//!
//! The error types shared by decoding and execution live here as well.

use std::io;

use thiserror::Error;

use super::decode::Instruction;
use super::state::ExecutionContext;

/// Carry flag bit in the flags register (unsigned borrow).
pub const CARRY_BIT: i32 = 0x0001;
/// Zero flag bit in the flags register.
pub const ZERO_BIT: i32 = 0x0040;
/// Sign flag bit in the flags register.
pub const SIGN_BIT: i32 = 0x0080;
/// Overflow flag bit in the flags register (signed overflow).
pub const OVERFLOW_BIT: i32 = 0x0800;

/// Condition flags held in the flags register.
///
/// Only the compare instruction writes them; only conditional branches read
/// them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// Zero flag: the difference was zero.
    pub zero: bool,
    /// Sign flag: bit 31 of the difference was set.
    pub sign: bool,
    /// Carry flag: unsigned borrow occurred.
    pub carry: bool,
    /// Overflow flag: the signed difference does not fit in 32 bits.
    pub overflow: bool,
}

impl Flags {
    /// Flags produced by comparing `second` against `first` (`second - first`).
    pub fn from_compare(first: i32, second: i32) -> Self {
        let unsigned = (second as u32).wrapping_sub(first as u32);
        let signed = second as i64 - first as i64;

        Self {
            zero: unsigned == 0,
            sign: (unsigned >> 31) & 1 != 0,
            carry: (second as u32) < (first as u32),
            overflow: signed < i32::MIN as i64 || signed > i32::MAX as i64,
        }
    }

    /// Unpack flags from a raw flags register value.
    ///
    /// Bits other than the four flag bits are ignored.
    pub fn from_bits(bits: i32) -> Self {
        Self {
            zero: bits & ZERO_BIT != 0,
            sign: bits & SIGN_BIT != 0,
            carry: bits & CARRY_BIT != 0,
            overflow: bits & OVERFLOW_BIT != 0,
        }
    }

    /// Pack flags into a flags register value. All other bits are clear.
    pub fn bits(self) -> i32 {
        let mut bits = 0;
        if self.carry {
            bits |= CARRY_BIT;
        }
        if self.zero {
            bits |= ZERO_BIT;
        }
        if self.sign {
            bits |= SIGN_BIT;
        }
        if self.overflow {
            bits |= OVERFLOW_BIT;
        }
        bits
    }

    /// Signed "less than": sign differs from overflow.
    #[inline]
    pub fn less(self) -> bool {
        self.sign != self.overflow
    }
}

/// Result of executing a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteResult {
    /// Continue with the next instruction (PC + 4).
    Continue,

    /// Transfer control to `target`.
    ///
    /// Targets are computed in 64 bits; the fetch loop rejects any that fall
    /// outside the program.
    Branch {
        /// Next program counter.
        target: i64,
    },

    /// Return with an empty call stack: the program is finished.
    Halt,
}

/// Errors that can occur during program decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Byte stream is not a whole number of 4-byte words.
    #[error("invalid encoding: {len} bytes is not a multiple of 4")]
    InvalidEncoding {
        /// Length of the rejected byte stream.
        len: usize,
    },
}

/// Errors that abort execution.
#[derive(Debug, Error)]
pub enum ExecError {
    /// An instruction named a register outside the architectural file.
    #[error("register fault: r{index} does not exist")]
    RegisterFault {
        /// The offending register index.
        index: u8,
    },

    /// A 4-byte stack access fell outside the stack buffer.
    #[error("memory fault: 4-byte access at offset {offset} outside {capacity}-byte stack")]
    MemoryFault {
        /// Byte offset of the access.
        offset: i64,
        /// Stack capacity in bytes.
        capacity: usize,
    },

    /// Control transferred outside the program.
    #[error("program counter {pc} outside program (end 0x{end:X})")]
    PcOutOfRange {
        /// Offending program counter.
        pc: i64,
        /// End-of-program address.
        end: u32,
    },

    /// Control transferred to an address that is not word aligned.
    #[error("program counter 0x{pc:X} is not a multiple of 4")]
    MisalignedPc {
        /// Offending program counter.
        pc: u32,
    },

    /// The read opcode received a token that is not a decimal integer.
    #[error("invalid input {token:?}: expected a decimal integer")]
    InvalidInput {
        /// The rejected token.
        token: String,
    },

    /// The configured instruction budget ran out.
    #[error("step limit of {limit} instructions exceeded")]
    StepLimitExceeded {
        /// The configured limit.
        limit: u64,
    },

    /// Run was called on a core that already faulted.
    #[error("core faulted at 0x{pc:X}; reset before running again")]
    CoreFaulted {
        /// Program counter of the faulting instruction.
        pc: u32,
    },

    /// Console I/O failed.
    #[error("console I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Trait for executing decoded instructions.
///
/// The fetch loop owns the program counter; the executor only reports how
/// control continues through [`ExecuteResult`].
pub trait Executor {
    /// Execute `instr`, located at `ctx.pc()`.
    fn execute<C: Console>(
        &mut self,
        instr: &Instruction,
        ctx: &mut ExecutionContext,
        console: &mut C,
    ) -> Result<ExecuteResult, ExecError>;
}

/// Input/output device behind the print and read opcodes.
pub trait Console {
    /// Emit one register value.
    fn print_value(&mut self, value: i32) -> Result<(), ExecError>;

    /// Read one integer. Returns `Ok(None)` at end of input.
    fn read_value(&mut self) -> Result<Option<i32>, ExecError>;
}
