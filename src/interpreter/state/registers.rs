//! Register file.
//!
//! 17 × 32-bit signed registers (r0-r16). Two of them are reserved:
//!
//! - r6 is the stack pointer; it doubles as a byte offset into stack memory
//! - r16 is the flags register, written only by the compare instruction
//!
//! The instruction encoding has room for 32 register indices; naming any of
//! r17-r31 is a register fault.

use std::fmt;

use crate::interpreter::traits::ExecError;

/// Number of architectural registers.
pub const NUM_REGS: usize = 17;

/// Stack pointer register index.
pub const SP_REG: u8 = 6;

/// Flags register index.
pub const FLAGS_REG: u8 = 16;

/// The architectural register file.
#[derive(Clone, PartialEq, Eq)]
pub struct RegisterFile {
    regs: [i32; NUM_REGS],
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    /// Create a new zeroed register file.
    pub const fn new() -> Self {
        Self { regs: [0; NUM_REGS] }
    }

    /// Read a register (0-16).
    #[inline]
    pub fn read(&self, reg: u8) -> Result<i32, ExecError> {
        self.regs
            .get(reg as usize)
            .copied()
            .ok_or(ExecError::RegisterFault { index: reg })
    }

    /// Write a register (0-16).
    #[inline]
    pub fn write(&mut self, reg: u8, value: i32) -> Result<(), ExecError> {
        let slot = self
            .regs
            .get_mut(reg as usize)
            .ok_or(ExecError::RegisterFault { index: reg })?;
        *slot = value;
        Ok(())
    }

    /// Current stack pointer.
    #[inline]
    pub fn sp(&self) -> i32 {
        self.regs[SP_REG as usize]
    }

    #[inline]
    pub fn set_sp(&mut self, value: i32) {
        self.regs[SP_REG as usize] = value;
    }

    /// Raw flags register.
    #[inline]
    pub fn flags(&self) -> i32 {
        self.regs[FLAGS_REG as usize]
    }

    #[inline]
    pub fn set_flags(&mut self, value: i32) {
        self.regs[FLAGS_REG as usize] = value;
    }

    /// Get a slice of all registers (for debugging/display).
    pub fn as_slice(&self) -> &[i32; NUM_REGS] {
        &self.regs
    }
}

impl fmt::Debug for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only show non-zero registers
        let non_zero: Vec<_> = self
            .regs
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0)
            .collect();

        if non_zero.is_empty() {
            write!(f, "RegisterFile {{ all zero }}")
        } else {
            write!(f, "RegisterFile {{ ")?;
            for (i, (reg, val)) in non_zero.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "r{}: 0x{:08X}", reg, val)?;
            }
            write!(f, " }}")
        }
    }
}
