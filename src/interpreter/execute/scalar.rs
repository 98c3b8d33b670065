//! Scalar ALU execution unit.
//!
//! Handles integer arithmetic, shift, move and compare operations on 32-bit
//! registers.
//!
//! # Operations
//!
//! - **Arithmetic**: subl imm, addl reg/imm, imull (all wrapping)
//! - **Shift**: shrl (logical, by one)
//! - **Move**: movl reg, movl imm
//! - **Compare**: cmpl (the only writer of the flags register)

use crate::interpreter::decode::Instruction;
use crate::interpreter::state::ExecutionContext;
use crate::interpreter::traits::{ExecError, Flags};

/// Scalar ALU execution unit.
pub struct ScalarAlu;

impl ScalarAlu {
    /// `r1 -= imm`
    pub fn sub_imm(instr: &Instruction, ctx: &mut ExecutionContext) -> Result<(), ExecError> {
        let r1 = instr.first_register;
        let value = ctx.registers.read(r1)?.wrapping_sub(instr.imm());
        ctx.registers.write(r1, value)
    }

    /// `r2 += r1`
    pub fn add_reg_reg(instr: &Instruction, ctx: &mut ExecutionContext) -> Result<(), ExecError> {
        let (a, b) = Self::get_two_sources(instr, ctx)?;
        ctx.registers.write(instr.second_register, b.wrapping_add(a))
    }

    /// `r1 += imm`
    pub fn add_imm(instr: &Instruction, ctx: &mut ExecutionContext) -> Result<(), ExecError> {
        let r1 = instr.first_register;
        let value = ctx.registers.read(r1)?.wrapping_add(instr.imm());
        ctx.registers.write(r1, value)
    }

    /// `r2 = r1 * r2`, low 32 bits of the product.
    pub fn mul_reg_reg(instr: &Instruction, ctx: &mut ExecutionContext) -> Result<(), ExecError> {
        let (a, b) = Self::get_two_sources(instr, ctx)?;
        ctx.registers.write(instr.second_register, a.wrapping_mul(b))
    }

    /// `r1 = r1 >>> 1`; the sign bit is always cleared.
    pub fn shr_one(instr: &Instruction, ctx: &mut ExecutionContext) -> Result<(), ExecError> {
        let r1 = instr.first_register;
        let value = ((ctx.registers.read(r1)? as u32) >> 1) as i32 & 0x7FFF_FFFF;
        ctx.registers.write(r1, value)
    }

    /// `r2 = r1`
    pub fn mov_reg_reg(instr: &Instruction, ctx: &mut ExecutionContext) -> Result<(), ExecError> {
        let value = ctx.registers.read(instr.first_register)?;
        ctx.registers.write(instr.second_register, value)
    }

    /// `r1 = imm`, sign-extended.
    pub fn mov_imm(instr: &Instruction, ctx: &mut ExecutionContext) -> Result<(), ExecError> {
        ctx.registers.write(instr.first_register, instr.imm())
    }

    /// Set the flags register from `r2 - r1`.
    pub fn compare(instr: &Instruction, ctx: &mut ExecutionContext) -> Result<(), ExecError> {
        let (first, second) = Self::get_two_sources(instr, ctx)?;
        let flags = Flags::from_compare(first, second);
        log::trace!("cmpl r{} ({}) r{} ({}) -> {:?}",
            instr.first_register, first, instr.second_register, second, flags);
        ctx.set_flags(flags);
        Ok(())
    }

    /// Read both register operands as `(r1, r2)`.
    fn get_two_sources(
        instr: &Instruction,
        ctx: &ExecutionContext,
    ) -> Result<(i32, i32), ExecError> {
        Ok((
            ctx.registers.read(instr.first_register)?,
            ctx.registers.read(instr.second_register)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::traits::{CARRY_BIT, OVERFLOW_BIT, SIGN_BIT, ZERO_BIT};

    fn ctx_with(regs: &[(u8, i32)]) -> ExecutionContext {
        let mut ctx = ExecutionContext::default();
        for (reg, value) in regs {
            ctx.registers.write(*reg, *value).unwrap();
        }
        ctx
    }

    #[test]
    fn test_sub_imm() {
        let mut ctx = ctx_with(&[(0, 10)]);
        ScalarAlu::sub_imm(&Instruction::sub_imm(0, 3), &mut ctx).unwrap();
        assert_eq!(ctx.registers.read(0).unwrap(), 7);

        // Negative immediate adds
        ScalarAlu::sub_imm(&Instruction::sub_imm(0, -3), &mut ctx).unwrap();
        assert_eq!(ctx.registers.read(0).unwrap(), 10);
    }

    #[test]
    fn test_add_wraps() {
        let mut ctx = ctx_with(&[(1, i32::MAX), (2, 1)]);
        ScalarAlu::add_reg_reg(&Instruction::add_reg_reg(2, 1), &mut ctx).unwrap();
        assert_eq!(ctx.registers.read(1).unwrap(), i32::MIN);
        // Source untouched
        assert_eq!(ctx.registers.read(2).unwrap(), 1);

        let mut ctx = ctx_with(&[(3, -5)]);
        ScalarAlu::add_imm(&Instruction::add_imm(3, 8), &mut ctx).unwrap();
        assert_eq!(ctx.registers.read(3).unwrap(), 3);
    }

    #[test]
    fn test_mul_wraps() {
        let mut ctx = ctx_with(&[(0, 6), (1, 7)]);
        ScalarAlu::mul_reg_reg(&Instruction::mul_reg_reg(0, 1), &mut ctx).unwrap();
        assert_eq!(ctx.registers.read(1).unwrap(), 42);

        let mut ctx = ctx_with(&[(0, 0x10000), (1, 0x10000)]);
        ScalarAlu::mul_reg_reg(&Instruction::mul_reg_reg(0, 1), &mut ctx).unwrap();
        assert_eq!(ctx.registers.read(1).unwrap(), 0);
    }

    #[test]
    fn test_shr_clears_sign() {
        let mut ctx = ctx_with(&[(4, -1)]);
        ScalarAlu::shr_one(&Instruction::shr_one(4), &mut ctx).unwrap();
        assert_eq!(ctx.registers.read(4).unwrap(), 0x7FFF_FFFF);

        let mut ctx = ctx_with(&[(4, 9)]);
        ScalarAlu::shr_one(&Instruction::shr_one(4), &mut ctx).unwrap();
        assert_eq!(ctx.registers.read(4).unwrap(), 4);
    }

    #[test]
    fn test_moves() {
        let mut ctx = ctx_with(&[(0, 99)]);
        ScalarAlu::mov_reg_reg(&Instruction::mov_reg_reg(0, 5), &mut ctx).unwrap();
        assert_eq!(ctx.registers.read(5).unwrap(), 99);

        ScalarAlu::mov_imm(&Instruction::mov_imm(2, -32768), &mut ctx).unwrap();
        assert_eq!(ctx.registers.read(2).unwrap(), -32768);
    }

    #[test]
    fn test_compare_sets_flags_register() {
        let mut ctx = ctx_with(&[(0, 10), (1, 5), (16, 0x7FFF)]);
        ScalarAlu::compare(&Instruction::cmp(0, 1), &mut ctx).unwrap();
        // 5 - 10: negative, borrow, no overflow; stale bits cleared
        assert_eq!(ctx.registers.read(16).unwrap(), CARRY_BIT | SIGN_BIT);

        let mut ctx = ctx_with(&[(0, 3), (1, 3)]);
        ScalarAlu::compare(&Instruction::cmp(0, 1), &mut ctx).unwrap();
        assert_eq!(ctx.registers.read(16).unwrap(), ZERO_BIT);

        let mut ctx = ctx_with(&[(0, 1), (1, i32::MIN)]);
        ScalarAlu::compare(&Instruction::cmp(0, 1), &mut ctx).unwrap();
        assert_eq!(ctx.registers.read(16).unwrap(), OVERFLOW_BIT);
    }

    #[test]
    fn test_bad_register_faults() {
        let mut ctx = ExecutionContext::default();
        let err = ScalarAlu::mov_imm(&Instruction::mov_imm(20, 1), &mut ctx).unwrap_err();
        assert!(matches!(err, ExecError::RegisterFault { index: 20 }));

        let err = ScalarAlu::compare(&Instruction::cmp(0, 31), &mut ctx).unwrap_err();
        assert!(matches!(err, ExecError::RegisterFault { index: 31 }));
    }
}
