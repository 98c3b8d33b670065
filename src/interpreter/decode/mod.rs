//! Instruction decoder.
//!
//! Every instruction is one 4-byte little-endian word:
//!
//! | Bits  | Field |
//! |-------|-------|
//! | 31-27 | opcode |
//! | 26-22 | first register |
//! | 21-17 | second register |
//! | 16    | reserved (ignored) |
//! | 15-0  | immediate, two's complement |
//!
//! Decoding never rejects an opcode. The ten 5-bit patterns without a
//! defined operation decode to [`Opcode::Unknown`] and execute as no-ops.
//!
//! # Example
//!
//! ```
//! use tiny86_emu::interpreter::decode::{decode_program, Opcode};
//!
//! // movl $5, r0 ; printr r0
//! let bytes = [0x05, 0x00, 0x00, 0x40, 0x00, 0x00, 0x00, 0xA0];
//! let program = decode_program(&bytes).unwrap();
//! assert_eq!(program.len(), 2);
//! assert_eq!(program.instructions()[0].opcode, Opcode::MovImmReg);
//! assert_eq!(program.instructions()[0].imm(), 5);
//! ```

mod decoder;

pub use decoder::{decode_program, Instruction, Opcode, Program};

/// Size of one encoded instruction in bytes.
pub const WORD_SIZE: usize = 4;

/// Field positions within an instruction word.
pub mod fields {
    /// Opcode shift.
    pub const OPCODE_SHIFT: u8 = 27;
    /// First register shift.
    pub const FIRST_REG_SHIFT: u8 = 22;
    /// Second register shift.
    pub const SECOND_REG_SHIFT: u8 = 17;
    /// Mask for every 5-bit field.
    pub const FIELD_MASK: u32 = 0x1F;
    /// Immediate width in bits.
    pub const IMM_BITS: u8 = 16;
}

/// Extract a 5-bit field from an instruction word.
#[inline]
pub fn extract_field(word: u32, shift: u8) -> u8 {
    ((word >> shift) & fields::FIELD_MASK) as u8
}

/// Extract an immediate value from an instruction word.
#[inline]
pub fn extract_imm(word: u32, shift: u8, bits: u8) -> i32 {
    let mask = (1u32 << bits) - 1;
    let raw = (word >> shift) & mask;

    // Sign extend if high bit is set
    if bits < 32 && (raw & (1 << (bits - 1))) != 0 {
        (raw | !mask) as i32
    } else {
        raw as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_field() {
        let word = 0xF8000000 | (9 << 22) | (31 << 17);
        assert_eq!(extract_field(word, fields::OPCODE_SHIFT), 31);
        assert_eq!(extract_field(word, fields::FIRST_REG_SHIFT), 9);
        assert_eq!(extract_field(word, fields::SECOND_REG_SHIFT), 31);
    }

    #[test]
    fn test_extract_imm_positive() {
        assert_eq!(extract_imm(0x0000_7FFF, 0, 16), 32767);
        assert_eq!(extract_imm(0x0000_0001, 0, 16), 1);
    }

    #[test]
    fn test_extract_imm_signed() {
        assert_eq!(extract_imm(0x0000_8000, 0, 16), -32768);
        assert_eq!(extract_imm(0x0000_FFFF, 0, 16), -1);
        // Upper bits do not leak into the immediate
        assert_eq!(extract_imm(0xFFFF_0004, 0, 16), 4);
    }
}
