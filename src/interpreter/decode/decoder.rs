//! Word decoder and the decoded program representation.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use super::{extract_field, extract_imm, fields, WORD_SIZE};
use crate::interpreter::traits::DecodeError;

/// Operation selected by the 5-bit opcode field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// `reg[r1] -= imm`
    SubImm,
    /// `reg[r2] += reg[r1]`
    AddRegReg,
    /// `reg[r1] += imm`
    AddImm,
    /// `reg[r2] = reg[r1] * reg[r2]`
    MulRegReg,
    /// `reg[r1] = (reg[r1] >> 1) & 0x7fffffff`
    ShrOne,
    /// `reg[r2] = reg[r1]`
    MovRegReg,
    /// `reg[r2] = mem[SP - imm * 4]`
    MovMemReg,
    /// `mem[SP - imm * 4] = reg[r1]`
    MovRegMem,
    /// `reg[r1] = imm`
    MovImmReg,
    /// Set flags from `reg[r2] - reg[r1]`.
    Cmp,
    Je,
    Jl,
    Jle,
    Jge,
    Jbe,
    Jmp,
    Call,
    Ret,
    Push,
    Pop,
    /// Write `reg[r1]` to the console.
    Print,
    /// Read an integer from the console into `reg[r1]`.
    Read,
    /// Undefined opcode (22-31). Executes as a no-op.
    Unknown(u8),
}

impl From<u8> for Opcode {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::SubImm,
            1 => Self::AddRegReg,
            2 => Self::AddImm,
            3 => Self::MulRegReg,
            4 => Self::ShrOne,
            5 => Self::MovRegReg,
            6 => Self::MovMemReg,
            7 => Self::MovRegMem,
            8 => Self::MovImmReg,
            9 => Self::Cmp,
            10 => Self::Je,
            11 => Self::Jl,
            12 => Self::Jle,
            13 => Self::Jge,
            14 => Self::Jbe,
            15 => Self::Jmp,
            16 => Self::Call,
            17 => Self::Ret,
            18 => Self::Push,
            19 => Self::Pop,
            20 => Self::Print,
            21 => Self::Read,
            other => Self::Unknown(other),
        }
    }
}

impl Opcode {
    /// Numeric opcode as encoded in bits 31-27.
    pub fn code(self) -> u8 {
        match self {
            Self::SubImm => 0,
            Self::AddRegReg => 1,
            Self::AddImm => 2,
            Self::MulRegReg => 3,
            Self::ShrOne => 4,
            Self::MovRegReg => 5,
            Self::MovMemReg => 6,
            Self::MovRegMem => 7,
            Self::MovImmReg => 8,
            Self::Cmp => 9,
            Self::Je => 10,
            Self::Jl => 11,
            Self::Jle => 12,
            Self::Jge => 13,
            Self::Jbe => 14,
            Self::Jmp => 15,
            Self::Call => 16,
            Self::Ret => 17,
            Self::Push => 18,
            Self::Pop => 19,
            Self::Print => 20,
            Self::Read => 21,
            Self::Unknown(raw) => raw,
        }
    }

    /// Assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::SubImm => "subl",
            Self::AddRegReg | Self::AddImm => "addl",
            Self::MulRegReg => "imull",
            Self::ShrOne => "shrl",
            Self::MovRegReg | Self::MovMemReg | Self::MovRegMem | Self::MovImmReg => "movl",
            Self::Cmp => "cmpl",
            Self::Je => "je",
            Self::Jl => "jl",
            Self::Jle => "jle",
            Self::Jge => "jge",
            Self::Jbe => "jbe",
            Self::Jmp => "jmp",
            Self::Call => "call",
            Self::Ret => "ret",
            Self::Push => "pushl",
            Self::Pop => "popl",
            Self::Print => "printr",
            Self::Read => "readr",
            Self::Unknown(_) => ".unknown",
        }
    }
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// The operation.
    pub opcode: Opcode,
    /// First register field (0-31; only 0-16 exist).
    pub first_register: u8,
    /// Second register field (0-31; only 0-16 exist).
    pub second_register: u8,
    /// Raw 16-bit immediate.
    pub immediate: i16,
}

impl Instruction {
    /// Create an instruction from its fields.
    pub const fn new(
        opcode: Opcode,
        first_register: u8,
        second_register: u8,
        immediate: i16,
    ) -> Self {
        Self {
            opcode,
            first_register,
            second_register,
            immediate,
        }
    }

    /// Decode one instruction word.
    ///
    /// Bit 16 is reserved and ignored.
    pub fn decode(word: u32) -> Self {
        Self {
            opcode: Opcode::from(extract_field(word, fields::OPCODE_SHIFT)),
            first_register: extract_field(word, fields::FIRST_REG_SHIFT),
            second_register: extract_field(word, fields::SECOND_REG_SHIFT),
            immediate: extract_imm(word, 0, fields::IMM_BITS) as i16,
        }
    }

    /// Encode back into an instruction word. Bit 16 is written as zero.
    pub fn encode(&self) -> u32 {
        let mask = fields::FIELD_MASK;
        ((self.opcode.code() as u32 & mask) << fields::OPCODE_SHIFT)
            | ((self.first_register as u32 & mask) << fields::FIRST_REG_SHIFT)
            | ((self.second_register as u32 & mask) << fields::SECOND_REG_SHIFT)
            | (self.immediate as u16 as u32)
    }

    /// Immediate sign-extended to 32 bits.
    #[inline]
    pub fn imm(&self) -> i32 {
        self.immediate as i32
    }

    pub const fn sub_imm(reg: u8, imm: i16) -> Self {
        Self::new(Opcode::SubImm, reg, 0, imm)
    }

    pub const fn add_reg_reg(src: u8, dst: u8) -> Self {
        Self::new(Opcode::AddRegReg, src, dst, 0)
    }

    pub const fn add_imm(reg: u8, imm: i16) -> Self {
        Self::new(Opcode::AddImm, reg, 0, imm)
    }

    pub const fn mul_reg_reg(src: u8, dst: u8) -> Self {
        Self::new(Opcode::MulRegReg, src, dst, 0)
    }

    pub const fn shr_one(reg: u8) -> Self {
        Self::new(Opcode::ShrOne, reg, 0, 0)
    }

    pub const fn mov_reg_reg(src: u8, dst: u8) -> Self {
        Self::new(Opcode::MovRegReg, src, dst, 0)
    }

    /// `dst = mem[SP - slot * 4]`
    pub const fn mov_mem_reg(slot: i16, dst: u8) -> Self {
        Self::new(Opcode::MovMemReg, 0, dst, slot)
    }

    /// `mem[SP - slot * 4] = src`
    pub const fn mov_reg_mem(src: u8, slot: i16) -> Self {
        Self::new(Opcode::MovRegMem, src, 0, slot)
    }

    pub const fn mov_imm(reg: u8, imm: i16) -> Self {
        Self::new(Opcode::MovImmReg, reg, 0, imm)
    }

    /// Compare `second - first`.
    pub const fn cmp(first: u8, second: u8) -> Self {
        Self::new(Opcode::Cmp, first, second, 0)
    }

    /// Branch or call with an offset relative to the following instruction.
    pub const fn jump(opcode: Opcode, offset: i16) -> Self {
        Self::new(opcode, 0, 0, offset)
    }

    pub const fn ret() -> Self {
        Self::new(Opcode::Ret, 0, 0, 0)
    }

    pub const fn push(reg: u8) -> Self {
        Self::new(Opcode::Push, reg, 0, 0)
    }

    pub const fn pop(reg: u8) -> Self {
        Self::new(Opcode::Pop, reg, 0, 0)
    }

    pub const fn print(reg: u8) -> Self {
        Self::new(Opcode::Print, reg, 0, 0)
    }

    pub const fn read(reg: u8) -> Self {
        Self::new(Opcode::Read, reg, 0, 0)
    }

    /// Get a human-readable disassembly string.
    pub fn disassemble(&self) -> String {
        let op = self.opcode.mnemonic();
        let r1 = self.first_register;
        let r2 = self.second_register;
        let imm = self.imm();
        // Memory operands address SP - imm * 4
        let disp = -(imm as i64) * 4;

        match self.opcode {
            Opcode::SubImm | Opcode::AddImm | Opcode::MovImmReg => {
                format!("{} ${}, r{}", op, imm, r1)
            }
            Opcode::AddRegReg | Opcode::MulRegReg | Opcode::MovRegReg | Opcode::Cmp => {
                format!("{} r{}, r{}", op, r1, r2)
            }
            Opcode::ShrOne | Opcode::Push | Opcode::Pop | Opcode::Print | Opcode::Read => {
                format!("{} r{}", op, r1)
            }
            Opcode::MovMemReg => format!("{} {}(sp), r{}", op, disp, r2),
            Opcode::MovRegMem => format!("{} r{}, {}(sp)", op, r1, disp),
            Opcode::Je
            | Opcode::Jl
            | Opcode::Jle
            | Opcode::Jge
            | Opcode::Jbe
            | Opcode::Jmp
            | Opcode::Call => format!("{} .{:+}", op, imm + 4),
            Opcode::Ret => op.to_string(),
            Opcode::Unknown(raw) => format!("{} {}", op, raw),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.disassemble())
    }
}

/// An immutable decoded program.
///
/// Instructions are addressed by byte: the instruction at `pc` is
/// `instructions[pc / 4]`, and `end_pc()` is the address just past the
/// last one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    /// Create a program from decoded instructions.
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// All instructions in address order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Fetch the instruction at byte address `pc`.
    ///
    /// Returns `None` if `pc` is misaligned or past the last instruction.
    pub fn fetch(&self, pc: u32) -> Option<&Instruction> {
        if pc as usize % WORD_SIZE != 0 {
            return None;
        }
        self.instructions.get(pc as usize / WORD_SIZE)
    }

    /// Address just past the last instruction (natural halt address).
    pub fn end_pc(&self) -> u32 {
        (self.instructions.len() * WORD_SIZE) as u32
    }

    /// Encode the program back into its binary form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.instructions.len() * WORD_SIZE];
        for (chunk, instr) in bytes.chunks_exact_mut(WORD_SIZE).zip(&self.instructions) {
            LittleEndian::write_u32(chunk, instr.encode());
        }
        bytes
    }

    /// Render the raw field listing used for debugging decoded programs.
    pub fn listing(&self) -> String {
        let mut out = String::from("instructions: \n");
        for instr in &self.instructions {
            out.push_str(&format!(
                "op: {}, reg1: {}, reg2: {}, imm: {}\n",
                instr.opcode.code(),
                instr.first_register,
                instr.second_register,
                instr.immediate
            ));
        }
        out.push_str("--------------\n");
        out
    }
}

impl FromIterator<Instruction> for Program {
    fn from_iter<I: IntoIterator<Item = Instruction>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Decode a byte stream into a program, one instruction per 4-byte word.
///
/// Fails only if the length is not a multiple of 4. Opcodes are not
/// validated here.
pub fn decode_program(bytes: &[u8]) -> Result<Program, DecodeError> {
    if bytes.len() % WORD_SIZE != 0 {
        return Err(DecodeError::InvalidEncoding { len: bytes.len() });
    }

    let instructions = bytes
        .chunks_exact(WORD_SIZE)
        .map(|chunk| Instruction::decode(LittleEndian::read_u32(chunk)))
        .collect();

    Ok(Program::new(instructions))
}
