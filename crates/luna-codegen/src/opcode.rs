//! OpCode definitions for Luna bytecode
//!
//! Instructions are encoded as 32-bit values with the following formats:
//!
//! Format ABC:  [8-bit opcode][8-bit A][8-bit B][8-bit C]
//! Format ABx:  [8-bit opcode][8-bit A][16-bit Bx]
//! Format AsBx: [8-bit opcode][8-bit A][16-bit signed Bx]
//!
//! Register operands are indices into the current call frame (0-255).
//! Jump offsets are relative to the instruction following the jump.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bytecode instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OpCode {
    // ===== Loads & Moves =====
    /// Load constant from pool: R[A] = K[Bx]
    LoadConst = 0,
    /// Load nil: R[A] = nil
    LoadNil = 1,
    /// Load true: R[A] = true
    LoadTrue = 2,
    /// Load false: R[A] = false
    LoadFalse = 3,
    /// Move register: R[A] = R[B]
    Move = 4,
    /// Set stack top: registers >= A are dead
    SetTop = 5,

    // ===== Variables =====
    /// Get global: R[A] = G[K[Bx]]
    GetGlobal = 10,
    /// Set global: G[K[Bx]] = R[A]
    SetGlobal = 11,
    /// Get upvalue: R[A] = U[B]
    GetUpvalue = 12,
    /// Set upvalue: U[B] = R[A]
    SetUpvalue = 13,

    // ===== Tables =====
    /// New table: R[A] = {} (B = array size hint, C = hash size hint)
    NewTable = 20,
    /// Get element: R[A] = R[B][R[C]]
    GetTable = 21,
    /// Set element: R[A][R[B]] = R[C]
    SetTable = 22,
    /// Get field: R[A] = R[B][K[C]]
    GetField = 23,
    /// Set field: R[A][K[B]] = R[C]
    SetField = 24,
    /// Method lookup: R[A+1] = R[B]; R[A] = R[B][K[C]]
    SelfMethod = 25,

    // ===== Arithmetic =====
    /// Addition: R[A] = R[B] + R[C]
    Add = 30,
    /// Subtraction: R[A] = R[B] - R[C]
    Sub = 31,
    /// Multiplication: R[A] = R[B] * R[C]
    Mul = 32,
    /// Division: R[A] = R[B] / R[C]
    Div = 33,
    /// Modulo: R[A] = R[B] % R[C]
    Mod = 34,
    /// Power: R[A] = R[B] ^ R[C]
    Pow = 35,
    /// Concatenation: R[A] = R[B] .. R[C]
    Concat = 36,
    /// Negation: R[A] = -R[B]
    Neg = 37,
    /// Logical NOT: R[A] = not R[B]
    Not = 38,
    /// Length: R[A] = #R[B]
    Len = 39,

    // ===== Comparison =====
    /// Equal: R[A] = R[B] == R[C]
    Eq = 40,
    /// Not equal: R[A] = R[B] ~= R[C]
    Ne = 41,
    /// Less than: R[A] = R[B] < R[C]
    Lt = 42,
    /// Less or equal: R[A] = R[B] <= R[C]
    Le = 43,
    /// Greater than: R[A] = R[B] > R[C]
    Gt = 44,
    /// Greater or equal: R[A] = R[B] >= R[C]
    Ge = 45,

    // ===== Jumps & Loops =====
    /// Unconditional jump: IP += sBx
    Jump = 50,
    /// Jump if truthy: if R[A] then IP += sBx
    JumpIfTrue = 51,
    /// Jump if falsy: if not R[A] then IP += sBx
    JumpIfFalse = 52,
    /// Numeric for prepare: R[A] -= R[A+2]; IP += sBx
    ForPrep = 53,
    /// Numeric for step: R[A] += R[A+2]; if R[A] within R[A+1] { R[A+3] = R[A]; IP += sBx }
    ForLoop = 54,
    /// Generic for call: R[A+3], ..., R[A+2+B] = R[A](R[A+1], R[A+2])
    TForCall = 55,
    /// Generic for step: if R[A+3] ~= nil { R[A+2] = R[A+3]; IP += sBx }
    TForLoop = 56,

    // ===== Functions =====
    /// Create closure: R[A] = closure(children[Bx])
    Closure = 60,
    /// Call function: R[A] = R[A](R[A+1], ..., R[top-1])
    Call = 61,
    /// Return: return R[A], ..., R[A+B-1]
    Return = 62,

    // ===== Special =====
    /// No operation
    Nop = 255,
}

/// Operand layout of an instruction, used by the disassembler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandFormat {
    None,
    A,
    AB,
    ABC,
    ABx,
    SBx,
    AsBx,
}

impl OpCode {
    /// Get opcode from byte value
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(OpCode::LoadConst),
            1 => Some(OpCode::LoadNil),
            2 => Some(OpCode::LoadTrue),
            3 => Some(OpCode::LoadFalse),
            4 => Some(OpCode::Move),
            5 => Some(OpCode::SetTop),
            10 => Some(OpCode::GetGlobal),
            11 => Some(OpCode::SetGlobal),
            12 => Some(OpCode::GetUpvalue),
            13 => Some(OpCode::SetUpvalue),
            20 => Some(OpCode::NewTable),
            21 => Some(OpCode::GetTable),
            22 => Some(OpCode::SetTable),
            23 => Some(OpCode::GetField),
            24 => Some(OpCode::SetField),
            25 => Some(OpCode::SelfMethod),
            30 => Some(OpCode::Add),
            31 => Some(OpCode::Sub),
            32 => Some(OpCode::Mul),
            33 => Some(OpCode::Div),
            34 => Some(OpCode::Mod),
            35 => Some(OpCode::Pow),
            36 => Some(OpCode::Concat),
            37 => Some(OpCode::Neg),
            38 => Some(OpCode::Not),
            39 => Some(OpCode::Len),
            40 => Some(OpCode::Eq),
            41 => Some(OpCode::Ne),
            42 => Some(OpCode::Lt),
            43 => Some(OpCode::Le),
            44 => Some(OpCode::Gt),
            45 => Some(OpCode::Ge),
            50 => Some(OpCode::Jump),
            51 => Some(OpCode::JumpIfTrue),
            52 => Some(OpCode::JumpIfFalse),
            53 => Some(OpCode::ForPrep),
            54 => Some(OpCode::ForLoop),
            55 => Some(OpCode::TForCall),
            56 => Some(OpCode::TForLoop),
            60 => Some(OpCode::Closure),
            61 => Some(OpCode::Call),
            62 => Some(OpCode::Return),
            255 => Some(OpCode::Nop),
            _ => None,
        }
    }

    /// Convert opcode to byte value
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            OpCode::LoadConst => "LOAD_CONST",
            OpCode::LoadNil => "LOAD_NIL",
            OpCode::LoadTrue => "LOAD_TRUE",
            OpCode::LoadFalse => "LOAD_FALSE",
            OpCode::Move => "MOVE",
            OpCode::SetTop => "SET_TOP",
            OpCode::GetGlobal => "GET_GLOBAL",
            OpCode::SetGlobal => "SET_GLOBAL",
            OpCode::GetUpvalue => "GET_UPVALUE",
            OpCode::SetUpvalue => "SET_UPVALUE",
            OpCode::NewTable => "NEW_TABLE",
            OpCode::GetTable => "GET_TABLE",
            OpCode::SetTable => "SET_TABLE",
            OpCode::GetField => "GET_FIELD",
            OpCode::SetField => "SET_FIELD",
            OpCode::SelfMethod => "SELF",
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Mul => "MUL",
            OpCode::Div => "DIV",
            OpCode::Mod => "MOD",
            OpCode::Pow => "POW",
            OpCode::Concat => "CONCAT",
            OpCode::Neg => "NEG",
            OpCode::Not => "NOT",
            OpCode::Len => "LEN",
            OpCode::Eq => "EQ",
            OpCode::Ne => "NE",
            OpCode::Lt => "LT",
            OpCode::Le => "LE",
            OpCode::Gt => "GT",
            OpCode::Ge => "GE",
            OpCode::Jump => "JUMP",
            OpCode::JumpIfTrue => "JUMP_IF_TRUE",
            OpCode::JumpIfFalse => "JUMP_IF_FALSE",
            OpCode::ForPrep => "FOR_PREP",
            OpCode::ForLoop => "FOR_LOOP",
            OpCode::TForCall => "TFOR_CALL",
            OpCode::TForLoop => "TFOR_LOOP",
            OpCode::Closure => "CLOSURE",
            OpCode::Call => "CALL",
            OpCode::Return => "RETURN",
            OpCode::Nop => "NOP",
        }
    }

    /// Which operand fields are meaningful for this opcode
    pub fn format(self) -> OperandFormat {
        match self {
            OpCode::LoadNil
            | OpCode::LoadTrue
            | OpCode::LoadFalse
            | OpCode::SetTop
            | OpCode::Call => OperandFormat::A,

            OpCode::Move
            | OpCode::GetUpvalue
            | OpCode::SetUpvalue
            | OpCode::Neg
            | OpCode::Not
            | OpCode::Len
            | OpCode::TForCall
            | OpCode::Return => OperandFormat::AB,

            OpCode::NewTable
            | OpCode::GetTable
            | OpCode::SetTable
            | OpCode::GetField
            | OpCode::SetField
            | OpCode::SelfMethod
            | OpCode::Add
            | OpCode::Sub
            | OpCode::Mul
            | OpCode::Div
            | OpCode::Mod
            | OpCode::Pow
            | OpCode::Concat
            | OpCode::Eq
            | OpCode::Ne
            | OpCode::Lt
            | OpCode::Le
            | OpCode::Gt
            | OpCode::Ge => OperandFormat::ABC,

            OpCode::LoadConst | OpCode::GetGlobal | OpCode::SetGlobal | OpCode::Closure => {
                OperandFormat::ABx
            }

            OpCode::Jump => OperandFormat::SBx,

            OpCode::JumpIfTrue
            | OpCode::JumpIfFalse
            | OpCode::ForPrep
            | OpCode::ForLoop
            | OpCode::TForLoop => OperandFormat::AsBx,

            OpCode::Nop => OperandFormat::None,
        }
    }

    /// True for instructions whose sBx field is a jump offset
    pub fn is_jump(self) -> bool {
        matches!(self.format(), OperandFormat::SBx | OperandFormat::AsBx)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Instruction encoding/decoding utilities
pub mod instruction {
    /// Encode instruction in ABC format
    #[inline]
    pub fn encode_abc(opcode: u8, a: u8, b: u8, c: u8) -> u32 {
        ((opcode as u32) << 24) | ((a as u32) << 16) | ((b as u32) << 8) | (c as u32)
    }

    /// Encode instruction in ABx format
    #[inline]
    pub fn encode_abx(opcode: u8, a: u8, bx: u16) -> u32 {
        ((opcode as u32) << 24) | ((a as u32) << 16) | (bx as u32)
    }

    /// Encode instruction in AsBx format (two's complement offset)
    #[inline]
    pub fn encode_asbx(opcode: u8, a: u8, sbx: i16) -> u32 {
        encode_abx(opcode, a, sbx as u16)
    }

    /// Decode instruction opcode
    #[inline]
    pub fn decode_opcode(instruction: u32) -> u8 {
        (instruction >> 24) as u8
    }

    /// Decode A operand
    #[inline]
    pub fn decode_a(instruction: u32) -> u8 {
        ((instruction >> 16) & 0xFF) as u8
    }

    /// Decode B operand
    #[inline]
    pub fn decode_b(instruction: u32) -> u8 {
        ((instruction >> 8) & 0xFF) as u8
    }

    /// Decode C operand
    #[inline]
    pub fn decode_c(instruction: u32) -> u8 {
        (instruction & 0xFF) as u8
    }

    /// Decode Bx operand (16-bit)
    #[inline]
    pub fn decode_bx(instruction: u32) -> u16 {
        (instruction & 0xFFFF) as u16
    }

    /// Decode signed Bx operand
    #[inline]
    pub fn decode_sbx(instruction: u32) -> i16 {
        decode_bx(instruction) as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use instruction::*;

    #[test]
    fn test_opcode_conversion() {
        assert_eq!(OpCode::Add.as_u8(), 30);
        assert_eq!(OpCode::from_u8(30), Some(OpCode::Add));
        assert_eq!(OpCode::from_u8(5), Some(OpCode::SetTop));
        assert_eq!(OpCode::from_u8(6), None);
    }

    #[test]
    fn test_every_opcode_round_trips_through_its_byte() {
        for byte in 0..=u8::MAX {
            if let Some(op) = OpCode::from_u8(byte) {
                assert_eq!(op.as_u8(), byte, "{}", op);
            }
        }
    }

    #[test]
    fn test_instruction_encoding() {
        let inst = encode_abc(OpCode::Add.as_u8(), 1, 2, 3);
        assert_eq!(decode_opcode(inst), OpCode::Add.as_u8());
        assert_eq!(decode_a(inst), 1);
        assert_eq!(decode_b(inst), 2);
        assert_eq!(decode_c(inst), 3);
    }

    #[test]
    fn test_instruction_encoding_abx() {
        let inst = encode_abx(OpCode::LoadConst.as_u8(), 5, 1000);
        assert_eq!(decode_opcode(inst), OpCode::LoadConst.as_u8());
        assert_eq!(decode_a(inst), 5);
        assert_eq!(decode_bx(inst), 1000);
    }

    #[test]
    fn test_negative_jump_offset() {
        let inst = encode_asbx(OpCode::ForLoop.as_u8(), 2, -7);
        assert_eq!(decode_a(inst), 2);
        assert_eq!(decode_sbx(inst), -7);
    }

    #[test]
    fn test_jump_formats() {
        assert!(OpCode::Jump.is_jump());
        assert!(OpCode::TForLoop.is_jump());
        assert!(!OpCode::Call.is_jump());
        assert_eq!(OpCode::SetTop.format(), OperandFormat::A);
    }
}
