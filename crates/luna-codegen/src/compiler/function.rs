//! Per-function compilation state

use crate::bytecode::{ConstantPool, FunctionId, FunctionPrototype, UpvalueDescriptor};
use crate::compiler::context::LoopContext;
use crate::compiler::registers::{Register, RegisterStack};
use crate::error::CompileError;
use crate::opcode::instruction::*;
use crate::value::Constant;

/// Mutable state of one function literal (or the main chunk) while it is lowered
#[derive(Debug)]
pub struct FunctionContext {
    pub(crate) id: FunctionId,
    pub(crate) name: String,
    pub(crate) line_defined: u32,
    pub(crate) param_count: u8,
    pub(crate) registers: RegisterStack,
    pub(crate) constants: ConstantPool,
    pub(crate) code: Vec<u32>,
    pub(crate) line_numbers: Vec<u32>,
    pub(crate) upvalues: Vec<UpvalueDescriptor>,
    pub(crate) children: Vec<FunctionId>,
    pub(crate) superior: Option<FunctionId>,
    pub(crate) loops: Vec<LoopContext>,
}

impl FunctionContext {
    pub fn new(
        id: FunctionId,
        name: impl Into<String>,
        line_defined: u32,
        superior: Option<FunctionId>,
        max_registers: Register,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            line_defined,
            param_count: 0,
            registers: RegisterStack::new(max_registers),
            constants: ConstantPool::new(),
            code: Vec::new(),
            line_numbers: Vec::new(),
            upvalues: Vec::new(),
            children: Vec::new(),
            superior,
            loops: Vec::new(),
        }
    }

    pub fn superior(&self) -> Option<FunctionId> {
        self.superior
    }

    #[inline]
    pub fn next_register(&self) -> Register {
        self.registers.next_register()
    }

    pub fn reserve_register(&mut self) -> Result<Register, CompileError> {
        self.registers.reserve_register()
    }

    pub fn set_next_register(&mut self, reg: Register) {
        self.registers.set_next_register(reg);
    }

    pub fn high_water_mark(&self) -> Register {
        self.registers.high_water_mark()
    }

    /// Append an instruction and return its position
    pub fn emit(&mut self, instruction: u32, line: u32) -> usize {
        self.code.push(instruction);
        self.line_numbers.push(line);
        self.code.len() - 1
    }

    pub fn add_constant(&mut self, value: Constant) -> Result<usize, CompileError> {
        self.constants.add_constant(value)
    }

    /// Get current code position
    #[inline]
    pub fn current_position(&self) -> usize {
        self.code.len()
    }

    /// Point the jump at `pos` to `target`
    pub(crate) fn patch_jump_to(&mut self, pos: usize, target: usize) -> Result<(), CompileError> {
        let instruction = *self
            .code
            .get(pos)
            .ok_or_else(|| CompileError::internal(format!("no instruction at {} to patch", pos)))?;
        let offset = jump_offset(pos, target)?;
        self.code[pos] = encode_asbx(decode_opcode(instruction), decode_a(instruction), offset);
        Ok(())
    }

    /// Index of an existing upvalue with the same source
    pub(crate) fn find_upvalue(&self, name: &str, in_stack: bool, index: u8) -> Option<u8> {
        self.upvalues
            .iter()
            .position(|u| u.name == name && u.in_stack == in_stack && u.index == index)
            .map(|i| i as u8)
    }

    pub(crate) fn add_upvalue(&mut self, upvalue: UpvalueDescriptor) -> Result<u8, CompileError> {
        let idx = u8::try_from(self.upvalues.len()).map_err(|_| CompileError::TooManyUpvalues)?;
        self.upvalues.push(upvalue);
        Ok(idx)
    }

    /// Position of `child` in this function's `children` list (the `CLOSURE` operand)
    pub(crate) fn child_index(&self, child: FunctionId) -> Result<u16, CompileError> {
        let idx = self
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or_else(|| CompileError::internal(format!("{} is not a child of {}", child, self.id)))?;
        u16::try_from(idx).map_err(|_| CompileError::TooManyFunctions)
    }

    pub fn into_prototype(self) -> FunctionPrototype {
        FunctionPrototype {
            id: self.id,
            name: self.name,
            line_defined: self.line_defined,
            param_count: self.param_count,
            register_count: self.registers.high_water_mark(),
            code: self.code,
            line_numbers: self.line_numbers,
            constants: self.constants,
            upvalues: self.upvalues,
            children: self.children,
            superior: self.superior,
        }
    }
}

/// Offset from the instruction after `pos` to `target`
pub(crate) fn jump_offset(pos: usize, target: usize) -> Result<i16, CompileError> {
    let offset = target as i64 - pos as i64 - 1;
    i16::try_from(offset).map_err(|_| CompileError::CodeTooLarge)
}
