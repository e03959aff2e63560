//! Bytecode compiler (AST to bytecode)
//!
//! A single depth-first pass over the AST. Three pieces of state move in
//! lockstep with the recursion: the name table (scopes), the arena of
//! function contexts and the id of the function currently being lowered.
//! Scopes and functions are only ever entered through `with_scope` and
//! `with_function`, which restore the previous state on every exit path.

use crate::bytecode::{BytecodeModule, FunctionId};
use crate::error::CompileError;
use crate::opcode::{instruction::*, OpCode};
use crate::options::CompileOptions;
use crate::value::Constant;
use luna_parser::ast::Chunk;
use tracing::debug;

// Module structure
mod context;
mod control;
mod expressions;
pub mod function;
pub mod registers;
pub mod scope;
mod statements;

use function::{jump_offset, FunctionContext};
use registers::Register;
use scope::NameTable;

pub use statements::NameReg;

/// Bytecode compiler for one chunk
pub struct Compiler {
    pub(crate) options: CompileOptions,

    /// Every function context, indexed by `FunctionId`
    pub(crate) functions: Vec<FunctionContext>,

    /// Function currently being lowered
    pub(crate) current: Option<FunctionId>,

    pub(crate) names: NameTable,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            functions: Vec::new(),
            current: None,
            names: NameTable::new(),
        }
    }

    /// Compile a chunk into a module whose first prototype is the main function
    pub fn compile(mut self, chunk: &Chunk) -> Result<BytecodeModule, CompileError> {
        let (main, ()) = self.with_function("<main>", 0, |c, _| {
            c.lower_block(&chunk.block)?;
            c.emit_return_none(chunk.block.end_line)
        })?;

        if main != FunctionId::MAIN || self.names.depth() != 0 {
            return Err(CompileError::internal("compiler state not unwound after main chunk"));
        }

        Ok(BytecodeModule {
            name: chunk.module.clone(),
            functions: self
                .functions
                .into_iter()
                .map(FunctionContext::into_prototype)
                .collect(),
        })
    }

    // ===== Scope & function guards =====

    /// Run `f` inside a fresh scope, closing it afterwards even when `f` fails
    pub(crate) fn with_scope<T>(
        &mut self,
        owner: Option<FunctionId>,
        f: impl FnOnce(&mut Self) -> Result<T, CompileError>,
    ) -> Result<T, CompileError> {
        self.names.open_scope(owner)?;
        let result = f(self);
        let closed = self.names.close_scope();
        let value = result?;
        closed?;
        Ok(value)
    }

    /// Create a nested function context, make it current and run `f` in a
    /// scope owned by it. The previous context is restored on every path.
    pub(crate) fn with_function<T>(
        &mut self,
        name: impl Into<String>,
        line: u32,
        f: impl FnOnce(&mut Self, FunctionId) -> Result<T, CompileError>,
    ) -> Result<(FunctionId, T), CompileError> {
        let id = FunctionId(self.functions.len());
        if id.0 > u16::MAX as usize {
            return Err(CompileError::TooManyFunctions);
        }

        let superior = self.current;
        self.functions.push(FunctionContext::new(
            id,
            name,
            line,
            superior,
            self.options.max_registers,
        ));
        if let Some(parent) = superior {
            self.function_mut(parent)?.children.push(id);
        }

        self.current = Some(id);
        let result = self.with_scope(Some(id), |c| f(c, id));
        self.current = superior;
        let value = result?;

        let ctx = self.function(id)?;
        debug!(
            function = %ctx.name,
            id = id.0,
            instructions = ctx.code.len(),
            registers = ctx.high_water_mark(),
            constants = ctx.constants.len(),
            upvalues = ctx.upvalues.len(),
            "compiled function"
        );
        Ok((id, value))
    }

    // ===== Function context access =====

    pub(crate) fn function(&self, id: FunctionId) -> Result<&FunctionContext, CompileError> {
        self.functions
            .get(id.0)
            .ok_or_else(|| CompileError::internal(format!("unknown function {}", id)))
    }

    pub(crate) fn function_mut(&mut self, id: FunctionId) -> Result<&mut FunctionContext, CompileError> {
        self.functions
            .get_mut(id.0)
            .ok_or_else(|| CompileError::internal(format!("unknown function {}", id)))
    }

    pub(crate) fn current_function(&self) -> Result<FunctionId, CompileError> {
        self.current
            .ok_or_else(|| CompileError::internal("no function is being compiled"))
    }

    pub(crate) fn ctx(&self) -> Result<&FunctionContext, CompileError> {
        self.function(self.current_function()?)
    }

    pub(crate) fn ctx_mut(&mut self) -> Result<&mut FunctionContext, CompileError> {
        let id = self.current_function()?;
        self.function_mut(id)
    }

    // ===== Register helpers =====

    pub(crate) fn next_register(&self) -> Result<Register, CompileError> {
        Ok(self.ctx()?.next_register())
    }

    pub(crate) fn reserve_register(&mut self) -> Result<Register, CompileError> {
        self.ctx_mut()?.reserve_register()
    }

    pub(crate) fn set_next_register(&mut self, reg: Register) -> Result<(), CompileError> {
        self.ctx_mut()?.set_next_register(reg);
        Ok(())
    }

    /// Roll the register stack back to `mark` and tell the interpreter
    pub(crate) fn restore_top(&mut self, mark: Register, line: u32) -> Result<(), CompileError> {
        self.set_next_register(mark)?;
        self.emit_set_top(mark, line)?;
        Ok(())
    }

    pub(crate) fn add_constant(&mut self, value: impl Into<Constant>) -> Result<usize, CompileError> {
        self.ctx_mut()?.add_constant(value.into())
    }

    // ===== Emission helpers =====

    /// Emit instruction
    pub(crate) fn emit(&mut self, instruction: u32, line: u32) -> Result<usize, CompileError> {
        Ok(self.ctx_mut()?.emit(instruction, line))
    }

    pub(crate) fn emit_abc(
        &mut self,
        op: OpCode,
        a: u8,
        b: u8,
        c: u8,
        line: u32,
    ) -> Result<usize, CompileError> {
        self.emit(encode_abc(op.as_u8(), a, b, c), line)
    }

    /// `idx` is a constant or child index; both pools are capped at 16 bits
    pub(crate) fn emit_abx(&mut self, op: OpCode, a: u8, idx: usize, line: u32) -> Result<usize, CompileError> {
        let bx = u16::try_from(idx).map_err(|_| CompileError::TooManyConstants)?;
        self.emit(encode_abx(op.as_u8(), a, bx), line)
    }

    pub(crate) fn emit_move(&mut self, dst: Register, src: Register, line: u32) -> Result<(), CompileError> {
        self.emit_abc(OpCode::Move, dst, src, 0, line)?;
        Ok(())
    }

    pub(crate) fn emit_load_const(&mut self, dst: Register, const_idx: usize, line: u32) -> Result<(), CompileError> {
        self.emit_abx(OpCode::LoadConst, dst, const_idx, line)?;
        Ok(())
    }

    pub(crate) fn emit_load_nil(&mut self, dst: Register, line: u32) -> Result<(), CompileError> {
        self.emit_abc(OpCode::LoadNil, dst, 0, 0, line)?;
        Ok(())
    }

    pub(crate) fn emit_set_top(&mut self, top: Register, line: u32) -> Result<(), CompileError> {
        self.emit_abc(OpCode::SetTop, top, 0, 0, line)?;
        Ok(())
    }

    /// Implicit `RETURN 0 0` closing every function body
    pub(crate) fn emit_return_none(&mut self, line: u32) -> Result<(), CompileError> {
        self.emit_abc(OpCode::Return, 0, 0, 0, line)?;
        Ok(())
    }

    /// Emit a forward jump with a placeholder offset; patch it later
    pub(crate) fn emit_jump(&mut self, op: OpCode, a: Register, line: u32) -> Result<usize, CompileError> {
        self.emit(encode_asbx(op.as_u8(), a, 0), line)
    }

    /// Emit a jump back to an already emitted position
    pub(crate) fn emit_jump_back(
        &mut self,
        op: OpCode,
        a: Register,
        target: usize,
        line: u32,
    ) -> Result<usize, CompileError> {
        let pos = self.current_position()?;
        let offset = jump_offset(pos, target)?;
        self.emit(encode_asbx(op.as_u8(), a, offset), line)
    }

    /// Get current code position
    pub(crate) fn current_position(&self) -> Result<usize, CompileError> {
        Ok(self.ctx()?.current_position())
    }

    /// Patch the jump at `pos` to land on the next instruction emitted
    pub(crate) fn patch_jump(&mut self, pos: usize) -> Result<(), CompileError> {
        let ctx = self.ctx_mut()?;
        let target = ctx.current_position();
        ctx.patch_jump_to(pos, target)
    }
}
