//! Luna bytecode generator
//!
//! This crate turns a parsed Luna chunk into a tree of function prototypes
//! for a register-based virtual machine in the style of Lua 5.1.
//!
//! # Architecture
//!
//! The compiler makes one depth-first pass over the AST with:
//! - A flat name table of nested scopes, each tagged with the function whose
//!   registers its names occupy
//! - A register stack per function (monotone allocation, explicit rollback,
//!   high-water mark as the frame size)
//! - An arena of function contexts linked by `FunctionId`
//! - `SET_TOP` markers telling the interpreter where the live registers end
//!
//! # Modules
//!
//! - `opcode`: Instruction set and 32-bit encoding
//! - `value`: Constant pool entries
//! - `bytecode`: Prototypes and the compiled module
//! - `compiler`: Scope resolution, register allocation and lowering
//! - `bytecode_debug`: Disassembly
//! - `options`: Compile options
//! - `error`: Compiler errors

#![allow(clippy::result_large_err)]

pub mod bytecode;
pub mod bytecode_debug;
pub mod compiler;
pub mod error;
pub mod opcode;
pub mod options;
pub mod value;

use anyhow::Context;
use luna_parser::ast::Chunk;

// Re-export main types
pub use bytecode::{BytecodeModule, FunctionId, FunctionPrototype, UpvalueDescriptor};
pub use bytecode_debug::{disassemble, disassemble_function, format_instruction};
pub use compiler::Compiler;
pub use error::CompileError;
pub use opcode::OpCode;
pub use options::CompileOptions;
pub use value::Constant;

/// Compile an already parsed chunk
pub fn compile(chunk: &Chunk, options: CompileOptions) -> Result<BytecodeModule, CompileError> {
    Compiler::new(options).compile(chunk)
}

/// Parse and compile source text in one step
pub fn compile_source(name: &str, source: &str, options: CompileOptions) -> anyhow::Result<BytecodeModule> {
    let chunk = luna_parser::parse_chunk(name, source)
        .map_err(|e| anyhow::anyhow!(e))
        .with_context(|| format!("failed to parse {}", name))?;
    let module = compile(&chunk, options).with_context(|| format!("failed to compile {}", name))?;
    Ok(module)
}

#[cfg(test)]
mod tests;
