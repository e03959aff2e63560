//! Literal expression compilation

use crate::compiler::registers::{offset_register, Register};
use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::opcode::OpCode;
use crate::value::Constant;
use luna_parser::ast::{Literal, TableDefine, TableField, Terminator};

impl Compiler {
    /// Compile literal expressions
    pub(crate) fn lower_terminator(&mut self, terminator: &Terminator) -> Result<Register, CompileError> {
        let line = terminator.line;
        match &terminator.value {
            Literal::Nil => {
                let reg = self.reserve_register()?;
                self.emit_load_nil(reg, line)?;
                Ok(reg)
            }

            Literal::Boolean(b) => {
                let reg = self.reserve_register()?;
                let op = if *b { OpCode::LoadTrue } else { OpCode::LoadFalse };
                self.emit_abc(op, reg, 0, 0, line)?;
                Ok(reg)
            }

            Literal::Number(n) => {
                let const_idx = self.add_constant(*n)?;
                let reg = self.reserve_register()?;
                self.emit_load_const(reg, const_idx, line)?;
                Ok(reg)
            }

            Literal::String(s) => {
                let const_idx = self.add_constant(s.as_str())?;
                let reg = self.reserve_register()?;
                self.emit_load_const(reg, const_idx, line)?;
                Ok(reg)
            }
        }
    }

    /// Compile a table constructor
    ///
    /// Positional items are keyed 1, 2, ... in order of appearance,
    /// regardless of the named or indexed fields between them.
    pub(crate) fn lower_table(&mut self, table: &TableDefine) -> Result<Register, CompileError> {
        let line = table.line;
        let positional = table
            .fields
            .iter()
            .filter(|field| matches!(field, TableField::Positional(_)))
            .count();
        let hashed = table.fields.len() - positional;

        let dst = self.reserve_register()?;
        self.emit_abc(OpCode::NewTable, dst, size_hint(positional), size_hint(hashed), line)?;
        let scratch = offset_register(dst, 1)?;

        let mut index = 0usize;
        for field in &table.fields {
            match field {
                TableField::Positional(value) => {
                    index += 1;
                    let value_line = value.line();
                    let value = self.lower_expression(value)?;
                    self.emit_set_constant_key(dst, Constant::Number(index as f64), value, value_line)?;
                }
                TableField::Named { name, value } => {
                    let value = self.lower_expression(value)?;
                    self.emit_set_field(dst, &name.name, value, name.line)?;
                }
                TableField::Indexed { key, value } => {
                    let key = self.lower_expression(key)?;
                    let value = self.lower_expression(value)?;
                    self.emit_abc(OpCode::SetTable, dst, key, value, line)?;
                }
            }
            self.set_next_register(scratch)?;
        }

        Ok(dst)
    }
}

/// `NEW_TABLE` size hints saturate at the operand width
fn size_hint(count: usize) -> u8 {
    u8::try_from(count).unwrap_or(u8::MAX)
}
