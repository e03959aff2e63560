//! Table access compilation
//!
//! Constant keys use the `K[C]` forms (`GET_FIELD`, `SET_FIELD`) while the
//! constant index fits the 8-bit C operand; larger indices load the key into
//! a scratch register and fall back to `GET_TABLE` / `SET_TABLE`.

use crate::compiler::registers::{offset_register, Register};
use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::opcode::OpCode;
use crate::value::Constant;
use luna_parser::ast::{Expression, Name};

impl Compiler {
    /// `object[key]`
    pub(crate) fn lower_index(
        &mut self,
        object: &Expression,
        key: &Expression,
        line: u32,
    ) -> Result<Register, CompileError> {
        let table = self.lower_expression(object)?;
        let key = self.lower_expression(key)?;
        self.emit_abc(OpCode::GetTable, table, table, key, line)?;
        self.set_next_register(offset_register(table, 1)?)?;
        Ok(table)
    }

    /// `object.member`
    pub(crate) fn lower_member(&mut self, object: &Expression, member: &Name) -> Result<Register, CompileError> {
        let table = self.lower_expression(object)?;
        self.emit_get_field(table, table, &member.name, member.line)?;
        Ok(table)
    }

    pub(crate) fn emit_get_field(
        &mut self,
        dst: Register,
        object: Register,
        name: &str,
        line: u32,
    ) -> Result<(), CompileError> {
        let const_idx = self.add_constant(name)?;
        match u8::try_from(const_idx) {
            Ok(k) => {
                self.emit_abc(OpCode::GetField, dst, object, k, line)?;
            }
            Err(_) => {
                let key = self.reserve_register()?;
                self.emit_load_const(key, const_idx, line)?;
                self.emit_abc(OpCode::GetTable, dst, object, key, line)?;
                self.set_next_register(key)?;
            }
        }
        Ok(())
    }

    pub(crate) fn emit_set_field(
        &mut self,
        table: Register,
        name: &str,
        value: Register,
        line: u32,
    ) -> Result<(), CompileError> {
        self.emit_set_constant_key(table, Constant::from(name), value, line)
    }

    /// `R[table][key] = R[value]` for a constant key
    pub(crate) fn emit_set_constant_key(
        &mut self,
        table: Register,
        key: Constant,
        value: Register,
        line: u32,
    ) -> Result<(), CompileError> {
        let const_idx = self.add_constant(key)?;
        match u8::try_from(const_idx) {
            Ok(k) => {
                self.emit_abc(OpCode::SetField, table, k, value, line)?;
            }
            Err(_) => {
                let key = self.reserve_register()?;
                self.emit_load_const(key, const_idx, line)?;
                self.emit_abc(OpCode::SetTable, table, key, value, line)?;
                self.set_next_register(key)?;
            }
        }
        Ok(())
    }
}
