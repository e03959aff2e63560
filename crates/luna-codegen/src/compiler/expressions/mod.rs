//! Expression compilation
//!
//! Every expression leaves exactly one value in the register that was the
//! top when lowering started, and leaves the top one above it.

use crate::compiler::registers::{offset_register, Register};
use crate::compiler::Compiler;
use crate::error::CompileError;
use luna_parser::ast::{Expression, ExpressionList};

mod access;
mod functions;
mod literals;
mod operators;
mod variables;

pub(crate) use variables::AssignTarget;

impl Compiler {
    /// Compile an expression (returns register holding result)
    pub(crate) fn lower_expression(&mut self, expr: &Expression) -> Result<Register, CompileError> {
        match expr {
            Expression::Terminator(terminator) => self.lower_terminator(terminator),
            Expression::Name(name) => self.lower_name_expression(name),
            Expression::Function(body) => self.lower_function_literal(body),
            Expression::Table(table) => self.lower_table(table),
            Expression::Binary {
                op,
                left,
                right,
                line,
            } => self.lower_binary(*op, left, right, *line),
            Expression::Unary { op, operand, line } => self.lower_unary(*op, operand, *line),
            Expression::Index { object, key, line } => self.lower_index(object, key, *line),
            Expression::Member { object, member } => self.lower_member(object, member),
            Expression::Call(call) => self.lower_call(call),
        }
    }

    /// Lower `list` into consecutive registers starting at the current top.
    ///
    /// Each element is preceded by a `SET_TOP` at its own slot; a non-empty
    /// list ends with a `SET_TOP` just past its last value. Returns the base
    /// register and the number of values.
    pub(crate) fn lower_expression_list(
        &mut self,
        list: &ExpressionList,
        line: u32,
    ) -> Result<(Register, usize), CompileError> {
        let base = self.next_register()?;
        for (i, expr) in list.expressions.iter().enumerate() {
            let slot = offset_register(base, i)?;
            self.restore_top(slot, expr.line())?;
            let reg = self.lower_expression(expr)?;
            if reg != slot {
                return Err(CompileError::internal(format!(
                    "expression landed in R{} instead of R{}",
                    reg, slot
                )));
            }
        }

        if !list.is_empty() {
            self.restore_top(offset_register(base, list.len())?, line)?;
        }
        Ok((base, list.len()))
    }

    /// Fill `wanted - count` registers at the top with nil
    pub(crate) fn pad_values(&mut self, count: usize, wanted: usize, line: u32) -> Result<(), CompileError> {
        for _ in count..wanted {
            let reg = self.reserve_register()?;
            self.emit_load_nil(reg, line)?;
        }
        Ok(())
    }
}
