//! Operator compilation

use crate::compiler::registers::{offset_register, Register};
use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::opcode::OpCode;
use luna_parser::ast::{BinaryOp, Expression, UnaryOp};

impl Compiler {
    /// Compile binary operation
    ///
    /// Operands land in `R` and `R+1`; the result overwrites `R`.
    pub(crate) fn lower_binary(
        &mut self,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
        line: u32,
    ) -> Result<Register, CompileError> {
        let opcode = match op {
            BinaryOp::Add => OpCode::Add,
            BinaryOp::Sub => OpCode::Sub,
            BinaryOp::Mul => OpCode::Mul,
            BinaryOp::Div => OpCode::Div,
            BinaryOp::Mod => OpCode::Mod,
            BinaryOp::Pow => OpCode::Pow,
            BinaryOp::Concat => OpCode::Concat,
            BinaryOp::Eq => OpCode::Eq,
            BinaryOp::Ne => OpCode::Ne,
            BinaryOp::Lt => OpCode::Lt,
            BinaryOp::Le => OpCode::Le,
            BinaryOp::Gt => OpCode::Gt,
            BinaryOp::Ge => OpCode::Ge,
            BinaryOp::And => return self.lower_short_circuit(OpCode::JumpIfFalse, left, right, line),
            BinaryOp::Or => return self.lower_short_circuit(OpCode::JumpIfTrue, left, right, line),
        };

        let dst = self.lower_expression(left)?;
        let rhs = self.lower_expression(right)?;
        self.emit_abc(opcode, dst, dst, rhs, line)?;
        self.set_next_register(offset_register(dst, 1)?)?;
        Ok(dst)
    }

    /// `and` / `or`: the right operand is only evaluated (into the same
    /// register) when the left one does not already decide the result.
    fn lower_short_circuit(
        &mut self,
        jump: OpCode,
        left: &Expression,
        right: &Expression,
        line: u32,
    ) -> Result<Register, CompileError> {
        let dst = self.lower_expression(left)?;
        let skip = self.emit_jump(jump, dst, line)?;
        self.set_next_register(dst)?;
        self.lower_expression(right)?;
        self.patch_jump(skip)?;
        Ok(dst)
    }

    /// Compile unary operation
    pub(crate) fn lower_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expression,
        line: u32,
    ) -> Result<Register, CompileError> {
        let opcode = match op {
            UnaryOp::Negate => OpCode::Neg,
            UnaryOp::Not => OpCode::Not,
            UnaryOp::Length => OpCode::Len,
        };
        let dst = self.lower_expression(operand)?;
        self.emit_abc(opcode, dst, dst, 0, line)?;
        Ok(dst)
    }
}
