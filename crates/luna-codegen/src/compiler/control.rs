//! Control flow lowering (if, loops, break)
//!
//! Every loop exits through a single `SET_TOP` that restores the register
//! top of the loop's entry. The loop's own exit jump and every `break`
//! inside it are patched to that instruction.

use crate::compiler::context::LoopContext;
use crate::compiler::registers::{offset_register, Register};
use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::opcode::OpCode;
use luna_parser::ast::{Block, Expression, GenericFor, IfStatement, NumericFor};
use std::iter;

impl Compiler {
    /// Run `f` as the body of a loop entered with the register top at
    /// `mark`, then emit the exit `SET_TOP` and patch pending breaks to it.
    fn with_loop<T>(
        &mut self,
        mark: Register,
        line: u32,
        f: impl FnOnce(&mut Self) -> Result<T, CompileError>,
    ) -> Result<T, CompileError> {
        self.ctx_mut()?.loops.push(LoopContext::new(mark));
        let result = f(self);
        let finished = self
            .ctx_mut()?
            .loops
            .pop()
            .ok_or_else(|| CompileError::internal("loop stack underflow"))?;
        let value = result?;

        for jump in finished.breaks {
            self.patch_jump(jump)?;
        }
        self.restore_top(finished.mark, line)?;
        Ok(value)
    }

    pub(crate) fn lower_if(&mut self, stmt: &IfStatement) -> Result<(), CompileError> {
        let mark = self.next_register()?;
        let clauses: Vec<(&Expression, &Block)> = iter::once((&stmt.condition, &stmt.then_block))
            .chain(stmt.else_ifs.iter().map(|e| (&e.condition, &e.block)))
            .collect();

        let mut end_jumps = Vec::new();
        for (i, (condition, block)) in clauses.iter().enumerate() {
            let cond = self.lower_expression(condition)?;
            let skip = self.emit_jump(OpCode::JumpIfFalse, cond, condition.line())?;
            self.set_next_register(mark)?;
            self.lower_block(block)?;

            let is_last = i + 1 == clauses.len() && stmt.else_block.is_none();
            if !is_last {
                end_jumps.push(self.emit_jump(OpCode::Jump, 0, block.end_line)?);
            }
            self.patch_jump(skip)?;
        }

        if let Some(block) = &stmt.else_block {
            self.lower_block(block)?;
        }

        for jump in end_jumps {
            self.patch_jump(jump)?;
        }
        self.restore_top(mark, stmt.line)
    }

    pub(crate) fn lower_while(
        &mut self,
        condition: &Expression,
        body: &Block,
        line: u32,
    ) -> Result<(), CompileError> {
        let mark = self.next_register()?;
        let loop_start = self.current_position()?;
        let cond = self.lower_expression(condition)?;
        let exit = self.emit_jump(OpCode::JumpIfFalse, cond, line)?;
        self.set_next_register(mark)?;

        self.with_loop(mark, line, |c| {
            c.lower_block(body)?;
            c.emit_jump_back(OpCode::Jump, 0, loop_start, body.end_line)?;
            c.patch_jump(exit)
        })
    }

    /// The condition sees the body's locals, so both share one scope
    pub(crate) fn lower_repeat(
        &mut self,
        body: &Block,
        condition: &Expression,
        line: u32,
    ) -> Result<(), CompileError> {
        let mark = self.next_register()?;
        self.with_loop(mark, line, |c| {
            let loop_start = c.current_position()?;
            c.with_scope(None, |c| {
                c.lower_block_body(body)?;
                let cond = c.lower_expression(condition)?;
                c.emit_jump_back(OpCode::JumpIfFalse, cond, loop_start, line)?;
                c.set_next_register(mark)
            })
        })
    }

    /// Layout: `R[base]` start/counter, `R[base+1]` limit, `R[base+2]` step,
    /// `R[base+3]` the visible loop variable.
    pub(crate) fn lower_numeric_for(&mut self, stmt: &NumericFor) -> Result<(), CompileError> {
        let line = stmt.var.line;
        let base = self.next_register()?;

        self.lower_expression(&stmt.start)?;
        self.lower_expression(&stmt.limit)?;
        match &stmt.step {
            Some(step) => {
                self.lower_expression(step)?;
            }
            None => {
                let one = self.add_constant(1.0)?;
                let reg = self.reserve_register()?;
                self.emit_load_const(reg, one, line)?;
            }
        }

        self.with_loop(base, line, |c| {
            c.with_scope(None, |c| {
                c.declare_local(&stmt.var)?;
                let prep = c.emit_jump(OpCode::ForPrep, base, line)?;
                let body_start = c.current_position()?;
                c.lower_block(&stmt.body)?;
                c.patch_jump(prep)?;
                c.emit_jump_back(OpCode::ForLoop, base, body_start, line)?;
                Ok(())
            })
        })
    }

    /// Layout: iterator function, state and control in `R[base..base+3]`,
    /// loop variables from `R[base+3]`.
    pub(crate) fn lower_generic_for(&mut self, stmt: &GenericFor) -> Result<(), CompileError> {
        let line = stmt.line;
        let base = self.next_register()?;

        let (_, count) = self.lower_expression_list(&stmt.exp_list, line)?;
        self.pad_values(count, 3, line)?;
        let vars_base = offset_register(base, 3)?;
        self.set_next_register(vars_base)?;

        self.with_loop(base, line, |c| {
            c.with_scope(None, |c| {
                c.lower_name_list(&stmt.names)?;
                // repeated names share a register, so count what was reserved
                let var_count = c.next_register()? - vars_base;
                let call = c.emit_jump(OpCode::Jump, 0, line)?;
                let body_start = c.current_position()?;
                c.lower_block(&stmt.body)?;
                c.patch_jump(call)?;
                c.emit_abc(OpCode::TForCall, base, var_count, 0, line)?;
                c.emit_jump_back(OpCode::TForLoop, base, body_start, line)?;
                Ok(())
            })
        })
    }

    pub(crate) fn lower_break(&mut self, line: u32) -> Result<(), CompileError> {
        if self.ctx()?.loops.is_empty() {
            return Err(CompileError::BreakOutsideLoop { line });
        }
        let jump = self.emit_jump(OpCode::Jump, 0, line)?;
        self.ctx_mut()?
            .loops
            .last_mut()
            .ok_or_else(|| CompileError::internal("loop stack underflow"))?
            .breaks
            .push(jump);
        Ok(())
    }
}
