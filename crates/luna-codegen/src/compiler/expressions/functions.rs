//! Function literals and calls

use crate::bytecode::FunctionId;
use crate::compiler::registers::{offset_register, Register};
use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::opcode::OpCode;
use luna_parser::ast::{CallKind, FuncCall, FunctionBody, Name};

impl Compiler {
    /// `function (params) ... end` used as a value
    pub(crate) fn lower_function_literal(&mut self, body: &FunctionBody) -> Result<Register, CompileError> {
        let child = self.lower_function_body("<anonymous>", body, false)?;
        let dst = self.reserve_register()?;
        self.emit_closure(dst, child, body.line)?;
        Ok(dst)
    }

    /// Compile a function body into a new prototype nested under the current one.
    ///
    /// Parameters (with a leading `self` for methods) take the first
    /// registers of the new frame.
    pub(crate) fn lower_function_body(
        &mut self,
        name: &str,
        body: &FunctionBody,
        is_method: bool,
    ) -> Result<FunctionId, CompileError> {
        let (id, ()) = self.with_function(name, body.line, |c, _| {
            if is_method {
                c.declare_local(&Name::new("self", body.line))?;
            }
            c.lower_name_list(&body.params)?;
            let param_count = c.next_register()?;
            c.ctx_mut()?.param_count = param_count;

            c.lower_block(&body.block)?;
            c.emit_return_none(body.block.end_line)
        })?;
        Ok(id)
    }

    /// `CLOSURE dst idx` where `idx` is `child`'s position among the current function's children
    pub(crate) fn emit_closure(&mut self, dst: Register, child: FunctionId, line: u32) -> Result<(), CompileError> {
        let idx = self.ctx()?.child_index(child)?;
        self.emit_abx(OpCode::Closure, dst, idx as usize, line)?;
        Ok(())
    }

    /// Compile a call; a single result replaces the function in `R`
    pub(crate) fn lower_call(&mut self, call: &FuncCall) -> Result<Register, CompileError> {
        let func = match &call.kind {
            CallKind::Normal { caller } => {
                let func = self.lower_expression(caller)?;
                self.restore_top(offset_register(func, 1)?, call.line)?;
                func
            }
            CallKind::Method { object, method } => {
                let func = self.lower_expression(object)?;
                self.emit_self(func, method, call.line)?;
                self.restore_top(offset_register(func, 2)?, call.line)?;
                func
            }
        };

        self.lower_expression_list(&call.args, call.line)?;
        self.emit_abc(OpCode::Call, func, 0, 0, call.line)?;
        self.set_next_register(offset_register(func, 1)?)?;
        Ok(func)
    }

    /// With the object in `R[func]`, leave the method in `R[func]` and the
    /// receiver in `R[func+1]`.
    fn emit_self(&mut self, func: Register, method: &Name, line: u32) -> Result<(), CompileError> {
        let const_idx = self.add_constant(method.name.as_str())?;
        let receiver = self.reserve_register()?;
        match u8::try_from(const_idx) {
            Ok(k) => {
                self.emit_abc(OpCode::SelfMethod, func, func, k, line)?;
            }
            Err(_) => {
                self.emit_move(receiver, func, line)?;
                let key = self.reserve_register()?;
                self.emit_load_const(key, const_idx, line)?;
                self.emit_abc(OpCode::GetTable, func, receiver, key, line)?;
                self.set_next_register(key)?;
            }
        }
        Ok(())
    }
}
