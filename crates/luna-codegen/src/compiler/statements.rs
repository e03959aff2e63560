//! Statement lowering

use crate::compiler::expressions::AssignTarget;
use crate::compiler::registers::{offset_register, Register};
use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::opcode::OpCode;
use luna_parser::ast::{
    Block, Expression, ExpressionList, FunctionBody, FunctionName, Name, NameList, ReturnStatement,
    Statement,
};

/// Register chosen for a declared name, with the line of its token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameReg {
    pub register: Register,
    pub line: u32,
}

impl Compiler {
    /// Lower a block in its own scope; the register top is restored (and a
    /// `SET_TOP` emitted) when the block ends.
    pub(crate) fn lower_block(&mut self, block: &Block) -> Result<(), CompileError> {
        self.with_scope(None, |c| {
            let mark = c.next_register()?;
            c.lower_block_body(block)?;
            c.restore_top(mark, block.end_line)
        })
    }

    /// Statements and trailing return, in whatever scope is current
    pub(crate) fn lower_block_body(&mut self, block: &Block) -> Result<(), CompileError> {
        for statement in &block.statements {
            self.lower_statement(statement)?;
        }
        if let Some(ret) = &block.return_stmt {
            self.lower_return(ret)?;
        }
        Ok(())
    }

    pub(crate) fn lower_statement(&mut self, statement: &Statement) -> Result<(), CompileError> {
        match statement {
            Statement::LocalNameList { names, exp_list } => {
                self.lower_local_names(names, exp_list.as_ref())
            }
            Statement::LocalFunction { name, body } => self.lower_local_function(name, body),
            Statement::Function { name, body } => self.lower_function_statement(name, body),
            Statement::Assignment {
                targets,
                exp_list,
                line,
            } => self.lower_assignment(targets, exp_list, *line),
            Statement::Call(call) => {
                let mark = self.next_register()?;
                self.lower_call(call)?;
                self.restore_top(mark, call.line)
            }
            Statement::Do(block) => self.lower_block(block),
            Statement::While {
                condition,
                body,
                line,
            } => self.lower_while(condition, body, *line),
            Statement::Repeat {
                body,
                condition,
                line,
            } => self.lower_repeat(body, condition, *line),
            Statement::If(stmt) => self.lower_if(stmt),
            Statement::NumericFor(stmt) => self.lower_numeric_for(stmt),
            Statement::GenericFor(stmt) => self.lower_generic_for(stmt),
            Statement::Break { line } => self.lower_break(*line),
        }
    }

    /// `local a, b = e1, e2`
    ///
    /// Names are declared first, then the initializers are evaluated above
    /// them and copied down with one `MOVE` per name.
    fn lower_local_names(
        &mut self,
        names: &NameList,
        exp_list: Option<&ExpressionList>,
    ) -> Result<(), CompileError> {
        let targets = self.lower_name_list(names)?;
        let line = targets.first().map_or(0, |t| t.line);

        let mut initialized = 0;
        if let Some(exp_list) = exp_list {
            let mark = self.next_register()?;
            let (base, count) = self.lower_expression_list(exp_list, line)?;
            for (i, target) in targets.iter().take(count).enumerate() {
                self.emit_move(target.register, offset_register(base, i)?, target.line)?;
            }
            initialized = count.min(targets.len());
            self.restore_top(mark, line)?;
        }

        for target in &targets[initialized..] {
            self.emit_load_nil(target.register, target.line)?;
        }
        Ok(())
    }

    /// Declare each name in the current scope and return the registers, in order
    pub(crate) fn lower_name_list(&mut self, names: &NameList) -> Result<Vec<NameReg>, CompileError> {
        names.names.iter().map(|name| self.declare_local(name)).collect()
    }

    /// A new binding takes the register at the top; a name already bound in
    /// this scope keeps its register and the top does not move.
    pub(crate) fn declare_local(&mut self, name: &Name) -> Result<NameReg, CompileError> {
        let candidate = self.next_register()?;
        let register = if self.names.declare(&name.name, candidate) {
            self.reserve_register()?
        } else {
            self.names
                .binding_in_current_scope(&name.name)
                .ok_or_else(|| CompileError::internal(format!("lost binding for '{}'", name.name)))?
        };
        Ok(NameReg {
            register,
            line: name.line,
        })
    }

    /// `local function f` declares `f` before the body so it can call itself
    fn lower_local_function(&mut self, name: &Name, body: &FunctionBody) -> Result<(), CompileError> {
        let target = self.declare_local(name)?;
        let child = self.lower_function_body(&name.name, body, false)?;
        self.emit_closure(target.register, child, body.line)
    }

    /// `function a.b.c:m() ... end`
    fn lower_function_statement(
        &mut self,
        name: &FunctionName,
        body: &FunctionBody,
    ) -> Result<(), CompileError> {
        let line = body.line;
        let display_name = name.display_name();
        let mark = self.next_register()?;
        let (first, rest) = name
            .path
            .split_first()
            .ok_or_else(|| CompileError::internal("function statement without a name"))?;

        if rest.is_empty() && name.method.is_none() {
            let target = AssignTarget::Variable(self.resolve_variable(&first.name, first.line)?);
            let child = self.lower_function_body(&display_name, body, false)?;
            let value = self.reserve_register()?;
            self.emit_closure(value, child, line)?;
            self.store_to(&target, value, line)?;
            return self.restore_top(mark, line);
        }

        let (key, prefix) = match &name.method {
            Some(method) => (method, rest),
            None => rest
                .split_last()
                .ok_or_else(|| CompileError::internal("dotted function name without fields"))?,
        };

        let table = self.lower_name_expression(first)?;
        for field in prefix {
            self.emit_get_field(table, table, &field.name, field.line)?;
        }

        let child = self.lower_function_body(&display_name, body, name.method.is_some())?;
        let value = self.reserve_register()?;
        self.emit_closure(value, child, line)?;
        self.emit_set_field(table, &key.name, value, line)?;
        self.restore_top(mark, line)
    }

    /// `v1, v2 = e1, e2`: targets' prefixes, then values, then stores in target order
    fn lower_assignment(
        &mut self,
        targets: &[Expression],
        exp_list: &ExpressionList,
        line: u32,
    ) -> Result<(), CompileError> {
        let mark = self.next_register()?;

        let resolved = targets
            .iter()
            .map(|target| self.lower_assign_target(target))
            .collect::<Result<Vec<_>, _>>()?;

        let (base, count) = self.lower_expression_list(exp_list, line)?;
        self.pad_values(count, resolved.len(), line)?;

        for (i, target) in resolved.iter().enumerate() {
            self.store_to(target, offset_register(base, i)?, line)?;
        }

        self.restore_top(mark, line)
    }

    /// `return e1, e2`: values at the top, `RETURN base count`
    fn lower_return(&mut self, ret: &ReturnStatement) -> Result<(), CompileError> {
        let base = self.next_register()?;
        let count = match &ret.exp_list {
            Some(list) => self.lower_expression_list(list, ret.line)?.1,
            None => 0,
        };
        let count = u8::try_from(count).map_err(|_| CompileError::TooManyRegisters { limit: u8::MAX })?;
        self.emit_abc(OpCode::Return, base, count, 0, ret.line)?;
        self.set_next_register(base)
    }
}
