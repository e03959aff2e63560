//! Variable expression compilation
//!
//! A name resolves to a local register of the current function, to an
//! upvalue when an enclosing function owns the binding, or to a global.

use crate::bytecode::{FunctionId, UpvalueDescriptor};
use crate::compiler::registers::Register;
use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::opcode::OpCode;
use luna_parser::ast::{Expression, Name};
use tracing::trace;

/// Where a name lives, as seen from the current function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Variable {
    Local(Register),
    Upvalue(u8),
    /// Constant index of the global's name
    Global(usize),
}

/// Resolved left-hand side of an assignment
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AssignTarget {
    Variable(Variable),
    /// `R[table].key`
    Field { table: Register, key: String },
    /// `R[table][R[key]]`
    Indexed { table: Register, key: Register },
}

impl Compiler {
    pub(crate) fn resolve_variable(&mut self, name: &str, line: u32) -> Result<Variable, CompileError> {
        let current = self.current_function()?;
        match self.names.resolve(name) {
            Some(binding) if binding.owner == current => Ok(Variable::Local(binding.register)),
            Some(binding) => {
                let idx = self.capture_upvalue(current, name, binding.owner, binding.register)?;
                Ok(Variable::Upvalue(idx))
            }
            None => {
                if !self.options.allows_global(name) {
                    return Err(CompileError::UndefinedVariable {
                        name: name.to_string(),
                        line,
                    });
                }
                Ok(Variable::Global(self.add_constant(name)?))
            }
        }
    }

    /// Make `name` (held in `register` of `owner`) reachable from `func`,
    /// threading it through every function in between. Returns the upvalue
    /// index in `func`.
    fn capture_upvalue(
        &mut self,
        func: FunctionId,
        name: &str,
        owner: FunctionId,
        register: Register,
    ) -> Result<u8, CompileError> {
        let superior = self.function(func)?.superior().ok_or_else(|| {
            CompileError::internal(format!("{} captures '{}' without an enclosing function", func, name))
        })?;

        let (in_stack, index) = if superior == owner {
            (true, register)
        } else {
            (false, self.capture_upvalue(superior, name, owner, register)?)
        };

        if let Some(idx) = self.function(func)?.find_upvalue(name, in_stack, index) {
            return Ok(idx);
        }

        trace!(%func, name, in_stack, index, "capture upvalue");
        self.function_mut(func)?.add_upvalue(UpvalueDescriptor {
            name: name.to_string(),
            in_stack,
            index,
        })
    }

    /// Compile variable reference
    pub(crate) fn lower_name_expression(&mut self, name: &Name) -> Result<Register, CompileError> {
        let variable = self.resolve_variable(&name.name, name.line)?;
        let dst = self.reserve_register()?;
        match variable {
            Variable::Local(src) => self.emit_move(dst, src, name.line)?,
            Variable::Upvalue(idx) => {
                self.emit_abc(OpCode::GetUpvalue, dst, idx, 0, name.line)?;
            }
            Variable::Global(const_idx) => {
                self.emit_abx(OpCode::GetGlobal, dst, const_idx, name.line)?;
            }
        }
        Ok(dst)
    }

    /// Evaluate the prefix of an assignment target (table and key, if any)
    pub(crate) fn lower_assign_target(&mut self, target: &Expression) -> Result<AssignTarget, CompileError> {
        match target {
            Expression::Name(name) => Ok(AssignTarget::Variable(
                self.resolve_variable(&name.name, name.line)?,
            )),
            Expression::Member { object, member } => {
                let table = self.lower_expression(object)?;
                Ok(AssignTarget::Field {
                    table,
                    key: member.name.clone(),
                })
            }
            Expression::Index { object, key, .. } => {
                let table = self.lower_expression(object)?;
                let key = self.lower_expression(key)?;
                Ok(AssignTarget::Indexed { table, key })
            }
            other => Err(CompileError::InvalidAssignmentTarget { line: other.line() }),
        }
    }

    /// Store `R[value]` into `target`
    pub(crate) fn store_to(&mut self, target: &AssignTarget, value: Register, line: u32) -> Result<(), CompileError> {
        match target {
            AssignTarget::Variable(Variable::Local(reg)) => self.emit_move(*reg, value, line),
            AssignTarget::Variable(Variable::Upvalue(idx)) => {
                self.emit_abc(OpCode::SetUpvalue, value, *idx, 0, line)?;
                Ok(())
            }
            AssignTarget::Variable(Variable::Global(const_idx)) => {
                self.emit_abx(OpCode::SetGlobal, value, *const_idx, line)?;
                Ok(())
            }
            AssignTarget::Field { table, key } => self.emit_set_field(*table, key, value, line),
            AssignTarget::Indexed { table, key } => {
                self.emit_abc(OpCode::SetTable, *table, *key, value, line)?;
                Ok(())
            }
        }
    }
}
