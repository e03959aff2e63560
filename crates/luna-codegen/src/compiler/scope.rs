//! Name scope chain
//!
//! All scopes of one compilation share a single flat name table. Each scope
//! frame remembers where its names start, so closing a scope is a truncate.
//! Frames also record the function whose registers their names live in;
//! resolution walks straight through function boundaries and reports the
//! owner, letting the caller tell locals from captured upvalues.

use crate::bytecode::FunctionId;
use crate::compiler::registers::Register;
use crate::error::CompileError;
use tracing::trace;

/// A name bound to a register
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeName {
    pub name: String,
    pub register: Register,
}

/// Position of a scope frame in the chain (0 = outermost)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScopeId(pub usize);

#[derive(Debug, Clone, Copy)]
struct ScopeFrame {
    /// Table length when the scope opened
    start: usize,
    owner: FunctionId,
}

/// Result of a successful name lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub register: Register,
    pub scope: ScopeId,
    /// Function whose frame holds `register`
    pub owner: FunctionId,
}

#[derive(Debug, Default)]
pub struct NameTable {
    names: Vec<ScopeName>,
    frames: Vec<ScopeFrame>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a scope; without an owner it inherits the innermost scope's owner
    pub fn open_scope(&mut self, owner: Option<FunctionId>) -> Result<ScopeId, CompileError> {
        let owner = match owner {
            Some(owner) => owner,
            None => self
                .frames
                .last()
                .map(|frame| frame.owner)
                .ok_or_else(|| CompileError::internal("scope opened without an owning function"))?,
        };

        self.frames.push(ScopeFrame {
            start: self.names.len(),
            owner,
        });
        let id = ScopeId(self.frames.len() - 1);
        trace!(depth = id.0, %owner, "open scope");
        Ok(id)
    }

    /// Pop the innermost scope and forget its names
    pub fn close_scope(&mut self) -> Result<(), CompileError> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| CompileError::internal("close_scope without an open scope"))?;
        trace!(
            depth = self.frames.len(),
            dropped = self.names.len() - frame.start,
            "close scope"
        );
        self.names.truncate(frame.start);
        Ok(())
    }

    /// Bind `name` in the innermost scope.
    ///
    /// Returns `false` and leaves the table untouched when the scope already
    /// binds `name`; the caller then reuses that binding's register.
    pub fn declare(&mut self, name: &str, register: Register) -> bool {
        if self.binding_in_current_scope(name).is_some() {
            return false;
        }
        self.names.push(ScopeName {
            name: name.to_string(),
            register,
        });
        true
    }

    /// Register of `name` if the innermost scope binds it
    pub fn binding_in_current_scope(&self, name: &str) -> Option<Register> {
        let start = self.frames.last().map_or(0, |frame| frame.start);
        self.names[start..]
            .iter()
            .rev()
            .find(|n| n.name == name)
            .map(|n| n.register)
    }

    /// Innermost binding of `name` across all scopes and functions; `None` means global
    pub fn resolve(&self, name: &str) -> Option<Resolution> {
        let (pos, binding) = self
            .names
            .iter()
            .enumerate()
            .rev()
            .find(|(_, n)| n.name == name)?;

        let scope = self.frames.iter().rposition(|frame| frame.start <= pos)?;
        Some(Resolution {
            register: binding.register,
            scope: ScopeId(scope),
            owner: self.frames[scope].owner,
        })
    }

    /// Number of live bindings
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of open scopes
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current_owner(&self) -> Option<FunctionId> {
        self.frames.last().map(|frame| frame.owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTER: FunctionId = FunctionId(0);
    const INNER: FunctionId = FunctionId(1);

    #[test]
    fn test_declare_and_resolve() {
        let mut names = NameTable::new();
        names.open_scope(Some(OUTER)).unwrap();

        assert!(names.declare("x", 0));
        assert!(names.declare("y", 1));

        let x = names.resolve("x").unwrap();
        assert_eq!(x.register, 0);
        assert_eq!(x.scope, ScopeId(0));
        assert_eq!(x.owner, OUTER);
        assert!(names.resolve("z").is_none());
    }

    #[test]
    fn test_redeclaration_keeps_first_register() {
        let mut names = NameTable::new();
        names.open_scope(Some(OUTER)).unwrap();

        assert!(names.declare("x", 0));
        assert!(!names.declare("x", 5));
        assert_eq!(names.resolve("x").unwrap().register, 0);
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn test_shadowing_across_scopes() {
        let mut names = NameTable::new();
        names.open_scope(Some(OUTER)).unwrap();
        names.declare("x", 0);

        names.open_scope(None).unwrap();
        assert!(names.declare("x", 1));
        assert_eq!(names.resolve("x").unwrap().register, 1);
        assert_eq!(names.resolve("x").unwrap().scope, ScopeId(1));

        names.close_scope().unwrap();
        assert_eq!(names.resolve("x").unwrap().register, 0);
    }

    #[test]
    fn test_close_truncates() {
        let mut names = NameTable::new();
        names.open_scope(Some(OUTER)).unwrap();
        names.declare("a", 0);
        let before = names.len();

        names.open_scope(None).unwrap();
        names.declare("b", 1);
        names.declare("c", 2);
        names.close_scope().unwrap();

        assert_eq!(names.len(), before);
        assert!(names.resolve("b").is_none());
        assert!(names.resolve("c").is_none());
        assert!(names.resolve("a").is_some());
    }

    #[test]
    fn test_owner_is_inherited() {
        let mut names = NameTable::new();
        names.open_scope(Some(OUTER)).unwrap();
        names.open_scope(Some(INNER)).unwrap();
        names.open_scope(None).unwrap();
        assert_eq!(names.current_owner(), Some(INNER));
        assert_eq!(names.depth(), 3);
    }

    #[test]
    fn test_resolution_crosses_function_boundary() {
        let mut names = NameTable::new();
        names.open_scope(Some(OUTER)).unwrap();
        names.declare("up", 3);
        names.open_scope(Some(INNER)).unwrap();
        names.declare("local", 0);

        let up = names.resolve("up").unwrap();
        assert_eq!(up.owner, OUTER);
        assert_ne!(up.owner, names.current_owner().unwrap());
        assert_eq!(names.resolve("local").unwrap().owner, INNER);
    }

    #[test]
    fn test_empty_scope_between_bindings() {
        let mut names = NameTable::new();
        names.open_scope(Some(OUTER)).unwrap();
        names.open_scope(None).unwrap();
        names.open_scope(None).unwrap();
        names.declare("x", 0);

        // Frames 0..=2 all start at 0; the innermost owns the binding
        assert_eq!(names.resolve("x").unwrap().scope, ScopeId(2));
    }

    #[test]
    fn test_misuse_is_internal_error() {
        let mut names = NameTable::new();
        assert!(matches!(names.open_scope(None), Err(CompileError::Internal(_))));
        assert!(matches!(names.close_scope(), Err(CompileError::Internal(_))));
    }
}
