//! Error types for the code generator

use thiserror::Error;

/// Compiler errors
///
/// `Internal` marks a defect in the compiler itself (scope or function
/// context misuse); every other variant is caused by the source program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// Function frame exceeds the configured register limit
    #[error("Too many registers (max {limit})")]
    TooManyRegisters { limit: u8 },

    /// Constant pool exceeds the 16-bit Bx range
    #[error("Too many constants (max 65536)")]
    TooManyConstants,

    /// Upvalue list exceeds the 8-bit B range
    #[error("Too many upvalues (max 256)")]
    TooManyUpvalues,

    /// Nested function prototypes exceed the 16-bit Bx range
    #[error("Too many nested functions (max 65536)")]
    TooManyFunctions,

    /// Jump offset does not fit a signed 16-bit field
    #[error("Code too large (instruction offset overflow)")]
    CodeTooLarge,

    #[error("line {line}: break statement outside loop")]
    BreakOutsideLoop { line: u32 },

    /// Raised only when `CompileOptions::strict_globals` is set
    #[error("line {line}: undefined variable '{name}'")]
    UndefinedVariable { name: String, line: u32 },

    #[error("line {line}: invalid assignment target")]
    InvalidAssignmentTarget { line: u32 },

    #[error("Internal compiler error: {0}")]
    Internal(String),
}

impl CompileError {
    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        CompileError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_lines() {
        let err = CompileError::UndefinedVariable {
            name: "x".to_string(),
            line: 3,
        };
        assert_eq!(err.to_string(), "line 3: undefined variable 'x'");
        assert_eq!(
            CompileError::BreakOutsideLoop { line: 7 }.to_string(),
            "line 7: break statement outside loop"
        );
    }
}
