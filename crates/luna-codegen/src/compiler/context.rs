//! Compilation context types

use crate::compiler::registers::Register;

/// Loop context for `break`
#[derive(Debug)]
pub(crate) struct LoopContext {
    /// Register top when the loop was entered; `break` lands on the `SET_TOP` restoring it
    pub(crate) mark: Register,

    /// Break jump positions (to be patched)
    pub(crate) breaks: Vec<usize>,
}

impl LoopContext {
    pub(crate) fn new(mark: Register) -> Self {
        Self {
            mark,
            breaks: Vec::new(),
        }
    }
}
