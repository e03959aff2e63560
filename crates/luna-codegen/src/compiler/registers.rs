//! Register allocation
//!
//! Registers form a stack that mirrors lexical nesting: a construct records
//! the current top, allocates what it needs above it and hands the top back
//! when it is done. Only the high-water mark survives, as the frame size.

use crate::error::CompileError;

/// A register index in a function's frame
pub type Register = u8;

/// Stack-top cursor plus high-water mark for one function
#[derive(Debug, Clone)]
pub struct RegisterStack {
    /// Next free register (the stack top)
    next: Register,

    /// Number of registers ever in use; never decreases
    high_water_mark: Register,

    /// Frame size limit
    limit: Register,
}

impl RegisterStack {
    pub fn new(limit: Register) -> Self {
        Self {
            next: 0,
            high_water_mark: 0,
            limit,
        }
    }

    /// Peek at the stack top
    #[inline]
    pub fn next_register(&self) -> Register {
        self.next
    }

    /// Take the register at the stack top and advance past it
    pub fn reserve_register(&mut self) -> Result<Register, CompileError> {
        if self.next >= self.limit {
            return Err(CompileError::TooManyRegisters { limit: self.limit });
        }
        let reg = self.next;
        self.next += 1;
        self.high_water_mark = self.high_water_mark.max(self.next);
        Ok(reg)
    }

    /// Move the stack top, usually back to a recorded mark
    pub fn set_next_register(&mut self, reg: Register) {
        self.next = reg;
        self.high_water_mark = self.high_water_mark.max(reg);
    }

    #[inline]
    pub fn high_water_mark(&self) -> Register {
        self.high_water_mark
    }
}

/// `base + offset` as a register, failing past the 8-bit range
pub(crate) fn offset_register(base: Register, offset: usize) -> Result<Register, CompileError> {
    u8::try_from(base as usize + offset).map_err(|_| CompileError::TooManyRegisters { limit: u8::MAX })
}
