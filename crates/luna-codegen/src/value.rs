//! Literal values that can live in a constant pool

use serde::{Deserialize, Serialize};
use std::fmt;

/// A constant referenced by `LOAD_CONST`, `GET_GLOBAL` and the field opcodes.
///
/// `nil` and booleans have dedicated load instructions and never enter the pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Number(f64),
    String(String),
}

impl Constant {
    /// Dedup key: numbers compare by bit pattern so that `NaN` interns once
    pub(crate) fn key(&self) -> ConstantKey {
        match self {
            Constant::Number(n) => ConstantKey::Number(n.to_bits()),
            Constant::String(s) => ConstantKey::String(s.clone()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Constant::String(s) => Some(s),
            Constant::Number(_) => None,
        }
    }
}

impl From<f64> for Constant {
    fn from(n: f64) -> Self {
        Constant::Number(n)
    }
}

impl From<&str> for Constant {
    fn from(s: &str) -> Self {
        Constant::String(s.to_string())
    }
}

impl From<String> for Constant {
    fn from(s: String) -> Self {
        Constant::String(s)
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Number(n) => write!(f, "{}", n),
            Constant::String(s) => write!(f, "{:?}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ConstantKey {
    Number(u64),
    String(String),
}
