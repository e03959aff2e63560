//! Compiler configuration

use serde::{Deserialize, Serialize};

/// Default frame limit, leaving headroom below the 8-bit register field
pub const DEFAULT_MAX_REGISTERS: u8 = 250;

/// Options controlling a single compilation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Reject reads and writes of names that are neither local nor listed in `globals`
    pub strict_globals: bool,

    /// Global names that are always allowed in strict mode
    pub globals: Vec<String>,

    /// Maximum number of registers a single function may use
    pub max_registers: u8,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            strict_globals: false,
            globals: Vec::new(),
            max_registers: DEFAULT_MAX_REGISTERS,
        }
    }
}

impl CompileOptions {
    /// Strict mode with the given known globals
    pub fn strict<I, S>(globals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            strict_globals: true,
            globals: globals.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_max_registers(mut self, max_registers: u8) -> Self {
        self.max_registers = max_registers;
        self
    }

    /// Load options from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether an unresolved name may be treated as a global
    pub fn allows_global(&self, name: &str) -> bool {
        !self.strict_globals || self.globals.iter().any(|g| g == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CompileOptions::default();
        assert!(!options.strict_globals);
        assert_eq!(options.max_registers, DEFAULT_MAX_REGISTERS);
        assert!(options.allows_global("anything"));
    }

    #[test]
    fn test_from_json_partial() {
        let options = CompileOptions::from_json(r#"{ "strict_globals": true, "globals": ["print"] }"#)
            .unwrap();
        assert!(options.strict_globals);
        assert_eq!(options.max_registers, DEFAULT_MAX_REGISTERS);
        assert!(options.allows_global("print"));
        assert!(!options.allows_global("x"));
    }

    #[test]
    fn test_from_json_rejects_bad_types() {
        assert!(CompileOptions::from_json(r#"{ "max_registers": "lots" }"#).is_err());
    }
}
