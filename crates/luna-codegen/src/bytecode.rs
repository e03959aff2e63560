//! Bytecode format and data structures

use crate::error::CompileError;
use crate::value::{Constant, ConstantKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Deduplicating constant pool
///
/// Serializes as the plain list of constants; the lookup index is rebuilt on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Constant>", into = "Vec<Constant>")]
pub struct ConstantPool {
    constants: Vec<Constant>,
    index: HashMap<ConstantKey, usize>,
}

impl ConstantPool {
    /// Create a new empty constant pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a constant and return its index; identical constants share a slot
    pub fn add_constant(&mut self, value: Constant) -> Result<usize, CompileError> {
        let key = value.key();
        if let Some(&idx) = self.index.get(&key) {
            return Ok(idx);
        }

        let idx = self.constants.len();
        if idx > u16::MAX as usize {
            return Err(CompileError::TooManyConstants);
        }

        self.constants.push(value);
        self.index.insert(key, idx);
        Ok(idx)
    }

    /// Get constant by index
    pub fn get(&self, idx: usize) -> Option<&Constant> {
        self.constants.get(idx)
    }

    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constant> {
        self.constants.iter()
    }
}

impl PartialEq for ConstantPool {
    fn eq(&self, other: &Self) -> bool {
        self.constants == other.constants
    }
}

impl From<Vec<Constant>> for ConstantPool {
    fn from(constants: Vec<Constant>) -> Self {
        let mut index = HashMap::with_capacity(constants.len());
        for (i, constant) in constants.iter().enumerate() {
            index.entry(constant.key()).or_insert(i);
        }
        Self { constants, index }
    }
}

impl From<ConstantPool> for Vec<Constant> {
    fn from(pool: ConstantPool) -> Self {
        pool.constants
    }
}

/// Identifies a function prototype inside a `BytecodeModule`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionId(pub usize);

impl FunctionId {
    /// The implicit top-level function of a chunk
    pub const MAIN: FunctionId = FunctionId(0);
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}

/// Upvalue descriptor for closures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpvalueDescriptor {
    /// Captured name (for debugging)
    pub name: String,

    /// True: `index` is a register of the directly enclosing function.
    /// False: `index` is an upvalue slot of the directly enclosing function.
    pub in_stack: bool,

    pub index: u8,
}

/// Function prototype (compiled function)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionPrototype {
    pub id: FunctionId,

    /// Function name (for debugging)
    pub name: String,

    /// Source line of the `function` keyword (0 for the main chunk)
    pub line_defined: u32,

    /// Number of parameters, including an implicit `self`
    pub param_count: u8,

    /// Number of registers needed (high-water mark)
    pub register_count: u8,

    /// Bytecode instructions (32-bit each)
    pub code: Vec<u32>,

    /// Source line for each instruction
    pub line_numbers: Vec<u32>,

    pub constants: ConstantPool,

    pub upvalues: Vec<UpvalueDescriptor>,

    /// Nested prototypes; `CLOSURE A Bx` refers to `children[Bx]`
    pub children: Vec<FunctionId>,

    /// Lexically enclosing function
    pub superior: Option<FunctionId>,
}

impl FunctionPrototype {
    /// Source line of the instruction at position
    pub fn line_at(&self, pos: usize) -> Option<u32> {
        self.line_numbers.get(pos).copied()
    }
}

/// Bytecode module (compiled chunk)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BytecodeModule {
    /// Module name
    pub name: String,

    /// Every prototype of the chunk, indexed by `FunctionId`; main is first
    pub functions: Vec<FunctionPrototype>,
}

impl BytecodeModule {
    /// Entry point of the chunk
    ///
    /// `compile` always creates the main function first and `from_json` refuses
    /// modules without one.
    pub fn main(&self) -> &FunctionPrototype {
        &self.functions[FunctionId::MAIN.0]
    }

    pub fn function(&self, id: FunctionId) -> Option<&FunctionPrototype> {
        self.functions.get(id.0)
    }

    /// Prototype created by `CLOSURE _ index` inside `parent`
    pub fn child(&self, parent: &FunctionPrototype, index: usize) -> Option<&FunctionPrototype> {
        parent.children.get(index).and_then(|&id| self.function(id))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load a module dumped by [`BytecodeModule::to_json`]; a module without a main function is rejected
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let module: Self = serde_json::from_str(json)?;
        if module.functions.is_empty() {
            return Err(<serde_json::Error as serde::de::Error>::custom(format!("module {} has no main function", module.name)));
        }
        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_pool() {
        let mut pool = ConstantPool::new();

        let idx1 = pool.add_constant(Constant::Number(42.0)).unwrap();
        let idx2 = pool.add_constant(Constant::from("hello")).unwrap();

        assert_eq!(idx1, 0);
        assert_eq!(idx2, 1);
        assert_eq!(pool.get(0), Some(&Constant::Number(42.0)));
        assert_eq!(pool.get(1), Some(&Constant::from("hello")));
    }

    #[test]
    fn test_constant_interning() {
        let mut pool = ConstantPool::new();

        let idx1 = pool.add_constant(Constant::from("hello")).unwrap();
        let idx2 = pool.add_constant(Constant::from("world")).unwrap();
        let idx3 = pool.add_constant(Constant::from("hello")).unwrap();
        let idx4 = pool.add_constant(Constant::Number(1.0)).unwrap();
        let idx5 = pool.add_constant(Constant::Number(1.0)).unwrap();

        assert_eq!(idx1, idx3);
        assert_ne!(idx1, idx2);
        assert_eq!(idx4, idx5);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_constant_pool_overflow() {
        let mut pool = ConstantPool::new();
        for i in 0..=u16::MAX as usize {
            pool.add_constant(Constant::Number(i as f64)).unwrap();
        }
        assert_eq!(
            pool.add_constant(Constant::Number(-1.0)),
            Err(CompileError::TooManyConstants)
        );
        // Existing constants still resolve
        assert_eq!(pool.add_constant(Constant::Number(7.0)), Ok(7));
    }

    #[test]
    fn test_constant_pool_serde_rebuilds_index() {
        let mut pool = ConstantPool::new();
        pool.add_constant(Constant::from("a")).unwrap();
        pool.add_constant(Constant::Number(2.0)).unwrap();

        let json = serde_json::to_string(&pool).unwrap();
        assert_eq!(json, r#"[{"String":"a"},{"Number":2.0}]"#);

        let mut restored: ConstantPool = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, pool);
        assert_eq!(restored.add_constant(Constant::Number(2.0)).unwrap(), 1);
    }

    #[test]
    fn test_module_without_main_is_rejected() {
        let err = BytecodeModule::from_json(r#"{"name":"x","functions":[]}"#).unwrap_err();
        assert!(err.to_string().contains("module x has no main function"));
    }
}
