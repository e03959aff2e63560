pub mod ast;
pub mod parser;
pub mod pest_parser;

// Re-export commonly used items
pub use ast::{
    BinaryOp, Block, CallKind, Chunk, Expression, ExpressionList, FuncCall, FunctionBody,
    FunctionName, Literal, Name, NameList, Statement, TableField, Terminator, UnaryOp,
};
pub use pest_parser::{parse, parse_chunk};
