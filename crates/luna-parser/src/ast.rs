//! Abstract syntax tree consumed by the bytecode compiler
//!
//! Every node kind is a closed enum variant or a plain struct. Tokens that
//! matter for diagnostics (names, literals, keywords that start a statement)
//! carry the 1-based source line they appeared on.

/// A whole source file
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Module name (usually the file name)
    pub module: String,
    pub block: Block,
}

/// A sequence of statements with an optional trailing `return`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub return_stmt: Option<ReturnStatement>,
    /// Line of the last token belonging to the block
    pub end_line: u32,
}

impl Block {
    pub fn new(statements: Vec<Statement>, return_stmt: Option<ReturnStatement>, end_line: u32) -> Self {
        Self {
            statements,
            return_stmt,
            end_line,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub exp_list: Option<ExpressionList>,
    pub line: u32,
}

/// An identifier token
#[derive(Debug, Clone, PartialEq)]
pub struct Name {
    pub name: String,
    pub line: u32,
}

impl Name {
    pub fn new(name: impl Into<String>, line: u32) -> Self {
        Self {
            name: name.into(),
            line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NameList {
    pub names: Vec<Name>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpressionList {
    pub expressions: Vec<Expression>,
}

impl ExpressionList {
    pub fn new(expressions: Vec<Expression>) -> Self {
        Self { expressions }
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Break {
        line: u32,
    },
    Do(Block),
    While {
        condition: Expression,
        body: Block,
        line: u32,
    },
    Repeat {
        body: Block,
        condition: Expression,
        line: u32,
    },
    If(IfStatement),
    NumericFor(NumericFor),
    GenericFor(GenericFor),
    /// `function a.b.c:m() ... end`
    Function {
        name: FunctionName,
        body: FunctionBody,
    },
    /// `local function f() ... end`
    LocalFunction {
        name: Name,
        body: FunctionBody,
    },
    /// `local a, b = e1, e2`
    LocalNameList {
        names: NameList,
        exp_list: Option<ExpressionList>,
    },
    /// `v1, v2 = e1, e2`
    Assignment {
        targets: Vec<Expression>,
        exp_list: ExpressionList,
        line: u32,
    },
    /// A function or method call evaluated for its side effects
    Call(FuncCall),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_block: Block,
    pub else_ifs: Vec<ElseIf>,
    pub else_block: Option<Block>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElseIf {
    pub condition: Expression,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericFor {
    pub var: Name,
    pub start: Expression,
    pub limit: Expression,
    pub step: Option<Expression>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenericFor {
    pub names: NameList,
    pub exp_list: ExpressionList,
    pub body: Block,
    pub line: u32,
}

/// Target path of a `function` statement
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionName {
    /// `a.b.c` (at least one element)
    pub path: Vec<Name>,
    /// `:m` suffix, which adds an implicit `self` parameter
    pub method: Option<Name>,
}

impl FunctionName {
    /// Dotted display name, e.g. `a.b:m`
    pub fn display_name(&self) -> String {
        let mut s = self
            .path
            .iter()
            .map(|n| n.name.as_str())
            .collect::<Vec<_>>()
            .join(".");
        if let Some(method) = &self.method {
            s.push(':');
            s.push_str(&method.name);
        }
        s
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBody {
    pub params: NameList,
    pub block: Block,
    /// Line of the `function` keyword
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Nil,
    Boolean(bool),
    Number(f64),
    String(String),
}

/// A literal token
#[derive(Debug, Clone, PartialEq)]
pub struct Terminator {
    pub value: Literal,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
    Length,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableField {
    /// `{ v }`, keyed by its 1-based position among positional items
    Positional(Expression),
    /// `{ name = v }`
    Named { name: Name, value: Expression },
    /// `{ [k] = v }`
    Indexed { key: Expression, value: Expression },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDefine {
    pub fields: Vec<TableField>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallKind {
    /// `f(args)`
    Normal { caller: Expression },
    /// `obj:method(args)`
    Method { object: Expression, method: Name },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncCall {
    pub kind: CallKind,
    pub args: ExpressionList,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Terminator(Terminator),
    Name(Name),
    Function(Box<FunctionBody>),
    Table(TableDefine),
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
        line: u32,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
        line: u32,
    },
    /// `object[key]`
    Index {
        object: Box<Expression>,
        key: Box<Expression>,
        line: u32,
    },
    /// `object.member`
    Member {
        object: Box<Expression>,
        member: Name,
    },
    Call(Box<FuncCall>),
}

impl Expression {
    /// Source line used when emitting instructions for this expression
    pub fn line(&self) -> u32 {
        match self {
            Expression::Terminator(t) => t.line,
            Expression::Name(n) => n.line,
            Expression::Function(body) => body.line,
            Expression::Table(t) => t.line,
            Expression::Binary { line, .. }
            | Expression::Unary { line, .. }
            | Expression::Index { line, .. } => *line,
            Expression::Member { member, .. } => member.line,
            Expression::Call(call) => call.line,
        }
    }

    pub fn number(value: f64, line: u32) -> Self {
        Expression::Terminator(Terminator {
            value: Literal::Number(value),
            line,
        })
    }

    pub fn string(value: impl Into<String>, line: u32) -> Self {
        Expression::Terminator(Terminator {
            value: Literal::String(value.into()),
            line,
        })
    }

    pub fn name(name: impl Into<String>, line: u32) -> Self {
        Expression::Name(Name::new(name, line))
    }
}
