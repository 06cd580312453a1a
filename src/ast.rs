//! The AST contract the compiler consumes (spec.md §6/§4.4). The lexer and
//! parser that would produce this tree from source text are out of scope
//! (spec.md §1); this module defines the closed node-kind set plus small
//! builder functions so host programs and this crate's own tests can
//! construct a tree directly. Every node derives `serde::{Serialize,
//! Deserialize}` so an external front-end (or `bin/phpv.rs`'s `-f`/`-r`
//! flags) can hand this crate a tree as JSON without this crate needing to
//! own a text parser.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

impl Position {
    pub fn at_line(line: u32) -> Self {
        Position { line, column: 0, offset: 0 }
    }
}

/// A literal scalar, as it appears in the constant pool before compilation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    BwAnd,
    BwOr,
    BwXor,
    Shl,
    Shr,
    Eq,
    NotEq,
    Identical,
    NotIdentical,
    Lt,
    Lte,
    Gt,
    Gte,
    Spaceship,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
    BwNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ConcatAssign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MagicConstant {
    File,
    Line,
    Dir,
    Function,
    Class,
    Method,
    Namespace,
}

/// Expression nodes leave exactly one value on the conceptual compiler
/// stack (spec.md §4.4's lowering contract), except `Assign` family nodes
/// which may be configured to discard their result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    Variable(String),
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Assign { op: AssignOp, target: Box<Expr>, value: Box<Expr> },
    AssignRef { target: Box<Expr>, value: Box<Expr> },
    Ternary { cond: Box<Expr>, then: Option<Box<Expr>>, otherwise: Box<Expr> },
    Coalesce { left: Box<Expr>, right: Box<Expr> },
    Call { callee: String, args: Vec<Arg> },
    MethodCall { target: Box<Expr>, method: String, args: Vec<Arg> },
    StaticCall { class: String, method: String, args: Vec<Arg> },
    PropertyAccess { target: Box<Expr>, property: String },
    StaticPropertyAccess { class: String, property: String },
    ArrayAccess { target: Box<Expr>, index: Option<Box<Expr>> },
    New { class: String, args: Vec<Arg> },
    Cast { target_type: String, operand: Box<Expr> },
    Closure { params: Vec<Param>, uses: Vec<(String, bool)>, body: Vec<Stmt> },
    ArrowFunction { params: Vec<Param>, body: Box<Expr> },
    Match { subject: Box<Expr>, arms: Vec<(Vec<Expr>, Expr)>, default: Option<Box<Expr>> },
    ArrayLiteral(Vec<(Option<Expr>, Expr)>),
    InterpolatedString(Vec<Expr>),
    ListPattern(Vec<Option<Expr>>),
    MagicConstant(MagicConstant),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arg {
    pub value: Expr,
    pub spread: bool,
}

impl Arg {
    pub fn new(value: Expr) -> Self {
        Arg { value, spread: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub by_reference: bool,
    pub default: Option<Expr>,
    pub variadic: bool,
}

impl Param {
    pub fn new(name: impl Into<String>) -> Self {
        Param { name: name.into(), by_reference: false, default: None, variadic: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatchClause {
    pub types: Vec<String>,
    pub var: Option<String>,
    pub body: Vec<Stmt>,
}

/// Statement nodes append instructions to the current block and leave
/// nothing on the conceptual stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    Expression(Expr),
    Echo(Vec<Expr>),
    Print(Expr),
    If { cond: Expr, then: Vec<Stmt>, elifs: Vec<(Expr, Vec<Stmt>)>, otherwise: Vec<Stmt> },
    While { cond: Expr, body: Vec<Stmt> },
    DoWhile { body: Vec<Stmt>, cond: Expr },
    For { init: Vec<Expr>, cond: Vec<Expr>, step: Vec<Expr>, body: Vec<Stmt> },
    Foreach { subject: Expr, key_var: Option<String>, value_var: String, by_ref: bool, body: Vec<Stmt> },
    Switch { subject: Expr, cases: Vec<(Option<Expr>, Vec<Stmt>)> },
    Try { body: Vec<Stmt>, catches: Vec<CatchClause>, finally: Vec<Stmt> },
    FunctionDecl { name: String, params: Vec<Param>, body: Vec<Stmt>, by_ref: bool },
    ClassDecl {
        name: String,
        parent: Option<String>,
        interfaces: Vec<String>,
        traits: Vec<String>,
        properties: Vec<(String, Option<Expr>, bool)>,
        methods: Vec<(String, Vec<Param>, Vec<Stmt>, bool)>,
        is_abstract: bool,
        is_final: bool,
    },
    InterfaceDecl { name: String, methods: Vec<String>, parents: Vec<String> },
    TraitDecl { name: String, methods: Vec<(String, Vec<Param>, Vec<Stmt>)> },
    Return(Option<Expr>),
    Break(u32),
    Continue(u32),
    Throw(Expr),
    Include { path: Expr, once: bool, required: bool },
    Global(Vec<String>),
    Block(Vec<Stmt>),
}

/// Convenience constructors used by this crate's own integration tests
/// (`tests/`) to build small programs without a textual front-end.
impl Expr {
    pub fn int(v: i64) -> Expr {
        Expr::Literal(Literal::Int(v))
    }
    pub fn float(v: f64) -> Expr {
        Expr::Literal(Literal::Float(v))
    }
    pub fn string(v: impl Into<String>) -> Expr {
        Expr::Literal(Literal::String(v.into()))
    }
    pub fn bool(v: bool) -> Expr {
        Expr::Literal(Literal::Bool(v))
    }
    pub fn null() -> Expr {
        Expr::Literal(Literal::Null)
    }
    pub fn var(name: impl Into<String>) -> Expr {
        Expr::Variable(name.into())
    }
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
    }
    pub fn assign(target: Expr, value: Expr) -> Expr {
        Expr::Assign { op: AssignOp::Assign, target: Box::new(target), value: Box::new(value) }
    }
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::Call { callee: name.into(), args: args.into_iter().map(Arg::new).collect() }
    }
}
