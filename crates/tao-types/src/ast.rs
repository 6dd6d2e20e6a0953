//! Syntax tree node types for the tao language.
//!
//! The parser builds this tree once; the evaluator walks it repeatedly.
//! Every node carries a [`Span`] for error reporting. Function literals are
//! held behind [`Rc`] so that runtime function values can reference the
//! literal they were created from without copying it.

use crate::Span;
use std::rc::Rc;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete program: a sequence of top-level statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

impl Program {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self {
            stmts,
            span: Span::default(),
        }
    }
}

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

impl From<&str> for Ident {
    fn from(name: &str) -> Self {
        Ident::new(name, Span::default())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `;`
    Empty(Span),
    /// `let name = expr;` or `let name;`
    Let(LetStmt),
    /// `function name(params) { body }`
    Function(FunctionStmt),
    /// `return expr;` or `return;`
    Return(ReturnStmt),
    /// `{ stmts... }`
    Block(Block),
    /// A bare expression; its value is discarded.
    Expr(ExprStmt),
    /// `for init; cond; update { body }`, every header part optional.
    For(ForStmt),
    /// `break;`
    Break(Span),
    /// `if cond stmt [else stmt]`
    If(IfStmt),
    /// `switch subject { case expr: ... default: ... }`
    Switch(SwitchStmt),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Empty(span) | Stmt::Break(span) => *span,
            Stmt::Let(s) => s.span,
            Stmt::Function(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Block(s) => s.span,
            Stmt::Expr(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::Switch(s) => s.span,
        }
    }

    pub fn expr(expr: Expr) -> Self {
        let span = expr.span;
        Stmt::Expr(ExprStmt { expr, span })
    }

    pub fn let_(name: &str, value: Expr) -> Self {
        Stmt::Let(LetStmt {
            name: name.into(),
            value: Some(value),
            span: Span::default(),
        })
    }

    pub fn return_(value: Option<Expr>) -> Self {
        Stmt::Return(ReturnStmt {
            value,
            span: Span::default(),
        })
    }

    pub fn block(stmts: Vec<Stmt>) -> Self {
        Stmt::Block(Block::new(stmts))
    }

    pub fn break_() -> Self {
        Stmt::Break(Span::default())
    }
}

/// `let name = expr;`
#[derive(Debug, Clone, PartialEq)]
pub struct LetStmt {
    pub name: Ident,
    /// `None` for `let name;`, which binds nil.
    pub value: Option<Expr>,
    pub span: Span,
}

/// `function name(params) { body }`, which binds `name` in the current scope.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionStmt {
    pub func: Rc<FunctionExpr>,
    pub span: Span,
}

/// `return [expr];`
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

/// `{ statements... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self {
            stmts,
            span: Span::default(),
        }
    }
}

/// A bare expression statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

/// `for init; condition; update { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    /// Absent condition loops until `break` or `return`.
    pub condition: Option<Expr>,
    pub update: Option<Expr>,
    pub body: Block,
    pub span: Span,
}

/// `if condition then_branch [else else_branch]`
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

/// `switch subject { cases... }`
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    pub subject: Expr,
    pub cases: Vec<SwitchCase>,
    pub span: Span,
}

/// `case test: body` or, with no test, `default: body`.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Wrap a kind with a synthetic span.
    pub fn synthetic(kind: ExprKind) -> Self {
        Self::new(kind, Span::default())
    }

    pub fn nil() -> Self {
        Self::synthetic(ExprKind::NilLit)
    }

    pub fn bool(b: bool) -> Self {
        Self::synthetic(ExprKind::BoolLit(b))
    }

    pub fn number(n: i64) -> Self {
        Self::synthetic(ExprKind::NumberLit(n))
    }

    pub fn string(s: &str) -> Self {
        Self::synthetic(ExprKind::StringLit(s.to_string()))
    }

    pub fn ident(name: &str) -> Self {
        Self::synthetic(ExprKind::Identifier(name.to_string()))
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::synthetic(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn binary(left: Expr, op: BinOp, right: Expr) -> Self {
        Self::synthetic(ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::synthetic(ExprKind::Assign {
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Self::synthetic(ExprKind::Call {
            callee: Box::new(callee),
            args,
        })
    }

    pub fn index(object: Expr, key: Expr) -> Self {
        Self::synthetic(ExprKind::Index {
            object: Box::new(object),
            key: Box::new(key),
        })
    }

    pub fn function(name: Option<&str>, params: &[&str], body: Vec<Stmt>) -> Self {
        Self::synthetic(ExprKind::Function(Rc::new(FunctionExpr::new(
            name, params, body,
        ))))
    }
}

/// The kind of expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // ── Literals ──
    /// `nil`
    NilLit,
    /// `true` / `false`
    BoolLit(bool),
    /// `42`
    NumberLit(i64),
    /// `"hello"`
    StringLit(String),
    /// `{ key: expr, ... }`, in source order.
    ObjectLit(Vec<Property>),
    /// `[expr, ...]`
    ArrayLit(Vec<Expr>),
    /// `function [name](params) { body }`
    Function(Rc<FunctionExpr>),

    // ── Names & Access ──
    /// `my_var`
    Identifier(String),
    /// `callee(args...)`
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// `object[key]`, and `object.key` with a string key.
    Index { object: Box<Expr>, key: Box<Expr> },
    /// `new Type(args...)`
    New { type_name: Ident, args: Vec<Expr> },

    // ── Operators ──
    /// `!x`, `+x`, `-x`, `^x`
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// `++x`, `x++`, `--x`, `x--`
    Increment {
        op: IncrementOp,
        prefix: bool,
        operand: Box<Expr>,
    },
    /// `a + b`, `a && b`, etc.
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// `condition ? then_expr : else_expr`
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    /// `target = value`
    Assign { target: Box<Expr>, value: Box<Expr> },

    // ── Grouping ──
    /// `(expr)`
    Paren(Box<Expr>),
}

/// A property in an object literal: `key: value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: String,
    pub value: Expr,
    pub span: Span,
}

impl Property {
    pub fn new(key: &str, value: Expr) -> Self {
        Self {
            key: key.to_string(),
            value,
            span: Span::default(),
        }
    }
}

/// A function literal. Shared by every function value created from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpr {
    /// Named literals bind their own name in the defining scope.
    pub name: Option<Ident>,
    pub params: Vec<Ident>,
    pub body: Block,
    pub span: Span,
}

impl FunctionExpr {
    pub fn new(name: Option<&str>, params: &[&str], body: Vec<Stmt>) -> Self {
        Self {
            name: name.map(Ident::from),
            params: params.iter().map(|p| Ident::from(*p)).collect(),
            body: Block::new(body),
            span: Span::default(),
        }
    }
}

// ── Operators ─────────────────────────────────────────────────────────────────

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Logical
    Or,
    And,
    // Comparison
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    // Bitwise
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    BitAndNot,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!x`
    Not,
    /// `+x`
    Plus,
    /// `-x`
    Neg,
    /// `^x`, bitwise complement
    BitNot,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
            UnaryOp::BitNot => "^",
        }
    }
}

/// `++` / `--`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementOp {
    Increment,
    Decrement,
}
