//! Tree-building helpers shared by the integration tests.
//!
//! The parser is not part of this workspace, so tests assemble syntax trees
//! directly. Every node gets a synthetic span.

#![allow(dead_code)]

use std::rc::Rc;
use tao_eval::{EvalConfig, EvalError, EvalResult, Interpreter, Value};
use tao_types::ast::*;
use tao_types::Span;

// ══════════════════════════════════════════════════════════════════════════════
// Running
// ══════════════════════════════════════════════════════════════════════════════

pub fn run_in(interp: &mut Interpreter, stmts: Vec<Stmt>) -> EvalResult<Value> {
    interp.run(&Program::new(stmts))
}

pub fn run(stmts: Vec<Stmt>) -> EvalResult<Value> {
    run_in(&mut Interpreter::new(), stmts)
}

pub fn run_with(config: EvalConfig, stmts: Vec<Stmt>) -> EvalResult<Value> {
    run_in(&mut Interpreter::with_config(config), stmts)
}

/// Run and panic on evaluation errors.
pub fn run_ok(stmts: Vec<Stmt>) -> Value {
    run(stmts).unwrap_or_else(|e| panic!("evaluation failed: {e}"))
}

/// Run and panic unless evaluation fails.
pub fn run_err(stmts: Vec<Stmt>) -> EvalError {
    match run(stmts) {
        Ok(v) => panic!("expected an error, got {v:?}"),
        Err(e) => e,
    }
}

/// Read a global binding after a run.
pub fn global(interp: &Interpreter, name: &str) -> Value {
    interp
        .globals()
        .lookup(name)
        .unwrap_or_else(|| panic!("{name} is not bound"))
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

pub fn num(n: i64) -> Expr {
    Expr::number(n)
}

pub fn st(s: &str) -> Expr {
    Expr::string(s)
}

pub fn var(name: &str) -> Expr {
    Expr::ident(name)
}

pub fn nil() -> Expr {
    Expr::nil()
}

pub fn boolean(b: bool) -> Expr {
    Expr::bool(b)
}

pub fn bin(left: Expr, op: BinOp, right: Expr) -> Expr {
    Expr::binary(left, op, right)
}

pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
    Expr::unary(op, operand)
}

pub fn paren(inner: Expr) -> Expr {
    Expr::synthetic(ExprKind::Paren(Box::new(inner)))
}

/// `name = value`, parenthesised so it can sit inside other expressions.
pub fn set(name: &str, value: Expr) -> Expr {
    paren(Expr::assign(var(name), value))
}

pub fn assign(target: Expr, value: Expr) -> Expr {
    Expr::assign(target, value)
}

pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
    Expr::call(callee, args)
}

pub fn index(object: Expr, key: Expr) -> Expr {
    Expr::index(object, key)
}

pub fn func(params: &[&str], body: Vec<Stmt>) -> Expr {
    Expr::function(None, params, body)
}

pub fn named_func(name: &str, params: &[&str], body: Vec<Stmt>) -> Expr {
    Expr::function(Some(name), params, body)
}

pub fn obj(props: Vec<(&str, Expr)>) -> Expr {
    Expr::synthetic(ExprKind::ObjectLit(
        props
            .into_iter()
            .map(|(k, v)| Property::new(k, v))
            .collect(),
    ))
}

pub fn arr(items: Vec<Expr>) -> Expr {
    Expr::synthetic(ExprKind::ArrayLit(items))
}

pub fn ternary(condition: Expr, then_expr: Expr, else_expr: Expr) -> Expr {
    Expr::synthetic(ExprKind::Ternary {
        condition: Box::new(condition),
        then_expr: Box::new(then_expr),
        else_expr: Box::new(else_expr),
    })
}

fn step(op: IncrementOp, prefix: bool, operand: Expr) -> Expr {
    Expr::synthetic(ExprKind::Increment {
        op,
        prefix,
        operand: Box::new(operand),
    })
}

/// `operand++`
pub fn post_inc(operand: Expr) -> Expr {
    step(IncrementOp::Increment, false, operand)
}

/// `++operand`
pub fn pre_inc(operand: Expr) -> Expr {
    step(IncrementOp::Increment, true, operand)
}

/// `operand--`
pub fn post_dec(operand: Expr) -> Expr {
    step(IncrementOp::Decrement, false, operand)
}

/// `--operand`
pub fn pre_dec(operand: Expr) -> Expr {
    step(IncrementOp::Decrement, true, operand)
}

pub fn new_expr(type_name: &str, args: Vec<Expr>) -> Expr {
    Expr::synthetic(ExprKind::New {
        type_name: type_name.into(),
        args,
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

pub fn let_(name: &str, value: Expr) -> Stmt {
    Stmt::let_(name, value)
}

pub fn declare(name: &str) -> Stmt {
    Stmt::Let(LetStmt {
        name: name.into(),
        value: None,
        span: Span::default(),
    })
}

pub fn expr(e: Expr) -> Stmt {
    Stmt::expr(e)
}

pub fn ret(value: Expr) -> Stmt {
    Stmt::return_(Some(value))
}

pub fn ret_nothing() -> Stmt {
    Stmt::return_(None)
}

pub fn brk() -> Stmt {
    Stmt::break_()
}

pub fn block(stmts: Vec<Stmt>) -> Stmt {
    Stmt::block(stmts)
}

pub fn function_stmt(name: &str, params: &[&str], body: Vec<Stmt>) -> Stmt {
    Stmt::Function(FunctionStmt {
        func: Rc::new(FunctionExpr::new(Some(name), params, body)),
        span: Span::default(),
    })
}

pub fn if_(condition: Expr, then_branch: Vec<Stmt>, else_branch: Option<Stmt>) -> Stmt {
    Stmt::If(IfStmt {
        condition,
        then_branch: Box::new(block(then_branch)),
        else_branch: else_branch.map(Box::new),
        span: Span::default(),
    })
}

pub fn for_(
    init: Option<Stmt>,
    condition: Option<Expr>,
    update: Option<Expr>,
    body: Vec<Stmt>,
) -> Stmt {
    Stmt::For(ForStmt {
        init: init.map(Box::new),
        condition,
        update,
        body: Block::new(body),
        span: Span::default(),
    })
}

/// `case test: body`, or `default: body` when `test` is `None`.
pub fn case(test: Option<Expr>, body: Vec<Stmt>) -> SwitchCase {
    SwitchCase {
        test,
        body,
        span: Span::default(),
    }
}

pub fn switch(subject: Expr, cases: Vec<SwitchCase>) -> Stmt {
    Stmt::Switch(SwitchStmt {
        subject,
        cases,
        span: Span::default(),
    })
}
