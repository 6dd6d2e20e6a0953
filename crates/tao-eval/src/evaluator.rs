//! Core expression evaluator.

use crate::callable::{Builtin, Callable, Closure};
use crate::config::{ArityPolicy, EvalConfig};
use crate::context::Context;
use crate::error::{EvalError, EvalResult};
use crate::value::{Array, Object, Value};
use std::rc::Rc;
use tao_types::ast::*;

/// Grow the native stack when less than this remains.
pub(crate) const RED_ZONE: usize = 100 * 1024;

/// Stack space added per growth.
pub(crate) const STACK_PER_RECURSION: usize = 1024 * 1024;

/// The tree-walking interpreter: walks syntax nodes against [`Context`]s
/// and produces [`Value`]s.
///
/// Scopes are released when a call, block or loop finishes, including
/// scopes kept alive only by function values bound inside them. A function
/// stored in an object or array that lives in the function's own scope is
/// not detected and stays allocated until the host drops every handle to it.
pub struct Interpreter {
    /// The global scope. Builtins are installed here.
    globals: Context,
    config: EvalConfig,
    /// Current number of nested calls.
    depth: usize,
    /// Steps consumed so far, checked against `config.step_limit`.
    steps: u64,
}

impl Interpreter {
    /// Create an interpreter with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EvalConfig::default())
    }

    /// Create an interpreter with explicit limits and policies.
    pub fn with_config(config: EvalConfig) -> Self {
        Self {
            globals: Context::new(),
            config,
            depth: 0,
            steps: 0,
        }
    }

    /// The global scope shared by every run.
    pub fn globals(&self) -> &Context {
        &self.globals
    }

    /// Steps consumed since construction.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Install a native function into the global scope.
    pub fn define_builtin(
        &mut self,
        name: &str,
        func: impl Fn(&mut Interpreter, Vec<Value>) -> EvalResult<Value> + 'static,
    ) {
        self.globals
            .define(name, Value::Builtin(Builtin::new(name, func)));
    }

    /// Consume one step. Returns an error once the budget is spent.
    pub(crate) fn tick(&mut self) -> EvalResult<()> {
        self.steps += 1;
        match self.config.step_limit {
            Some(limit) if self.steps > limit => {
                Err(EvalError::exhausted(format!("step limit exceeded ({limit})")))
            }
            _ => Ok(()),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expression evaluation
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate an expression in the global scope.
    pub fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        let globals = self.globals.clone();
        self.eval_expr(expr, &globals)
    }

    /// Evaluate an expression to a Value.
    pub fn eval_expr(&mut self, expr: &Expr, ctx: &Context) -> EvalResult<Value> {
        stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || {
            self.tick()?;
            self.eval_kind(&expr.kind, ctx)
        })
        .map_err(|e| e.at(expr.span))
    }

    fn eval_kind(&mut self, kind: &ExprKind, ctx: &Context) -> EvalResult<Value> {
        match kind {
            ExprKind::NilLit => Ok(Value::Nil),
            ExprKind::BoolLit(b) => Ok(Value::Boolean(*b)),
            ExprKind::NumberLit(n) => Ok(Value::Number(*n)),
            ExprKind::StringLit(s) => Ok(Value::String(s.clone())),
            ExprKind::ObjectLit(props) => self.eval_object_literal(props, ctx),
            ExprKind::ArrayLit(elems) => self.eval_array_literal(elems, ctx),
            ExprKind::Function(func) => Ok(self.eval_function(func, ctx)),

            ExprKind::Identifier(name) => {
                ctx.lookup(name).ok_or_else(|| EvalError::undefined(name))
            }
            ExprKind::Call { callee, args } => self.eval_call(callee, args, ctx),
            ExprKind::Index { object, key } => self.eval_index(object, key, ctx),
            ExprKind::New { .. } => Err(EvalError::generic("new() is not supported")),

            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand, ctx),
            ExprKind::Increment {
                op,
                prefix,
                operand,
            } => self.eval_increment(*op, *prefix, operand, ctx),
            ExprKind::Binary { left, op, right } => self.eval_binary(left, *op, right, ctx),
            ExprKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                if self.eval_expr(condition, ctx)?.truth() {
                    self.eval_expr(then_expr, ctx)
                } else {
                    self.eval_expr(else_expr, ctx)
                }
            }
            ExprKind::Assign { target, value } => {
                let value = self.eval_expr(value, ctx)?;
                self.assign(target, value.clone(), ctx)?;
                Ok(value)
            }

            ExprKind::Paren(inner) => self.eval_expr(inner, ctx),
        }
    }

    // ── Literals ──────────────────────────────────────────────────────────

    fn eval_object_literal(&mut self, props: &[Property], ctx: &Context) -> EvalResult<Value> {
        let obj = Object::new();
        for prop in props {
            let value = self.eval_expr(&prop.value, ctx)?;
            obj.set(prop.key.clone(), value);
        }
        Ok(Value::Object(obj))
    }

    fn eval_array_literal(&mut self, elems: &[Expr], ctx: &Context) -> EvalResult<Value> {
        let mut values = Vec::with_capacity(elems.len());
        for elem in elems {
            values.push(self.eval_expr(elem, ctx)?);
        }
        Ok(Value::Array(Array::from_vec(values)))
    }

    /// Create a function value closing over `ctx`. A named literal also
    /// binds its own name in `ctx`.
    pub(crate) fn eval_function(&mut self, func: &Rc<FunctionExpr>, ctx: &Context) -> Value {
        let value = Value::Function(Rc::new(Closure::new(Rc::clone(func), ctx.clone())));
        if let Some(name) = &func.name {
            ctx.define(name.name.clone(), value.clone());
        }
        value
    }

    // ── Assignment ───────────────────────────────────────────────────────

    /// Write `value` through the assignment path of `target`.
    pub fn assign(&mut self, target: &Expr, value: Value, ctx: &Context) -> EvalResult<()> {
        let result = match &target.kind {
            ExprKind::Identifier(name) => {
                if ctx.assign(name, value) {
                    Ok(())
                } else {
                    Err(EvalError::undefined(name))
                }
            }
            ExprKind::Index { object, key } => self.assign_index(object, key, value, ctx),
            ExprKind::Paren(inner) => self.assign(inner, value, ctx),
            _ => {
                let shown = self.eval_expr(target, ctx)?;
                Err(EvalError::not_assignable(&shown))
            }
        };
        result.map_err(|e| e.at(target.span))
    }

    fn assign_index(
        &mut self,
        object: &Expr,
        key: &Expr,
        value: Value,
        ctx: &Context,
    ) -> EvalResult<()> {
        let target = self.eval_expr(object, ctx)?;
        if !matches!(target, Value::Object(_) | Value::Array(_)) {
            return Err(EvalError::not_assignable(&target));
        }
        let key = self.eval_expr(key, ctx)?;
        match (&target, &key) {
            (Value::Object(obj), Value::String(k)) => {
                obj.set(k.clone(), value);
                Ok(())
            }
            (Value::Array(arr), Value::Number(i)) => arr.set(*i, value),
            _ => Err(key_type_error(&key)),
        }
    }

    // ── Calls & Indexing ─────────────────────────────────────────────────

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], ctx: &Context) -> EvalResult<Value> {
        let mut target = self.eval_expr(callee, ctx)?;
        if let Value::Variable(_) = target {
            target = target.resolve(ctx)?;
        }
        if !target.is_callable() {
            return Err(EvalError::not_callable(&target));
        }

        let mut arg_vals = Vec::with_capacity(args.len());
        for arg in args {
            arg_vals.push(self.eval_expr(arg, ctx)?);
        }
        self.invoke(&target, arg_vals)
    }

    /// Call a function or builtin value from host code.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> EvalResult<Value> {
        if !callee.is_callable() {
            return Err(EvalError::not_callable(callee));
        }
        self.invoke(callee, args)
    }

    /// Execute `callee` against a fresh, parentless scope.
    fn invoke(&mut self, callee: &Value, args: Vec<Value>) -> EvalResult<Value> {
        if self.depth >= self.config.max_call_depth {
            return Err(EvalError::exhausted(format!(
                "maximum call depth exceeded ({})",
                self.config.max_call_depth
            )));
        }
        tracing::debug!(callee = %callee, args = args.len(), depth = self.depth, "call");

        let frame = Context::new();
        self.depth += 1;
        let result = match callee {
            Value::Function(closure) => closure.execute(self, &frame, args),
            Value::Builtin(builtin) => builtin.execute(self, &frame, args),
            other => Err(EvalError::not_callable(other)),
        };
        self.depth -= 1;
        frame.reclaim();
        result
    }

    /// Bind call arguments to the closure's parameters in `ctx`, following
    /// the configured arity policy.
    pub(crate) fn bind_arguments(
        &self,
        closure: &Closure,
        ctx: &Context,
        args: Vec<Value>,
    ) -> EvalResult<()> {
        let params = &closure.literal().params;
        if self.config.arity == ArityPolicy::Strict && params.len() != args.len() {
            return Err(EvalError::type_error(format!(
                "{closure} expects {} arguments, got {}",
                params.len(),
                args.len()
            )));
        }
        let mut args = args.into_iter();
        for param in params {
            ctx.define(param.name.clone(), args.next().unwrap_or(Value::Nil));
        }
        Ok(())
    }

    fn eval_index(&mut self, object: &Expr, key: &Expr, ctx: &Context) -> EvalResult<Value> {
        let target = self.eval_expr(object, ctx)?;
        let key = self.eval_expr(key, ctx)?;
        match (&target, &key) {
            (Value::Object(obj), Value::String(k)) => Ok(obj.get(k)),
            (Value::Array(arr), Value::Number(i)) => arr.get(*i),
            _ => Err(key_type_error(&key)),
        }
    }

    // ── Operators ────────────────────────────────────────────────────────

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr, ctx: &Context) -> EvalResult<Value> {
        let value = self.eval_expr(operand, ctx)?;
        match op {
            UnaryOp::Not => Ok(Value::Boolean(!value.truth())),
            UnaryOp::Plus => numeric_operand(op, &value).map(Value::Number),
            UnaryOp::Neg => numeric_operand(op, &value).map(|n| Value::Number(n.wrapping_neg())),
            UnaryOp::BitNot => numeric_operand(op, &value).map(|n| Value::Number(!n)),
        }
    }

    fn eval_increment(
        &mut self,
        op: IncrementOp,
        prefix: bool,
        operand: &Expr,
        ctx: &Context,
    ) -> EvalResult<Value> {
        let old = self.eval_expr(operand, ctx)?;
        let Value::Number(n) = old else {
            return Err(EvalError::not_assignable(&old));
        };
        let new = match op {
            IncrementOp::Increment => n.wrapping_add(1),
            IncrementOp::Decrement => n.wrapping_sub(1),
        };
        self.assign(operand, Value::Number(new), ctx)?;
        Ok(Value::Number(if prefix { new } else { n }))
    }

    fn eval_binary(
        &mut self,
        left: &Expr,
        op: BinOp,
        right: &Expr,
        ctx: &Context,
    ) -> EvalResult<Value> {
        // Logical operators short-circuit and never reach the kind table.
        match op {
            BinOp::And => {
                if !self.eval_expr(left, ctx)?.truth() {
                    return Ok(Value::Boolean(false));
                }
                let rv = self.eval_expr(right, ctx)?;
                return Ok(Value::Boolean(rv.truth()));
            }
            BinOp::Or => {
                let lv = self.eval_expr(left, ctx)?;
                if lv.truth() {
                    return Ok(lv);
                }
                return self.eval_expr(right, ctx);
            }
            _ => {}
        }

        let lv = self.eval_expr(left, ctx)?;
        let rv = self.eval_expr(right, ctx)?;
        apply_binary(op, &lv, &rv)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        self.globals.reclaim();
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Operator tables
// ══════════════════════════════════════════════════════════════════════════

fn numeric_operand(op: UnaryOp, value: &Value) -> EvalResult<i64> {
    value
        .as_number()
        .ok_or_else(|| EvalError::type_error(format!("{}value is invalid", op.as_str())))
}

fn key_type_error(key: &Value) -> EvalError {
    EvalError::type_error(format!(
        "cannot use `{key}' (type: {}) as key",
        key.type_name()
    ))
}

fn unknown_operator() -> EvalError {
    EvalError::syntax("unknown binary operator and operands")
}

/// Dispatch a non-logical binary operator on two evaluated operands.
pub(crate) fn apply_binary(op: BinOp, lv: &Value, rv: &Value) -> EvalResult<Value> {
    match (lv, rv) {
        (Value::Nil, Value::Nil) => match op {
            BinOp::Eq => Ok(Value::Boolean(true)),
            BinOp::NotEq => Ok(Value::Boolean(false)),
            _ => Err(unknown_operator()),
        },
        (Value::Boolean(a), Value::Boolean(b)) => match op {
            BinOp::Eq => Ok(Value::Boolean(a == b)),
            BinOp::NotEq => Ok(Value::Boolean(a != b)),
            _ => Err(unknown_operator()),
        },
        (Value::Number(a), Value::Number(b)) => number_op(op, *a, *b),
        (Value::String(a), Value::String(b)) => match op {
            BinOp::Add => Ok(Value::String(format!("{a}{b}"))),
            BinOp::Eq => Ok(Value::Boolean(a == b)),
            BinOp::NotEq => Ok(Value::Boolean(a != b)),
            _ => Err(EvalError::syntax("not supported operator on two strings")),
        },
        (Value::Builtin(a), Value::Builtin(b)) => match op {
            BinOp::Eq => Ok(Value::Boolean(a.ptr_eq(b))),
            BinOp::NotEq => Ok(Value::Boolean(!a.ptr_eq(b))),
            _ => Err(EvalError::syntax("not supported operator on two builtins")),
        },
        _ => Err(unknown_operator()),
    }
}

fn number_op(op: BinOp, a: i64, b: i64) -> EvalResult<Value> {
    let n = match op {
        BinOp::Add => a.wrapping_add(b),
        BinOp::Sub => a.wrapping_sub(b),
        BinOp::Mul => a.wrapping_mul(b),
        BinOp::Div => {
            if b == 0 {
                return Err(EvalError::type_error("divide by zero"));
            }
            a.wrapping_div(b)
        }
        BinOp::Rem => {
            if b == 0 {
                return Err(EvalError::type_error("modulo by zero"));
            }
            a.wrapping_rem(b)
        }
        BinOp::Pow => checked_exponent(b).map(|e| wrapping_pow(a, e))?,
        BinOp::Shl => shift_left(a, b),
        BinOp::Shr => shift_right(a, b),
        BinOp::BitAnd => a & b,
        BinOp::BitOr => a | b,
        BinOp::BitXor => a ^ b,
        BinOp::BitAndNot => a & !b,
        BinOp::Eq => return Ok(Value::Boolean(a == b)),
        BinOp::NotEq => return Ok(Value::Boolean(a != b)),
        BinOp::Less => return Ok(Value::Boolean(a < b)),
        BinOp::LessEq => return Ok(Value::Boolean(a <= b)),
        BinOp::Greater => return Ok(Value::Boolean(a > b)),
        BinOp::GreaterEq => return Ok(Value::Boolean(a >= b)),
        BinOp::And | BinOp::Or => return Err(unknown_operator()),
    };
    Ok(Value::Number(n))
}

fn checked_exponent(exp: i64) -> EvalResult<u64> {
    u64::try_from(exp).map_err(|_| EvalError::type_error("negative exponent"))
}

/// Exponentiation by squaring with two's-complement wraparound.
fn wrapping_pow(mut base: i64, mut exp: u64) -> i64 {
    let mut acc: i64 = 1;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = acc.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exp >>= 1;
    }
    acc
}

// The shift count is the right operand reinterpreted as unsigned.
fn shift_left(a: i64, b: i64) -> i64 {
    let count = b as u64;
    if count >= 64 {
        0
    } else {
        a << count
    }
}

fn shift_right(a: i64, b: i64) -> i64 {
    let count = b as u64;
    if count >= 64 {
        if a < 0 {
            -1
        } else {
            0
        }
    } else {
        a >> count
    }
}
