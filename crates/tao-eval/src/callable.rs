//! The callable protocol shared by script functions and native builtins.

use crate::context::Context;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::Interpreter;
use crate::statement::Flow;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;
use tao_types::ast::FunctionExpr;

/// Anything the evaluator can invoke with an argument list.
///
/// `ctx` is the fresh, parentless scope created for this invocation.
pub trait Callable {
    fn execute(
        &self,
        interp: &mut Interpreter,
        ctx: &Context,
        args: Vec<Value>,
    ) -> EvalResult<Value>;
}

/// A function literal paired with the scope it was evaluated in.
pub struct Closure {
    func: Rc<FunctionExpr>,
    env: Context,
}

impl Closure {
    pub fn new(func: Rc<FunctionExpr>, env: Context) -> Self {
        Self { func, env }
    }

    pub fn name(&self) -> Option<&str> {
        self.func.name.as_ref().map(|n| n.name.as_str())
    }

    pub fn arity(&self) -> usize {
        self.func.params.len()
    }

    /// The captured defining scope.
    pub fn env(&self) -> &Context {
        &self.env
    }

    pub fn literal(&self) -> &Rc<FunctionExpr> {
        &self.func
    }
}

impl Callable for Closure {
    fn execute(
        &self,
        interp: &mut Interpreter,
        ctx: &Context,
        args: Vec<Value>,
    ) -> EvalResult<Value> {
        ctx.set_parent(&self.env);
        interp.bind_arguments(self, ctx, args)?;
        match interp.exec_stmts(&self.func.body.stmts, ctx)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
            Flow::Break => Err(EvalError::generic("break outside of loop or switch")),
        }
    }
}

impl fmt::Display for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "<function {name}>"),
            None => f.write_str("<function>"),
        }
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .finish()
    }
}

/// Native function signature.
pub type NativeFn = dyn Fn(&mut Interpreter, Vec<Value>) -> EvalResult<Value>;

/// A host-provided native callable. Equality is identity of the native
/// function, so clones of one builtin compare equal.
#[derive(Clone)]
pub struct Builtin {
    name: Rc<str>,
    func: Rc<NativeFn>,
}

impl Builtin {
    pub fn new(
        name: &str,
        func: impl Fn(&mut Interpreter, Vec<Value>) -> EvalResult<Value> + 'static,
    ) -> Self {
        Self {
            name: Rc::from(name),
            func: Rc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ptr_eq(&self, other: &Builtin) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl Callable for Builtin {
    fn execute(
        &self,
        interp: &mut Interpreter,
        _ctx: &Context,
        args: Vec<Value>,
    ) -> EvalResult<Value> {
        (self.func)(interp, args)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}
