//! tao tree-walking evaluator.
//!
//! Executes tao programs directly from the syntax tree built by an external
//! parser. The core pieces are [`Value`], the lexical scope [`Context`], the
//! expression evaluator and statement executor on [`Interpreter`], and the
//! [`Callable`] protocol shared by script functions and host builtins.

mod callable;
mod config;
mod context;
mod error;
mod evaluator;
mod statement;
mod value;

pub use callable::{Builtin, Callable, Closure, NativeFn};
pub use config::{ArityPolicy, EvalConfig, DEFAULT_MAX_CALL_DEPTH};
pub use context::Context;
pub use error::{ErrorKind, EvalError, EvalResult};
pub use evaluator::Interpreter;
pub use statement::Flow;
pub use value::{Array, Object, Value, MAX_RENDER_DEPTH};
