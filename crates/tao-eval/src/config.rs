//! Evaluator configuration.

use crate::error::{EvalError, EvalResult};
use serde::{Deserialize, Serialize};

/// Default limit on nested function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1024;

/// How arguments are bound when a call's argument count differs from the
/// function's parameter count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArityPolicy {
    /// Missing parameters bind nil; excess arguments are dropped.
    #[default]
    Lenient,
    /// Any mismatch is a TypeError.
    Strict,
}

/// Limits and policies for one [`Interpreter`](crate::Interpreter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Nested calls beyond this depth fail with ResourceExhausted.
    pub max_call_depth: usize,
    /// Total expression/statement steps allowed; `None` is unlimited.
    pub step_limit: Option<u64>,
    pub arity: ArityPolicy,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            step_limit: None,
            arity: ArityPolicy::default(),
        }
    }
}

impl EvalConfig {
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn with_arity(mut self, arity: ArityPolicy) -> Self {
        self.arity = arity;
        self
    }

    /// Parse a host-supplied JSON config. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> EvalResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| EvalError::generic(format!("invalid evaluator config: {e}")))
    }
}
