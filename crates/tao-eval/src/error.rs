//! Runtime error types for the tao evaluator.

use serde::Serialize;
use std::fmt;
use tao_types::Span;
use thiserror::Error;

/// The class of a runtime error. Every error is fatal to the current
/// evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Operator/operand combination with no defined semantics.
    Syntax,
    /// Operand kind incompatible with the operation, divide by zero, bad key.
    Type,
    /// The target of an assignment cannot receive a value.
    NotAssignable,
    /// The callee of a call is not a function or builtin.
    NotCallable,
    /// Name bound nowhere in the scope chain.
    Reference,
    /// Array index outside `0..len`.
    Range,
    /// Call depth or step budget exhausted.
    ResourceExhausted,
    /// Reserved constructs and internal contract violations.
    Generic,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Type => "TypeError",
            ErrorKind::NotAssignable => "NotAssignableError",
            ErrorKind::NotCallable => "NotCallableError",
            ErrorKind::Reference => "ReferenceError",
            ErrorKind::Range => "RangeError",
            ErrorKind::ResourceExhausted => "ResourceExhausted",
            ErrorKind::Generic => "Error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured evaluation error.
///
/// `span` is the innermost node that raised the error, when it came from
/// parsed source.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{kind}: {message}{}", location(.span))]
pub struct EvalError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

fn location(span: &Option<Span>) -> String {
    match span {
        Some(span) => format!(" at {span}"),
        None => String::new(),
    }
}

impl EvalError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span: None,
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    /// "`<value>' is not assignable"
    pub fn not_assignable(value: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::NotAssignable,
            format!("`{value}' is not assignable"),
        )
    }

    /// "`<value>' is not callable"
    pub fn not_callable(value: impl fmt::Display) -> Self {
        Self::new(ErrorKind::NotCallable, format!("`{value}' is not callable"))
    }

    pub fn undefined(name: &str) -> Self {
        Self::new(ErrorKind::Reference, format!("{name} is not defined"))
    }

    pub fn out_of_range(index: i64, len: usize) -> Self {
        Self::new(
            ErrorKind::Range,
            format!("index {index} out of range (len {len})"),
        )
    }

    pub fn exhausted(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ResourceExhausted, message)
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Generic, message)
    }

    /// Attach a location unless a more specific one is already recorded.
    /// Synthetic spans are never attached.
    pub fn at(mut self, span: Span) -> Self {
        if self.span.is_none() && !span.is_synthetic() {
            self.span = Some(span);
        }
        self
    }
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_without_span() {
        let err = EvalError::type_error("divide by zero");
        assert_eq!(err.to_string(), "TypeError: divide by zero");
    }

    #[test]
    fn display_with_span() {
        let err = EvalError::not_callable("42").at(Span::new(3, 7, 3, 12));
        assert_eq!(err.to_string(), "NotCallableError: `42' is not callable at 3:7");
    }

    #[test]
    fn innermost_span_wins() {
        let inner = Span::point(2, 4);
        let outer = Span::point(1, 1);
        let err = EvalError::syntax("x").at(inner).at(outer);
        assert_eq!(err.span, Some(inner));
    }

    #[test]
    fn synthetic_span_is_not_recorded() {
        let err = EvalError::generic("new() is not supported").at(Span::default());
        assert_eq!(err.span, None);
    }

    #[test]
    fn serializes_kind_in_snake_case() {
        let err = EvalError::not_assignable("nil");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "not_assignable", "message": "`nil' is not assignable"})
        );
    }
}
