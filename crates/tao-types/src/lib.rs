//! Shared types for the tao evaluator.
//!
//! This crate defines the syntax tree node types and source spans that
//! form the contract between a parser and the evaluator.

mod span;
pub mod ast;

pub use span::Span;
