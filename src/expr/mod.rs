//! Lambda expressions: `param => body`.
//!
//! [`compile`] turns user text into a [`Lambda`] in four steps: a
//! case-insensitive denylist scan, a check for the `=>` arrow, parsing,
//! and a static type check. Only then is the lambda handed out; applying
//! it to values happens in [`eval`].

pub mod ast;
mod check;
pub mod eval;
pub mod lexer;
pub mod parser;

use std::fmt;

use thiserror::Error;
use tracing::debug;

pub use eval::EvalError;

use crate::value::Value;
use ast::LambdaExpr;

/// Substrings that reject an expression outright.
pub const DENYLIST: &[&str] = &[
    "System.IO",
    "File.",
    "Directory.",
    "Process.",
    "Assembly.",
    "Reflection.",
    "Environment.",
];

/// What a lambda must produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// Predicates (`filter`, `any`, `all`, ...).
    ///
    /// A body that can never be boolean (`x => 1`) is rejected at compile
    /// time. A body depending on the dynamically-typed parameter (`x => x`)
    /// is checked per item and fails with [`EvalError::NotBool`].
    Boolean,
    /// Projections and keys.
    Any,
}

/// One compiler message, positioned by 1-based column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub column: usize,
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic at a byte offset into the expression.
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            column: offset + 1,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(1,{}): error: {}", self.column, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("expression contains potentially dangerous code: {pattern}")]
    Security { pattern: &'static str },

    #[error("invalid expression ({count} diagnostic(s))", count = .diagnostics.len())]
    Invalid { diagnostics: Vec<Diagnostic> },
}

/// A compiled lambda, ready to apply.
#[derive(Debug, Clone)]
pub struct Lambda {
    source: String,
    expr: LambdaExpr,
    kind: ResultKind,
}

impl Lambda {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    pub fn call(&self, arg: &Value) -> Result<Value, EvalError> {
        eval::evaluate(&self.expr, arg)
    }

    /// Apply as a predicate.
    pub fn test(&self, arg: &Value) -> Result<bool, EvalError> {
        match self.call(arg)? {
            Value::Bool(b) => Ok(b),
            other => Err(EvalError::NotBool(other.kind_name())),
        }
    }
}

/// First denylisted pattern contained in `source`, ignoring case.
pub fn find_denied(source: &str) -> Option<&'static str> {
    let lowered = source.to_lowercase();
    DENYLIST
        .iter()
        .copied()
        .find(|pattern| lowered.contains(&pattern.to_lowercase()))
}

/// Compile lambda text into a callable [`Lambda`].
pub fn compile(source: &str, kind: ResultKind) -> Result<Lambda, CompileError> {
    let source = source.trim();

    if let Some(pattern) = find_denied(source) {
        debug!(expression = source, pattern, "rejected by denylist");
        return Err(CompileError::Security { pattern });
    }

    let invalid = |diagnostics| CompileError::Invalid { diagnostics };
    if source.is_empty() {
        return Err(invalid(vec![Diagnostic::new(0, "expression is empty")]));
    }
    if !source.contains("=>") {
        return Err(invalid(vec![Diagnostic::new(
            0,
            "expected a lambda of the form 'x => expression'",
        )]));
    }

    let expr = parser::parse_lambda(source).map_err(invalid)?;
    check::check(&expr, kind).map_err(invalid)?;

    debug!(expression = source, ?kind, "compiled lambda");
    Ok(Lambda {
        source: source.to_string(),
        expr,
        kind,
    })
}
