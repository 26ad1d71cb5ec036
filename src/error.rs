//! Command-level errors.
//!
//! Every failed command maps onto one [`ShellError`] variant. None of them
//! touch the pipeline: a failed command leaves the current sequence and
//! history exactly as they were.

use std::io;

use thiserror::Error;

use crate::expr::{CompileError, Diagnostic, EvalError};

#[derive(Debug, Error)]
pub enum ShellError {
    /// Unparseable line or missing/invalid argument. Shown as a warning.
    #[error("{0}")]
    Format(String),

    #[error("security validation failed: expression contains potentially dangerous code: {pattern}")]
    Security { pattern: &'static str },

    #[error("compilation error in {command}")]
    Compile {
        command: &'static str,
        diagnostics: Vec<Diagnostic>,
        example: &'static str,
    },

    #[error("error in {command}: {message}")]
    Runtime {
        command: &'static str,
        message: String,
        example: &'static str,
    },

    #[error("export failed: {0}")]
    Export(#[from] io::Error),
}

impl ShellError {
    pub fn format(message: impl Into<String>) -> Self {
        ShellError::Format(message.into())
    }

    /// Attach command context to an expression compile failure.
    pub fn compile(command: &'static str, example: &'static str, err: CompileError) -> Self {
        match err {
            CompileError::Security { pattern } => ShellError::Security { pattern },
            CompileError::Invalid { diagnostics } => ShellError::Compile {
                command,
                diagnostics,
                example,
            },
        }
    }

    /// Attach command context to an evaluation failure.
    pub fn runtime(command: &'static str, example: &'static str, err: EvalError) -> Self {
        ShellError::Runtime {
            command,
            message: err.to_string(),
            example,
        }
    }
}
