//! # lambda-pipe
//!
//! An interactive shell for transforming ad hoc lists of values with
//! short lambda expressions.
//!
//! The user loads a comma-separated list of literals, then applies
//! commands such as `filter`, `select`, `orderby` and `groupby`. Each
//! command takes a single-parameter lambda (`x => (int)x > 10`) and
//! replaces the current result. Every change is undoable.
//!
//! ## Overview
//!
//! - **Values**: dynamically-typed items ([`Value`]) with numeric coercion
//! - **Expressions**: a small lambda language compiled by [`compile`]
//! - **Commands**: line parsing in [`dsl`], execution in [`Executor`]
//! - **History**: the [`Pipeline`] keeps undo and redo stacks
//!
//! ## Example
//!
//! ```
//! use lambda_pipe::{Executor, Pipeline, Value, parse_command};
//!
//! let data = vec![Value::Int(5), Value::Int(12), Value::Int(20)];
//! let mut pipeline = Pipeline::new(data);
//! let executor = Executor::new(".");
//!
//! let command = parse_command("filter x => (int)x > 10").unwrap();
//! executor.execute(&mut pipeline, command).unwrap();
//! assert_eq!(pipeline.current(), &[Value::Int(12), Value::Int(20)]);
//!
//! pipeline.undo();
//! assert_eq!(pipeline.current().len(), 3);
//! ```

pub mod aggregate;
pub mod config;
pub mod dsl;
pub mod error;
pub mod executor;
pub mod export;
pub mod expr;
pub mod help;
pub mod ingest;
pub mod pipeline;
pub mod render;
pub mod repl;
pub mod value;

pub use aggregate::Aggregate;
pub use config::Config;
pub use dsl::{Command, parse_command};
pub use error::ShellError;
pub use executor::{Change, Executor, Outcome};
pub use export::ExportFormat;
pub use expr::{CompileError, Lambda, ResultKind, compile};
pub use pipeline::Pipeline;
pub use repl::{Flow, Shell, run};
pub use value::{Record, Value};
