//! Applies parsed commands to a [`Pipeline`].
//!
//! Mutating commands compile their lambda, build the complete next
//! sequence, and only then hand it to [`Pipeline::update_result`]. Any
//! compile or evaluation failure returns early, so history is untouched.
//! Reporting commands read the current sequence and never change it.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::aggregate::{self, Groups};
use crate::dsl::Command;
use crate::error::ShellError;
use crate::export::{self, Exported};
use crate::expr::{self, EvalError, Lambda, ResultKind};
use crate::pipeline::Pipeline;
use crate::value::Value;

/// What changed the current sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Applied,
    Undone,
    Redone,
    Reset,
}

/// Result of a successful command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The current sequence changed.
    Updated(Change),
    /// A single item (`first`, `last`, `min`, `max`).
    Item(Value),
    /// A numeric summary (`sum`, `avg`).
    Number(f64),
    Bool(bool),
    Count(usize),
    Exported(Exported),
    /// Nothing happened; tell the user why.
    Unchanged(&'static str),
    Help,
    Exit,
}

/// Command context for error reporting.
struct Site {
    command: &'static str,
    example: &'static str,
}

impl Site {
    fn of(command: &Command) -> Self {
        Self {
            command: command.name(),
            example: command.example(),
        }
    }

    fn compile(&self, text: &str, kind: ResultKind) -> Result<Lambda, ShellError> {
        expr::compile(text, kind).map_err(|e| ShellError::compile(self.command, self.example, e))
    }

    fn compile_opt(
        &self,
        text: Option<&str>,
        kind: ResultKind,
    ) -> Result<Option<Lambda>, ShellError> {
        text.map(|t| self.compile(t, kind)).transpose()
    }

    fn runtime(&self, err: EvalError) -> ShellError {
        ShellError::runtime(self.command, self.example, err)
    }
}

/// Runs commands against a pipeline.
#[derive(Debug, Clone)]
pub struct Executor {
    export_dir: PathBuf,
}

impl Executor {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
        }
    }

    pub fn execute(&self, pipeline: &mut Pipeline, command: Command) -> Result<Outcome, ShellError> {
        let site = Site::of(&command);
        debug!(command = site.command, "executing");
        let items = pipeline.current();

        let outcome = match command {
            Command::Filter { lambda } => {
                let predicate = site.compile(&lambda, ResultKind::Boolean)?;
                let next = filter(items, &predicate).map_err(|e| site.runtime(e))?;
                apply(pipeline, next)
            }
            Command::Select { lambda } => {
                let projection = site.compile(&lambda, ResultKind::Any)?;
                let next = select(items, &projection).map_err(|e| site.runtime(e))?;
                apply(pipeline, next)
            }
            Command::OrderBy { lambda, descending } => {
                let key = site.compile(&lambda, ResultKind::Any)?;
                let next = order_by(items, &key, descending).map_err(|e| site.runtime(e))?;
                apply(pipeline, next)
            }
            Command::GroupBy { key, aggregate } => {
                let key = site.compile(&key, ResultKind::Any)?;
                let groups = group_by(items, &key).map_err(|e| site.runtime(e))?;
                debug!(groups = groups.len(), aggregate = aggregate.field_name(), "grouped");
                apply(pipeline, groups.aggregate(aggregate))
            }
            Command::Take { n } => {
                let next = items.iter().take(n).cloned().collect();
                apply(pipeline, next)
            }
            Command::Skip { n } => {
                let next = items.iter().skip(n).cloned().collect();
                apply(pipeline, next)
            }
            Command::Distinct => {
                let next = distinct(items);
                apply(pipeline, next)
            }
            Command::Any { lambda } => {
                let result = match site.compile_opt(lambda.as_deref(), ResultKind::Boolean)? {
                    Some(predicate) => any(items, &predicate).map_err(|e| site.runtime(e))?,
                    None => !items.is_empty(),
                };
                Outcome::Bool(result)
            }
            Command::All { lambda } => {
                let result = match site.compile_opt(lambda.as_deref(), ResultKind::Boolean)? {
                    Some(predicate) => all(items, &predicate).map_err(|e| site.runtime(e))?,
                    // Without a predicate only an empty sequence is vacuously true
                    None => items.is_empty(),
                };
                Outcome::Bool(result)
            }
            Command::Count { lambda } => {
                let count = match site.compile_opt(lambda.as_deref(), ResultKind::Boolean)? {
                    Some(predicate) => filter(items, &predicate)
                        .map_err(|e| site.runtime(e))?
                        .len(),
                    None => items.len(),
                };
                Outcome::Count(count)
            }
            Command::Sum => Outcome::Number(aggregate::sum(items)),
            Command::Average => Outcome::Number(aggregate::average(items)),
            Command::Min => Outcome::Item(aggregate::min(items)),
            Command::Max => Outcome::Item(aggregate::max(items)),
            Command::First { lambda } => {
                let found = match site.compile_opt(lambda.as_deref(), ResultKind::Boolean)? {
                    Some(predicate) => {
                        find(items.iter(), &predicate).map_err(|e| site.runtime(e))?
                    }
                    None => items.first().cloned(),
                };
                Outcome::Item(found.unwrap_or(Value::Null))
            }
            Command::Last { lambda } => {
                let found = match site.compile_opt(lambda.as_deref(), ResultKind::Boolean)? {
                    Some(predicate) => {
                        find(items.iter().rev(), &predicate).map_err(|e| site.runtime(e))?
                    }
                    None => items.last().cloned(),
                };
                Outcome::Item(found.unwrap_or(Value::Null))
            }
            Command::Undo => {
                if pipeline.undo() {
                    info!(undo_depth = pipeline.undo_depth(), "undone");
                    Outcome::Updated(Change::Undone)
                } else {
                    Outcome::Unchanged("Nothing to undo.")
                }
            }
            Command::Redo => {
                if pipeline.redo() {
                    info!(redo_depth = pipeline.redo_depth(), "redone");
                    Outcome::Updated(Change::Redone)
                } else {
                    Outcome::Unchanged("Nothing to redo.")
                }
            }
            Command::Reset => {
                pipeline.reset();
                info!(items = pipeline.current().len(), "reset to original data");
                Outcome::Updated(Change::Reset)
            }
            Command::Export { format } => {
                Outcome::Exported(export::export(items, format, &self.export_dir)?)
            }
            Command::Help => Outcome::Help,
            Command::Exit => Outcome::Exit,
        };
        Ok(outcome)
    }
}

fn apply(pipeline: &mut Pipeline, next: Vec<Value>) -> Outcome {
    pipeline.update_result(next);
    Outcome::Updated(Change::Applied)
}

fn filter(items: &[Value], predicate: &Lambda) -> Result<Vec<Value>, EvalError> {
    let mut kept = Vec::new();
    for item in items {
        if predicate.test(item)? {
            kept.push(item.clone());
        }
    }
    Ok(kept)
}

fn select(items: &[Value], projection: &Lambda) -> Result<Vec<Value>, EvalError> {
    items.iter().map(|item| projection.call(item)).collect()
}

/// Stable sort by key; equal keys keep their current relative order in
/// both directions.
fn order_by(items: &[Value], key: &Lambda, descending: bool) -> Result<Vec<Value>, EvalError> {
    let mut keyed = items
        .iter()
        .map(|item| Ok((key.call(item)?, item.clone())))
        .collect::<Result<Vec<_>, EvalError>>()?;
    if descending {
        keyed.sort_by(|a, b| b.0.compare(&a.0));
    } else {
        keyed.sort_by(|a, b| a.0.compare(&b.0));
    }
    Ok(keyed.into_iter().map(|(_, item)| item).collect())
}

fn group_by(items: &[Value], key: &Lambda) -> Result<Groups, EvalError> {
    let mut groups = Groups::new();
    for item in items {
        groups.insert(key.call(item)?, item.clone());
    }
    Ok(groups)
}

fn distinct(items: &[Value]) -> Vec<Value> {
    let mut seen: Vec<Value> = Vec::new();
    for item in items {
        if !seen.contains(item) {
            seen.push(item.clone());
        }
    }
    seen
}

fn any(items: &[Value], predicate: &Lambda) -> Result<bool, EvalError> {
    for item in items {
        if predicate.test(item)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn all(items: &[Value], predicate: &Lambda) -> Result<bool, EvalError> {
    for item in items {
        if !predicate.test(item)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn find<'a>(
    items: impl Iterator<Item = &'a Value>,
    predicate: &Lambda,
) -> Result<Option<Value>, EvalError> {
    for item in items {
        if predicate.test(item)? {
            return Ok(Some(item.clone()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregate;
    use crate::dsl::parse_command;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().copied().map(Value::Int).collect()
    }

    fn run(pipeline: &mut Pipeline, line: &str) -> Result<Outcome, ShellError> {
        let command = parse_command(line)?;
        Executor::new(".").execute(pipeline, command)
    }

    #[test]
    fn test_filter_updates_history() {
        let mut pipeline = Pipeline::new(ints(&[5, 12, 20, 3]));
        let outcome = run(&mut pipeline, "filter x => (int)x > 10").unwrap();
        assert_eq!(outcome, Outcome::Updated(Change::Applied));
        assert_eq!(pipeline.current(), ints(&[12, 20]).as_slice());
        assert_eq!(pipeline.undo_depth(), 1);
    }

    #[test]
    fn test_select_projects_records() {
        let mut pipeline = Pipeline::new(ints(&[2]));
        run(&mut pipeline, "select x => new { Value = x, Double = (int)x * 2 }").unwrap();
        assert_eq!(
            pipeline.current()[0].to_string(),
            "{ Value = 2, Double = 4 }"
        );
    }

    #[test]
    fn test_compile_error_leaves_history() {
        let mut pipeline = Pipeline::new(ints(&[1, 2]));
        let err = run(&mut pipeline, "filter x => y > 1").unwrap_err();
        assert!(matches!(err, ShellError::Compile { command: "filter", .. }));
        assert_eq!(pipeline.undo_depth(), 0);
        assert_eq!(pipeline.current(), ints(&[1, 2]).as_slice());
    }

    #[test]
    fn test_runtime_error_leaves_history() {
        let mut pipeline = Pipeline::new(vec![Value::Int(1), Value::from("apple")]);
        let err = run(&mut pipeline, "select x => (int)x * 2").unwrap_err();
        assert!(matches!(err, ShellError::Runtime { command: "select", .. }));
        assert_eq!(pipeline.undo_depth(), 0);
    }

    #[test]
    fn test_security_error_never_transforms() {
        let mut pipeline = Pipeline::new(ints(&[1]));
        let err = run(&mut pipeline, "filter x => File.Exists(\"x\")").unwrap_err();
        assert!(matches!(err, ShellError::Security { pattern: "File." }));
        assert_eq!(pipeline.undo_depth(), 0);
    }

    #[test]
    fn test_order_by_is_stable() {
        let records: Vec<Value> = [("b", 1), ("a", 2), ("c", 1), ("d", 2)]
            .iter()
            .map(|(name, rank)| {
                Value::Record(
                    crate::value::Record::new()
                        .with_field("Name", Value::from(*name))
                        .with_field("Rank", Value::Int(*rank)),
                )
            })
            .collect();
        let names = |p: &Pipeline| -> Vec<String> {
            p.current()
                .iter()
                .map(|v| match v {
                    Value::Record(r) => r.get("Name").map(Value::to_text).unwrap_or_default(),
                    _ => String::new(),
                })
                .collect()
        };

        let mut pipeline = Pipeline::new(records);
        run(&mut pipeline, "orderby r => r.Rank").unwrap();
        assert_eq!(names(&pipeline), ["b", "c", "a", "d"]);
        run(&mut pipeline, "orderby r => r.Rank desc").unwrap();
        assert_eq!(names(&pipeline), ["a", "d", "b", "c"]);
    }

    #[test]
    fn test_order_by_identity() {
        let mut pipeline = Pipeline::new(ints(&[3, 1, 2]));
        run(&mut pipeline, "sort").unwrap();
        assert_eq!(pipeline.current(), ints(&[1, 2, 3]).as_slice());
        run(&mut pipeline, "sort desc").unwrap();
        assert_eq!(pipeline.current(), ints(&[3, 2, 1]).as_slice());
    }

    #[test]
    fn test_group_by_count() {
        let mut pipeline = Pipeline::new(ints(&[1, 2, 3, 4, 5]));
        run(&mut pipeline, "groupby x => (int)x % 2 count").unwrap();
        let rendered: Vec<String> = pipeline.current().iter().map(Value::to_string).collect();
        assert_eq!(
            rendered,
            ["{ Key = 1, Count = 3 }", "{ Key = 0, Count = 2 }"]
        );
    }

    #[test]
    fn test_group_by_default_items() {
        let mut pipeline = Pipeline::new(ints(&[1, 2, 3]));
        let command = Command::GroupBy {
            key: "x => (int)x > 1".to_string(),
            aggregate: Aggregate::Items,
        };
        Executor::new(".").execute(&mut pipeline, command).unwrap();
        assert_eq!(
            pipeline.current()[1].to_string(),
            "{ Key = true, Items = [2, 3] }"
        );
    }

    #[test]
    fn test_take_skip_distinct() {
        let mut pipeline = Pipeline::new(ints(&[1, 1, 2, 3]));
        run(&mut pipeline, "distinct").unwrap();
        assert_eq!(pipeline.current(), ints(&[1, 2, 3]).as_slice());
        run(&mut pipeline, "skip 1").unwrap();
        assert_eq!(pipeline.current(), ints(&[2, 3]).as_slice());
        run(&mut pipeline, "take 0").unwrap();
        assert!(pipeline.current().is_empty());
    }

    #[test]
    fn test_skip_past_end() {
        let mut pipeline = Pipeline::new(ints(&[1, 2]));
        run(&mut pipeline, "skip 5").unwrap();
        assert!(pipeline.current().is_empty());
    }

    #[test]
    fn test_reporting_commands_keep_history() {
        let mut pipeline = Pipeline::new(ints(&[1, 2, 3]));
        assert_eq!(run(&mut pipeline, "any x => (int)x > 2").unwrap(), Outcome::Bool(true));
        assert_eq!(run(&mut pipeline, "all x => (int)x > 2").unwrap(), Outcome::Bool(false));
        assert_eq!(run(&mut pipeline, "count x => (int)x > 1").unwrap(), Outcome::Count(2));
        assert_eq!(run(&mut pipeline, "count").unwrap(), Outcome::Count(3));
        assert_eq!(run(&mut pipeline, "sum").unwrap(), Outcome::Number(6.0));
        assert_eq!(run(&mut pipeline, "first x => (int)x > 1").unwrap(), Outcome::Item(Value::Int(2)));
        assert_eq!(run(&mut pipeline, "last x => (int)x < 3").unwrap(), Outcome::Item(Value::Int(2)));
        assert_eq!(run(&mut pipeline, "last").unwrap(), Outcome::Item(Value::Int(3)));
        assert_eq!(pipeline.undo_depth(), 0);
    }

    #[test]
    fn test_any_all_on_empty() {
        let mut pipeline = Pipeline::new(Vec::new());
        assert_eq!(run(&mut pipeline, "any").unwrap(), Outcome::Bool(false));
        assert_eq!(run(&mut pipeline, "all").unwrap(), Outcome::Bool(true));
        assert_eq!(run(&mut pipeline, "all x => (int)x > 0").unwrap(), Outcome::Bool(true));
        assert_eq!(run(&mut pipeline, "first").unwrap(), Outcome::Item(Value::Null));
        assert_eq!(run(&mut pipeline, "min").unwrap(), Outcome::Item(Value::Null));
    }

    #[test]
    fn test_first_without_match_is_null() {
        let mut pipeline = Pipeline::new(ints(&[1]));
        assert_eq!(
            run(&mut pipeline, "first x => (int)x > 5").unwrap(),
            Outcome::Item(Value::Null)
        );
    }

    #[test]
    fn test_undo_redo_reset() {
        let mut pipeline = Pipeline::new(ints(&[1, 2, 3]));
        assert_eq!(run(&mut pipeline, "undo").unwrap(), Outcome::Unchanged("Nothing to undo."));
        assert_eq!(run(&mut pipeline, "redo").unwrap(), Outcome::Unchanged("Nothing to redo."));

        run(&mut pipeline, "take 1").unwrap();
        assert_eq!(run(&mut pipeline, "undo").unwrap(), Outcome::Updated(Change::Undone));
        assert_eq!(pipeline.current(), ints(&[1, 2, 3]).as_slice());
        assert_eq!(run(&mut pipeline, "redo").unwrap(), Outcome::Updated(Change::Redone));
        assert_eq!(pipeline.current(), ints(&[1]).as_slice());
        assert_eq!(run(&mut pipeline, "reset").unwrap(), Outcome::Updated(Change::Reset));
        assert_eq!(pipeline.current(), ints(&[1, 2, 3]).as_slice());
    }
}
