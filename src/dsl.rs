//! Command-line parsing for the interactive shell.
//!
//! Line format:
//! ```text
//! <command> [arguments]
//! ```
//!
//! The command name is the first whitespace-delimited word, matched
//! case-insensitively; everything after it is the argument text. Most
//! arguments are a lambda such as `x => (int)x > 10`. Two commands carry
//! a trailing modifier:
//!
//! - `orderby <lambda> [desc]` - descending when the text ends in ` desc`
//! - `groupby <lambda> [aggregate]` - `count`, `sum`, `avg`, `min`, `max`
//!   or `items` (the default)
//!
//! Supported commands:
//! - `filter`/`where <lambda>` - Keep items matching a predicate
//! - `select <lambda>` - Project each item
//! - `orderby`/`sort [lambda] [desc]` - Stable sort by key
//! - `groupby`/`group <lambda> [aggregate]` - Group, then aggregate
//! - `take <n>` / `skip <n>` - Keep or drop the first n items
//! - `distinct` - Remove duplicates
//! - `any`/`all`/`count`/`first`/`last [lambda]` - Report without changing
//! - `sum`/`avg`/`average`/`min`/`max` - Numeric summaries
//! - `undo`/`redo`/`reset` - History
//! - `export`/`save [csv|json|txt]` - Write the current result to a file
//! - `help`, `exit`

use crate::aggregate::Aggregate;
use crate::error::ShellError;
use crate::export::ExportFormat;

/// Key selector used when `orderby` is given no lambda.
pub const IDENTITY: &str = "x => x";

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// filter/where <lambda>
    Filter { lambda: String },
    /// select <lambda>
    Select { lambda: String },
    /// orderby/sort [lambda] [desc]
    OrderBy { lambda: String, descending: bool },
    /// groupby/group <lambda> [aggregate]
    GroupBy { key: String, aggregate: Aggregate },
    Take { n: usize },
    Skip { n: usize },
    Distinct,
    Any { lambda: Option<String> },
    All { lambda: Option<String> },
    Count { lambda: Option<String> },
    Sum,
    Average,
    Min,
    Max,
    First { lambda: Option<String> },
    Last { lambda: Option<String> },
    Undo,
    Redo,
    Reset,
    Export { format: ExportFormat },
    Help,
    Exit,
}

impl Command {
    /// Canonical command name for messages.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Filter { .. } => "filter",
            Command::Select { .. } => "select",
            Command::OrderBy { .. } => "orderby",
            Command::GroupBy { .. } => "groupby",
            Command::Take { .. } => "take",
            Command::Skip { .. } => "skip",
            Command::Distinct => "distinct",
            Command::Any { .. } => "any",
            Command::All { .. } => "all",
            Command::Count { .. } => "count",
            Command::Sum => "sum",
            Command::Average => "avg",
            Command::Min => "min",
            Command::Max => "max",
            Command::First { .. } => "first",
            Command::Last { .. } => "last",
            Command::Undo => "undo",
            Command::Redo => "redo",
            Command::Reset => "reset",
            Command::Export { .. } => "export",
            Command::Help => "help",
            Command::Exit => "exit",
        }
    }

    /// Argument example shown after a failed command.
    pub fn example(&self) -> &'static str {
        match self {
            Command::Filter { .. } => "x => (int)x > 10",
            Command::Select { .. } => "x => new { Value = x, Double = ((int)x) * 2 }",
            Command::OrderBy { .. } => "x => x or orderby x => (int)x desc",
            Command::GroupBy { .. } => "x => (int)x % 2 count",
            Command::Take { .. } => "5",
            Command::Skip { .. } => "3",
            Command::Any { .. } => "x => (int)x > 5",
            Command::All { .. } => "x => (int)x > 0",
            Command::Count { .. } => "x => (int)x > 5",
            Command::First { .. } => "x => (int)x > 5",
            Command::Last { .. } => "x => (int)x < 10",
            Command::Export { .. } => "json",
            _ => "",
        }
    }

    /// Does this command replace the current sequence?
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Command::Filter { .. }
                | Command::Select { .. }
                | Command::OrderBy { .. }
                | Command::GroupBy { .. }
                | Command::Take { .. }
                | Command::Skip { .. }
                | Command::Distinct
        )
    }
}

/// Split a line into a lower-cased command name and its argument text.
///
/// A blank line has no command.
pub fn parse(line: &str) -> (Option<String>, String) {
    let line = line.trim();
    if line.is_empty() {
        return (None, String::new());
    }
    match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (Some(name.to_lowercase()), rest.trim_start().to_string()),
        None => (Some(line.to_lowercase()), String::new()),
    }
}

/// Split `orderby` arguments into (lambda, descending).
pub fn parse_order_by(args: &str) -> (String, bool) {
    let args = args.trim();
    if args.is_empty() {
        return (IDENTITY.to_string(), false);
    }
    if args.eq_ignore_ascii_case("desc") {
        return (IDENTITY.to_string(), true);
    }
    let suffix_start = args.len().saturating_sub(5);
    if let Some(suffix) = args.get(suffix_start..)
        && suffix.eq_ignore_ascii_case(" desc")
    {
        return (args[..suffix_start].trim().to_string(), true);
    }
    (args.to_string(), false)
}

/// Split `groupby` arguments into (key lambda, aggregate name).
///
/// The aggregate is an optional trailing word after the key lambda's body.
/// Only a bare word that follows a complete operand at nesting depth zero
/// counts, so `x => (int)x % 2 count` splits while `x => x == true` and
/// `x => Math.Max((int)x, 3)` stay whole.
pub fn parse_group_by(args: &str) -> (Option<String>, String) {
    const DEFAULT: &str = "items";
    let args = args.trim();
    if args.is_empty() {
        return (None, DEFAULT.to_string());
    }

    let words: Vec<&str> = args.split_whitespace().collect();
    if words.len() == 1 {
        return (Some(args.to_string()), DEFAULT.to_string());
    }

    let Some(arrow) = args.rfind("=>") else {
        return (Some(words[0].to_string()), words[words.len() - 1].to_string());
    };

    let body_start = arrow + 2;
    match trailing_word(&args[body_start..]) {
        Some(split) => {
            let split = body_start + split;
            (
                Some(args[..split].trim().to_string()),
                args[split..].trim().to_string(),
            )
        }
        None => (Some(args.to_string()), DEFAULT.to_string()),
    }
}

/// Byte offset of the gap before a trailing aggregate word in a lambda body.
fn trailing_word(body: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut last_gap = None;
    let mut prev = ' ';

    for (i, c) in body.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
        } else {
            match c {
                '"' | '\'' => quote = Some(c),
                '(' | '{' | '[' => depth += 1,
                ')' | '}' | ']' => depth -= 1,
                c if c.is_whitespace() && depth == 0 && !prev.is_whitespace() => {
                    last_gap = Some(i);
                }
                _ => {}
            }
        }
        prev = c;
    }

    let gap = last_gap?;
    let word = body[gap..].trim();
    let before = body[..gap].trim_end().chars().last()?;
    let ends_operand = before.is_alphanumeric() || matches!(before, '_' | ')' | '}' | ']' | '"' | '\'');
    let is_word = !word.is_empty() && word.chars().all(|c| c.is_ascii_alphabetic());
    // Keywords continue an expression rather than end it
    let is_keyword = matches!(word, "true" | "false" | "null" | "new");

    (ends_operand && is_word && !is_keyword && quote.is_none()).then_some(gap)
}

fn required(args: &str, message: &str) -> Result<String, ShellError> {
    if args.is_empty() {
        Err(ShellError::format(message))
    } else {
        Ok(args.to_string())
    }
}

fn optional(args: &str) -> Option<String> {
    (!args.is_empty()).then(|| args.to_string())
}

fn count_arg(args: &str, message: &str) -> Result<usize, ShellError> {
    args.parse().map_err(|_| ShellError::format(message))
}

/// Parse one input line into a [`Command`].
pub fn parse_command(line: &str) -> Result<Command, ShellError> {
    let (name, args) = parse(line);
    let Some(name) = name else {
        return Err(ShellError::format("Invalid command format."));
    };
    let args = args.trim();

    let command = match name.as_str() {
        "filter" | "where" => Command::Filter {
            lambda: required(
                args,
                "Filter requires a lambda expression. Example: filter x => (int)x > 10",
            )?,
        },
        "select" => Command::Select {
            lambda: required(
                args,
                "Select requires a lambda expression. Example: select x => new { Value = x, Square = ((int)x) * ((int)x) }",
            )?,
        },
        "orderby" | "sort" => {
            let (lambda, descending) = parse_order_by(args);
            Command::OrderBy { lambda, descending }
        }
        "groupby" | "group" => {
            let (key, aggregate) = parse_group_by(args);
            let key = key.ok_or_else(|| {
                ShellError::format(
                    "GroupBy requires a key selector. Example: groupby x => (int)x % 2 count",
                )
            })?;
            Command::GroupBy {
                key,
                aggregate: Aggregate::from_name(&aggregate),
            }
        }
        "take" => Command::Take {
            n: count_arg(args, "Take requires a non-negative integer. Example: take 5")?,
        },
        "skip" => Command::Skip {
            n: count_arg(args, "Skip requires a non-negative integer. Example: skip 3")?,
        },
        "distinct" => Command::Distinct,
        "any" => Command::Any {
            lambda: optional(args),
        },
        "all" => Command::All {
            lambda: optional(args),
        },
        "count" => Command::Count {
            lambda: optional(args),
        },
        "sum" => Command::Sum,
        "avg" | "average" => Command::Average,
        "min" => Command::Min,
        "max" => Command::Max,
        "first" => Command::First {
            lambda: optional(args),
        },
        "last" => Command::Last {
            lambda: optional(args),
        },
        "undo" => Command::Undo,
        "redo" => Command::Redo,
        "reset" => Command::Reset,
        "export" | "save" => Command::Export {
            format: ExportFormat::parse(args).ok_or_else(|| {
                ShellError::format(format!(
                    "Unsupported export format: {}. Use csv, json, or txt.",
                    args.to_lowercase()
                ))
            })?,
        },
        "help" => Command::Help,
        "exit" => Command::Exit,
        other => {
            return Err(ShellError::format(format!(
                "Unknown command '{other}'. Type 'help' for available commands."
            )));
        }
    };
    Ok(command)
}
