//! Interactive session: data prompt, then the command loop.
//!
//! [`Shell`] holds all session state and handles one line at a time, so it
//! can be driven by the line editor in [`run`] or directly by tests.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use tracing::{debug, warn};

use crate::config::Config;
use crate::dsl;
use crate::executor::{Change, Executor, Outcome};
use crate::ingest;
use crate::pipeline::Pipeline;
use crate::render::Console;

pub const COMMAND_PROMPT: &str = "λ> ";
pub const DATA_PROMPT: &str = "> ";

/// Whether the session goes on after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// One interactive session writing to `W`.
pub struct Shell<W: Write> {
    console: Console<W>,
    executor: Executor,
    /// `None` until data has been loaded.
    pipeline: Option<Pipeline>,
}

impl<W: Write> Shell<W> {
    pub fn new(config: &Config, out: W) -> Self {
        Self {
            console: Console::new(out, config.color),
            executor: Executor::new(config.export_dir.clone()),
            pipeline: None,
        }
    }

    pub fn pipeline(&self) -> Option<&Pipeline> {
        self.pipeline.as_ref()
    }

    pub fn awaiting_data(&self) -> bool {
        self.pipeline.is_none()
    }

    pub fn prompt(&self) -> &'static str {
        if self.awaiting_data() {
            DATA_PROMPT
        } else {
            COMMAND_PROMPT
        }
    }

    pub fn output(&self) -> &W {
        self.console.get_ref()
    }

    pub fn output_mut(&mut self) -> &mut W {
        self.console.get_mut()
    }

    pub fn greet(&mut self) -> io::Result<()> {
        self.console
            .title(&format!("Lambda Pipe v{}", env!("CARGO_PKG_VERSION")))
    }

    pub fn ask_for_data(&mut self) -> io::Result<()> {
        self.console
            .line("Enter a list of values separated by commas (or 'exit' to quit):")?;
        self.console.flush()
    }

    pub fn farewell(&mut self) -> io::Result<()> {
        self.console.info("Goodbye!")?;
        self.console.flush()
    }

    /// Handle one line of input.
    ///
    /// Only I/O failures on the output are errors; command failures are
    /// reported to the user and the session continues.
    pub fn process_line(&mut self, line: &str) -> io::Result<Flow> {
        let line = line.trim();
        let Some(pipeline) = self.pipeline.as_mut() else {
            return self.load_data(line);
        };
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        let result =
            dsl::parse_command(line).and_then(|command| self.executor.execute(pipeline, command));
        let flow = match result {
            Ok(outcome) => self.show(outcome)?,
            Err(err) => {
                debug!(line, error = %err, "command failed");
                self.console.report(&err)?;
                Flow::Continue
            }
        };
        self.console.flush()?;
        Ok(flow)
    }

    fn load_data(&mut self, line: &str) -> io::Result<Flow> {
        if line.is_empty() {
            self.console
                .warning("Please enter some data or 'exit' to quit.")?;
            return Ok(Flow::Continue);
        }
        if line.eq_ignore_ascii_case("exit") {
            return Ok(Flow::Exit);
        }

        let values = ingest::parse_input(line);
        if values.is_empty() {
            self.console.warning("No valid data found. Please try again.")?;
            return Ok(Flow::Continue);
        }

        debug!(items = values.len(), "loaded data");
        self.console
            .success(&format!("Loaded {} items successfully.", values.len()))?;
        self.console.sequence(&values)?;
        self.pipeline = Some(Pipeline::new(values));
        self.console
            .info("Type 'help' for available commands or 'exit' to quit.")?;
        self.console.flush()?;
        Ok(Flow::Continue)
    }

    fn show(&mut self, outcome: Outcome) -> io::Result<Flow> {
        match outcome {
            Outcome::Updated(change) => {
                match change {
                    Change::Applied => {}
                    Change::Undone => self.console.info("Undone.")?,
                    Change::Redone => self.console.info("Redone.")?,
                    Change::Reset => self.console.info("Reset to original data.")?,
                }
                let current = self.pipeline.as_ref().map(Pipeline::current).unwrap_or(&[]);
                self.console.sequence(current)?;
            }
            Outcome::Item(value) => self.console.result(&value.to_string())?,
            Outcome::Number(n) => self.console.result(&format!("{n:.2}"))?,
            Outcome::Bool(b) => self.console.result(&b.to_string())?,
            Outcome::Count(n) => self.console.result(&n.to_string())?,
            Outcome::Exported(exported) => self.console.exported(&exported)?,
            Outcome::Unchanged(message) => self.console.warning(message)?,
            Outcome::Help => self.console.help()?,
            Outcome::Exit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }
}

fn load_history(rl: &mut Editor<(), DefaultHistory>, path: &Path) {
    if let Err(e) = rl.load_history(path) {
        // A missing file is expected on first run
        let not_found =
            matches!(&e, ReadlineError::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound);
        if !not_found {
            warn!("Failed to load history: {}", e);
        }
    }
}

fn save_history(rl: &mut Editor<(), DefaultHistory>, path: Option<&Path>) {
    let Some(path) = path else {
        return;
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        warn!("Failed to create history directory: {}", e);
    }
    if let Err(e) = rl.save_history(path) {
        warn!("Failed to save history: {}", e);
    }
}

/// Run an interactive session on the terminal.
pub fn run(config: Config) -> Result<()> {
    let mut shell = Shell::new(&config, io::stdout());
    shell.greet().context("Failed to write to stdout")?;

    if let Some(data) = &config.data {
        shell.process_line(data).context("Failed to write to stdout")?;
    }

    let mut rl: Editor<(), DefaultHistory> =
        Editor::new().context("Failed to create line editor")?;
    let history = config.history.as_deref();
    if let Some(path) = history {
        load_history(&mut rl, path);
    }

    loop {
        if shell.awaiting_data() {
            shell.ask_for_data().context("Failed to write to stdout")?;
        }

        match rl.readline(shell.prompt()) {
            Ok(line) => {
                if !line.trim().is_empty()
                    && let Err(e) = rl.add_history_entry(line.as_str())
                {
                    warn!("Failed to add history entry: {}", e);
                }
                let flow = shell
                    .process_line(&line)
                    .context("Failed to write to stdout")?;
                if flow == Flow::Exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                save_history(&mut rl, history);
                return Err(err).context("Failed to read input");
            }
        }
    }

    save_history(&mut rl, history);
    shell.farewell().context("Failed to write to stdout")?;
    Ok(())
}
