//! Interactive lambda pipeline shell.
//!
//! Usage:
//!   lambda-pipe
//!   lambda-pipe --data "1, 2, 3, \"four\""
//!   lambda-pipe --export-dir out --history ~/.lambda-pipe-history

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use lambda_pipe::Config;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Load a list of values, then filter, project, sort and group it with
/// lambda expressions.
#[derive(Parser)]
#[command(name = "lambda-pipe", version)]
struct Cli {
    /// Initial comma-separated data; skips the data prompt
    #[arg(short, long)]
    data: Option<String>,

    /// Directory export files are written to
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,

    /// Line-editor history file
    #[arg(long)]
    history: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long)]
    no_color: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut config = Config::default()
        .with_export_dir(cli.export_dir)
        .with_color(!cli.no_color && std::io::stdout().is_terminal());
    if let Some(path) = cli.history {
        config = config.with_history(path);
    }
    if let Some(data) = cli.data {
        config = config.with_data(data);
    }

    match lambda_pipe::run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}
