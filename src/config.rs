//! Shell configuration.

use std::io::IsTerminal;
use std::path::PathBuf;

/// Settings for one interactive session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory export files are written to.
    pub export_dir: PathBuf,
    /// Line-editor history file, if any.
    pub history: Option<PathBuf>,
    /// Emit ANSI colour codes.
    pub color: bool,
    /// Initial data line; skips the data prompt when it yields values.
    pub data: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("."),
            history: None,
            color: std::io::stdout().is_terminal(),
            data: None,
        }
    }
}

impl Config {
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn with_history(mut self, path: impl Into<PathBuf>) -> Self {
        self.history = Some(path.into());
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }
}
