//! Console output: message prefixes, result blocks and help.

use std::io::{self, Write};

use crate::error::ShellError;
use crate::export::Exported;
use crate::help;
use crate::value::Value;

const RULE_WIDTH: usize = 50;

#[derive(Debug, Clone, Copy)]
enum Color {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Gray,
}

impl Color {
    fn code(self) -> &'static str {
        match self {
            Color::Red => "31",
            Color::Green => "32",
            Color::Yellow => "33",
            Color::Blue => "34",
            Color::Magenta => "35",
            Color::Cyan => "36",
            Color::Gray => "90",
        }
    }
}

/// Writes user-facing output, optionally coloured.
pub struct Console<W: Write> {
    out: W,
    color: bool,
}

impl<W: Write> Console<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn styled(&mut self, color: Color, text: &str) -> io::Result<()> {
        if self.color {
            writeln!(self.out, "\x1b[{}m{text}\x1b[0m", color.code())
        } else {
            writeln!(self.out, "{text}")
        }
    }

    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    pub fn blank(&mut self) -> io::Result<()> {
        writeln!(self.out)
    }

    pub fn title(&mut self, title: &str) -> io::Result<()> {
        self.blank()?;
        self.styled(Color::Cyan, title)?;
        self.styled(Color::Cyan, &"=".repeat(title.chars().count()))
    }

    pub fn success(&mut self, message: &str) -> io::Result<()> {
        self.styled(Color::Green, &format!("✓ {message}"))
    }

    pub fn error(&mut self, message: &str) -> io::Result<()> {
        self.styled(Color::Red, &format!("✗ {message}"))
    }

    pub fn warning(&mut self, message: &str) -> io::Result<()> {
        self.styled(Color::Yellow, &format!("⚠ {message}"))
    }

    pub fn info(&mut self, message: &str) -> io::Result<()> {
        self.styled(Color::Blue, &format!("ℹ {message}"))
    }

    pub fn result(&mut self, message: &str) -> io::Result<()> {
        self.styled(Color::Magenta, &format!("→ {message}"))
    }

    /// Print the whole sequence as a numbered block.
    pub fn sequence(&mut self, items: &[Value]) -> io::Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        self.blank()?;
        self.line(&rule)?;
        self.line("RESULT:")?;
        self.line(&rule)?;

        if items.is_empty() {
            return self.warning("(empty result set)");
        }
        for (i, item) in items.iter().enumerate() {
            writeln!(self.out, "[{i:03}] {item}")?;
        }
        self.line(&rule)?;
        self.info(&format!("Total items: {}", items.len()))
    }

    /// Render a failed command.
    pub fn report(&mut self, err: &ShellError) -> io::Result<()> {
        match err {
            ShellError::Format(message) => self.warning(message),
            ShellError::Security { .. } => self.error(&capitalize(&err.to_string())),
            ShellError::Compile {
                command,
                diagnostics,
                example,
            } => {
                self.error("Compilation error:")?;
                for diagnostic in diagnostics {
                    self.error(&format!("  {diagnostic}"))?;
                }
                self.info(&format!("Example: {command} {example}"))
            }
            ShellError::Runtime {
                command,
                message,
                example,
            } => {
                self.error(&format!("Error in {command}: {message}"))?;
                if example.is_empty() {
                    Ok(())
                } else {
                    self.info(&format!("Example: {command} {example}"))
                }
            }
            ShellError::Export(e) => self.error(&format!("Export failed: {e}")),
        }
    }

    pub fn exported(&mut self, exported: &Exported) -> io::Result<()> {
        self.success(&format!("Exported to {}", exported.path.display()))?;
        if let Some(preview) = &exported.preview {
            self.blank()?;
            self.line(&format!("{} Content:", exported.format.label()))?;
            self.line(preview.trim_end())?;
        }
        Ok(())
    }

    pub fn help(&mut self) -> io::Result<()> {
        self.title(help::TITLE)?;
        for section in help::SECTIONS {
            self.blank()?;
            self.styled(Color::Yellow, section.title)?;
            self.styled(Color::Yellow, &"-".repeat(section.title.chars().count()))?;
            for entry in section.entries {
                self.line(&format!("  {:<30} - {}", entry.usage, entry.description))?;
                self.styled(Color::Gray, &format!("    Example: {}", entry.example))?;
            }
            if let Some(note) = section.note {
                self.styled(Color::Gray, &format!("  {note}"))?;
            }
        }
        self.blank()?;
        self.styled(Color::Cyan, "TIPS:")?;
        for tip in help::TIPS {
            self.styled(Color::Gray, &format!("• {tip}"))?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Diagnostic;

    fn plain() -> Console<Vec<u8>> {
        Console::new(Vec::new(), false)
    }

    fn text(console: Console<Vec<u8>>) -> String {
        String::from_utf8(console.into_inner()).unwrap()
    }

    #[test]
    fn test_sequence_block() {
        let mut console = plain();
        console
            .sequence(&[Value::Int(1), Value::from("two")])
            .unwrap();
        let out = text(console);
        assert!(out.contains("RESULT:"));
        assert!(out.contains("[000] 1\n"));
        assert!(out.contains("[001] \"two\"\n"));
        assert!(out.contains("ℹ Total items: 2"));
        assert!(out.contains(&"=".repeat(50)));
    }

    #[test]
    fn test_empty_sequence_warns() {
        let mut console = plain();
        console.sequence(&[]).unwrap();
        let out = text(console);
        assert!(out.contains("⚠ (empty result set)"));
        assert!(!out.contains("Total items"));
    }

    #[test]
    fn test_compile_report_lists_diagnostics() {
        let mut console = plain();
        let err = ShellError::Compile {
            command: "filter",
            diagnostics: vec![Diagnostic::new(5, "the name 'y' does not exist in the current context")],
            example: "x => (int)x > 10",
        };
        console.report(&err).unwrap();
        let out = text(console);
        assert!(out.contains("✗ Compilation error:"));
        assert!(out.contains("✗   (1,6): error: the name 'y'"));
        assert!(out.contains("ℹ Example: filter x => (int)x > 10"));
    }

    #[test]
    fn test_security_report_names_pattern() {
        let mut console = plain();
        console
            .report(&ShellError::Security { pattern: "File." })
            .unwrap();
        let out = text(console);
        assert!(out.starts_with("✗ Security validation failed"));
        assert!(out.contains("File."));
    }

    #[test]
    fn test_colour_codes() {
        let mut console = Console::new(Vec::new(), true);
        console.success("ok").unwrap();
        assert_eq!(text(console), "\x1b[32m✓ ok\x1b[0m\n");
    }

    #[test]
    fn test_help_mentions_every_section() {
        let mut console = plain();
        console.help().unwrap();
        let out = text(console);
        for section in help::SECTIONS {
            assert!(out.contains(section.title));
        }
        assert!(out.contains("TIPS:"));
    }
}
