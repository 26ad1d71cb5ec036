//! Writing the current sequence to disk.
//!
//! Files are named `export_<YYYYMMDD_HHMMSS>.<ext>` and land in the
//! configured export directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::value::Value;

/// Contents shorter than this are echoed back after export.
pub const PREVIEW_LIMIT: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Text,
}

impl ExportFormat {
    /// Parse a format name; an empty name means JSON.
    pub fn parse(name: &str) -> Option<ExportFormat> {
        match name.trim().to_lowercase().as_str() {
            "" | "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            "txt" | "text" => Some(ExportFormat::Text),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Text => "txt",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Json => "JSON",
            ExportFormat::Text => "Text",
        }
    }
}

/// A finished export.
#[derive(Debug, Clone, PartialEq)]
pub struct Exported {
    pub path: PathBuf,
    pub format: ExportFormat,
    /// File contents, when short enough to show.
    pub preview: Option<String>,
}

/// Serialize `items` in `format`.
pub fn render(items: &[Value], format: ExportFormat) -> Result<String, serde_json::Error> {
    match format {
        ExportFormat::Csv => Ok(to_csv(items)),
        ExportFormat::Json => serde_json::to_string_pretty(items),
        ExportFormat::Text => Ok(to_text(items)),
    }
}

/// CSV with a header taken from the first item when it is a record.
pub fn to_csv(items: &[Value]) -> String {
    let mut csv = String::new();
    let Some(first) = items.first() else {
        return csv;
    };

    if let Value::Record(header) = first {
        let names: Vec<&str> = header.names().collect();
        push_row(&mut csv, names.iter().map(|n| n.to_string()));
        for item in items {
            let row = names.iter().map(|name| match item {
                Value::Record(record) => record.get(name).map(Value::to_text).unwrap_or_default(),
                _ => String::new(),
            });
            push_row(&mut csv, row);
        }
    } else {
        for item in items {
            push_row(&mut csv, std::iter::once(item.to_text()));
        }
    }
    csv
}

fn push_row(csv: &mut String, cells: impl Iterator<Item = String>) {
    let row: Vec<String> = cells.map(|cell| escape_csv(&cell)).collect();
    csv.push_str(&row.join(","));
    csv.push('\n');
}

/// Quote a CSV cell when needed. Empty cells are written as `""`.
pub fn escape_csv(value: &str) -> String {
    if value.is_empty() {
        return "\"\"".to_string();
    }
    if value.contains(['"', ',', '\n', '\r']) {
        return format!("\"{}\"", value.replace('"', "\"\""));
    }
    value.to_string()
}

/// One display-formatted item per line.
pub fn to_text(items: &[Value]) -> String {
    items.iter().map(|item| format!("{item}\n")).collect()
}

/// Write `items` to a timestamped file in `dir`.
pub fn export(items: &[Value], format: ExportFormat, dir: &Path) -> io::Result<Exported> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("export_{stamp}.{}", format.extension()));

    let content = render(items, format)?;
    fs::write(&path, &content)?;
    info!(path = %path.display(), items = items.len(), format = format.extension(), "exported");

    let preview = (format != ExportFormat::Text && content.chars().count() < PREVIEW_LIMIT)
        .then_some(content);
    Ok(Exported {
        path,
        format,
        preview,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;
    use tempfile::TempDir;

    fn record(key: i64, count: i64) -> Value {
        Value::Record(
            Record::new()
                .with_field("Key", Value::Int(key))
                .with_field("Count", Value::Int(count)),
        )
    }

    #[test]
    fn test_format_names() {
        assert_eq!(ExportFormat::parse(""), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::parse("CSV"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::parse("text"), Some(ExportFormat::Text));
        assert_eq!(ExportFormat::parse("xml"), None);
    }

    #[test]
    fn test_csv_records_have_header() {
        let csv = to_csv(&[record(1, 3), record(0, 2)]);
        assert_eq!(csv, "Key,Count\n1,3\n0,2\n");
    }

    #[test]
    fn test_csv_scalars_have_no_header() {
        let csv = to_csv(&[Value::Int(1), Value::from("a,b"), Value::Null]);
        assert_eq!(csv, "1\n\"a,b\"\n\"\"\n");
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv(""), "\"\"");
        assert_eq!(escape_csv("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_csv_empty() {
        assert_eq!(to_csv(&[]), "");
    }

    #[test]
    fn test_text_uses_display_form() {
        let text = to_text(&[Value::from("a"), Value::Int(2)]);
        assert_eq!(text, "\"a\"\n2\n");
    }

    #[test]
    fn test_export_json_writes_file() {
        let dir = TempDir::new().unwrap();
        let items = vec![Value::Int(1), Value::from("two")];
        let exported = export(&items, ExportFormat::Json, dir.path()).unwrap();

        let name = exported.path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("export_"));
        assert!(name.ends_with(".json"));
        // export_YYYYMMDD_HHMMSS.json
        assert_eq!(name.len(), "export_".len() + 15 + ".json".len());

        let written = fs::read_to_string(&exported.path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, serde_json::json!([1, "two"]));
        assert_eq!(exported.preview.as_deref(), Some(written.as_str()));
    }

    #[test]
    fn test_export_text_has_no_preview() {
        let dir = TempDir::new().unwrap();
        let exported = export(&[Value::Int(1)], ExportFormat::Text, dir.path()).unwrap();
        assert!(exported.preview.is_none());
        assert!(exported.path.extension().is_some_and(|e| e == "txt"));
    }

    #[test]
    fn test_export_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(export(&[Value::Int(1)], ExportFormat::Csv, &missing).is_err());
    }
}
