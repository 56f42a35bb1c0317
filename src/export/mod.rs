//! Export functionality: CSV, plain text, JSON, and Excel.

pub mod csv;
pub mod json;
pub mod text;
pub mod xlsx;

use std::path::{Path, PathBuf};

use crate::error::{ReplyError, Result};
use crate::model::message::ReplyRow;

/// Base name used when the output is a directory.
const DEFAULT_STEM: &str = "filtered_output";

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Text,
    Json,
    Xlsx,
}

impl ExportFormat {
    /// Parse a format name: `csv`, `txt`/`text`, `json`, `xlsx`/`excel`.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "txt" | "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            other => Err(ReplyError::Export(format!(
                "Unknown export format '{other}'. Supported: csv, txt, json, xlsx"
            ))),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Text => "txt",
            Self::Json => "json",
            Self::Xlsx => "xlsx",
        }
    }
}

/// Use `output` as a file when it has an extension, else as a directory.
pub fn resolve_output_path(output: &Path, format: ExportFormat) -> PathBuf {
    if output.extension().is_some() {
        output.to_path_buf()
    } else {
        output.join(format!("{DEFAULT_STEM}.{}", format.extension()))
    }
}

/// Write `rows` in `format` under `output`. Returns the file written.
pub fn export_rows(
    rows: &[&ReplyRow],
    format: ExportFormat,
    output: &Path,
) -> anyhow::Result<PathBuf> {
    let path = resolve_output_path(output, format);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    match format {
        ExportFormat::Csv => csv::export_csv(rows, &path)?,
        ExportFormat::Text => text::export_text(rows, &path)?,
        ExportFormat::Json => json::export_json(rows, &path)?,
        ExportFormat::Xlsx => xlsx::export_xlsx(rows, &path)?,
    }

    tracing::info!(path = %path.display(), rows = rows.len(), ?format, "Exported rows");
    Ok(path)
}

/// Sanitize a string for use in filenames.
///
/// Replaces invalid characters with `_` and truncates to `max_len`.
pub fn sanitize_filename_part(s: &str, max_len: usize) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '.' || c == '_' || c == '@' {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect();

    if sanitized.is_empty() {
        "unknown".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!(ExportFormat::parse("CSV").unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse("text").unwrap(), ExportFormat::Text);
        assert_eq!(ExportFormat::parse("txt").unwrap(), ExportFormat::Text);
        assert_eq!(ExportFormat::parse("xlsx").unwrap(), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::parse("Excel").unwrap(), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::Xlsx.extension(), "xlsx");
        assert!(matches!(
            ExportFormat::parse("ods"),
            Err(ReplyError::Export(_))
        ));
    }

    #[test]
    fn test_resolve_output_path() {
        assert_eq!(
            resolve_output_path(Path::new("out/threads.csv"), ExportFormat::Csv),
            PathBuf::from("out/threads.csv")
        );
        assert_eq!(
            resolve_output_path(Path::new("out"), ExportFormat::Json),
            PathBuf::from("out/filtered_output.json")
        );
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename_part("hello world", 20), "hello_world");
        assert_eq!(sanitize_filename_part("Re: Pothole/5th", 30), "Re__Pothole_5th");
        assert_eq!(sanitize_filename_part("", 20), "unknown");
        assert_eq!(sanitize_filename_part("abcdef", 3), "abc");
    }
}
