//! Load an exported email CSV into [`RawMessage`]s.

use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, WINDOWS_1252};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ReplyError, Result};
use crate::model::message::RawMessage;
use crate::parser::csv::read_records;
use crate::parser::row::{build_message, ColumnMap, RowIssue};

/// Messages read from one export, plus the rows that needed attention.
#[derive(Debug)]
pub struct LoadedExport {
    pub path: PathBuf,
    /// Size of the input in bytes.
    pub size: u64,
    pub messages: Vec<RawMessage>,
    /// Non-fatal problems; the affected rows are still loaded when possible.
    pub issues: Vec<RowIssue>,
}

/// Read and parse an export file.
///
/// The `progress` callback receives `(rows_done, rows_total)`.
pub fn load_export(
    path: &Path,
    config: &Config,
    progress: Option<&dyn Fn(u64, u64)>,
) -> Result<LoadedExport> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ReplyError::FileNotFound(path.to_path_buf())
        } else {
            ReplyError::io(path, e)
        }
    })?;

    info!(path = %path.display(), bytes = bytes.len(), "Loading export");
    let mut loaded = parse_export(&decode_input(&bytes), path, config, progress)?;
    loaded.size = bytes.len() as u64;
    Ok(loaded)
}

/// Parse already-decoded export text. `path` is only used in messages.
pub fn parse_export(
    text: &str,
    path: &Path,
    config: &Config,
    progress: Option<&dyn Fn(u64, u64)>,
) -> Result<LoadedExport> {
    let doc = read_records(text);
    let mut records = doc.records.into_iter();

    let header = records
        .next()
        .ok_or_else(|| ReplyError::EmptyInput(path.to_path_buf()))?;
    let columns = ColumnMap::from_header(&header.fields, &config.columns, path)?;

    let mut issues: Vec<RowIssue> = doc
        .issues
        .iter()
        .map(|issue| {
            warn!(line = issue.line(), reason = %issue, "Malformed CSV");
            RowIssue {
                row: 0,
                line: issue.line(),
                reason: issue.to_string(),
            }
        })
        .collect();

    let total = records.len() as u64;
    let mut messages = Vec::with_capacity(records.len());

    for (idx, record) in records.enumerate() {
        let row = idx + 1;
        if record.fields.len() != columns.width() {
            warn!(
                row,
                line = record.line,
                expected = columns.width(),
                found = record.fields.len(),
                "Row field count differs from header"
            );
            issues.push(RowIssue {
                row,
                line: record.line,
                reason: format!(
                    "expected {} field(s), found {}",
                    columns.width(),
                    record.fields.len()
                ),
            });
        }

        messages.push(build_message(&record, row, &columns, &config.ingest));

        if let Some(cb) = progress {
            cb(row as u64, total);
        }
    }

    debug!(messages = messages.len(), issues = issues.len(), "Parsed export");

    Ok(LoadedExport {
        path: path.to_path_buf(),
        size: text.len() as u64,
        messages,
        issues,
    })
}

/// Decode raw export bytes.
///
/// Mail client exports are ISO-8859-1; `encoding_rs` serves that label with
/// its Windows-1252 decoder, which accepts every byte. A byte order mark
/// (as written by our own CSV export) selects its encoding instead and is
/// dropped, so the first header name still matches.
pub fn decode_input(bytes: &[u8]) -> String {
    let (decoded, _) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => {
            debug!(encoding = encoding.name(), "Input starts with a BOM");
            encoding.decode_without_bom_handling(&bytes[bom_len..])
        }
        None => WINDOWS_1252.decode_without_bom_handling(bytes),
    };
    decoded.into_owned()
}
