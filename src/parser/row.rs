//! Map CSV records onto [`RawMessage`]s.

use std::path::Path;

use tracing::debug;

use crate::config::{ColumnsConfig, IngestConfig};
use crate::error::{ReplyError, Result};
use crate::model::address::EmailAddress;
use crate::model::message::RawMessage;

use super::csv::CsvRecord;

/// A non-fatal problem with a single input row.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RowIssue {
    /// 1-based data row number (0 when the issue is not tied to a row).
    pub row: usize,
    /// Physical line the record starts on.
    pub line: usize,
    pub reason: String,
}

impl std::fmt::Display for RowIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {} (line {}): {}", self.row, self.line, self.reason)
    }
}

/// Positions of the columns we read, resolved from the header record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    name: Option<usize>,
    address: usize,
    subject: Option<usize>,
    body: usize,
    width: usize,
}

impl ColumnMap {
    /// Resolve column positions. Address and body are required.
    pub fn from_header(header: &[String], columns: &ColumnsConfig, path: &Path) -> Result<Self> {
        let find = |wanted: &str| header.iter().position(|h| h.trim() == wanted.trim());
        let require = |wanted: &str| {
            find(wanted).ok_or_else(|| ReplyError::MissingColumn {
                path: path.to_path_buf(),
                column: wanted.to_string(),
            })
        };

        let map = Self {
            name: find(&columns.name),
            address: require(&columns.address)?,
            subject: find(&columns.subject),
            body: require(&columns.body)?,
            width: header.len(),
        };
        debug!(?map, "Resolved CSV columns");
        Ok(map)
    }

    /// Number of fields the header declares.
    pub fn width(&self) -> usize {
        self.width
    }
}

/// Build a message from one data record.
///
/// Missing trailing fields read as empty; the caller reports the width mismatch.
pub fn build_message(
    record: &CsvRecord,
    row: usize,
    columns: &ColumnMap,
    ingest: &IngestConfig,
) -> RawMessage {
    let field = |idx: Option<usize>| {
        idx.and_then(|i| record.fields.get(i))
            .map(String::as_str)
            .unwrap_or("")
    };

    let body = field(Some(columns.body)).to_string();
    let name = clean_value(field(columns.name));
    let email = resolve_address(&clean_value(field(Some(columns.address))), &body, ingest);
    let subject = match clean_value(field(columns.subject)) {
        s if s.is_empty() => ingest.default_subject.clone(),
        s => s,
    };

    RawMessage {
        row,
        name,
        email,
        subject,
        body,
    }
}

/// Replace an internal directory identifier with an address found in the body.
///
/// Falls back to the configured label when the body has no address.
pub fn resolve_address(email: &str, body: &str, ingest: &IngestConfig) -> String {
    let prefix = ingest.exchange_prefix.to_lowercase();
    if prefix.is_empty() || !email.to_lowercase().starts_with(&prefix) {
        return email.to_string();
    }

    match EmailAddress::find_in_text(body) {
        Some(found) => {
            debug!(identifier = email, resolved = %found, "Resolved directory address");
            found
        }
        None => {
            debug!(identifier = email, "No address in body, using fallback label");
            ingest.exchange_fallback.clone()
        }
    }
}

/// Trim spaces and stray quote characters left over from the export.
fn clean_value(raw: &str) -> String {
    raw.trim_matches(|c| c == ' ' || c == '\'' || c == '"')
        .to_string()
}
