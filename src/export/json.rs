//! Export reply rows as a JSON array.

use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::model::message::ReplyRow;

/// One exported row. The sender is also given split into name and address.
#[derive(Debug, Serialize)]
struct JsonRow<'a> {
    name: &'a str,
    email: &'a str,
    subject: &'a str,
    sender: &'a str,
    sender_name: String,
    sender_address: String,
    reply: &'a str,
}

impl<'a> From<&'a ReplyRow> for JsonRow<'a> {
    fn from(row: &'a ReplyRow) -> Self {
        let addr = row.sender_address();
        Self {
            name: &row.name,
            email: &row.email,
            subject: &row.subject,
            sender: &row.sender,
            sender_name: addr.display_name,
            sender_address: addr.address,
            reply: &row.reply,
        }
    }
}

/// Serialize rows as a pretty-printed JSON array.
pub fn to_json(rows: &[&ReplyRow]) -> serde_json::Result<String> {
    let items: Vec<JsonRow<'_>> = rows.iter().map(|r| JsonRow::from(*r)).collect();
    serde_json::to_string_pretty(&items)
}

/// Export rows to a JSON file.
pub fn export_json(rows: &[&ReplyRow], output_path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(to_json(rows)?.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
