//! Export reply rows to CSV.
//!
//! Output is UTF-8 with BOM for spreadsheet compatibility, and every field
//! is quoted since replies routinely contain commas and line breaks.

use std::io::{BufWriter, Write};
use std::path::Path;

use crate::model::message::ReplyRow;

const HEADER: [&str; 5] = ["Name", "Email", "Subject", "Sender", "Reply"];

/// Export rows to a CSV file.
///
/// Columns: Name, Email, Subject, Sender, Reply
pub fn export_csv(rows: &[&ReplyRow], output_path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    write_csv(rows, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write rows as CSV to any writer.
pub fn write_csv<W: Write>(rows: &[&ReplyRow], out: &mut W) -> std::io::Result<()> {
    // UTF-8 BOM
    out.write_all(&[0xEF, 0xBB, 0xBF])?;
    write_record(out, &HEADER)?;

    for row in rows {
        write_record(
            out,
            &[
                row.name.as_str(),
                row.email.as_str(),
                row.subject.as_str(),
                row.sender.as_str(),
                row.reply.as_str(),
            ],
        )?;
    }
    Ok(())
}

fn write_record<W: Write>(out: &mut W, fields: &[&str]) -> std::io::Result<()> {
    let line = fields
        .iter()
        .map(|f| quote(f))
        .collect::<Vec<_>>()
        .join(",");
    out.write_all(line.as_bytes())?;
    out.write_all(b"\r\n")
}

/// Quote a value for CSV (RFC 4180), unconditionally.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
