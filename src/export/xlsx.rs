//! Export reply rows to an Excel workbook.
//!
//! One sheet named `Emails` with the same columns as the CSV export.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::model::message::ReplyRow;

const SHEET_NAME: &str = "Emails";

const HEADER: [&str; 5] = ["Name", "Email", "Subject", "Sender", "Reply"];

/// Excel rejects cell strings longer than this many characters.
const MAX_CELL_CHARS: usize = 32_767;

/// Export rows to an `.xlsx` file.
pub fn export_xlsx(rows: &[&ReplyRow], output_path: &Path) -> anyhow::Result<()> {
    let mut workbook = build_workbook(rows)?;
    workbook.save(output_path)?;
    Ok(())
}

/// Render rows as `.xlsx` bytes.
pub fn to_xlsx_bytes(rows: &[&ReplyRow]) -> Result<Vec<u8>, XlsxError> {
    build_workbook(rows)?.save_to_buffer()
}

fn build_workbook(rows: &[&ReplyRow]) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, title) in HEADER.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        let values = [&row.name, &row.email, &row.subject, &row.sender, &row.reply];
        for (col, value) in values.into_iter().enumerate() {
            sheet.write_string(r, col as u16, fit_cell(value, r))?;
        }
    }

    sheet.set_column_width(4, 80)?;
    Ok(workbook)
}

/// Cut a value down to the cell size limit.
fn fit_cell(value: &str, row: u32) -> &str {
    match value.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => {
            tracing::warn!(row, "Value too long for a spreadsheet cell, truncated");
            &value[..end]
        }
        None => value,
    }
}
