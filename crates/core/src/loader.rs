//! Spreadsheet loading from uploaded bytes.

use crate::error::{AttendanceError, AttendanceResult};
use rollbook_sheet::{Sheet, XlsxReadOptions};

/// Decode the first sheet of an uploaded workbook.
///
/// `skip_rows` banner rows are dropped and the next row becomes the header.
/// The decoder follows the file extension: `.xls` uses the legacy reader,
/// everything else the `.xlsx` one.
pub fn load_table(bytes: &[u8], file_name: &str, skip_rows: usize) -> AttendanceResult<Sheet> {
    let options = XlsxReadOptions::default()
        .with_headers(true)
        .with_skip_rows(skip_rows);

    let sheet = Sheet::from_excel_bytes(bytes, file_name, &options)
        .map_err(|e| AttendanceError::unreadable(file_name, e.to_string()))?;

    tracing::info!(
        file = file_name,
        rows = sheet.data_row_count(),
        columns = sheet.col_count(),
        "loaded spreadsheet"
    );
    Ok(sheet)
}
