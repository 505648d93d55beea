//! Schema normalization: raw loaded sheets to typed records.
//!
//! Each step is idempotent. Excluded columns are dropped if present, the
//! required columns are checked, and the date column is coerced with
//! unreadable cells becoming `None`.

use crate::datetime::cell_to_date;
use crate::error::{AttendanceError, AttendanceResult};
use crate::record::{headers, AttendanceRecord, ExtraSessionRecord};
use rollbook_sheet::{CellValue, Sheet};

/// Required columns of the regular attendance export.
pub const ATTENDANCE_REQUIRED: &[&str] = &[
    headers::STUDENT_ID,
    headers::STUDENT_NAME,
    headers::DATE,
    headers::FACULTY,
];

/// Required columns of the extra-session export.
pub const EXTRA_SESSION_REQUIRED: &[&str] = &[headers::STUDENT_ID, headers::EXTRA_SESSION_DATE];

/// Return a copy of `sheet` without the excluded export columns.
#[must_use]
pub fn drop_excluded_columns(sheet: &Sheet) -> Sheet {
    let mut trimmed = sheet.clone();
    let removed = trimmed.remove_columns_if_present(headers::EXCLUDED);
    if removed > 0 {
        tracing::debug!(removed, "dropped excluded columns");
    }
    trimmed
}

/// Fail with `MissingColumn` naming the first required column not in `sheet`.
pub fn require_columns(sheet: &Sheet, required: &[&str]) -> AttendanceResult<()> {
    match required.iter().find(|name| !sheet.has_column(name)) {
        Some(missing) => Err(AttendanceError::missing_column(*missing)),
        None => Ok(()),
    }
}

fn column(sheet: &Sheet, name: &str) -> AttendanceResult<usize> {
    sheet
        .column_index_by_name(name)
        .map_err(|_| AttendanceError::missing_column(name))
}

fn text_at(row: &[CellValue], col: usize) -> String {
    row.get(col).map(CellValue::as_text).unwrap_or_default()
}

/// Normalize a loaded regular-session sheet into attendance records.
///
/// `Batch` is only required when `require_batch` is set; otherwise a missing
/// batch column yields empty batch values. Rows without a student id are
/// skipped.
pub fn normalize_attendance(sheet: &Sheet, require_batch: bool) -> AttendanceResult<Vec<AttendanceRecord>> {
    let sheet = drop_excluded_columns(sheet);
    require_columns(&sheet, ATTENDANCE_REQUIRED)?;
    if require_batch {
        require_columns(&sheet, &[headers::BATCH])?;
    }

    let id_col = column(&sheet, headers::STUDENT_ID)?;
    let name_col = column(&sheet, headers::STUDENT_NAME)?;
    let date_col = column(&sheet, headers::DATE)?;
    let faculty_col = column(&sheet, headers::FACULTY)?;
    let batch_col = sheet.column_index_by_name(headers::BATCH).ok();

    let mut unreadable_dates = 0usize;
    let records: Vec<AttendanceRecord> = sheet
        .data_rows()
        .filter_map(|row| {
            let student_id = text_at(row, id_col);
            if student_id.is_empty() {
                return None;
            }
            let date = row.get(date_col).and_then(cell_to_date);
            if date.is_none() {
                unreadable_dates += 1;
            }
            Some(AttendanceRecord {
                student_id,
                student_name: text_at(row, name_col),
                date,
                faculty: text_at(row, faculty_col),
                batch: batch_col.map(|col| text_at(row, col)).unwrap_or_default(),
            })
        })
        .collect();

    if unreadable_dates > 0 {
        tracing::warn!(unreadable_dates, "attendance rows with unreadable dates");
    }
    tracing::debug!(rows = records.len(), "normalized attendance sheet");
    Ok(records)
}

/// Normalize a loaded extra-session sheet into extra-session records.
///
/// `Batch` is optional in this export; rows without one carry an empty batch.
pub fn normalize_extra_sessions(sheet: &Sheet) -> AttendanceResult<Vec<ExtraSessionRecord>> {
    let sheet = drop_excluded_columns(sheet);
    require_columns(&sheet, EXTRA_SESSION_REQUIRED)?;

    let id_col = column(&sheet, headers::STUDENT_ID)?;
    let date_col = column(&sheet, headers::EXTRA_SESSION_DATE)?;
    let batch_col = sheet.column_index_by_name(headers::BATCH).ok();

    let records: Vec<ExtraSessionRecord> = sheet
        .data_rows()
        .filter_map(|row| {
            let student_id = text_at(row, id_col);
            if student_id.is_empty() {
                return None;
            }
            Some(ExtraSessionRecord {
                student_id,
                batch: batch_col.map(|col| text_at(row, col)).unwrap_or_default(),
                extra_date: row.get(date_col).and_then(cell_to_date),
            })
        })
        .collect();

    tracing::debug!(rows = records.len(), "normalized extra-session sheet");
    Ok(records)
}
