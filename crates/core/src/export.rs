//! Workbook export: one sheet per month matrix.

use crate::config::PresenceMarker;
use crate::error::{AttendanceError, AttendanceResult};
use crate::matrix::{AttendanceMatrix, MonthKey};
use indexmap::IndexMap;
use rollbook_sheet::{Book, XlsxWriteOptions};
use std::collections::HashSet;

/// Longest sheet name the xlsx container accepts.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Identity columns frozen on every exported sheet.
const FROZEN_COLUMNS: u16 = 2;

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Pick a sheet name for `label` that is unique within `used`.
///
/// The label is truncated to 31 characters. A name already taken gets a
/// ` (n)` suffix, with the base cut further so the result still fits.
/// The result is recorded in `used`.
pub fn sheet_name_for(label: &str, used: &mut HashSet<String>) -> String {
    let base = truncate_chars(label, MAX_SHEET_NAME_LEN);
    if used.insert(base.to_string()) {
        return base.to_string();
    }

    let mut n = 2usize;
    loop {
        let suffix = format!(" ({n})");
        let room = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
        let candidate = format!("{}{suffix}", truncate_chars(label, room));
        if used.insert(candidate.clone()) {
            tracing::warn!(label, sheet = %candidate, "sheet name collision, renamed");
            return candidate;
        }
        n += 1;
    }
}

/// Serialize month matrices to `.xlsx` bytes in their map order.
pub fn export_workbook(
    matrices: &IndexMap<MonthKey, AttendanceMatrix>,
    presence_marker: PresenceMarker,
) -> AttendanceResult<(Vec<u8>, Vec<String>)> {
    if matrices.is_empty() {
        return Err(AttendanceError::ExportFailed(
            "there are no months with attendance to export".to_string(),
        ));
    }

    let mut used = HashSet::new();
    let mut book = Book::new();
    let mut names = Vec::with_capacity(matrices.len());
    for (month, matrix) in matrices {
        let name = sheet_name_for(&month.label(), &mut used);
        let sheet = matrix
            .to_sheet(presence_marker)
            .map_err(|e| AttendanceError::ExportFailed(e.to_string()))?;
        book.add_sheet(&name, sheet)
            .map_err(|e| AttendanceError::ExportFailed(e.to_string()))?;
        names.push(name);
    }

    let options = XlsxWriteOptions::default()
        .with_bold_header(true)
        .with_freeze_columns(FROZEN_COLUMNS);
    let bytes = book
        .to_xlsx_bytes(&options)
        .map_err(|e| AttendanceError::ExportFailed(e.to_string()))?;

    tracing::info!(sheets = names.len(), bytes = bytes.len(), "exported attendance workbook");
    Ok((bytes, names))
}

/// Download name for a batch export.
#[must_use]
pub fn export_file_name(batch: &str, monthwise: bool) -> String {
    if monthwise {
        format!("{batch}_Attendance_Monthwise.xlsx")
    } else {
        format!("{batch}_Attendance.xlsx")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{Mark, MatrixRow};

    fn matrix(year: i32, month: u32) -> AttendanceMatrix {
        let key = MonthKey { year, month };
        AttendanceMatrix {
            month: key,
            rows: vec![MatrixRow {
                student_id: "S1".to_string(),
                student_name: "Asha".to_string(),
                cells: vec![Mark::Absent; key.days() as usize],
            }],
        }
    }

    #[test]
    fn test_short_names_pass_through() {
        let mut used = HashSet::new();
        assert_eq!(sheet_name_for("March-2024", &mut used), "March-2024");
    }

    #[test]
    fn test_truncation_is_deterministic() {
        let label = "An unusually long month label for 2024";
        let first = sheet_name_for(label, &mut HashSet::new());
        let second = sheet_name_for(label, &mut HashSet::new());
        assert_eq!(first, second);
        assert_eq!(first.chars().count(), MAX_SHEET_NAME_LEN);
    }

    #[test]
    fn test_collisions_get_suffix() {
        let mut used = HashSet::new();
        let a = sheet_name_for("Batch attendance register for March", &mut used);
        let b = sheet_name_for("Batch attendance register for March again", &mut used);
        let c = sheet_name_for("Batch attendance register for March once more", &mut used);
        assert_ne!(a, b);
        assert!(b.ends_with(" (2)"));
        assert!(c.ends_with(" (3)"));
        assert!(b.chars().count() <= MAX_SHEET_NAME_LEN);
    }

    #[test]
    fn test_zero_matrices_fail() {
        let result = export_workbook(&IndexMap::new(), PresenceMarker::Letter);
        assert!(matches!(result, Err(AttendanceError::ExportFailed(_))));
    }

    #[test]
    fn test_sheets_follow_map_order() {
        let mut matrices = IndexMap::new();
        matrices.insert(MonthKey { year: 2024, month: 4 }, matrix(2024, 4));
        matrices.insert(MonthKey { year: 2024, month: 3 }, matrix(2024, 3));
        let (bytes, names) = export_workbook(&matrices, PresenceMarker::Letter).unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(names, vec!["April-2024", "March-2024"]);
    }

    #[test]
    fn test_file_names() {
        assert_eq!(export_file_name("B1", false), "B1_Attendance.xlsx");
        assert_eq!(export_file_name("B1", true), "B1_Attendance_Monthwise.xlsx");
    }
}
