//! Typed rows for each table kind the pipeline produces.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column headers as they appear in the learning-management export.
pub mod headers {
    pub const STUDENT_ID: &str = "Student ID";
    pub const STUDENT_NAME: &str = "Student Name";
    pub const DATE: &str = "Date";
    pub const FACULTY: &str = "Faculty";
    pub const BATCH: &str = "Batch";
    pub const EXTRA_SESSION_DATE: &str = "Extra Session Attendance Date";

    /// Export columns that carry nothing the pipeline uses.
    pub const EXCLUDED: &[&str] = &[
        "Sr. No.",
        "Sr No",
        "S.No",
        "Center",
        "Centre",
        "Signature",
        "Remark",
        "Remarks",
    ];
}

/// One attendance event from the regular-session export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub student_id: String,
    pub student_name: String,
    /// `None` when the cell could not be read as a date.
    pub date: Option<NaiveDate>,
    pub faculty: String,
    /// Empty when the export has no batch column.
    pub batch: String,
}

impl AttendanceRecord {
    /// The (student_id, student_name) pair that identifies a student.
    #[must_use]
    pub fn student_key(&self) -> StudentKey {
        StudentKey {
            student_id: self.student_id.clone(),
            student_name: self.student_name.clone(),
        }
    }
}

/// One makeup-session attendance event from the extra-session export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraSessionRecord {
    pub student_id: String,
    pub batch: String,
    pub extra_date: Option<NaiveDate>,
}

/// Students are identified by id and name together.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StudentKey {
    pub student_id: String,
    pub student_name: String,
}

/// An attendance record annotated with its student's counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountedRecord {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    /// Rows sharing this student id, same-day repeats included.
    pub duplicate_attendance_count: usize,
    /// Distinct dates for this student id.
    pub unique_attendance_count: usize,
}

/// Classes attended per student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub student_id: String,
    pub student_name: String,
    pub classes_taken: usize,
}

/// Columns of the live attendance view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    StudentId,
    StudentName,
    Date,
    Faculty,
    Batch,
    DuplicateAttendanceCount,
    UniqueAttendanceCount,
}

impl Column {
    /// Every column, in display order.
    pub const ALL: [Column; 7] = [
        Column::StudentId,
        Column::StudentName,
        Column::Date,
        Column::Faculty,
        Column::Batch,
        Column::DuplicateAttendanceCount,
        Column::UniqueAttendanceCount,
    ];

    /// Header text for the column.
    #[must_use]
    pub fn header(self) -> &'static str {
        match self {
            Column::StudentId => headers::STUDENT_ID,
            Column::StudentName => headers::STUDENT_NAME,
            Column::Date => headers::DATE,
            Column::Faculty => headers::FACULTY,
            Column::Batch => headers::BATCH,
            Column::DuplicateAttendanceCount => "duplicate_attendance_count",
            Column::UniqueAttendanceCount => "unique_attendance_count",
        }
    }

    /// Render this column's value for a row.
    #[must_use]
    pub fn value(self, row: &CountedRecord) -> String {
        let record = &row.record;
        match self {
            Column::StudentId => record.student_id.clone(),
            Column::StudentName => record.student_name.clone(),
            Column::Date => record
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            Column::Faculty => record.faculty.clone(),
            Column::Batch => record.batch.clone(),
            Column::DuplicateAttendanceCount => row.duplicate_attendance_count.to_string(),
            Column::UniqueAttendanceCount => row.unique_attendance_count.to_string(),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

impl FromStr for Column {
    type Err = String;

    /// Accepts the header text or its snake_case form, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace([' ', '-'], "_");
        Column::ALL
            .into_iter()
            .find(|column| column.header().to_lowercase().replace(' ', "_") == wanted)
            .ok_or_else(|| format!("Unknown column: {s}"))
    }
}

/// Project counted rows onto the chosen columns, in the chosen order.
///
/// An empty selection means every column.
#[must_use]
pub fn select_columns(rows: &[CountedRecord], columns: &[Column]) -> (Vec<&'static str>, Vec<Vec<String>>) {
    let columns: &[Column] = if columns.is_empty() { &Column::ALL } else { columns };
    let header = columns.iter().map(|c| c.header()).collect();
    let body = rows
        .iter()
        .map(|row| columns.iter().map(|c| c.value(row)).collect())
        .collect();
    (header, body)
}
