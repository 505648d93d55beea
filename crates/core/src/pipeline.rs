//! One interaction, end to end: load, normalize, filter, aggregate, export.
//!
//! A [`Pipeline`] holds the normalized tables of the current uploads and is
//! rebuilt whenever a file is uploaded again. Every query re-runs the
//! downstream stages from those tables.

use crate::aggregate::{dedup_by_student_date, summarize, with_counts};
use crate::config::{FilterConfig, PipelineConfig};
use crate::error::{AttendanceError, AttendanceResult};
use crate::export::{export_file_name, export_workbook};
use crate::filter::{filter_attendance, filter_extra_sessions};
use crate::loader::load_table;
use crate::matrix::{build_month_matrices, AttendanceMatrix, MonthKey};
use crate::normalize::{normalize_attendance, normalize_extra_sessions};
use crate::record::{headers, AttendanceRecord, CountedRecord, ExtraSessionRecord, SummaryRow};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// An exported workbook ready to be offered for download.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Sheet names in workbook order.
    pub sheet_names: Vec<String>,
}

/// Loaded attendance data plus the settings to process it with.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
    attendance: Vec<AttendanceRecord>,
    has_batch_column: bool,
    extra: Vec<ExtraSessionRecord>,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Pipeline {
            config,
            ..Pipeline::default()
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Normalized regular-session records in upload order.
    pub fn attendance(&self) -> &[AttendanceRecord] {
        &self.attendance
    }

    pub fn extra_sessions(&self) -> &[ExtraSessionRecord] {
        &self.extra
    }

    /// Load the regular attendance export, replacing any earlier upload.
    ///
    /// Returns the number of records kept. A failed load leaves no
    /// attendance behind, so later queries never see the previous upload.
    pub fn load_attendance(&mut self, bytes: &[u8], file_name: &str) -> AttendanceResult<usize> {
        self.attendance.clear();
        self.has_batch_column = false;
        let sheet = load_table(bytes, file_name, self.config.attendance_skip_rows)?;
        let records = normalize_attendance(&sheet, false)?;
        self.has_batch_column = sheet.has_column(headers::BATCH);
        self.attendance = records;
        Ok(self.attendance.len())
    }

    /// Load the extra-session export, replacing any earlier upload.
    pub fn load_extra_sessions(&mut self, bytes: &[u8], file_name: &str) -> AttendanceResult<usize> {
        self.extra.clear();
        let sheet = load_table(bytes, file_name, self.config.extra_skip_rows)?;
        self.extra = normalize_extra_sessions(&sheet)?;
        Ok(self.extra.len())
    }

    fn require_batch_column(&self) -> AttendanceResult<()> {
        if self.has_batch_column {
            Ok(())
        } else {
            Err(AttendanceError::missing_column(headers::BATCH))
        }
    }

    /// Filtered and sorted records; `EmptyResult` when nothing matches.
    pub fn filtered(&self, filters: &FilterConfig) -> AttendanceResult<Vec<AttendanceRecord>> {
        if filters.batch.as_deref().is_some_and(|b| !b.trim().is_empty()) {
            self.require_batch_column()?;
        }
        let records = filter_attendance(&self.attendance, filters);
        if records.is_empty() {
            return Err(AttendanceError::EmptyResult);
        }
        Ok(records)
    }

    /// The live table: filtered rows annotated with per-student counts.
    pub fn view(&self, filters: &FilterConfig) -> AttendanceResult<Vec<CountedRecord>> {
        Ok(with_counts(&self.filtered(filters)?))
    }

    /// Classes taken per student over the filtered rows.
    pub fn summary(&self, filters: &FilterConfig) -> AttendanceResult<Vec<SummaryRow>> {
        Ok(summarize(&self.filtered(filters)?))
    }

    /// Distinct non-empty batches, sorted.
    pub fn batches(&self) -> AttendanceResult<Vec<String>> {
        self.require_batch_column()?;
        let batches: BTreeSet<&str> = self
            .attendance
            .iter()
            .map(|r| r.batch.as_str())
            .filter(|b| !b.is_empty())
            .collect();
        Ok(batches.into_iter().map(str::to_string).collect())
    }

    /// Distinct student ids within `batch`, sorted.
    pub fn students(&self, batch: &str) -> AttendanceResult<Vec<String>> {
        self.require_batch_column()?;
        let students: BTreeSet<&str> = self
            .attendance
            .iter()
            .filter(|r| r.batch == batch)
            .map(|r| r.student_id.as_str())
            .collect();
        Ok(students.into_iter().map(str::to_string).collect())
    }

    /// Month matrices for a batch, optionally narrowed to one student.
    pub fn month_matrices(
        &self,
        batch: &str,
        student: Option<&str>,
    ) -> AttendanceResult<IndexMap<MonthKey, AttendanceMatrix>> {
        let mut scope = FilterConfig::default().with_batch(batch);
        if let Some(student) = student {
            scope = scope.with_student(student);
        }

        let attendance = dedup_by_student_date(&self.filtered(&scope)?);
        let extra = filter_extra_sessions(&self.extra, &scope);
        tracing::debug!(
            batch,
            attendance = attendance.len(),
            extra = extra.len(),
            "scoped records for export"
        );
        Ok(build_month_matrices(&attendance, &extra, &self.config))
    }

    /// Build the downloadable workbook for a batch.
    ///
    /// Nothing is produced on any error, including an empty scope.
    pub fn export_batch(
        &self,
        batch: &str,
        student: Option<&str>,
        monthwise: bool,
    ) -> AttendanceResult<ExportArtifact> {
        let matrices = self.month_matrices(batch, student)?;
        let (bytes, sheet_names) = export_workbook(&matrices, self.config.presence_marker)?;
        Ok(ExportArtifact {
            file_name: export_file_name(batch, monthwise),
            bytes,
            sheet_names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(id: &str, batch: &str, day: u32) -> AttendanceRecord {
        AttendanceRecord {
            student_id: id.to_string(),
            student_name: format!("Student {id}"),
            date: NaiveDate::from_ymd_opt(2024, 3, day),
            faculty: "Dr. Rao".to_string(),
            batch: batch.to_string(),
        }
    }

    fn pipeline(records: Vec<AttendanceRecord>) -> Pipeline {
        Pipeline {
            attendance: records,
            has_batch_column: true,
            ..Pipeline::default()
        }
    }

    #[test]
    fn test_batches_and_students() {
        let p = pipeline(vec![
            record("S2", "B2", 1),
            record("S1", "B1", 1),
            record("S3", "B1", 2),
            record("S1", "B1", 3),
            record("S9", "", 3),
        ]);
        assert_eq!(p.batches().unwrap(), vec!["B1", "B2"]);
        assert_eq!(p.students("B1").unwrap(), vec!["S1", "S3"]);
        assert!(p.students("B7").unwrap().is_empty());
    }

    #[test]
    fn test_batch_operations_need_batch_column() {
        let p = Pipeline {
            attendance: vec![record("S1", "", 1)],
            ..Pipeline::default()
        };
        assert!(matches!(p.batches(), Err(AttendanceError::MissingColumn(ref c)) if c == "Batch"));
        assert!(p.view(&FilterConfig::default()).is_ok());
        assert!(matches!(
            p.export_batch("B1", None, false),
            Err(AttendanceError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_empty_selection_is_a_warning() {
        let p = pipeline(vec![record("S1", "B1", 1)]);
        let err = p.view(&FilterConfig::default().with_faculty("nobody")).unwrap_err();
        assert!(err.is_warning());
        assert!(matches!(p.export_batch("B2", None, false), Err(AttendanceError::EmptyResult)));
    }

    #[test]
    fn test_export_scoped_to_student() {
        let p = pipeline(vec![record("S1", "B1", 1), record("S2", "B1", 2)]);
        let matrices = p.month_matrices("B1", Some("S2")).unwrap();
        let march = &matrices[&MonthKey { year: 2024, month: 3 }];
        assert_eq!(march.rows.len(), 1);
        assert_eq!(march.rows[0].student_id, "S2");

        let artifact = p.export_batch("B1", Some("S2"), true).unwrap();
        assert_eq!(artifact.file_name, "B1_Attendance_Monthwise.xlsx");
        assert_eq!(artifact.sheet_names, vec!["March-2024"]);
    }

    #[test]
    fn test_failed_upload_drops_previous_records() {
        let mut p = pipeline(vec![record("S1", "B1", 1)]);
        p.extra = vec![ExtraSessionRecord {
            student_id: "S1".to_string(),
            batch: "B1".to_string(),
            extra_date: NaiveDate::from_ymd_opt(2024, 3, 2),
        }];

        let result = p.load_attendance(b"not a workbook", "march.xlsx");
        assert!(matches!(result, Err(AttendanceError::UnreadableFile { .. })));
        assert!(p.attendance().is_empty());
        assert!(matches!(p.batches(), Err(AttendanceError::MissingColumn(_))));

        assert!(p.load_extra_sessions(b"not a workbook", "extra.xlsx").is_err());
        assert!(p.extra_sessions().is_empty());
    }
}
