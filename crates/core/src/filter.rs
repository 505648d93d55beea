//! Filter engine: independent row predicates combined with AND.

use crate::config::FilterConfig;
use crate::record::{AttendanceRecord, ExtraSessionRecord};

/// A single row predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Case-insensitive substring of the student id.
    StudentIdContains(String),
    /// Case-insensitive substring of the student name.
    StudentNameContains(String),
    /// Case-insensitive substring of the faculty name.
    FacultyContains(String),
    /// Exact batch.
    BatchEquals(String),
    /// Exact student id.
    StudentEquals(String),
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl Predicate {
    /// Whether an attendance record satisfies this predicate.
    #[must_use]
    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        match self {
            Predicate::StudentIdContains(needle) => contains_ignore_case(&record.student_id, needle),
            Predicate::StudentNameContains(needle) => contains_ignore_case(&record.student_name, needle),
            Predicate::FacultyContains(needle) => contains_ignore_case(&record.faculty, needle),
            Predicate::BatchEquals(batch) => record.batch == *batch,
            Predicate::StudentEquals(id) => record.student_id == *id,
        }
    }

    /// Whether an extra-session record satisfies this predicate.
    ///
    /// Extra-session rows carry no name or faculty, so those predicates
    /// always hold for them. A row from an export without a batch column
    /// passes any batch predicate.
    #[must_use]
    pub fn matches_extra(&self, record: &ExtraSessionRecord) -> bool {
        match self {
            Predicate::BatchEquals(batch) => record.batch.is_empty() || record.batch == *batch,
            Predicate::StudentEquals(id) => record.student_id == *id,
            Predicate::StudentIdContains(needle) => contains_ignore_case(&record.student_id, needle),
            Predicate::StudentNameContains(_) | Predicate::FacultyContains(_) => true,
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl FilterConfig {
    /// The active predicates; empty or unset fields contribute none.
    #[must_use]
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(v) = non_empty(self.student_id.as_ref()) {
            predicates.push(Predicate::StudentIdContains(v.to_string()));
        }
        if let Some(v) = non_empty(self.student_name.as_ref()) {
            predicates.push(Predicate::StudentNameContains(v.to_string()));
        }
        if let Some(v) = non_empty(self.faculty.as_ref()) {
            predicates.push(Predicate::FacultyContains(v.to_string()));
        }
        if let Some(v) = non_empty(self.batch.as_ref()) {
            predicates.push(Predicate::BatchEquals(v.to_string()));
        }
        if let Some(v) = non_empty(self.student.as_ref()) {
            predicates.push(Predicate::StudentEquals(v.to_string()));
        }
        predicates
    }
}

/// Keep the records matching every predicate, in their original order.
#[must_use]
pub fn apply_predicates(records: &[AttendanceRecord], predicates: &[Predicate]) -> Vec<AttendanceRecord> {
    records
        .iter()
        .filter(|record| predicates.iter().all(|p| p.matches(record)))
        .cloned()
        .collect()
}

/// Apply the configured filters, then sort by (student_id, student_name).
///
/// The sort is stable, so rows of one student keep their original order.
#[must_use]
pub fn filter_attendance(records: &[AttendanceRecord], filters: &FilterConfig) -> Vec<AttendanceRecord> {
    let mut filtered = apply_predicates(records, &filters.predicates());
    filtered.sort_by(|a, b| {
        a.student_id
            .cmp(&b.student_id)
            .then_with(|| a.student_name.cmp(&b.student_name))
    });
    tracing::debug!(before = records.len(), after = filtered.len(), "filtered attendance");
    filtered
}

/// Narrow extra-session records to the configured batch and student scope.
#[must_use]
pub fn filter_extra_sessions(records: &[ExtraSessionRecord], filters: &FilterConfig) -> Vec<ExtraSessionRecord> {
    let predicates = filters.predicates();
    records
        .iter()
        .filter(|record| predicates.iter().all(|p| p.matches_extra(record)))
        .cloned()
        .collect()
}
