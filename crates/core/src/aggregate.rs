//! Per-student attendance counts.
//!
//! The deduplication key for "a day attended" is always
//! (student_id, date): any number of rows for one student on one date count
//! once. A missing date is its own key value, so it counts once too.

use crate::record::{AttendanceRecord, CountedRecord, StudentKey, SummaryRow};
use chrono::NaiveDate;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Raw and deduplicated attendance counts for one student id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceCounts {
    pub duplicate_attendance_count: usize,
    pub unique_attendance_count: usize,
}

/// Compute counts keyed by student id.
#[must_use]
pub fn counts_by_student(records: &[AttendanceRecord]) -> HashMap<String, AttendanceCounts> {
    let mut raw: HashMap<&str, usize> = HashMap::new();
    let mut days: HashMap<&str, HashSet<Option<NaiveDate>>> = HashMap::new();

    for record in records {
        *raw.entry(record.student_id.as_str()).or_default() += 1;
        days.entry(record.student_id.as_str())
            .or_default()
            .insert(record.date);
    }

    raw.into_iter()
        .map(|(id, duplicate)| {
            let unique = days.get(id).map_or(0, HashSet::len);
            (
                id.to_string(),
                AttendanceCounts {
                    duplicate_attendance_count: duplicate,
                    unique_attendance_count: unique,
                },
            )
        })
        .collect()
}

/// Annotate every record with its student's counts, preserving row order.
#[must_use]
pub fn with_counts(records: &[AttendanceRecord]) -> Vec<CountedRecord> {
    let counts = counts_by_student(records);
    records
        .iter()
        .map(|record| {
            let c = counts.get(&record.student_id).copied().unwrap_or_default();
            CountedRecord {
                record: record.clone(),
                duplicate_attendance_count: c.duplicate_attendance_count,
                unique_attendance_count: c.unique_attendance_count,
            }
        })
        .collect()
}

/// Keep the first record of each (student_id, date) pair, preserving order.
#[must_use]
pub fn dedup_by_student_date(records: &[AttendanceRecord]) -> Vec<AttendanceRecord> {
    let mut seen: HashSet<(&str, Option<NaiveDate>)> = HashSet::new();
    records
        .iter()
        .filter(|record| seen.insert((record.student_id.as_str(), record.date)))
        .cloned()
        .collect()
}

/// One row per (student_id, student_name) with the count of distinct dates.
///
/// Rows appear in first-seen order of the input. A row without a readable
/// date is not a class taken, matching the month matrices that skip it.
#[must_use]
pub fn summarize(records: &[AttendanceRecord]) -> Vec<SummaryRow> {
    let mut classes: IndexMap<StudentKey, usize> = IndexMap::new();
    for record in dedup_by_student_date(records) {
        let taken = classes.entry(record.student_key()).or_default();
        if record.date.is_some() {
            *taken += 1;
        }
    }
    // Students whose only rows were deduplicated under another name still get a row.
    for record in records {
        classes.entry(record.student_key()).or_default();
    }

    classes
        .into_iter()
        .map(|(key, classes_taken)| SummaryRow {
            student_id: key.student_id,
            student_name: key.student_name,
            classes_taken,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, date: Option<(i32, u32, u32)>, faculty: &str) -> AttendanceRecord {
        AttendanceRecord {
            student_id: id.to_string(),
            student_name: name.to_string(),
            date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            faculty: faculty.to_string(),
            batch: "B1".to_string(),
        }
    }

    #[test]
    fn test_same_day_twice_counts_once() {
        let records = vec![
            record("S1", "Asha", Some((2024, 3, 5)), "Dr. Rao"),
            record("S1", "Asha", Some((2024, 3, 5)), "Prof. Iyer"),
        ];
        let counts = counts_by_student(&records);
        assert_eq!(counts["S1"].unique_attendance_count, 1);
        assert_eq!(counts["S1"].duplicate_attendance_count, 2);
    }

    #[test]
    fn test_unique_never_exceeds_duplicate() {
        let records = vec![
            record("S1", "Asha", Some((2024, 3, 5)), "a"),
            record("S1", "Asha", Some((2024, 3, 6)), "a"),
            record("S1", "Asha", Some((2024, 3, 6)), "b"),
            record("S2", "Bilal", Some((2024, 3, 5)), "a"),
            record("S2", "Bilal", Some((2024, 3, 7)), "a"),
            record("S3", "Chen", None, "a"),
            record("S3", "Chen", None, "b"),
        ];
        for (id, c) in counts_by_student(&records) {
            assert!(c.unique_attendance_count <= c.duplicate_attendance_count, "{id}");
        }
        let counts = counts_by_student(&records);
        // Equal exactly when no two rows share a date.
        assert_eq!(counts["S2"].unique_attendance_count, counts["S2"].duplicate_attendance_count);
        assert!(counts["S1"].unique_attendance_count < counts["S1"].duplicate_attendance_count);
        assert_eq!(counts["S3"].unique_attendance_count, 1);
    }

    #[test]
    fn test_with_counts_keeps_order() {
        let records = vec![
            record("S2", "Bilal", Some((2024, 3, 5)), "a"),
            record("S1", "Asha", Some((2024, 3, 5)), "a"),
            record("S2", "Bilal", Some((2024, 3, 5)), "b"),
        ];
        let counted = with_counts(&records);
        assert_eq!(counted[0].record.student_id, "S2");
        assert_eq!(counted[0].duplicate_attendance_count, 2);
        assert_eq!(counted[0].unique_attendance_count, 1);
        assert_eq!(counted[1].duplicate_attendance_count, 1);
    }

    #[test]
    fn test_dedup_keeps_first_of_each_day() {
        let records = vec![
            record("S1", "Asha", Some((2024, 3, 5)), "first"),
            record("S1", "Asha", Some((2024, 3, 5)), "second"),
            record("S1", "Asha", Some((2024, 3, 6)), "third"),
        ];
        let deduped = dedup_by_student_date(&records);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].faculty, "first");
        assert_eq!(deduped[1].faculty, "third");
    }

    #[test]
    fn test_summary_classes_taken() {
        let records = vec![
            record("S1", "Asha", Some((2024, 3, 5)), "a"),
            record("S1", "Asha", Some((2024, 3, 5)), "b"),
            record("S1", "Asha", Some((2024, 3, 9)), "a"),
            record("S2", "Bilal", Some((2024, 3, 5)), "a"),
        ];
        let summary = summarize(&records);
        assert_eq!(
            summary,
            vec![
                SummaryRow {
                    student_id: "S1".into(),
                    student_name: "Asha".into(),
                    classes_taken: 2,
                },
                SummaryRow {
                    student_id: "S2".into(),
                    student_name: "Bilal".into(),
                    classes_taken: 1,
                },
            ]
        );
    }

    #[test]
    fn test_summary_for_inconsistent_names() {
        let records = vec![
            record("S1", "Asha", Some((2024, 3, 5)), "a"),
            record("S1", "Aasha", Some((2024, 3, 5)), "a"),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].classes_taken, 1);
        assert_eq!(summary[1].classes_taken, 0);
    }

    #[test]
    fn test_summary_skips_unknown_days() {
        let records = vec![
            record("S1", "Asha", None, "a"),
            record("S1", "Asha", Some((2024, 3, 5)), "a"),
            record("S2", "Bilal", None, "a"),
        ];
        let summary = summarize(&records);
        assert_eq!(summary[0].classes_taken, 1);
        assert_eq!(summary[1].student_id, "S2");
        assert_eq!(summary[1].classes_taken, 0);
    }
}
