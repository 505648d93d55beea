//! Pipeline configuration.
//!
//! Everything the interactive layer would otherwise hold as ambient state
//! (banner row counts, matrix symbols, the current filter selections) is
//! carried explicitly in a [`PipelineConfig`].

use crate::error::{AttendanceError, AttendanceResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default banner rows above the header of the regular attendance export.
pub const ATTENDANCE_SKIP_ROWS: usize = 6;
/// Default banner rows above the header of the extra-session export.
pub const EXTRA_SESSION_SKIP_ROWS: usize = 4;

/// Value every matrix cell starts with before presence is marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceFill {
    /// Every day starts as absent (`A`).
    #[default]
    Absent,
    /// Days without attendance stay blank.
    Blank,
}

/// Literal written into a matrix cell for a regular-session attendance.
///
/// Only symbols that cannot be mistaken for the absent (`A`) or extra (`E`)
/// marks are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PresenceMarker {
    #[default]
    #[serde(rename = "P")]
    Letter,
    #[serde(rename = ".")]
    Dot,
}

impl PresenceMarker {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            PresenceMarker::Letter => "P",
            PresenceMarker::Dot => ".",
        }
    }
}

/// Row predicates selected by the user. Unset or empty values are no-ops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Case-insensitive substring of the student id.
    pub student_id: Option<String>,
    /// Case-insensitive substring of the student name.
    pub student_name: Option<String>,
    /// Case-insensitive substring of the faculty name.
    pub faculty: Option<String>,
    /// Exact batch.
    pub batch: Option<String>,
    /// Exact student id chosen from the single-select list.
    pub student: Option<String>,
}

impl FilterConfig {
    /// Set the student id substring
    #[must_use]
    pub fn with_student_id(mut self, value: impl Into<String>) -> Self {
        self.student_id = Some(value.into());
        self
    }

    /// Set the student name substring
    #[must_use]
    pub fn with_student_name(mut self, value: impl Into<String>) -> Self {
        self.student_name = Some(value.into());
        self
    }

    /// Set the faculty substring
    #[must_use]
    pub fn with_faculty(mut self, value: impl Into<String>) -> Self {
        self.faculty = Some(value.into());
        self
    }

    /// Set the exact batch
    #[must_use]
    pub fn with_batch(mut self, value: impl Into<String>) -> Self {
        self.batch = Some(value.into());
        self
    }

    /// Set the exact student id
    #[must_use]
    pub fn with_student(mut self, value: impl Into<String>) -> Self {
        self.student = Some(value.into());
        self
    }

    /// Overlay `other` on top of `self`; set fields in `other` win.
    #[must_use]
    pub fn merged_with(self, other: FilterConfig) -> Self {
        FilterConfig {
            student_id: other.student_id.or(self.student_id),
            student_name: other.student_name.or(self.student_name),
            faculty: other.faculty.or(self.faculty),
            batch: other.batch.or(self.batch),
            student: other.student.or(self.student),
        }
    }
}

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub attendance_skip_rows: usize,
    pub extra_skip_rows: usize,
    pub presence_marker: PresenceMarker,
    pub absence_fill: AbsenceFill,
    pub filters: FilterConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            attendance_skip_rows: ATTENDANCE_SKIP_ROWS,
            extra_skip_rows: EXTRA_SESSION_SKIP_ROWS,
            presence_marker: PresenceMarker::Letter,
            absence_fill: AbsenceFill::Absent,
            filters: FilterConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a `.yaml`/`.yml` or `.json` file.
    ///
    /// Fields missing from the file keep their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> AttendanceResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| AttendanceError::Config(format!("{}: {e}", path.display())))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let config: PipelineConfig = match extension.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&text)
                .map_err(|e| AttendanceError::Config(format!("{}: {e}", path.display())))?,
            "json" => serde_json::from_str(&text)
                .map_err(|e| AttendanceError::Config(format!("{}: {e}", path.display())))?,
            other => {
                return Err(AttendanceError::Config(format!(
                    "Unsupported configuration format '{other}' for {}",
                    path.display()
                )))
            }
        };
        Ok(config)
    }
}
