//! Error types for rollbook.

use thiserror::Error;

/// Result type for attendance pipeline operations.
pub type AttendanceResult<T> = Result<T, AttendanceError>;

/// Errors that halt one run of the attendance pipeline.
///
/// None of these are fatal to the hosting process: the caller turns each one
/// into a message via [`AttendanceError::user_message`] and waits for the next
/// interaction.
#[derive(Debug, Error)]
pub enum AttendanceError {
    /// The uploaded bytes are not a workbook of the format implied by the file name.
    #[error("Could not read '{file}': {reason}")]
    UnreadableFile { file: String, reason: String },

    /// A required column is absent after normalization.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Filters narrowed the working set to zero rows.
    #[error("No attendance records match the current selection")]
    EmptyResult,

    /// The output workbook could not be serialized.
    #[error("Export failed: {0}")]
    ExportFailed(String),

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AttendanceError {
    /// Create an unreadable-file error.
    pub fn unreadable(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnreadableFile {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing-column error.
    pub fn missing_column(name: impl Into<String>) -> Self {
        Self::MissingColumn(name.into())
    }

    /// Whether this condition should be shown as a warning rather than an error.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::EmptyResult)
    }

    /// Text shown to the person driving the interaction.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::UnreadableFile { file, .. } => {
                format!("'{file}' is not a readable .xls/.xlsx attendance export. ({self})")
            }
            Self::MissingColumn(name) => {
                format!("The uploaded file has no '{name}' column. Check that it is the right export.")
            }
            Self::EmptyResult => "No records match the selected filters; nothing to export.".to_string(),
            Self::ExportFailed(_) | Self::Config(_) => self.to_string(),
        }
    }
}
