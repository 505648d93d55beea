//! # rollbook-core
//!
//! Attendance processing for learning-management exports.
//!
//! This crate provides:
//! - Typed attendance and extra-session records
//! - Schema normalization of loaded sheets
//! - Row filters, per-student counts and summaries
//! - Per-month attendance matrices and their `.xlsx` export
//!
//! ```no_run
//! use rollbook_core::{Pipeline, PipelineConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pipeline = Pipeline::new(PipelineConfig::default());
//! pipeline.load_attendance(&std::fs::read("attendance.xlsx")?, "attendance.xlsx")?;
//! let artifact = pipeline.export_batch("B1", None, false)?;
//! std::fs::write(&artifact.file_name, &artifact.bytes)?;
//! # Ok(())
//! # }
//! ```

/// Per-student counts and summaries.
pub mod aggregate;
/// Pipeline settings and filter selections.
pub mod config;
/// Date coercion helpers.
pub mod datetime;
/// Error types and result aliases.
pub mod error;
/// Workbook export.
pub mod export;
/// Row predicates.
pub mod filter;
/// Spreadsheet loading.
pub mod loader;
/// Month matrix construction.
pub mod matrix;
/// Sheet to record normalization.
pub mod normalize;
/// The end-to-end pipeline.
pub mod pipeline;
/// Typed record schemas.
pub mod record;

pub use config::{AbsenceFill, FilterConfig, PipelineConfig, PresenceMarker};
pub use error::{AttendanceError, AttendanceResult};
pub use matrix::{AttendanceMatrix, Mark, MatrixRow, MonthKey};
pub use pipeline::{ExportArtifact, Pipeline};
pub use record::{
    select_columns, AttendanceRecord, Column, CountedRecord, ExtraSessionRecord, StudentKey, SummaryRow,
};
