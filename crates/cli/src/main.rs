//! # rollbook-cli
//!
//! Command-line front end for rollbook: upload attendance exports, browse the
//! filtered table, and download per-month attendance workbooks.

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::util::pretty::pretty_format_batches;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rollbook_core::{select_columns, AttendanceError, Column, FilterConfig, Pipeline, PipelineConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// rollbook - attendance exports to monthly registers
#[derive(Parser)]
#[command(name = "rollbook")]
#[command(author, version, about = "Attendance views and monthly registers from LMS exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (.yaml, .yml or .json)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format (table, csv, json)
    #[arg(short = 'f', long = "format", global = true, default_value = "table")]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Show the filtered attendance table with per-student counts
    View {
        #[command(flatten)]
        input: Input,
        #[command(flatten)]
        filters: FilterArgs,
        /// Columns to show, comma separated (default: all)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<Column>,
    },
    /// Show classes taken per student
    Summary {
        #[command(flatten)]
        input: Input,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// List the batches in an export
    Batches {
        #[command(flatten)]
        input: Input,
    },
    /// List the student ids in a batch
    Students {
        #[command(flatten)]
        input: Input,
        /// Batch to list (default: `filters.batch` from the config file)
        #[arg(short, long)]
        batch: Option<String>,
    },
    /// Write the monthly attendance workbook for a batch
    Export {
        #[command(flatten)]
        input: Input,
        /// Batch to export (default: `filters.batch` from the config file)
        #[arg(short, long)]
        batch: Option<String>,
        /// Limit the register to one student id (default: `filters.student`)
        #[arg(long)]
        student: Option<String>,
        /// Extra-session export to merge in
        #[arg(long, value_name = "FILE")]
        extra: Option<PathBuf>,
        /// Directory to write the workbook to
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,
        /// Use the `_Monthwise` file name
        #[arg(long)]
        monthwise: bool,
    },
}

#[derive(Args)]
struct Input {
    /// Attendance export (.xls or .xlsx)
    #[arg(short, long, value_name = "FILE")]
    attendance: PathBuf,
}

#[derive(Args, Default)]
struct FilterArgs {
    /// Student id contains (case-insensitive)
    #[arg(long)]
    student_id: Option<String>,
    /// Student name contains (case-insensitive)
    #[arg(long)]
    student_name: Option<String>,
    /// Faculty contains (case-insensitive)
    #[arg(long)]
    faculty: Option<String>,
    /// Exact batch
    #[arg(short, long)]
    batch: Option<String>,
    /// Exact student id
    #[arg(long)]
    student: Option<String>,
}

impl From<FilterArgs> for FilterConfig {
    fn from(args: FilterArgs) -> Self {
        FilterConfig {
            student_id: args.student_id,
            student_name: args.student_name,
            faculty: args.faculty,
            batch: args.batch,
            student: args.student,
        }
    }
}

/// Output format for tables.
#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Pretty table output (default)
    #[default]
    Table,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

/// Whether an error is only a warning about an empty selection.
fn is_warning(err: &anyhow::Error) -> bool {
    err.downcast_ref::<AttendanceError>()
        .is_some_and(AttendanceError::is_warning)
}

/// Print an error for the user and pick the exit status.
fn report(err: &anyhow::Error) -> ExitCode {
    if is_warning(err) {
        eprintln!("{} {}", "Warning:".yellow().bold(), user_text(err));
        return ExitCode::SUCCESS;
    }
    eprintln!("{} {}", "Error:".red().bold(), user_text(err));
    ExitCode::FAILURE
}

fn user_text(err: &anyhow::Error) -> String {
    match err.downcast_ref::<AttendanceError>() {
        Some(attendance) => attendance.user_message(),
        None => format!("{err:#}"),
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => Ok(PipelineConfig::from_path(path)?),
        None => Ok(PipelineConfig::default()),
    }
}

/// Read an upload, returning its bytes and file name.
fn read_upload(path: &Path) -> Result<(Vec<u8>, String)> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok((bytes, name))
}

/// Batch and student scope for batch-level commands.
///
/// Flags win over the configuration file. A batch must come from one of them.
fn batch_scope(
    config: &FilterConfig,
    batch: Option<String>,
    student: Option<String>,
) -> Result<(String, Option<String>)> {
    let scope = FilterConfig {
        batch,
        student,
        ..FilterConfig::default()
    };
    let merged = config.clone().merged_with(scope);
    let batch = merged
        .batch
        .filter(|b| !b.trim().is_empty())
        .ok_or_else(|| {
            AttendanceError::Config("no batch selected; pass --batch or set filters.batch".to_string())
        })?;
    let student = merged.student.filter(|s| !s.trim().is_empty());
    Ok((batch, student))
}

fn load_pipeline(config: PipelineConfig, input: &Input) -> Result<Pipeline> {
    let mut pipeline = Pipeline::new(config);
    let (bytes, name) = read_upload(&input.attendance)?;
    pipeline.load_attendance(&bytes, &name)?;
    Ok(pipeline)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let format = cli.format;

    match cli.command {
        Command::View {
            input,
            filters,
            columns,
        } => {
            let filters = config.filters.clone().merged_with(filters.into());
            let pipeline = load_pipeline(config, &input)?;
            let rows = pipeline.view(&filters)?;
            let (headers, cells) = select_columns(&rows, &columns);
            print_rows(&headers, &cells, format)
        }
        Command::Summary { input, filters } => {
            let filters = config.filters.clone().merged_with(filters.into());
            let pipeline = load_pipeline(config, &input)?;
            let summary = pipeline.summary(&filters)?;
            let cells: Vec<Vec<String>> = summary
                .iter()
                .map(|row| {
                    vec![
                        row.student_id.clone(),
                        row.student_name.clone(),
                        row.classes_taken.to_string(),
                    ]
                })
                .collect();
            print_rows(&["Student ID", "Student Name", "Classes Taken"], &cells, format)
        }
        Command::Batches { input } => {
            let pipeline = load_pipeline(config, &input)?;
            let cells: Vec<Vec<String>> = pipeline.batches()?.into_iter().map(|b| vec![b]).collect();
            print_rows(&["Batch"], &cells, format)
        }
        Command::Students { input, batch } => {
            let (batch, _) = batch_scope(&config.filters, batch, None)?;
            let pipeline = load_pipeline(config, &input)?;
            let cells: Vec<Vec<String>> = pipeline
                .students(&batch)?
                .into_iter()
                .map(|s| vec![s])
                .collect();
            print_rows(&["Student ID"], &cells, format)
        }
        Command::Export {
            input,
            batch,
            student,
            extra,
            output,
            monthwise,
        } => {
            let (batch, student) = batch_scope(&config.filters, batch, student)?;
            let mut pipeline = load_pipeline(config, &input)?;
            if let Some(extra) = extra {
                let (bytes, name) = read_upload(&extra)?;
                pipeline.load_extra_sessions(&bytes, &name)?;
            }

            let artifact = pipeline.export_batch(&batch, student.as_deref(), monthwise)?;
            let path = output.join(&artifact.file_name);
            std::fs::write(&path, &artifact.bytes)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;

            println!(
                "{} {} ({})",
                "Wrote".green().bold(),
                path.display(),
                artifact.sheet_names.join(", ")
            );
            Ok(())
        }
    }
}

/// Print string rows in the chosen format.
fn print_rows(headers: &[&str], rows: &[Vec<String>], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let batch = rows_to_batch(headers, rows)?;
            println!("{}", pretty_format_batches(&[batch])?);
        }
        OutputFormat::Json => {
            let json = rows_to_json(headers, rows);
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record(headers)?;
            for row in rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

/// Build an all-text Arrow batch for pretty printing.
fn rows_to_batch(headers: &[&str], rows: &[Vec<String>]) -> Result<RecordBatch> {
    let fields: Vec<Field> = headers
        .iter()
        .map(|name| Field::new(*name, DataType::Utf8, true))
        .collect();
    let columns: Vec<ArrayRef> = (0..headers.len())
        .map(|col| {
            let values: StringArray = rows.iter().map(|row| row.get(col).map(String::as_str)).collect();
            Arc::new(values) as ArrayRef
        })
        .collect();
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Convert rows to an array of JSON objects keyed by header.
fn rows_to_json(headers: &[&str], rows: &[Vec<String>]) -> Vec<serde_json::Value> {
    rows.iter()
        .map(|row| {
            let object: serde_json::Map<String, serde_json::Value> = headers
                .iter()
                .zip(row)
                .map(|(h, v)| ((*h).to_string(), serde_json::Value::String(v.clone())))
                .collect();
            serde_json::Value::Object(object)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // CLI argument parsing tests
    // ========================================================================

    #[test]
    fn test_cli_parse_view() {
        let cli = Cli::parse_from([
            "rollbook",
            "view",
            "-a",
            "attendance.xlsx",
            "--faculty",
            "rao",
            "--columns",
            "student_id,date",
        ]);
        match cli.command {
            Command::View {
                input,
                filters,
                columns,
            } => {
                assert_eq!(input.attendance, PathBuf::from("attendance.xlsx"));
                assert_eq!(filters.faculty.as_deref(), Some("rao"));
                assert_eq!(columns, vec![Column::StudentId, Column::Date]);
            }
            _ => panic!("expected view"),
        }
    }

    #[test]
    fn test_cli_parse_export() {
        let cli = Cli::parse_from([
            "rollbook",
            "export",
            "-a",
            "a.xls",
            "-b",
            "B1",
            "--extra",
            "extra.xlsx",
            "--monthwise",
        ]);
        match cli.command {
            Command::Export {
                batch,
                student,
                extra,
                output,
                monthwise,
                ..
            } => {
                assert_eq!(batch.as_deref(), Some("B1"));
                assert!(student.is_none());
                assert_eq!(extra, Some(PathBuf::from("extra.xlsx")));
                assert_eq!(output, PathBuf::from("."));
                assert!(monthwise);
            }
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn test_cli_parse_global_flags() {
        let cli = Cli::parse_from(["rollbook", "batches", "-a", "a.xlsx", "-v", "-f", "json"]);
        assert!(cli.verbose);
        assert!(matches!(cli.format, OutputFormat::Json));

        let cli = Cli::parse_from(["rollbook", "batches", "-a", "a.xlsx"]);
        assert!(matches!(cli.format, OutputFormat::Table));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_export_batch_from_config_file() {
        let cli = Cli::try_parse_from(["rollbook", "export", "-a", "a.xlsx"]).unwrap();
        let Command::Export { batch, student, .. } = cli.command else {
            panic!("expected export");
        };
        assert!(batch.is_none());

        let file = FilterConfig::default().with_batch("B1").with_student("S2");
        let (batch, student) = batch_scope(&file, batch, student).unwrap();
        assert_eq!(batch, "B1");
        assert_eq!(student.as_deref(), Some("S2"));

        let (batch, student) = batch_scope(&file, Some("B3".to_string()), None).unwrap();
        assert_eq!(batch, "B3");
        assert_eq!(student.as_deref(), Some("S2"));
    }

    #[test]
    fn test_export_without_any_batch_fails() {
        let err = batch_scope(&FilterConfig::default().with_student("S2"), None, None).unwrap_err();
        assert!(matches!(err.downcast_ref::<AttendanceError>(), Some(AttendanceError::Config(_))));
        assert!(!is_warning(&err));
    }

    #[test]
    fn test_filter_args_into_config() {
        let args = FilterArgs {
            batch: Some("B1".to_string()),
            ..FilterArgs::default()
        };
        let config = FilterConfig::default().with_faculty("rao").merged_with(args.into());
        assert_eq!(config.batch.as_deref(), Some("B1"));
        assert_eq!(config.faculty.as_deref(), Some("rao"));
    }

    // ========================================================================
    // Output tests
    // ========================================================================

    #[test]
    fn test_rows_to_batch() {
        let rows = vec![
            vec!["S1".to_string(), "Asha".to_string()],
            vec!["S2".to_string(), "Bilal".to_string()],
        ];
        let batch = rows_to_batch(&["Student ID", "Student Name"], &rows).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 2);

        let formatted = pretty_format_batches(&[batch]).unwrap().to_string();
        assert!(formatted.contains("Student Name"));
        assert!(formatted.contains("Bilal"));
    }

    #[test]
    fn test_rows_to_json() {
        let rows = vec![vec!["S1".to_string(), "3".to_string()]];
        let json = rows_to_json(&["Student ID", "Classes Taken"], &rows);
        assert_eq!(json[0]["Student ID"], "S1");
        assert_eq!(json[0]["Classes Taken"], "3");
    }

    #[test]
    fn test_warnings_exit_cleanly() {
        assert!(is_warning(&anyhow::Error::new(AttendanceError::EmptyResult)));
        assert!(!is_warning(&anyhow::Error::new(AttendanceError::missing_column("Date"))));
        assert!(!is_warning(&anyhow::anyhow!("disk full")));

        let error = anyhow::Error::new(AttendanceError::missing_column("Date"));
        assert!(user_text(&error).contains("'Date'"));
    }

    #[test]
    fn test_missing_upload_is_an_error() {
        let err = read_upload(Path::new("/nonexistent/attendance.xlsx")).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }
}
