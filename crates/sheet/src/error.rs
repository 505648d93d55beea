use thiserror::Error;

/// Failures while decoding, accessing or encoding sheets.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Cell ({row}, {col}) is outside a {rows}x{cols} sheet")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Row {index} is outside a sheet of {count} rows")]
    RowIndexOutOfBounds { index: usize, count: usize },

    #[error("No column named '{name}'")]
    ColumnNotFound { name: String },

    #[error("No sheet named '{name}'")]
    SheetNotFound { name: String },

    #[error("A sheet named '{name}' already exists")]
    SheetAlreadyExists { name: String },

    #[error("Columns are not named: {0}")]
    ColumnsNotNamed(String),

    #[error("Row has {actual} cells, sheet has {expected} columns")]
    LengthMismatch { expected: usize, actual: usize },

    /// The bytes are not a workbook of the expected format.
    #[error("Could not decode {format} workbook: {message}")]
    Decode { format: String, message: String },

    #[error("Could not encode workbook: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, SheetError>;
