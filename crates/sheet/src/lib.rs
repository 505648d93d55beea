//! Sheet/Book module for rollbook
//!
//! Provides the tabular substrate the attendance pipeline is built on: a
//! row-major [`Sheet`] with named columns, an insertion-ordered [`Book`] of
//! sheets, decoding of uploaded spreadsheet bytes, and encoding of a book to
//! `.xlsx` bytes.
//!
//! # Examples
//!
//! ## Named column access
//!
//! ```
//! use rollbook_sheet::Sheet;
//!
//! let mut sheet = Sheet::from_data(vec![
//!     vec!["Student ID", "Student Name"],
//!     vec!["S1", "Asha"],
//! ]);
//!
//! sheet.name_columns_by_row(0).unwrap();
//! assert_eq!(sheet.get_by_name(1, "Student Name").unwrap().as_str(), "Asha");
//! ```
//!
//! ## Working with books
//!
//! ```
//! use rollbook_sheet::{Book, Sheet, XlsxWriteOptions};
//!
//! let mut book = Book::new();
//! book.add_sheet("March-2024", Sheet::from_data(vec![vec!["P"]])).unwrap();
//! book.add_sheet("April-2024", Sheet::from_data(vec![vec!["A"]])).unwrap();
//!
//! let bytes = book.to_xlsx_bytes(&XlsxWriteOptions::default()).unwrap();
//! assert!(!bytes.is_empty());
//! ```

mod book;
mod cell;
mod error;
mod sheet;
mod xlsx;

/// Re-export book type.
pub use book::Book;
/// Re-export cell value type.
pub use cell::CellValue;
/// Re-export sheet error types.
pub use error::{Result, SheetError};
/// Re-export sheet type.
pub use sheet::Sheet;
/// Re-export spreadsheet format and read/write options.
pub use xlsx::{ExcelFormat, XlsxReadOptions, XlsxWriteOptions};
