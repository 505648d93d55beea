use crate::book::Book;
use crate::cell::CellValue;
use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use calamine::{Data, Range, Reader, Xls, Xlsx};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::collections::HashMap;
use std::fmt::Display;
use std::io::{Cursor, Read, Seek};

/// Spreadsheet container formats understood by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcelFormat {
    /// Legacy binary workbook (`.xls`)
    Xls,
    /// XML-zip workbook (`.xlsx`, `.xlsm`, ...)
    Xlsx,
}

impl ExcelFormat {
    /// Pick the decoder from a file name. Only the legacy `.xls` extension
    /// selects the binary decoder; anything else is treated as XML-zip.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Self {
        if file_name.to_lowercase().ends_with(".xls") {
            ExcelFormat::Xls
        } else {
            ExcelFormat::Xlsx
        }
    }

    fn label(self) -> &'static str {
        match self {
            ExcelFormat::Xls => "xls",
            ExcelFormat::Xlsx => "xlsx",
        }
    }
}

/// Options for reading Excel files
#[derive(Debug, Clone, Default)]
pub struct XlsxReadOptions {
    /// Number of banner rows above the header row
    pub skip_rows: usize,
    /// Whether the first row after the skipped rows contains headers
    pub has_headers: bool,
}

impl XlsxReadOptions {
    /// Set whether the first row contains headers
    #[must_use]
    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    /// Set the number of rows to skip before the header row
    #[must_use]
    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = skip_rows;
        self
    }
}

/// Options for writing Excel files
#[derive(Debug, Clone, Default)]
pub struct XlsxWriteOptions {
    /// Render the header row of named sheets in bold and freeze it
    pub bold_header: bool,
    /// Number of leading columns kept visible while scrolling
    pub freeze_columns: u16,
}

impl XlsxWriteOptions {
    /// Set whether the header row is bold and frozen
    #[must_use]
    pub fn with_bold_header(mut self, bold_header: bool) -> Self {
        self.bold_header = bold_header;
        self
    }

    /// Set the number of frozen leading columns
    #[must_use]
    pub fn with_freeze_columns(mut self, freeze_columns: u16) -> Self {
        self.freeze_columns = freeze_columns;
        self
    }
}

/// Convert calamine Data to CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::DateTime(dt) => {
            // Excel stores dates as days since 1899-12-30
            CellValue::Float(dt.as_f64())
        }
        Data::DateTimeIso(s) => CellValue::String(s.clone()),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(format!("#ERROR: {e:?}")),
    }
}

fn decode_error(format: ExcelFormat, err: impl Display) -> SheetError {
    SheetError::Decode {
        format: format.label().to_string(),
        message: err.to_string(),
    }
}

fn encode_error(err: impl Display) -> SheetError {
    SheetError::Encode(err.to_string())
}

/// Open a workbook with decoder `R` and return the range of its first sheet
fn read_first_range<RS, R>(reader: RS, format: ExcelFormat) -> Result<Option<Range<Data>>>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: Display,
{
    let mut workbook = R::new(reader).map_err(|e| decode_error(format, e))?;
    let Some(first) = workbook.sheet_names().first().cloned() else {
        return Ok(None);
    };
    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| decode_error(format, e))?;
    Ok(Some(range))
}

/// Make header names unique the way dataframe readers do: `Date`, `Date.1`, ...
fn dedupe_header_names(names: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    names
        .into_iter()
        .map(|name| {
            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name
            } else {
                format!("{name}.{count}")
            };
            *count += 1;
            unique
        })
        .collect()
}

impl Sheet {
    /// Load the first sheet of an in-memory workbook.
    ///
    /// The decoder is chosen from `file_name` (see [`ExcelFormat::from_file_name`]).
    /// Row positions are absolute: `skip_rows` counts rows from the top of the
    /// sheet even when the leading rows are blank. With headers enabled the
    /// header names are whitespace-trimmed, repeated names get a `.n` suffix,
    /// and fully blank data rows are dropped. A workbook with no more rows than
    /// `skip_rows` yields an empty sheet.
    ///
    /// # Errors
    ///
    /// Returns `SheetError::Decode` if the bytes are not a workbook of the
    /// chosen format.
    pub fn from_excel_bytes(bytes: &[u8], file_name: &str, options: &XlsxReadOptions) -> Result<Self> {
        let format = ExcelFormat::from_file_name(file_name);
        let cursor = Cursor::new(bytes);
        let range = match format {
            ExcelFormat::Xls => read_first_range::<_, Xls<_>>(cursor, format)?,
            ExcelFormat::Xlsx => read_first_range::<_, Xlsx<_>>(cursor, format)?,
        };

        let mut sheet = Sheet::with_name(file_name);
        let Some(range) = range else {
            return Ok(sheet);
        };
        let Some((start_row, _)) = range.start() else {
            return Ok(sheet);
        };

        // calamine ranges begin at the first used row; re-anchor to the top.
        let start_row = start_row as usize;
        let width = range.width();
        let leading_blank = start_row.saturating_sub(options.skip_rows);
        let skip_in_range = options.skip_rows.saturating_sub(start_row);

        let mut data: Vec<Vec<CellValue>> = Vec::new();
        for _ in 0..leading_blank {
            data.push(vec![CellValue::Null; width]);
        }
        for row in range.rows().skip(skip_in_range) {
            data.push(row.iter().map(data_to_cell_value).collect());
        }

        if data.is_empty() {
            return Ok(sheet);
        }

        if options.has_headers {
            let names: Vec<String> = data[0]
                .iter()
                .map(|cell| cell.as_str().trim().to_string())
                .collect();
            data[0] = dedupe_header_names(names)
                .into_iter()
                .map(CellValue::String)
                .collect();
        }

        *sheet.data_mut() = data;

        if options.has_headers {
            sheet.name_columns_by_row(0)?;
            sheet.remove_empty_rows();
        }

        Ok(sheet)
    }

    /// Write sheet data to a worksheet
    fn write_to_worksheet(&self, worksheet: &mut Worksheet, options: &XlsxWriteOptions) -> Result<()> {
        worksheet.set_name(self.name()).map_err(encode_error)?;

        let header_format = Format::new().set_bold();
        let style_header = options.bold_header && self.column_names().is_some();

        for (row_idx, row) in self.data().iter().enumerate() {
            let row_num = u32::try_from(row_idx).map_err(|_| encode_error("Row index overflow"))?;
            for (col_idx, cell) in row.iter().enumerate() {
                let col_num =
                    u16::try_from(col_idx).map_err(|_| encode_error("Column index overflow"))?;

                match cell {
                    CellValue::Null => {} // Leave empty
                    CellValue::Bool(b) => {
                        worksheet
                            .write_boolean(row_num, col_num, *b)
                            .map_err(encode_error)?;
                    }
                    CellValue::Int(i) => {
                        // Note: Excel stores all numbers as f64, so integers > 2^53
                        // (9,007,199,254,740,992) may lose precision
                        worksheet
                            .write_number(row_num, col_num, *i as f64)
                            .map_err(encode_error)?;
                    }
                    CellValue::Float(f) => {
                        worksheet
                            .write_number(row_num, col_num, *f)
                            .map_err(encode_error)?;
                    }
                    CellValue::String(s) if style_header && row_idx == 0 => {
                        worksheet
                            .write_string_with_format(row_num, col_num, s, &header_format)
                            .map_err(encode_error)?;
                    }
                    CellValue::String(s) => {
                        worksheet
                            .write_string(row_num, col_num, s)
                            .map_err(encode_error)?;
                    }
                }
            }
        }

        if style_header || options.freeze_columns > 0 {
            let freeze_row = u32::from(style_header);
            worksheet
                .set_freeze_panes(freeze_row, options.freeze_columns)
                .map_err(encode_error)?;
        }

        Ok(())
    }
}

impl Book {
    /// Serialize the book to `.xlsx` bytes, one worksheet per sheet in order.
    ///
    /// # Errors
    ///
    /// Returns `SheetError::Encode` for an empty book, an invalid sheet name
    /// (over 31 characters or containing `[]:*?/\`), or a writer failure.
    pub fn to_xlsx_bytes(&self, options: &XlsxWriteOptions) -> Result<Vec<u8>> {
        if self.is_empty() {
            return Err(encode_error("a workbook needs at least one sheet"));
        }

        let mut workbook = Workbook::new();
        for (_, sheet) in self.sheets() {
            let worksheet = workbook.add_worksheet();
            sheet.write_to_worksheet(worksheet, options)?;
        }

        workbook.save_to_buffer().map_err(encode_error)
    }
}
