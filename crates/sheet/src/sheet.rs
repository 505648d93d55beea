use crate::cell::CellValue;
use crate::error::{Result, SheetError};
use std::collections::{HashMap, HashSet};

/// A rectangular grid of cells, stored row by row.
///
/// Once [`Sheet::name_columns_by_row`] has been called, row 0 is the header
/// and [`Sheet::data_rows`] yields everything below it.
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    data: Vec<Vec<CellValue>>,
    column_names: Option<Vec<String>>,
    column_index: Option<HashMap<String, usize>>,
}

impl Default for Sheet {
    fn default() -> Self {
        Self::with_name("Sheet1")
    }
}

impl Sheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_name(name: &str) -> Self {
        Sheet {
            name: name.to_string(),
            data: Vec::new(),
            column_names: None,
            column_index: None,
        }
    }

    /// Build an unnamed-column sheet from rows of convertible values.
    #[must_use]
    pub fn from_data<T: Into<CellValue>>(rows: Vec<Vec<T>>) -> Self {
        let mut sheet = Sheet::new();
        sheet.data = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        sheet
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Rows including the header, if any.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Width of the first row.
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cell at a 0-based (row, col); row 0 is the header on named sheets.
    pub fn get(&self, row: usize, col: usize) -> Result<&CellValue> {
        let out_of_bounds = || SheetError::IndexOutOfBounds {
            row,
            col,
            rows: self.row_count(),
            cols: self.col_count(),
        };
        self.data
            .get(row)
            .and_then(|cells| cells.get(col))
            .ok_or_else(out_of_bounds)
    }

    pub fn get_by_name(&self, row: usize, column: &str) -> Result<&CellValue> {
        self.get(row, self.column_index_by_name(column)?)
    }

    /// Append a row; it must match the width of the first row.
    pub fn row_append<T: Into<CellValue>>(&mut self, cells: Vec<T>) -> Result<()> {
        let row: Vec<CellValue> = cells.into_iter().map(Into::into).collect();
        if !self.data.is_empty() && row.len() != self.col_count() {
            return Err(SheetError::LengthMismatch {
                expected: self.col_count(),
                actual: row.len(),
            });
        }
        self.data.push(row);
        Ok(())
    }

    fn header_rows(&self) -> usize {
        usize::from(self.column_names.is_some())
    }

    /// Rows below the header (all rows when columns are unnamed).
    pub fn data_rows(&self) -> impl Iterator<Item = &Vec<CellValue>> {
        self.data.iter().skip(self.header_rows())
    }

    #[must_use]
    pub fn data_row_count(&self) -> usize {
        self.data.len().saturating_sub(self.header_rows())
    }

    /// Drop data rows in which every cell is blank; returns how many went.
    pub fn remove_empty_rows(&mut self) -> usize {
        let before = self.data.len();
        let header_len = self.header_rows().min(before);
        let header: Vec<Vec<CellValue>> = self.data.drain(..header_len).collect();
        self.data.retain(|row| !row.iter().all(CellValue::is_blank));
        let removed = before - header.len() - self.data.len();
        self.data.splice(0..0, header);
        removed
    }

    // ===== Named Access =====

    /// Take column names from a row. Repeated names resolve to the first.
    ///
    /// # Errors
    ///
    /// Returns `SheetError::RowIndexOutOfBounds` if the row does not exist.
    pub fn name_columns_by_row(&mut self, row_index: usize) -> Result<()> {
        let header_row = self.data.get(row_index).ok_or(SheetError::RowIndexOutOfBounds {
            index: row_index,
            count: self.row_count(),
        })?;
        let names: Vec<String> = header_row.iter().map(CellValue::as_str).collect();
        self.column_names = Some(names);
        self.rebuild_column_index();
        Ok(())
    }

    #[must_use]
    pub fn column_names(&self) -> Option<&Vec<String>> {
        self.column_names.as_ref()
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index
            .as_ref()
            .is_some_and(|index| index.contains_key(name))
    }

    pub fn column_index_by_name(&self, name: &str) -> Result<usize> {
        self.column_index
            .as_ref()
            .ok_or_else(|| {
                SheetError::ColumnsNotNamed("Call name_columns_by_row() first".to_string())
            })?
            .get(name)
            .copied()
            .ok_or_else(|| SheetError::ColumnNotFound {
                name: name.to_string(),
            })
    }

    /// Drop whichever of `columns` exist, returning how many were dropped.
    pub fn remove_columns_if_present(&mut self, columns: &[&str]) -> usize {
        let Some(names) = &self.column_names else {
            return 0;
        };

        let remove_set: HashSet<usize> = columns
            .iter()
            .filter_map(|name| self.column_index_by_name(name).ok())
            .collect();
        if remove_set.is_empty() {
            return 0;
        }

        let kept: Vec<usize> = (0..names.len()).filter(|i| !remove_set.contains(i)).collect();
        let kept_names = kept.iter().map(|&i| names[i].clone()).collect();

        for row in &mut self.data {
            *row = kept
                .iter()
                .map(|&i| row.get(i).cloned().unwrap_or_default())
                .collect();
        }

        self.column_names = Some(kept_names);
        self.rebuild_column_index();
        remove_set.len()
    }

    fn rebuild_column_index(&mut self) {
        self.column_index = self.column_names.as_ref().map(|names| {
            let mut index = HashMap::new();
            for (i, name) in names.iter().enumerate() {
                index.entry(name.clone()).or_insert(i);
            }
            index
        });
    }

    /// All rows, header included.
    #[must_use]
    pub fn data(&self) -> &Vec<Vec<CellValue>> {
        &self.data
    }

    /// Column names are not refreshed; rename after replacing the header row.
    pub fn data_mut(&mut self) -> &mut Vec<Vec<CellValue>> {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Sheet {
        let mut sheet = Sheet::from_data(vec![
            vec!["Sr No", "Student ID", "Student Name", "Remark"],
            vec!["1", "S1", "Asha", ""],
            vec!["2", "S2", "Bilal", "late"],
        ]);
        sheet.name_columns_by_row(0).unwrap();
        sheet
    }

    #[test]
    fn test_new_sheet() {
        let sheet = Sheet::new();
        assert_eq!(sheet.name(), "Sheet1");
        assert!(sheet.is_empty());
        assert_eq!(sheet.row_count(), 0);
        assert_eq!(sheet.col_count(), 0);
    }

    #[test]
    fn test_named_columns() {
        let sheet = roster();
        assert!(sheet.has_column("Student ID"));
        assert!(!sheet.has_column("Date"));
        assert_eq!(sheet.get_by_name(1, "Student Name").unwrap().as_str(), "Asha");
        assert_eq!(sheet.data_row_count(), 2);
        assert_eq!(sheet.data_rows().count(), 2);
    }

    #[test]
    fn test_unnamed_column_lookup_fails() {
        let sheet = Sheet::from_data(vec![vec!["a"]]);
        assert!(matches!(
            sheet.column_index_by_name("a"),
            Err(SheetError::ColumnsNotNamed(_))
        ));
    }

    #[test]
    fn test_remove_columns_if_present() {
        let mut sheet = roster();
        let removed = sheet.remove_columns_if_present(&["Sr No", "Remark", "Signature"]);
        assert_eq!(removed, 2);
        assert_eq!(sheet.col_count(), 2);
        assert_eq!(
            sheet.column_names().unwrap(),
            &vec!["Student ID".to_string(), "Student Name".to_string()]
        );
        assert_eq!(sheet.get_by_name(2, "Student ID").unwrap().as_str(), "S2");

        // Second pass is a no-op.
        assert_eq!(sheet.remove_columns_if_present(&["Sr No", "Remark"]), 0);
    }

    #[test]
    fn test_remove_empty_rows_keeps_header() {
        let mut sheet = Sheet::from_data(vec![
            vec![CellValue::from("id"), CellValue::from("name")],
            vec![CellValue::Null, CellValue::from(" ")],
            vec![CellValue::from("S1"), CellValue::Null],
        ]);
        sheet.name_columns_by_row(0).unwrap();
        assert_eq!(sheet.remove_empty_rows(), 1);
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.get(0, 0).unwrap().as_str(), "id");
    }

    #[test]
    fn test_row_length_mismatch() {
        let mut sheet = Sheet::from_data(vec![vec![1, 2, 3]]);
        let result = sheet.row_append(vec![1, 2]);
        assert!(matches!(result, Err(SheetError::LengthMismatch { .. })));
    }
}
