use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use indexmap::IndexMap;

/// Named sheets in the order they will appear in a written workbook.
#[derive(Debug, Clone, Default)]
pub struct Book {
    sheets: IndexMap<String, Sheet>,
}

impl Book {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Sheet names in workbook order
    #[must_use]
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.keys().map(String::as_str).collect()
    }

    pub fn get_sheet(&self, name: &str) -> Result<&Sheet> {
        self.sheets.get(name).ok_or_else(|| SheetError::SheetNotFound {
            name: name.to_string(),
        })
    }

    /// Append `sheet` under `name`, renaming the sheet to match.
    ///
    /// Names must be unique within a book.
    pub fn add_sheet(&mut self, name: &str, mut sheet: Sheet) -> Result<()> {
        if self.sheets.contains_key(name) {
            return Err(SheetError::SheetAlreadyExists {
                name: name.to_string(),
            });
        }
        sheet.set_name(name);
        self.sheets.insert(name.to_string(), sheet);
        Ok(())
    }

    pub fn sheets(&self) -> impl Iterator<Item = (&str, &Sheet)> {
        self.sheets.iter().map(|(name, sheet)| (name.as_str(), sheet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_months_keep_insertion_order() {
        let mut book = Book::new();
        for month in ["March-2024", "January-2024", "February-2024"] {
            book.add_sheet(month, Sheet::new()).unwrap();
        }

        assert_eq!(book.len(), 3);
        assert_eq!(book.sheet_names(), vec!["March-2024", "January-2024", "February-2024"]);
        assert_eq!(book.get_sheet("January-2024").unwrap().name(), "January-2024");
    }

    #[test]
    fn test_same_name_twice_is_rejected() {
        let mut book = Book::new();
        book.add_sheet("March-2024", Sheet::new()).unwrap();
        let result = book.add_sheet("March-2024", Sheet::new());
        assert!(matches!(result, Err(SheetError::SheetAlreadyExists { ref name }) if name == "March-2024"));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_unknown_sheet() {
        let book = Book::new();
        assert!(book.is_empty());
        assert!(matches!(book.get_sheet("May-2024"), Err(SheetError::SheetNotFound { .. })));
    }
}
