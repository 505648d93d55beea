//! Date coercion for spreadsheet cells.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use rollbook_sheet::CellValue;

/// Day zero of the 1900 date system, accounting for the phantom 1900-02-29.
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Text layouts seen in attendance exports, tried in order.
///
/// All-numeric dates are month-first whatever the separator; day-first is
/// only reached when the leading number cannot be a month.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m.%d.%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Convert an Excel serial date (days since 1899-12-30) to a calendar date.
#[must_use]
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let (y, m, d) = EXCEL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    let days = u64::try_from(serial.floor() as i64).ok()?;
    epoch.checked_add_days(chrono::Days::new(days))
}

/// Parse a text cell as a date, ignoring any time-of-day part.
#[must_use]
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Coerce a cell to a date. Anything unreadable becomes `None`.
#[must_use]
pub fn cell_to_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Float(f) => excel_serial_to_date(*f),
        CellValue::Int(i) => excel_serial_to_date(*i as f64),
        CellValue::String(s) => parse_date_text(s),
        CellValue::Null | CellValue::Bool(_) => None,
    }
}

/// Number of days in a calendar month; 0 for an invalid month.
#[must_use]
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return 0;
    };
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map_or(31, |last| last.day())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_excel_serial_conversion() {
        assert_eq!(excel_serial_to_date(44562.0), Some(ymd(2022, 1, 1)));
        assert_eq!(excel_serial_to_date(45356.75), Some(ymd(2024, 3, 5)));
        assert_eq!(excel_serial_to_date(0.0), None);
        assert_eq!(excel_serial_to_date(f64::NAN), None);
    }

    #[test]
    fn test_text_formats() {
        assert_eq!(parse_date_text("2024-03-05"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_text("05-Mar-2024"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_text("03/05/2024"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_text("2024-03-05 09:30:00"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_text("2024-03-05T09:30:00"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_text("not a date"), None);
        assert_eq!(parse_date_text("  "), None);
    }

    #[test]
    fn test_numeric_dates_are_month_first_for_every_separator() {
        for text in ["05/03/2024", "05-03-2024", "05.03.2024"] {
            assert_eq!(parse_date_text(text), Some(ymd(2024, 5, 3)), "{text}");
        }
        for text in ["25/03/2024", "25-03-2024", "25.03.2024"] {
            assert_eq!(parse_date_text(text), Some(ymd(2024, 3, 25)), "{text}");
        }
    }

    #[test]
    fn test_cell_to_date() {
        assert_eq!(cell_to_date(&CellValue::Float(45356.0)), Some(ymd(2024, 3, 5)));
        assert_eq!(cell_to_date(&CellValue::Int(45356)), Some(ymd(2024, 3, 5)));
        assert_eq!(cell_to_date(&CellValue::String("2024-02-29".into())), Some(ymd(2024, 2, 29)));
        assert_eq!(cell_to_date(&CellValue::String("2023-02-29".into())), None);
        assert_eq!(cell_to_date(&CellValue::Null), None);
        assert_eq!(cell_to_date(&CellValue::Bool(true)), None);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
        assert_eq!(days_in_month(2024, 13), 0);
    }
}
