//! Month matrix builder.
//!
//! Deduplicated attendance is bucketed by calendar month. Each month gets one
//! matrix with a row per student seen that month and a column per calendar
//! day. Cells start at the configured absence fill, regular attendance marks
//! them present, and extra sessions overwrite both.

use crate::config::{AbsenceFill, PipelineConfig, PresenceMarker};
use crate::datetime::days_in_month;
use crate::record::{headers, AttendanceRecord, ExtraSessionRecord, StudentKey};
use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;
use rollbook_sheet::{CellValue, Sheet};
use rollbook_sheet::Result as SheetResult;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        MonthKey {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Number of calendar days, which is also the number of day columns.
    #[must_use]
    pub fn days(self) -> u32 {
        days_in_month(self.year, self.month)
    }

    fn month_name(self) -> &'static str {
        self.month
            .checked_sub(1)
            .and_then(|i| MONTH_NAMES.get(i as usize))
            .copied()
            .unwrap_or("Unknown")
    }

    /// Human-readable label used as the sheet name, e.g. `March-2024`.
    #[must_use]
    pub fn label(self) -> String {
        format!("{}-{}", self.month_name(), self.year)
    }

    /// Column header for a day of this month, e.g. `5-Mar`.
    #[must_use]
    pub fn day_header(self, day: u32) -> String {
        let name = self.month_name();
        format!("{day}-{}", name.get(..3).unwrap_or(name))
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// State of one (student, day) cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Present,
    Absent,
    Extra,
    Blank,
}

impl Mark {
    /// The literal written to the exported sheet.
    #[must_use]
    pub fn symbol(self, presence_marker: PresenceMarker) -> &'static str {
        match self {
            Mark::Present => presence_marker.symbol(),
            Mark::Absent => "A",
            Mark::Extra => "E",
            Mark::Blank => "",
        }
    }

    fn initial(fill: AbsenceFill) -> Self {
        match fill {
            AbsenceFill::Absent => Mark::Absent,
            AbsenceFill::Blank => Mark::Blank,
        }
    }
}

/// One student's row in a month matrix; `cells[d - 1]` is day `d`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixRow {
    pub student_id: String,
    pub student_name: String,
    pub cells: Vec<Mark>,
}

impl MatrixRow {
    /// Mark for a 1-based day of the month.
    #[must_use]
    pub fn day(&self, day: u32) -> Option<Mark> {
        let index = usize::try_from(day.checked_sub(1)?).ok()?;
        self.cells.get(index).copied()
    }
}

/// Attendance matrix for one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceMatrix {
    pub month: MonthKey,
    pub rows: Vec<MatrixRow>,
}

impl AttendanceMatrix {
    /// Number of day columns.
    #[must_use]
    pub fn day_count(&self) -> usize {
        self.month.days() as usize
    }

    /// Find the row for a student key.
    #[must_use]
    pub fn row(&self, student_id: &str, student_name: &str) -> Option<&MatrixRow> {
        self.rows
            .iter()
            .find(|r| r.student_id == student_id && r.student_name == student_name)
    }

    /// Render as a named sheet: identity columns followed by one column per day.
    pub fn to_sheet(&self, presence_marker: PresenceMarker) -> SheetResult<Sheet> {
        let mut header = vec![
            CellValue::from(headers::STUDENT_ID),
            CellValue::from(headers::STUDENT_NAME),
        ];
        header.extend((1..=self.month.days()).map(|day| CellValue::String(self.month.day_header(day))));

        let mut data = Vec::with_capacity(self.rows.len() + 1);
        data.push(header);
        for row in &self.rows {
            let mut cells = Vec::with_capacity(row.cells.len() + 2);
            cells.push(CellValue::from(row.student_id.as_str()));
            cells.push(CellValue::from(row.student_name.as_str()));
            cells.extend(row.cells.iter().map(|mark| match mark.symbol(presence_marker) {
                "" => CellValue::Null,
                symbol => CellValue::from(symbol),
            }));
            data.push(cells);
        }

        let mut sheet = Sheet::from_data(data);
        sheet.set_name(&self.month.label());
        sheet.name_columns_by_row(0)?;
        Ok(sheet)
    }
}

fn day_index(date: NaiveDate) -> usize {
    date.day0() as usize
}

/// Build one matrix per month present in `attendance`.
///
/// `attendance` should already be deduplicated and scoped; records without a
/// date are skipped. Months keep the order they are first seen in. Extra
/// sessions falling in a month with no regular attendance are ignored, and an
/// extra session marks every row sharing its student id.
#[must_use]
pub fn build_month_matrices(
    attendance: &[AttendanceRecord],
    extra: &[ExtraSessionRecord],
    config: &PipelineConfig,
) -> IndexMap<MonthKey, AttendanceMatrix> {
    let mut buckets: IndexMap<MonthKey, Vec<(&AttendanceRecord, NaiveDate)>> = IndexMap::new();
    for record in attendance {
        if let Some(date) = record.date {
            buckets.entry(MonthKey::from_date(date)).or_default().push((record, date));
        }
    }

    let mut extra_by_month: HashMap<MonthKey, Vec<(&str, NaiveDate)>> = HashMap::new();
    for record in extra {
        if let Some(date) = record.extra_date {
            extra_by_month
                .entry(MonthKey::from_date(date))
                .or_default()
                .push((record.student_id.as_str(), date));
        }
    }

    let initial = Mark::initial(config.absence_fill);
    let matrices: IndexMap<MonthKey, AttendanceMatrix> = buckets
        .into_iter()
        .map(|(month, records)| {
            let days = month.days() as usize;
            let mut grid: BTreeMap<StudentKey, Vec<Mark>> = BTreeMap::new();
            for (record, _) in &records {
                grid.entry(record.student_key()).or_insert_with(|| vec![initial; days]);
            }

            for (record, date) in &records {
                if let Some(cells) = grid.get_mut(&record.student_key()) {
                    if let Some(cell) = cells.get_mut(day_index(*date)) {
                        *cell = Mark::Present;
                    }
                }
            }

            for (student_id, date) in extra_by_month.get(&month).into_iter().flatten() {
                for (_, cells) in grid.iter_mut().filter(|(key, _)| key.student_id == *student_id) {
                    if let Some(cell) = cells.get_mut(day_index(*date)) {
                        *cell = Mark::Extra;
                    }
                }
            }

            let rows = grid
                .into_iter()
                .map(|(key, cells)| MatrixRow {
                    student_id: key.student_id,
                    student_name: key.student_name,
                    cells,
                })
                .collect();
            (month, AttendanceMatrix { month, rows })
        })
        .collect();

    tracing::debug!(months = matrices.len(), "built month matrices");
    matrices
}
