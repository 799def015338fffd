//! Multi-series date alignment.
//!
//! Given close series for several instruments, align them on the union of
//! their dates. A series with no value on a date leaves that cell empty; no
//! forward-fill or interpolation happens here.

use super::series::PriceSeries;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// One date of the merged table. `values` follows the dataset's column order.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

impl MergedRow {
    pub fn is_all_missing(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

/// Date-keyed table of raw closes, ascending, one row per date.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergedDataset {
    columns: Vec<String>,
    rows: Vec<MergedRow>,
}

impl MergedDataset {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// First `n` rows (fewer if the table is shorter).
    pub fn head(&self, n: usize) -> &[MergedRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Last `n` rows (fewer if the table is shorter).
    pub fn tail(&self, n: usize) -> &[MergedRow] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }

    /// Values of one column in row order, `None` if no such column.
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Count of empty cells per column, in column order.
    pub fn missing_counts(&self) -> Vec<(String, usize)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let missing = self.rows.iter().filter(|r| r.values[idx].is_none()).count();
                (name.clone(), missing)
            })
            .collect()
    }
}

/// Outer-join series on date, drop rows with no value in any column, sort ascending.
///
/// Column order and names follow the input series.
pub fn merge_series(series: &[PriceSeries]) -> MergedDataset {
    let columns: Vec<String> = series.iter().map(|s| s.name().to_string()).collect();

    let mut all_dates = BTreeSet::new();
    for s in series {
        all_dates.extend(s.dates());
    }

    let rows = all_dates
        .into_iter()
        .map(|date| MergedRow {
            date,
            values: series.iter().map(|s| s.get(date)).collect(),
        })
        .filter(|row| !row.is_all_missing())
        .collect();

    MergedDataset { columns, rows }
}
