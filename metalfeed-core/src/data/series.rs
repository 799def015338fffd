//! Close-price series extracted from provider bars.

use super::provider::RawBar;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Named, date-indexed closing prices.
///
/// Dates are unique and iterate ascending. A date with no usable close is
/// absent rather than stored as zero or NaN.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    name: String,
    closes: BTreeMap<NaiveDate, f64>,
}

impl PriceSeries {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            closes: BTreeMap::new(),
        }
    }

    /// Build a series from `(date, close)` pairs. A repeated date keeps the later value.
    pub fn from_pairs(
        name: impl Into<String>,
        pairs: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Self {
        let mut series = Self::empty(name);
        for (date, close) in pairs {
            series.insert(date, close);
        }
        series
    }

    fn insert(&mut self, date: NaiveDate, close: f64) {
        if close.is_finite() {
            self.closes.insert(date, close);
        } else {
            self.closes.remove(&date);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.closes.get(&date).copied()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.closes.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.closes.keys().next_back().copied()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.closes.keys().copied()
    }
}

/// Keep only the closing price of each bar as a series called `name`.
///
/// Empty input gives an empty series of the same name. Bars with a NaN close
/// contribute nothing.
pub fn extract_close(name: &str, bars: &[RawBar]) -> PriceSeries {
    PriceSeries::from_pairs(name, bars.iter().map(|b| (b.date, b.close)))
}
