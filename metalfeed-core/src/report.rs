//! Progress reporting for the acquisition stages.
//!
//! The pipeline narrates itself through [`StageReporter`]; what a reporter
//! prints is diagnostic only and never part of the data contract.

use crate::data::align::MergedDataset;
use crate::data::provider::DataError;
use crate::export::PersistedFile;
use crate::instrument::Instrument;
use chrono::NaiveDate;

/// The four sequential stages of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SpotProbe,
    Futures,
    Benchmarks,
    Merge,
}

impl Stage {
    pub fn number(self) -> u8 {
        match self {
            Stage::SpotProbe => 1,
            Stage::Futures => 2,
            Stage::Benchmarks => 3,
            Stage::Merge => 4,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::SpotProbe => "Spot price probe",
            Stage::Futures => "Futures download (only free source available)",
            Stage::Benchmarks => "S&P 500 and VIX download (independent variables)",
            Stage::Merge => "Merge full dataset",
        }
    }

    pub fn subtitle(self) -> &'static str {
        match self {
            Stage::SpotProbe => "Physical metal price for immediate delivery - ideal for analysis",
            Stage::Futures => "Tickers: GC=F (gold) and SI=F (silver) - COMEX",
            Stage::Benchmarks => "Tickers: ^GSPC (S&P 500) and ^VIX (volatility index)",
            Stage::Merge => "Columns: Gold_USD, Silver_USD, SP500, VIX",
        }
    }
}

/// How a single instrument fetch ended.
///
/// `Empty` and `Failed` both leave the instrument's column empty; they are
/// kept apart so the report can tell "no data" from "provider error".
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched {
        records: usize,
        first: Option<NaiveDate>,
        last: Option<NaiveDate>,
    },
    Empty,
    Failed(DataError),
}

/// Counts describing the merged table.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub missing: Vec<(String, usize)>,
}

impl DatasetSummary {
    pub fn of(dataset: &MergedDataset) -> Self {
        Self {
            rows: dataset.len(),
            first_date: dataset.first_date(),
            last_date: dataset.last_date(),
            missing: dataset.missing_counts(),
        }
    }
}

/// Observer for a run's progress.
pub trait StageReporter {
    fn on_run_start(&self, start: NaiveDate, end: NaiveDate);

    fn on_stage_start(&self, stage: Stage);

    fn on_fetch(&self, instrument: &Instrument, outcome: &FetchOutcome);

    /// Free-form remark attached to the current stage.
    fn on_note(&self, note: &str);

    fn on_stage_end(&self, stage: Stage);

    fn on_dataset(&self, summary: &DatasetSummary);

    fn on_persisted(&self, file: &PersistedFile);
}

/// Reporter that prints banners and status lines to stdout.
pub struct StdoutReporter;

const RULE_WIDTH: usize = 70;

impl StageReporter for StdoutReporter {
    fn on_run_start(&self, start: NaiveDate, end: NaiveDate) {
        println!("{}", "=".repeat(RULE_WIDTH));
        println!("DATA ACQUISITION: GOLD, SILVER, S&P500, VIX");
        println!("{}", "=".repeat(RULE_WIDTH));
        println!("Requested period: {start} -> {end}");
        println!();
    }

    fn on_stage_start(&self, stage: Stage) {
        let inner = RULE_WIDTH - 2;
        println!("+{}+", "-".repeat(inner));
        println!(
            "| {:<width$}|",
            format!("STAGE {}: {}", stage.number(), stage.title()),
            width = inner - 1
        );
        println!("| {:<width$}|", stage.subtitle(), width = inner - 1);
        println!("+{}+", "-".repeat(inner));
    }

    fn on_fetch(&self, instrument: &Instrument, outcome: &FetchOutcome) {
        let name = format!("{} ({})", instrument.label, instrument.ticker);
        match outcome {
            FetchOutcome::Fetched { records, .. } => println!("    OK   {name}: {records} records"),
            FetchOutcome::Empty => println!("    --   {name}: not available"),
            FetchOutcome::Failed(e) => println!("    FAIL {name}: {e}"),
        }
    }

    fn on_note(&self, note: &str) {
        println!("    * {note}");
    }

    fn on_stage_end(&self, _stage: Stage) {
        println!();
    }

    fn on_dataset(&self, summary: &DatasetSummary) {
        println!("    Final dataset: {} records (raw data)", summary.rows);
        match (summary.first_date, summary.last_date) {
            (Some(first), Some(last)) => println!("    Period: {first} -> {last}"),
            _ => println!("    Period: (empty)"),
        }
        for (column, missing) in &summary.missing {
            println!("    Missing values {column}: {missing}");
        }
    }

    fn on_persisted(&self, file: &PersistedFile) {
        println!();
        println!("Data saved to: {}", file.path.display());
        println!("   File size: {:.1} KB", file.size_kb());
        println!("   BLAKE3: {}", file.blake3);
    }
}

/// Reporter that discards everything.
pub struct SilentReporter;

impl StageReporter for SilentReporter {
    fn on_run_start(&self, _start: NaiveDate, _end: NaiveDate) {}
    fn on_stage_start(&self, _stage: Stage) {}
    fn on_fetch(&self, _instrument: &Instrument, _outcome: &FetchOutcome) {}
    fn on_note(&self, _note: &str) {}
    fn on_stage_end(&self, _stage: Stage) {}
    fn on_dataset(&self, _summary: &DatasetSummary) {}
    fn on_persisted(&self, _file: &PersistedFile) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_numbered_in_run_order() {
        let stages = [Stage::SpotProbe, Stage::Futures, Stage::Benchmarks, Stage::Merge];
        let numbers: Vec<u8> = stages.iter().map(|s| s.number()).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn banner_text_fits_the_box() {
        for stage in [Stage::SpotProbe, Stage::Futures, Stage::Benchmarks, Stage::Merge] {
            let title = format!("STAGE {}: {}", stage.number(), stage.title());
            assert!(title.len() < RULE_WIDTH - 2, "{title}");
            assert!(stage.subtitle().len() < RULE_WIDTH - 2);
        }
    }

    #[test]
    fn summary_counts_rows_range_and_missing_cells() {
        use crate::data::series::PriceSeries;

        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let dataset = crate::data::align::merge_series(&[
            PriceSeries::from_pairs("Gold_USD", [(d("2024-01-02"), 2073.4), (d("2024-01-03"), 2034.2)]),
            PriceSeries::from_pairs("VIX", [(d("2024-01-04"), 14.06)]),
        ]);

        let summary = DatasetSummary::of(&dataset);
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.first_date, Some(d("2024-01-02")));
        assert_eq!(summary.last_date, Some(d("2024-01-04")));
        assert_eq!(
            summary.missing,
            vec![("Gold_USD".to_string(), 1), ("VIX".to_string(), 2)]
        );

        let empty = DatasetSummary::of(&crate::data::align::merge_series(&[]));
        assert_eq!((empty.rows, empty.first_date), (0, None));
    }
}
