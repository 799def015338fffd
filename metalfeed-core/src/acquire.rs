//! The acquisition run: spot probe, futures, benchmarks, merge and persist.
//!
//! Fetch failures never abort the run. An instrument the provider cannot
//! serve contributes an empty series and its column stays empty in the
//! output. Only configuration and export errors propagate to the caller.

use crate::config::{AcquireConfig, ConfigError};
use crate::data::align::{merge_series, MergedDataset};
use crate::data::provider::DataProvider;
use crate::data::series::{extract_close, PriceSeries};
use crate::export::{write_dataset_csv, write_dataset_parquet, ExportError, PersistedFile};
use crate::instrument::{self, Instrument, Role};
use crate::report::{DatasetSummary, FetchOutcome, Stage, StageReporter};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// One instrument's fetch: how it went and the closes it produced.
#[derive(Debug)]
pub struct InstrumentFetch {
    pub instrument: Instrument,
    pub outcome: FetchOutcome,
    pub series: PriceSeries,
}

/// Everything a completed run produced.
#[derive(Debug)]
pub struct Acquisition {
    pub spot: Vec<InstrumentFetch>,
    pub futures: Vec<InstrumentFetch>,
    pub benchmarks: Vec<InstrumentFetch>,
    pub dataset: MergedDataset,
    pub csv: PersistedFile,
    pub parquet: Option<PersistedFile>,
}

/// Fetch one instrument and keep only its closes.
///
/// Provider errors and empty answers both yield an empty series; the
/// distinction survives only in the returned outcome.
pub fn fetch_instrument(
    provider: &dyn DataProvider,
    instrument: &Instrument,
    start: NaiveDate,
    end: NaiveDate,
) -> InstrumentFetch {
    let column = instrument.column_name();
    let (outcome, series) = match provider.fetch(instrument.ticker, start, end) {
        Ok(result) if result.is_empty() => {
            debug!(ticker = instrument.ticker, "provider returned no bars");
            (FetchOutcome::Empty, PriceSeries::empty(column))
        }
        Ok(result) => {
            debug!(
                ticker = instrument.ticker,
                source = ?result.source,
                bars = result.bars.len(),
                "bars received"
            );
            let series = extract_close(column, &result.bars);
            let outcome = FetchOutcome::Fetched {
                records: result.bars.len(),
                first: series.first_date(),
                last: series.last_date(),
            };
            (outcome, series)
        }
        Err(e) => {
            warn!(ticker = instrument.ticker, error = %e, "fetch failed, column left empty");
            (FetchOutcome::Failed(e), PriceSeries::empty(column))
        }
    };

    InstrumentFetch {
        instrument: *instrument,
        outcome,
        series,
    }
}

fn run_fetch_stage(
    provider: &dyn DataProvider,
    stage: Stage,
    role: Role,
    config: &AcquireConfig,
    reporter: &dyn StageReporter,
) -> Vec<InstrumentFetch> {
    reporter.on_stage_start(stage);
    info!(stage = stage.number(), provider = provider.name(), "stage started");

    instrument::with_role(role)
        .iter()
        .map(|inst| {
            let fetch = fetch_instrument(provider, inst, config.start_date, config.end_date);
            reporter.on_fetch(&fetch.instrument, &fetch.outcome);
            fetch
        })
        .collect()
}

/// Execute the four stages and write the dataset under `config.output_dir`.
pub fn acquire(
    provider: &dyn DataProvider,
    config: &AcquireConfig,
    reporter: &dyn StageReporter,
) -> Result<Acquisition, AcquireError> {
    config.validate()?;
    reporter.on_run_start(config.start_date, config.end_date);

    // Stage 1: spot quotes are OTC; the probe documents that they are missing.
    let spot = run_fetch_stage(provider, Stage::SpotProbe, Role::Spot, config, reporter);
    reporter.on_note("Spot markets are OTC - historical data is not freely available");
    reporter.on_stage_end(Stage::SpotProbe);

    // Stage 2
    let futures = run_fetch_stage(provider, Stage::Futures, Role::Futures, config, reporter);
    let gold = futures.iter().find(|f| f.instrument == instrument::GOLD_FUTURES);
    if let Some(first) = gold.and_then(|f| f.series.first_date()) {
        reporter.on_note(&format!("First gold futures record: {first}"));
    }
    reporter.on_note("Yahoo Finance: futures data only available from August 2000");
    reporter.on_stage_end(Stage::Futures);

    // Stage 3
    let benchmarks = run_fetch_stage(provider, Stage::Benchmarks, Role::Benchmark, config, reporter);
    reporter.on_note("S&P 500: US equity index (risk-on indicator)");
    reporter.on_note("VIX: volatility index, the market's 'fear gauge'");
    reporter.on_stage_end(Stage::Benchmarks);

    // Stage 4
    reporter.on_stage_start(Stage::Merge);
    let dataset = merge_series(&merge_inputs(futures.iter().chain(benchmarks.iter())));
    reporter.on_dataset(&DatasetSummary::of(&dataset));
    reporter.on_stage_end(Stage::Merge);

    let csv = write_dataset_csv(&config.output_dir, &dataset)?;
    info!(path = %csv.path.display(), rows = dataset.len(), "dataset written");
    reporter.on_persisted(&csv);

    let parquet = if config.write_parquet {
        let file = write_dataset_parquet(&config.output_dir, &dataset)?;
        reporter.on_persisted(&file);
        Some(file)
    } else {
        None
    };

    Ok(Acquisition {
        spot,
        futures,
        benchmarks,
        dataset,
        csv,
        parquet,
    })
}

/// One series per [`instrument::MERGED`] entry, in column order.
///
/// An instrument with no fetch among `fetched` gets an empty column.
fn merge_inputs<'a>(fetched: impl Iterator<Item = &'a InstrumentFetch> + Clone) -> Vec<PriceSeries> {
    instrument::MERGED
        .iter()
        .map(|inst| {
            fetched
                .clone()
                .find(|f| f.instrument == *inst)
                .map(|f| f.series.clone())
                .unwrap_or_else(|| PriceSeries::empty(inst.column_name()))
        })
        .collect()
}
