//! metalfeed core — acquisition of gold, silver, S&P 500 and VIX closes.
//!
//! This crate contains the whole data path of a run:
//! - Provider trait and the Yahoo Finance chart client
//! - Close-price extraction into date-indexed series
//! - Outer-join alignment into one raw table
//! - CSV (and optional Parquet) export
//! - The four-stage acquisition pipeline with progress reporting

pub mod acquire;
pub mod config;
pub mod data;
pub mod export;
pub mod instrument;
pub mod report;

pub use acquire::{acquire, fetch_instrument, Acquisition, AcquireError, InstrumentFetch};
pub use config::{AcquireConfig, ConfigError};
pub use export::{ExportError, PersistedFile, CSV_FILE_NAME};
pub use report::{FetchOutcome, SilentReporter, Stage, StageReporter, StdoutReporter};
