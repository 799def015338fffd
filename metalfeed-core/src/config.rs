//! Acquisition configuration.
//!
//! Every field has a default, so an empty TOML document (or no file at all)
//! reproduces the standard 2000-01-01 → 2026-01-28 run into `./data`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_START: NaiveDate = ymd(2000, 1, 1);
pub const DEFAULT_END: NaiveDate = ymd(2026, 1, 28);
pub const DEFAULT_OUTPUT_DIR: &str = "data";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

// Evaluated at compile time, so a bad literal fails the build.
const fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid calendar date"),
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { value: String },

    #[error("start date {start} must be before end date {end}")]
    EmptyRange { start: NaiveDate, end: NaiveDate },
}

/// Parameters of one acquisition run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquireConfig {
    /// First day requested (inclusive).
    pub start_date: NaiveDate,
    /// Day the request stops at (exclusive).
    pub end_date: NaiveDate,
    /// Directory receiving `precious_metals_data.csv`.
    pub output_dir: PathBuf,
    /// Also write a Parquet copy of the dataset.
    pub write_parquet: bool,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            start_date: DEFAULT_START,
            end_date: DEFAULT_END,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            write_parquet: false,
            request_timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl AcquireConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string. Missing keys take their defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_date >= self.end_date {
            return Err(ConfigError::EmptyRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Parse a `YYYY-MM-DD` date argument.
pub fn parse_date(value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ConfigError::InvalidDate {
        value: value.to_string(),
    })
}
