//! Dataset export (CSV, optional Parquet).
//!
//! The CSV is the deliverable: header `Date,<columns...>`, ISO dates, raw
//! closes, empty fields where an instrument has no value. Bytes depend only on
//! the dataset, so identical upstream data yields an identical file.

use crate::data::align::MergedDataset;
use crate::instrument::DATE_COLUMN;
use polars::prelude::{Column, DataFrame, NamedFrom, ParquetWriter, Series};
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CSV_FILE_NAME: &str = "precious_metals_data.csv";
pub const PARQUET_FILE_NAME: &str = "precious_metals_data.parquet";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer flush failed: {0}")]
    Flush(String),

    #[error("parquet export failed: {0}")]
    Parquet(String),
}

/// A file written to disk, with its size and content hash.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedFile {
    pub path: PathBuf,
    pub bytes: u64,
    /// BLAKE3 hex digest of the file contents.
    pub blake3: String,
}

impl PersistedFile {
    pub fn size_kb(&self) -> f64 {
        self.bytes as f64 / 1024.0
    }
}

/// Render a cell: empty for missing, otherwise the shortest decimal that
/// round-trips, keeping a trailing `.0` on whole numbers.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        None => String::new(),
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{v:.1}"),
        Some(v) => format!("{v}"),
    }
}

/// Encode the dataset as CSV bytes.
pub fn dataset_to_csv(dataset: &MergedDataset) -> Result<Vec<u8>, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = Vec::with_capacity(dataset.columns().len() + 1);
    header.push(DATE_COLUMN.to_string());
    header.extend(dataset.columns().iter().cloned());
    wtr.write_record(&header)?;

    for row in dataset.rows() {
        let mut record = Vec::with_capacity(row.values.len() + 1);
        record.push(row.date.format("%Y-%m-%d").to_string());
        record.extend(row.values.iter().map(|v| format_value(*v)));
        wtr.write_record(&record)?;
    }

    wtr.into_inner().map_err(|e| ExportError::Flush(e.to_string()))
}

/// Write `<dir>/precious_metals_data.csv`, creating `dir` if needed.
pub fn write_dataset_csv(dir: &Path, dataset: &MergedDataset) -> Result<PersistedFile, ExportError> {
    let bytes = dataset_to_csv(dataset)?;
    let path = dir.join(CSV_FILE_NAME);
    write_bytes(&path, &bytes)?;
    Ok(PersistedFile {
        path,
        bytes: bytes.len() as u64,
        blake3: blake3::hash(&bytes).to_hex().to_string(),
    })
}

/// Write `<dir>/precious_metals_data.parquet` with the same columns as the CSV.
pub fn write_dataset_parquet(
    dir: &Path,
    dataset: &MergedDataset,
) -> Result<PersistedFile, ExportError> {
    let dates: Vec<String> = dataset
        .rows()
        .iter()
        .map(|r| r.date.format("%Y-%m-%d").to_string())
        .collect();

    let mut columns = vec![Column::Series(Series::new(DATE_COLUMN.into(), dates).into())];
    for (idx, name) in dataset.columns().iter().enumerate() {
        let values: Vec<Option<f64>> = dataset.rows().iter().map(|r| r.values[idx]).collect();
        columns.push(Column::Series(Series::new(name.as_str().into(), values).into()));
    }

    let mut df = DataFrame::new(columns).map_err(|e| ExportError::Parquet(e.to_string()))?;

    create_dir(dir)?;
    let path = dir.join(PARQUET_FILE_NAME);
    let mut file = File::create(&path).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    ParquetWriter::new(&mut file)
        .finish(&mut df)
        .map_err(|e| ExportError::Parquet(e.to_string()))?;
    drop(file);

    let contents = std::fs::read(&path).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(PersistedFile {
        path,
        bytes: contents.len() as u64,
        blake3: blake3::hash(&contents).to_hex().to_string(),
    })
}

fn create_dir(dir: &Path) -> Result<(), ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    std::fs::write(path, bytes).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
