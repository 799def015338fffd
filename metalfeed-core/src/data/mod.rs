//! Quote retrieval, close extraction and date alignment

pub mod align;
pub mod provider;
pub mod series;
pub mod yahoo;

pub use align::{merge_series, MergedDataset, MergedRow};
pub use provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};
pub use series::{extract_close, PriceSeries};
pub use yahoo::YahooProvider;
