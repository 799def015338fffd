//! Yahoo Finance data provider.
//!
//! Fetches daily bars from Yahoo's v8 chart API with one blocking request per
//! symbol. There is no retry, backoff or breaker here: a failed request is
//! reported to the caller, which decides whether the run continues.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.

use super::provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const CHART_BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// IANA zone of the listing exchange, e.g. `America/New_York`.
    #[serde(default, rename = "exchangeTimezoneName")]
    exchange_timezone_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
}

impl YahooProvider {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Build the chart API URL for a symbol and `[start, end)` range.
    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Url, DataError> {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();

        let mut url = Url::parse(CHART_BASE_URL)
            .map_err(|e| DataError::Other(format!("invalid chart URL {CHART_BASE_URL}: {e}")))?;
        let url_display = url.to_string();
        url.path_segments_mut()
            .map_err(|()| DataError::Other(format!("chart URL cannot take a path: {url_display}")))?
            .pop_if_empty()
            .push(symbol);
        url.query_pairs_mut()
            .append_pair("period1", &start_ts.to_string())
            .append_pair("period2", &end_ts.to_string())
            .append_pair("interval", "1d")
            .append_pair("includeAdjustedClose", "true")
            .append_pair("events", "history");
        Ok(url)
    }

    fn fetch_once(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>, DataError> {
        let url = self.chart_url(symbol, start, end)?;
        debug!(%symbol, %url, "requesting chart");

        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
        parse_chart_json(symbol, &body)
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        if start >= end {
            return Err(DataError::InvalidRange { start, end });
        }
        let bars = self.fetch_once(symbol, start, end)?;
        debug!(%symbol, bars = bars.len(), "chart parsed");
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::YahooFinance,
        })
    }
}

/// Calendar date of a bar stamped `ts`, read in the exchange's own zone.
///
/// Yahoo stamps daily bars at session midnight local time, so the offset must
/// be the one in force on that day. Unknown or missing zones use the UTC date.
fn bar_date(ts: i64, zone: Option<Tz>) -> Option<NaiveDate> {
    let utc = DateTime::from_timestamp(ts, 0)?;
    Some(match zone {
        Some(tz) => utc.with_timezone(&tz).date_naive(),
        None => utc.date_naive(),
    })
}

fn exchange_zone(symbol: &str, meta: Option<&ChartMeta>) -> Option<Tz> {
    let name = meta?.exchange_timezone_name.as_deref()?;
    match name.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(_) => {
            debug!(%symbol, zone = name, "unknown exchange time zone, using UTC dates");
            None
        }
    }
}

/// Parse a chart API body into RawBars, ascending by date.
///
/// A result with no timestamps is an empty series, not an error: Yahoo answers
/// that way for valid symbols with nothing in the requested window.
fn parse_chart_json(symbol: &str, body: &str) -> Result<Vec<RawBar>, DataError> {
    let resp: ChartResponse = serde_json::from_str(body).map_err(|e| {
        DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
    })?;
    parse_response(symbol, resp)
}

fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<RawBar>, DataError> {
    let result = match resp.chart.result {
        Some(result) => result,
        None => {
            return Err(match resp.chart.error {
                Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                },
                Some(err) => {
                    DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
                None => DataError::ResponseFormatChanged("empty result with no error".into()),
            })
        }
    };

    let Some(data) = result.into_iter().next() else {
        return Ok(Vec::new());
    };

    let Some(timestamps) = data.timestamp else {
        return Ok(Vec::new());
    };

    let zone = exchange_zone(symbol, data.meta.as_ref());

    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .unwrap_or_default();

    let adj_closes = data
        .indicators
        .adjclose
        .and_then(|v| v.into_iter().next())
        .map(|a| a.adjclose);

    let mut bars = Vec::with_capacity(timestamps.len());

    for (i, &ts) in timestamps.iter().enumerate() {
        let date = bar_date(ts, zone)
            .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;

        let open = quote.open.get(i).copied().flatten();
        let high = quote.high.get(i).copied().flatten();
        let low = quote.low.get(i).copied().flatten();
        let close = quote.close.get(i).copied().flatten();
        let volume = quote.volume.get(i).copied().flatten();
        let adj_close = adj_closes.as_ref().and_then(|v| v.get(i).copied().flatten());

        // Holidays and halted sessions come back as all-null rows
        if open.is_none() && high.is_none() && low.is_none() && close.is_none() && volume.is_none()
        {
            continue;
        }

        bars.push(RawBar {
            date,
            open: open.unwrap_or(f64::NAN),
            high: high.unwrap_or(f64::NAN),
            low: low.unwrap_or(f64::NAN),
            close: close.unwrap_or(f64::NAN),
            volume: volume.unwrap_or(0),
            adj_close: adj_close.unwrap_or(f64::NAN),
        });
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    // 2024-01-02 and 2024-01-03 at 05:00 UTC, midnight in New York
    const TWO_BARS: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "symbol": "GC=F",
                    "gmtoffset": -18000,
                    "exchangeTimezoneName": "America/New_York"
                },
                "timestamp": [1704171600, 1704258000],
                "indicators": {
                    "quote": [{
                        "open": [2064.0, 2050.5],
                        "high": [2080.0, 2055.0],
                        "low": [2060.0, 2030.1],
                        "close": [2073.4, 2034.2],
                        "volume": [241, 500]
                    }],
                    "adjclose": [{"adjclose": [2073.4, 2034.2]}]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_bars_in_exchange_timezone() {
        let bars = parse_chart_json("GC=F", TWO_BARS).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, d("2024-01-02"));
        assert_eq!(bars[1].date, d("2024-01-03"));
        assert_eq!(bars[0].close, 2073.4);
        assert_eq!(bars[1].volume, 500);
    }

    #[test]
    fn summer_bars_use_the_daylight_offset() {
        // 2024-07-01 04:00 UTC is session midnight under EDT. The chart's
        // current gmtoffset is the winter one and must not be applied.
        let body = r#"{"chart":{"result":[{
            "meta":{"gmtoffset":-18000,"exchangeTimezoneName":"America/New_York"},
            "timestamp":[1719806400],
            "indicators":{"quote":[{
                "open":[5510.0],"high":[5511.0],"low":[5450.0],
                "close":[5475.09],"volume":[3300000000]}]}
        }],"error":null}}"#;
        let bars = parse_chart_json("^GSPC", body).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, d("2024-07-01"));
    }

    #[test]
    fn dates_fall_back_to_utc_without_a_known_zone() {
        let body = r#"{"chart":{"result":[{
            "meta":{"exchangeTimezoneName":"Mars/Olympus_Mons"},
            "timestamp":[1719806400],
            "indicators":{"quote":[{"close":[5475.09]}]}
        }],"error":null}}"#;
        let bars = parse_chart_json("^GSPC", body).unwrap();
        assert_eq!(bars[0].date, d("2024-07-01"));

        let body = r#"{"chart":{"result":[{
            "timestamp":[1704236400],
            "indicators":{"quote":[{"close":[2034.2]}]}
        }],"error":null}}"#;
        let bars = parse_chart_json("GC=F", body).unwrap();
        assert_eq!(bars[0].date, d("2024-01-02"));
    }

    #[test]
    fn all_null_rows_are_skipped() {
        let body = r#"{"chart":{"result":[{
            "timestamp":[1704171600,1704258000],
            "indicators":{"quote":[{
                "open":[null,1.0],"high":[null,1.0],"low":[null,1.0],
                "close":[null,1.0],"volume":[null,10]}]}
        }],"error":null}}"#;
        let bars = parse_chart_json("SI=F", body).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 1.0);
    }

    #[test]
    fn partial_nulls_become_nan() {
        let body = r#"{"chart":{"result":[{
            "timestamp":[1704171600],
            "indicators":{"quote":[{
                "open":[1.0],"high":[null],"low":[null],"close":[null],"volume":[null]}]}
        }],"error":null}}"#;
        let bars = parse_chart_json("SI=F", body).unwrap();
        assert_eq!(bars.len(), 1);
        assert!(bars[0].close.is_nan());
        assert_eq!(bars[0].volume, 0);
    }

    #[test]
    fn missing_timestamps_is_an_empty_series() {
        let body = r#"{"chart":{"result":[{
            "meta":{"symbol":"XAUUSD=X"},
            "indicators":{"quote":[{}]}
        }],"error":null}}"#;
        let bars = parse_chart_json("XAUUSD=X", body).unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let body = r#"{"chart":{"result":null,"error":{
            "code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart_json("XAGUSD=X", body).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { ref symbol } if symbol == "XAGUSD=X"));
    }

    #[test]
    fn other_chart_errors_are_format_changes() {
        let body = r#"{"chart":{"result":null,"error":{
            "code":"Bad Request","description":"Invalid input"}}}"#;
        let err = parse_chart_json("^VIX", body).unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));
    }

    #[test]
    fn garbage_body_is_a_format_change() {
        let err = parse_chart_json("^GSPC", "<html>blocked</html>").unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));
    }

    fn last_segment(url: &Url) -> String {
        url.path_segments()
            .and_then(|mut s| s.next_back())
            .unwrap()
            .to_string()
    }

    #[test]
    fn chart_url_puts_symbol_in_one_path_segment() {
        let provider = YahooProvider::new(Duration::from_secs(5), "test").unwrap();
        let url = provider
            .chart_url("^GSPC", d("2024-01-01"), d("2024-01-05"))
            .unwrap();
        assert!(url.path().starts_with("/v8/finance/chart/"));
        assert!(matches!(last_segment(&url).as_str(), "^GSPC" | "%5EGSPC"));

        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(query.contains(&("period1".into(), "1704067200".into())));
        assert!(query.contains(&("period2".into(), "1704412800".into())));
        assert!(query.contains(&("interval".into(), "1d".into())));

        let url = provider
            .chart_url("GC=F", d("2024-01-01"), d("2024-01-05"))
            .unwrap();
        assert_eq!(last_segment(&url), "GC=F");
    }

    #[test]
    fn reserved_characters_in_symbols_are_escaped() {
        let provider = YahooProvider::new(Duration::from_secs(5), "test").unwrap();
        let url = provider
            .chart_url("A#B?C/D", d("2024-01-01"), d("2024-01-05"))
            .unwrap();
        assert_eq!(last_segment(&url), "A%23B%3FC%2FD");
        assert_eq!(url.fragment(), None);
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(query[0], ("period1".into(), "1704067200".into()));
    }

    #[test]
    fn inverted_range_is_rejected_before_any_request() {
        let provider = YahooProvider::new(Duration::from_secs(5), "test").unwrap();
        let err = provider
            .fetch("GC=F", d("2024-01-05"), d("2024-01-01"))
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidRange { .. }));
    }
}
