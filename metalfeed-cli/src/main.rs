//! metalfeed CLI — download gold, silver, S&P 500 and VIX closes into one CSV.
//!
//! Runs with no arguments: the default range (2000-01-01 → 2026-01-28) is
//! written to `data/precious_metals_data.csv`. Exit status is 0 when the file
//! was written, 1 on any failure that escapes the per-instrument fallback.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use metalfeed_core::config::parse_date;
use metalfeed_core::data::{MergedDataset, MergedRow, YahooProvider};
use metalfeed_core::{acquire, AcquireConfig, StdoutReporter};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const PREVIEW_HEAD: usize = 10;
const PREVIEW_TAIL: usize = 5;
const RULE_WIDTH: usize = 70;

#[derive(Parser)]
#[command(
    name = "metalfeed",
    about = "Download raw gold/silver futures, S&P 500 and VIX closes into one CSV"
)]
struct Cli {
    /// TOML config file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start date (YYYY-MM-DD). Defaults to 2000-01-01.
    #[arg(long)]
    start: Option<String>,

    /// End date, exclusive (YYYY-MM-DD or `today`). Defaults to 2026-01-28.
    #[arg(long)]
    end: Option<String>,

    /// Output directory for precious_metals_data.csv. Defaults to ./data.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Also write a Parquet copy of the dataset.
    #[arg(long, default_value_t = false)]
    parquet: bool,

    /// Diagnostic log level when RUST_LOG is unset (error, warn, info, debug, trace).
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    println!();
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("    PRECIOUS METALS DATA: GOLD, SILVER, S&P500, VIX");
    println!("{}", "=".repeat(RULE_WIDTH));
    println!();

    if let Err(e) = run(cli) {
        eprintln!();
        eprintln!("FATAL ERROR: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("metalfeed_core={level},metalfeed={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;
    tracing::debug!(?config, "configuration resolved");

    let provider = YahooProvider::new(config.request_timeout(), &config.user_agent)
        .context("failed to initialise Yahoo Finance client")?;

    let acquisition = acquire(&provider, &config, &StdoutReporter)?;

    write_preview(&mut io::stdout().lock(), &acquisition.dataset)
        .context("failed to print data preview")?;

    println!();
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("ACQUISITION COMPLETE");
    println!("   Continue with the notebook for cleaning and analysis");
    println!("{}", "=".repeat(RULE_WIDTH));
    println!();
    Ok(())
}

fn build_config(cli: &Cli) -> Result<AcquireConfig> {
    let mut config = match &cli.config {
        Some(path) => AcquireConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AcquireConfig::default(),
    };

    if let Some(start) = &cli.start {
        config.start_date = parse_date(start)?;
    }
    if let Some(end) = &cli.end {
        config.end_date = parse_end(end)?;
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if cli.parquet {
        config.write_parquet = true;
    }

    config.validate()?;
    Ok(config)
}

fn parse_end(value: &str) -> Result<NaiveDate> {
    if value.eq_ignore_ascii_case("today") {
        return Ok(chrono::Local::now().date_naive());
    }
    Ok(parse_date(value)?)
}

/// First `PREVIEW_HEAD` and last `PREVIEW_TAIL` rows as a fixed-width table.
fn write_preview(out: &mut impl Write, dataset: &MergedDataset) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    writeln!(out, "DATA PREVIEW (raw - cleaning happens in the notebook):")?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;

    let header: Vec<String> = dataset
        .columns()
        .iter()
        .map(|c| format!("{c:>12}"))
        .collect();
    writeln!(out, "{:<10} {}", "Date", header.join(" "))?;

    write_rows(out, dataset.head(PREVIEW_HEAD))?;
    writeln!(out)?;
    writeln!(out, "... last records ...")?;
    write_rows(out, dataset.tail(PREVIEW_TAIL))
}

fn write_rows(out: &mut impl Write, rows: &[MergedRow]) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(out, "(no rows)");
    }
    for row in rows {
        let cells: Vec<String> = row
            .values
            .iter()
            .map(|v| match v {
                Some(x) => format!("{x:>12.4}"),
                None => format!("{:>12}", "NaN"),
            })
            .collect();
        writeln!(out, "{:<10} {}", row.date, cells.join(" "))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use metalfeed_core::data::{merge_series, PriceSeries};

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["metalfeed"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn no_arguments_gives_default_run() {
        let config = build_config(&cli(&[])).unwrap();
        assert_eq!(config, AcquireConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let config = build_config(&cli(&[
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-05",
            "--output-dir",
            "out",
            "--parquet",
        ]))
        .unwrap();
        assert_eq!(config.start_date, parse_date("2024-01-01").unwrap());
        assert_eq!(config.end_date, parse_date("2024-01-05").unwrap());
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(config.write_parquet);
    }

    #[test]
    fn inverted_range_fails_before_any_fetch() {
        assert!(build_config(&cli(&["--start", "2024-02-01", "--end", "2024-01-01"])).is_err());
        assert!(build_config(&cli(&["--start", "not-a-date"])).is_err());
    }

    fn render(dataset: &MergedDataset) -> Vec<String> {
        let mut buf = Vec::new();
        write_preview(&mut buf, dataset).unwrap();
        String::from_utf8(buf)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn dataset(days: &[(&str, f64)]) -> MergedDataset {
        let gold = PriceSeries::from_pairs(
            "Gold_USD",
            days.iter().map(|(day, c)| (parse_date(day).unwrap(), *c)),
        );
        merge_series(&[gold, PriceSeries::empty("VIX")])
    }

    #[test]
    fn preview_of_empty_dataset_says_no_rows_twice() {
        let lines = render(&dataset(&[]));
        assert_eq!(lines.iter().filter(|l| *l == "(no rows)").count(), 2);
        assert_eq!(
            lines[4],
            format!("{:<10} {:>12} {:>12}", "Date", "Gold_USD", "VIX")
        );
    }

    #[test]
    fn short_dataset_repeats_rows_in_head_and_tail() {
        let lines = render(&dataset(&[("2024-01-02", 2073.4), ("2024-01-03", 2034.2)]));
        let first = format!("{:<10} {:>12.4} {:>12}", "2024-01-02", 2073.4, "NaN");
        assert_eq!(first, "2024-01-02    2073.4000          NaN");
        assert_eq!(lines.iter().filter(|l| **l == first).count(), 2);

        let tail_marker = lines.iter().position(|l| l == "... last records ...").unwrap();
        assert_eq!(lines.len(), tail_marker + 3);
        assert!(lines[5].starts_with("2024-01-02"));
        assert!(lines[6].starts_with("2024-01-03"));
        assert!(!lines.iter().any(|l| l == "(no rows)"));
    }

    #[test]
    fn long_dataset_is_cut_to_ten_and_five() {
        let days: Vec<String> = (1..=20).map(|n| format!("2024-03-{n:02}")).collect();
        let points: Vec<(&str, f64)> = days.iter().map(|d| (d.as_str(), 2100.0)).collect();
        let lines = render(&dataset(&points));

        let data_lines: Vec<&String> = lines.iter().filter(|l| l.starts_with("2024-")).collect();
        assert_eq!(data_lines.len(), PREVIEW_HEAD + PREVIEW_TAIL);
        assert!(data_lines[PREVIEW_HEAD - 1].starts_with("2024-03-10"));
        assert!(data_lines[PREVIEW_HEAD].starts_with("2024-03-16"));
    }

    #[test]
    fn end_accepts_today() {
        let config = build_config(&cli(&["--start", "2020-01-01", "--end", "today"])).unwrap();
        assert_eq!(config.end_date, chrono::Local::now().date_naive());
    }
}
