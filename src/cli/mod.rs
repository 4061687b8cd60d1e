//! Command-line parsing for the `trend` binary.
//!
//! Argument parsing and command dispatch stay separate from the series code:
//! everything here is plain data handed to `app`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::PriceType;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "trend", version, about = "Egg and feed price trends with gap-filled series")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Regularize one price type and print the chart rows.
    Chart(ChartArgs),
    /// List the years that have observations, most recent first.
    Years(YearsArgs),
    /// Write a synthetic observation CSV.
    Sample(SampleArgs),
    /// Regularize EGG and FEED side by side.
    All(AllArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Fixed-width text with a run summary.
    Table,
    Csv,
    Json,
}

/// Where observations come from.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Observation file (`.csv`, or `.json` holding a record list or API response).
    ///
    /// When omitted, prices are fetched from `PRICE_API_URL` using `PRICE_API_TOKEN`.
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ChartArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Price type to chart.
    #[arg(short = 't', long = "type", value_enum, default_value_t = PriceType::Egg)]
    pub price_type: PriceType,

    /// Overlay years on one within-year axis. Without values, the two most
    /// recent years with data are compared.
    #[arg(short, long, num_args = 0.., value_name = "YEAR")]
    pub compare: Option<Vec<i32>>,

    /// Only chart these items (repeatable).
    #[arg(long = "item", value_name = "NAME")]
    pub items: Vec<String>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Also print the price each item had on this date (table output).
    #[arg(long, value_name = "DATE")]
    pub on: Option<NaiveDate>,

    /// Also write the chart rows to a file (`.json` for JSON, otherwise CSV).
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct YearsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Restrict to one price type (default: both).
    #[arg(short = 't', long = "type", value_enum)]
    pub price_type: Option<PriceType>,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Random seed (same seed, same file).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// First day covered.
    #[arg(long, default_value = "2023-01-01")]
    pub start: NaiveDate,

    /// Number of months covered.
    #[arg(long, default_value_t = 36)]
    pub months: u32,

    /// Tenant id written on every record.
    #[arg(long, default_value = "demo-tenant")]
    pub tenant: String,

    /// Output CSV path.
    #[arg(short, long, value_name = "FILE")]
    pub out: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct AllArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// `table` or `json` (CSV needs a single price type).
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_flag_without_years_is_empty_list() {
        let cli = Cli::parse_from(["trend", "chart", "--compare", "--type", "feed"]);
        let Command::Chart(args) = cli.command else { panic!("expected chart") };
        assert_eq!(args.compare, Some(vec![]));
        assert_eq!(args.price_type, PriceType::Feed);

        let cli = Cli::parse_from(["trend", "chart", "-c", "2025", "2024", "--item", "LARGE EGG"]);
        let Command::Chart(args) = cli.command else { panic!("expected chart") };
        assert_eq!(args.compare, Some(vec![2025, 2024]));
        assert_eq!(args.items, vec!["LARGE EGG"]);

        let cli = Cli::parse_from(["trend", "chart"]);
        let Command::Chart(args) = cli.command else { panic!("expected chart") };
        assert_eq!(args.compare, None);
        assert_eq!(args.format, OutputFormat::Table);
    }

    #[test]
    fn sample_parses_start_date() {
        let cli = Cli::parse_from(["trend", "sample", "--start", "2024-03-01", "--out", "x.csv"]);
        let Command::Sample(args) = cli.command else { panic!("expected sample") };
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(args.months, 36);
    }
}
