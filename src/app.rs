//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - loads observations from a file or the price API
//! - runs the regularization pipeline
//! - prints reports and writes optional exports

use std::collections::BTreeSet;
use std::io;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{AllArgs, ChartArgs, Command, OutputFormat, SampleArgs, SourceArgs, YearsArgs};
use crate::data::{PriceApiClient, SampleConfig, generate_sample};
use crate::domain::{PricePoint, PriceType, SeriesConfig};
use crate::error::AppError;
use crate::io::IngestedRecords;
use crate::report;
use crate::series::available_years;

pub mod pipeline;

/// Entry point for the `trend` binary.
pub fn run() -> Result<(), AppError> {
    // `trend` and `trend -t feed` behave like `trend chart ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    init_tracing(cli.verbose);

    match cli.command {
        Command::Chart(args) => handle_chart(args),
        Command::Years(args) => handle_years(args),
        Command::Sample(args) => handle_sample(args),
        Command::All(args) => handle_all(args),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Load observations and describe where they came from.
fn load_source(source: &SourceArgs, price_type: Option<PriceType>) -> Result<(IngestedRecords, String), AppError> {
    let (ingested, origin) = match &source.input {
        Some(path) => (crate::io::load_records(path)?, path.display().to_string()),
        None => {
            let client = PriceApiClient::from_env()?;
            (client.fetch_prices(price_type)?, "price API".to_string())
        }
    };

    info!(
        source = %origin,
        rows = ingested.rows_read,
        row_errors = ingested.row_errors.len(),
        "loaded observations"
    );
    warn_row_errors(&ingested);

    Ok((ingested, origin))
}

/// One warning per unreadable row, so CSV/JSON output does not drop them silently.
fn warn_row_errors(ingested: &IngestedRecords) {
    for e in &ingested.row_errors {
        warn!(line = e.line, id = e.id.as_deref().unwrap_or("-"), "unreadable input row: {}", e.message);
    }
}

fn handle_chart(args: ChartArgs) -> Result<(), AppError> {
    let (ingested, source) = load_source(&args.source, Some(args.price_type))?;

    let mut config = config_from_args(&args);
    config.compare_years = pipeline::resolve_compare_years(&ingested.records, &config);

    let run = pipeline::run_pipeline(&ingested.records, &config);

    match args.format {
        OutputFormat::Table => {
            print!("{}", report::format_run_summary(&run, &source));
            print_side(&report::format_row_errors(&ingested.row_errors));
            println!("{}", report::format_chart_table(&run.table));
            print_side(&report::format_latest_prices(&run));
            if let Some(date) = args.on {
                print_side(&report::format_prices_on(&run, date));
            }
            print_side(&report::format_skipped(&run.skipped));
        }
        OutputFormat::Csv => crate::io::write_table_csv(io::stdout().lock(), &run.table)?,
        OutputFormat::Json => crate::io::write_table_json(io::stdout().lock(), &run.table)?,
    }

    if let Some(path) = &args.export {
        crate::io::export_table(path, &run.table)?;
        info!(path = %path.display(), "exported chart rows");
    }

    Ok(())
}

fn handle_years(args: YearsArgs) -> Result<(), AppError> {
    let (ingested, _) = load_source(&args.source, args.price_type)?;

    let types: Vec<PriceType> = match args.price_type {
        Some(price_type) => vec![price_type],
        None => PriceType::ALL.to_vec(),
    };

    for price_type in types {
        let points: Vec<PricePoint> = ingested
            .records
            .iter()
            .filter_map(|r| PricePoint::try_from(r).ok())
            .filter(|p| p.price_type == price_type)
            .collect();
        print!("{}", report::format_years(price_type, &available_years(&points)));
    }
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        seed: args.seed,
        start: args.start,
        months: args.months,
        tenant_id: args.tenant,
        ..SampleConfig::default()
    };
    let records = generate_sample(&config)?;
    crate::io::write_records_csv(&args.out, &records)?;
    println!("Wrote {} records to {}", records.len(), args.out.display());
    Ok(())
}

fn handle_all(args: AllArgs) -> Result<(), AppError> {
    if args.format == OutputFormat::Csv {
        return Err(AppError::input(
            "`--format csv` needs a single price type; use `trend chart --type ...`.",
        ));
    }

    let (ingested, source) = load_source(&args.source, None)?;
    let runs = pipeline::run_all(&ingested.records, &SeriesConfig::new(PriceType::Egg));

    match args.format {
        OutputFormat::Json => {
            let tables: Vec<_> = runs.iter().map(|r| &r.table).collect();
            crate::io::write_tables_json(io::stdout().lock(), &tables)?;
        }
        _ => {
            print_side(&report::format_row_errors(&ingested.row_errors));
            for run in &runs {
                print!("{}", report::format_run_summary(run, &source));
                println!("{}", report::format_chart_table(&run.table));
                print_side(&report::format_latest_prices(run));
                print_side(&report::format_skipped(&run.skipped));
            }
        }
    }
    Ok(())
}

fn print_side(block: &str) {
    if !block.is_empty() {
        println!("{block}");
    }
}

pub fn config_from_args(args: &ChartArgs) -> SeriesConfig {
    let items: BTreeSet<String> = args
        .items
        .iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();

    SeriesConfig {
        price_type: args.price_type,
        compare_years: args.compare.clone(),
        item_filter: if items.is_empty() { None } else { Some(items) },
    }
}

/// Rewrite argv so `trend` defaults to `trend chart`.
///
/// Rules:
/// - `trend`                      -> `trend chart`
/// - `trend -t feed ...`          -> `trend chart -t feed ...`
/// - `trend --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("chart".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "chart" | "years" | "sample" | "all");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "chart".to_string());
    }
    argv
}
