//! Formatted terminal output.
//!
//! Everything that turns pipeline results into text lives here so the
//! regularization code stays free of presentation concerns.

use chrono::NaiveDate;

use crate::app::pipeline::RunOutput;
use crate::domain::PriceType;
use crate::io::RowError;
use crate::period::period_label;
use crate::report::{ChartMode, ChartTable, order_items};
use crate::series::SkippedRecord;

/// Longest list of skipped rows/records printed before summarizing.
const MAX_LISTED: usize = 10;

const LABEL_WIDTH: usize = 10;
const MIN_COLUMN_WIDTH: usize = 10;
const MAX_COLUMN_WIDTH: usize = 24;

/// Format the run header (source, counts, mode).
pub fn format_run_summary(run: &RunOutput, source: &str) -> String {
    let mut out = String::new();
    let price_type = run.config.price_type;

    out.push_str(&format!(
        "=== trend - {} prices ({:?}) ===\n",
        price_type.display_name(),
        run.config.granularity()
    ));
    out.push_str(&format!("Source: {source}\n"));
    out.push_str(&format!(
        "Records: read={} used={} skipped={}\n",
        run.records_read,
        run.points_used,
        run.skipped.len()
    ));
    out.push_str(&format!("Items: {}\n", run.series.len()));
    out.push_str(&format!("Years: {}\n", fmt_years(&run.years)));
    match run.table.mode {
        ChartMode::Flat => out.push_str("Mode: flat\n"),
        ChartMode::Aligned => {
            let years = run.config.aligned_years().unwrap_or_default();
            out.push_str(&format!("Mode: aligned by year ({})\n", fmt_years(years)));
        }
    }
    out.push('\n');

    out
}

/// Format chart rows as a fixed-width table.
///
/// Filled values are marked with `*`; `-` means the series has no value for
/// that row.
pub fn format_chart_table(table: &ChartTable) -> String {
    if table.is_empty() {
        return "(no data)\n".to_string();
    }

    let widths: Vec<usize> = table
        .columns
        .iter()
        .map(|c| c.key.chars().count().clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH))
        .collect();

    let label_width = table
        .rows
        .iter()
        .map(|r| r.label.chars().count())
        .max()
        .unwrap_or(0)
        .max(LABEL_WIDTH);

    let mut out = String::new();

    let mut header = format!("{:<label_width$}", "period");
    for (col, width) in table.columns.iter().zip(&widths) {
        header.push_str(&format!(" {:>width$}", truncate(&col.key, *width)));
    }
    out.push_str(header.trim_end());
    out.push('\n');

    let mut rule = format!("{:-<label_width$}", "");
    for width in &widths {
        rule.push_str(&format!(" {:-<width$}", ""));
    }
    out.push_str(&rule);
    out.push('\n');

    let mut any_filled = false;
    for row in &table.rows {
        let mut line = format!("{:<label_width$}", row.label);
        for (col, width) in table.columns.iter().zip(&widths) {
            let text = match row.cell(&col.key) {
                Some(cell) if cell.point.is_real() => format!("{:.2}", cell.price),
                Some(cell) => {
                    any_filled = true;
                    format!("{:.2}*", cell.price)
                }
                None => "-".to_string(),
            };
            line.push_str(&format!(" {text:>width$}"));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    if any_filled {
        out.push_str("* carried forward from the last recorded period\n");
    }

    out
}

/// Most recent real observation per item, labelled by the period it counts for.
pub fn format_latest_prices(run: &RunOutput) -> String {
    let latest = run.latest_prices();
    if latest.is_empty() {
        return String::new();
    }

    let granularity = run.config.granularity();
    let mut out = String::from("Latest recorded prices:\n");
    for p in latest {
        out.push_str(&format!(
            "  {:<24} {:>10.2}  {}\n",
            truncate(&p.item_name, 24),
            p.price,
            period_label(p.date, granularity, true)
        ));
    }
    out
}

/// Price in effect on `date` for every item, filled values included.
pub fn format_prices_on(run: &RunOutput, date: NaiveDate) -> String {
    let mut out = format!("Prices on {}:\n", date.format("%Y-%m-%d"));
    let names = order_items(run.config.price_type, run.series.iter().map(|s| s.item_name.as_str()));
    for name in names {
        let Some(series) = run.series.iter().find(|s| s.item_name == name) else {
            continue;
        };
        let text = match series.price_on(date) {
            Some(point) if point.is_real() => format!("{:.2}", point.price()),
            Some(point) => format!("{:.2}*", point.price()),
            None => "-".to_string(),
        };
        out.push_str(&format!("  {:<24} {:>10}\n", truncate(&name, 24), text));
    }
    out
}

/// Records the pipeline could not use.
pub fn format_skipped(skipped: &[SkippedRecord]) -> String {
    if skipped.is_empty() {
        return String::new();
    }

    let mut out = format!("Skipped records ({}):\n", skipped.len());
    for s in skipped.iter().take(MAX_LISTED) {
        out.push_str(&format!("  #{} id={} {}: {}\n", s.index, s.id, s.item_name, s.error));
    }
    if skipped.len() > MAX_LISTED {
        out.push_str(&format!("  ... and {} more\n", skipped.len() - MAX_LISTED));
    }
    out
}

/// Input rows that could not be read at all.
pub fn format_row_errors(errors: &[RowError]) -> String {
    if errors.is_empty() {
        return String::new();
    }

    let mut out = format!("Unreadable rows ({}):\n", errors.len());
    for e in errors.iter().take(MAX_LISTED) {
        match &e.id {
            Some(id) => out.push_str(&format!("  line {} (id {id}): {}\n", e.line, e.message)),
            None => out.push_str(&format!("  line {}: {}\n", e.line, e.message)),
        }
    }
    if errors.len() > MAX_LISTED {
        out.push_str(&format!("  ... and {} more\n", errors.len() - MAX_LISTED));
    }
    out
}

pub fn format_years(price_type: PriceType, years: &[i32]) -> String {
    if years.is_empty() {
        return format!("{}: no data\n", price_type.display_name());
    }
    format!("{}: {}\n", price_type.display_name(), fmt_years(years))
}

fn fmt_years(years: &[i32]) -> String {
    if years.is_empty() {
        return "-".to_string();
    }
    let parts: Vec<String> = years.iter().map(i32::to_string).collect();
    parts.join(", ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
