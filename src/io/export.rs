//! Export chart tables and observation files.
//!
//! CSV output is meant to be easy to consume in spreadsheets: one line per
//! row, one column per series, an empty cell where a series has no value.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::PriceRecord;
use crate::error::AppError;
use crate::report::{ChartTable, RowKey};

/// Write `table` as CSV (`period,label,<column>...`).
pub fn write_table_csv<W: Write>(out: W, table: &ChartTable) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["period".to_string(), "label".to_string()];
    header.extend(table.columns.iter().map(|c| c.key.clone()));
    writer
        .write_record(&header)
        .map_err(|e| AppError::runtime(format!("Failed to write CSV header: {e}")))?;

    for row in &table.rows {
        let period = match row.key {
            RowKey::Period(date) => date.format("%Y-%m-%d").to_string(),
            RowKey::Ordinal(ordinal) => ordinal.to_string(),
        };
        let mut line = vec![period, row.label.clone()];
        line.extend(
            table
                .columns
                .iter()
                .map(|col| row.cell(&col.key).map(|c| format!("{:.2}", c.price)).unwrap_or_default()),
        );
        writer
            .write_record(&line)
            .map_err(|e| AppError::runtime(format!("Failed to write CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::runtime(format!("Failed to flush CSV output: {e}")))
}

/// Write `table` as pretty-printed JSON.
pub fn write_table_json<W: Write>(mut out: W, table: &ChartTable) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut out, table)
        .map_err(|e| AppError::runtime(format!("Failed to write JSON: {e}")))?;
    writeln!(out).map_err(|e| AppError::runtime(format!("Failed to write JSON: {e}")))
}

/// Write several tables as one pretty-printed JSON array.
pub fn write_tables_json<W: Write>(mut out: W, tables: &[&ChartTable]) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut out, tables)
        .map_err(|e| AppError::runtime(format!("Failed to write JSON: {e}")))?;
    writeln!(out).map_err(|e| AppError::runtime(format!("Failed to write JSON: {e}")))
}

/// Export `table` to `path`; `.json` gets JSON, anything else CSV.
pub fn export_table(path: &Path, table: &ChartTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create export file '{}': {e}", path.display())))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        write_table_json(file, table)
    } else {
        write_table_csv(file, table)
    }
}

/// Write raw observations in the ingest CSV layout.
pub fn write_records_csv(path: &Path, records: &[PriceRecord]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| AppError::runtime(format!("Failed to write CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::runtime(format!("Failed to flush CSV '{}': {e}", path.display())))
}
