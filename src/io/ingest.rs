//! Observation file ingest.
//!
//! Turns a CSV export or a saved API response into raw `PriceRecord`s.
//!
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level errors** for rows that cannot even be read as a record
//! - Semantic validation (dates, types, prices) is left to the pipeline, which
//!   reports those records as skipped instead of failing.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::StringRecord;
use serde::Deserialize;
use serde_json::Value;

use crate::data::ApiEnvelope;
use crate::domain::PriceRecord;
use crate::error::AppError;

const REQUIRED_COLUMNS: [&str; 4] = ["price_date", "price_type", "item_name", "price"];

/// A row that could not be turned into a record.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// CSV line number, or 1-based element position in a JSON array.
    pub line: usize,
    pub id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct IngestedRecords {
    pub records: Vec<PriceRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load observations from `path`; `.json` files are read as JSON, anything else as CSV.
pub fn load_records(path: &Path) -> Result<IngestedRecords, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open input '{}': {e}", path.display())))?;
    let reader = BufReader::new(file);

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json { read_json(reader) } else { read_csv(reader) }
}

pub fn read_csv<R: Read>(input: R) -> Result<IngestedRecords, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    for column in REQUIRED_COLUMNS {
        if !header_map.contains_key(column) {
            return Err(AppError::input(format!("Missing required column: `{column}`")));
        }
    }

    let mut out = IngestedRecords::default();

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        out.rows_read += 1;

        let row = match result {
            Ok(r) => r,
            Err(e) => {
                out.row_errors.push(RowError {
                    line,
                    id: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&row, &header_map) {
            Ok(record) => out.records.push(record),
            Err(message) => out.row_errors.push(RowError {
                line,
                id: get_optional(&row, &header_map, "id").map(str::to_string),
                message,
            }),
        }
    }

    Ok(out)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonInput {
    Envelope(ApiEnvelope<Value>),
    List(Vec<Value>),
}

/// Read a JSON array of records, or a saved `{success, data}` API response.
///
/// Only the outer shape is fatal; elements that are not valid records become
/// row errors.
pub fn read_json<R: Read>(input: R) -> Result<IngestedRecords, AppError> {
    let parsed: JsonInput = serde_json::from_reader(input).map_err(|e| {
        AppError::input(format!(
            "Failed to parse JSON observations: expected a record array or a {{success, data}} response ({e})"
        ))
    })?;

    let elements = match parsed {
        JsonInput::Envelope(envelope) => envelope.into_records()?,
        JsonInput::List(elements) => elements,
    };

    Ok(decode_records(elements))
}

/// Decode each JSON element into a `PriceRecord`, collecting failures per element.
pub fn decode_records(elements: Vec<Value>) -> IngestedRecords {
    let mut out = IngestedRecords {
        rows_read: elements.len(),
        ..IngestedRecords::default()
    };

    for (idx, element) in elements.into_iter().enumerate() {
        let id = match element.get("id") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };

        match serde_json::from_value::<PriceRecord>(element) {
            Ok(record) => out.records.push(record),
            Err(e) => out.row_errors.push(RowError {
                line: idx + 1,
                id,
                message: format!("Invalid record: {e}"),
            }),
        }
    }

    out
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(row: &StringRecord, header_map: &HashMap<String, usize>) -> Result<PriceRecord, String> {
    let id = match get_optional(row, header_map, "id") {
        Some(raw) => raw.parse::<u64>().map_err(|_| format!("Invalid `id` '{raw}'."))?,
        None => 0,
    };

    let raw_price = get_required(row, header_map, "price")?;
    let price = raw_price
        .parse::<f64>()
        .map_err(|_| format!("Invalid `price` '{raw_price}'."))?;

    Ok(PriceRecord {
        id,
        tenant_id: get_optional(row, header_map, "tenant_id").unwrap_or_default().to_string(),
        price_date: get_required(row, header_map, "price_date")?.to_string(),
        price_type: get_required(row, header_map, "price_type")?.to_string(),
        item_name: get_required(row, header_map, "item_name")?.to_string(),
        price,
        created_at: get_optional(row, header_map, "created_at").map(str::to_string),
    })
}

fn get_required<'a>(row: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Result<&'a str, String> {
    get_optional(row, header_map, name).ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(row: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    row.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_headers_are_case_insensitive_and_bom_tolerant() {
        let text = "\u{feff}ID,Tenant_ID,PRICE_DATE,Price_Type,Item_Name,Price,Created_At\n\
                    1,t1,2025-01-05,EGG,LARGE EGG,5.50,2025-01-05T09:00:00Z\n\
                    2,t1,2025-01-06,FEED, LAYER MASH ,30,\n";
        let ingested = read_csv(text.as_bytes()).unwrap();
        assert_eq!(ingested.rows_read, 2);
        assert!(ingested.row_errors.is_empty());

        let r = &ingested.records[1];
        assert_eq!(r.id, 2);
        assert_eq!(r.item_name, "LAYER MASH");
        assert_eq!(r.price, 30.0);
        assert_eq!(r.created_at, None);
    }

    #[test]
    fn id_and_created_at_columns_are_optional() {
        let text = "price_date,price_type,item_name,price\n2025-02-01,EGG,SMALL EGG,4.75\n";
        let ingested = read_csv(text.as_bytes()).unwrap();
        assert_eq!(ingested.records[0].id, 0);
        assert_eq!(ingested.records[0].tenant_id, "");
    }

    #[test]
    fn bad_rows_are_reported_with_line_numbers() {
        let text = "id,price_date,price_type,item_name,price\n\
                    1,2025-01-05,EGG,LARGE EGG,5.50\n\
                    2,2025-01-06,EGG,LARGE EGG,abc\n\
                    3,2025-01-07,EGG,,5.0\n\
                    x,2025-01-08,EGG,LARGE EGG,5.0\n";
        let ingested = read_csv(text.as_bytes()).unwrap();
        assert_eq!(ingested.rows_read, 4);
        assert_eq!(ingested.records.len(), 1);

        let lines: Vec<usize> = ingested.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
        assert_eq!(ingested.row_errors[0].id.as_deref(), Some("2"));
        assert!(ingested.row_errors[1].message.contains("item_name"));
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let text = "id,price_date,price_type,price\n1,2025-01-05,EGG,5.5\n";
        let err = read_csv(text.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("item_name"));
    }

    #[test]
    fn json_accepts_list_or_envelope() {
        let list = r#"[{"id": 1, "price_date": "2025-01-05", "price_type": "EGG", "item_name": "LARGE EGG", "price": 5.5}]"#;
        let ingested = read_json(list.as_bytes()).unwrap();
        assert_eq!(ingested.records.len(), 1);

        let envelope = format!(r#"{{"success": true, "data": {list}}}"#);
        let ingested = read_json(envelope.as_bytes()).unwrap();
        assert_eq!(ingested.records[0].item_name, "LARGE EGG");
        assert_eq!(ingested.rows_read, 1);

        assert!(read_json(r#"{"success": false}"#.as_bytes()).is_err());
        assert_eq!(read_json("not json".as_bytes()).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn malformed_json_elements_are_row_errors() {
        let text = r#"[
            {"id": 1, "price_date": "2025-01-05", "price_type": "EGG", "item_name": "LARGE EGG", "price": 5.5},
            {"id": 2, "price_date": null, "price_type": "EGG", "item_name": "LARGE EGG", "price": 5.6},
            {"id": null, "price_date": "2025-01-07", "price_type": "EGG", "item_name": "LARGE EGG", "price": 5.7},
            {"id": 4, "price_date": "2025-01-08", "price_type": "EGG", "item_name": "SMALL EGG", "price": "4.1"},
            "not a record"
        ]"#;
        let ingested = read_json(text.as_bytes()).unwrap();
        assert_eq!(ingested.rows_read, 5);
        assert_eq!(ingested.records.len(), 1);
        assert_eq!(ingested.records[0].id, 1);

        let lines: Vec<usize> = ingested.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![2, 3, 4, 5]);
        assert_eq!(ingested.row_errors[0].id.as_deref(), Some("2"));
        assert!(ingested.row_errors[0].message.contains("Invalid record"));
        assert_eq!(ingested.row_errors[1].id, None);
        assert_eq!(ingested.row_errors[2].id.as_deref(), Some("4"));
    }

    #[test]
    fn envelope_elements_are_decoded_one_by_one() {
        let text = r#"{"success": true, "data": [
            {"price_date": 20250105, "price_type": "EGG", "item_name": "LARGE EGG", "price": 5.5},
            {"price_date": "2025-01-06", "price_type": "EGG", "item_name": "LARGE EGG", "price": 5.6}
        ]}"#;
        let ingested = read_json(text.as_bytes()).unwrap();
        assert_eq!(ingested.records.len(), 1);
        assert_eq!(ingested.records[0].price_date, "2025-01-06");
        assert_eq!(ingested.row_errors[0].line, 1);
    }
}
