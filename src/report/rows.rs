//! Chart row assembly.
//!
//! Turns per-item series into period-indexed rows with one column per item
//! (flat mode) or per item and year (aligned mode). Cells keep the point they
//! came from so a consumer can tell real observations from filled ones.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::domain::{FilledSeries, Granularity, PriceType, SeriesPoint};
use crate::period::{ordinal_label, period_label};
use crate::report::order::order_items;
use crate::series::AlignedItems;

/// Position of a row on the chart axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKey {
    /// Calendar period start (flat mode).
    Period(NaiveDate),
    /// Within-year ordinal (aligned mode).
    Ordinal(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartMode {
    Flat,
    Aligned,
}

/// One value column of the chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    /// `"LARGE EGG"` in flat mode, `"LARGE EGG (2025)"` in aligned mode.
    pub key: String,
    pub item_name: String,
    pub year: Option<i32>,
}

impl Column {
    fn item(item_name: &str) -> Self {
        Self {
            key: item_name.to_string(),
            item_name: item_name.to_string(),
            year: None,
        }
    }

    fn item_year(item_name: &str, year: i32) -> Self {
        Self {
            key: format!("{item_name} ({year})"),
            item_name: item_name.to_string(),
            year: Some(year),
        }
    }
}

/// A present value in a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub column: String,
    pub price: f64,
    pub point: SeriesPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub key: RowKey,
    pub label: String,
    /// Present cells only, in column order.
    pub cells: Vec<Cell>,
}

impl ChartRow {
    pub fn cell(&self, column: &str) -> Option<&Cell> {
        self.cells.iter().find(|c| c.column == column)
    }
}

/// Rows ready for a charting surface, ascending by key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartTable {
    pub price_type: PriceType,
    pub granularity: Granularity,
    pub mode: ChartMode,
    pub columns: Vec<Column>,
    pub rows: Vec<ChartRow>,
}

impl ChartTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Flat mode: one row per distinct period across all items.
///
/// An item without a point for a period has no cell in that row.
pub fn assemble_rows(price_type: PriceType, series: &[FilledSeries]) -> ChartTable {
    let granularity = price_type.granularity();
    let order = order_items(price_type, series.iter().map(|s| s.item_name.as_str()));
    let ordered: Vec<&FilledSeries> = order
        .iter()
        .filter_map(|name| series.iter().find(|s| &s.item_name == name))
        .collect();

    let periods: BTreeSet<NaiveDate> = series
        .iter()
        .flat_map(|s| s.points.iter().map(SeriesPoint::period))
        .collect();

    // Weekly labels need the year once the axis crosses New Year.
    let multi_year = periods.first().map(Datelike::year) != periods.last().map(Datelike::year);

    let rows = periods
        .into_iter()
        .map(|period| ChartRow {
            key: RowKey::Period(period),
            label: period_label(period, granularity, multi_year),
            cells: ordered
                .iter()
                .filter_map(|s| {
                    s.get(period).map(|point| Cell {
                        column: s.item_name.clone(),
                        price: point.price(),
                        point: point.clone(),
                    })
                })
                .collect(),
        })
        .collect();

    ChartTable {
        price_type,
        granularity,
        mode: ChartMode::Flat,
        columns: ordered.iter().map(|s| Column::item(&s.item_name)).collect(),
        rows,
    }
}

/// Aligned mode: one row per ordinal in `ordinals`, columns per item × year.
///
/// Columns follow item order, then `years` in the order given; item/year
/// pairs without data get no column. Weekly rows are labelled by the dates
/// of the first (most recent, by default) year in `years`; no years, no rows.
pub fn assemble_aligned_rows(
    price_type: PriceType,
    aligned: &AlignedItems,
    years: &[i32],
    ordinals: RangeInclusive<u32>,
) -> ChartTable {
    let granularity = price_type.granularity();
    let items = order_items(price_type, aligned.keys().map(String::as_str));

    let columns: Vec<Column> = items
        .iter()
        .flat_map(|item| {
            years
                .iter()
                .filter(|year| aligned.get(item).is_some_and(|by_year| by_year.contains_key(*year)))
                .map(|&year| Column::item_year(item, year))
        })
        .collect();

    let Some(&label_year) = years.first() else {
        return ChartTable {
            price_type,
            granularity,
            mode: ChartMode::Aligned,
            columns: Vec::new(),
            rows: Vec::new(),
        };
    };

    let rows = ordinals
        .map(|ordinal| ChartRow {
            key: RowKey::Ordinal(ordinal),
            label: ordinal_label(ordinal, granularity, label_year),
            cells: columns
                .iter()
                .filter_map(|col| {
                    let year = col.year?;
                    let point = aligned.get(&col.item_name)?.get(&year)?.get(&ordinal)?;
                    Some(Cell {
                        column: col.key.clone(),
                        price: point.price(),
                        point: point.clone(),
                    })
                })
                .collect(),
        })
        .collect();

    ChartTable {
        price_type,
        granularity,
        mode: ChartMode::Aligned,
        columns,
        rows,
    }
}

/// Default ordinal axis: months 1-12, weeks 1-52 (53 when any data uses it).
pub fn ordinal_range(granularity: Granularity, aligned: &AlignedItems) -> RangeInclusive<u32> {
    match granularity {
        Granularity::Monthly => 1..=12,
        Granularity::Weekly => {
            let max_seen = aligned
                .values()
                .flat_map(|by_year| by_year.values())
                .filter_map(|ords| ords.keys().next_back().copied())
                .max()
                .unwrap_or(0);
            1..=max_seen.max(52)
        }
    }
}
