//! Shared "regularize" pipeline used by every front-end command.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! validate -> group per period -> forward-fill -> (align by year) -> rows
//!
//! The pipeline is pure: it takes fully materialized records and returns a
//! fully materialized table. Callers handle fetching and printing.

use rayon::prelude::*;
use tracing::info;

use crate::domain::{FilledSeries, PricePoint, PriceRecord, PriceType, SeriesConfig};
use crate::report::{ChartTable, assemble_aligned_rows, assemble_rows, ordinal_range};
use crate::series::{
    SkippedRecord, align_by_year, available_years, build_series, collect_points, default_compare_years, fill_gaps,
};

/// All computed outputs of a single pipeline run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub config: SeriesConfig,
    pub table: ChartTable,
    /// Filled series per item (alphabetical by item name).
    pub series: Vec<FilledSeries>,
    /// Years present in the selected observations, most recent first.
    pub years: Vec<i32>,
    pub skipped: Vec<SkippedRecord>,
    pub records_read: usize,
    pub points_used: usize,
}

impl RunOutput {
    /// Most recent real observation per item, in column order.
    pub fn latest_prices(&self) -> Vec<&PricePoint> {
        let mut latest: Vec<&PricePoint> = self.series.iter().filter_map(FilledSeries::latest_real).collect();
        latest.sort_by(|a, b| crate::report::compare_items(self.config.price_type, &a.item_name, &b.item_name));
        latest
    }
}

/// Execute the full pipeline for one price type.
pub fn run_pipeline(records: &[PriceRecord], config: &SeriesConfig) -> RunOutput {
    let granularity = config.granularity();

    // 1) Validate and select.
    let (points, skipped) = collect_points(records, config);
    let years = available_years(&points);

    // 2) One entry per item and period.
    let per_item = build_series(&points, granularity);

    // 3) Forward-fill each item independently.
    let series: Vec<FilledSeries> = per_item
        .par_iter()
        .map(|(_, periods)| fill_gaps(periods, granularity))
        .collect();

    // 4) Rows: flat, or realigned by year.
    let table = match config.aligned_years() {
        Some(compare) => {
            let aligned = align_by_year(&series, granularity, compare);
            let ordinals = ordinal_range(granularity, &aligned);
            assemble_aligned_rows(config.price_type, &aligned, compare, ordinals)
        }
        None => assemble_rows(config.price_type, &series),
    };

    info!(
        price_type = config.price_type.as_str(),
        records = records.len(),
        points = points.len(),
        skipped = skipped.len(),
        items = series.len(),
        rows = table.rows.len(),
        "regularized price series"
    );

    RunOutput {
        config: config.clone(),
        table,
        series,
        years,
        skipped,
        records_read: records.len(),
        points_used: points.len(),
    }
}

/// Resolve the overlay years for `config`.
///
/// An explicit empty list asks for the default: the two most recent years
/// with observations of the configured type.
pub fn resolve_compare_years(records: &[PriceRecord], config: &SeriesConfig) -> Option<Vec<i32>> {
    match config.compare_years.as_deref() {
        None => None,
        Some([]) => {
            let points: Vec<PricePoint> = records
                .iter()
                .filter_map(|r| PricePoint::try_from(r).ok())
                .filter(|p| p.price_type == config.price_type && config.includes_item(&p.item_name))
                .collect();
            Some(default_compare_years(&available_years(&points)))
        }
        Some(years) => Some(years.to_vec()),
    }
}

/// Run the pipeline for every price type.
///
/// Each run owns its working maps, so the types are processed in parallel.
pub fn run_all(records: &[PriceRecord], template: &SeriesConfig) -> Vec<RunOutput> {
    PriceType::ALL
        .par_iter()
        .map(|&price_type| {
            let config = SeriesConfig {
                price_type,
                ..template.clone()
            };
            run_pipeline(records, &config)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::{SampleConfig, generate_sample};
    use crate::domain::{Granularity, SeriesPoint};
    use crate::period::{month_end_boundary, period_key};
    use crate::report::{ChartMode, RowKey};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn record(id: u64, date: &str, price_type: &str, item: &str, price: f64, created_at: Option<&str>) -> PriceRecord {
        PriceRecord {
            id,
            tenant_id: "t1".to_string(),
            price_date: date.to_string(),
            price_type: price_type.to_string(),
            item_name: item.to_string(),
            price,
            created_at: created_at.map(str::to_string),
        }
    }

    fn sample_records(seed: u64) -> Vec<PriceRecord> {
        let config = SampleConfig {
            seed,
            ..SampleConfig::default()
        };
        generate_sample(&config).unwrap()
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let run = run_pipeline(&[], &SeriesConfig::new(PriceType::Egg));
        assert!(run.table.is_empty());
        assert!(run.skipped.is_empty());
        assert!(run.years.is_empty());
    }

    #[test]
    fn duplicate_in_period_uses_latest_entry() {
        let records = vec![
            record(1, "2025-01-03", "EGG", "LARGE EGG", 5.00, Some("2025-01-03T08:00:00Z")),
            record(2, "2025-01-05", "EGG", "LARGE EGG", 5.20, Some("2025-01-05T08:00:00Z")),
        ];
        let run = run_pipeline(&records, &SeriesConfig::new(PriceType::Egg));
        assert_eq!(run.table.rows.len(), 1);
        assert_eq!(run.table.rows[0].key, RowKey::Period(d(2025, 1, 1)));
        assert_eq!(run.table.rows[0].cell("LARGE EGG").map(|c| c.price), Some(5.20));
    }

    #[test]
    fn malformed_dates_are_skipped_not_fatal() {
        let records = vec![
            record(1, "2025-01-06", "FEED", "LAYER MASH", 30.0, None),
            record(2, "06/13/2025", "FEED", "LAYER MASH", 99.0, None),
            record(3, "2025-01-20", "FEED", "LAYER MASH", 32.0, None),
        ];
        let run = run_pipeline(&records, &SeriesConfig::new(PriceType::Feed));
        assert_eq!(run.skipped.len(), 1);
        assert_eq!(run.skipped[0].id, 2);
        assert_eq!(run.points_used, 2);

        let prices: Vec<f64> = run.table.rows.iter().map(|r| r.cells[0].price).collect();
        assert_eq!(prices, vec![30.0, 30.0, 32.0, 32.0]);
        assert_eq!(run.table.rows.last().map(|r| r.key), Some(RowKey::Period(d(2025, 1, 27))));
    }

    #[test]
    fn compare_years_switches_to_aligned_rows() {
        let mut records: Vec<PriceRecord> = (1..=12)
            .map(|m| record(m as u64, &format!("2024-{m:02}-10"), "EGG", "LARGE EGG", 5.0, None))
            .collect();
        records.push(record(20, "2025-01-10", "EGG", "LARGE EGG", 6.2, None));
        records.push(record(21, "2025-06-10", "EGG", "LARGE EGG", 6.5, None));

        let config = SeriesConfig {
            compare_years: Some(vec![2025, 2024]),
            ..SeriesConfig::new(PriceType::Egg)
        };
        let run = run_pipeline(&records, &config);
        assert_eq!(run.table.mode, ChartMode::Aligned);
        assert_eq!(run.years, vec![2025, 2024]);
        assert_eq!(run.table.rows.len(), 12);

        let with_2025: Vec<u32> = run
            .table
            .rows
            .iter()
            .filter(|r| r.cell("LARGE EGG (2025)").is_some())
            .map(|r| match r.key {
                RowKey::Ordinal(o) => o,
                RowKey::Period(_) => unreachable!(),
            })
            .collect();
        assert_eq!(with_2025, (1..=6).collect::<Vec<_>>());
        assert!(run.table.rows.iter().all(|r| r.cell("LARGE EGG (2024)").is_some()));
    }

    #[test]
    fn requested_year_without_data_is_just_absent() {
        let records = vec![record(1, "2025-03-03", "FEED", "LAYER MASH", 30.0, None)];
        let config = SeriesConfig {
            compare_years: Some(vec![2025, 2019]),
            ..SeriesConfig::new(PriceType::Feed)
        };
        let run = run_pipeline(&records, &config);
        let keys: Vec<&str> = run.table.columns.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["LAYER MASH (2025)"]);
    }

    #[test]
    fn bare_compare_picks_two_most_recent_years() {
        let records = vec![
            record(1, "2023-05-01", "EGG", "LARGE EGG", 5.0, None),
            record(2, "2024-05-01", "EGG", "LARGE EGG", 5.1, None),
            record(3, "2025-05-01", "EGG", "LARGE EGG", 5.2, None),
            record(4, "2026-05-04", "FEED", "LAYER MASH", 30.0, None),
        ];
        let mut config = SeriesConfig::new(PriceType::Egg);
        assert_eq!(resolve_compare_years(&records, &config), None);

        config.compare_years = Some(vec![]);
        assert_eq!(resolve_compare_years(&records, &config), Some(vec![2025, 2024]));

        config.compare_years = Some(vec![2019]);
        assert_eq!(resolve_compare_years(&records, &config), Some(vec![2019]));
    }

    #[test]
    fn pipeline_is_deterministic() {
        let records = sample_records(11);
        for price_type in PriceType::ALL {
            let config = SeriesConfig::new(price_type);
            let a = run_pipeline(&records, &config);
            let b = run_pipeline(&records, &config);
            assert_eq!(a.table, b.table);
            assert_eq!(a.series, b.series);
        }
    }

    #[test]
    fn sample_series_hold_fill_invariants() {
        for seed in [1, 2, 3, 42] {
            let records = sample_records(seed);
            for run in run_all(&records, &SeriesConfig::new(PriceType::Egg)) {
                let granularity = run.config.granularity();
                let points: Vec<PricePoint> = records
                    .iter()
                    .filter_map(|r| PricePoint::try_from(r).ok())
                    .filter(|p| p.price_type == run.config.price_type)
                    .collect();

                for series in &run.series {
                    let own: Vec<&PricePoint> = points.iter().filter(|p| p.item_name == series.item_name).collect();
                    let earliest = own.iter().map(|p| p.date).min().unwrap();
                    let latest = own.iter().map(|p| p.date).max().unwrap();

                    // No backward fill.
                    assert_eq!(series.first_period(), Some(period_key(earliest, granularity)));
                    assert!(series.points[0].is_real());

                    // Month-end completeness.
                    let boundary = month_end_boundary(period_key(latest, granularity), granularity);
                    assert!(series.last_period().unwrap() >= boundary);

                    // Contiguous, unique periods; fills repeat the previous value.
                    for pair in series.points.windows(2) {
                        let next = crate::period::next_period(pair[0].period(), granularity);
                        assert_eq!(next, Some(pair[1].period()));
                        if let SeriesPoint::Filled { point, .. } = &pair[1] {
                            assert_eq!(point.price, pair[0].price());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn aligned_ordinals_stay_in_bounds() {
        let records = sample_records(7);
        for price_type in PriceType::ALL {
            let config = SeriesConfig {
                compare_years: Some(vec![2025, 2024, 2023]),
                ..SeriesConfig::new(price_type)
            };
            let run = run_pipeline(&records, &config);
            let max = match price_type.granularity() {
                Granularity::Monthly => 12,
                Granularity::Weekly => 53,
            };
            for row in &run.table.rows {
                match row.key {
                    RowKey::Ordinal(o) => assert!((1..=max).contains(&o)),
                    RowKey::Period(_) => panic!("flat row in aligned table"),
                }
            }
        }
    }

    #[test]
    fn run_all_covers_both_types() {
        let records = vec![
            record(1, "2025-01-05", "EGG", "LARGE EGG", 5.0, None),
            record(2, "2025-01-06", "FEED", "LAYER MASH", 30.0, None),
        ];
        let runs = run_all(&records, &SeriesConfig::new(PriceType::Egg));
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].config.price_type, PriceType::Egg);
        assert_eq!(runs[1].config.price_type, PriceType::Feed);
        assert_eq!(runs[0].table.columns[0].key, "LARGE EGG");
        assert_eq!(runs[1].table.columns[0].key, "LAYER MASH");
        assert_eq!(runs[1].latest_prices()[0].price, 30.0);
    }
}
