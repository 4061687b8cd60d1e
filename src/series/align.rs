//! Year-over-year realignment.
//!
//! Filled series are re-keyed by `(year, ordinal)` so that, say, week 5 of
//! 2024 and week 5 of 2025 land on the same axis position. Ordinals come from
//! `period::period_ordinal`, which shares the Monday rule with period keys.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;

use crate::domain::{FilledSeries, Granularity, PricePoint, SeriesPoint};
use crate::period::period_ordinal;

/// Points of one item, by year then ordinal.
pub type YearOrdinals = BTreeMap<i32, BTreeMap<u32, SeriesPoint>>;

/// Aligned points for every item that has data in at least one requested year.
pub type AlignedItems = BTreeMap<String, YearOrdinals>;

/// Re-key `series` by within-year ordinal, keeping only `years`.
///
/// A period belongs to the year of its period start. Years without data are
/// simply absent; nothing is synthesized across years.
pub fn align_by_year(series: &[FilledSeries], granularity: Granularity, years: &[i32]) -> AlignedItems {
    let wanted: BTreeSet<i32> = years.iter().copied().collect();
    let mut aligned = AlignedItems::new();

    for s in series {
        let mut by_year = YearOrdinals::new();
        for point in &s.points {
            let period = point.period();
            if !wanted.contains(&period.year()) {
                continue;
            }
            by_year
                .entry(period.year())
                .or_default()
                .insert(period_ordinal(period, granularity), point.clone());
        }
        if !by_year.is_empty() {
            aligned.insert(s.item_name.clone(), by_year);
        }
    }

    aligned
}

/// Distinct observation years, most recent first.
pub fn available_years(points: &[PricePoint]) -> Vec<i32> {
    let years: BTreeSet<i32> = points.iter().map(|p| p.date.year()).collect();
    years.into_iter().rev().collect()
}

/// The comparison used when none is requested: the two most recent years.
pub fn default_compare_years(available: &[i32]) -> Vec<i32> {
    available.iter().take(2).copied().collect()
}
