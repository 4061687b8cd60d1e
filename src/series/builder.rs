//! Record validation and per-period grouping.
//!
//! Two steps, kept separate so the grouping stays a pure fold over typed points:
//!
//! 1. `collect_points`: validate raw records, keep the configured type/items,
//!    and report (but never fail on) records that cannot be used.
//! 2. `build_series`: group points by item and period key, resolving
//!    same-period duplicates by the latest `recorded_at`.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{Granularity, PeriodMap, PricePoint, PriceRecord, PriceType, SeriesConfig};
use crate::error::RecordError;
use crate::period::period_key;

/// A record that was dropped during validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    /// Position in the input slice (0-based).
    pub index: usize,
    pub id: u64,
    pub item_name: String,
    #[serde(serialize_with = "serialize_error")]
    pub error: RecordError,
}

fn serialize_error<S: serde::Serializer>(error: &RecordError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(error)
}

/// Validate `records` and keep the ones `config` selects.
///
/// Records of another price type, or of items outside the item filter, are
/// ignored silently. Invalid records are returned as `SkippedRecord`s.
pub fn collect_points(records: &[PriceRecord], config: &SeriesConfig) -> (Vec<PricePoint>, Vec<SkippedRecord>) {
    let mut points = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();

    for (index, record) in records.iter().enumerate() {
        match PricePoint::try_from(record) {
            Ok(point) => {
                if point.price_type == config.price_type && config.includes_item(&point.item_name) {
                    points.push(point);
                }
            }
            // Another type's bad record is that type's run to report.
            Err(_) if PriceType::parse(&record.price_type).is_some_and(|t| t != config.price_type) => {}
            Err(error) => {
                warn!(index, id = record.id, item = %record.item_name, %error, "skipping price record");
                skipped.push(SkippedRecord {
                    index,
                    id: record.id,
                    item_name: record.item_name.clone(),
                    error,
                });
            }
        }
    }

    (points, skipped)
}

/// Group `points` by item name, one entry per period key.
///
/// When several points land in the same period, the one recorded last wins.
/// Equal `recorded_at` values fall back to the later observation date, then
/// the higher id, so the result never depends on input order. Stored points
/// carry the period key as their `date`.
pub fn build_series(points: &[PricePoint], granularity: Granularity) -> BTreeMap<String, PeriodMap> {
    let slots = points.iter().fold(
        BTreeMap::<&str, BTreeMap<NaiveDate, &PricePoint>>::new(),
        |mut items, point| {
            let key = period_key(point.date, granularity);
            let periods = items.entry(point.item_name.as_str()).or_default();
            match periods.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(point);
                }
                Entry::Occupied(mut slot) => {
                    if supersedes(point, slot.get()) {
                        debug!(item = %point.item_name, period = %key, "newer observation replaces earlier one");
                        slot.insert(point);
                    }
                }
            }
            items
        },
    );

    slots
        .into_iter()
        .map(|(item_name, periods)| {
            let periods = periods
                .into_iter()
                .map(|(key, point)| {
                    (
                        key,
                        PricePoint {
                            date: key,
                            ..point.clone()
                        },
                    )
                })
                .collect();
            (item_name.to_string(), periods)
        })
        .collect()
}

fn supersedes(candidate: &PricePoint, current: &PricePoint) -> bool {
    (candidate.recorded_at, candidate.date, candidate.id) > (current.recorded_at, current.date, current.id)
}
