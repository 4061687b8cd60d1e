//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - decoded straight from the price API / observation files (`PriceRecord`)
//! - used in-memory by the regularization pipeline (`PricePoint`, `SeriesPoint`)
//! - exported to JSON/CSV alongside the chart rows

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// Identity carried by forward-filled points on the wire.
pub const SYNTHETIC_ID: u64 = 0;

/// Commodity whose price is being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriceType {
    Egg,
    Feed,
}

impl PriceType {
    pub const ALL: [PriceType; 2] = [PriceType::Egg, PriceType::Feed];

    /// Bucket size used for this type's series. Fixed, not configurable.
    pub fn granularity(self) -> Granularity {
        match self {
            PriceType::Egg => Granularity::Monthly,
            PriceType::Feed => Granularity::Weekly,
        }
    }

    /// Wire spelling (`EGG` / `FEED`).
    pub fn as_str(self) -> &'static str {
        match self {
            PriceType::Egg => "EGG",
            PriceType::Feed => "FEED",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            PriceType::Egg => "Egg",
            PriceType::Feed => "Feed",
        }
    }

    /// Parse the wire spelling (case-insensitive, surrounding whitespace ignored).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("EGG") {
            Some(PriceType::Egg)
        } else if s.eq_ignore_ascii_case("FEED") {
            Some(PriceType::Feed)
        } else {
            None
        }
    }
}

/// Period bucket size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Periods start on the first day of each month.
    Monthly,
    /// Periods start on Monday.
    Weekly,
}

/// A raw observation as delivered by the price API or an observation file.
///
/// Nothing here is validated yet; see `PricePoint::try_from`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub tenant_id: String,
    pub price_date: String,
    pub price_type: String,
    pub item_name: String,
    pub price: f64,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A validated observation.
///
/// Points are read-only snapshots: the pipeline clones them into series and
/// builds new points for filled periods, it never edits the caller's data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub id: u64,
    pub tenant_id: String,
    pub date: NaiveDate,
    pub price_type: PriceType,
    pub item_name: String,
    pub price: f64,
    /// When the observation was entered. Only used to break same-period ties.
    pub recorded_at: DateTime<Utc>,
}

impl TryFrom<&PriceRecord> for PricePoint {
    type Error = RecordError;

    fn try_from(record: &PriceRecord) -> Result<Self, Self::Error> {
        let date = parse_date(&record.price_date)
            .ok_or_else(|| RecordError::InvalidDate(record.price_date.clone()))?;
        let price_type = PriceType::parse(&record.price_type)
            .ok_or_else(|| RecordError::UnknownType(record.price_type.clone()))?;

        let item_name = record.item_name.trim();
        if item_name.is_empty() {
            return Err(RecordError::EmptyItem);
        }
        if !record.price.is_finite() || record.price < 0.0 {
            return Err(RecordError::InvalidPrice(record.price));
        }

        // Without a usable entry timestamp, the observation date stands in.
        let recorded_at = record
            .created_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or_else(|| date.and_time(NaiveTime::MIN).and_utc());

        Ok(PricePoint {
            id: record.id,
            tenant_id: record.tenant_id.clone(),
            date,
            price_type,
            item_name: item_name.to_string(),
            price: record.price,
            recorded_at,
        })
    }
}

/// One period of a regularized series.
///
/// `Real` points came from an observation; `Filled` points carry the last
/// real value forward into a period nobody recorded. Consumers that allow
/// editing should branch on this tag (or `editable_id`), not on `id == 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "lowercase")]
pub enum SeriesPoint {
    Real(PricePoint),
    Filled {
        /// Copy of the source observation with `id = 0` and `date` = this period.
        point: PricePoint,
        /// Period of the real observation the value was copied from.
        source_period: NaiveDate,
    },
}

impl SeriesPoint {
    /// Build the filled copy of `source` for `period`.
    pub fn filled_from(source: &PricePoint, period: NaiveDate) -> Self {
        SeriesPoint::Filled {
            point: PricePoint {
                id: SYNTHETIC_ID,
                date: period,
                ..source.clone()
            },
            source_period: source.date,
        }
    }

    pub fn point(&self) -> &PricePoint {
        match self {
            SeriesPoint::Real(point) => point,
            SeriesPoint::Filled { point, .. } => point,
        }
    }

    /// Period key (the point's date is always the period start).
    pub fn period(&self) -> NaiveDate {
        self.point().date
    }

    pub fn price(&self) -> f64 {
        self.point().price
    }

    pub fn is_real(&self) -> bool {
        matches!(self, SeriesPoint::Real(_))
    }

    /// Identity of the stored record a consumer may edit.
    ///
    /// Upstream-derived records (e.g. monthly averages) arrive with `id = 0`;
    /// they are real observations for charting but have nothing to edit.
    pub fn editable_id(&self) -> Option<u64> {
        match self {
            SeriesPoint::Real(point) if point.id != SYNTHETIC_ID => Some(point.id),
            _ => None,
        }
    }
}

/// Deduplicated observations of one item, keyed by period start.
pub type PeriodMap = BTreeMap<NaiveDate, PricePoint>;

/// Gap-free, ascending series for one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilledSeries {
    pub item_name: String,
    pub granularity: Granularity,
    pub points: Vec<SeriesPoint>,
}

impl FilledSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn first_period(&self) -> Option<NaiveDate> {
        self.points.first().map(SeriesPoint::period)
    }

    pub fn last_period(&self) -> Option<NaiveDate> {
        self.points.last().map(SeriesPoint::period)
    }

    pub fn get(&self, period: NaiveDate) -> Option<&SeriesPoint> {
        self.points
            .binary_search_by_key(&period, SeriesPoint::period)
            .ok()
            .map(|idx| &self.points[idx])
    }

    /// The point in effect on `date`: the one whose period contains it.
    ///
    /// Returns `None` outside the series' covered range.
    pub fn price_on(&self, date: NaiveDate) -> Option<&SeriesPoint> {
        let period = crate::period::period_key(date, self.granularity);
        self.get(period)
    }

    /// Most recent real observation in the series.
    pub fn latest_real(&self) -> Option<&PricePoint> {
        self.points
            .iter()
            .rev()
            .find_map(|p| match p {
                SeriesPoint::Real(point) => Some(point),
                SeriesPoint::Filled { .. } => None,
            })
    }
}

/// Options recognized by the regularization pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesConfig {
    pub price_type: PriceType,
    /// Years to overlay. `None` or an empty list selects flat mode.
    pub compare_years: Option<Vec<i32>>,
    /// Restrict output to these item names.
    pub item_filter: Option<BTreeSet<String>>,
}

impl SeriesConfig {
    pub fn new(price_type: PriceType) -> Self {
        Self {
            price_type,
            compare_years: None,
            item_filter: None,
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.price_type.granularity()
    }

    /// Years to align, if aligned mode is enabled.
    pub fn aligned_years(&self) -> Option<&[i32]> {
        self.compare_years
            .as_deref()
            .filter(|years| !years.is_empty())
    }

    pub fn includes_item(&self, item_name: &str) -> bool {
        match &self.item_filter {
            Some(filter) => filter.contains(item_name),
            None => true,
        }
    }
}

/// Parse an observation date.
///
/// ISO dates are canonical, but spreadsheet exports often use `DD/MM/YYYY`
/// or `DD-MM-YYYY`, and the API may hand back full timestamps. Only the
/// calendar date is kept.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    let s = s.trim();
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    // `2025-01-05T00:00:00Z`, `2025-01-05 10:30:00`, ...
    let (head, tail) = (s.get(..10)?, s.get(10..)?);
    if tail.starts_with('T') || tail.starts_with(' ') {
        return NaiveDate::parse_from_str(head, "%Y-%m-%d").ok();
    }
    None
}

/// Parse an entry timestamp as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    const FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
    for fmt in FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }
    None
}
