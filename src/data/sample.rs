//! Synthetic price observation generation.
//!
//! Produces the kind of input the pipeline has to cope with in practice:
//! observations on arbitrary days, periods nobody recorded, a second entry
//! in the same period entered later, and the occasional malformed date.

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveTime, Utc};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Granularity, PriceRecord, PriceType};
use crate::error::AppError;
use crate::period::{next_period, period_key};

/// Items generated per type, with their starting price.
const EGG_ITEMS: [(&str, f64); 3] = [("LARGE EGG", 5.50), ("MEDIUM EGG", 5.20), ("SMALL EGG", 4.80)];
const FEED_ITEMS: [(&str, f64); 3] = [("LAYER MASH", 30.0), ("PRE-LAYER MASH", 29.0), ("GROWER MASH", 27.5)];

/// Per-period log-price volatility of the random walk.
const PRICE_VOL: f64 = 0.02;

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub seed: u64,
    /// First day covered by the sample.
    pub start: NaiveDate,
    /// Number of calendar months covered.
    pub months: u32,
    pub tenant_id: String,
    /// Probability that a period has no observation.
    pub gap_rate: f64,
    /// Probability of a second, later-entered observation in a recorded period.
    pub duplicate_rate: f64,
    /// Probability of emitting a record with an unparseable date.
    pub invalid_rate: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            months: 36,
            tenant_id: "demo-tenant".to_string(),
            gap_rate: 0.35,
            duplicate_rate: 0.10,
            invalid_rate: 0.02,
        }
    }
}

/// Generate observations for every known EGG and FEED item.
pub fn generate_sample(config: &SampleConfig) -> Result<Vec<PriceRecord>, AppError> {
    if config.months == 0 {
        return Err(AppError::input("Sample must cover at least one month."));
    }
    for (name, rate) in [
        ("gap rate", config.gap_rate),
        ("duplicate rate", config.duplicate_rate),
        ("invalid rate", config.invalid_rate),
    ] {
        if !(rate.is_finite() && (0.0..1.0).contains(&rate)) {
            return Err(AppError::input(format!("Invalid {name} {rate} (must be in [0, 1)).")));
        }
    }

    let end = config
        .start
        .checked_add_months(Months::new(config.months))
        .ok_or_else(|| AppError::input("Sample range overflows the calendar."))?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, PRICE_VOL).map_err(|e| AppError::runtime(format!("Noise distribution error: {e}")))?;

    let mut out = Generator {
        config,
        records: Vec::new(),
        next_id: 1,
    };

    for price_type in PriceType::ALL {
        let items: &[(&str, f64)] = match price_type {
            PriceType::Egg => &EGG_ITEMS,
            PriceType::Feed => &FEED_ITEMS,
        };
        for &(item, base) in items {
            out.item(&mut rng, &noise, price_type, item, base, end);
        }
    }

    Ok(out.records)
}

struct Generator<'a> {
    config: &'a SampleConfig,
    records: Vec<PriceRecord>,
    next_id: u64,
}

impl Generator<'_> {
    fn item(
        &mut self,
        rng: &mut StdRng,
        noise: &Normal<f64>,
        price_type: PriceType,
        item: &str,
        base: f64,
        end: NaiveDate,
    ) {
        let granularity = price_type.granularity();
        let mut price = base;
        let mut period = Some(period_key(self.config.start, granularity));
        let mut first = true;

        while let Some(start) = period.filter(|p| *p < end) {
            price *= noise.sample(rng).exp();

            // The first period is always recorded so every item has data.
            if first || !rng.gen_bool(self.config.gap_rate) {
                let span = period_len_days(start, granularity);
                let date = start + Days::new(rng.gen_range(0..span));
                let entered = date.and_time(NaiveTime::MIN).and_utc() + Duration::hours(rng.gen_range(8..72));
                self.push(price_type, item, date.format("%Y-%m-%d").to_string(), round2(price), entered);

                if rng.gen_bool(self.config.duplicate_rate) {
                    let revised = round2(price * (1.0 + noise.sample(rng)));
                    let later = entered + Duration::hours(rng.gen_range(1..48));
                    let other_day = start + Days::new(rng.gen_range(0..span));
                    self.push(price_type, item, other_day.format("%Y-%m-%d").to_string(), revised, later);
                }
            }

            if rng.gen_bool(self.config.invalid_rate) {
                let bogus = format!("{}-02-30", start.year());
                let entered = start.and_time(NaiveTime::MIN).and_utc();
                self.push(price_type, item, bogus, round2(price), entered);
            }

            first = false;
            period = next_period(start, granularity);
        }
    }

    fn push(&mut self, price_type: PriceType, item: &str, date: String, price: f64, entered: DateTime<Utc>) {
        self.records.push(PriceRecord {
            id: self.next_id,
            tenant_id: self.config.tenant_id.clone(),
            price_date: date,
            price_type: price_type.as_str().to_string(),
            item_name: item.to_string(),
            price: price.max(0.0),
            created_at: Some(entered.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        });
        self.next_id += 1;
    }
}

fn period_len_days(start: NaiveDate, granularity: Granularity) -> u64 {
    next_period(start, granularity)
        .map(|next| (next - start).num_days().max(1) as u64)
        .unwrap_or(1)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
