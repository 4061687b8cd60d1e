//! Period keys, period stepping and week numbering.
//!
//! Every period is identified by the date it starts on:
//!
//! - MONTHLY: the first day of the month
//! - WEEKLY: the Monday on or before the date (a Sunday belongs to the
//!   Monday six days earlier, never the following day)
//!
//! Week ordinals for year-over-year overlays are derived from the same Monday
//! rule (`first_monday`), so a period key and its ordinal can never disagree.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::domain::Granularity;

/// Canonical start of the period containing `date`.
pub fn period_key(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Monthly => month_start(date),
        Granularity::Weekly => week_start(date),
    }
}

/// First day of `date`'s month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// Monday of `date`'s week.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

/// Start of the period following `key`.
///
/// `None` only at the very end of chrono's representable range.
pub fn next_period(key: NaiveDate, granularity: Granularity) -> Option<NaiveDate> {
    match granularity {
        Granularity::Monthly => key.checked_add_months(Months::new(1)),
        Granularity::Weekly => key.checked_add_days(Days::new(7)),
    }
}

/// Last day of `date`'s calendar month.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    month_start(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Last period start that still falls inside the calendar month of `date`.
///
/// For WEEKLY this is the last Monday on or before the month's last day;
/// for MONTHLY it is the month start itself.
pub fn month_end_boundary(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    period_key(month_end(date), granularity)
}

/// The first Monday of `year` (the Monday on or before January 7th).
pub fn first_monday(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 7).map(week_start)
}

/// Year-independent position of a period within its year.
///
/// MONTHLY: month number 1-12. WEEKLY: 1 for the first in-year Monday, then
/// one per week (52 or 53 in total). The key is normalized to its period
/// start first, and the ordinal is relative to the period start's year.
pub fn period_ordinal(key: NaiveDate, granularity: Granularity) -> u32 {
    match granularity {
        Granularity::Monthly => key.month(),
        Granularity::Weekly => {
            let monday = week_start(key);
            let weeks = first_monday(monday.year())
                .map(|first| (monday - first).num_days() / 7)
                .unwrap_or_else(|| i64::from(monday.ordinal0() / 7));
            // Mondays before the year's first Monday belong to the previous
            // year's numbering and never reach here with a negative count.
            (weeks.max(0) + 1) as u32
        }
    }
}

/// Start date of `ordinal` within `year`, the inverse of `period_ordinal`.
pub fn ordinal_start(year: i32, ordinal: u32, granularity: Granularity) -> Option<NaiveDate> {
    if ordinal == 0 {
        return None;
    }
    match granularity {
        Granularity::Monthly => NaiveDate::from_ymd_opt(year, ordinal, 1),
        Granularity::Weekly => {
            let start = first_monday(year)?.checked_add_days(Days::new(7 * u64::from(ordinal - 1)))?;
            (start.year() == year).then_some(start)
        }
    }
}

/// Label for a period key on a calendar axis (`Jan 2025`, `6 Jan`).
///
/// Weekly labels carry the year (`6 Jan 2025`) when `with_year` is set;
/// monthly labels always do.
pub fn period_label(key: NaiveDate, granularity: Granularity, with_year: bool) -> String {
    match granularity {
        Granularity::Monthly => key.format("%b %Y").to_string(),
        Granularity::Weekly if with_year => key.format("%-d %b %Y").to_string(),
        Granularity::Weekly => key.format("%-d %b").to_string(),
    }
}

/// Label for an ordinal on a year-independent axis.
///
/// Months are labelled by name (`Jan`); weeks by the Monday that starts the
/// ordinal in `label_year` (`6 Jan`), or `W53` when that year has no such week.
pub fn ordinal_label(ordinal: u32, granularity: Granularity, label_year: i32) -> String {
    match (granularity, ordinal_start(label_year, ordinal, granularity)) {
        (Granularity::Monthly, Some(start)) => start.format("%b").to_string(),
        (Granularity::Weekly, Some(start)) => start.format("%-d %b").to_string(),
        (Granularity::Monthly, None) => format!("M{ordinal}"),
        (Granularity::Weekly, None) => format!("W{ordinal}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn monthly_key_is_first_of_month() {
        assert_eq!(period_key(d(2025, 1, 5), Granularity::Monthly), d(2025, 1, 1));
        assert_eq!(period_key(d(2024, 2, 29), Granularity::Monthly), d(2024, 2, 1));
        assert_eq!(period_key(d(2025, 12, 1), Granularity::Monthly), d(2025, 12, 1));
    }

    #[test]
    fn weekly_key_follows_monday_rule_for_every_weekday() {
        // 2025-01-06 is a Monday.
        for offset in 0..7u64 {
            let date = d(2025, 1, 6) + Days::new(offset);
            assert_eq!(period_key(date, Granularity::Weekly), d(2025, 1, 6), "date {date}");
        }
    }

    #[test]
    fn sunday_maps_to_preceding_monday() {
        let sunday = d(2025, 1, 5);
        assert_eq!(sunday.weekday(), Weekday::Sun);
        assert_eq!(period_key(sunday, Granularity::Weekly), d(2024, 12, 30));
    }

    #[test]
    fn next_period_steps() {
        assert_eq!(next_period(d(2025, 1, 1), Granularity::Monthly), Some(d(2025, 2, 1)));
        assert_eq!(next_period(d(2024, 12, 1), Granularity::Monthly), Some(d(2025, 1, 1)));
        assert_eq!(next_period(d(2025, 1, 27), Granularity::Weekly), Some(d(2025, 2, 3)));
    }

    #[test]
    fn month_end_boundary_is_last_period_start_in_month() {
        // January 2025 ends on a Friday; its last Monday is the 27th.
        assert_eq!(month_end_boundary(d(2025, 1, 20), Granularity::Weekly), d(2025, 1, 27));
        // March 2025 ends on Monday the 31st.
        assert_eq!(month_end_boundary(d(2025, 3, 3), Granularity::Weekly), d(2025, 3, 31));
        // November 2025 ends on a Sunday; the 24th is the last Monday.
        assert_eq!(month_end_boundary(d(2025, 11, 3), Granularity::Weekly), d(2025, 11, 24));
        assert_eq!(month_end_boundary(d(2025, 3, 1), Granularity::Monthly), d(2025, 3, 1));
        assert_eq!(month_end(d(2024, 2, 10)), d(2024, 2, 29));
    }

    #[test]
    fn first_monday_of_year() {
        assert_eq!(first_monday(2024), Some(d(2024, 1, 1)));
        assert_eq!(first_monday(2025), Some(d(2025, 1, 6)));
        assert_eq!(first_monday(2023), Some(d(2023, 1, 2)));
    }

    #[test]
    fn week_ordinals_agree_with_monday_rule() {
        for year in 2018..=2032 {
            let first = first_monday(year).unwrap();
            assert_eq!(period_ordinal(first, Granularity::Weekly), 1, "year {year}");

            let mut monday = first;
            let mut expected = 1;
            while monday.year() == year {
                assert_eq!(period_ordinal(monday, Granularity::Weekly), expected);
                assert_eq!(ordinal_start(year, expected, Granularity::Weekly), Some(monday));
                monday = monday + Days::new(7);
                expected += 1;
            }
            let max = expected - 1;
            assert_eq!(period_ordinal(d(year, 12, 31), Granularity::Weekly), max);
            assert!(max == 52 || max == 53, "year {year} has {max} weeks");
            assert_eq!(ordinal_start(year, max + 1, Granularity::Weekly), None);
        }
    }

    #[test]
    fn ordinal_of_any_day_uses_its_week_start() {
        // Wednesday 2025-01-08 is in the week of Monday the 6th: ordinal 1.
        assert_eq!(period_ordinal(d(2025, 1, 8), Granularity::Weekly), 1);
        assert_eq!(period_ordinal(d(2025, 3, 1), Granularity::Monthly), 3);
    }

    #[test]
    fn labels() {
        assert_eq!(period_label(d(2025, 1, 1), Granularity::Monthly, false), "Jan 2025");
        assert_eq!(period_label(d(2025, 1, 6), Granularity::Weekly, false), "6 Jan");
        assert_eq!(period_label(d(2024, 12, 30), Granularity::Weekly, true), "30 Dec 2024");
        assert_eq!(ordinal_label(2, Granularity::Monthly, 2025), "Feb");
        assert_eq!(ordinal_label(2, Granularity::Weekly, 2025), "13 Jan");
        assert_eq!(ordinal_label(53, Granularity::Weekly, 2025), "W53");
    }
}
