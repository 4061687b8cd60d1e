//! Forward-fill of missing periods.
//!
//! A series runs from the period of its earliest observation through the end
//! of the calendar month of its latest one. Periods without an observation
//! repeat the most recent real value; nothing is ever filled backwards.

use tracing::debug;

use crate::domain::{FilledSeries, Granularity, PeriodMap, SeriesPoint};
use crate::period::{month_end_boundary, next_period};

/// Expand a sparse per-period map into a contiguous, ascending series.
pub fn fill_gaps(periods: &PeriodMap, granularity: Granularity) -> FilledSeries {
    let item_name = periods
        .values()
        .next()
        .map(|p| p.item_name.clone())
        .unwrap_or_default();

    let (Some((&first, _)), Some((&last_with_data, _))) = (periods.first_key_value(), periods.last_key_value())
    else {
        return FilledSeries {
            item_name,
            granularity,
            points: Vec::new(),
        };
    };

    // Always run through the last period start of the final active month.
    let end = last_with_data.max(month_end_boundary(last_with_data, granularity));

    let mut points = Vec::new();
    let mut last_known = None;
    let mut current = Some(first);

    while let Some(period) = current.filter(|p| *p <= end) {
        match periods.get(&period) {
            Some(point) => {
                points.push(SeriesPoint::Real(point.clone()));
                last_known = Some(point);
            }
            None => {
                if let Some(source) = last_known {
                    points.push(SeriesPoint::filled_from(source, period));
                }
            }
        }
        current = next_period(period, granularity);
    }

    debug!(
        item = %item_name,
        first = %first,
        last_with_data = %last_with_data,
        end = %end,
        periods = points.len(),
        "filled series"
    );

    FilledSeries {
        item_name,
        granularity,
        points,
    }
}
