//! Presentation order of items.
//!
//! Well-known items come first in a fixed order per price type; everything
//! else follows alphabetically.

use std::cmp::Ordering;

use crate::domain::PriceType;

const EGG_PRIORITY: [&str; 3] = ["LARGE EGG", "MEDIUM EGG", "SMALL EGG"];

const FEED_PRIORITY: [&str; 6] = [
    "LAYER MASH",
    "PRE-LAYER MASH",
    "PRE LAYER MASH",
    "PLM",
    "GROWER MASH",
    "CHICK MASH",
];

fn priority_list(price_type: PriceType) -> &'static [&'static str] {
    match price_type {
        PriceType::Egg => &EGG_PRIORITY,
        PriceType::Feed => &FEED_PRIORITY,
    }
}

/// Position of `item_name` in the priority list, if it matches any entry.
///
/// Matching is a case-insensitive substring test. `PRE-LAYER MASH` contains
/// `LAYER MASH` too, so the longest matching entry decides.
pub fn priority_rank(price_type: PriceType, item_name: &str) -> Option<usize> {
    let upper = item_name.to_uppercase();
    priority_list(price_type)
        .iter()
        .enumerate()
        .filter(|(_, pattern)| upper.contains(*pattern))
        .max_by(|(ia, a), (ib, b)| a.len().cmp(&b.len()).then(ib.cmp(ia)))
        .map(|(idx, _)| idx)
}

/// Total order used for columns and legends.
pub fn compare_items(price_type: PriceType, a: &str, b: &str) -> Ordering {
    match (priority_rank(price_type, a), priority_rank(price_type, b)) {
        (Some(ra), Some(rb)) => ra.cmp(&rb).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Return `names` in presentation order.
pub fn order_items<'a, I>(price_type: PriceType, names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut names: Vec<String> = names.into_iter().map(str::to_string).collect();
    names.sort_by(|a, b| compare_items(price_type, a, b));
    names.dedup();
    names
}
