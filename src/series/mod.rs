//! Price-series regularization.
//!
//! Responsibilities:
//!
//! - validate raw records and group them per item and period (`builder`)
//! - forward-fill missing periods through the end of the last active month (`fill`)
//! - realign filled series by within-year ordinal for overlays (`align`)

pub mod align;
pub mod builder;
pub mod fill;

pub use align::*;
pub use builder::*;
pub use fill::*;
