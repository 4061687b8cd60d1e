//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - price types and their fixed granularity (`PriceType`, `Granularity`)
//! - raw and validated observations (`PriceRecord`, `PricePoint`)
//! - regularized series (`SeriesPoint`, `PeriodMap`, `FilledSeries`)
//! - pipeline options (`SeriesConfig`)

pub mod types;

pub use types::*;
