//! Reporting: chart rows, item order and terminal output.
//!
//! - row assembly for flat and year-aligned charts (`rows`)
//! - presentation order of items (`order`)
//! - fixed-width text output (`format`)

pub mod format;
pub mod order;
pub mod rows;

pub use format::*;
pub use order::*;
pub use rows::*;
