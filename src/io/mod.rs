//! Input/output helpers.
//!
//! - CSV/JSON observation ingest with row-level errors (`ingest`)
//! - chart table and observation exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
