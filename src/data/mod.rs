//! Observation sources outside the filesystem.
//!
//! - the tenant price API (`api`)
//! - seeded synthetic observations for demos and tests (`sample`)

pub mod api;
pub mod sample;

pub use api::*;
pub use sample::*;
