//! `price-trends` library crate.
//!
//! The binary (`trend`) is a thin wrapper around this library so that:
//!
//! - the regularization core is testable without spawning processes
//! - other front-ends (a web handler, a notebook) can reuse the same pipeline
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod period;
pub mod report;
pub mod series;
