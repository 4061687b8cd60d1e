//! Error types.
//!
//! - `AppError`: exit-coded errors raised by the outer surfaces (CLI, ingest,
//!   export, HTTP). `main` prints the message and exits with the code.
//! - `RecordError`: why a single observation was skipped. These never abort a
//!   run; they are collected next to the output and logged.

/// Exit code for bad input files, missing columns/env vars and invalid flags.
pub const EXIT_INPUT: u8 = 2;
/// Exit code for IO/network failures at runtime.
pub const EXIT_RUNTIME: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(EXIT_RUNTIME, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// A recoverable, per-record validation failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("invalid date '{0}'")]
    InvalidDate(String),

    #[error("unknown price type '{0}' (expected EGG or FEED)")]
    UnknownType(String),

    #[error("empty item name")]
    EmptyItem,

    #[error("invalid price {0} (must be finite and >= 0)")]
    InvalidPrice(f64),
}
