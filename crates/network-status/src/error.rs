//! Error types for the network status monitor.

use thiserror::Error;

/// Errors raised while fetching network counters or loading configuration.
///
/// None of these are fatal to the monitor: fetch errors fail a single poll
/// cycle and the next cycle retries on schedule.
#[derive(Debug, Error)]
pub enum StatusError {
    /// Transport-level failure (connect, timeout, body decode).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The explorer API answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}")]
    UnexpectedStatus {
        /// Endpoint path that was requested
        endpoint: String,
        /// Status code returned
        status: u16,
    },

    /// Configuration file could not be parsed.
    #[error("invalid configuration file: {0}")]
    Config(#[from] serde_yaml::Error),

    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Log file could not be opened.
    #[error("cannot open log file: {0}")]
    LogFile(#[from] tracing_appender::rolling::InitError),

    /// Configuration parsed but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StatusError>;
