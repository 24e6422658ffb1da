//! Error types for nayade-harvest
//!
//! Two tiers of failure exist in a harvest run:
//! - [`Error`] covers everything that stops the run or never lets it start
//!   (configuration, I/O, exhausted transport retries).
//! - [`ZoneError`] covers a single zone code that could not be turned into rows.
//!   These never escape the worker pipeline; each becomes one log line.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for nayade-harvest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for nayade-harvest
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "workers")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read or write a file at a known location
    #[error("failed to access {path}: {source}")]
    File {
        /// Path that could not be read or written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// CSV encoding or decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Extraction pattern failed to compile
    #[error("invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Transport-level network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a 5xx status
    #[error("HTTP {status} from {url}")]
    Http {
        /// Status code returned by the server
        status: u16,
        /// URL that was requested
        url: String,
    },

    /// The portal could not be reached within the retry budget.
    ///
    /// This is fatal for the whole run.
    #[error("request to {url} failed after {attempts} attempts: {last_error}")]
    TransportExhausted {
        /// URL that kept failing
        url: String,
        /// Number of attempts made
        attempts: u32,
        /// Message of the final failure
        last_error: String,
    },

    /// The run was stopped because another worker hit a fatal error
    #[error("harvest cancelled")]
    Cancelled,

    /// A worker task panicked or was aborted
    #[error("worker {slice} did not complete: {message}")]
    WorkerPanicked {
        /// Index of the slice the worker owned
        slice: usize,
        /// Join error message
        message: String,
    },
}

impl Error {
    /// Shorthand for building a [`Error::Config`]
    pub(crate) fn config(message: impl Into<String>, key: &str) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Whether this error terminates the whole run
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Cancelled)
    }
}

/// Reasons a single zone code contributes a log line instead of rows
///
/// The `Display` text is the message written after `"<code>: "` in the log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneError {
    /// One of the location labels is absent; there is no bathing zone at this code
    #[error("no bathing zone at this code")]
    NotFound,

    /// A sampling sub-section has no coordinate entry at its position
    #[error("missing coordinates for sample point {index}")]
    MissingCoordinates {
        /// Zero-based position of the sub-section
        index: usize,
    },

    /// A sample point carries no measurement rows
    #[error("sample point {point_id} has no samples")]
    NoSamples {
        /// Identifier of the point without measurements
        point_id: String,
    },
}
