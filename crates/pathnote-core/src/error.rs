//! Error types for pathnote.

use thiserror::Error;

/// Result type alias using pathnote's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for pathnote operations.
///
/// Every pipeline stage fails with its own variant so callers can tell a bad
/// upload apart from an extractor crash, unusable extractor output, or a
/// storage failure.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or unacceptable document/metadata. Never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The extraction process could not be started.
    #[error("Failed to launch extractor '{program}': {source}")]
    ExtractionLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The extraction process ran and terminated unsuccessfully.
    ///
    /// `exit_status` is `None` when the process was killed by a signal.
    #[error("Extractor failed (exit {}): {}", display_status(.exit_status), .stderr.trim())]
    ExtractionProcess {
        exit_status: Option<i32>,
        stderr: String,
    },

    /// The extraction process did not finish within the configured bound.
    #[error("Extractor timed out after {timeout_secs}s")]
    ExtractionTimeout { timeout_secs: u64 },

    /// The extractor exited successfully but wrote nothing usable.
    #[error("Extractor produced empty output")]
    EmptyOutput { raw_output: String },

    /// The extractor output is not a well-formed flat JSON object.
    #[error("Malformed extractor output: {reason}")]
    MalformedOutput { reason: String, raw_output: String },

    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Non-SQL persistence failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Summarization backend failed
    #[error("Summary error: {0}")]
    Summary(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

/// Coarse grouping of error kinds, used to pick a user-facing response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller sent something unusable; resubmit with a fix.
    BadInput,
    /// The requested record does not exist.
    NotFound,
    /// The extractor could not be launched, crashed, or hung.
    ExtractorFailure,
    /// The extractor succeeded but its output cannot be used.
    MalformedOutput,
    /// The record store rejected or failed the operation.
    Storage,
    /// A downstream service (summarization) failed.
    Upstream,
    /// Anything else.
    Internal,
}

impl Error {
    /// Stable snake_case tag for this error, suitable for API payloads and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::NotFound(_) => "not_found",
            Error::ExtractionLaunch { .. } => "extraction_launch",
            Error::ExtractionProcess { .. } => "extraction_process",
            Error::ExtractionTimeout { .. } => "extraction_timeout",
            Error::EmptyOutput { .. } => "empty_output",
            Error::MalformedOutput { .. } => "malformed_output",
            Error::Database(_) | Error::Storage(_) => "storage",
            Error::Summary(_) => "summary",
            Error::Config(_) => "config",
            Error::Serialization(_) => "serialization",
            Error::Io(_) => "io",
        }
    }

    /// Category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidInput(_) => ErrorCategory::BadInput,
            Error::NotFound(_) => ErrorCategory::NotFound,
            Error::ExtractionLaunch { .. }
            | Error::ExtractionProcess { .. }
            | Error::ExtractionTimeout { .. } => ErrorCategory::ExtractorFailure,
            Error::EmptyOutput { .. } | Error::MalformedOutput { .. } => {
                ErrorCategory::MalformedOutput
            }
            Error::Database(_) | Error::Storage(_) => ErrorCategory::Storage,
            Error::Summary(_) => ErrorCategory::Upstream,
            Error::Config(_) | Error::Serialization(_) | Error::Io(_) => ErrorCategory::Internal,
        }
    }

    /// Raw extractor output attached to output-validation failures.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            Error::EmptyOutput { raw_output } | Error::MalformedOutput { raw_output, .. } => {
                Some(raw_output)
            }
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Summary(e.to_string())
    }
}
