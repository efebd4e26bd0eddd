//! Centralized default constants for pathnote.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates and the API binary reference these constants instead of defining
//! their own magic numbers.

// =============================================================================
// CLINICAL NOTE
// =============================================================================

/// Value stored for `patient_name` / `doctor_id` when metadata is missing.
pub const UNKNOWN_PLACEHOLDER: &str = "Unknown";

// =============================================================================
// EXTRACTION
// =============================================================================

/// Default extractor program.
pub const EXTRACTOR_PROGRAM: &str = "python3";

/// Default extractor arguments placed before the staged document path.
pub const EXTRACTOR_ARGS: &str = "services/ehr_processor.py";

/// Default bound on one extractor run, in seconds.
pub const EXTRACTOR_TIMEOUT_SECS: u64 = 120;

/// Bound on the extractor health check, in seconds. Matches the Ollama
/// health check.
pub const EXTRACTOR_HEALTH_TIMEOUT_SECS: u64 = 5;

/// Prefix for staged document file names.
pub const STAGING_FILE_PREFIX: &str = "pathnote-";

/// Environment variable naming the extractor program.
pub const ENV_EXTRACTOR_PROGRAM: &str = "EXTRACTOR_PROGRAM";

/// Environment variable with whitespace-separated extractor arguments.
pub const ENV_EXTRACTOR_ARGS: &str = "EXTRACTOR_ARGS";

/// Environment variable with the extractor working directory.
pub const ENV_EXTRACTOR_WORKDIR: &str = "EXTRACTOR_WORKDIR";

/// Environment variable with the extractor timeout in seconds.
pub const ENV_EXTRACTOR_TIMEOUT_SECS: &str = "EXTRACTOR_TIMEOUT_SECS";

/// Environment variable with the staging directory.
pub const ENV_STAGING_DIR: &str = "STAGING_DIR";

// =============================================================================
// INGESTION
// =============================================================================

/// Largest accepted upload, in bytes (25 MiB).
pub const MAX_DOCUMENT_BYTES: usize = 25 * 1024 * 1024;

/// Environment variable overriding [`MAX_DOCUMENT_BYTES`].
pub const ENV_MAX_DOCUMENT_BYTES: &str = "MAX_DOCUMENT_BYTES";

/// Environment variable that makes patient name and doctor id mandatory.
pub const ENV_REQUIRE_METADATA: &str = "INGEST_REQUIRE_METADATA";

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Default CORS max-age in seconds (1 hour).
pub const CORS_MAX_AGE_SECS: u64 = 3600;

/// Maximum request body size in bytes (slightly above the document limit to
/// leave room for multipart framing and metadata fields).
pub const MAX_BODY_SIZE_BYTES: usize = MAX_DOCUMENT_BYTES + 1024 * 1024;

// =============================================================================
// DATABASE
// =============================================================================

/// Pool size ceiling. Uploads hold a connection only while persisting.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// How long a request waits for a free connection, in seconds.
pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Idle connections are closed after this many seconds.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

/// Connections are recycled after this many seconds (30 minutes).
pub const DB_MAX_LIFETIME_SECS: u64 = 1800;

/// Server-side `statement_timeout`, in seconds.
pub const DB_STATEMENT_TIMEOUT_SECS: u64 = 30;

/// `application_name` reported to Postgres.
pub const DB_APPLICATION_NAME: &str = "pathnote";

/// Environment variable overriding [`DB_MAX_CONNECTIONS`].
pub const ENV_DB_MAX_CONNECTIONS: &str = "DATABASE_MAX_CONNECTIONS";

/// Environment variable overriding [`DB_ACQUIRE_TIMEOUT_SECS`].
pub const ENV_DB_ACQUIRE_TIMEOUT_SECS: &str = "DATABASE_CONNECT_TIMEOUT_SECS";

/// Environment variable overriding [`DB_STATEMENT_TIMEOUT_SECS`]. `0` disables it.
pub const ENV_DB_STATEMENT_TIMEOUT_SECS: &str = "DATABASE_STATEMENT_TIMEOUT_SECS";

// =============================================================================
// SUMMARIZATION
// =============================================================================

/// Default Ollama base URL.
pub const OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default summarization model.
pub const SUMMARY_MODEL: &str = "llama3";

/// Timeout for summarization requests in seconds.
pub const SUMMARY_TIMEOUT_SECS: u64 = 120;

/// Environment variable with the Ollama base URL.
pub const ENV_OLLAMA_URL: &str = "OLLAMA_URL";

/// Environment variable with the summarization model.
pub const ENV_SUMMARY_MODEL: &str = "SUMMARY_MODEL";

/// Environment variable with the summarization timeout in seconds.
pub const ENV_SUMMARY_TIMEOUT_SECS: &str = "SUMMARY_TIMEOUT_SECS";

// =============================================================================
// LISTING
// =============================================================================

/// Default page size for note listings.
pub const PAGE_LIMIT: i64 = 50;

/// Upper bound on a single page.
pub const PAGE_LIMIT_MAX: i64 = 500;
