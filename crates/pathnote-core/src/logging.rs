//! Structured logging schema and field name constants for pathnote.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation can query an ingestion by the same names whether the
//! event came from the extractor, the parser, or the record store.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Ingestion failed for a caller-visible reason |
//! | INFO  | Lifecycle events (startup, shutdown), ingestion completions |
//! | DEBUG | Stage transitions, config choices |
//! | TRACE | Per-field mapping decisions |
//!
//! Extracted field values are patient data and are never logged. Events carry
//! labels, counts, and sizes only.

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the HTTP request.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "ingest", "db", "inference"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "orchestrator", "parser", "transformer", "ollama", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "ingest", "run", "parse", "create", "summarize"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Clinical note UUID being operated on.
pub const NOTE_ID: &str = "note_id";

/// Doctor id owning the note.
pub const DOCTOR_ID: &str = "doctor_id";

/// Original filename of an uploaded document.
pub const DOCUMENT: &str = "document";

/// Pipeline stage that produced an event or failure.
/// Values: "validate", "stage", "extract", "parse", "transform", "persist"
pub const STAGE: &str = "stage";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Byte length of an uploaded document.
pub const DOCUMENT_BYTES: &str = "document_bytes";

/// Number of labels in an extractor payload.
pub const FIELD_COUNT: &str = "field_count";

/// Number of payload labels that matched the field table.
pub const MAPPED_COUNT: &str = "mapped_count";

/// Number of records returned by a listing.
pub const RESULT_COUNT: &str = "result_count";

/// Byte length of captured extractor stdout.
pub const STDOUT_LEN: &str = "stdout_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Extractor fields ──────────────────────────────────────────────────────

/// Program launched for extraction.
pub const PROGRAM: &str = "program";

/// Process exit code (absent when killed by signal).
pub const EXIT_STATUS: &str = "exit_status";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

/// Database table or entity affected.
pub const DB_TABLE: &str = "db_table";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for summarization.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Stable error kind tag (see `Error::kind`).
pub const ERROR_KIND: &str = "error_kind";
