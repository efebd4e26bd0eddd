//! Configuration for the extractor and the ingestion service.

use std::path::PathBuf;
use std::time::Duration;

use pathnote_core::defaults::{
    ENV_EXTRACTOR_ARGS, ENV_EXTRACTOR_PROGRAM, ENV_EXTRACTOR_TIMEOUT_SECS, ENV_EXTRACTOR_WORKDIR,
    ENV_MAX_DOCUMENT_BYTES, ENV_REQUIRE_METADATA, ENV_STAGING_DIR, EXTRACTOR_ARGS,
    EXTRACTOR_PROGRAM, EXTRACTOR_TIMEOUT_SECS, MAX_DOCUMENT_BYTES,
};

/// How to launch the external extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Program to execute.
    pub program: String,
    /// Arguments placed before the staged document path.
    pub args: Vec<String>,
    /// Working directory for the child process.
    pub working_dir: Option<PathBuf>,
    /// Upper bound on a single run.
    pub timeout: Duration,
    /// Where uploads are staged. `None` uses the OS temp directory.
    pub staging_dir: Option<PathBuf>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            program: EXTRACTOR_PROGRAM.to_string(),
            args: split_args(EXTRACTOR_ARGS),
            working_dir: None,
            timeout: Duration::from_secs(EXTRACTOR_TIMEOUT_SECS),
            staging_dir: None,
        }
    }
}

impl ExtractorConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `EXTRACTOR_PROGRAM` | `python3` | Program to launch |
    /// | `EXTRACTOR_ARGS` | `services/ehr_processor.py` | Whitespace-separated prefix arguments |
    /// | `EXTRACTOR_WORKDIR` | (inherit) | Working directory of the child |
    /// | `EXTRACTOR_TIMEOUT_SECS` | `120` | Bound on one run |
    /// | `STAGING_DIR` | OS temp dir | Where uploads are staged |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let program = std::env::var(ENV_EXTRACTOR_PROGRAM)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.program);

        let args = std::env::var(ENV_EXTRACTOR_ARGS)
            .map(|v| split_args(&v))
            .unwrap_or(defaults.args);

        let timeout = std::env::var(ENV_EXTRACTOR_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Self {
            program,
            args,
            working_dir: env_path(ENV_EXTRACTOR_WORKDIR),
            timeout,
            staging_dir: env_path(ENV_STAGING_DIR),
        }
    }

    /// Replace the program and its prefix arguments.
    pub fn with_command(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.program = program.into();
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }
}

/// Limits applied to uploads before extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionConfig {
    /// Largest accepted document.
    pub max_document_bytes: usize,
    /// Reject uploads without a patient name and doctor id.
    pub require_metadata: bool,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: MAX_DOCUMENT_BYTES,
            require_metadata: false,
        }
    }
}

impl IngestionConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `MAX_DOCUMENT_BYTES` | `26214400` | Largest accepted upload |
    /// | `INGEST_REQUIRE_METADATA` | `false` | Require patient name and doctor id |
    pub fn from_env() -> Self {
        let max_document_bytes = std::env::var(ENV_MAX_DOCUMENT_BYTES)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(MAX_DOCUMENT_BYTES);

        let require_metadata = std::env::var(ENV_REQUIRE_METADATA)
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Self {
            max_document_bytes,
            require_metadata,
        }
    }

    pub fn with_max_document_bytes(mut self, max: usize) -> Self {
        self.max_document_bytes = max;
        self
    }

    pub fn with_require_metadata(mut self, require: bool) -> Self {
        self.require_metadata = require;
        self
    }
}

fn split_args(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}
