//! Summarization backend configuration.

use std::time::Duration;

use pathnote_core::defaults::{
    ENV_OLLAMA_URL, ENV_SUMMARY_MODEL, ENV_SUMMARY_TIMEOUT_SECS, OLLAMA_URL, SUMMARY_MODEL,
    SUMMARY_TIMEOUT_SECS,
};
use pathnote_core::{Error, Result};

/// Connection settings for the summarization backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryConfig {
    /// Base URL of the Ollama server, without a trailing slash.
    pub base_url: String,
    /// Model used for generation.
    pub model: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            base_url: OLLAMA_URL.to_string(),
            model: SUMMARY_MODEL.to_string(),
            timeout: Duration::from_secs(SUMMARY_TIMEOUT_SECS),
        }
    }
}

impl SummaryConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `OLLAMA_URL` | `http://127.0.0.1:11434` | Ollama base URL |
    /// | `SUMMARY_MODEL` | `llama3` | Generation model |
    /// | `SUMMARY_TIMEOUT_SECS` | `120` | Request timeout |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = std::env::var(ENV_OLLAMA_URL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.base_url);

        let model = std::env::var(ENV_SUMMARY_MODEL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.model);

        let timeout = std::env::var(ENV_SUMMARY_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reject settings the backend cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "Summary backend URL must be http(s): {}",
                self.base_url
            )));
        }
        if self.model.trim().is_empty() {
            return Err(Error::Config("Summary model must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SummaryConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:11434");
        assert_eq!(config.model, "llama3");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = SummaryConfig::default().with_base_url("http://ollama:11434/");
        assert_eq!(config.base_url, "http://ollama:11434");
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = SummaryConfig::default().with_base_url("ollama:11434");
        assert_eq!(config.validate().unwrap_err().kind(), "config");
    }

    #[test]
    fn test_validate_rejects_blank_model() {
        let config = SummaryConfig::default().with_model(" ");
        assert!(config.validate().is_err());
    }
}
