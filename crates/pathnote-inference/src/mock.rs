//! Mock summarization backend for deterministic testing.
//!
//! ```rust
//! use pathnote_inference::mock::MockSummaryBackend;
//!
//! let backend = MockSummaryBackend::new().with_response("Stage III adenocarcinoma.");
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use pathnote_core::{Error, Result, Summary, SummaryBackend};

/// Summary backend that returns a fixed response and records prompts.
#[derive(Clone)]
pub struct MockSummaryBackend {
    response: String,
    fail_with: Option<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl Default for MockSummaryBackend {
    fn default() -> Self {
        Self {
            response: "Mock summary".to_string(),
            fail_with: None,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockSummaryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = response.into();
        self
    }

    /// Make every call fail with `Error::Summary(message)`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SummaryBackend for MockSummaryBackend {
    async fn summarize(&self, prompt: &str) -> Result<Summary> {
        if prompt.trim().is_empty() {
            return Err(Error::InvalidInput("Prompt is required".to_string()));
        }
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Some(message) = &self.fail_with {
            return Err(Error::Summary(message.clone()));
        }
        Ok(Summary {
            response: self.response.clone(),
            model: "mock".to_string(),
            created_at: Utc::now(),
        })
    }

    fn model_name(&self) -> &str {
        "mock"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.fail_with.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_returns_fixed_response_and_records_prompt() {
        let backend = MockSummaryBackend::new().with_response("pT3 N0");
        let summary = backend.summarize("Summarize this note").await.unwrap();
        assert_eq!(summary.response, "pT3 N0");
        assert_eq!(backend.prompts(), vec!["Summarize this note".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_backend() {
        let backend = MockSummaryBackend::new().failing("model not loaded");
        let err = backend.summarize("x").await.unwrap_err();
        assert_eq!(err.kind(), "summary");
        assert!(!backend.health_check().await.unwrap());
    }
}
