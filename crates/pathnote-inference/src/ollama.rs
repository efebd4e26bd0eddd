//! Ollama summarization backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use pathnote_core::{Error, Result, Summary, SummaryBackend};

use crate::config::SummaryConfig;

/// Generation slower than this is logged as slow.
const SLOW_GENERATION_MS: u64 = 30_000;

/// Summarization via Ollama's `/api/generate` endpoint, non-streaming.
#[derive(Debug, Clone)]
pub struct OllamaSummaryBackend {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    model: Option<String>,
}

impl OllamaSummaryBackend {
    pub fn new(config: SummaryConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url,
            model: config.model,
            timeout: config.timeout,
        }
    }

    /// Backend configured from the environment.
    pub fn from_env() -> Self {
        Self::new(SummaryConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for OllamaSummaryBackend {
    fn default() -> Self {
        Self::new(SummaryConfig::default())
    }
}

#[async_trait]
impl SummaryBackend for OllamaSummaryBackend {
    #[instrument(skip(self, prompt), fields(subsystem = "inference", component = "ollama", op = "summarize", model = %self.model, prompt_len = prompt.len()))]
    async fn summarize(&self, prompt: &str) -> Result<Summary> {
        if prompt.trim().is_empty() {
            return Err(Error::InvalidInput("Prompt is required".to_string()));
        }
        let start = Instant::now();

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Summary(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Summary(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Summary(format!("Failed to parse response: {}", e)))?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            response_len = result.response.len(),
            duration_ms = elapsed,
            "Summary generated"
        );
        if elapsed > SLOW_GENERATION_MS {
            warn!(duration_ms = elapsed, slow = true, "Slow summary generation");
        }

        Ok(Summary {
            response: result.response,
            model: result.model.unwrap_or_else(|| self.model.clone()),
            created_at: Utc::now(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!(subsystem = "inference", component = "ollama", "Ollama health check passed");
                Ok(true)
            }
            Ok(resp) => {
                warn!(subsystem = "inference", component = "ollama", status = %resp.status(), "Ollama health check failed");
                Ok(false)
            }
            Err(e) => {
                warn!(subsystem = "inference", component = "ollama", error = %e, "Ollama health check error");
                Ok(false)
            }
        }
    }
}
