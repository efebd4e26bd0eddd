//! Runs the extraction process against a staged document.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use pathnote_core::{Error, ExtractionOutput, ExtractionProcess, Result, UploadedDocument};

use crate::config::ExtractorConfig;
use crate::process::CommandProcess;
use crate::staging::StagedDocument;

/// Stages documents and runs one extractor invocation per document.
///
/// Every run ends with the staged file removed, whether the extractor
/// succeeded, failed, timed out, or the caller dropped the future.
#[derive(Clone)]
pub struct ExtractionOrchestrator {
    process: Arc<dyn ExtractionProcess>,
    timeout: Duration,
    staging_dir: Option<PathBuf>,
}

impl ExtractionOrchestrator {
    pub fn new(process: Arc<dyn ExtractionProcess>, timeout: Duration) -> Self {
        Self {
            process,
            timeout,
            staging_dir: None,
        }
    }

    /// Orchestrator backed by a [`CommandProcess`] built from `config`.
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self {
            process: Arc::new(CommandProcess::from_config(config)),
            timeout: config.timeout,
            staging_dir: config.staging_dir.clone(),
        }
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Name of the extractor program.
    pub fn program(&self) -> &str {
        self.process.program()
    }

    /// Whether the extractor can be launched.
    pub async fn health_check(&self) -> Result<bool> {
        self.process.health_check().await
    }

    /// Write `doc` to the staging directory.
    pub async fn stage(&self, doc: &UploadedDocument) -> Result<StagedDocument> {
        StagedDocument::stage(doc, self.staging_dir.as_deref()).await
    }

    /// Stage `doc` and run the extractor on it.
    pub async fn extract(&self, doc: &UploadedDocument) -> Result<ExtractionOutput> {
        let staged = self.stage(doc).await?;
        self.run(staged).await
    }

    /// Run the extractor on a staged document, consuming it.
    ///
    /// On exit 0 the raw output is returned as-is, even when stdout is empty;
    /// judging the payload is the parser's job. A non-zero exit becomes
    /// `ExtractionProcess`, an elapsed bound becomes `ExtractionTimeout`.
    pub async fn run(&self, staged: StagedDocument) -> Result<ExtractionOutput> {
        let start = Instant::now();
        let program = self.process.program().to_string();

        let outcome = tokio::time::timeout(self.timeout, self.process.run(staged.path())).await;

        let path = staged.path().display().to_string();
        if let Err(e) = staged.close() {
            warn!(
                subsystem = "ingest",
                component = "orchestrator",
                path = %path,
                error = %e,
                "Failed to remove staged document"
            );
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        let output = match outcome {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    subsystem = "ingest",
                    component = "orchestrator",
                    op = "run",
                    program = %program,
                    duration_ms,
                    "Extractor timed out, child killed"
                );
                return Err(Error::ExtractionTimeout {
                    timeout_secs: whole_secs_rounded_up(self.timeout),
                });
            }
        };

        debug!(
            subsystem = "ingest",
            component = "orchestrator",
            op = "run",
            program = %program,
            exit_status = ?output.exit_status,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            duration_ms,
            "Extractor finished"
        );

        if !output.succeeded() {
            return Err(Error::ExtractionProcess {
                exit_status: output.exit_status,
                stderr: output.stderr,
            });
        }

        Ok(output)
    }
}

/// A sub-second bound reports as 1s, never 0s.
fn whole_secs_rounded_up(bound: Duration) -> u64 {
    bound.as_secs() + u64::from(bound.subsec_nanos() > 0)
}
