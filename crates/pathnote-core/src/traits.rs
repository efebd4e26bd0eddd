//! Core traits for pathnote abstractions.
//!
//! These traits define the seams of the ingestion pipeline: the external
//! extraction process, the record store, and the summarization backend.
//! Each has a production implementation in its own crate and can be replaced
//! by a fake in tests.

use std::path::Path;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// EXTRACTION
// =============================================================================

/// Runs the external extractor against one staged document.
///
/// Implementations report a process that could not be started as
/// `Error::ExtractionLaunch`. A process that starts and exits, successfully or
/// not, is reported as `Ok` with its captured streams; judging the exit status
/// is the caller's job.
#[async_trait]
pub trait ExtractionProcess: Send + Sync {
    /// Run the extractor with the staged document path as its final argument.
    async fn run(&self, document: &Path) -> Result<ExtractionOutput>;

    /// Name of the launched program, for logs.
    fn program(&self) -> &str;

    /// Check that the extractor can be launched.
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

// =============================================================================
// CLINICAL NOTE REPOSITORY
// =============================================================================

/// Repository for clinical note records.
#[async_trait]
pub trait ClinicalNoteRepository: Send + Sync {
    /// Persist a new note and return it with its assigned id.
    async fn create(&self, note: ClinicalNote) -> Result<ClinicalNoteRecord>;

    /// Fetch a note by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ClinicalNoteRecord>>;

    /// Apply a partial update. Returns `None` when no note has this id.
    async fn update_by_id(
        &self,
        id: Uuid,
        update: UpdateClinicalNoteRequest,
    ) -> Result<Option<ClinicalNoteRecord>>;

    /// Delete a note. Returns `false` when no note has this id.
    async fn delete_by_id(&self, id: Uuid) -> Result<bool>;

    /// List notes, newest first.
    async fn list(&self, req: ListClinicalNotesRequest) -> Result<Vec<ClinicalNoteRecord>>;

    /// List one doctor's notes, newest first.
    async fn list_by_doctor(
        &self,
        doctor_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ClinicalNoteRecord>> {
        self.list(ListClinicalNotesRequest {
            doctor_id: Some(doctor_id.to_string()),
            limit,
            offset,
        })
        .await
    }

    /// Check that the store is reachable.
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

// =============================================================================
// SUMMARIZATION
// =============================================================================

/// Backend that turns a free-text prompt into a summary.
#[async_trait]
pub trait SummaryBackend: Send + Sync {
    /// Generate a summary for the prompt.
    async fn summarize(&self, prompt: &str) -> Result<Summary>;

    /// Model name used for generation.
    fn model_name(&self) -> &str;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> Result<bool>;
}
