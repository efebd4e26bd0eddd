//! End-to-end ingestion: validate, extract, parse, transform, persist.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use pathnote_core::{
    transform, unmapped_labels, validate_document, ClinicalNoteRecord, ClinicalNoteRepository,
    Error, NoteMetadata, Result, UploadedDocument,
};

use crate::config::IngestionConfig;
use crate::orchestrator::ExtractionOrchestrator;
use crate::parser::parse_flat_fields;

/// Drives one document through the whole pipeline.
///
/// Persistence is the single commit point: any failure before it leaves
/// nothing behind, and the staged copy of the document is always removed.
/// Concurrent submissions of the same document create separate records.
#[derive(Clone)]
pub struct IngestionService {
    orchestrator: ExtractionOrchestrator,
    repository: Arc<dyn ClinicalNoteRepository>,
    config: IngestionConfig,
}

impl IngestionService {
    pub fn new(
        orchestrator: ExtractionOrchestrator,
        repository: Arc<dyn ClinicalNoteRepository>,
        config: IngestionConfig,
    ) -> Self {
        Self {
            orchestrator,
            repository,
            config,
        }
    }

    pub fn orchestrator(&self) -> &ExtractionOrchestrator {
        &self.orchestrator
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// Ingest one document and return the persisted clinical note.
    #[instrument(
        skip(self, document, metadata),
        fields(
            subsystem = "ingest",
            component = "service",
            op = "ingest",
            document = %document.original_filename,
            document_bytes = document.len(),
        )
    )]
    pub async fn ingest(
        &self,
        document: UploadedDocument,
        metadata: NoteMetadata,
    ) -> Result<ClinicalNoteRecord> {
        let start = Instant::now();
        let result = self.run_pipeline(&document, &metadata).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(record) => info!(
                note_id = %record.id,
                doctor_id = %record.note.doctor_id,
                duration_ms,
                "Document ingested"
            ),
            Err(e) => warn!(
                error_kind = e.kind(),
                error = %e,
                duration_ms,
                "Document ingestion failed"
            ),
        }
        result
    }

    async fn run_pipeline(
        &self,
        document: &UploadedDocument,
        metadata: &NoteMetadata,
    ) -> Result<ClinicalNoteRecord> {
        self.validate(document, metadata)?;

        let extract_start = Instant::now();
        let output = self.orchestrator.extract(document).await?;
        debug!(
            stage = "extract",
            stdout_len = output.stdout.len(),
            duration_ms = extract_start.elapsed().as_millis() as u64,
            "Extraction complete"
        );

        let fields = parse_flat_fields(&output.stdout)?;
        let unmapped = unmapped_labels(&fields);
        debug!(
            stage = "parse",
            field_count = fields.len(),
            mapped_count = fields.len() - unmapped.len(),
            unmapped = ?unmapped,
            "Extractor output parsed"
        );

        let note = transform(&fields, metadata);

        let persist_start = Instant::now();
        let record = self.repository.create(note).await?;
        debug!(
            stage = "persist",
            note_id = %record.id,
            duration_ms = persist_start.elapsed().as_millis() as u64,
            "Clinical note stored"
        );

        Ok(record)
    }

    fn validate(&self, document: &UploadedDocument, metadata: &NoteMetadata) -> Result<()> {
        validate_document(document, self.config.max_document_bytes)?;

        if self.config.require_metadata
            && (metadata.patient_name().is_none() || metadata.doctor_id().is_none())
        {
            return Err(Error::InvalidInput(
                "Patient name and user ID are required".to_string(),
            ));
        }
        Ok(())
    }
}
