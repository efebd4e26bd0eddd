//! # pathnote-ingest
//!
//! Document ingestion pipeline for pathnote.
//!
//! This crate provides:
//! - Staging of uploaded documents to scoped temporary files
//! - A bounded, cancellable run of the external extraction process
//! - Validation of the extractor's flat JSON output
//! - The [`IngestionService`] that ties these to field mapping and storage
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pathnote_ingest::{ExtractionOrchestrator, ExtractorConfig, IngestionConfig, IngestionService};
//! use pathnote_core::{NoteMetadata, UploadedDocument};
//!
//! let orchestrator = ExtractionOrchestrator::from_config(&ExtractorConfig::from_env());
//! let service = IngestionService::new(orchestrator, repository, IngestionConfig::default());
//!
//! let record = service
//!     .ingest(
//!         UploadedDocument::new(bytes, "report.pdf"),
//!         NoteMetadata::new(Some("Jane Roe".into()), Some("dr-42".into())),
//!     )
//!     .await?;
//! println!("stored note {}", record.id);
//! ```

pub mod config;
pub mod orchestrator;
pub mod parser;
pub mod process;
pub mod service;
pub mod staging;

pub use config::{ExtractorConfig, IngestionConfig};
pub use orchestrator::ExtractionOrchestrator;
pub use parser::parse_flat_fields;
pub use process::CommandProcess;
pub use service::IngestionService;
pub use staging::StagedDocument;
