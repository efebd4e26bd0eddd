//! # pathnote-inference
//!
//! Summarization backends for pathnote.
//!
//! The summarization service is a collaborator of the ingestion pipeline, not
//! part of it: clinicians ask for a free-text summary of a note after it has
//! been stored.

pub mod config;
pub mod mock;
#[cfg(feature = "ollama")]
pub mod ollama;

pub use config::SummaryConfig;
pub use mock::MockSummaryBackend;
#[cfg(feature = "ollama")]
pub use ollama::OllamaSummaryBackend;
pub use pathnote_core::{Summary, SummaryBackend};
