//! # pathnote-core
//!
//! Core types, traits, and field mapping for the pathnote ingestion pipeline.
//!
//! This crate provides the clinical note model, the extractor label table,
//! numeric coercion, and the trait seams that the other pathnote crates
//! implement.

pub mod coercion;
pub mod defaults;
pub mod document;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;
pub mod transform;

// Re-export commonly used types at crate root
pub use coercion::coerce_number;
pub use document::{staging_suffix, validate_document};
pub use error::{Error, ErrorCategory, Result};
pub use models::*;
pub use traits::*;
pub use transform::{mapping_for, transform, unmapped_labels, FieldKind, FieldMapping, FIELD_MAPPINGS};
