//! Core data models for pathnote.
//!
//! The clinical note mirrors a colorectal pathology report: eight nested
//! sections of findings plus visit-level identity and workflow status.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::UNKNOWN_PLACEHOLDER;

// =============================================================================
// EXTRACTION TYPES
// =============================================================================

/// Flat label → value payload produced by the extraction process.
///
/// Ordered so logs and tests see labels in a stable order.
pub type FlatFieldMap = BTreeMap<String, String>;

/// A document as received from the caller, before staging.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Raw file bytes.
    pub bytes: Vec<u8>,
    /// Filename as supplied by the uploader.
    pub original_filename: String,
    /// Declared MIME type, if the client sent one.
    pub content_type: Option<String>,
}

impl UploadedDocument {
    pub fn new(bytes: Vec<u8>, original_filename: impl Into<String>) -> Self {
        Self {
            bytes,
            original_filename: original_filename.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Size of the document in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Raw streams and status captured from one extractor run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionOutput {
    /// Everything the process wrote to standard output.
    pub stdout: String,
    /// Everything the process wrote to standard error.
    pub stderr: String,
    /// Exit code; `None` when the process was terminated by a signal.
    pub exit_status: Option<i32>,
}

impl ExtractionOutput {
    /// True when the process exited with status 0.
    pub fn succeeded(&self) -> bool {
        self.exit_status == Some(0)
    }
}

/// Caller-declared context for one ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteMetadata {
    pub patient_name: Option<String>,
    pub doctor_id: Option<String>,
    /// Authoritative acquisition time. When absent the note is stamped with
    /// the time of transformation.
    pub visit_date: Option<DateTime<Utc>>,
    pub audio_id: Option<Uuid>,
    pub transcription_id: Option<Uuid>,
    pub ai_summary_id: Option<Uuid>,
}

impl NoteMetadata {
    pub fn new(patient_name: Option<String>, doctor_id: Option<String>) -> Self {
        Self {
            patient_name,
            doctor_id,
            ..Default::default()
        }
    }

    pub fn with_visit_date(mut self, visit_date: DateTime<Utc>) -> Self {
        self.visit_date = Some(visit_date);
        self
    }

    /// Patient name with blanks treated as missing.
    pub fn patient_name(&self) -> Option<&str> {
        non_blank(self.patient_name.as_deref())
    }

    /// Doctor id with blanks treated as missing.
    pub fn doctor_id(&self) -> Option<&str> {
        non_blank(self.doctor_id.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// CLINICAL NOTE
// =============================================================================

/// Workflow state of a clinical note.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum NoteStatus {
    #[default]
    Draft,
    Finalized,
    Archived,
}

impl NoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteStatus::Draft => "draft",
            NoteStatus::Finalized => "finalized",
            NoteStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NoteStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(NoteStatus::Draft),
            "finalized" => Ok(NoteStatus::Finalized),
            "archived" => Ok(NoteStatus::Archived),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown note status: {}",
                other
            ))),
        }
    }
}

/// Gross specimen measurements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Specimen {
    pub label: Option<String>,
    pub length_cm: Option<f64>,
    pub colon_max_circumference_cm: Option<f64>,
    pub terminal_ileum_max_circumference_cm: Option<f64>,
    pub transverse_colon_max_circumference_cm: Option<f64>,
    /// Stored as extracted text, unlike its numeric siblings.
    pub descending_colon_max_circumference_cm: Option<String>,
    pub sigmoid_colon_max_circumference_cm: Option<f64>,
    pub cecum_length_cm: Option<f64>,
    pub ascending_colon_length_cm: Option<f64>,
    pub transverse_colon_length_cm: Option<f64>,
    pub descending_colon_length_cm: Option<f64>,
    pub sigmoid_colon_length_cm: Option<f64>,
    pub terminal_ileum_length_cm: Option<f64>,
    pub appendix_length_cm: Option<f64>,
    pub appendix_diameter_cm: Option<f64>,
}

/// Tumor descriptors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Tumor {
    /// Three-axis size as written in the report, e.g. "3.2 x 2.1 x 1.0 cm".
    pub size_cm: Option<String>,
    #[serde(rename = "type")]
    pub tumor_type: Option<String>,
    pub appearance: Option<String>,
    pub color_consistency: Option<String>,
    pub location: Option<String>,
    pub shape: Option<String>,
    pub thickness_cm: Option<f64>,
    pub wall_side: Option<String>,
    pub invasion_level: Option<String>,
}

/// Resection margins and tumor-to-margin distances.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Margins {
    pub proximal_cm: Option<f64>,
    pub distal_cm: Option<f64>,
    pub radial_cm: Option<f64>,
    pub mesenteric_cm: Option<f64>,
    pub distance_from_proximal_margin_cm: Option<f64>,
    pub distance_from_distal_margin_cm: Option<f64>,
    pub distance_from_mesenteric_margin_cm: Option<f64>,
    pub distance_from_retroperitoneal_margin_cm: Option<f64>,
}

/// Lymph node and invasion findings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LymphNodes {
    pub found: Option<String>,
    pub positive: Option<String>,
    pub examined: Option<String>,
    pub positions: Option<String>,
    pub extranodal_extension: Option<String>,
    pub lymphovascular_invasion: Option<String>,
    pub perineural_invasion: Option<String>,
    pub extramural_vascular_invasion: Option<String>,
    pub tumor_budding: Option<String>,
}

/// Polyp findings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Polyp {
    pub presence: Option<String>,
    pub size_cm: Option<f64>,
    pub distance_from_main_lesion_cm: Option<f64>,
}

/// Pathologic TNM staging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Staging {
    #[serde(rename = "pT")]
    pub p_t: Option<String>,
    #[serde(rename = "pN")]
    pub p_n: Option<String>,
    #[serde(rename = "pM")]
    pub p_m: Option<String>,
    pub distance_to_serosa: Option<String>,
    pub synchronous_polyps: Option<String>,
}

/// Serosal, retroperitoneal, and omental surface findings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TissueSurfaces {
    pub serosal_surface: Option<String>,
    pub retroperitoneal_surface: Option<String>,
    pub omentum_findings: Option<String>,
    pub other_findings: Option<String>,
}

/// Report administration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Admin {
    pub pathologist: Option<String>,
    pub diagnosis_date: Option<String>,
    pub block_count: Option<String>,
    pub report_conclusion: Option<String>,
}

/// Canonical clinical note for one patient visit, before persistence.
///
/// `patient_name` and `doctor_id` are never empty; they hold
/// [`UNKNOWN_PLACEHOLDER`] when the caller supplied nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ClinicalNote {
    pub patient_name: String,
    pub doctor_id: String,
    pub visit_date: DateTime<Utc>,

    pub specimen: Specimen,
    pub tumor: Tumor,
    pub margins: Margins,
    pub lymph_nodes: LymphNodes,
    pub polyp: Polyp,
    pub staging: Staging,
    pub tissue_surfaces: TissueSurfaces,
    pub admin: Admin,

    /// Audio recording this note was dictated from (lookup only).
    pub audio_id: Option<Uuid>,
    /// Transcription this note was derived from (lookup only).
    pub transcription_id: Option<Uuid>,
    /// AI summary generated for this note (lookup only).
    pub ai_summary_id: Option<Uuid>,

    pub transcription_raw: Option<String>,
    pub transcription_summary: Option<String>,

    pub status: NoteStatus,
}

impl ClinicalNote {
    /// Empty draft for the given visit. Identity fields use the placeholder.
    pub fn draft(visit_date: DateTime<Utc>) -> Self {
        Self {
            patient_name: UNKNOWN_PLACEHOLDER.to_string(),
            doctor_id: UNKNOWN_PLACEHOLDER.to_string(),
            visit_date,
            specimen: Specimen::default(),
            tumor: Tumor::default(),
            margins: Margins::default(),
            lymph_nodes: LymphNodes::default(),
            polyp: Polyp::default(),
            staging: Staging::default(),
            tissue_surfaces: TissueSurfaces::default(),
            admin: Admin::default(),
            audio_id: None,
            transcription_id: None,
            ai_summary_id: None,
            transcription_raw: None,
            transcription_summary: None,
            status: NoteStatus::Draft,
        }
    }
}

/// A clinical note as stored, with its assigned identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ClinicalNoteRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub note: ClinicalNote,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of a stored clinical note.
///
/// Present sections replace the stored section wholesale. Blank identity
/// fields are rejected rather than stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateClinicalNoteRequest {
    pub patient_name: Option<String>,
    pub doctor_id: Option<String>,
    pub visit_date: Option<DateTime<Utc>>,
    pub status: Option<NoteStatus>,

    pub specimen: Option<Specimen>,
    pub tumor: Option<Tumor>,
    pub margins: Option<Margins>,
    pub lymph_nodes: Option<LymphNodes>,
    pub polyp: Option<Polyp>,
    pub staging: Option<Staging>,
    pub tissue_surfaces: Option<TissueSurfaces>,
    pub admin: Option<Admin>,

    pub audio_id: Option<Uuid>,
    pub transcription_id: Option<Uuid>,
    pub ai_summary_id: Option<Uuid>,
    pub transcription_raw: Option<String>,
    pub transcription_summary: Option<String>,
}

impl UpdateClinicalNoteRequest {
    /// True when the request carries no changes.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Reject updates that would break the identity-field invariant.
    pub fn validate(&self) -> crate::Result<()> {
        for (name, value) in [
            ("patient_name", &self.patient_name),
            ("doctor_id", &self.doctor_id),
        ] {
            if let Some(v) = value {
                if v.trim().is_empty() {
                    return Err(crate::Error::InvalidInput(format!(
                        "{} cannot be blank",
                        name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Apply this update to a note in place.
    pub fn apply_to(self, note: &mut ClinicalNote) {
        if let Some(v) = self.patient_name {
            note.patient_name = v.trim().to_string();
        }
        if let Some(v) = self.doctor_id {
            note.doctor_id = v.trim().to_string();
        }
        if let Some(v) = self.visit_date {
            note.visit_date = v;
        }
        if let Some(v) = self.status {
            note.status = v;
        }
        if let Some(v) = self.specimen {
            note.specimen = v;
        }
        if let Some(v) = self.tumor {
            note.tumor = v;
        }
        if let Some(v) = self.margins {
            note.margins = v;
        }
        if let Some(v) = self.lymph_nodes {
            note.lymph_nodes = v;
        }
        if let Some(v) = self.polyp {
            note.polyp = v;
        }
        if let Some(v) = self.staging {
            note.staging = v;
        }
        if let Some(v) = self.tissue_surfaces {
            note.tissue_surfaces = v;
        }
        if let Some(v) = self.admin {
            note.admin = v;
        }
        if self.audio_id.is_some() {
            note.audio_id = self.audio_id;
        }
        if self.transcription_id.is_some() {
            note.transcription_id = self.transcription_id;
        }
        if self.ai_summary_id.is_some() {
            note.ai_summary_id = self.ai_summary_id;
        }
        if self.transcription_raw.is_some() {
            note.transcription_raw = self.transcription_raw;
        }
        if self.transcription_summary.is_some() {
            note.transcription_summary = self.transcription_summary;
        }
    }
}

/// Listing filter for stored notes.
#[derive(Debug, Clone, Default)]
pub struct ListClinicalNotesRequest {
    /// Only notes authored by this doctor.
    pub doctor_id: Option<String>,
    /// Maximum results
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

impl ListClinicalNotesRequest {
    /// Page size clamped to `1..=PAGE_LIMIT_MAX`, defaulting to `PAGE_LIMIT`.
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(crate::defaults::PAGE_LIMIT)
            .clamp(1, crate::defaults::PAGE_LIMIT_MAX)
    }

    /// Offset clamped to be non-negative.
    pub fn effective_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

// =============================================================================
// SUMMARIZATION
// =============================================================================

/// Free-text summary returned by the summarization backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Summary {
    pub response: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
}
