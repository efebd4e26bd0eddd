//! Clinical note HTTP handlers.
//!
//! Upload runs the full ingestion pipeline; the remaining routes are thin
//! wrappers over the note repository.

use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use pathnote_core::{
    ClinicalNoteRecord, ListClinicalNotesRequest, NoteMetadata, UpdateClinicalNoteRequest,
    UploadedDocument,
};

use crate::{ApiError, AppState};

/// Response from a successful upload.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub note: ClinicalNoteRecord,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NoteResponse {
    pub note: ClinicalNoteRecord,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NoteListResponse {
    pub notes: Vec<ClinicalNoteRecord>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Paging parameters for note listings.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    /// Page size (default 50, max 500).
    pub limit: Option<i64>,
    /// Number of notes to skip.
    pub offset: Option<i64>,
}

fn parse_note_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid note id format".to_string()))
}

fn optional_uuid(name: &str, raw: &str) -> Result<Option<Uuid>, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Uuid::parse_str(trimmed)
        .map(Some)
        .map_err(|_| ApiError::BadRequest(format!("Invalid {} format", name)))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))
}

/// Upload a clinical document and store the extracted note.
///
/// # Multipart Fields
/// - `file`: the document (required)
/// - `patient_name`: patient name
/// - `user_id`: id of the authoring doctor
/// - `visit_date`: RFC 3339 timestamp (optional, defaults to now)
/// - `audio_id`, `transcription_id`, `ai_summary_id`: related record ids (optional)
#[utoipa::path(post, path = "/api/ehr/upload", tag = "Notes",
    request_body(content_type = "multipart/form-data", description = "Document and metadata"),
    responses(
        (status = 200, description = "Note saved", body = UploadResponse),
        (status = 400, description = "Invalid upload", body = crate::error::ErrorResponse),
        (status = 502, description = "Extractor failed or produced unusable output", body = crate::error::ErrorResponse),
        (status = 504, description = "Extractor timed out", body = crate::error::ErrorResponse),
    ))]
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file: Option<(Vec<u8>, String, Option<String>)> = None;
    let mut metadata = NoteMetadata::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let field_name = field.name().map(|n| n.to_string());
        match field_name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(|c| c.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?
                    .to_vec();
                file = Some((bytes, filename, content_type));
            }
            Some("patient_name") => metadata.patient_name = Some(read_text(field).await?),
            Some("user_id") => metadata.doctor_id = Some(read_text(field).await?),
            Some("visit_date") => {
                let raw = read_text(field).await?;
                if !raw.trim().is_empty() {
                    let parsed = DateTime::parse_from_rfc3339(raw.trim()).map_err(|_| {
                        ApiError::BadRequest("visit_date must be an RFC 3339 timestamp".to_string())
                    })?;
                    metadata.visit_date = Some(parsed.with_timezone(&Utc));
                }
            }
            Some("audio_id") => metadata.audio_id = optional_uuid("audio_id", &read_text(field).await?)?,
            Some("transcription_id") => {
                metadata.transcription_id =
                    optional_uuid("transcription_id", &read_text(field).await?)?
            }
            Some("ai_summary_id") => {
                metadata.ai_summary_id = optional_uuid("ai_summary_id", &read_text(field).await?)?
            }
            _ => {} // ignore unknown fields
        }
    }

    let (bytes, filename, content_type) =
        file.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;
    let mut document = UploadedDocument::new(bytes, filename);
    if let Some(ct) = content_type {
        document = document.with_content_type(ct);
    }

    let note = state.ingest.ingest(document, metadata).await?;

    Ok(Json(UploadResponse {
        message: "Note saved".to_string(),
        note,
    }))
}

/// List all notes, newest first.
#[utoipa::path(get, path = "/api/ehr", tag = "Notes", params(PageQuery),
    responses((status = 200, description = "Notes, newest first", body = NoteListResponse)))]
pub async fn list_notes(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<NoteListResponse>, ApiError> {
    let notes = state
        .notes
        .list(ListClinicalNotesRequest {
            doctor_id: None,
            limit: page.limit,
            offset: page.offset,
        })
        .await?;
    Ok(Json(NoteListResponse { notes }))
}

/// List the notes authored by one doctor, newest first.
#[utoipa::path(get, path = "/api/ehr/user/{user_id}", tag = "Notes",
    params(("user_id" = String, Path, description = "Doctor id"), PageQuery),
    responses((status = 200, description = "Doctor's notes", body = NoteListResponse)))]
pub async fn list_notes_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<NoteListResponse>, ApiError> {
    if user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing userId".to_string()));
    }
    let notes = state
        .notes
        .list_by_doctor(&user_id, page.limit, page.offset)
        .await?;
    Ok(Json(NoteListResponse { notes }))
}

#[utoipa::path(get, path = "/api/ehr/{id}", tag = "Notes",
    params(("id" = Uuid, Path, description = "Note id")),
    responses(
        (status = 200, description = "The note", body = NoteResponse),
        (status = 404, description = "Note not found", body = crate::error::ErrorResponse),
    ))]
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NoteResponse>, ApiError> {
    let id = parse_note_id(&id)?;
    let note = state
        .notes
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Medical note not found".to_string()))?;
    Ok(Json(NoteResponse { note }))
}

/// Apply a partial update and return the updated note.
#[utoipa::path(patch, path = "/api/ehr/{id}", tag = "Notes",
    params(("id" = Uuid, Path, description = "Note id")),
    request_body = UpdateClinicalNoteRequest,
    responses(
        (status = 200, description = "Updated note", body = ClinicalNoteRecord),
        (status = 400, description = "Missing updates", body = crate::error::ErrorResponse),
        (status = 404, description = "Note not found", body = crate::error::ErrorResponse),
    ))]
pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<UpdateClinicalNoteRequest>,
) -> Result<Json<ClinicalNoteRecord>, ApiError> {
    let id = parse_note_id(&id)?;
    if update.is_empty() {
        return Err(ApiError::BadRequest("Missing updates".to_string()));
    }
    let updated = state
        .notes
        .update_by_id(id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;
    Ok(Json(updated))
}

#[utoipa::path(delete, path = "/api/ehr/{id}", tag = "Notes",
    params(("id" = Uuid, Path, description = "Note id")),
    responses(
        (status = 200, description = "Note deleted", body = MessageResponse),
        (status = 404, description = "Note not found", body = crate::error::ErrorResponse),
    ))]
pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_note_id(&id)?;
    if !state.notes.delete_by_id(id).await? {
        return Err(ApiError::NotFound("Note not found".to_string()));
    }
    Ok(Json(MessageResponse {
        message: "Note deleted successfully".to_string(),
    }))
}
