//! Free-text summary generation.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;

use pathnote_core::Summary;

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateSummaryRequest {
    /// Prompt forwarded verbatim to the summarization model.
    pub prompt: String,
}

/// Generate a summary from a prompt via the configured summary backend.
#[utoipa::path(post, path = "/api/ehr/generate-summary", tag = "Summary",
    request_body = GenerateSummaryRequest,
    responses(
        (status = 200, description = "Generated summary", body = Summary),
        (status = 400, description = "Missing or invalid prompt", body = crate::error::ErrorResponse),
        (status = 502, description = "Summary backend failed", body = crate::error::ErrorResponse),
    ))]
pub async fn generate_summary(
    State(state): State<AppState>,
    payload: Result<Json<GenerateSummaryRequest>, JsonRejection>,
) -> Result<Json<Summary>, ApiError> {
    let Json(request) = payload
        .map_err(|_| ApiError::BadRequest("Missing or invalid 'prompt' field".to_string()))?;
    if request.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Missing or invalid 'prompt' field".to_string(),
        ));
    }

    let summary = state.summary.summarize(&request.prompt).await?;
    Ok(Json(summary))
}
