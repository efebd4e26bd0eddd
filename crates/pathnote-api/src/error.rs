//! HTTP error responses.
//!
//! Every failure is rendered as `{error, kind, detail, raw_output?}` where
//! `kind` is the stable tag from [`pathnote_core::Error::kind`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

/// Error body returned by every endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Short description of what failed.
    pub error: String,
    /// Stable machine-readable error tag.
    pub kind: String,
    /// Underlying error message.
    pub detail: String,
    /// Extractor output, when the failure was caused by it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    /// Failure raised by the pipeline or a collaborator.
    Core(pathnote_core::Error),
    BadRequest(String),
    NotFound(String),
}

impl From<pathnote_core::Error> for ApiError {
    fn from(err: pathnote_core::Error) -> Self {
        match err {
            pathnote_core::Error::NotFound(msg) => ApiError::NotFound(msg),
            pathnote_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Core(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Core(err) => status_for_kind(err.kind()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "invalid_input",
            ApiError::NotFound(_) => "not_found",
            ApiError::Core(err) => err.kind(),
        }
    }

    fn into_body(self) -> ErrorResponse {
        let kind = self.kind().to_string();
        match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => ErrorResponse {
                error: msg.clone(),
                kind,
                detail: msg,
                raw_output: None,
            },
            ApiError::Core(err) => ErrorResponse {
                error: headline(err.kind()).to_string(),
                kind,
                detail: err.to_string(),
                raw_output: err.raw_output().map(str::to_string),
            },
        }
    }
}

/// HTTP status for an error kind tag.
pub fn status_for_kind(kind: &str) -> StatusCode {
    match kind {
        "invalid_input" => StatusCode::BAD_REQUEST,
        "not_found" => StatusCode::NOT_FOUND,
        "extraction_process" | "empty_output" | "malformed_output" | "summary" => {
            StatusCode::BAD_GATEWAY
        }
        "extraction_timeout" => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn headline(kind: &str) -> &'static str {
    match kind {
        "extraction_launch" => "Extractor could not be started",
        "extraction_process" => "Extraction failed",
        "extraction_timeout" => "Extraction timed out",
        "empty_output" | "malformed_output" => "Failed to parse extractor output",
        "storage" => "Failed to save medical note",
        "summary" => "Failed to generate summary",
        _ => "Internal error",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), status = status.as_u16(), error = ?self, "Request failed");
        }
        (status, Json(self.into_body())).into_response()
    }
}
