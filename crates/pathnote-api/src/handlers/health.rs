//! Health endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentHealth {
    pub storage: String,
    pub extractor: String,
    pub summary: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy`, `degraded` (collaborator down) or `unhealthy` (storage down).
    pub status: String,
    pub version: String,
    pub components: ComponentHealth,
}

fn label(up: bool) -> String {
    if up { "connected" } else { "disconnected" }.to_string()
}

/// Report storage, extractor and summary backend status.
///
/// Returns 503 only when storage is unreachable; the extractor and summary
/// backend being down degrades the service without taking it out.
#[utoipa::path(get, path = "/health", tag = "System",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
        (status = 503, description = "Storage unreachable", body = HealthResponse),
    ))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (storage, extractor, summary) = tokio::join!(
        state.notes.health_check(),
        state.ingest.orchestrator().health_check(),
        state.summary.health_check(),
    );
    let storage = storage.unwrap_or(false);
    let extractor = extractor.unwrap_or(false);
    let summary = summary.unwrap_or(false);

    let (code, status) = match (storage, extractor && summary) {
        (false, _) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
        (true, false) => (StatusCode::OK, "degraded"),
        (true, true) => (StatusCode::OK, "healthy"),
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            components: ComponentHealth {
                storage: label(storage),
                extractor: label(extractor),
                summary: label(summary),
            },
        }),
    )
}
