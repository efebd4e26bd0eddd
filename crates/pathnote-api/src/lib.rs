//! pathnote-api - HTTP API server for pathnote
//!
//! Exposes the ingestion pipeline and note store over HTTP. The binary in
//! `main.rs` loads configuration and wires collaborators; the router lives
//! here so it can be exercised in tests without binding a socket.

pub mod config;
pub mod error;
pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method, Request};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use pathnote_core::defaults::CORS_MAX_AGE_SECS;
use pathnote_core::{ClinicalNoteRepository, SummaryBackend};
use pathnote_ingest::{ExtractionOrchestrator, IngestionConfig, IngestionService};

pub use config::{ServerConfig, StorageBackend};
pub use error::{ApiError, ErrorResponse};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upload pipeline. Writes through the same repository as `notes`.
    pub ingest: IngestionService,
    pub notes: Arc<dyn ClinicalNoteRepository>,
    pub summary: Arc<dyn SummaryBackend>,
}

impl AppState {
    pub fn new(
        orchestrator: ExtractionOrchestrator,
        notes: Arc<dyn ClinicalNoteRepository>,
        ingestion: IngestionConfig,
        summary: Arc<dyn SummaryBackend>,
    ) -> Self {
        Self {
            ingest: IngestionService::new(orchestrator, notes.clone(), ingestion),
            notes,
            summary,
        }
    }
}

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pathnote API",
        description = "Clinical document ingestion and structured pathology notes"
    ),
    paths(
        handlers::health::health_check,
        handlers::notes::upload_document,
        handlers::notes::list_notes,
        handlers::notes::list_notes_by_user,
        handlers::notes::get_note,
        handlers::notes::update_note,
        handlers::notes::delete_note,
        handlers::summary::generate_summary,
    ),
    components(schemas(
        pathnote_core::ClinicalNote,
        pathnote_core::ClinicalNoteRecord,
        pathnote_core::UpdateClinicalNoteRequest,
        pathnote_core::NoteStatus,
        pathnote_core::Specimen,
        pathnote_core::Tumor,
        pathnote_core::Margins,
        pathnote_core::LymphNodes,
        pathnote_core::Polyp,
        pathnote_core::Staging,
        pathnote_core::TissueSurfaces,
        pathnote_core::Admin,
        pathnote_core::Summary,
        handlers::notes::UploadResponse,
        handlers::notes::NoteResponse,
        handlers::notes::NoteListResponse,
        handlers::notes::MessageResponse,
        handlers::summary::GenerateSummaryRequest,
        handlers::health::HealthResponse,
        handlers::health::ComponentHealth,
        ErrorResponse,
    )),
    tags(
        (name = "Notes", description = "Document upload and clinical note CRUD"),
        (name = "Summary", description = "Free-text summary generation"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;

/// Build the application router with all routes and middleware.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(config.allowed_origins.clone()))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(CORS_MAX_AGE_SECS));

    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        // OpenAPI / Swagger UI
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        // Clinical notes
        .route("/api/ehr", get(handlers::notes::list_notes))
        .route("/api/ehr/upload", post(handlers::notes::upload_document))
        .route(
            "/api/ehr/generate-summary",
            post(handlers::summary::generate_summary),
        )
        .route(
            "/api/ehr/user/:user_id",
            get(handlers::notes::list_notes_by_user),
        )
        .route(
            "/api/ehr/:id",
            get(handlers::notes::get_note)
                .patch(handlers::notes::update_note)
                .delete(handlers::notes::delete_note),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors)
        // The multipart extractor has its own 2 MB default; the document
        // limit is enforced by the layer below and by IngestionConfig.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .with_state(state)
}
