//! pathnote-api - HTTP API server for pathnote

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pathnote_api::{build_router, AppState, ServerConfig, StorageBackend};
use pathnote_core::defaults::ENV_REQUIRE_METADATA;
use pathnote_core::ClinicalNoteRepository;
use pathnote_db::{Database, InMemoryClinicalNoteRepository, PoolConfig};
use pathnote_inference::{OllamaSummaryBackend, SummaryConfig};
use pathnote_ingest::{ExtractionOrchestrator, ExtractorConfig, IngestionConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "pathnote=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "pathnote_api=debug,pathnote_ingest=debug,pathnote_db=info,pathnote_inference=info,tower_http=debug".into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("pathnote-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false)); // no ANSI in files by default
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let server = ServerConfig::from_env();

    let notes: Arc<dyn ClinicalNoteRepository> = match &server.storage {
        StorageBackend::Memory => {
            info!(subsystem = "db", "Using in-memory note storage");
            Arc::new(InMemoryClinicalNoteRepository::new())
        }
        StorageBackend::Postgres { url } => {
            let db = Database::connect_with_config(url, PoolConfig::from_env()).await?;
            db.ensure_schema().await?;
            db.log_metrics();
            info!(subsystem = "db", "Connected to Postgres");
            Arc::new(db.notes)
        }
    };

    let extractor = ExtractorConfig::from_env();
    info!(
        subsystem = "ingest",
        program = %extractor.program,
        args = ?extractor.args,
        timeout_ms = extractor.timeout.as_millis() as u64,
        "Extractor configured"
    );
    let orchestrator = ExtractionOrchestrator::from_config(&extractor);

    // Uploads over HTTP require patient name and doctor id unless the
    // environment says otherwise.
    let mut ingestion = IngestionConfig::from_env();
    if std::env::var(ENV_REQUIRE_METADATA).is_err() {
        ingestion = ingestion.with_require_metadata(true);
    }

    let summary_config = SummaryConfig::from_env();
    summary_config.validate()?;
    info!(
        subsystem = "inference",
        base_url = %summary_config.base_url,
        model = %summary_config.model,
        "Summary backend configured"
    );
    let summary = Arc::new(OllamaSummaryBackend::new(summary_config));

    let state = AppState::new(orchestrator, notes, ingestion, summary);
    let app = build_router(state, &server);

    // Start server
    let addr = server.addr()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
