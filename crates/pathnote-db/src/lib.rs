//! # pathnote-db
//!
//! Storage layer for pathnote clinical notes.
//!
//! This crate provides:
//! - Connection pool management
//! - An idempotent table bootstrap
//! - A PostgreSQL [`ClinicalNoteRepository`] with JSONB sections
//! - An in-memory repository for tests and local development
//!
//! ## Example
//!
//! ```rust,ignore
//! use pathnote_db::{ClinicalNoteRepository, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/pathnote").await?;
//!     db.ensure_schema().await?;
//!
//!     let record = db.notes.find_by_id(id).await?;
//!     Ok(())
//! }
//! ```

pub mod memory;
pub mod notes;
pub mod pool;
pub mod schema;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use pathnote_core::*;

pub use memory::InMemoryClinicalNoteRepository;
pub use notes::PgClinicalNoteRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use schema::{ensure_schema, CLINICAL_NOTE_TABLE};

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Clinical note repository.
    pub notes: PgClinicalNoteRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            notes: PgClinicalNoteRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Connect with explicit pool settings.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they are missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        ensure_schema(&self.pool).await
    }

    /// Log pool metrics at debug level.
    pub fn log_metrics(&self) {
        log_pool_metrics(&self.pool);
    }
}
