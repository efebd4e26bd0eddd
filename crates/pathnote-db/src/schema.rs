//! Idempotent table bootstrap.
//!
//! There are no versioned migrations. The table is created if missing and
//! otherwise left untouched.

use sqlx::PgPool;
use tracing::info;

use pathnote_core::Result;

/// Table holding clinical notes.
pub const CLINICAL_NOTE_TABLE: &str = "clinical_note";

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS clinical_note (
    id                    UUID PRIMARY KEY,
    patient_name          TEXT NOT NULL,
    doctor_id             TEXT NOT NULL,
    visit_date            TIMESTAMPTZ NOT NULL,
    status                TEXT NOT NULL DEFAULT 'draft'
                          CHECK (status IN ('draft', 'finalized', 'archived')),
    specimen              JSONB NOT NULL DEFAULT '{}'::jsonb,
    tumor                 JSONB NOT NULL DEFAULT '{}'::jsonb,
    margins               JSONB NOT NULL DEFAULT '{}'::jsonb,
    lymph_nodes           JSONB NOT NULL DEFAULT '{}'::jsonb,
    polyp                 JSONB NOT NULL DEFAULT '{}'::jsonb,
    staging               JSONB NOT NULL DEFAULT '{}'::jsonb,
    tissue_surfaces       JSONB NOT NULL DEFAULT '{}'::jsonb,
    admin                 JSONB NOT NULL DEFAULT '{}'::jsonb,
    audio_id              UUID,
    transcription_id      UUID,
    ai_summary_id         UUID,
    transcription_raw     TEXT,
    transcription_summary TEXT,
    created_at            TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at            TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_DOCTOR_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_clinical_note_doctor_created
    ON clinical_note (doctor_id, created_at DESC)
"#;

const CREATE_CREATED_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_clinical_note_created
    ON clinical_note (created_at DESC)
"#;

/// Create the clinical note table and its indexes if they do not exist.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in [CREATE_TABLE, CREATE_DOCTOR_INDEX, CREATE_CREATED_INDEX] {
        sqlx::query(statement).execute(pool).await?;
    }
    info!(
        subsystem = "db",
        component = "schema",
        op = "ensure",
        db_table = CLINICAL_NOTE_TABLE,
        "Schema ready"
    );
    Ok(())
}
