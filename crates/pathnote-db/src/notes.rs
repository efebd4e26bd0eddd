//! PostgreSQL clinical note repository.
//!
//! Sections are stored as JSONB columns; identity, status, and references are
//! plain columns so listings can filter and sort without touching the JSON.

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::debug;
use uuid::Uuid;

use pathnote_core::{
    ClinicalNote, ClinicalNoteRecord, ClinicalNoteRepository, ListClinicalNotesRequest,
    NoteStatus, Result, UpdateClinicalNoteRequest,
};

const SELECT_COLUMNS: &str = "id, patient_name, doctor_id, visit_date, status, \
     specimen, tumor, margins, lymph_nodes, polyp, staging, tissue_surfaces, admin, \
     audio_id, transcription_id, ai_summary_id, transcription_raw, transcription_summary, \
     created_at, updated_at";

/// PostgreSQL implementation of [`ClinicalNoteRepository`].
#[derive(Clone)]
pub struct PgClinicalNoteRepository {
    pool: Pool<Postgres>,
}

impl PgClinicalNoteRepository {
    /// Create a new PgClinicalNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn fetch_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<ClinicalNoteRecord>> {
        let query = format!(
            "SELECT {} FROM clinical_note WHERE id = $1 FOR UPDATE",
            SELECT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        row.map(map_row_to_record).transpose()
    }
}

/// Current time at the precision Postgres stores, so returned records compare
/// equal to what a later read yields.
fn now() -> DateTime<Utc> {
    stored_precision(Utc::now())
}

/// `TIMESTAMPTZ` keeps microseconds. Every timestamp bound into a row goes
/// through here first.
fn stored_precision(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}

fn map_row_to_record(row: PgRow) -> Result<ClinicalNoteRecord> {
    let status: String = row.try_get("status")?;
    Ok(ClinicalNoteRecord {
        id: row.try_get("id")?,
        note: ClinicalNote {
            patient_name: row.try_get("patient_name")?,
            doctor_id: row.try_get("doctor_id")?,
            visit_date: row.try_get("visit_date")?,
            specimen: row.try_get::<Json<_>, _>("specimen")?.0,
            tumor: row.try_get::<Json<_>, _>("tumor")?.0,
            margins: row.try_get::<Json<_>, _>("margins")?.0,
            lymph_nodes: row.try_get::<Json<_>, _>("lymph_nodes")?.0,
            polyp: row.try_get::<Json<_>, _>("polyp")?.0,
            staging: row.try_get::<Json<_>, _>("staging")?.0,
            tissue_surfaces: row.try_get::<Json<_>, _>("tissue_surfaces")?.0,
            admin: row.try_get::<Json<_>, _>("admin")?.0,
            audio_id: row.try_get("audio_id")?,
            transcription_id: row.try_get("transcription_id")?,
            ai_summary_id: row.try_get("ai_summary_id")?,
            transcription_raw: row.try_get("transcription_raw")?,
            transcription_summary: row.try_get("transcription_summary")?,
            status: status.parse::<NoteStatus>()?,
        },
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl ClinicalNoteRepository for PgClinicalNoteRepository {
    async fn create(&self, mut note: ClinicalNote) -> Result<ClinicalNoteRecord> {
        let id = Uuid::now_v7();
        let now = now();
        note.visit_date = stored_precision(note.visit_date);

        sqlx::query(
            "INSERT INTO clinical_note (
                id, patient_name, doctor_id, visit_date, status,
                specimen, tumor, margins, lymph_nodes, polyp, staging, tissue_surfaces, admin,
                audio_id, transcription_id, ai_summary_id, transcription_raw, transcription_summary,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $19)",
        )
        .bind(id)
        .bind(&note.patient_name)
        .bind(&note.doctor_id)
        .bind(note.visit_date)
        .bind(note.status.as_str())
        .bind(Json(&note.specimen))
        .bind(Json(&note.tumor))
        .bind(Json(&note.margins))
        .bind(Json(&note.lymph_nodes))
        .bind(Json(&note.polyp))
        .bind(Json(&note.staging))
        .bind(Json(&note.tissue_surfaces))
        .bind(Json(&note.admin))
        .bind(note.audio_id)
        .bind(note.transcription_id)
        .bind(note.ai_summary_id)
        .bind(&note.transcription_raw)
        .bind(&note.transcription_summary)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(
            subsystem = "db",
            component = "clinical_notes",
            op = "create",
            note_id = %id,
            "Inserted clinical note"
        );

        Ok(ClinicalNoteRecord {
            id,
            note,
            created_at: now,
            updated_at: now,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ClinicalNoteRecord>> {
        let query = format!("SELECT {} FROM clinical_note WHERE id = $1", SELECT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(map_row_to_record).transpose()
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        update: UpdateClinicalNoteRequest,
    ) -> Result<Option<ClinicalNoteRecord>> {
        update.validate()?;

        let mut tx = self.pool.begin().await?;
        let Some(mut record) = Self::fetch_for_update(&mut tx, id).await? else {
            return Ok(None);
        };

        update.apply_to(&mut record.note);
        record.note.visit_date = stored_precision(record.note.visit_date);
        record.updated_at = now();
        let note = &record.note;

        sqlx::query(
            "UPDATE clinical_note SET
                patient_name = $2, doctor_id = $3, visit_date = $4, status = $5,
                specimen = $6, tumor = $7, margins = $8, lymph_nodes = $9, polyp = $10,
                staging = $11, tissue_surfaces = $12, admin = $13,
                audio_id = $14, transcription_id = $15, ai_summary_id = $16,
                transcription_raw = $17, transcription_summary = $18, updated_at = $19
            WHERE id = $1",
        )
        .bind(id)
        .bind(&note.patient_name)
        .bind(&note.doctor_id)
        .bind(note.visit_date)
        .bind(note.status.as_str())
        .bind(Json(&note.specimen))
        .bind(Json(&note.tumor))
        .bind(Json(&note.margins))
        .bind(Json(&note.lymph_nodes))
        .bind(Json(&note.polyp))
        .bind(Json(&note.staging))
        .bind(Json(&note.tissue_surfaces))
        .bind(Json(&note.admin))
        .bind(note.audio_id)
        .bind(note.transcription_id)
        .bind(note.ai_summary_id)
        .bind(&note.transcription_raw)
        .bind(&note.transcription_summary)
        .bind(record.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(record))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM clinical_note WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, req: ListClinicalNotesRequest) -> Result<Vec<ClinicalNoteRecord>> {
        let query = format!(
            "SELECT {} FROM clinical_note
             WHERE ($1::text IS NULL OR doctor_id = $1)
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(req.doctor_id.as_deref())
            .bind(req.effective_limit())
            .bind(req.effective_offset())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(map_row_to_record).collect()
    }

    async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(true)
    }
}
