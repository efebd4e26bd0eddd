//! In-memory clinical note repository for tests and local development.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use pathnote_core::{
    ClinicalNote, ClinicalNoteRecord, ClinicalNoteRepository, ListClinicalNotesRequest, Result,
    UpdateClinicalNoteRequest,
};

/// [`ClinicalNoteRepository`] backed by a shared map. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryClinicalNoteRepository {
    notes: Arc<RwLock<HashMap<Uuid, ClinicalNoteRecord>>>,
}

impl InMemoryClinicalNoteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored notes.
    pub async fn len(&self) -> usize {
        self.notes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.notes.read().await.is_empty()
    }
}

#[async_trait]
impl ClinicalNoteRepository for InMemoryClinicalNoteRepository {
    async fn create(&self, note: ClinicalNote) -> Result<ClinicalNoteRecord> {
        let now = Utc::now();
        let record = ClinicalNoteRecord {
            id: Uuid::now_v7(),
            note,
            created_at: now,
            updated_at: now,
        };
        self.notes.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ClinicalNoteRecord>> {
        Ok(self.notes.read().await.get(&id).cloned())
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        update: UpdateClinicalNoteRequest,
    ) -> Result<Option<ClinicalNoteRecord>> {
        update.validate()?;
        let mut notes = self.notes.write().await;
        let Some(record) = notes.get_mut(&id) else {
            return Ok(None);
        };
        update.apply_to(&mut record.note);
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool> {
        Ok(self.notes.write().await.remove(&id).is_some())
    }

    async fn list(&self, req: ListClinicalNotesRequest) -> Result<Vec<ClinicalNoteRecord>> {
        let notes = self.notes.read().await;
        let mut records: Vec<_> = notes
            .values()
            .filter(|r| {
                req.doctor_id
                    .as_deref()
                    .map_or(true, |doctor| r.note.doctor_id == doctor)
            })
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(records
            .into_iter()
            .skip(req.effective_offset() as usize)
            .take(req.effective_limit() as usize)
            .collect())
    }
}
