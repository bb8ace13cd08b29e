//! Attachment metadata repository contract
//!
//! One implementation exists per attachment family (course files, report
//! files); the SQL-backed versions live in `edu-db`. Backend "no rows"
//! signaling is always mapped into empty vectors, `None` or `false` here,
//! never surfaced as an error.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use edu_core::traits::Id;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::model::{AttachmentRecord, NewAttachment, SlotPolicy};

/// Metadata backend errors
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Attachment row not found: {0}")]
    NotFound(Id),
    #[error("Duplicate attachment for parent {0}")]
    Conflict(Id),
    #[error("Metadata backend error: {0}")]
    Backend(String),
}

pub type MetadataResult<T> = Result<T, MetadataError>;

/// Relational-store adapter for one attachment family
#[async_trait]
pub trait MetadataRepository: Send + Sync {
    /// All rows owned by a parent (0 or 1 for single-slot families)
    async fn find_by_parent(&self, parent_id: Id) -> MetadataResult<Vec<AttachmentRecord>>;

    /// Insert a row, returning it with id and timestamp filled in
    async fn insert(&self, attachment: NewAttachment) -> MetadataResult<AttachmentRecord>;

    /// Swap path and url on an existing row, preserving its identity
    async fn update_by_id(&self, id: Id, path: &str, url: &str) -> MetadataResult<AttachmentRecord>;

    /// Delete a row; `false` means nothing matched
    async fn delete_by_id(&self, id: Id) -> MetadataResult<bool>;
}

/// In-memory repository for testing
///
/// Emulates the schema-level unique constraint of the single-slot family so
/// concurrency tests can observe conflicts the way PostgreSQL would raise
/// them.
pub struct MemoryMetadataRepository {
    records: RwLock<Vec<AttachmentRecord>>,
    next_id: AtomicI64,
    policy: SlotPolicy,
}

impl MemoryMetadataRepository {
    pub fn new(policy: SlotPolicy) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
            policy,
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl MetadataRepository for MemoryMetadataRepository {
    async fn find_by_parent(&self, parent_id: Id) -> MetadataResult<Vec<AttachmentRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.parent_id == parent_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, attachment: NewAttachment) -> MetadataResult<AttachmentRecord> {
        let mut records = self.records.write().await;

        if self.policy == SlotPolicy::Single
            && records.iter().any(|r| r.parent_id == attachment.parent_id)
        {
            return Err(MetadataError::Conflict(attachment.parent_id));
        }

        let record = AttachmentRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            parent_id: attachment.parent_id,
            category: attachment.category,
            path: attachment.path,
            url: attachment.url,
            created_at: Utc::now(),
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn update_by_id(&self, id: Id, path: &str, url: &str) -> MetadataResult<AttachmentRecord> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(MetadataError::NotFound(id))?;

        record.path = path.to_string();
        record.url = url.to_string();
        Ok(record.clone())
    }

    async fn delete_by_id(&self, id: Id) -> MetadataResult<bool> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_attachment(parent_id: Id) -> NewAttachment {
        NewAttachment {
            parent_id,
            category: "mid".into(),
            path: format!("{}/mid_1000", parent_id),
            url: format!("memory://reports/{}/mid_1000", parent_id),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = MemoryMetadataRepository::new(SlotPolicy::Multi);

        let record = repo.insert(new_attachment(5)).await.unwrap();
        assert_eq!(record.id, 1);

        let found = repo.find_by_parent(5).await.unwrap();
        assert_eq!(found, vec![record]);
        assert!(repo.find_by_parent(6).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_slot_insert_conflicts() {
        let repo = MemoryMetadataRepository::new(SlotPolicy::Single);
        repo.insert(new_attachment(5)).await.unwrap();

        let second = repo.insert(new_attachment(5)).await;
        assert!(matches!(second, Err(MetadataError::Conflict(5))));

        // Different parent is fine
        repo.insert(new_attachment(6)).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_preserves_identity() {
        let repo = MemoryMetadataRepository::new(SlotPolicy::Single);
        let record = repo.insert(new_attachment(5)).await.unwrap();

        let updated = repo
            .update_by_id(record.id, "5/mid_1001", "memory://reports/5/mid_1001")
            .await
            .unwrap();

        assert_eq!(updated.id, record.id);
        assert_eq!(updated.path, "5/mid_1001");
    }

    #[tokio::test]
    async fn test_update_missing_row() {
        let repo = MemoryMetadataRepository::new(SlotPolicy::Single);
        let result = repo.update_by_id(99, "p", "u").await;
        assert!(matches!(result, Err(MetadataError::NotFound(99))));
    }

    #[tokio::test]
    async fn test_delete_reports_affected_row() {
        let repo = MemoryMetadataRepository::new(SlotPolicy::Multi);
        let record = repo.insert(new_attachment(5)).await.unwrap();

        assert!(repo.delete_by_id(record.id).await.unwrap());
        assert!(!repo.delete_by_id(record.id).await.unwrap());
    }
}
