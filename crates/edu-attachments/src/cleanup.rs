//! Cascade deletion of a parent's attachments
//!
//! Invoked by the parent-deletion handlers once the parent row is known.
//! Deletion is best-effort: one record failing does not stop the rest, and
//! the caller gets a full account of what happened.

use std::sync::Arc;

use edu_core::traits::Id;
use tracing::{info, instrument, warn};

use crate::lifecycle::{AttachmentError, AttachmentLifecycleManager, AttachmentResult};
use crate::repository::MetadataRepository;
use crate::store::ObjectStore;

/// What a cascade delete accomplished
#[derive(Debug, Default)]
pub struct CascadeOutcome {
    pub attempted: usize,
    pub deleted: usize,
    pub failures: Vec<(Id, AttachmentError)>,
}

impl CascadeOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fans attachment deletion out across everything a parent owns
pub struct CleanupCoordinator<R, S> {
    manager: Arc<AttachmentLifecycleManager<R, S>>,
}

impl<R: MetadataRepository, S: ObjectStore> CleanupCoordinator<R, S> {
    pub fn new(manager: Arc<AttachmentLifecycleManager<R, S>>) -> Self {
        Self { manager }
    }

    /// Delete every attachment owned by `parent_id`
    ///
    /// Fails fast only if the attachment rows cannot be listed at all;
    /// per-record failures are collected into the outcome.
    #[instrument(skip(self))]
    pub async fn purge_parent(&self, parent_id: Id) -> AttachmentResult<CascadeOutcome> {
        let records = self.manager.find_by_parent(parent_id).await?;

        let mut outcome = CascadeOutcome {
            attempted: records.len(),
            ..Default::default()
        };

        for record in &records {
            match self.manager.delete(record).await {
                Ok(()) => outcome.deleted += 1,
                Err(e) => {
                    warn!(
                        parent_id,
                        attachment_id = record.id,
                        error = %e,
                        "Cascade delete failed for one attachment; continuing"
                    );
                    outcome.failures.push((record.id, e));
                }
            }
        }

        info!(
            parent_id,
            attempted = outcome.attempted,
            deleted = outcome.deleted,
            failed = outcome.failures.len(),
            "Cascade delete finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bucket, SlotPolicy};
    use crate::repository::MemoryMetadataRepository;
    use crate::store::MemoryObjectStore;
    use bytes::Bytes;

    fn coordinator() -> (
        Arc<MemoryMetadataRepository>,
        Arc<MemoryObjectStore>,
        Arc<AttachmentLifecycleManager<MemoryMetadataRepository, MemoryObjectStore>>,
        CleanupCoordinator<MemoryMetadataRepository, MemoryObjectStore>,
    ) {
        let repo = Arc::new(MemoryMetadataRepository::new(SlotPolicy::Multi));
        let store = Arc::new(MemoryObjectStore::new());
        let manager = Arc::new(AttachmentLifecycleManager::new(
            repo.clone(),
            store.clone(),
            Bucket::Courses,
            SlotPolicy::Multi,
        ));
        let coordinator = CleanupCoordinator::new(manager.clone());
        (repo, store, manager, coordinator)
    }

    #[tokio::test]
    async fn test_purge_removes_everything() {
        let (repo, store, manager, coordinator) = coordinator();

        for i in 0..3 {
            manager
                .create(9, "slides", Bytes::from(format!("deck{i}")))
                .await
                .unwrap();
        }
        manager.create(10, "slides", Bytes::from("other")).await.unwrap();

        let outcome = coordinator.purge_parent(9).await.unwrap();
        assert_eq!(outcome.attempted, 3);
        assert_eq!(outcome.deleted, 3);
        assert!(outcome.is_clean());

        assert!(manager.find_by_parent(9).await.unwrap().is_empty());
        // The other parent's attachment is untouched
        assert_eq!(repo.len().await, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_purge_of_empty_parent_is_noop() {
        let (_, _, _, coordinator) = coordinator();

        let outcome = coordinator.purge_parent(42).await.unwrap();
        assert_eq!(outcome.attempted, 0);
        assert!(outcome.is_clean());
    }

    /// Repository that refuses to delete one specific row
    struct StubbornRepo {
        inner: MemoryMetadataRepository,
        refuse_id: edu_core::traits::Id,
    }

    #[async_trait::async_trait]
    impl crate::repository::MetadataRepository for StubbornRepo {
        async fn find_by_parent(
            &self,
            parent_id: edu_core::traits::Id,
        ) -> crate::repository::MetadataResult<Vec<crate::model::AttachmentRecord>> {
            self.inner.find_by_parent(parent_id).await
        }

        async fn insert(
            &self,
            attachment: crate::model::NewAttachment,
        ) -> crate::repository::MetadataResult<crate::model::AttachmentRecord> {
            self.inner.insert(attachment).await
        }

        async fn update_by_id(
            &self,
            id: edu_core::traits::Id,
            path: &str,
            url: &str,
        ) -> crate::repository::MetadataResult<crate::model::AttachmentRecord> {
            self.inner.update_by_id(id, path, url).await
        }

        async fn delete_by_id(
            &self,
            id: edu_core::traits::Id,
        ) -> crate::repository::MetadataResult<bool> {
            if id == self.refuse_id {
                return Err(crate::repository::MetadataError::Backend(
                    "delete rejected".into(),
                ));
            }
            self.inner.delete_by_id(id).await
        }
    }

    #[tokio::test]
    async fn test_purge_reports_failures_without_aborting() {
        let repo = Arc::new(StubbornRepo {
            inner: MemoryMetadataRepository::new(SlotPolicy::Multi),
            refuse_id: 2,
        });
        let store = Arc::new(MemoryObjectStore::new());
        let manager = Arc::new(AttachmentLifecycleManager::new(
            repo.clone(),
            store,
            Bucket::Courses,
            SlotPolicy::Multi,
        ));
        let coordinator = CleanupCoordinator::new(manager.clone());

        for i in 0..3 {
            manager
                .create(9, "slides", Bytes::from(format!("deck{i}")))
                .await
                .unwrap();
        }

        let outcome = coordinator.purge_parent(9).await.unwrap();
        assert_eq!(outcome.attempted, 3);
        assert_eq!(outcome.deleted, 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, 2);
    }
}
