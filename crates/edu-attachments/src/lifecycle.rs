//! Attachment lifecycle orchestration
//!
//! Coordinates the path namer, object store and metadata repository so a
//! metadata row and its binary object stay consistent across two backends
//! that cannot share a transaction. The ordering rules are:
//!
//! - never insert a metadata row without a backing object (blob first);
//! - a failed insert triggers a best-effort compensating removal of the
//!   object just written, and the original metadata error is surfaced;
//! - object removal failures during replace and delete are non-fatal: they
//!   are logged and the operation continues. The old object may leak, which
//!   is preferred over blocking the metadata mutation.

use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use edu_core::traits::Id;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::model::{AttachmentRecord, Bucket, NewAttachment, SlotPolicy};
use crate::path::PathNamer;
use crate::repository::{MetadataError, MetadataRepository};
use crate::store::{ObjectStore, StoreError};

/// Lifecycle errors, tagged by which backend failed and how fatal it is
#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("Invalid attachment request: {0}")]
    Validation(String),

    #[error("Object write failed for {path}: {source}")]
    StorageWrite {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("Metadata operation failed for parent {parent_id}: {source}")]
    Metadata {
        parent_id: Id,
        #[source]
        source: MetadataError,
    },
}

pub type AttachmentResult<T> = Result<T, AttachmentError>;

/// Orchestrates attachment create / replace / delete for one family
///
/// Constructed once at startup per family and injected by reference; holds
/// no global state. Lifecycle writes for one parent are serialized through
/// a per-parent mutex, which closes the lookup-then-write race two
/// concurrent replaces would otherwise hit. Attachment writes are not a hot
/// path, so the lock is cheap.
pub struct AttachmentLifecycleManager<R, S> {
    repository: Arc<R>,
    store: Arc<S>,
    namer: PathNamer,
    bucket: Bucket,
    policy: SlotPolicy,
    parent_locks: DashMap<Id, Arc<Mutex<()>>>,
}

impl<R: MetadataRepository, S: ObjectStore> AttachmentLifecycleManager<R, S> {
    pub fn new(repository: Arc<R>, store: Arc<S>, bucket: Bucket, policy: SlotPolicy) -> Self {
        Self {
            repository,
            store,
            namer: PathNamer::new(),
            bucket,
            policy,
            parent_locks: DashMap::new(),
        }
    }

    pub fn bucket(&self) -> Bucket {
        self.bucket
    }

    fn parent_lock(&self, parent_id: Id) -> Arc<Mutex<()>> {
        self.parent_locks
            .entry(parent_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Evict the per-parent lock once nothing but the map holds it. The
    /// caller must have dropped its own clone first; a waiter still holding
    /// one keeps the entry alive.
    fn release_parent_lock(&self, parent_id: Id) {
        self.parent_locks
            .remove_if(&parent_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    fn validate(parent_id: Id, category: &str) -> AttachmentResult<()> {
        if parent_id <= 0 {
            return Err(AttachmentError::Validation(format!(
                "parent id must be positive, got {parent_id}"
            )));
        }
        if category.trim().is_empty() {
            return Err(AttachmentError::Validation(
                "attachment category must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Attach a new file to a parent record
    #[instrument(skip(self, data), fields(bucket = %self.bucket))]
    pub async fn create(
        &self,
        parent_id: Id,
        category: &str,
        data: Bytes,
    ) -> AttachmentResult<AttachmentRecord> {
        Self::validate(parent_id, category)?;

        let lock = self.parent_lock(parent_id);
        let result = {
            let _guard = lock.lock().await;
            self.create_locked(parent_id, category, data).await
        };
        drop(lock);
        self.release_parent_lock(parent_id);
        result
    }

    /// Create with the parent lock already held
    async fn create_locked(
        &self,
        parent_id: Id,
        category: &str,
        data: Bytes,
    ) -> AttachmentResult<AttachmentRecord> {
        let path = self.namer.path_for(parent_id, category);

        self.store
            .put(self.bucket, &path, data)
            .await
            .map_err(|source| AttachmentError::StorageWrite {
                path: path.clone(),
                source,
            })?;

        // URL resolution failing after a successful write leaves an orphan
        // object, so it gets the same compensation as a failed insert.
        let url = match self.store.public_url(self.bucket, &path).await {
            Ok(url) => url,
            Err(source) => {
                self.compensate_blob(&path).await;
                return Err(AttachmentError::StorageWrite { path, source });
            }
        };

        let inserted = self
            .repository
            .insert(NewAttachment {
                parent_id,
                category: category.to_string(),
                path: path.clone(),
                url,
            })
            .await;

        match inserted {
            Ok(record) => {
                info!(id = record.id, parent_id, path = %record.path, "Attachment created");
                Ok(record)
            }
            Err(source) => {
                self.compensate_blob(&path).await;
                Err(AttachmentError::Metadata { parent_id, source })
            }
        }
    }

    /// Best-effort removal of an object whose metadata row never landed.
    /// Its own failure must not mask the error being surfaced.
    async fn compensate_blob(&self, path: &str) {
        if let Err(e) = self.store.remove(self.bucket, path).await {
            warn!(
                bucket = %self.bucket,
                path,
                error = %e,
                "Compensating object removal failed; object is orphaned"
            );
        }
    }

    /// Replace the single attachment slot of a parent record
    ///
    /// Single-slot semantics: the old object is removed best-effort, the new
    /// object written, and the existing row updated in place so its identity
    /// survives the swap. Without an existing row this is a plain create.
    /// For the multi-slot family replace is not defined and every upload is
    /// an independent create.
    #[instrument(skip(self, data), fields(bucket = %self.bucket))]
    pub async fn replace(
        &self,
        parent_id: Id,
        category: &str,
        data: Bytes,
    ) -> AttachmentResult<AttachmentRecord> {
        Self::validate(parent_id, category)?;

        if self.policy == SlotPolicy::Multi {
            return self.create(parent_id, category, data).await;
        }

        let lock = self.parent_lock(parent_id);
        let result = {
            let _guard = lock.lock().await;
            self.replace_locked(parent_id, category, data).await
        };
        drop(lock);
        self.release_parent_lock(parent_id);
        result
    }

    /// Single-slot replace with the parent lock already held
    async fn replace_locked(
        &self,
        parent_id: Id,
        category: &str,
        data: Bytes,
    ) -> AttachmentResult<AttachmentRecord> {
        let existing = self
            .repository
            .find_by_parent(parent_id)
            .await
            .map_err(|source| AttachmentError::Metadata { parent_id, source })?
            .into_iter()
            .next();

        let Some(existing) = existing else {
            return self.create_locked(parent_id, category, data).await;
        };

        // Old object removal is non-fatal: worst case it leaks, which is
        // preferred over losing the upload.
        if !existing.path.is_empty() {
            if let Err(e) = self.store.remove(self.bucket, &existing.path).await {
                warn!(
                    bucket = %self.bucket,
                    parent_id,
                    path = %existing.path,
                    error = %e,
                    "Failed to remove replaced object; continuing"
                );
            }
        }

        let path = self.namer.path_for(parent_id, category);

        self.store
            .put(self.bucket, &path, data)
            .await
            .map_err(|source| AttachmentError::StorageWrite {
                path: path.clone(),
                source,
            })?;

        let url = match self.store.public_url(self.bucket, &path).await {
            Ok(url) => url,
            Err(source) => {
                self.compensate_blob(&path).await;
                return Err(AttachmentError::StorageWrite { path, source });
            }
        };

        let updated = self
            .repository
            .update_by_id(existing.id, &path, &url)
            .await
            .map_err(|source| AttachmentError::Metadata { parent_id, source })?;

        info!(id = updated.id, parent_id, path = %updated.path, "Attachment replaced");
        Ok(updated)
    }

    /// Detach and destroy one attachment
    ///
    /// Object removal is always non-fatal here (fixed policy: the original
    /// system was inconsistent about it); the metadata delete is the
    /// authoritative step and its failure is surfaced.
    #[instrument(skip(self, record), fields(bucket = %self.bucket, id = record.id, parent_id = record.parent_id))]
    pub async fn delete(&self, record: &AttachmentRecord) -> AttachmentResult<()> {
        if let Err(e) = self.store.remove(self.bucket, &record.path).await {
            warn!(
                bucket = %self.bucket,
                parent_id = record.parent_id,
                path = %record.path,
                error = %e,
                "Object removal failed during delete; continuing to metadata"
            );
        }

        let deleted = self
            .repository
            .delete_by_id(record.id)
            .await
            .map_err(|source| AttachmentError::Metadata {
                parent_id: record.parent_id,
                source,
            })?;

        if deleted {
            info!(id = record.id, "Attachment deleted");
        } else {
            debug!(id = record.id, "Attachment row already gone");
        }
        Ok(())
    }

    /// All attachments currently owned by a parent
    pub async fn find_by_parent(&self, parent_id: Id) -> AttachmentResult<Vec<AttachmentRecord>> {
        self.repository
            .find_by_parent(parent_id)
            .await
            .map_err(|source| AttachmentError::Metadata { parent_id, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MemoryMetadataRepository, MetadataResult};
    use crate::store::{MemoryObjectStore, StoreResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    type Manager<R = MemoryMetadataRepository, S = MemoryObjectStore> =
        AttachmentLifecycleManager<R, S>;

    fn report_manager() -> (
        Arc<MemoryMetadataRepository>,
        Arc<MemoryObjectStore>,
        Manager,
    ) {
        let repo = Arc::new(MemoryMetadataRepository::new(SlotPolicy::Single));
        let store = Arc::new(MemoryObjectStore::new());
        let manager = AttachmentLifecycleManager::new(
            repo.clone(),
            store.clone(),
            Bucket::Reports,
            SlotPolicy::Single,
        );
        (repo, store, manager)
    }

    fn course_manager() -> (
        Arc<MemoryMetadataRepository>,
        Arc<MemoryObjectStore>,
        Manager,
    ) {
        let repo = Arc::new(MemoryMetadataRepository::new(SlotPolicy::Multi));
        let store = Arc::new(MemoryObjectStore::new());
        let manager = AttachmentLifecycleManager::new(
            repo.clone(),
            store.clone(),
            Bucket::Courses,
            SlotPolicy::Multi,
        );
        (repo, store, manager)
    }

    /// Store whose remove calls can be made to fail
    struct FlakyStore {
        inner: MemoryObjectStore,
        fail_remove: AtomicBool,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: MemoryObjectStore::new(),
                fail_remove: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl ObjectStore for FlakyStore {
        async fn put(&self, bucket: Bucket, path: &str, data: Bytes) -> StoreResult<()> {
            self.inner.put(bucket, path, data).await
        }

        async fn remove(&self, bucket: Bucket, path: &str) -> StoreResult<()> {
            if self.fail_remove.load(Ordering::SeqCst) {
                return Err(StoreError::Backend("remove rejected".into()));
            }
            self.inner.remove(bucket, path).await
        }

        async fn public_url(&self, bucket: Bucket, path: &str) -> StoreResult<String> {
            self.inner.public_url(bucket, path).await
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    /// Repository whose inserts can be made to fail
    struct FailingInsertRepo {
        inner: MemoryMetadataRepository,
        fail_insert: AtomicBool,
    }

    #[async_trait]
    impl MetadataRepository for FailingInsertRepo {
        async fn find_by_parent(&self, parent_id: Id) -> MetadataResult<Vec<AttachmentRecord>> {
            self.inner.find_by_parent(parent_id).await
        }

        async fn insert(&self, attachment: NewAttachment) -> MetadataResult<AttachmentRecord> {
            if self.fail_insert.load(Ordering::SeqCst) {
                return Err(MetadataError::Backend("insert rejected".into()));
            }
            self.inner.insert(attachment).await
        }

        async fn update_by_id(
            &self,
            id: Id,
            path: &str,
            url: &str,
        ) -> MetadataResult<AttachmentRecord> {
            self.inner.update_by_id(id, path, url).await
        }

        async fn delete_by_id(&self, id: Id) -> MetadataResult<bool> {
            self.inner.delete_by_id(id).await
        }
    }

    #[tokio::test]
    async fn test_create_then_find_returns_matching_record() {
        let (_, store, manager) = report_manager();

        let record = manager
            .create(5, "mid", Bytes::from("scores"))
            .await
            .unwrap();

        let found = manager.find_by_parent(5).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, record.path);
        assert!(store.contains(Bucket::Reports, &record.path).await);
        assert_eq!(record.url, format!("memory://reports/{}", record.path));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_parent() {
        let (_, _, manager) = report_manager();

        let result = manager.create(0, "mid", Bytes::from("x")).await;
        assert!(matches!(result, Err(AttachmentError::Validation(_))));

        let result = manager.create(5, "  ", Bytes::from("x")).await;
        assert!(matches!(result, Err(AttachmentError::Validation(_))));
    }

    #[tokio::test]
    async fn test_two_creates_get_distinct_paths() {
        let (_, _, manager) = course_manager();

        let first = manager.create(9, "slides", Bytes::from("a")).await.unwrap();
        let second = manager.create(9, "slides", Bytes::from("b")).await.unwrap();

        assert_ne!(first.path, second.path);
        assert_eq!(manager.find_by_parent(9).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_replace_twice_keeps_one_row_and_latest_content() {
        let (repo, store, manager) = report_manager();

        let first = manager
            .replace(5, "mid", Bytes::from("contentA"))
            .await
            .unwrap();
        let second = manager
            .replace(5, "mid", Bytes::from("contentB"))
            .await
            .unwrap();

        // Row identity survives the swap
        assert_eq!(second.id, first.id);
        assert_ne!(second.path, first.path);
        assert_eq!(repo.len().await, 1);

        // Only the second object remains
        assert!(!store.contains(Bucket::Reports, &first.path).await);
        assert_eq!(
            store.get(Bucket::Reports, &second.path).await,
            Some(Bytes::from("contentB"))
        );
    }

    #[tokio::test]
    async fn test_replace_without_existing_row_is_create() {
        let (repo, _, manager) = report_manager();

        let record = manager
            .replace(7, "final", Bytes::from("fresh"))
            .await
            .unwrap();

        assert_eq!(record.parent_id, 7);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_replace_survives_old_object_removal_failure() {
        let repo = Arc::new(MemoryMetadataRepository::new(SlotPolicy::Single));
        let store = Arc::new(FlakyStore::new());
        let manager = AttachmentLifecycleManager::new(
            repo.clone(),
            store.clone(),
            Bucket::Reports,
            SlotPolicy::Single,
        );

        let first = manager.replace(5, "mid", Bytes::from("a")).await.unwrap();

        store.fail_remove.store(true, Ordering::SeqCst);
        let second = manager.replace(5, "mid", Bytes::from("b")).await.unwrap();

        // The swap happened even though removal failed; old object leaks
        assert_eq!(second.id, first.id);
        assert_ne!(second.path, first.path);
        assert!(store.inner.contains(Bucket::Reports, &first.path).await);
    }

    #[tokio::test]
    async fn test_multi_slot_replace_is_independent_create() {
        let (repo, _, manager) = course_manager();

        manager.replace(9, "slides", Bytes::from("a")).await.unwrap();
        manager.replace(9, "slides", Bytes::from("b")).await.unwrap();

        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test]
    async fn test_failed_insert_compensates_blob() {
        let repo = Arc::new(FailingInsertRepo {
            inner: MemoryMetadataRepository::new(SlotPolicy::Single),
            fail_insert: AtomicBool::new(true),
        });
        let store = Arc::new(MemoryObjectStore::new());
        let manager = AttachmentLifecycleManager::new(
            repo.clone(),
            store.clone(),
            Bucket::Reports,
            SlotPolicy::Single,
        );

        let result = manager.create(5, "mid", Bytes::from("scores")).await;

        // The metadata error is surfaced, not the cleanup outcome
        match result {
            Err(AttachmentError::Metadata { parent_id: 5, source }) => {
                assert!(matches!(source, MetadataError::Backend(_)));
            }
            other => panic!("expected metadata error, got {other:?}"),
        }

        // No row, no orphan object
        assert!(repo.inner.find_by_parent(5).await.unwrap().is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_tolerates_missing_object() {
        let (repo, store, manager) = report_manager();
        let record = manager.create(5, "mid", Bytes::from("x")).await.unwrap();

        // Object vanishes out from under us
        store.remove(Bucket::Reports, &record.path).await.unwrap();

        manager.delete(&record).await.unwrap();
        assert_eq!(repo.len().await, 0);
    }

    #[tokio::test]
    async fn test_delete_continues_past_remove_failure() {
        let repo = Arc::new(MemoryMetadataRepository::new(SlotPolicy::Single));
        let store = Arc::new(FlakyStore::new());
        let manager = AttachmentLifecycleManager::new(
            repo.clone(),
            store.clone(),
            Bucket::Reports,
            SlotPolicy::Single,
        );

        let record = manager.create(5, "mid", Bytes::from("x")).await.unwrap();
        store.fail_remove.store(true, Ordering::SeqCst);

        manager.delete(&record).await.unwrap();
        assert_eq!(repo.len().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_replaces_keep_single_slot_invariant() {
        let (repo, _, manager) = report_manager();
        let manager = Arc::new(manager);

        let mut handles = Vec::new();
        for i in 0..8 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                manager
                    .replace(5, "mid", Bytes::from(format!("content{i}")))
                    .await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(repo.len().await, 1);
        assert!(manager.parent_locks.is_empty());
    }

    #[tokio::test]
    async fn test_parent_lock_is_evicted_after_each_operation() {
        let (_, _, manager) = report_manager();

        manager.create(3, "final", Bytes::from("a")).await.unwrap();
        assert!(manager.parent_locks.is_empty());

        manager.replace(3, "final", Bytes::from("b")).await.unwrap();
        assert!(manager.parent_locks.is_empty());
    }
}
