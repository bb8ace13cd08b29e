//! Object storage adapters
//!
//! Thin interface over the object-storage backend. Removal of a missing
//! key is not an error: the lifecycle manager relies on `remove` being
//! idempotent.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use crate::model::Bucket;

/// Object storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid object path: {0}")]
    InvalidPath(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Unified interface for object storage backends
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under a key. Overwrites existing content.
    async fn put(&self, bucket: Bucket, path: &str, data: Bytes) -> StoreResult<()>;

    /// Remove a key. Missing keys are not an error.
    async fn remove(&self, bucket: Bucket, path: &str) -> StoreResult<()>;

    /// Stable, retrievable URL for a key. Opaque to callers.
    async fn public_url(&self, bucket: Bucket, path: &str) -> StoreResult<String>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Local filesystem store; each bucket is a directory under the root
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl AsRef<Path>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            public_base_url: public_base_url.into(),
        }
    }

    /// Resolve a key to a full path, rejecting traversal attempts
    fn resolve(&self, bucket: Bucket, path: &str) -> StoreResult<PathBuf> {
        if path.contains("..") || path.starts_with('/') || path.starts_with('\\') {
            return Err(StoreError::InvalidPath(path.to_string()));
        }

        Ok(self.root.join(bucket.as_str()).join(path))
    }

    async fn ensure_parent(path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    #[instrument(skip(self, data), fields(store = "local", bucket = %bucket))]
    async fn put(&self, bucket: Bucket, path: &str, data: Bytes) -> StoreResult<()> {
        let full = self.resolve(bucket, path)?;
        Self::ensure_parent(&full).await?;

        let mut file = fs::File::create(&full).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;

        debug!(path = ?full, size = data.len(), "Object stored");
        Ok(())
    }

    #[instrument(skip(self), fields(store = "local", bucket = %bucket))]
    async fn remove(&self, bucket: Bucket, path: &str) -> StoreResult<()> {
        let full = self.resolve(bucket, path)?;

        match fs::remove_file(&full).await {
            Ok(()) => {
                debug!(path = ?full, "Object removed");
                Ok(())
            }
            // Removing something already gone is fine
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn public_url(&self, bucket: Bucket, path: &str) -> StoreResult<String> {
        self.resolve(bucket, path)?;
        Ok(format!("{}/{}/{}", self.public_base_url, bucket, path))
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// In-memory store for testing
pub struct MemoryObjectStore {
    objects: tokio::sync::RwLock<HashMap<(Bucket, String), Bytes>>,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: tokio::sync::RwLock::new(HashMap::new()),
        }
    }

    pub async fn contains(&self, bucket: Bucket, path: &str) -> bool {
        let objects = self.objects.read().await;
        objects.contains_key(&(bucket, path.to_string()))
    }

    pub async fn get(&self, bucket: Bucket, path: &str) -> Option<Bytes> {
        let objects = self.objects.read().await;
        objects.get(&(bucket, path.to_string())).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, bucket: Bucket, path: &str, data: Bytes) -> StoreResult<()> {
        let mut objects = self.objects.write().await;
        objects.insert((bucket, path.to_string()), data);
        Ok(())
    }

    async fn remove(&self, bucket: Bucket, path: &str) -> StoreResult<()> {
        let mut objects = self.objects.write().await;
        objects.remove(&(bucket, path.to_string()));
        Ok(())
    }

    async fn public_url(&self, bucket: Bucket, path: &str) -> StoreResult<String> {
        Ok(format!("memory://{}/{}", bucket, path))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_put_and_url() {
        let store = MemoryObjectStore::new();
        let data = Bytes::from("report body");

        store.put(Bucket::Reports, "5/mid_1000", data.clone()).await.unwrap();
        assert_eq!(store.get(Bucket::Reports, "5/mid_1000").await, Some(data));

        let url = store.public_url(Bucket::Reports, "5/mid_1000").await.unwrap();
        assert_eq!(url, "memory://reports/5/mid_1000");
    }

    #[tokio::test]
    async fn test_memory_remove_missing_is_ok() {
        let store = MemoryObjectStore::new();
        store.remove(Bucket::Courses, "nothing/here").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_buckets_are_disjoint() {
        let store = MemoryObjectStore::new();
        store
            .put(Bucket::Courses, "1/intro_1", Bytes::from("a"))
            .await
            .unwrap();

        assert!(store.contains(Bucket::Courses, "1/intro_1").await);
        assert!(!store.contains(Bucket::Reports, "1/intro_1").await);
    }

    #[tokio::test]
    async fn test_local_store_roundtrip() {
        let dir = std::env::temp_dir().join(format!("edu-store-{}", std::process::id()));
        let store = LocalObjectStore::new(&dir, "http://localhost/files");

        store
            .put(Bucket::Courses, "9/slides_42", Bytes::from("deck"))
            .await
            .unwrap();
        assert!(dir.join("courses/9/slides_42").exists());

        let url = store.public_url(Bucket::Courses, "9/slides_42").await.unwrap();
        assert_eq!(url, "http://localhost/files/courses/9/slides_42");

        store.remove(Bucket::Courses, "9/slides_42").await.unwrap();
        assert!(!dir.join("courses/9/slides_42").exists());

        // Second removal is a no-op
        store.remove(Bucket::Courses, "9/slides_42").await.unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_local_store_rejects_traversal() {
        let store = LocalObjectStore::new("/tmp/edu-files", "http://localhost/files");

        let result = store
            .put(Bucket::Courses, "../../etc/passwd", Bytes::from("x"))
            .await;
        assert!(matches!(result, Err(StoreError::InvalidPath(_))));
    }
}
