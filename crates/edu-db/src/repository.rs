//! Repository traits and shared query types
//!
//! Provides generic CRUD operations for database entities.

use async_trait::async_trait;
use edu_core::traits::Id;

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Base repository trait for CRUD operations
#[async_trait]
pub trait Repository<T, CreateDto, UpdateDto>: Send + Sync {
    /// Find an entity by ID
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<T>>;

    /// Find all entities with pagination
    async fn find_all(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<T>>;

    /// Count all entities
    async fn count(&self) -> RepositoryResult<i64>;

    /// Create a new entity, returning the inserted row
    async fn create(&self, dto: CreateDto) -> RepositoryResult<T>;

    /// Update an existing entity, returning the updated row
    async fn update(&self, id: Id, dto: UpdateDto) -> RepositoryResult<T>;

    /// Delete an entity by ID, returning the deleted row
    async fn delete(&self, id: Id) -> RepositoryResult<Option<T>>;
}

/// Pagination parameters for queries
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_default() {
        let p = Pagination::default();
        assert_eq!(p.limit, 50);
        assert_eq!(p.offset, 0);
    }
}
