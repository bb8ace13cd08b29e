//! Level repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use edu_core::traits::Id;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::payload::empty_to_none;
use crate::repository::{Repository, RepositoryError, RepositoryResult};

/// Level database entity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LevelRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a level
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLevelDto {
    pub name: String,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub description: Option<String>,
}

/// DTO for updating a level
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLevelDto {
    #[serde(default, deserialize_with = "empty_to_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub description: Option<String>,
}

const COLUMNS: &str = "id, name, description, created_at, updated_at";

/// Level repository implementation
pub struct LevelRepository {
    pool: PgPool,
}

impl LevelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<LevelRow, CreateLevelDto, UpdateLevelDto> for LevelRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<LevelRow>> {
        let row = sqlx::query_as::<_, LevelRow>(&format!(
            "SELECT {COLUMNS} FROM levels WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_all(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<LevelRow>> {
        let rows = sqlx::query_as::<_, LevelRow>(&format!(
            "SELECT {COLUMNS} FROM levels ORDER BY name ASC LIMIT $1 OFFSET $2",
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM levels")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, dto: CreateLevelDto) -> RepositoryResult<LevelRow> {
        if dto.name.trim().is_empty() {
            return Err(RepositoryError::Validation(
                "name is required for a new level".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, LevelRow>(&format!(
            r#"
            INSERT INTO levels (name, description, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(&dto.name)
        .bind(&dto.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(&self, id: Id, dto: UpdateLevelDto) -> RepositoryResult<LevelRow> {
        let row = sqlx::query_as::<_, LevelRow>(&format!(
            r#"
            UPDATE levels SET
                name = COALESCE($1, name),
                description = COALESCE($2, description),
                updated_at = NOW()
            WHERE id = $3
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(&dto.name)
        .bind(&dto.description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Level with id {} not found", id)))?;

        Ok(row)
    }

    async fn delete(&self, id: Id) -> RepositoryResult<Option<LevelRow>> {
        let row = sqlx::query_as::<_, LevelRow>(&format!(
            "DELETE FROM levels WHERE id = $1 RETURNING {COLUMNS}",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
