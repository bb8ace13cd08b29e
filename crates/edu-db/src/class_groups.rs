//! Class group repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use edu_core::traits::Id;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::payload::empty_to_none;
use crate::repository::{Repository, RepositoryError, RepositoryResult};

/// Class group database entity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ClassGroupRow {
    pub id: i64,
    pub class_code: String,
    pub description: Option<String>,
    pub level_id: Option<i64>,
    pub lecturer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a class group
#[derive(Debug, Clone, Deserialize)]
pub struct CreateClassGroupDto {
    pub class_code: String,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub description: Option<String>,
    pub level_id: Option<i64>,
    pub lecturer_id: Option<i64>,
}

/// DTO for updating a class group
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateClassGroupDto {
    #[serde(default, deserialize_with = "empty_to_none")]
    pub class_code: Option<String>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub description: Option<String>,
    pub level_id: Option<i64>,
    pub lecturer_id: Option<i64>,
}

const COLUMNS: &str =
    "id, class_code, description, level_id, lecturer_id, created_at, updated_at";

/// Class group repository implementation
pub struct ClassGroupRepository {
    pool: PgPool,
}

impl ClassGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<ClassGroupRow, CreateClassGroupDto, UpdateClassGroupDto> for ClassGroupRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<ClassGroupRow>> {
        let row = sqlx::query_as::<_, ClassGroupRow>(&format!(
            "SELECT {COLUMNS} FROM class_groups WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_all(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<ClassGroupRow>> {
        let rows = sqlx::query_as::<_, ClassGroupRow>(&format!(
            "SELECT {COLUMNS} FROM class_groups ORDER BY class_code ASC LIMIT $1 OFFSET $2",
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM class_groups")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, dto: CreateClassGroupDto) -> RepositoryResult<ClassGroupRow> {
        if dto.class_code.trim().is_empty() {
            return Err(RepositoryError::Validation(
                "class_code is required for a new class group".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, ClassGroupRow>(&format!(
            r#"
            INSERT INTO class_groups (class_code, description, level_id, lecturer_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(&dto.class_code)
        .bind(&dto.description)
        .bind(dto.level_id)
        .bind(dto.lecturer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(&self, id: Id, dto: UpdateClassGroupDto) -> RepositoryResult<ClassGroupRow> {
        let row = sqlx::query_as::<_, ClassGroupRow>(&format!(
            r#"
            UPDATE class_groups SET
                class_code = COALESCE($1, class_code),
                description = COALESCE($2, description),
                level_id = COALESCE($3, level_id),
                lecturer_id = COALESCE($4, lecturer_id),
                updated_at = NOW()
            WHERE id = $5
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(&dto.class_code)
        .bind(&dto.description)
        .bind(dto.level_id)
        .bind(dto.lecturer_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            RepositoryError::NotFound(format!("Class group with id {} not found", id))
        })?;

        Ok(row)
    }

    async fn delete(&self, id: Id) -> RepositoryResult<Option<ClassGroupRow>> {
        let row = sqlx::query_as::<_, ClassGroupRow>(&format!(
            "DELETE FROM class_groups WHERE id = $1 RETURNING {COLUMNS}",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
