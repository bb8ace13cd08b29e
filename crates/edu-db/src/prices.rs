//! Price repository
//!
//! A price row is the tuition amount for one (level, program) pairing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use edu_core::traits::Id;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::repository::{Repository, RepositoryError, RepositoryResult};

/// Price database entity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PriceRow {
    pub id: i64,
    pub level_id: i64,
    pub program_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a price
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePriceDto {
    pub level_id: i64,
    pub program_id: i64,
    pub amount: i64,
}

/// DTO for updating a price
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePriceDto {
    pub level_id: Option<i64>,
    pub program_id: Option<i64>,
    pub amount: Option<i64>,
}

const COLUMNS: &str = "id, level_id, program_id, amount, created_at, updated_at";

/// Price repository implementation
pub struct PriceRepository {
    pool: PgPool,
}

impl PriceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Price for a specific level and program pairing
    pub async fn find_for_pairing(
        &self,
        level_id: Id,
        program_id: Id,
    ) -> RepositoryResult<Option<PriceRow>> {
        let row = sqlx::query_as::<_, PriceRow>(&format!(
            "SELECT {COLUMNS} FROM prices WHERE level_id = $1 AND program_id = $2",
        ))
        .bind(level_id)
        .bind(program_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

#[async_trait]
impl Repository<PriceRow, CreatePriceDto, UpdatePriceDto> for PriceRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<PriceRow>> {
        let row = sqlx::query_as::<_, PriceRow>(&format!(
            "SELECT {COLUMNS} FROM prices WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_all(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<PriceRow>> {
        let rows = sqlx::query_as::<_, PriceRow>(&format!(
            "SELECT {COLUMNS} FROM prices ORDER BY id ASC LIMIT $1 OFFSET $2",
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM prices")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, dto: CreatePriceDto) -> RepositoryResult<PriceRow> {
        if dto.amount < 0 {
            return Err(RepositoryError::Validation(
                "amount must not be negative".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, PriceRow>(&format!(
            r#"
            INSERT INTO prices (level_id, program_id, amount, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(dto.level_id)
        .bind(dto.program_id)
        .bind(dto.amount)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(&self, id: Id, dto: UpdatePriceDto) -> RepositoryResult<PriceRow> {
        if let Some(amount) = dto.amount {
            if amount < 0 {
                return Err(RepositoryError::Validation(
                    "amount must not be negative".to_string(),
                ));
            }
        }

        let row = sqlx::query_as::<_, PriceRow>(&format!(
            r#"
            UPDATE prices SET
                level_id = COALESCE($1, level_id),
                program_id = COALESCE($2, program_id),
                amount = COALESCE($3, amount),
                updated_at = NOW()
            WHERE id = $4
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(dto.level_id)
        .bind(dto.program_id)
        .bind(dto.amount)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Price with id {} not found", id)))?;

        Ok(row)
    }

    async fn delete(&self, id: Id) -> RepositoryResult<Option<PriceRow>> {
        let row = sqlx::query_as::<_, PriceRow>(&format!(
            "DELETE FROM prices WHERE id = $1 RETURNING {COLUMNS}",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
