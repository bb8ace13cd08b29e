//! Grade repository
//!
//! A grade row records one assessment taken by a student; its `test_type`
//! doubles as the category discriminator for the attached report file.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use edu_core::traits::Id;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::payload::empty_to_none;
use crate::repository::{Repository, RepositoryError, RepositoryResult};

/// Grade database entity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GradeRow {
    pub id: i64,
    pub student_id: i64,
    pub test_type: String,
    pub listening_score: Option<f64>,
    pub reading_score: Option<f64>,
    pub speaking_score: Option<f64>,
    pub writing_score: Option<f64>,
    pub final_score: Option<f64>,
    pub description: Option<String>,
    pub date_taken: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a grade
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGradeDto {
    pub student_id: i64,
    pub test_type: String,
    pub listening_score: Option<f64>,
    pub reading_score: Option<f64>,
    pub speaking_score: Option<f64>,
    pub writing_score: Option<f64>,
    pub final_score: Option<f64>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub description: Option<String>,
    pub date_taken: Option<NaiveDate>,
}

/// DTO for updating a grade
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGradeDto {
    pub student_id: Option<i64>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub test_type: Option<String>,
    pub listening_score: Option<f64>,
    pub reading_score: Option<f64>,
    pub speaking_score: Option<f64>,
    pub writing_score: Option<f64>,
    pub final_score: Option<f64>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub description: Option<String>,
    pub date_taken: Option<NaiveDate>,
}

const COLUMNS: &str = "id, student_id, test_type, listening_score, reading_score, \
     speaking_score, writing_score, final_score, description, date_taken, \
     created_at, updated_at";

/// Grade repository implementation
pub struct GradeRepository {
    pool: PgPool,
}

impl GradeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All grades recorded for a student
    pub async fn find_by_student(&self, student_id: Id) -> RepositoryResult<Vec<GradeRow>> {
        let rows = sqlx::query_as::<_, GradeRow>(&format!(
            "SELECT {COLUMNS} FROM grades WHERE student_id = $1 ORDER BY date_taken DESC NULLS LAST",
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl Repository<GradeRow, CreateGradeDto, UpdateGradeDto> for GradeRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<GradeRow>> {
        let row = sqlx::query_as::<_, GradeRow>(&format!(
            "SELECT {COLUMNS} FROM grades WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_all(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<GradeRow>> {
        let rows = sqlx::query_as::<_, GradeRow>(&format!(
            "SELECT {COLUMNS} FROM grades ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM grades")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, dto: CreateGradeDto) -> RepositoryResult<GradeRow> {
        if dto.test_type.trim().is_empty() {
            return Err(RepositoryError::Validation(
                "test_type is required for a new grade".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, GradeRow>(&format!(
            r#"
            INSERT INTO grades (
                student_id, test_type, listening_score, reading_score,
                speaking_score, writing_score, final_score, description,
                date_taken, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW())
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(dto.student_id)
        .bind(&dto.test_type)
        .bind(dto.listening_score)
        .bind(dto.reading_score)
        .bind(dto.speaking_score)
        .bind(dto.writing_score)
        .bind(dto.final_score)
        .bind(&dto.description)
        .bind(dto.date_taken)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(&self, id: Id, dto: UpdateGradeDto) -> RepositoryResult<GradeRow> {
        let row = sqlx::query_as::<_, GradeRow>(&format!(
            r#"
            UPDATE grades SET
                student_id = COALESCE($1, student_id),
                test_type = COALESCE($2, test_type),
                listening_score = COALESCE($3, listening_score),
                reading_score = COALESCE($4, reading_score),
                speaking_score = COALESCE($5, speaking_score),
                writing_score = COALESCE($6, writing_score),
                final_score = COALESCE($7, final_score),
                description = COALESCE($8, description),
                date_taken = COALESCE($9, date_taken),
                updated_at = NOW()
            WHERE id = $10
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(dto.student_id)
        .bind(&dto.test_type)
        .bind(dto.listening_score)
        .bind(dto.reading_score)
        .bind(dto.speaking_score)
        .bind(dto.writing_score)
        .bind(dto.final_score)
        .bind(&dto.description)
        .bind(dto.date_taken)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Grade with id {} not found", id)))?;

        Ok(row)
    }

    async fn delete(&self, id: Id) -> RepositoryResult<Option<GradeRow>> {
        let row = sqlx::query_as::<_, GradeRow>(&format!(
            "DELETE FROM grades WHERE id = $1 RETURNING {COLUMNS}",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_dto_requires_test_type_field() {
        let parsed: Result<CreateGradeDto, _> =
            serde_json::from_str(r#"{"student_id": 5, "listening_score": 80}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_scores_are_optional() {
        let dto: CreateGradeDto =
            serde_json::from_str(r#"{"student_id": 5, "test_type": "mid"}"#).unwrap();
        assert_eq!(dto.test_type, "mid");
        assert!(dto.final_score.is_none());
    }
}
