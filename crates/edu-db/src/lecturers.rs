//! Lecturer repository

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use edu_core::traits::Id;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::payload::empty_to_none;
use crate::repository::{Repository, RepositoryError, RepositoryResult};

/// Lecturer database entity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LecturerRow {
    pub id: i64,
    pub fullname: String,
    pub gender: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub birthplace: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub photo: Option<String>,
    pub class_group_id: Option<i64>,
    pub last_education: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a lecturer
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLecturerDto {
    pub fullname: String,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub gender: Option<String>,
    pub birthdate: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub birthplace: Option<String>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub photo: Option<String>,
    pub class_group_id: Option<i64>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub last_education: Option<String>,
}

/// DTO for updating a lecturer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLecturerDto {
    #[serde(default, deserialize_with = "empty_to_none")]
    pub fullname: Option<String>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub gender: Option<String>,
    pub birthdate: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub birthplace: Option<String>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub photo: Option<String>,
    pub class_group_id: Option<i64>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub last_education: Option<String>,
}

const COLUMNS: &str = "id, fullname, gender, birthdate, birthplace, address, phone, \
     photo, class_group_id, last_education, created_at, updated_at";

/// Lecturer repository implementation
pub struct LecturerRepository {
    pool: PgPool,
}

impl LecturerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<LecturerRow, CreateLecturerDto, UpdateLecturerDto> for LecturerRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<LecturerRow>> {
        let row = sqlx::query_as::<_, LecturerRow>(&format!(
            "SELECT {COLUMNS} FROM lecturers WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_all(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<LecturerRow>> {
        let rows = sqlx::query_as::<_, LecturerRow>(&format!(
            "SELECT {COLUMNS} FROM lecturers ORDER BY fullname ASC LIMIT $1 OFFSET $2",
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM lecturers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, dto: CreateLecturerDto) -> RepositoryResult<LecturerRow> {
        if dto.fullname.trim().is_empty() {
            return Err(RepositoryError::Validation(
                "fullname is required for a new lecturer".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, LecturerRow>(&format!(
            r#"
            INSERT INTO lecturers (
                fullname, gender, birthdate, birthplace, address, phone,
                photo, class_group_id, last_education, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW())
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(&dto.fullname)
        .bind(&dto.gender)
        .bind(dto.birthdate)
        .bind(&dto.birthplace)
        .bind(&dto.address)
        .bind(&dto.phone)
        .bind(&dto.photo)
        .bind(dto.class_group_id)
        .bind(&dto.last_education)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(&self, id: Id, dto: UpdateLecturerDto) -> RepositoryResult<LecturerRow> {
        let row = sqlx::query_as::<_, LecturerRow>(&format!(
            r#"
            UPDATE lecturers SET
                fullname = COALESCE($1, fullname),
                gender = COALESCE($2, gender),
                birthdate = COALESCE($3, birthdate),
                birthplace = COALESCE($4, birthplace),
                address = COALESCE($5, address),
                phone = COALESCE($6, phone),
                photo = COALESCE($7, photo),
                class_group_id = COALESCE($8, class_group_id),
                last_education = COALESCE($9, last_education),
                updated_at = NOW()
            WHERE id = $10
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(&dto.fullname)
        .bind(&dto.gender)
        .bind(dto.birthdate)
        .bind(&dto.birthplace)
        .bind(&dto.address)
        .bind(&dto.phone)
        .bind(&dto.photo)
        .bind(dto.class_group_id)
        .bind(&dto.last_education)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Lecturer with id {} not found", id)))?;

        Ok(row)
    }

    async fn delete(&self, id: Id) -> RepositoryResult<Option<LecturerRow>> {
        let row = sqlx::query_as::<_, LecturerRow>(&format!(
            "DELETE FROM lecturers WHERE id = $1 RETURNING {COLUMNS}",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
