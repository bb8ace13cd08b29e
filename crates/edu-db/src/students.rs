//! Student repository

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use edu_core::traits::Id;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::payload::empty_to_none;
use crate::repository::{Repository, RepositoryError, RepositoryResult};

/// Student database entity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudentRow {
    pub id: i64,
    pub fullname: String,
    pub gender: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub birthplace: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub parent_name: Option<String>,
    pub parent_phone: Option<String>,
    pub photo: Option<String>,
    pub class_group_id: Option<i64>,
    pub program_id: Option<i64>,
    pub level_id: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a student
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStudentDto {
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
    pub parent_name: Option<String>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub parent_phone: Option<String>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub photo: Option<String>,
    pub class_group_id: Option<i64>,
    pub program_id: Option<i64>,
    pub level_id: Option<i64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// DTO for updating a student
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStudentDto {
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
    pub parent_name: Option<String>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub parent_phone: Option<String>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub photo: Option<String>,
    pub class_group_id: Option<i64>,
    pub program_id: Option<i64>,
    pub level_id: Option<i64>,
    pub is_active: Option<bool>,
}

const COLUMNS: &str = "id, fullname, gender, birthdate, birthplace, address, phone, \
     parent_name, parent_phone, photo, class_group_id, program_id, level_id, \
     is_active, created_at, updated_at";

/// Student repository implementation
pub struct StudentRepository {
    pool: PgPool,
}

impl StudentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Students assigned to a class group
    pub async fn find_by_class_group(&self, class_group_id: Id) -> RepositoryResult<Vec<StudentRow>> {
        let rows = sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {COLUMNS} FROM students WHERE class_group_id = $1 ORDER BY fullname ASC",
        ))
        .bind(class_group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl Repository<StudentRow, CreateStudentDto, UpdateStudentDto> for StudentRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<StudentRow>> {
        let row = sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {COLUMNS} FROM students WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_all(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<StudentRow>> {
        let rows = sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {COLUMNS} FROM students ORDER BY fullname ASC LIMIT $1 OFFSET $2",
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, dto: CreateStudentDto) -> RepositoryResult<StudentRow> {
        if dto.fullname.trim().is_empty() {
            return Err(RepositoryError::Validation(
                "fullname is required for a new student".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, StudentRow>(&format!(
            r#"
            INSERT INTO students (
                fullname, gender, birthdate, birthplace, address, phone,
                parent_name, parent_phone, photo, class_group_id, program_id,
                level_id, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, NOW(), NOW())
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(&dto.fullname)
        .bind(&dto.gender)
        .bind(dto.birthdate)
        .bind(&dto.birthplace)
        .bind(&dto.address)
        .bind(&dto.phone)
        .bind(&dto.parent_name)
        .bind(&dto.parent_phone)
        .bind(&dto.photo)
        .bind(dto.class_group_id)
        .bind(dto.program_id)
        .bind(dto.level_id)
        .bind(dto.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(&self, id: Id, dto: UpdateStudentDto) -> RepositoryResult<StudentRow> {
        let row = sqlx::query_as::<_, StudentRow>(&format!(
            r#"
            UPDATE students SET
                fullname = COALESCE($1, fullname),
                gender = COALESCE($2, gender),
                birthdate = COALESCE($3, birthdate),
                birthplace = COALESCE($4, birthplace),
                address = COALESCE($5, address),
                phone = COALESCE($6, phone),
                parent_name = COALESCE($7, parent_name),
                parent_phone = COALESCE($8, parent_phone),
                photo = COALESCE($9, photo),
                class_group_id = COALESCE($10, class_group_id),
                program_id = COALESCE($11, program_id),
                level_id = COALESCE($12, level_id),
                is_active = COALESCE($13, is_active),
                updated_at = NOW()
            WHERE id = $14
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(&dto.fullname)
        .bind(&dto.gender)
        .bind(dto.birthdate)
        .bind(&dto.birthplace)
        .bind(&dto.address)
        .bind(&dto.phone)
        .bind(&dto.parent_name)
        .bind(&dto.parent_phone)
        .bind(&dto.photo)
        .bind(dto.class_group_id)
        .bind(dto.program_id)
        .bind(dto.level_id)
        .bind(dto.is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Student with id {} not found", id)))?;

        Ok(row)
    }

    async fn delete(&self, id: Id) -> RepositoryResult<Option<StudentRow>> {
        let row = sqlx::query_as::<_, StudentRow>(&format!(
            "DELETE FROM students WHERE id = $1 RETURNING {COLUMNS}",
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
    fn test_create_dto_coerces_blank_fields() {
        let dto: CreateStudentDto = serde_json::from_str(
            r#"{"fullname": "Sari Dewi", "gender": "", "phone": "  ", "address": "Jl. Melati 4"}"#,
        )
        .unwrap();

        assert_eq!(dto.fullname, "Sari Dewi");
        assert_eq!(dto.gender, None);
        assert_eq!(dto.phone, None);
        assert_eq!(dto.address, Some("Jl. Melati 4".to_string()));
        assert!(dto.is_active);
    }

    #[test]
    fn test_update_dto_defaults_to_no_changes() {
        let dto: UpdateStudentDto = serde_json::from_str("{}").unwrap();
        assert!(dto.fullname.is_none());
        assert!(dto.is_active.is_none());
    }
}
