//! Course repository

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use edu_core::traits::Id;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::payload::empty_to_none;
use crate::repository::{Repository, RepositoryError, RepositoryResult};

/// Course database entity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CourseRow {
    pub id: i64,
    pub title: String,
    pub course_code: Option<String>,
    pub description: Option<String>,
    pub video_link: Option<String>,
    pub upload_date: Option<NaiveDate>,
    pub class_group_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a course
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCourseDto {
    pub title: String,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub course_code: Option<String>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub video_link: Option<String>,
    pub upload_date: Option<NaiveDate>,
    pub class_group_id: Option<i64>,
}

/// DTO for updating a course
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCourseDto {
    #[serde(default, deserialize_with = "empty_to_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub course_code: Option<String>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "empty_to_none")]
    pub video_link: Option<String>,
    pub upload_date: Option<NaiveDate>,
    pub class_group_id: Option<i64>,
}

const COLUMNS: &str = "id, title, course_code, description, video_link, upload_date, \
     class_group_id, created_at, updated_at";

/// Course repository implementation
pub struct CourseRepository {
    pool: PgPool,
}

impl CourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Courses offered to a class group
    pub async fn find_by_class_group(&self, class_group_id: Id) -> RepositoryResult<Vec<CourseRow>> {
        let rows = sqlx::query_as::<_, CourseRow>(&format!(
            "SELECT {COLUMNS} FROM courses WHERE class_group_id = $1 ORDER BY title ASC",
        ))
        .bind(class_group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl Repository<CourseRow, CreateCourseDto, UpdateCourseDto> for CourseRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<CourseRow>> {
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            "SELECT {COLUMNS} FROM courses WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_all(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<CourseRow>> {
        let rows = sqlx::query_as::<_, CourseRow>(&format!(
            "SELECT {COLUMNS} FROM courses ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM courses")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, dto: CreateCourseDto) -> RepositoryResult<CourseRow> {
        if dto.title.trim().is_empty() {
            return Err(RepositoryError::Validation(
                "title is required for a new course".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, CourseRow>(&format!(
            r#"
            INSERT INTO courses (
                title, course_code, description, video_link, upload_date,
                class_group_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(&dto.title)
        .bind(&dto.course_code)
        .bind(&dto.description)
        .bind(&dto.video_link)
        .bind(dto.upload_date)
        .bind(dto.class_group_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(&self, id: Id, dto: UpdateCourseDto) -> RepositoryResult<CourseRow> {
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            r#"
            UPDATE courses SET
                title = COALESCE($1, title),
                course_code = COALESCE($2, course_code),
                description = COALESCE($3, description),
                video_link = COALESCE($4, video_link),
                upload_date = COALESCE($5, upload_date),
                class_group_id = COALESCE($6, class_group_id),
                updated_at = NOW()
            WHERE id = $7
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(&dto.title)
        .bind(&dto.course_code)
        .bind(&dto.description)
        .bind(&dto.video_link)
        .bind(dto.upload_date)
        .bind(dto.class_group_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Course with id {} not found", id)))?;

        Ok(row)
    }

    async fn delete(&self, id: Id) -> RepositoryResult<Option<CourseRow>> {
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            "DELETE FROM courses WHERE id = $1 RETURNING {COLUMNS}",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
