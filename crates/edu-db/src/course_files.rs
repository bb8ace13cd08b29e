//! Course file metadata repository
//!
//! SQL side of the course attachment family. A course owns any number of
//! files, so inserts never conflict here; the lifecycle manager treats this
//! family as append-only until a cascade delete runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use edu_attachments::{
    AttachmentRecord, MetadataError, MetadataRepository, MetadataResult, NewAttachment,
};
use edu_core::traits::Id;
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, FromRow)]
struct CourseFileRow {
    id: i64,
    course_id: i64,
    category: String,
    path: String,
    url: String,
    created_at: DateTime<Utc>,
}

impl From<CourseFileRow> for AttachmentRecord {
    fn from(row: CourseFileRow) -> Self {
        AttachmentRecord {
            id: row.id,
            parent_id: row.course_id,
            category: row.category,
            path: row.path,
            url: row.url,
            created_at: row.created_at,
        }
    }
}

const COLUMNS: &str = "id, course_id, category, path, url, created_at";

/// Course file repository over PostgreSQL
pub struct CourseFileRepository {
    pool: PgPool,
}

impl CourseFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_db_error(parent_id: Id, err: sqlx::Error) -> MetadataError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            MetadataError::Conflict(parent_id)
        }
        _ => MetadataError::Backend(err.to_string()),
    }
}

#[async_trait]
impl MetadataRepository for CourseFileRepository {
    async fn find_by_parent(&self, parent_id: Id) -> MetadataResult<Vec<AttachmentRecord>> {
        let rows = sqlx::query_as::<_, CourseFileRow>(&format!(
            "SELECT {COLUMNS} FROM course_files WHERE course_id = $1 ORDER BY id",
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MetadataError::Backend(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert(&self, attachment: NewAttachment) -> MetadataResult<AttachmentRecord> {
        let row = sqlx::query_as::<_, CourseFileRow>(&format!(
            r#"
            INSERT INTO course_files (course_id, category, path, url, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(attachment.parent_id)
        .bind(&attachment.category)
        .bind(&attachment.path)
        .bind(&attachment.url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(attachment.parent_id, e))?;

        Ok(row.into())
    }

    async fn update_by_id(&self, id: Id, path: &str, url: &str) -> MetadataResult<AttachmentRecord> {
        let row = sqlx::query_as::<_, CourseFileRow>(&format!(
            r#"
            UPDATE course_files SET path = $1, url = $2 WHERE id = $3
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(path)
        .bind(url)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MetadataError::Backend(e.to_string()))?
        .ok_or(MetadataError::NotFound(id))?;

        Ok(row.into())
    }

    async fn delete_by_id(&self, id: Id) -> MetadataResult<bool> {
        let result = sqlx::query("DELETE FROM course_files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| MetadataError::Backend(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
