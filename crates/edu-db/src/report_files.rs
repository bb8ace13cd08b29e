//! Report file metadata repository
//!
//! SQL side of the single-slot report attachment family. The schema carries
//! a `UNIQUE (grade_id)` constraint, so an insert racing a replace surfaces
//! as `MetadataError::Conflict` instead of a second row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use edu_attachments::{
    AttachmentRecord, MetadataError, MetadataRepository, MetadataResult, NewAttachment,
};
use edu_core::traits::Id;
use sqlx::{FromRow, PgPool};

use crate::repository::RepositoryResult;

#[derive(Debug, Clone, FromRow)]
struct ReportFileRow {
    id: i64,
    grade_id: i64,
    category: String,
    path: String,
    url: String,
    created_at: DateTime<Utc>,
}

impl From<ReportFileRow> for AttachmentRecord {
    fn from(row: ReportFileRow) -> Self {
        AttachmentRecord {
            id: row.id,
            parent_id: row.grade_id,
            category: row.category,
            path: row.path,
            url: row.url,
            created_at: row.created_at,
        }
    }
}

const COLUMNS: &str = "id, grade_id, category, path, url, created_at";

/// Report file repository over PostgreSQL
pub struct ReportFileRepository {
    pool: PgPool,
}

impl ReportFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Paged listing for the read-only report file endpoints
    pub async fn find_all(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<AttachmentRecord>> {
        let rows = sqlx::query_as::<_, ReportFileRow>(&format!(
            "SELECT {COLUMNS} FROM report_files ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<AttachmentRecord>> {
        let row = sqlx::query_as::<_, ReportFileRow>(&format!(
            "SELECT {COLUMNS} FROM report_files WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
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
impl MetadataRepository for ReportFileRepository {
    async fn find_by_parent(&self, parent_id: Id) -> MetadataResult<Vec<AttachmentRecord>> {
        let rows = sqlx::query_as::<_, ReportFileRow>(&format!(
            "SELECT {COLUMNS} FROM report_files WHERE grade_id = $1",
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MetadataError::Backend(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert(&self, attachment: NewAttachment) -> MetadataResult<AttachmentRecord> {
        let row = sqlx::query_as::<_, ReportFileRow>(&format!(
            r#"
            INSERT INTO report_files (grade_id, category, path, url, created_at)
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
        let row = sqlx::query_as::<_, ReportFileRow>(&format!(
            r#"
            UPDATE report_files SET path = $1, url = $2 WHERE id = $3
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
        let result = sqlx::query("DELETE FROM report_files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| MetadataError::Backend(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
