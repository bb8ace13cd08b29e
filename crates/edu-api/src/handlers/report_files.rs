//! Report file API handlers
//!
//! Read-only: report files are created and replaced through the grade
//! endpoints, never written here.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use edu_core::traits::Id;
use edu_db::ReportFileRepository;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{AppState, AuthenticatedUser, Envelope, Pagination};

/// GET /api/v1/report_files
pub async fn list_report_files(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    pagination: Pagination,
) -> ApiResult<impl IntoResponse> {
    let repo = ReportFileRepository::new(state.pool.clone());
    let rows = repo.find_all(pagination.limit, pagination.offset).await?;

    Ok(Envelope(rows))
}

/// GET /api/v1/report_files/:id
pub async fn get_report_file(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let repo = ReportFileRepository::new(state.pool.clone());

    let row = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Report file", id))?;

    Ok(Envelope(row))
}
