//! Class group API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use edu_core::traits::Id;
use edu_db::{ClassGroupRepository, CreateClassGroupDto, Repository, UpdateClassGroupDto};

use crate::error::{ApiError, ApiResult};
use crate::extractors::{AppState, AuthenticatedUser, Envelope, Pagination};

/// GET /api/v1/class_groups
pub async fn list_class_groups(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    pagination: Pagination,
) -> ApiResult<impl IntoResponse> {
    let repo = ClassGroupRepository::new(state.pool.clone());
    let rows = repo.find_all(pagination.limit, pagination.offset).await?;

    Ok(Envelope(rows))
}

/// GET /api/v1/class_groups/:id
pub async fn get_class_group(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let repo = ClassGroupRepository::new(state.pool.clone());

    let row = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Class group", id))?;

    Ok(Envelope(row))
}

/// POST /api/v1/class_groups
pub async fn create_class_group(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(dto): Json<CreateClassGroupDto>,
) -> ApiResult<impl IntoResponse> {
    let repo = ClassGroupRepository::new(state.pool.clone());
    let row = repo.create(dto).await?;

    Ok((StatusCode::CREATED, Envelope(row)))
}

/// PUT /api/v1/class_groups/:id
pub async fn update_class_group(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
    Json(dto): Json<UpdateClassGroupDto>,
) -> ApiResult<impl IntoResponse> {
    let repo = ClassGroupRepository::new(state.pool.clone());
    let row = repo.update(id, dto).await?;

    Ok(Envelope(row))
}

/// DELETE /api/v1/class_groups/:id
pub async fn delete_class_group(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let repo = ClassGroupRepository::new(state.pool.clone());

    let row = repo
        .delete(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Class group", id))?;

    Ok(Envelope(row))
}
