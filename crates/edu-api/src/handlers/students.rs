//! Student API handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use edu_core::traits::Id;
use edu_db::{CreateStudentDto, Repository, StudentRepository, UpdateStudentDto};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{AppState, AuthenticatedUser, Envelope, Pagination};

#[derive(Debug, Deserialize)]
pub struct StudentFilters {
    pub class_group_id: Option<Id>,
}

/// List students, optionally scoped to one class group
///
/// GET /api/v1/students
pub async fn list_students(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    pagination: Pagination,
    Query(filters): Query<StudentFilters>,
) -> ApiResult<impl IntoResponse> {
    let repo = StudentRepository::new(state.pool.clone());

    let rows = match filters.class_group_id {
        Some(class_group_id) => repo.find_by_class_group(class_group_id).await?,
        None => repo.find_all(pagination.limit, pagination.offset).await?,
    };

    Ok(Envelope(rows))
}

/// GET /api/v1/students/:id
pub async fn get_student(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let repo = StudentRepository::new(state.pool.clone());

    let row = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Student", id))?;

    Ok(Envelope(row))
}

/// POST /api/v1/students
pub async fn create_student(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(dto): Json<CreateStudentDto>,
) -> ApiResult<impl IntoResponse> {
    let repo = StudentRepository::new(state.pool.clone());
    let row = repo.create(dto).await?;

    Ok((StatusCode::CREATED, Envelope(row)))
}

/// PUT /api/v1/students/:id
pub async fn update_student(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
    Json(dto): Json<UpdateStudentDto>,
) -> ApiResult<impl IntoResponse> {
    let repo = StudentRepository::new(state.pool.clone());
    let row = repo.update(id, dto).await?;

    Ok(Envelope(row))
}

/// DELETE /api/v1/students/:id
pub async fn delete_student(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let repo = StudentRepository::new(state.pool.clone());

    let row = repo
        .delete(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Student", id))?;

    Ok(Envelope(row))
}
