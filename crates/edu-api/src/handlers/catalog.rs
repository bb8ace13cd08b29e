//! Catalog API handlers: programs, levels and prices
//!
//! Three small lookup tables sharing identical CRUD shapes, kept in one
//! module. Prices additionally resolve by (level, program) pairing.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use edu_core::traits::Id;
use edu_db::{
    CreateLevelDto, CreatePriceDto, CreateProgramDto, LevelRepository, PriceRepository,
    ProgramRepository, Repository, UpdateLevelDto, UpdatePriceDto, UpdateProgramDto,
};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{AppState, AuthenticatedUser, Envelope, Pagination};

// --- Programs ---

/// GET /api/v1/programs
pub async fn list_programs(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    pagination: Pagination,
) -> ApiResult<impl IntoResponse> {
    let repo = ProgramRepository::new(state.pool.clone());
    let rows = repo.find_all(pagination.limit, pagination.offset).await?;

    Ok(Envelope(rows))
}

/// GET /api/v1/programs/:id
pub async fn get_program(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let repo = ProgramRepository::new(state.pool.clone());

    let row = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Program", id))?;

    Ok(Envelope(row))
}

/// POST /api/v1/programs
pub async fn create_program(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(dto): Json<CreateProgramDto>,
) -> ApiResult<impl IntoResponse> {
    let repo = ProgramRepository::new(state.pool.clone());
    let row = repo.create(dto).await?;

    Ok((StatusCode::CREATED, Envelope(row)))
}

/// PUT /api/v1/programs/:id
pub async fn update_program(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
    Json(dto): Json<UpdateProgramDto>,
) -> ApiResult<impl IntoResponse> {
    let repo = ProgramRepository::new(state.pool.clone());
    let row = repo.update(id, dto).await?;

    Ok(Envelope(row))
}

/// DELETE /api/v1/programs/:id
pub async fn delete_program(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let repo = ProgramRepository::new(state.pool.clone());

    let row = repo
        .delete(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Program", id))?;

    Ok(Envelope(row))
}

// --- Levels ---

/// GET /api/v1/levels
pub async fn list_levels(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    pagination: Pagination,
) -> ApiResult<impl IntoResponse> {
    let repo = LevelRepository::new(state.pool.clone());
    let rows = repo.find_all(pagination.limit, pagination.offset).await?;

    Ok(Envelope(rows))
}

/// GET /api/v1/levels/:id
pub async fn get_level(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let repo = LevelRepository::new(state.pool.clone());

    let row = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Level", id))?;

    Ok(Envelope(row))
}

/// POST /api/v1/levels
pub async fn create_level(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(dto): Json<CreateLevelDto>,
) -> ApiResult<impl IntoResponse> {
    let repo = LevelRepository::new(state.pool.clone());
    let row = repo.create(dto).await?;

    Ok((StatusCode::CREATED, Envelope(row)))
}

/// PUT /api/v1/levels/:id
pub async fn update_level(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
    Json(dto): Json<UpdateLevelDto>,
) -> ApiResult<impl IntoResponse> {
    let repo = LevelRepository::new(state.pool.clone());
    let row = repo.update(id, dto).await?;

    Ok(Envelope(row))
}

/// DELETE /api/v1/levels/:id
pub async fn delete_level(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let repo = LevelRepository::new(state.pool.clone());

    let row = repo
        .delete(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Level", id))?;

    Ok(Envelope(row))
}

// --- Prices ---

#[derive(Debug, Deserialize)]
pub struct PriceFilters {
    pub level_id: Option<Id>,
    pub program_id: Option<Id>,
}

/// List prices, or resolve one by (level, program) pairing
///
/// GET /api/v1/prices
pub async fn list_prices(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    pagination: Pagination,
    Query(filters): Query<PriceFilters>,
) -> ApiResult<impl IntoResponse> {
    let repo = PriceRepository::new(state.pool.clone());

    if let (Some(level_id), Some(program_id)) = (filters.level_id, filters.program_id) {
        let row = repo
            .find_for_pairing(level_id, program_id)
            .await?
            .ok_or_else(|| {
                ApiError::not_found("Price", format!("level {} program {}", level_id, program_id))
            })?;
        return Ok(Envelope(vec![row]));
    }

    let rows = repo.find_all(pagination.limit, pagination.offset).await?;
    Ok(Envelope(rows))
}

/// GET /api/v1/prices/:id
pub async fn get_price(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let repo = PriceRepository::new(state.pool.clone());

    let row = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Price", id))?;

    Ok(Envelope(row))
}

/// POST /api/v1/prices
pub async fn create_price(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(dto): Json<CreatePriceDto>,
) -> ApiResult<impl IntoResponse> {
    let repo = PriceRepository::new(state.pool.clone());
    let row = repo.create(dto).await?;

    Ok((StatusCode::CREATED, Envelope(row)))
}

/// PUT /api/v1/prices/:id
pub async fn update_price(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
    Json(dto): Json<UpdatePriceDto>,
) -> ApiResult<impl IntoResponse> {
    let repo = PriceRepository::new(state.pool.clone());
    let row = repo.update(id, dto).await?;

    Ok(Envelope(row))
}

/// DELETE /api/v1/prices/:id
pub async fn delete_price(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let repo = PriceRepository::new(state.pool.clone());

    let row = repo
        .delete(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Price", id))?;

    Ok(Envelope(row))
}
