//! Grade API handlers
//!
//! A grade owns at most one report file. Creation attaches via lifecycle
//! `create`; later uploads for the same grade go through `replace`, which
//! swaps the object and keeps the row identity.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use edu_attachments::{AttachmentRecord, CleanupCoordinator};
use edu_core::traits::Id;
use edu_db::{CreateGradeDto, GradeRepository, GradeRow, Repository, UpdateGradeDto};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{AppState, AuthenticatedUser, Envelope, Pagination};
use crate::multipart::{bad_part, non_blank, parse_date_opt, parse_opt, read_file, UploadedFile};

#[derive(Debug, Deserialize)]
pub struct GradeFilters {
    pub student_id: Option<Id>,
}

#[derive(Debug, Serialize)]
pub struct GradeWithReport {
    #[serde(flatten)]
    pub grade: GradeRow,
    pub report: Option<AttachmentRecord>,
}

async fn with_report(state: &AppState, grade: GradeRow) -> ApiResult<GradeWithReport> {
    let report = state
        .report_attachments
        .find_by_parent(grade.id)
        .await?
        .into_iter()
        .next();
    Ok(GradeWithReport { grade, report })
}

/// List grades, optionally scoped to one student
///
/// GET /api/v1/grades
pub async fn list_grades(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    pagination: Pagination,
    Query(filters): Query<GradeFilters>,
) -> ApiResult<impl IntoResponse> {
    let repo = GradeRepository::new(state.pool.clone());

    let rows = match filters.student_id {
        Some(student_id) => repo.find_by_student(student_id).await?,
        None => repo.find_all(pagination.limit, pagination.offset).await?,
    };

    let mut grades = Vec::with_capacity(rows.len());
    for row in rows {
        grades.push(with_report(&state, row).await?);
    }

    Ok(Envelope(grades))
}

/// GET /api/v1/grades/:id
pub async fn get_grade(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let repo = GradeRepository::new(state.pool.clone());

    let row = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Grade", id))?;

    Ok(Envelope(with_report(&state, row).await?))
}

#[derive(Debug, Default)]
struct GradeForm {
    student_id: Option<Id>,
    test_type: Option<String>,
    listening_score: Option<f64>,
    reading_score: Option<f64>,
    speaking_score: Option<f64>,
    writing_score: Option<f64>,
    final_score: Option<f64>,
    description: Option<String>,
    date_taken: Option<NaiveDate>,
    report: Option<UploadedFile>,
}

async fn read_grade_form(mut multipart: Multipart) -> ApiResult<GradeForm> {
    let mut form = GradeForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_part)? {
        if field.file_name().is_some() {
            // Last file part wins; a grade has a single report slot
            form.report = Some(read_file(field).await?);
            continue;
        }

        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.map_err(bad_part)?;
        match name.as_str() {
            "student_id" => form.student_id = parse_opt(value, "student_id")?,
            "test_type" => form.test_type = non_blank(value),
            "listening_score" => form.listening_score = parse_opt(value, "listening_score")?,
            "reading_score" => form.reading_score = parse_opt(value, "reading_score")?,
            "speaking_score" => form.speaking_score = parse_opt(value, "speaking_score")?,
            "writing_score" => form.writing_score = parse_opt(value, "writing_score")?,
            "final_score" => form.final_score = parse_opt(value, "final_score")?,
            "description" => form.description = non_blank(value),
            "date_taken" => form.date_taken = parse_date_opt(value, "date_taken")?,
            _ => {}
        }
    }

    Ok(form)
}

/// Create a grade, attaching the report file if one was uploaded
///
/// POST /api/v1/grades
pub async fn create_grade(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = read_grade_form(multipart).await?;

    let student_id = form
        .student_id
        .ok_or_else(|| ApiError::bad_request("student_id is required for a new grade"))?;
    let test_type = form
        .test_type
        .ok_or_else(|| ApiError::bad_request("test_type is required for a new grade"))?;

    let repo = GradeRepository::new(state.pool.clone());
    let row = repo
        .create(CreateGradeDto {
            student_id,
            test_type,
            listening_score: form.listening_score,
            reading_score: form.reading_score,
            speaking_score: form.speaking_score,
            writing_score: form.writing_score,
            final_score: form.final_score,
            description: form.description,
            date_taken: form.date_taken,
        })
        .await?;

    if let Some(report) = form.report {
        state
            .report_attachments
            .create(row.id, &row.test_type, report.data)
            .await?;
    }

    Ok((StatusCode::CREATED, Envelope(with_report(&state, row).await?)))
}

/// Update a grade; a new report file replaces the existing one
///
/// PUT /api/v1/grades/:id
pub async fn update_grade(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = read_grade_form(multipart).await?;

    let repo = GradeRepository::new(state.pool.clone());
    let row = repo
        .update(
            id,
            UpdateGradeDto {
                student_id: form.student_id,
                test_type: form.test_type,
                listening_score: form.listening_score,
                reading_score: form.reading_score,
                speaking_score: form.speaking_score,
                writing_score: form.writing_score,
                final_score: form.final_score,
                description: form.description,
                date_taken: form.date_taken,
            },
        )
        .await?;

    if let Some(report) = form.report {
        state
            .report_attachments
            .replace(row.id, &row.test_type, report.data)
            .await?;
    }

    Ok(Envelope(with_report(&state, row).await?))
}

/// Cascade-delete a grade's report file, then remove the row
///
/// DELETE /api/v1/grades/:id
pub async fn delete_grade(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let repo = GradeRepository::new(state.pool.clone());

    repo.find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Grade", id))?;

    let coordinator = CleanupCoordinator::new(state.report_attachments.clone());
    let outcome = coordinator.purge_parent(id).await?;
    if !outcome.is_clean() {
        warn!(
            grade_id = id,
            failed = outcome.failures.len(),
            "Report file could not be deleted"
        );
        return Err(ApiError::internal("Failed to delete the grade's report file"));
    }

    let row = repo
        .delete(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Grade", id))?;

    Ok(Envelope(row))
}
