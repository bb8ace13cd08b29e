//! Course API handlers
//!
//! Courses carry any number of attached files; uploads ride along in the
//! same multipart body as the entity fields. File parts go through the
//! attachment lifecycle manager, never to the object store directly.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use edu_attachments::{AttachmentRecord, CleanupCoordinator};
use edu_core::traits::Id;
use edu_db::{CourseRepository, CourseRow, CreateCourseDto, Repository, UpdateCourseDto};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{AppState, AuthenticatedUser, Envelope, Pagination};
use crate::multipart::{bad_part, non_blank, parse_date_opt, parse_opt, read_file, UploadedFile};

#[derive(Debug, Deserialize)]
pub struct CourseFilters {
    pub class_group_id: Option<Id>,
}

#[derive(Debug, Serialize)]
pub struct CourseWithFiles {
    #[serde(flatten)]
    pub course: CourseRow,
    pub files: Vec<AttachmentRecord>,
}

async fn with_files(state: &AppState, course: CourseRow) -> ApiResult<CourseWithFiles> {
    let files = state.course_attachments.find_by_parent(course.id).await?;
    Ok(CourseWithFiles { course, files })
}

/// List courses, optionally scoped to one class group
///
/// GET /api/v1/courses
pub async fn list_courses(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    pagination: Pagination,
    Query(filters): Query<CourseFilters>,
) -> ApiResult<impl IntoResponse> {
    let repo = CourseRepository::new(state.pool.clone());

    let rows = match filters.class_group_id {
        Some(class_group_id) => repo.find_by_class_group(class_group_id).await?,
        None => repo.find_all(pagination.limit, pagination.offset).await?,
    };

    let mut courses = Vec::with_capacity(rows.len());
    for row in rows {
        courses.push(with_files(&state, row).await?);
    }

    Ok(Envelope(courses))
}

/// GET /api/v1/courses/:id
pub async fn get_course(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let repo = CourseRepository::new(state.pool.clone());

    let row = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course", id))?;

    Ok(Envelope(with_files(&state, row).await?))
}

#[derive(Debug, Default)]
struct CourseForm {
    title: Option<String>,
    course_code: Option<String>,
    description: Option<String>,
    video_link: Option<String>,
    upload_date: Option<chrono::NaiveDate>,
    class_group_id: Option<Id>,
    files: Vec<UploadedFile>,
}

async fn read_course_form(mut multipart: Multipart) -> ApiResult<CourseForm> {
    let mut form = CourseForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_part)? {
        if field.file_name().is_some() {
            form.files.push(read_file(field).await?);
            continue;
        }

        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.map_err(bad_part)?;
        match name.as_str() {
            "title" => form.title = non_blank(value),
            "course_code" => form.course_code = non_blank(value),
            "description" => form.description = non_blank(value),
            "video_link" => form.video_link = non_blank(value),
            "upload_date" => form.upload_date = parse_date_opt(value, "upload_date")?,
            "class_group_id" => form.class_group_id = parse_opt(value, "class_group_id")?,
            // Unknown fields are dropped, same as the JSON allow-list
            _ => {}
        }
    }

    Ok(form)
}

/// Create a course and attach any uploaded files
///
/// POST /api/v1/courses
pub async fn create_course(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = read_course_form(multipart).await?;

    let title = form
        .title
        .ok_or_else(|| ApiError::bad_request("title is required for a new course"))?;

    let repo = CourseRepository::new(state.pool.clone());
    let row = repo
        .create(CreateCourseDto {
            title,
            course_code: form.course_code,
            description: form.description,
            video_link: form.video_link,
            upload_date: form.upload_date,
            class_group_id: form.class_group_id,
        })
        .await?;

    for file in form.files {
        state
            .course_attachments
            .create(row.id, &file.field, file.data)
            .await?;
    }

    Ok((StatusCode::CREATED, Envelope(with_files(&state, row).await?)))
}

/// Update a course; uploaded files are attached as additional slots
///
/// PUT /api/v1/courses/:id
pub async fn update_course(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = read_course_form(multipart).await?;

    let repo = CourseRepository::new(state.pool.clone());
    let row = repo
        .update(
            id,
            UpdateCourseDto {
                title: form.title,
                course_code: form.course_code,
                description: form.description,
                video_link: form.video_link,
                upload_date: form.upload_date,
                class_group_id: form.class_group_id,
            },
        )
        .await?;

    for file in form.files {
        state
            .course_attachments
            .create(row.id, &file.field, file.data)
            .await?;
    }

    Ok(Envelope(with_files(&state, row).await?))
}

/// Cascade-delete a course's attachments, then remove the row
///
/// DELETE /api/v1/courses/:id
pub async fn delete_course(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let repo = CourseRepository::new(state.pool.clone());

    repo.find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course", id))?;

    let coordinator = CleanupCoordinator::new(state.course_attachments.clone());
    let outcome = coordinator.purge_parent(id).await?;
    if !outcome.is_clean() {
        warn!(
            course_id = id,
            failed = outcome.failures.len(),
            "Some course attachments could not be deleted"
        );
        return Err(ApiError::internal(format!(
            "Failed to delete {} of {} attachments",
            outcome.failures.len(),
            outcome.attempted
        )));
    }

    let row = repo
        .delete(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course", id))?;

    Ok(Envelope(row))
}
