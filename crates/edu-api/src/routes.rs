//! API routes

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;

use crate::extractors::AppState;
use crate::handlers::{
    catalog, class_groups, courses, grades, lecturers, report_files, students,
};

/// Create the complete API router
pub fn router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_router())
}

fn api_v1_router() -> Router<AppState> {
    Router::new()
        .route("/", get(api_root))
        .nest("/students", students_router())
        .nest("/lecturers", lecturers_router())
        .nest("/class_groups", class_groups_router())
        .nest("/programs", programs_router())
        .nest("/levels", levels_router())
        .nest("/prices", prices_router())
        .nest("/courses", courses_router())
        .nest("/grades", grades_router())
        .nest("/report_files", report_files_router())
}

fn students_router() -> Router<AppState> {
    Router::new()
        .route("/", get(students::list_students))
        .route("/", post(students::create_student))
        .route("/:id", get(students::get_student))
        .route("/:id", put(students::update_student))
        .route("/:id", delete(students::delete_student))
}

fn lecturers_router() -> Router<AppState> {
    Router::new()
        .route("/", get(lecturers::list_lecturers))
        .route("/", post(lecturers::create_lecturer))
        .route("/:id", get(lecturers::get_lecturer))
        .route("/:id", put(lecturers::update_lecturer))
        .route("/:id", delete(lecturers::delete_lecturer))
}

fn class_groups_router() -> Router<AppState> {
    Router::new()
        .route("/", get(class_groups::list_class_groups))
        .route("/", post(class_groups::create_class_group))
        .route("/:id", get(class_groups::get_class_group))
        .route("/:id", put(class_groups::update_class_group))
        .route("/:id", delete(class_groups::delete_class_group))
}

fn programs_router() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::list_programs))
        .route("/", post(catalog::create_program))
        .route("/:id", get(catalog::get_program))
        .route("/:id", put(catalog::update_program))
        .route("/:id", delete(catalog::delete_program))
}

fn levels_router() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::list_levels))
        .route("/", post(catalog::create_level))
        .route("/:id", get(catalog::get_level))
        .route("/:id", put(catalog::update_level))
        .route("/:id", delete(catalog::delete_level))
}

fn prices_router() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::list_prices))
        .route("/", post(catalog::create_price))
        .route("/:id", get(catalog::get_price))
        .route("/:id", put(catalog::update_price))
        .route("/:id", delete(catalog::delete_price))
}

fn courses_router() -> Router<AppState> {
    Router::new()
        .route("/", get(courses::list_courses))
        .route("/", post(courses::create_course))
        .route("/:id", get(courses::get_course))
        .route("/:id", put(courses::update_course))
        .route("/:id", delete(courses::delete_course))
}

fn grades_router() -> Router<AppState> {
    Router::new()
        .route("/", get(grades::list_grades))
        .route("/", post(grades::create_grade))
        .route("/:id", get(grades::get_grade))
        .route("/:id", put(grades::update_grade))
        .route("/:id", delete(grades::delete_grade))
}

fn report_files_router() -> Router<AppState> {
    Router::new()
        .route("/", get(report_files::list_report_files))
        .route("/:id", get(report_files::get_report_file))
}

async fn api_root() -> axum::Json<ApiRoot> {
    axum::Json(ApiRoot {
        success: true,
        name: "EduRecords RS".into(),
    })
}

#[derive(Serialize)]
struct ApiRoot {
    success: bool,
    name: String,
}
