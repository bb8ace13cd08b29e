//! API error handling
//!
//! Every error leaves the API as the same JSON envelope the success path
//! uses, with `success: false` and a message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use edu_attachments::{AttachmentError, MetadataError};
use edu_core::error::ValidationErrors;
use edu_db::RepositoryError;
use serde::Serialize;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Validation(ValidationErrors),
    Unauthorized(String),
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    pub fn not_found(resource: &'static str, id: impl std::fmt::Display) -> Self {
        ApiError::NotFound(format!("{} with id {} not found", resource, id))
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Validation(errors) => errors.full_messages().join(", "),
            ApiError::NotFound(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg) => msg.clone(),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => ApiError::NotFound(msg),
            RepositoryError::Validation(msg) => ApiError::bad_request(msg),
            RepositoryError::Conflict(msg) => ApiError::conflict(msg),
            RepositoryError::Database(e) => ApiError::internal(format!("Database error: {}", e)),
        }
    }
}

impl From<AttachmentError> for ApiError {
    fn from(err: AttachmentError) -> Self {
        match &err {
            AttachmentError::Validation(msg) => ApiError::bad_request(msg.clone()),
            AttachmentError::Metadata {
                source: MetadataError::Conflict(parent_id),
                ..
            } => ApiError::conflict(format!("Duplicate attachment for parent {}", parent_id)),
            _ => ApiError::internal(err.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorEnvelope {
            success: false,
            message: self.message(),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::not_found("Student", 7).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::unauthorized("no token").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::bad_request("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_repository_error_mapping() {
        let err: ApiError = RepositoryError::Validation("title is required".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: ApiError = RepositoryError::Conflict("duplicate".into()).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_attachment_error_mapping() {
        let err: ApiError = AttachmentError::Validation("empty category".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: ApiError = AttachmentError::Metadata {
            parent_id: 7,
            source: MetadataError::Conflict(7),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err: ApiError = AttachmentError::Metadata {
            parent_id: 7,
            source: MetadataError::Backend("connection reset".into()),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
