//! Axum extractors and shared application state

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Query},
    http::request::Parts,
};
use edu_attachments::{AttachmentLifecycleManager, LocalObjectStore};
use edu_core::config::AppConfig;
use edu_db::{CourseFileRepository, ReportFileRepository};
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::ApiError;

/// Lifecycle manager over the multi-slot course file family
pub type CourseAttachments = AttachmentLifecycleManager<CourseFileRepository, LocalObjectStore>;
/// Lifecycle manager over the single-slot report file family
pub type ReportAttachments = AttachmentLifecycleManager<ReportFileRepository, LocalObjectStore>;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool: PgPool,
    pub course_attachments: Arc<CourseAttachments>,
    pub report_attachments: Arc<ReportAttachments>,
}

/// JWT claims carried by bearer tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
}

/// The identity a request runs as
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub subject: String,
    pub email: Option<String>,
}

impl CurrentUser {
    /// Identity used when authentication is bypassed outside production
    pub fn anonymous() -> Self {
        Self {
            subject: "anonymous".into(),
            email: None,
        }
    }
}

/// Authenticated user extractor
///
/// Outside production every request passes; in production a valid bearer
/// token is required.
pub struct AuthenticatedUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        if app_state.config.environment.bypasses_authentication() {
            return Ok(AuthenticatedUser(CurrentUser::anonymous()));
        }

        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        let key = DecodingKey::from_secret(app_state.config.auth.jwt_secret.as_bytes());
        let data = jsonwebtoken::decode::<Claims>(token, &key, &Validation::default())
            .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

        Ok(AuthenticatedUser(CurrentUser {
            subject: data.claims.sub,
            email: data.claims.email,
        }))
    }
}

impl std::ops::Deref for AuthenticatedUser {
    type Target = CurrentUser;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Pagination parameters
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

pub struct Pagination(pub PaginationParams);

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<PaginationParams>::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|_| Query(PaginationParams::default()));
        Ok(Pagination(params))
    }
}

impl std::ops::Deref for Pagination {
    type Target = PaginationParams;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Success envelope wrapper
///
/// Every success response leaves as `{ "success": true, "data": ... }`.
pub struct Envelope<T: serde::Serialize>(pub T);

#[derive(Serialize)]
struct EnvelopeBody<T: serde::Serialize> {
    success: bool,
    data: T,
}

impl<T: serde::Serialize> axum::response::IntoResponse for Envelope<T> {
    fn into_response(self) -> axum::response::Response {
        axum::Json(EnvelopeBody {
            success: true,
            data: self.0,
        })
        .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let body = EnvelopeBody {
            success: true,
            data: vec![1, 2, 3],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn test_claims_roundtrip() {
        let claims: Claims =
            serde_json::from_str(r#"{"sub": "admin", "exp": 4102444800}"#).unwrap();
        assert_eq!(claims.sub, "admin");
        assert!(claims.email.is_none());
    }
}
