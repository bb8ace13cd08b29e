//! Core error types for EduRecords RS

use std::collections::HashMap;
use thiserror::Error;

/// Core error type shared across layers
#[derive(Error, Debug)]
pub enum EduError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Conflict: {message}")]
    Conflict { message: String },
}

/// Validation errors collection keyed by field name
#[derive(Error, Debug, Default, Clone)]
#[error("Validation errors: {errors:?}")]
pub struct ValidationErrors {
    /// Field-specific errors: field_name -> Vec<error_messages>
    pub errors: HashMap<String, Vec<String>>,
    /// Base errors not tied to a specific field
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        for (field, field_messages) in &self.errors {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }
}

/// HTTP status code mapping for errors
impl EduError {
    pub fn status_code(&self) -> u16 {
        match self {
            EduError::NotFound { .. } => 404,
            EduError::Unauthorized { .. } => 401,
            EduError::Validation(_) => 422,
            EduError::Conflict { .. } => 409,
            EduError::Database(_) | EduError::Internal(_) | EduError::Config(_) => 500,
            EduError::Storage(_) => 502,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            EduError::NotFound { .. } => "not_found",
            EduError::Unauthorized { .. } => "unauthorized",
            EduError::Validation(_) => "validation_failed",
            EduError::Database(_) => "database_error",
            EduError::Storage(_) => "storage_error",
            EduError::Internal(_) => "internal_error",
            EduError::Config(_) => "configuration_error",
            EduError::Conflict { .. } => "conflict",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_collect() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());

        errors.add("title", "is required");
        errors.add_base("payload is malformed");

        assert!(!errors.is_empty());
        let messages = errors.full_messages();
        assert!(messages.contains(&"payload is malformed".to_string()));
        assert!(messages.contains(&"title is required".to_string()));
    }

    #[test]
    fn test_status_codes() {
        let not_found = EduError::NotFound {
            entity: "Student",
            field: "id",
            value: "7".into(),
        };
        assert_eq!(not_found.status_code(), 404);
        assert_eq!(not_found.error_code(), "not_found");

        let storage = EduError::Storage("bucket unreachable".into());
        assert_eq!(storage.status_code(), 502);
    }
}
