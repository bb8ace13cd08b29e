//! Multipart form helpers
//!
//! Upload endpoints receive entity fields and file parts in one multipart
//! body. Text parts arrive as strings regardless of the column type, so the
//! handlers parse them explicitly; these helpers keep that parsing uniform.

use std::str::FromStr;

use axum::extract::multipart::{Field, MultipartError};
use bytes::Bytes;
use chrono::NaiveDate;

use crate::error::ApiError;

/// One file part lifted out of a multipart body
#[derive(Debug)]
pub struct UploadedFile {
    /// Form field name, used as the attachment category
    pub field: String,
    pub filename: Option<String>,
    pub data: Bytes,
}

pub async fn read_file(field: Field<'_>) -> Result<UploadedFile, ApiError> {
    let name = field.name().unwrap_or("file").to_string();
    let filename = field.file_name().map(str::to_string);
    let data = field.bytes().await.map_err(bad_part)?;

    Ok(UploadedFile {
        field: name,
        filename,
        data,
    })
}

/// Blank text parts mean "no value", the same coercion the JSON DTOs apply
pub fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn parse_opt<T: FromStr>(value: String, field: &str) -> Result<Option<T>, ApiError> {
    match non_blank(value) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("Invalid value for {}", field))),
    }
}

pub fn parse_date_opt(value: String, field: &str) -> Result<Option<NaiveDate>, ApiError> {
    match non_blank(value) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("Invalid date for {}", field))),
    }
}

pub fn bad_part(err: MultipartError) -> ApiError {
    ApiError::bad_request(format!("Malformed multipart body: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank_trims() {
        assert_eq!(non_blank("  hi ".into()), Some("hi".to_string()));
        assert_eq!(non_blank("   ".into()), None);
    }

    #[test]
    fn test_parse_opt() {
        assert_eq!(parse_opt::<i64>("12".into(), "id").unwrap(), Some(12));
        assert_eq!(parse_opt::<i64>("".into(), "id").unwrap(), None);
        assert!(parse_opt::<i64>("twelve".into(), "id").is_err());
    }

    #[test]
    fn test_parse_date_opt() {
        let date = parse_date_opt("2024-03-01".into(), "upload_date")
            .unwrap()
            .unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(parse_date_opt("01/03/2024".into(), "upload_date").is_err());
    }
}
