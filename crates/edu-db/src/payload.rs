//! Deserialization helpers for write payloads
//!
//! The create/update DTO structs are the allow list: unknown fields in a
//! request body are ignored by serde, and only declared fields reach SQL.
//! These helpers add the coercions the DTO types cannot express on their
//! own, chiefly treating whitespace-only strings as absent.
//!
//! On updates, absent and blank both mean "leave the column as is": the
//! repositories apply changes with COALESCE, so a PUT cannot clear a
//! nullable column back to NULL.

use serde::{Deserialize, Deserializer};

/// Deserialize an optional string, mapping empty or whitespace-only input
/// to `None`
pub fn empty_to_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Payload {
        #[serde(default, deserialize_with = "empty_to_none")]
        description: Option<String>,
    }

    #[test]
    fn test_empty_string_becomes_none() {
        let p: Payload = serde_json::from_str(r#"{"description": "   "}"#).unwrap();
        assert_eq!(p.description, None);

        let p: Payload = serde_json::from_str(r#"{"description": "text"}"#).unwrap();
        assert_eq!(p.description, Some("text".to_string()));

        let p: Payload = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(p.description, None);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let p: Payload =
            serde_json::from_str(r#"{"description": "x", "role": "admin"}"#).unwrap();
        assert_eq!(p.description, Some("x".to_string()));
    }
}
