//! Attachment domain types

use chrono::{DateTime, Utc};
use edu_core::traits::{Id, Identifiable};
use serde::{Deserialize, Serialize};

/// Object-store namespace an attachment family writes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Courses,
    Reports,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Courses => "courses",
            Self::Reports => "reports",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cardinality policy of an attachment family
///
/// Report files allow at most one attachment per grade; course files are
/// unbounded and each upload is independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPolicy {
    Single,
    Multi,
}

/// Metadata row linking a parent record to a stored object
///
/// `path` is the sole pointer to the binary object; a record without a
/// backing object (or the reverse) is an orphan the lifecycle manager works
/// to avoid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub id: Id,
    pub parent_id: Id,
    pub category: String,
    pub path: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl Identifiable for AttachmentRecord {
    fn id(&self) -> Option<Id> {
        Some(self.id)
    }
}

/// Fields for inserting a new attachment row
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub parent_id: Id,
    pub category: String,
    pub path: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_names() {
        assert_eq!(Bucket::Courses.as_str(), "courses");
        assert_eq!(Bucket::Reports.to_string(), "reports");
    }
}
