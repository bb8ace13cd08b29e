//! # edu-attachments
//!
//! Attachment lifecycle management for EduRecords RS.
//!
//! Uploaded files live in two places at once: a metadata row in PostgreSQL
//! and a binary object in the object store. The two backends fail
//! independently and share no transaction coordinator, so this crate owns
//! the ordering, compensation and failure policy that keeps them consistent:
//!
//! - [`PathNamer`] builds collision-free storage keys
//! - [`ObjectStore`] adapts the object-storage backend (put / remove / URL)
//! - [`MetadataRepository`] adapts the relational side, typed per family
//! - [`AttachmentLifecycleManager`] orchestrates create / replace / delete
//! - [`CleanupCoordinator`] fans out deletion when a parent record dies

pub mod cleanup;
pub mod lifecycle;
pub mod model;
pub mod path;
pub mod repository;
pub mod store;

pub use cleanup::{CascadeOutcome, CleanupCoordinator};
pub use lifecycle::{AttachmentError, AttachmentLifecycleManager, AttachmentResult};
pub use model::{AttachmentRecord, Bucket, NewAttachment, SlotPolicy};
pub use path::{format_path, PathNamer};
pub use repository::{MemoryMetadataRepository, MetadataError, MetadataRepository, MetadataResult};
pub use store::{LocalObjectStore, MemoryObjectStore, ObjectStore, StoreError};
