//! # edu-api
//!
//! REST API handlers for EduRecords RS.
//!
//! All responses share the `{ "success": bool, ... }` JSON envelope. File
//! uploads go through the attachment lifecycle manager in `edu-attachments`;
//! handlers never touch the object store themselves.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod multipart;
pub mod routes;

pub use routes::router;
