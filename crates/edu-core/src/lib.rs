//! # edu-core
//!
//! Core types for EduRecords RS.
//!
//! This crate provides the foundational building blocks used across all other
//! crates:
//! - Common error types
//! - Core traits (Identifiable and the shared `Id` key type)
//! - Configuration types

pub mod config;
pub mod error;
pub mod traits;

pub use config::*;
pub use error::*;
pub use traits::*;
