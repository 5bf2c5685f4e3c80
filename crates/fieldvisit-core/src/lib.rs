//! Fieldvisit Core Library
//!
//! This crate provides the domain models, error type, configuration and caller-side
//! validation shared by the recorder, the storage backends and the CLI.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    Attachment, AttachmentSet, Category, Roster, VisitDraft, VisitRecord,
};
pub use storage_types::CollisionPolicy;
