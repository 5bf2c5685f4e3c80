//! Fieldvisit Storage Library
//!
//! This crate provides the storage abstraction the recorder writes visit photos
//! through, its local filesystem implementation, and the remote uploader used to
//! push a recorded visit to object storage.
//!
//! # Key layout
//!
//! Keys are relative, `/`-separated paths under the storage root:
//!
//! - **Visit directory**: `fotos/{YYYY-MM-DD_HH-MM}`
//! - **Category directory**: `fotos/{visit}/{category}`
//! - **Photo**: `fotos/{visit}/{category}/{category}_{n}.jpg`
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in the
//! `keys` module so the recorder and every backend stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "remote-s3")]
pub mod remote;
pub mod traits;
mod walk;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "remote-s3")]
pub use factory::create_uploader;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "remote-s3")]
pub use remote::{upload_submission, ObjectStoreUploader, RemoteUploader, UploadReport};
pub use traits::{Storage, StorageError, StorageResult};
