//! Storage abstraction trait
//!
//! This module defines the Storage trait the recorder writes visit photos through.

use async_trait::async_trait;
use fieldvisit_core::AppError;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UploadFailed(msg) => AppError::Upload(msg),
            StorageError::ConfigError(msg) => AppError::Config(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Storage abstraction trait
///
/// The recorder only deals in keys (see the crate root for the layout); turning a
/// key into a concrete location is up to the backend.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` at `key`, replacing any existing file. Returns the number of bytes written.
    async fn write(&self, key: &str, data: Vec<u8>) -> StorageResult<u64>;

    /// Read the file stored at `key`
    async fn read(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Check if a file or directory exists at `key`
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Create the directory at `key` and its parents. Succeeds if it already exists.
    async fn create_dir(&self, key: &str) -> StorageResult<()>;

    /// Keys of every file below `prefix`, recursively, sorted.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Backend-specific location of `key` (a filesystem path for local storage).
    fn location(&self, key: &str) -> StorageResult<String>;
}
