#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "remote-s3")]
use crate::{ObjectStoreUploader, RemoteUploader};
use crate::{Storage, StorageError, StorageResult};
use fieldvisit_core::Config;
use std::sync::Arc;

/// Create the storage visit photos are written to, rooted at the configured base directory.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    #[cfg(feature = "storage-local")]
    {
        let storage = LocalStorage::new(config.base_dir()).await?;
        Ok(Arc::new(storage))
    }

    #[cfg(not(feature = "storage-local"))]
    {
        let _ = config;
        Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        ))
    }
}

/// Create the remote uploader, or `None` when uploads are disabled.
#[cfg(feature = "remote-s3")]
pub fn create_uploader(config: &Config) -> StorageResult<Option<Arc<dyn RemoteUploader>>> {
    if !config.upload_enabled() {
        return Ok(None);
    }

    let bucket = config
        .s3_bucket()
        .map(String::from)
        .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
    let region = config
        .s3_region()
        .map(String::from)
        .or_else(|| config.aws_region().map(String::from))
        .ok_or_else(|| {
            StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
        })?;
    let endpoint = config.s3_endpoint().map(String::from);

    let uploader = ObjectStoreUploader::s3(bucket, region, endpoint)?;
    Ok(Some(Arc::new(uploader)))
}
