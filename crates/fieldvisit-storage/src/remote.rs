//! Upload of a recorded visit to object storage.
//!
//! Credentials are never handled here: the S3 client picks them up from the
//! environment and the usual AWS credential chain.

use crate::traits::{StorageError, StorageResult};
use crate::walk::walk_files;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutOptions, PutPayload};
use std::path::Path;
use std::sync::Arc;

/// Pushes local files into a remote folder.
#[async_trait]
pub trait RemoteUploader: Send + Sync {
    /// Upload the file at `local_path` as `{remote_folder}/{relative_name}`.
    /// Returns the remote key.
    async fn upload_file(
        &self,
        remote_folder: &str,
        relative_name: &str,
        local_path: &Path,
    ) -> StorageResult<String>;
}

/// Uploader backed by any `object_store` implementation (S3 in production).
#[derive(Clone)]
pub struct ObjectStoreUploader {
    store: Arc<dyn ObjectStore>,
    target: String,
}

impl ObjectStoreUploader {
    /// Wrap an existing object store. `target` is only used in log lines.
    pub fn new(store: Arc<dyn ObjectStore>, target: impl Into<String>) -> Self {
        Self {
            store,
            target: target.into(),
        }
    }

    /// Create an uploader for an S3 bucket
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn s3(bucket: String, region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self::new(Arc::new(store), format!("s3://{}", bucket)))
    }
}

fn remote_key(remote_folder: &str, relative_name: &str) -> String {
    format!(
        "{}/{}",
        remote_folder.trim_matches('/'),
        relative_name.trim_start_matches('/')
    )
}

#[async_trait]
impl RemoteUploader for ObjectStoreUploader {
    async fn upload_file(
        &self,
        remote_folder: &str,
        relative_name: &str,
        local_path: &Path,
    ) -> StorageResult<String> {
        let data = tokio::fs::read(local_path).await.map_err(|e| {
            StorageError::ReadFailed(format!(
                "Failed to read {} for upload: {}",
                local_path.display(),
                e
            ))
        })?;
        let size = data.len();
        let key = remote_key(remote_folder, relative_name);
        let location = ObjectPath::from(key.as_str());

        let start = std::time::Instant::now();

        self.store
            .put_opts(
                &location,
                PutPayload::from(Bytes::from(data)),
                PutOptions::default(),
            )
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    target_store = %self.target,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Remote upload failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        tracing::info!(
            target_store = %self.target,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Remote upload successful"
        );

        Ok(key)
    }
}

/// Remote keys written by [`upload_submission`], ledger first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub uploaded: Vec<String>,
}

/// Upload the ledger and every photo of one visit.
///
/// The ledger lands at `{remote_folder}/{ledger file name}`; photos keep their
/// position below the visit directory, i.e.
/// `{remote_folder}/{visit dir}/{category}/{file}`. Stops at the first failure.
pub async fn upload_submission(
    uploader: &dyn RemoteUploader,
    remote_folder: &str,
    ledger_path: &Path,
    visit_dir: &Path,
) -> StorageResult<UploadReport> {
    let mut report = UploadReport::default();

    let ledger_name = file_name(ledger_path)?;
    report
        .uploaded
        .push(uploader.upload_file(remote_folder, &ledger_name, ledger_path).await?);

    let visit_name = file_name(visit_dir)?;
    for path in walk_files(visit_dir).await? {
        let relative = path
            .strip_prefix(visit_dir)
            .map_err(|e| StorageError::InvalidKey(e.to_string()))?;
        let parts: Option<Vec<&str>> = relative.iter().map(|p| p.to_str()).collect();
        let parts = parts.ok_or_else(|| {
            StorageError::InvalidKey(format!("Non UTF-8 path: {}", path.display()))
        })?;
        let name = format!("{}/{}", visit_name, parts.join("/"));
        report
            .uploaded
            .push(uploader.upload_file(remote_folder, &name, &path).await?);
    }

    tracing::info!(
        remote_folder = %remote_folder,
        visit_dir = %visit_dir.display(),
        files = report.uploaded.len(),
        "Visit uploaded"
    );

    Ok(report)
}

fn file_name(path: &Path) -> StorageResult<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(String::from)
        .ok_or_else(|| StorageError::InvalidKey(format!("No file name in {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;
    use object_store::GetOptions;
    use tempfile::tempdir;

    async fn fetch(store: &Arc<dyn ObjectStore>, key: &str) -> Vec<u8> {
        store
            .get_opts(&ObjectPath::from(key), GetOptions::default())
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap()
            .to_vec()
    }

    #[test]
    fn remote_key_joins_without_double_slashes() {
        assert_eq!(remote_key("/evidence/", "a/b.jpg"), "evidence/a/b.jpg");
        assert_eq!(remote_key("evidence", "/ledger.xlsx"), "evidence/ledger.xlsx");
    }

    #[tokio::test]
    async fn upload_file_puts_content() {
        let dir = tempdir().unwrap();
        let local = dir.path().join("facade_1.jpg");
        tokio::fs::write(&local, b"photo").await.unwrap();

        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let uploader = ObjectStoreUploader::new(Arc::clone(&store), "memory");

        let key = uploader
            .upload_file("evidence", "facade_1.jpg", &local)
            .await
            .unwrap();
        assert_eq!(key, "evidence/facade_1.jpg");
        assert_eq!(fetch(&store, &key).await, b"photo");
    }

    #[tokio::test]
    async fn upload_missing_file_fails() {
        let dir = tempdir().unwrap();
        let uploader = ObjectStoreUploader::new(Arc::new(InMemory::new()), "memory");
        let result = uploader
            .upload_file("evidence", "x.jpg", &dir.path().join("x.jpg"))
            .await;
        assert!(matches!(result, Err(StorageError::ReadFailed(_))));
    }

    #[tokio::test]
    async fn upload_submission_sends_ledger_and_photos() {
        let dir = tempdir().unwrap();
        let ledger = dir.path().join("dados_campo.xlsx");
        tokio::fs::write(&ledger, b"visit_date\n").await.unwrap();

        let visit = dir.path().join("fotos").join("2024-03-05_14-07");
        tokio::fs::create_dir_all(visit.join("access")).await.unwrap();
        tokio::fs::create_dir_all(visit.join("traces")).await.unwrap();
        tokio::fs::write(visit.join("access/access_1.jpg"), b"a1").await.unwrap();
        tokio::fs::write(visit.join("access/access_2.jpg"), b"a2").await.unwrap();

        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let uploader = ObjectStoreUploader::new(Arc::clone(&store), "memory");

        let report = upload_submission(&uploader, "evidence", &ledger, &visit)
            .await
            .unwrap();

        assert_eq!(
            report.uploaded,
            vec![
                "evidence/dados_campo.xlsx".to_string(),
                "evidence/2024-03-05_14-07/access/access_1.jpg".to_string(),
                "evidence/2024-03-05_14-07/access/access_2.jpg".to_string(),
            ]
        );
        assert_eq!(
            fetch(&store, "evidence/2024-03-05_14-07/access/access_2.jpg").await,
            b"a2"
        );
    }
}
