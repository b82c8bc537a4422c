//! Upload collaborator seam.
//!
//! Staging places a local scratch file into durable object storage and
//! returns the resulting URI. Per-file failures are logged and turn
//! into absence markers; they never abort the invocation.

use async_trait::async_trait;
use bytes::Bytes;
use object_store::{aws::AmazonS3Builder, path::Path as ObjectPath, ObjectStore};
use serde::Deserialize;
use tracing::{debug, error};

use crate::error::{Result, StagingError};
use crate::generate::basename;

/// URI scheme prefix staged files must carry to be manifest-eligible.
pub const STORAGE_SCHEME: &str = "s3://";

/// Publish destination for one file. A missing `s3` destination means
/// staging is not configured for that file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StageTarget {
    #[serde(default)]
    pub s3: Option<String>,
}

/// Stages local files to durable storage.
#[async_trait]
pub trait FileStager: Send + Sync {
    /// Upload `local_path` to the target destination.
    ///
    /// Returns the storage URI on success, or `None` when no
    /// destination is configured or the upload fails (the error is
    /// logged, not raised).
    async fn stage(&self, local_path: &str, target: &StageTarget) -> Option<String>;
}

/// Connection settings for the S3-backed stager. Credentials come from
/// the environment (`AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3StagerConfig {
    /// Custom endpoint URL (MinIO or localstack); AWS when unset.
    pub endpoint: Option<String>,
    /// Region override.
    pub region: Option<String>,
    /// Allow plain HTTP endpoints (local testing).
    #[serde(default)]
    pub allow_http: bool,
}

/// Production stager over the `object_store` S3 client.
pub struct ObjectStoreStager {
    config: S3StagerConfig,
}

impl ObjectStoreStager {
    pub fn new(config: S3StagerConfig) -> Self {
        Self { config }
    }

    async fn put_object(&self, local_path: &str, destination: &str) -> Result<()> {
        let (bucket, key) = split_uri(destination)?;

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
        if let Some(endpoint) = &self.config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        if let Some(region) = &self.config.region {
            builder = builder.with_region(region);
        }
        if self.config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| StagingError::Config(format!("failed to create S3 client: {}", e)))?;

        let data = tokio::fs::read(local_path).await?;
        let size = data.len();
        let data = Bytes::from(data);

        store
            .put(&ObjectPath::from(key), data.into())
            .await
            .map_err(|e| {
                StagingError::StorageUpload(format!("failed to write {}: {}", destination, e))
            })?;

        debug!(destination = %destination, size = size, "Staged file");
        Ok(())
    }
}

#[async_trait]
impl FileStager for ObjectStoreStager {
    async fn stage(&self, local_path: &str, target: &StageTarget) -> Option<String> {
        let destination = target.s3.as_deref()?;

        match self.put_object(local_path, destination).await {
            Ok(()) => Some(destination.to_string()),
            Err(e) => {
                error!(
                    file = %basename(local_path),
                    error = %e,
                    "Error staging file"
                );
                None
            }
        }
    }
}

/// Stager that never uploads; every file gets an absence marker.
/// Used for dry runs.
pub struct NullStager;

#[async_trait]
impl FileStager for NullStager {
    async fn stage(&self, _local_path: &str, _target: &StageTarget) -> Option<String> {
        None
    }
}

/// Split an `s3://bucket/key` URI into bucket and key.
fn split_uri(uri: &str) -> Result<(&str, &str)> {
    let rest = uri
        .strip_prefix(STORAGE_SCHEME)
        .ok_or_else(|| StagingError::Config(format!("not a storage URI: {}", uri)))?;
    rest.split_once('/')
        .filter(|(bucket, key)| !bucket.is_empty() && !key.is_empty())
        .ok_or_else(|| StagingError::Config(format!("storage URI missing key: {}", uri)))
}
