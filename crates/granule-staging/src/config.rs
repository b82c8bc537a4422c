//! Invocation configuration: collection file rules, bucket catalog,
//! and staging locations.
//!
//! All of this arrives read-only from the caller's payload; nothing
//! here is generated by the pipeline itself.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StagingError};

/// Bucket class used when no collection file rule matches.
pub const DEFAULT_BUCKET_CLASS: &str = "public";

/// A collection file rule: first rule whose pattern matches a filename
/// decides its bucket class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTypeRule {
    /// Pattern tested unanchored against the filename. Omitted means
    /// the wildcard sentinel (matches everything).
    #[serde(default)]
    pub regex: Option<String>,
    /// Bucket class this rule assigns (e.g. "public", "private").
    pub bucket: String,
}

/// Collection configuration relevant to staging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Ordered file rules; first match wins.
    #[serde(default)]
    pub files: Vec<FileTypeRule>,
}

/// A concrete bucket a class resolves to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketSpec {
    pub name: String,
}

/// Mapping from bucket class to bucket descriptor.
pub type BucketCatalog = HashMap<String, BucketSpec>;

/// Per-invocation staging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StagingConfig {
    #[serde(default)]
    pub collection: CollectionConfig,

    #[serde(default)]
    pub buckets: BucketCatalog,

    /// Remote prefix staged files are placed under.
    #[serde(rename = "fileStagingDir", default)]
    pub file_staging_dir: String,

    /// Public distribution endpoint for access URLs.
    #[serde(default)]
    pub distribution_endpoint: Option<String>,
}

impl StagingConfig {
    /// Check that every bucket class referenced by a rule, plus the
    /// default class, exists in the catalog. A missing class is a
    /// configuration error, never a silent default.
    pub fn validate(&self) -> Result<()> {
        if !self.buckets.contains_key(DEFAULT_BUCKET_CLASS) {
            return Err(StagingError::Config(format!(
                "bucket class '{}' missing from catalog",
                DEFAULT_BUCKET_CLASS
            )));
        }
        for rule in &self.collection.files {
            if !self.buckets.contains_key(&rule.bucket) {
                return Err(StagingError::Config(format!(
                    "bucket class '{}' referenced by file rule missing from catalog",
                    rule.bucket
                )));
            }
        }
        Ok(())
    }

    /// Build the public access URL for a staged file, if a
    /// distribution endpoint is configured.
    pub fn data_access_url(&self, key: &str, bucket: &str) -> Option<String> {
        let endpoint = self.distribution_endpoint.as_deref()?;
        let key = key.rsplit('/').next().unwrap_or(key);
        let half_url =
            format!("{}/{}/{}", bucket, self.file_staging_dir, key).replace("//", "/");
        Some(format!("{}/{}", endpoint.trim_end_matches('/'), half_url))
    }
}
