//! Invocation payload loading.
//!
//! The host framework hands the worker a JSON payload holding the
//! fetched local input paths and the read-only collection/bucket
//! configuration.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use granule_staging::StagingConfig;

/// One granule's invocation payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Payload {
    /// Local paths of the fetched input files, in fetch order.
    #[serde(default)]
    pub input: Vec<String>,
    /// Collection file rules, bucket catalog, and staging locations.
    #[serde(default)]
    pub config: StagingConfig,
}

impl Payload {
    /// Load a payload from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read payload file: {}", path.display()))?;

        let payload: Payload = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse payload file: {}", path.display()))?;

        debug!(
            inputs = payload.input.len(),
            path = %path.display(),
            "Loaded payload"
        );
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload() {
        let json = r#"{
            "input": ["data/g1.nc", "data/g1.nc.cmr.xml"],
            "config": {
                "collection": {
                    "files": [{"regex": ".*\\.nc$", "bucket": "public"}]
                },
                "buckets": {"public": {"name": "pub-bucket"}},
                "fileStagingDir": "staged"
            }
        }"#;

        let payload: Payload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.input.len(), 2);
        assert_eq!(payload.config.file_staging_dir, "staged");
        assert_eq!(payload.config.buckets["public"].name, "pub-bucket");
    }

    #[test]
    fn test_load_payload_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.json");
        std::fs::write(
            &path,
            r#"{"input": ["data/g1.nc"], "config": {"buckets": {"public": {"name": "b"}}}}"#,
        )
        .unwrap();

        let payload = Payload::load(&path).unwrap();
        assert_eq!(payload.input, vec!["data/g1.nc"]);
        assert_eq!(payload.config.buckets["public"].name, "b");
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(Payload::load(Path::new("/nonexistent/payload.json")).is_err());
    }
}
