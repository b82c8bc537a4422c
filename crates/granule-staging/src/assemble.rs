//! Granule manifest assembly from staged file URIs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buckets::resolve_bucket;
use crate::classify::PatternClassifier;
use crate::config::{BucketCatalog, FileTypeRule};
use crate::error::Result;
use crate::stage::STORAGE_SCHEME;

/// Manifest entry for one staged file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub url_path: String,
    pub bucket: String,
    /// Full storage URI.
    pub filename: String,
    /// Bare filename.
    pub name: String,
    pub size: u64,
}

/// Granule-level manifest: canonical identifier plus staged files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GranuleDescriptor {
    #[serde(rename = "granuleId")]
    pub granule_id: String,
    pub files: Vec<FileEntry>,
}

/// Rebuild granule descriptors from the flat staged-file list.
///
/// Entries that are absence markers, or whose URI is not a staged
/// `s3://` location, are skipped. Files group by canonical granule
/// identifier; only the FIRST staged file seen for an identifier
/// contributes a [`FileEntry`]. Later files with the same identifier
/// (typically the data file's generated sidecar) add nothing. That
/// first-wins grouping reproduces the long-standing manifest shape
/// downstream consumers expect.
pub fn assemble(
    classifier: &PatternClassifier,
    staged_files: &[Option<String>],
    sizes_by_name: &HashMap<String, u64>,
    rules: &[FileTypeRule],
    catalog: &BucketCatalog,
    staging_dir: &str,
) -> Result<Vec<GranuleDescriptor>> {
    let mut granules: Vec<GranuleDescriptor> = Vec::new();

    for uri in staged_files.iter().flatten() {
        if !uri.starts_with(STORAGE_SCHEME) {
            debug!(file = %uri, "Skipping unstaged file");
            continue;
        }

        let filename = uri.rsplit('/').next().unwrap_or(uri);
        let granule_id = classifier.canonical_id(filename);
        if granules.iter().any(|g| g.granule_id == granule_id) {
            continue;
        }

        let bucket = resolve_bucket(filename, rules, catalog)?;
        let entry = FileEntry {
            path: staging_dir.to_string(),
            url_path: staging_dir.to_string(),
            bucket: bucket.name.clone(),
            filename: uri.clone(),
            name: filename.to_string(),
            size: sizes_by_name.get(filename).copied().unwrap_or(0),
        };

        granules.push(GranuleDescriptor {
            granule_id,
            files: vec![entry],
        });
    }

    Ok(granules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BucketSpec;

    fn catalog() -> BucketCatalog {
        let mut buckets = BucketCatalog::new();
        buckets.insert(
            "public".to_string(),
            BucketSpec {
                name: "pub-bucket".to_string(),
            },
        );
        buckets
    }

    fn staged(uris: &[&str]) -> Vec<Option<String>> {
        uris.iter().map(|u| Some(u.to_string())).collect()
    }

    #[test]
    fn test_first_staged_file_wins_per_granule() {
        let classifier = PatternClassifier::new();
        let staged = staged(&[
            "s3://b/g1.nc",
            "s3://b/g1.nc.dmrpp",
            "s3://b/g2.nc",
        ]);
        let mut sizes = HashMap::new();
        sizes.insert("g1.nc".to_string(), 100);
        sizes.insert("g1.nc.dmrpp".to_string(), 10);
        sizes.insert("g2.nc".to_string(), 200);

        let granules =
            assemble(&classifier, &staged, &sizes, &[], &catalog(), "staged").unwrap();

        assert_eq!(granules.len(), 2);
        assert_eq!(granules[0].granule_id, "g1");
        assert_eq!(granules[1].granule_id, "g2");
        // The .dmrpp sidecar shares g1's identifier and adds no entry.
        assert_eq!(granules[0].files.len(), 1);
        assert_eq!(granules[0].files[0].name, "g1.nc");
        assert_eq!(granules[0].files[0].filename, "s3://b/g1.nc");
        assert_eq!(granules[0].files[0].bucket, "pub-bucket");
        assert_eq!(granules[0].files[0].path, "staged");
        assert_eq!(granules[0].files[0].url_path, "staged");
        assert_eq!(granules[0].files[0].size, 100);
        assert_eq!(granules[1].files.len(), 1);
        assert_eq!(granules[1].files[0].size, 200);
    }

    #[test]
    fn test_json_sidecar_groups_with_its_granule() {
        let classifier = PatternClassifier::new();
        let staged = staged(&["s3://b/g1.nc", "s3://b/g1.nc.json"]);

        let granules =
            assemble(&classifier, &staged, &HashMap::new(), &[], &catalog(), "staged").unwrap();

        // The sidecar shares g1's identifier; no standalone descriptor.
        assert_eq!(granules.len(), 1);
        assert_eq!(granules[0].granule_id, "g1");
        assert_eq!(granules[0].files.len(), 1);
        assert_eq!(granules[0].files[0].name, "g1.nc");
    }

    #[test]
    fn test_absent_and_unstaged_entries_excluded() {
        let classifier = PatternClassifier::new();
        let staged = vec![
            None,
            Some("local/g1.nc".to_string()),
            Some("s3://b/g2.nc".to_string()),
        ];

        let granules =
            assemble(&classifier, &staged, &HashMap::new(), &[], &catalog(), "staged").unwrap();

        assert_eq!(granules.len(), 1);
        assert_eq!(granules[0].granule_id, "g2");
    }

    #[test]
    fn test_unknown_size_defaults_to_zero() {
        let classifier = PatternClassifier::new();
        let staged = staged(&["s3://b/g1.nc"]);

        let granules =
            assemble(&classifier, &staged, &HashMap::new(), &[], &catalog(), "staged").unwrap();
        assert_eq!(granules[0].files[0].size, 0);
    }

    #[test]
    fn test_unclassifiable_name_is_own_granule() {
        let classifier = PatternClassifier::new();
        let staged = staged(&["s3://b/notes.txt", "s3://b/readme.md"]);

        let granules =
            assemble(&classifier, &staged, &HashMap::new(), &[], &catalog(), "staged").unwrap();
        assert_eq!(granules.len(), 2);
        assert_eq!(granules[0].granule_id, "notes.txt");
        assert_eq!(granules[1].granule_id, "readme.md");
    }

    #[test]
    fn test_missing_bucket_class_fails() {
        let classifier = PatternClassifier::new();
        let staged = staged(&["s3://b/g1.nc"]);
        let rules = vec![FileTypeRule {
            regex: Some(".*".to_string()),
            bucket: "absent".to_string(),
        }];

        assert!(assemble(&classifier, &staged, &HashMap::new(), &rules, &catalog(), "staged")
            .is_err());
    }
}
