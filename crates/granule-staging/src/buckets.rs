//! Bucket resolution for staged granule files.

use crate::classify::{rule_matches, WILDCARD_RULE};
use crate::config::{BucketCatalog, BucketSpec, FileTypeRule, DEFAULT_BUCKET_CLASS};
use crate::error::{Result, StagingError};

/// Resolve the destination bucket for a filename.
///
/// Rules are tested in order; the first match decides the bucket
/// class. A rule without a pattern uses the wildcard sentinel. When no
/// rule matches, the default class applies. A class absent from the
/// catalog is a fatal configuration error.
pub fn resolve_bucket<'a>(
    filename: &str,
    rules: &[FileTypeRule],
    catalog: &'a BucketCatalog,
) -> Result<&'a BucketSpec> {
    let mut class = DEFAULT_BUCKET_CLASS;
    for rule in rules {
        let pattern = rule.regex.as_deref().unwrap_or(WILDCARD_RULE);
        if rule_matches(pattern, filename)? {
            class = &rule.bucket;
            break;
        }
    }

    catalog.get(class).ok_or_else(|| {
        StagingError::Config(format!("bucket class '{}' missing from catalog", class))
    })
}
