//! Filename classification for granule data files.
//!
//! Science data files (`*.h5`, `*.he5`, `*.hdf`, `*.nc`, `*.nc4`,
//! optionally compressed) get a DMR++ sidecar generated for them;
//! everything else (existing `.dmrpp` artifacts, `.cmr.xml` and `.json`
//! metadata) passes through unchanged.

use regex::Regex;

/// Granule data file pattern: data extension plus optional compression
/// extension. Unanchored; callers decide on end-of-string anchoring.
pub const DATA_PATTERN: &str = r"\.(he?5|hdf|nc4?)(\.bz2|\.gz|\.Z)?";

/// Sentinel rule pattern meaning "matches any filename".
pub const WILDCARD_RULE: &str = "*.";

/// How a granule file is handled by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Science data file eligible for DMR++ generation.
    Generatable,
    /// Forwarded unchanged (sidecar metadata, existing artifacts).
    Passthrough,
}

/// Classifies filenames and recovers canonical granule identifiers.
pub struct PatternClassifier {
    data_anchored: Regex,
    canonical: Regex,
}

impl PatternClassifier {
    pub fn new() -> Self {
        let data_anchored = Regex::new(&format!("{}$", DATA_PATTERN))
            .expect("invalid data file pattern");
        // Data suffix plus any trailing sidecar/artifact suffix; group 1
        // is the granule root identifier. `.json.xml` must precede
        // `.json` in the alternation so it is stripped whole.
        let canonical = Regex::new(&format!(
            r"^(.*){}(\.cmr\.xml|\.json\.xml|\.json|\.dmrpp)?$",
            DATA_PATTERN
        ))
        .expect("invalid canonical id pattern");

        Self {
            data_anchored,
            canonical,
        }
    }

    /// Decide whether a filename needs DMR++ generation.
    ///
    /// Matching is anchored at end-of-string: `foo.nc` is generatable,
    /// `foo.nc.dmrpp` is not.
    pub fn classify(&self, filename: &str) -> FileKind {
        if self.data_anchored.is_match(filename) {
            FileKind::Generatable
        } else {
            FileKind::Passthrough
        }
    }

    /// Recover the granule root identifier from a staged filename.
    ///
    /// Strips the data suffix (with optional compression extension) and
    /// any trailing `.cmr.xml`, `.json.xml`, `.json`, or `.dmrpp`
    /// sidecar suffix. A filename
    /// matching none of the known patterns is its own identifier, so an
    /// unexpected name never aborts assembly.
    pub fn canonical_id(&self, filename: &str) -> String {
        match self.canonical.captures(filename) {
            Some(caps) => caps
                .get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| filename.to_string()),
            None => filename.to_string(),
        }
    }

    /// Pattern handed to the fetch collaborator to select granule
    /// inputs: data files plus their `.cmr.xml`/`.json` sidecars.
    pub fn input_key_pattern() -> String {
        format!(r".*{}(\.cmr\.xml|\.json)?$", DATA_PATTERN)
    }
}

impl Default for PatternClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Check a collection file rule pattern against a filename.
///
/// The bare wildcard sentinel `"*."` matches anything; any other
/// pattern is a regex tested unanchored against the filename. An
/// unparsable pattern is a configuration error.
pub fn rule_matches(pattern: &str, filename: &str) -> crate::Result<bool> {
    if pattern == WILDCARD_RULE {
        return Ok(true);
    }
    let re = Regex::new(pattern).map_err(|e| {
        crate::StagingError::Config(format!("invalid file rule pattern '{}': {}", pattern, e))
    })?;
    Ok(re.is_match(filename))
}
