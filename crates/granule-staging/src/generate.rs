//! DMR++ artifact generation.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::classify::{FileKind, PatternClassifier};
use crate::command::{CommandRequest, CommandRunner};
use crate::error::Result;

/// Default name of the external generation tool.
pub const DEFAULT_TOOL: &str = "get_dmrpp";

/// Suffix of generated artifacts.
pub const ARTIFACT_SUFFIX: &str = ".dmrpp";

/// Runs the external DMR++ tool against generatable inputs.
pub struct ArtifactGenerator {
    runner: Arc<dyn CommandRunner>,
    classifier: PatternClassifier,
    tool: String,
    base_path: String,
}

impl ArtifactGenerator {
    /// Create a generator rooted at `base_path` (the local scratch
    /// directory the tool resolves inputs against).
    pub fn new(runner: Arc<dyn CommandRunner>, tool: impl Into<String>, base_path: &str) -> Self {
        Self {
            runner,
            classifier: PatternClassifier::new(),
            tool: tool.into(),
            base_path: format!("{}/", base_path.trim_end_matches('/')),
        }
    }

    /// Generate artifacts for a granule's input files.
    ///
    /// Passthrough inputs are forwarded unchanged; each generatable
    /// input contributes itself plus its new `.dmrpp` sidecar, so N
    /// generatable and M passthrough inputs produce 2N + M outputs.
    /// A tool failure aborts the invocation with no partial output.
    pub async fn generate(&self, input_files: &[String]) -> Result<Vec<String>> {
        let mut outputs = Vec::with_capacity(input_files.len() * 2);

        for input in input_files {
            if self.classifier.classify(input) == FileKind::Passthrough {
                debug!(file = %input, "Forwarding passthrough file");
                outputs.push(input.clone());
                continue;
            }

            let artifact = format!("{}{}", input, ARTIFACT_SUFFIX);
            let request = CommandRequest::new(
                &self.tool,
                vec![
                    "-b".to_string(),
                    self.base_path.clone(),
                    "-o".to_string(),
                    artifact.clone(),
                    basename(input).to_string(),
                ],
            );

            info!(file = %input, artifact = %artifact, "Generating DMR++ sidecar");
            self.runner.run(&request).await?;

            outputs.push(input.clone());
            outputs.push(artifact);
        }

        Ok(outputs)
    }
}

/// Trailing path segment of a file path.
pub fn basename(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
}
