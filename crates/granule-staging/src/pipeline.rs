//! Per-granule processing pipeline.
//!
//! Sequences one granule's file set through generation, size
//! accounting, staging, scratch cleanup, and manifest assembly. Each
//! invocation is independent and fully synchronous: every stage
//! completes before the next starts, and a fatal error aborts the
//! invocation with no partial output.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::assemble::{assemble, GranuleDescriptor};
use crate::buckets::resolve_bucket;
use crate::classify::PatternClassifier;
use crate::command::CommandRunner;
use crate::config::StagingConfig;
use crate::error::Result;
use crate::generate::{basename, ArtifactGenerator};
use crate::stage::{FileStager, StageTarget, STORAGE_SCHEME};

/// What one invocation returns to its caller.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    /// Granule manifests rebuilt from the staged files.
    pub granules: Vec<GranuleDescriptor>,
    /// Staging result per output file, in output order; `null` marks a
    /// file that was not staged.
    pub input: Vec<Option<String>>,
}

/// Orchestrates one granule's processing.
pub struct Pipeline {
    config: StagingConfig,
    classifier: PatternClassifier,
    generator: ArtifactGenerator,
    stager: Arc<dyn FileStager>,
}

impl Pipeline {
    /// Build a pipeline for one invocation. Validates the bucket
    /// catalog up front; a missing bucket class is fatal here rather
    /// than halfway through staging.
    pub fn new(
        config: StagingConfig,
        runner: Arc<dyn CommandRunner>,
        stager: Arc<dyn FileStager>,
        tool: impl Into<String>,
        base_path: &str,
    ) -> Result<Self> {
        config.validate()?;
        let generator = ArtifactGenerator::new(runner, tool, base_path);

        Ok(Self {
            config,
            classifier: PatternClassifier::new(),
            generator,
            stager,
        })
    }

    /// Process one granule's input files end to end.
    pub async fn run(&self, input_files: &[String]) -> Result<PipelineOutput> {
        info!(count = input_files.len(), "Processing granule inputs");

        let outputs = self.generator.generate(input_files).await?;
        info!(count = outputs.len(), "Generation complete");

        // Pre-upload size accounting; generation guarantees every
        // output exists locally, so a missing file is fatal.
        let mut sizes_by_name = HashMap::new();
        for output in &outputs {
            let metadata = tokio::fs::metadata(output).await?;
            sizes_by_name.insert(basename(output).to_string(), metadata.len());
        }

        let mut staged_files = Vec::with_capacity(outputs.len());
        for output in &outputs {
            let target = self.publish_target(output)?;
            staged_files.push(self.stager.stage(output, &target).await);
        }

        // Local storage is scratch space; reclaim it whether or not
        // each file was staged.
        for output in &outputs {
            if let Err(e) = tokio::fs::remove_file(output).await {
                warn!(file = %output, error = %e, "Failed to remove scratch file");
            }
        }

        let granules = assemble(
            &self.classifier,
            &staged_files,
            &sizes_by_name,
            &self.config.collection.files,
            &self.config.buckets,
            &self.config.file_staging_dir,
        )?;

        info!(granules = granules.len(), "Granule assembly complete");
        Ok(PipelineOutput {
            granules,
            input: staged_files,
        })
    }

    /// Destination for one output file, or an unconfigured target when
    /// no staging prefix is set.
    fn publish_target(&self, output: &str) -> Result<StageTarget> {
        if self.config.file_staging_dir.is_empty() {
            return Ok(StageTarget::default());
        }

        let filename = basename(output);
        let bucket = resolve_bucket(
            filename,
            &self.config.collection.files,
            &self.config.buckets,
        )?;

        Ok(StageTarget {
            s3: Some(format!(
                "{}{}/{}/{}",
                STORAGE_SCHEME, bucket.name, self.config.file_staging_dir, filename
            )),
        })
    }
}
