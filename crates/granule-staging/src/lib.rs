//! Granule staging library.
//!
//! Processes one granule's file set at a time: decides which science
//! data files need a DMR++ sidecar generated by the external
//! `get_dmrpp` tool, stages all resulting files to object storage, and
//! rebuilds the granule-level manifest from the staged URIs.
//!
//! # Architecture
//!
//! - filename classification (generatable vs passthrough) and granule
//!   identifier recovery
//! - DMR++ generation through an injected command runner
//! - bucket resolution from ordered collection file rules
//! - staging through an injected uploader, per-file failure tolerant
//! - granule manifest assembly from the flat staged-file list

pub mod assemble;
pub mod buckets;
pub mod classify;
pub mod command;
pub mod config;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod stage;

// Re-exports
pub use assemble::{assemble, FileEntry, GranuleDescriptor};
pub use buckets::resolve_bucket;
pub use classify::{FileKind, PatternClassifier, DATA_PATTERN, WILDCARD_RULE};
pub use command::{CommandRequest, CommandRunner, ToolRunner};
pub use config::{
    BucketCatalog, BucketSpec, CollectionConfig, FileTypeRule, StagingConfig,
    DEFAULT_BUCKET_CLASS,
};
pub use error::{Result, StagingError};
pub use generate::{ArtifactGenerator, DEFAULT_TOOL};
pub use pipeline::{Pipeline, PipelineOutput};
pub use stage::{
    FileStager, NullStager, ObjectStoreStager, S3StagerConfig, StageTarget, STORAGE_SCHEME,
};
