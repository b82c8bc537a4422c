//! Granule DMR++ worker service.
//!
//! Processes one granule per invocation:
//! - classifies fetched input files (science data vs sidecar metadata)
//! - runs the external `get_dmrpp` tool for each science data file
//! - stages all resulting files to object storage
//! - prints the granule manifest as JSON on stdout

mod payload;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use granule_staging::{
    FileStager, NullStager, ObjectStoreStager, Pipeline, S3StagerConfig, ToolRunner, DEFAULT_TOOL,
};
use payload::Payload;

#[derive(Parser, Debug)]
#[command(name = "dmrpp-worker")]
#[command(about = "Generates DMR++ sidecars and stages granule files")]
struct Args {
    /// Path to the invocation payload JSON ({"input": [...], "config": {...}})
    #[arg(short, long)]
    payload: PathBuf,

    /// External generation tool to invoke
    #[arg(long, default_value = DEFAULT_TOOL)]
    tool: String,

    /// Local scratch directory the tool resolves inputs against
    #[arg(long, default_value = ".")]
    base_path: String,

    /// Timeout for one tool invocation in seconds (unbounded when unset)
    #[arg(long)]
    tool_timeout_secs: Option<u64>,

    /// Custom S3 endpoint (MinIO/localstack)
    #[arg(long, env = "S3_ENDPOINT")]
    s3_endpoint: Option<String>,

    /// S3 region override
    #[arg(long, env = "S3_REGION")]
    s3_region: Option<String>,

    /// Allow plain HTTP to the S3 endpoint (local testing)
    #[arg(long)]
    allow_http: bool,

    /// Skip staging entirely; every file gets an absence marker
    #[arg(long)]
    dry_run: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!(payload = %args.payload.display(), "Starting DMR++ worker");

    let payload = Payload::load(&args.payload)?;

    let runner = Arc::new(ToolRunner::new(
        args.tool_timeout_secs.map(Duration::from_secs),
    ));

    let stager: Arc<dyn FileStager> = if args.dry_run {
        Arc::new(NullStager)
    } else {
        Arc::new(ObjectStoreStager::new(S3StagerConfig {
            endpoint: args.s3_endpoint,
            region: args.s3_region,
            allow_http: args.allow_http,
        }))
    };

    let pipeline = Pipeline::new(payload.config, runner, stager, &args.tool, &args.base_path)?;
    let output = pipeline.run(&payload.input).await?;

    info!(
        granules = output.granules.len(),
        staged = output.input.iter().filter(|f| f.is_some()).count(),
        "Granule processing complete"
    );

    // The manifest is the worker's product; logs go to stderr.
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
