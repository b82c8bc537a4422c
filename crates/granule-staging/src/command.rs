//! External command execution seam.
//!
//! The DMR++ tool is an opaque file-in/file-out command. The pipeline
//! builds a typed [`CommandRequest`] and hands it to an injected
//! [`CommandRunner`], so tests can substitute a fake runner without
//! spawning processes.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, StagingError};

/// A command invocation: tool name plus arguments, no shell involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub tool: String,
    pub args: Vec<String>,
}

impl CommandRequest {
    pub fn new(tool: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            tool: tool.into(),
            args,
        }
    }
}

/// Executes command requests.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion. Spawn failure or non-zero exit is
    /// a generation failure that aborts the whole invocation.
    async fn run(&self, request: &CommandRequest) -> Result<()>;
}

/// Production runner over `tokio::process`.
///
/// Blocks until the tool exits. The optional timeout defaults to
/// unbounded, matching the tool's synchronous contract.
pub struct ToolRunner {
    timeout: Option<Duration>,
}

impl ToolRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl CommandRunner for ToolRunner {
    async fn run(&self, request: &CommandRequest) -> Result<()> {
        debug!(tool = %request.tool, args = ?request.args, "Running command");

        let mut command = tokio::process::Command::new(&request.tool);
        command
            .args(&request.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null());

        let status = async {
            command.status().await.map_err(|e| {
                StagingError::Generation(format!("failed to launch {}: {}", request.tool, e))
            })
        };

        let status = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, status).await.map_err(|_| {
                StagingError::Generation(format!(
                    "{} timed out after {}s",
                    request.tool,
                    limit.as_secs()
                ))
            })??,
            None => status.await?,
        };

        if !status.success() {
            return Err(StagingError::Generation(format!(
                "{} exited with {}",
                request.tool, status
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_command() {
        let runner = ToolRunner::default();
        let request = CommandRequest::new("true", vec![]);
        runner.run(&request).await.unwrap();
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_generation_failure() {
        let runner = ToolRunner::default();
        let request = CommandRequest::new("false", vec![]);
        assert!(matches!(
            runner.run(&request).await,
            Err(StagingError::Generation(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_tool_is_generation_failure() {
        let runner = ToolRunner::default();
        let request = CommandRequest::new("definitely-not-a-real-tool", vec![]);
        assert!(matches!(
            runner.run(&request).await,
            Err(StagingError::Generation(_))
        ));
    }
}
