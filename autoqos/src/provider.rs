/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Source of the scheduler's status text.
//!
//! [`ClusterStatusProvider`] is the seam between the pure parsing and
//! optimization code and the cluster.  [`SlurmCli`] runs the real `sinfo` /
//! `scontrol` binaries; tests substitute an in-memory provider.
//!
//! Every command is bounded by a timeout.  A timeout, a spawn failure or a
//! non-zero exit status is fatal for the current run; nothing is retried.

use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, error};

/// Default bound for one scheduler command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' did not finish within {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("'{command}' exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Supplies the raw text the recommender consumes.
#[allow(async_fn_in_trait)]
pub trait ClusterStatusProvider {
    /// Partition status table (`PARTITION AVAIL TIMELIMIT NODES STATE NODELIST`).
    async fn partition_table(&self) -> Result<String, ProviderError>;

    /// `Key=Value` detail block for one node.
    async fn node_detail(&self, node: &str) -> Result<String, ProviderError>;
}

// ── SlurmCli ──────────────────────────────────────────────────────────────────

/// Provider backed by the Slurm command-line tools on `$PATH`.
#[derive(Debug, Clone)]
pub struct SlurmCli {
    timeout: Duration,
}

impl Default for SlurmCli {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

impl SlurmCli {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run(&self, program: &str, args: &[&str]) -> Result<String, ProviderError> {
        let command = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        debug!(command = %command, timeout = ?self.timeout, "running scheduler command");

        let child = Command::new(program).args(args).kill_on_drop(true).output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(result) => result.map_err(|source| ProviderError::Spawn {
                command: command.clone(),
                source,
            })?,
            Err(_) => {
                error!(command = %command, "scheduler command timed out");
                return Err(ProviderError::Timeout {
                    command,
                    timeout: self.timeout,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(command = %command, status = %output.status, %stderr, "scheduler command failed");
            return Err(ProviderError::Failed {
                command,
                status: output.status,
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl ClusterStatusProvider for SlurmCli {
    async fn partition_table(&self) -> Result<String, ProviderError> {
        self.run("sinfo", &[]).await
    }

    async fn node_detail(&self, node: &str) -> Result<String, ProviderError> {
        self.run("scontrol", &["show", "node", node]).await
    }
}
