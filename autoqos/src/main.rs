/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use autoqos::command::patch_script;
use autoqos::config::RecommenderConfig;
use autoqos::policy::PolicyTable;
use autoqos::provider::SlurmCli;
use autoqos::report::{Recommendation, Recommender};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Finds idle GPUs on the cluster and recommends how to request them.
///
/// Example:
///   autoqos --policy /etc/autoqos/partitions.csv
///   autoqos --policy partitions.csv --sbatch --partition a100
///   autoqos --policy partitions.csv --partition a100 --patch-script job.sh
#[derive(Debug, Parser)]
#[command(
    name = "autoqos",
    about = "Idle GPU capacity recommender for Slurm clusters",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML recommender configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Partition policy CSV (overrides `policy_file` from the configuration).
    #[arg(short = 'q', long = "policy")]
    policy: Option<PathBuf>,

    /// Maximum total GPUs recommended per partition.
    #[arg(short = 'm', long = "max-tres")]
    max_tres: Option<u32>,

    /// Minimum CPUs per GPU a node must offer to be considered.
    #[arg(long = "min-cpu")]
    min_cpu: Option<u32>,

    /// Print only the #SBATCH resource directives for one partition.
    #[arg(short = 's', long = "sbatch", default_value_t = false)]
    sbatch: bool,

    /// Substring selecting the partition for --sbatch / --patch-script.
    #[arg(short = 'p', long = "partition", default_value = "")]
    partition: String,

    /// Rewrite the resource directives of this submission script in place.
    #[arg(long = "patch-script")]
    patch_script: Option<PathBuf>,

    /// Timeout in seconds for each scheduler command.
    #[arg(short = 't', long = "timeout")]
    timeout: Option<u64>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    // stdout is reserved for the recommendation itself.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!(
        config       = ?cli.config,
        policy       = ?cli.policy,
        max_tres     = ?cli.max_tres,
        min_cpu      = ?cli.min_cpu,
        sbatch       = cli.sbatch,
        partition    = %cli.partition,
        patch_script = ?cli.patch_script,
        timeout      = ?cli.timeout,
        "Configuration"
    );

    if let Err(e) = run(cli).await {
        error!("autoqos failed: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    let policy_path = config
        .policy_file
        .as_deref()
        .ok_or_else(|| anyhow!("no partition policy file given (--policy or policy_file)"))?;
    let policy = PolicyTable::load_from_file(policy_path)
        .with_context(|| format!("Failed to load partition policy: {}", policy_path.display()))?;

    let provider = SlurmCli::new(config.command_timeout);
    let report = Recommender::new(&provider, &config)
        .run(&policy)
        .await
        .context("Failed to query the scheduler")?;

    if let Some(script) = &cli.patch_script {
        return rewrite_script(&report, &cli.partition, script);
    }

    if cli.sbatch {
        let (name, patch) = report
            .patch_for(&cli.partition)
            .ok_or_else(|| anyhow!("no partition matching '{}' has capacity", cli.partition))?;
        info!(partition = %name, "printing resource directives");
        println!("{}", patch);
    } else {
        println!("{}", report);
    }
    Ok(())
}

/// Configuration file (or defaults) with command-line overrides applied.
fn load_config(cli: &Cli) -> Result<RecommenderConfig> {
    let mut config = match &cli.config {
        Some(path) => RecommenderConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration: {}", path.display()))?,
        None => {
            warn!("No configuration file provided, using defaults");
            RecommenderConfig::default()
        }
    };

    if let Some(policy) = &cli.policy {
        config.policy_file = Some(policy.clone());
    }
    if let Some(cap) = cli.max_tres {
        config.unit_cap = cap;
    }
    if let Some(min_cpu) = cli.min_cpu {
        config.min_cpu_per_gpu = min_cpu;
    }
    if let Some(secs) = cli.timeout {
        config.command_timeout = Duration::from_secs(secs);
    }
    Ok(config)
}

fn rewrite_script(report: &Recommendation, filter: &str, path: &Path) -> Result<()> {
    let (name, patch) = report
        .patch_for(filter)
        .ok_or_else(|| anyhow!("no partition matching '{}' has capacity", filter))?;

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read submission script: {}", path.display()))?;
    let (patched, outcome) = patch_script(&text, &patch);
    std::fs::write(path, patched)
        .with_context(|| format!("Cannot write submission script: {}", path.display()))?;

    info!(
        partition    = %name,
        script       = %path.display(),
        nodes        = outcome.nodes,
        cpus_per_gpu = outcome.cpus_per_gpu,
        gres         = outcome.gres,
        "submission script patched"
    );
    Ok(())
}
