//! Recommender configuration loading.
//!
//! Every field is optional; absent values fall back to the built-in
//! defaults.  Command-line flags are applied on top by the binary.
//!
//! The expected YAML structure is:
//! ```yaml
//! unit_cap: 48
//! min_cpu_per_gpu: 5
//! time_limit: "72:0:0"
//! command_timeout_secs: 30
//! policy_file: /etc/autoqos/partitions.csv
//! excluded_partitions: [debug]
//! prices:
//!   - family: a100
//!     price_per_device: 1.89
//!   - family: "3090"
//!     price_per_device: 0.44
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::command::DEFAULT_TIME_LIMIT;
use crate::optimizer::{DEFAULT_MIN_CPU, DEFAULT_UNIT_CAP};
use crate::policy::ALWAYS_EXCLUDED;
use crate::provider::DEFAULT_COMMAND_TIMEOUT;
use crate::report::cost::PriceTable;

// ── Private YAML deserialization types ────────────────────────────────────────

/// Maps directly onto the YAML file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    unit_cap: Option<u32>,
    min_cpu_per_gpu: Option<u32>,
    time_limit: Option<String>,
    command_timeout_secs: Option<u64>,
    policy_file: Option<PathBuf>,
    #[serde(default)]
    excluded_partitions: Vec<String>,
    prices: Option<PriceTable>,
}

// ── Public configuration ──────────────────────────────────────────────────────

/// Settings for one recommender run.
#[derive(Debug, Clone)]
pub struct RecommenderConfig {
    /// Maximum `gpus_per_node × node_count` recommended per partition.
    pub unit_cap: u32,
    /// Observations offering fewer CPUs per GPU are ignored by the optimizer.
    pub min_cpu_per_gpu: u32,
    /// `--time=` value of generated commands.
    pub time_limit: String,
    /// Bound for each scheduler command.
    pub command_timeout: Duration,
    /// Partition policy CSV.
    pub policy_file: Option<PathBuf>,
    /// Excluded in addition to [`ALWAYS_EXCLUDED`].
    pub excluded_partitions: Vec<String>,
    pub prices: PriceTable,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            unit_cap: DEFAULT_UNIT_CAP,
            min_cpu_per_gpu: DEFAULT_MIN_CPU,
            time_limit: DEFAULT_TIME_LIMIT.to_string(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            policy_file: None,
            excluded_partitions: Vec::new(),
            prices: PriceTable::default(),
        }
    }
}

impl RecommenderConfig {
    /// Parses `path`, filling absent fields with defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, if the YAML is
    /// structurally invalid or contains unknown keys.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading recommender configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        // An empty document deserializes to `()`, not to a mapping.
        let file: ConfigFile = if content.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?
        };

        let defaults = Self::default();
        let config = Self {
            unit_cap: file.unit_cap.unwrap_or(defaults.unit_cap),
            min_cpu_per_gpu: file.min_cpu_per_gpu.unwrap_or(defaults.min_cpu_per_gpu),
            time_limit: file.time_limit.unwrap_or(defaults.time_limit),
            command_timeout: file
                .command_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.command_timeout),
            policy_file: file.policy_file,
            excluded_partitions: file.excluded_partitions,
            prices: file.prices.unwrap_or(defaults.prices),
        };

        debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// `true` for `test`, `maintenance` and any configured exclusion.
    pub fn is_excluded(&self, partition: &str) -> bool {
        ALWAYS_EXCLUDED.contains(&partition)
            || self.excluded_partitions.iter().any(|p| p == partition)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
