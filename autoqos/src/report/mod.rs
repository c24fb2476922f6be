/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! One recommender run, from raw scheduler text to the final report.
//!
//! ```text
//! provider.partition_table() ─► PartitionIndex
//!                                   │ for every policy row, idle then mixed nodes
//!                                   ▼
//! provider.node_detail(node) ─► ResourceSnapshot ─┬─► CommandSynthesizer
//!                                                 ├─► AllocationOptimizer
//!                                                 └─► empty GPUs ─► PriceTable
//! ```
//!
//! # Failure policy
//! * A provider error (command failed or timed out) aborts the run.
//! * A node whose detail block cannot be parsed is recorded in
//!   [`Recommendation::failures`] and left out; every other node is still
//!   processed.
//! * A status row with a malformed node list is recorded in
//!   [`Recommendation::rejected_rows`].

pub mod cost;

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use crate::command::{CommandSynthesizer, ResourcePatch};
use crate::config::RecommenderConfig;
use crate::optimizer::{AllocationCandidate, AllocationOptimizer, Observation};
use crate::partition::{PartitionIndex, PartitionState, StatusTableError};
use crate::policy::PolicyTable;
use crate::provider::{ClusterStatusProvider, ProviderError};
use crate::snapshot::{NodeParseError, ResourceSnapshot};

// ── Report types ──────────────────────────────────────────────────────────────

/// Recommended interactive command for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCommand {
    pub node: String,
    pub command: String,
    /// `false` for a GPU node whose devices are all in use.
    pub has_capacity: bool,
}

impl std::fmt::Display for NodeCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.node, self.command)
    }
}

/// A node left out of the report because its detail block was unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFailure {
    pub partition: String,
    pub node: String,
    pub error: NodeParseError,
}

/// Everything one run computed.
#[derive(Debug, Clone, Default)]
pub struct Recommendation {
    /// Idle partitions and their nodes, sorted by partition name.
    pub idle_partitions: Vec<(String, Vec<String>)>,
    pub idle_commands: Vec<NodeCommand>,
    pub mixed_commands: Vec<NodeCommand>,
    /// Best allocation per `Partitions=` value.
    pub allocations: BTreeMap<String, AllocationCandidate>,
    /// Free devices per policy partition.
    pub empty_devices: BTreeMap<String, u32>,
    /// Hourly price of [`empty_devices`](Self::empty_devices).
    pub wasted_cost: f64,
    pub failures: Vec<NodeFailure>,
    pub rejected_rows: Vec<StatusTableError>,
}

impl Recommendation {
    /// Patch for the first partition (by name) containing `filter`.
    pub fn patch_for(&self, filter: &str) -> Option<(&str, ResourcePatch)> {
        let mut matches = self
            .allocations
            .iter()
            .filter(|(name, _)| name.trim().contains(filter));

        let (name, candidate) = matches.next()?;
        let others: Vec<&str> = matches.map(|(n, _)| n.as_str()).collect();
        if !others.is_empty() {
            warn!(
                selected = %name,
                ignored = ?others,
                "partition filter matches several partitions"
            );
        }
        Some((name.as_str(), CommandSynthesizer::synthesize_patch(candidate)))
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.idle_partitions.iter().map(|(p, _)| p.as_str()).collect();
        let nodes: Vec<&Vec<String>> = self.idle_partitions.iter().map(|(_, n)| n).collect();
        writeln!(f, "Idle partitions: {:?} with nodes {:?}", names, nodes)?;

        for (name, c) in &self.allocations {
            writeln!(
                f,
                "{}: total gpus {}, gpus per node {}, nodes {}, cpus per gpu {}",
                name.trim(),
                c.total_units,
                c.gpus_per_node,
                c.node_count,
                c.cpus_per_gpu
            )?;
        }

        writeln!(f, "Idle commands:")?;
        for c in self.idle_commands.iter().filter(|c| c.has_capacity) {
            writeln!(f, "{}", c)?;
        }
        writeln!(f, "Mix commands:")?;
        for c in self.mixed_commands.iter().filter(|c| c.has_capacity) {
            writeln!(f, "{}", c)?;
        }

        writeln!(f, "Empty GPUs: {:?}", self.empty_devices)?;

        if !self.failures.is_empty() {
            writeln!(f, "Skipped nodes:")?;
            for failure in &self.failures {
                writeln!(f, "[{}] {}", failure.node, failure.error)?;
            }
        }
        for row in &self.rejected_rows {
            writeln!(f, "Skipped status row: {}", row)?;
        }

        write!(f, "{:.2}$/hour is being wasted!", self.wasted_cost)
    }
}

// ── Recommender ───────────────────────────────────────────────────────────────

/// Runs the whole pipeline against a [`ClusterStatusProvider`].
pub struct Recommender<'a, P> {
    provider: &'a P,
    config: &'a RecommenderConfig,
}

impl<'a, P: ClusterStatusProvider> Recommender<'a, P> {
    pub fn new(provider: &'a P, config: &'a RecommenderConfig) -> Self {
        Self { provider, config }
    }

    /// Fetch, parse, optimize and price the current cluster state.
    ///
    /// Policy rows are processed in table order; inside a row, idle nodes
    /// come before mixed ones, each in node-list expansion order.  A node
    /// listed by several partitions is fetched and counted for the first
    /// one only.
    ///
    /// # Errors
    /// Only collaborator failures; per-node problems end up in the report.
    pub async fn run(&self, policy: &PolicyTable) -> Result<Recommendation, ProviderError> {
        let table = self.provider.partition_table().await?;
        let index = PartitionIndex::from_status_table(&table);

        let synthesizer = CommandSynthesizer::new(self.config.time_limit.clone());
        let mut report = Recommendation {
            idle_partitions: index
                .partitions_in(&PartitionState::Idle)
                .filter(|(p, _)| !self.config.is_excluded(p))
                .map(|(p, nodes)| (p.to_string(), nodes.to_vec()))
                .collect(),
            rejected_rows: index.rejected().to_vec(),
            ..Default::default()
        };
        let mut observations = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for entry in policy.entries() {
            let partition = entry.partition.as_str();
            if self.config.is_excluded(partition) {
                debug!(partition = %partition, "excluded partition skipped");
                continue;
            }
            let Some(qos) = entry.preferred_qos() else {
                continue;
            };

            for state in [PartitionState::Idle, PartitionState::Mixed] {
                for node in index.nodes(&state, partition) {
                    if !seen.insert(node.as_str()) {
                        debug!(node = %node, partition = %partition, "node already counted");
                        continue;
                    }

                    let detail = self.provider.node_detail(node).await?;
                    let snapshot = match ResourceSnapshot::parse(node, &detail) {
                        Ok(s) => s,
                        Err(error) => {
                            warn!(node = %node, partition = %partition, %error, "node skipped");
                            report.failures.push(NodeFailure {
                                partition: partition.to_string(),
                                node: node.clone(),
                                error,
                            });
                            continue;
                        }
                    };

                    let command = NodeCommand {
                        node: node.clone(),
                        command: synthesizer.synthesize(&snapshot, qos),
                        has_capacity: snapshot.is_cpu_only()
                            || snapshot.available_device_count() > 0,
                    };
                    match state {
                        PartitionState::Idle => report.idle_commands.push(command),
                        _ => report.mixed_commands.push(command),
                    }

                    observations.push(Observation::from(&snapshot));
                    *report
                        .empty_devices
                        .entry(partition.to_string())
                        .or_insert(0) += snapshot.available_device_count();
                }
            }
        }

        let optimizer =
            AllocationOptimizer::new(self.config.unit_cap, self.config.min_cpu_per_gpu);
        report.allocations = optimizer.optimize(&observations);
        report.wasted_cost = self.config.prices.wasted_cost(&report.empty_devices);

        info!(
            nodes = observations.len(),
            failures = report.failures.len(),
            partitions = report.allocations.len(),
            wasted_per_hour = report.wasted_cost,
            "recommendation complete"
        );
        Ok(report)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
