/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-partition allocation optimizer.
//!
//! Given one [`Observation`] per node, [`AllocationOptimizer::optimize`]
//! picks for every partition the largest homogeneous node group
//! (`gpus_per_node × node_count`) that fits under the unit cap.
//!
//! # Algorithm
//! For every observation `(gpus, cpus)` that passes the CPU filter:
//! 1. `match_count` = observations in the same partition offering at least
//!    `gpus` GPUs **and** at least `cpus` CPUs per GPU;
//! 2. `product = gpus × match_count`, shrunk one node at a time while it
//!    exceeds the cap;
//! 3. a zero `match_count` or `product` is discarded;
//! 4. the kept candidate is replaced by a strictly larger product, or, at an
//!    equal product, by a strictly larger CPU-per-GPU value as long as the
//!    kept candidate does not use fewer nodes than the new one.
//!
//! This is a greedy scan in input order, not a global search.  The tie-break
//! in step 4 is asymmetric on purpose; callers compare recommendations across
//! runs and rely on it staying stable.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::snapshot::ResourceSnapshot;

/// Default maximum GPU units recommended for one partition.
pub const DEFAULT_UNIT_CAP: u32 = 48;

/// Default minimum CPU-per-GPU an observation must offer to be considered.
pub const DEFAULT_MIN_CPU: u32 = 5;

// ── Data types ────────────────────────────────────────────────────────────────

/// Free capacity of one node, as seen by the optimizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Raw `Partitions=` value of the node.
    pub partition: String,
    /// Free GPUs on the node.
    pub gpus: u32,
    /// Free CPUs per free GPU on the node.
    pub cpus_per_gpu: u32,
}

impl Observation {
    pub fn new(partition: impl Into<String>, gpus: u32, cpus_per_gpu: u32) -> Self {
        Self {
            partition: partition.into(),
            gpus,
            cpus_per_gpu,
        }
    }
}

impl From<&ResourceSnapshot> for Observation {
    fn from(snapshot: &ResourceSnapshot) -> Self {
        Self::new(
            snapshot.partitions(),
            snapshot.available_device_count(),
            snapshot.cpu_per_device(),
        )
    }
}

/// Best node group found for one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationCandidate {
    /// `gpus_per_node × node_count`, never above the unit cap.
    pub total_units: u32,
    pub gpus_per_node: u32,
    pub node_count: u32,
    pub cpus_per_gpu: u32,
}

// ── AllocationOptimizer ───────────────────────────────────────────────────────

/// Stateless optimizer configured with a unit cap and a CPU floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationOptimizer {
    unit_cap: u32,
    min_cpu: u32,
}

impl Default for AllocationOptimizer {
    fn default() -> Self {
        Self::new(DEFAULT_UNIT_CAP, DEFAULT_MIN_CPU)
    }
}

impl AllocationOptimizer {
    pub fn new(unit_cap: u32, min_cpu: u32) -> Self {
        Self { unit_cap, min_cpu }
    }

    /// Best [`AllocationCandidate`] per partition, keyed by partition name.
    ///
    /// Partitions without a surviving observation are absent from the map.
    pub fn optimize(&self, observations: &[Observation]) -> BTreeMap<String, AllocationCandidate> {
        let filtered: Vec<&Observation> = observations
            .iter()
            .filter(|o| o.cpus_per_gpu != 0 && o.cpus_per_gpu >= self.min_cpu)
            .collect();

        let mut best: BTreeMap<String, AllocationCandidate> = BTreeMap::new();

        for obs in &filtered {
            let match_count = filtered
                .iter()
                .filter(|o| {
                    o.partition == obs.partition
                        && o.gpus >= obs.gpus
                        && o.cpus_per_gpu >= obs.cpus_per_gpu
                })
                .count() as u64;

            let gpus = u64::from(obs.gpus);
            let cap = u64::from(self.unit_cap);
            let mut node_count = match_count;
            // Equivalent to removing one node at a time until under the cap.
            if gpus * node_count > cap {
                node_count = cap / gpus;
            }
            let product = gpus * node_count;

            if node_count == 0 || product == 0 {
                trace!(
                    partition = %obs.partition,
                    gpus = obs.gpus,
                    cpus_per_gpu = obs.cpus_per_gpu,
                    "observation discarded"
                );
                continue;
            }

            // Both values are bounded by the u32 cap at this point.
            let candidate = AllocationCandidate {
                total_units: product as u32,
                gpus_per_node: obs.gpus,
                node_count: node_count as u32,
                cpus_per_gpu: obs.cpus_per_gpu,
            };

            let replace = match best.get(&obs.partition) {
                None => true,
                Some(kept) => Self::replaces(kept, &candidate),
            };
            if replace {
                best.insert(obs.partition.clone(), candidate);
            }
        }

        for (partition, c) in &best {
            debug!(
                partition = %partition,
                total_units = c.total_units,
                gpus_per_node = c.gpus_per_node,
                node_count = c.node_count,
                cpus_per_gpu = c.cpus_per_gpu,
                "best allocation"
            );
        }
        best
    }

    fn replaces(kept: &AllocationCandidate, new: &AllocationCandidate) -> bool {
        new.total_units > kept.total_units
            || (new.total_units == kept.total_units
                && new.cpus_per_gpu > kept.cpus_per_gpu
                && kept.node_count >= new.node_count)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
