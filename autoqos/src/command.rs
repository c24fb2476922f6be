/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Job-submission command synthesis.
//!
//! Two outputs are produced from the parsed resources:
//!
//! * an interactive `srun` command for one node ([`CommandSynthesizer`]);
//! * three `#SBATCH` resource directives for a partition-wide allocation
//!   ([`ResourcePatch`]), which [`patch_script`] writes into an existing
//!   batch script.

use tracing::{debug, warn};

use crate::optimizer::AllocationCandidate;
use crate::snapshot::ResourceSnapshot;

/// Wall-clock limit used when none is configured.
pub const DEFAULT_TIME_LIMIT: &str = "72:0:0";

/// GRES type written into resource patches.
pub const DEFAULT_GRES_TYPE: &str = "gpu";

// ── CommandSynthesizer ────────────────────────────────────────────────────────

/// Builds one interactive submission command per node.
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    time_limit: String,
}

impl Default for CommandSynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_LIMIT)
    }
}

impl CommandSynthesizer {
    pub fn new(time_limit: impl Into<String>) -> Self {
        Self {
            time_limit: time_limit.into(),
        }
    }

    /// Command requesting everything `snapshot` has free, under `qos_name`.
    ///
    /// A node without a device gets a CPU-only request.  Otherwise the
    /// request pins one node, asks for all free devices and the node's
    /// CPU-per-device ratio.
    pub fn synthesize(&self, snapshot: &ResourceSnapshot, qos_name: &str) -> String {
        let qos = qos_name.trim();
        match snapshot.device_name() {
            None => format!(
                "srun --partition={} --time={} --nodes=1 --qos={} --pty bash -i",
                snapshot.partitions(),
                self.time_limit,
                qos,
            ),
            Some(device) => format!(
                "srun --partition={} --time={} --nodes=1 --cpus-per-gpu={} --qos={} --gres={}:{} --pty bash -i",
                snapshot.partitions(),
                self.time_limit,
                snapshot.cpu_per_device(),
                qos,
                device,
                snapshot.available_device_count(),
            ),
        }
    }

    /// Resource directives for a partition-wide `candidate`.
    pub fn synthesize_patch(candidate: &AllocationCandidate) -> ResourcePatch {
        ResourcePatch {
            node_count: candidate.node_count,
            cpus_per_gpu: candidate.cpus_per_gpu,
            gres_spec: format!("{}:{}", DEFAULT_GRES_TYPE, candidate.gpus_per_node),
        }
    }
}

// ── ResourcePatch ─────────────────────────────────────────────────────────────

/// The three resource directives that replace those of a batch script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePatch {
    pub node_count: u32,
    pub cpus_per_gpu: u32,
    /// `<type>:<gpus per node>`.
    pub gres_spec: String,
}

impl ResourcePatch {
    pub fn nodes_line(&self) -> String {
        format!("#SBATCH --nodes={}", self.node_count)
    }

    pub fn cpus_per_gpu_line(&self) -> String {
        format!("#SBATCH --cpus-per-gpu={}", self.cpus_per_gpu)
    }

    pub fn gres_line(&self) -> String {
        format!("#SBATCH --gres={}", self.gres_spec)
    }
}

impl std::fmt::Display for ResourcePatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.nodes_line())?;
        writeln!(f, "{}", self.cpus_per_gpu_line())?;
        write!(f, "{}", self.gres_line())
    }
}

// ── Script patching ───────────────────────────────────────────────────────────

/// Which directives [`patch_script`] found and replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchOutcome {
    pub nodes: bool,
    pub cpus_per_gpu: bool,
    pub gres: bool,
}

impl PatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.nodes && self.cpus_per_gpu && self.gres
    }
}

/// Overwrite the resource directives of `script` with `patch`.
///
/// The first line containing `--nodes=`, the first containing
/// `--cpus-per-gpu=` and the first containing `--gres=` are replaced; later
/// occurrences and every other line are left untouched.  A line is matched
/// against the three keys in that order and consumed by the first one that
/// is still unreplaced.
pub fn patch_script(script: &str, patch: &ResourcePatch) -> (String, PatchOutcome) {
    let mut outcome = PatchOutcome::default();
    let mut out = String::with_capacity(script.len());

    for line in script.split_inclusive('\n') {
        let newline = if line.ends_with("\r\n") {
            "\r\n"
        } else if line.ends_with('\n') {
            "\n"
        } else {
            ""
        };

        let replacement = if line.contains("--nodes=") && !outcome.nodes {
            outcome.nodes = true;
            Some(patch.nodes_line())
        } else if line.contains("--cpus-per-gpu=") && !outcome.cpus_per_gpu {
            outcome.cpus_per_gpu = true;
            Some(patch.cpus_per_gpu_line())
        } else if line.contains("--gres=") && !outcome.gres {
            outcome.gres = true;
            Some(patch.gres_line())
        } else {
            None
        };

        match replacement {
            Some(new_line) => {
                debug!(old = line.trim_end(), new = %new_line, "directive replaced");
                out.push_str(&new_line);
                out.push_str(newline);
            }
            None => out.push_str(line),
        }
    }

    if !outcome.is_complete() {
        warn!(?outcome, "not every resource directive was found in the script");
    }
    (out, outcome)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
