/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Partition status table and the (state, partition) → nodes index.
//!
//! The status table is the plain `sinfo` listing:
//!
//! ```text
//! PARTITION AVAIL  TIMELIMIT  NODES  STATE NODELIST
//! a100*        up   infinite      3   mix anode[01-03]
//! a100         up   infinite      1  idle anode04
//! ```
//!
//! Every row is expanded with [`crate::nodelist::expand`] and filed under its
//! state and partition.  Node order inside a group is the expansion order,
//! rows for the same group are appended in table order.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::nodelist::{self, NodeListError};

// ── PartitionState ────────────────────────────────────────────────────────────

/// Scheduler-reported state of a node group.
///
/// Only [`Idle`](Self::Idle) and [`Mixed`](Self::Mixed) groups are considered
/// for recommendations.  State strings carrying a flag suffix (`idle*` for a
/// non-responding node, `mix~` for a powered-down one, ...) are *not*
/// normalised and land in [`Other`](Self::Other).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PartitionState {
    Idle,
    Mixed,
    Allocated,
    Completing,
    Drained,
    Down,
    Other(String),
}

impl PartitionState {
    /// Map the abbreviated `sinfo` state column onto a state.
    pub fn from_sinfo(raw: &str) -> Self {
        match raw {
            "idle" => PartitionState::Idle,
            "mix" | "mixed" => PartitionState::Mixed,
            "alloc" | "allocated" => PartitionState::Allocated,
            "comp" | "completing" => PartitionState::Completing,
            "drain" | "drained" | "drng" | "draining" => PartitionState::Drained,
            "down" => PartitionState::Down,
            other => PartitionState::Other(other.to_string()),
        }
    }

    /// `true` for the states that can accept new work.
    pub fn is_schedulable(&self) -> bool {
        matches!(self, PartitionState::Idle | PartitionState::Mixed)
    }
}

impl std::fmt::Display for PartitionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartitionState::Idle => write!(f, "idle"),
            PartitionState::Mixed => write!(f, "mix"),
            PartitionState::Allocated => write!(f, "alloc"),
            PartitionState::Completing => write!(f, "comp"),
            PartitionState::Drained => write!(f, "drain"),
            PartitionState::Down => write!(f, "down"),
            PartitionState::Other(raw) => write!(f, "{}", raw),
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// A status-table row that could not be indexed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusTableError {
    /// The row did not have exactly six whitespace-separated fields.
    #[error("status row {line_no} has {fields} field(s), expected 6: '{line}'")]
    MalformedRow {
        line_no: usize,
        fields: usize,
        line: String,
    },

    /// The NODELIST column could not be expanded.
    #[error("status row {line_no}: {source}")]
    NodeList {
        line_no: usize,
        #[source]
        source: NodeListError,
    },
}

// ── PartitionIndex ────────────────────────────────────────────────────────────

/// Nodes grouped by state, then by partition name.
///
/// `BTreeMap` at both levels so that iteration order is deterministic.
#[derive(Debug, Default, Clone)]
pub struct PartitionIndex {
    groups: BTreeMap<PartitionState, BTreeMap<String, Vec<String>>>,

    /// Rows that were skipped, kept so the caller can report them.
    rejected: Vec<StatusTableError>,
}

impl PartitionIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from the full status table text.
    ///
    /// The header line (starting with `PARTITION`) and blank lines are
    /// skipped.  A malformed row is logged and recorded in
    /// [`rejected`](Self::rejected); the remaining rows are still indexed.
    pub fn from_status_table(text: &str) -> Self {
        let mut index = Self::new();

        for (i, line) in text.lines().enumerate() {
            let line_no = i + 1;
            if line.trim().is_empty() || line.starts_with("PARTITION") {
                continue;
            }
            if let Err(e) = index.add_row(line_no, line) {
                warn!(error = %e, "skipping status row");
                index.rejected.push(e);
            }
        }

        debug!(
            groups = index.groups.values().map(|p| p.len()).sum::<usize>(),
            rejected = index.rejected.len(),
            "partition index built"
        );
        index
    }

    fn add_row(&mut self, line_no: usize, line: &str) -> Result<(), StatusTableError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let &[partition, _avail, _timelimit, _nodes, state, nodelist] = fields.as_slice() else {
            return Err(StatusTableError::MalformedRow {
                line_no,
                fields: fields.len(),
                line: line.to_string(),
            });
        };

        let nodes = nodelist::expand(nodelist)
            .map_err(|source| StatusTableError::NodeList { line_no, source })?;

        // `sinfo` marks the default partition with a trailing '*'.
        let partition = partition.trim_end_matches('*');
        self.insert(PartitionState::from_sinfo(state), partition, nodes);
        Ok(())
    }

    /// Append `nodes` to the (`state`, `partition`) group.
    pub fn insert(&mut self, state: PartitionState, partition: &str, nodes: Vec<String>) {
        self.groups
            .entry(state)
            .or_default()
            .entry(partition.to_string())
            .or_default()
            .extend(nodes);
    }

    /// Nodes of `partition` in `state`, in expansion order.  Empty if the
    /// group does not exist.
    pub fn nodes(&self, state: &PartitionState, partition: &str) -> &[String] {
        self.groups
            .get(state)
            .and_then(|p| p.get(partition))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All partitions reported in `state`, sorted by name.
    pub fn partitions_in<'a>(
        &'a self,
        state: &PartitionState,
    ) -> impl Iterator<Item = (&'a str, &'a [String])> + 'a {
        self.groups
            .get(state)
            .into_iter()
            .flat_map(|p| p.iter().map(|(name, nodes)| (name.as_str(), nodes.as_slice())))
    }

    /// Rows that could not be indexed.
    pub fn rejected(&self) -> &[StatusTableError] {
        &self.rejected
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
