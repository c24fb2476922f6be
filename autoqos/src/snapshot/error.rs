/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Errors raised while turning one node detail block into a
//! [`ResourceSnapshot`](super::ResourceSnapshot).
//!
//! Every variant names the node, so the caller can report the failure and
//! carry on with the remaining nodes.  A node with zero devices is *not* an
//! error: it yields a CPU-only snapshot.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeParseError {
    /// A required `Key=` field is absent from the block.
    #[error("node '{node}': missing field {field}=")]
    MissingField { node: String, field: &'static str },

    /// A field that must hold an integer does not.
    #[error("node '{node}': {field} value '{value}' is not a non-negative integer")]
    InvalidNumber {
        node: String,
        field: &'static str,
        value: String,
    },

    /// `AllocTRES=` is non-empty but carries neither a `gres/` entry nor any
    /// `key=count` pair the device count could be read from.
    #[error("node '{node}': no GRES found in AllocTRES '{alloc_tres}'")]
    NoGresFound { node: String, alloc_tres: String },

    /// More devices (or CPUs) are allocated than configured.
    #[error("node '{node}': {allocated} {resource} allocated but only {total} configured")]
    AllocationExceedsTotal {
        node: String,
        resource: String,
        allocated: u32,
        total: u32,
    },

    /// A snapshot was built with more free devices than configured.
    #[error("node '{node}': {available} device(s) available but only {total} configured")]
    AvailableExceedsTotal {
        node: String,
        available: u32,
        total: u32,
    },
}
