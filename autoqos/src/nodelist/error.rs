/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Error type for node-list expansion.
//!
//! A malformed expression is fatal for that expression only: the expander
//! never returns a partially expanded list.  The caller decides whether the
//! surrounding status row is skipped or the whole run is aborted.

use thiserror::Error;

/// Why a node-list expression could not be expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    /// A `[` without a matching `]`, or a `]` without an opening `[`.
    UnbalancedBrackets,

    /// A `[` inside an already open range group.
    NestedBrackets,

    /// More than one bracketed group in a single segment
    /// (`rack[1-2]node[01-04]`), which this grammar does not model.
    MultipleRangeGroups,

    /// Two consecutive separators, or a leading/trailing comma.
    EmptySegment,

    /// A range bound or single index that is not a decimal integer.
    InvalidBound(String),

    /// `start-end` with `start > end`.
    ReversedRange { start: String, end: String },

    /// `start-end` spanning more than [`MAX_RANGE_LEN`](super::MAX_RANGE_LEN)
    /// indices.
    RangeTooLarge { start: String, end: String },
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MalformedReason::UnbalancedBrackets => write!(f, "unbalanced brackets"),
            MalformedReason::NestedBrackets => write!(f, "nested brackets are not supported"),
            MalformedReason::MultipleRangeGroups => {
                write!(f, "only one bracketed range group per node name is supported")
            }
            MalformedReason::EmptySegment => write!(f, "empty segment"),
            MalformedReason::InvalidBound(token) => {
                write!(f, "'{}' is not a numeric index", token)
            }
            MalformedReason::ReversedRange { start, end } => {
                write!(f, "range start {} is greater than range end {}", start, end)
            }
            MalformedReason::RangeTooLarge { start, end } => write!(
                f,
                "range {}-{} exceeds {} nodes",
                start,
                end,
                super::MAX_RANGE_LEN
            ),
        }
    }
}

/// Error returned by [`expand`](super::expand).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeListError {
    #[error("malformed node expression '{expression}': {reason}")]
    MalformedNodeExpression {
        expression: String,
        reason: MalformedReason,
    },
}

impl NodeListError {
    pub(crate) fn malformed(expression: &str, reason: MalformedReason) -> Self {
        NodeListError::MalformedNodeExpression {
            expression: expression.to_string(),
            reason,
        }
    }
}
