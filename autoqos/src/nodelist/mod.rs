/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Expansion of the scheduler's compressed node-list notation.
//!
//! ```text
//! anode[01,03-05,07],bnode[01-02],cnode9
//!   └─► anode01 anode03 anode04 anode05 anode07 bnode01 bnode02 cnode9
//! ```
//!
//! # Grammar
//! * An expression is a comma-separated list of *segments*.  Commas inside a
//!   bracketed group do not separate segments; brackets never nest.
//! * A segment is either a bare node name or `prefix[spec]suffix`.
//! * `spec` is a comma-separated list of single indices (`07`) or inclusive
//!   ranges (`03-05`).  Every expanded index is zero-padded to the width of
//!   the token it came from (the `start` token for ranges).
//! * A `spec` with neither comma nor dash (`node[gpu]`) is kept verbatim,
//!   brackets included.
//!
//! Expansion order is segment order first, then ascending index order
//! inside each range.  Downstream display and waste accounting rely on it.

pub mod error;

pub use error::{MalformedReason, NodeListError};

/// Largest number of names a single `start-end` range may produce.
pub const MAX_RANGE_LEN: u64 = 100_000;

/// Expand `expression` into the ordered list of concrete node names.
///
/// An empty (or whitespace-only) expression expands to an empty list.
///
/// # Errors
/// [`NodeListError::MalformedNodeExpression`] on unbalanced or nested
/// brackets, empty segments, non-numeric indices, reversed ranges and
/// ranges longer than [`MAX_RANGE_LEN`].
/// Nothing is returned for a malformed expression, not even the segments
/// that preceded the fault.
pub fn expand(expression: &str) -> Result<Vec<String>, NodeListError> {
    let expression = expression.trim();
    if expression.is_empty() {
        return Ok(Vec::new());
    }

    let mut nodes = Vec::new();
    for segment in split_segments(expression)? {
        if segment.is_empty() {
            return Err(NodeListError::malformed(
                expression,
                MalformedReason::EmptySegment,
            ));
        }
        expand_segment(expression, segment, &mut nodes)?;
    }
    Ok(nodes)
}

/// Split on top-level commas, tracking bracket depth.
fn split_segments(expression: &str) -> Result<Vec<&str>, NodeListError> {
    let mut segments = Vec::new();
    let mut inside_bracket = false;
    let mut start = 0usize;

    for (i, c) in expression.char_indices() {
        match c {
            '[' if inside_bracket => {
                return Err(NodeListError::malformed(
                    expression,
                    MalformedReason::NestedBrackets,
                ));
            }
            '[' => inside_bracket = true,
            ']' if !inside_bracket => {
                return Err(NodeListError::malformed(
                    expression,
                    MalformedReason::UnbalancedBrackets,
                ));
            }
            ']' => inside_bracket = false,
            ',' if !inside_bracket => {
                segments.push(&expression[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if inside_bracket {
        return Err(NodeListError::malformed(
            expression,
            MalformedReason::UnbalancedBrackets,
        ));
    }
    segments.push(&expression[start..]);
    Ok(segments)
}

/// Expand one segment and append the result to `out`.
///
/// `split_segments` has already verified that brackets are balanced and not
/// nested, so the first `]` always closes the first `[`.
fn expand_segment(
    expression: &str,
    segment: &str,
    out: &mut Vec<String>,
) -> Result<(), NodeListError> {
    let (open, close) = match (segment.find('['), segment.find(']')) {
        (Some(open), Some(close)) => (open, close),
        _ => {
            out.push(segment.to_string());
            return Ok(());
        }
    };

    let prefix = &segment[..open];
    let spec = &segment[open + 1..close];
    let suffix = &segment[close + 1..];

    if suffix.contains('[') {
        return Err(NodeListError::malformed(
            expression,
            MalformedReason::MultipleRangeGroups,
        ));
    }

    // Non-numeric bracket content the scheduler sometimes emits.
    if !spec.contains(',') && !spec.contains('-') {
        out.push(segment.to_string());
        return Ok(());
    }

    // Expand into a scratch buffer so a later bad token leaves `out` intact.
    let mut expanded = Vec::new();
    for item in spec.split(',') {
        if item.is_empty() {
            return Err(NodeListError::malformed(
                expression,
                MalformedReason::EmptySegment,
            ));
        }

        match item.split_once('-') {
            Some((start, end)) => {
                let first = parse_index(expression, start)?;
                let last = parse_index(expression, end)?;
                if first > last {
                    return Err(NodeListError::malformed(
                        expression,
                        MalformedReason::ReversedRange {
                            start: start.to_string(),
                            end: end.to_string(),
                        },
                    ));
                }
                if last - first >= MAX_RANGE_LEN {
                    return Err(NodeListError::malformed(
                        expression,
                        MalformedReason::RangeTooLarge {
                            start: start.to_string(),
                            end: end.to_string(),
                        },
                    ));
                }
                let width = start.len();
                expanded.extend(
                    (first..=last).map(|i| format!("{prefix}{i:0width$}{suffix}")),
                );
            }
            None => {
                parse_index(expression, item)?;
                expanded.push(format!("{prefix}{item}{suffix}"));
            }
        }
    }

    out.extend(expanded);
    Ok(())
}

fn parse_index(expression: &str, token: &str) -> Result<u64, NodeListError> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NodeListError::malformed(
            expression,
            MalformedReason::InvalidBound(token.to_string()),
        ));
    }
    token.parse::<u64>().map_err(|_| {
        NodeListError::malformed(expression, MalformedReason::InvalidBound(token.to_string()))
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn reason_of(expression: &str) -> MalformedReason {
        match expand(expression).unwrap_err() {
            NodeListError::MalformedNodeExpression { reason, .. } => reason,
        }
    }

    // ── Well-formed expressions ───────────────────────────────────────────────

    #[test]
    fn bare_node_name_is_returned_as_is() {
        assert_eq!(expand("node01").unwrap(), names(&["node01"]));
    }

    #[test]
    fn mixed_singletons_and_ranges() {
        assert_eq!(
            expand("anode[01,03-05,07]").unwrap(),
            names(&["anode01", "anode03", "anode04", "anode05", "anode07"])
        );
    }

    #[test]
    fn top_level_commas_concatenate_in_order() {
        assert_eq!(
            expand("anode[01-03],bnode[01-03]").unwrap(),
            names(&["anode01", "anode02", "anode03", "bnode01", "bnode02", "bnode03"])
        );
    }

    #[test]
    fn bare_and_bracketed_segments_mix() {
        assert_eq!(
            expand("head,gpu[1-2],login").unwrap(),
            names(&["head", "gpu1", "gpu2", "login"])
        );
    }

    #[test]
    fn padding_width_follows_start_token() {
        assert_eq!(expand("node[1-3]").unwrap(), names(&["node1", "node2", "node3"]));
        assert_eq!(
            expand("node[01-03]").unwrap(),
            names(&["node01", "node02", "node03"])
        );
        // Crossing a decade keeps the start token's width as a minimum.
        assert_eq!(
            expand("n[8-10]").unwrap(),
            names(&["n8", "n9", "n10"])
        );
        assert_eq!(
            expand("n[098-101]").unwrap(),
            names(&["n098", "n099", "n100", "n101"])
        );
    }

    #[test]
    fn suffix_after_group_is_appended() {
        assert_eq!(
            expand("node[1-2]-ib").unwrap(),
            names(&["node1-ib", "node2-ib"])
        );
    }

    #[test]
    fn literal_bracket_content_is_kept_verbatim() {
        assert_eq!(expand("node[gpu]").unwrap(), names(&["node[gpu]"]));
        assert_eq!(expand("node[05]").unwrap(), names(&["node[05]"]));
    }

    #[test]
    fn empty_expression_expands_to_nothing() {
        assert!(expand("").unwrap().is_empty());
        assert!(expand("   ").unwrap().is_empty());
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(expand("  a[1-2]\n").unwrap(), names(&["a1", "a2"]));
    }

    // ── Malformed expressions ─────────────────────────────────────────────────

    #[test]
    fn unclosed_bracket_is_rejected() {
        assert_eq!(reason_of("node[01-03"), MalformedReason::UnbalancedBrackets);
    }

    #[test]
    fn stray_closing_bracket_is_rejected() {
        assert_eq!(reason_of("node01]"), MalformedReason::UnbalancedBrackets);
    }

    #[test]
    fn nested_brackets_are_rejected() {
        assert_eq!(reason_of("node[0[1]]"), MalformedReason::NestedBrackets);
    }

    #[test]
    fn non_numeric_bound_is_rejected() {
        assert_eq!(
            reason_of("node[01-ab]"),
            MalformedReason::InvalidBound("ab".to_string())
        );
        assert_eq!(
            reason_of("node[01,x]"),
            MalformedReason::InvalidBound("x".to_string())
        );
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert!(matches!(
            reason_of("node[05-01]"),
            MalformedReason::ReversedRange { .. }
        ));
    }

    #[test]
    fn oversized_range_is_rejected() {
        assert_eq!(
            reason_of("n[0-4000000000]"),
            MalformedReason::RangeTooLarge {
                start: "0".to_string(),
                end: "4000000000".to_string(),
            }
        );
        assert_eq!(expand("n[1-100000]").unwrap().len(), 100_000);
        assert!(expand("n[0-100000]").is_err());
    }

    #[test]
    fn empty_segments_are_rejected() {
        assert_eq!(reason_of("a,,b"), MalformedReason::EmptySegment);
        assert_eq!(reason_of("a[1,,2]"), MalformedReason::EmptySegment);
    }

    #[test]
    fn two_groups_in_one_segment_are_rejected() {
        assert_eq!(
            reason_of("rack[1-2]node[01-02]"),
            MalformedReason::MultipleRangeGroups
        );
    }

    #[test]
    fn error_message_names_the_expression() {
        let err = expand("gpu[01-").unwrap_err();
        assert!(err.to_string().contains("gpu[01-"), "got: {err}");
    }

    // ── Round trip ────────────────────────────────────────────────────────────

    /// Compress a sorted index set into the bracket grammar, grouping
    /// consecutive runs into ranges.
    fn compress(prefix: &str, width: usize, indices: &BTreeSet<u32>) -> String {
        let mut parts = Vec::new();
        let mut iter = indices.iter().copied().peekable();
        while let Some(start) = iter.next() {
            let mut end = start;
            while iter.peek() == Some(&(end + 1)) {
                end = iter.next().unwrap_or(end);
            }
            if start == end {
                parts.push(format!("{start:0width$}"));
            } else {
                parts.push(format!("{start:0width$}-{end:0width$}"));
            }
        }
        if parts.len() == 1 && !parts[0].contains('-') {
            format!("{prefix}{}", parts[0])
        } else {
            format!("{prefix}[{}]", parts.join(","))
        }
    }

    proptest! {
        #[test]
        fn compressed_sets_expand_back_to_the_same_names(
            prefix in "[a-z]{1,6}",
            width in 1usize..=4,
            raw in proptest::collection::btree_set(0u32..10_000, 1..40),
        ) {
            let limit = 10u32.pow(width as u32);
            let indices: BTreeSet<u32> = raw.into_iter().filter(|i| *i < limit).collect();
            prop_assume!(!indices.is_empty());

            let expected: Vec<String> = indices
                .iter()
                .map(|i| format!("{prefix}{i:0width$}"))
                .collect();
            let expression = compress(&prefix, width, &indices);

            prop_assert_eq!(expand(&expression).unwrap(), expected);
        }

        #[test]
        fn independent_groups_concatenate(
            a in proptest::collection::btree_set(0u32..100, 1..10),
            b in proptest::collection::btree_set(0u32..100, 1..10),
        ) {
            let left = compress("anode", 2, &a);
            let right = compress("bnode", 2, &b);
            let mut expected = expand(&left).unwrap();
            expected.extend(expand(&right).unwrap());

            prop_assert_eq!(expand(&format!("{left},{right}")).unwrap(), expected);
        }
    }
}
