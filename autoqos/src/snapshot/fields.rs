/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! `Key=Value` field map for one node detail block.
//!
//! `scontrol show node` prints several fields per line, separated by spaces,
//! and some values contain spaces themselves (`OS=Linux 5.15.0 #1 SMP`).
//! A whitespace token starts a new field when it looks like `Key=...` with a
//! CamelCase key; any other token is glued onto the previous value.

use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct NodeFields {
    fields: HashMap<String, String>,
}

impl NodeFields {
    pub fn parse(block: &str) -> Self {
        let mut fields: HashMap<String, String> = HashMap::new();

        for line in block.lines() {
            // Continuations never cross a line break.
            let mut current: Option<String> = None;

            for token in line.split_whitespace() {
                if let Some((key, value)) = split_field(token) {
                    fields.insert(key.to_string(), value.to_string());
                    current = Some(key.to_string());
                } else if let Some(key) = &current {
                    if let Some(value) = fields.get_mut(key) {
                        if !value.is_empty() {
                            value.push(' ');
                        }
                        value.push_str(token);
                    }
                }
            }
        }

        Self { fields }
    }

    /// Value of `key`, trimmed.  `Some("")` for a present-but-empty field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(|v| v.trim())
    }
}

/// `Key=value` → `(Key, value)` when `Key` is a scheduler field name.
fn split_field(token: &str) -> Option<(&str, &str)> {
    let (key, value) = token.split_once('=')?;
    let mut chars = key.chars();
    let first = chars.next()?;
    if first.is_ascii_uppercase() && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some((key, value))
    } else {
        None
    }
}
