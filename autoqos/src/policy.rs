/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Partition policy table: which QoS a partition may be submitted under.
//!
//! The table is a headerless three-column CSV:
//!
//! ```text
//! a100_part,normal|a100_qos,
//! rtx3090,normal,unused
//! ```
//!
//! The second column is a `|`-separated list of allowed QoS names; the last
//! one is used for generated commands.  The third column is ignored.  Row
//! order is preserved because it drives the order of the generated output.

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Partitions that never receive recommendations.
pub const ALWAYS_EXCLUDED: [&str; 2] = ["test", "maintenance"];

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("cannot open partition policy file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid partition policy table: {0}")]
    Csv(#[from] csv::Error),

    #[error("partition policy row {row} has {fields} column(s), expected 3")]
    WrongColumnCount { row: usize, fields: usize },
}

/// One row of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPolicy {
    pub partition: String,
    /// Allowed QoS names, in table order.
    pub qos: Vec<String>,
}

impl PartitionPolicy {
    /// The QoS used for generated commands (the last allowed one).
    pub fn preferred_qos(&self) -> Option<&str> {
        self.qos.last().map(String::as_str)
    }
}

/// All rows of the policy table, in file order.
#[derive(Debug, Default, Clone)]
pub struct PolicyTable {
    entries: Vec<PartitionPolicy>,
}

impl PolicyTable {
    pub fn load_from_file(path: &Path) -> Result<Self, PolicyError> {
        info!("Loading partition policy from: {}", path.display());
        let file = std::fs::File::open(path).map_err(|source| PolicyError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PolicyError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut entries = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            if record.len() != 3 {
                return Err(PolicyError::WrongColumnCount {
                    row: i + 1,
                    fields: record.len(),
                });
            }

            let partition = record[0].to_string();
            let qos: Vec<String> = record[1]
                .split('|')
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string)
                .collect();

            if qos.is_empty() {
                warn!(partition = %partition, "no QoS listed, partition skipped");
                continue;
            }
            debug!(partition = %partition, qos = ?qos, "policy entry");
            entries.push(PartitionPolicy { partition, qos });
        }

        info!("Loaded {} partition policy entries", entries.len());
        Ok(Self { entries })
    }

    /// Rows in file order.
    pub fn entries(&self) -> &[PartitionPolicy] {
        &self.entries
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn entry<'a>(table: &'a PolicyTable, partition: &str) -> Option<&'a PartitionPolicy> {
        table.entries().iter().find(|e| e.partition == partition)
    }

    #[test]
    fn last_qos_is_preferred() {
        let table = PolicyTable::from_reader("a100_part,normal|a100_qos,\n".as_bytes()).unwrap();
        let row = entry(&table, "a100_part").unwrap();
        assert_eq!(row.qos, vec!["normal", "a100_qos"]);
        assert_eq!(row.preferred_qos(), Some("a100_qos"));
    }

    #[test]
    fn row_order_is_preserved() {
        let table = PolicyTable::from_reader("z,q1,\na,q2,x\nm,q3,\n".as_bytes()).unwrap();
        let names: Vec<_> = table.entries().iter().map(|e| e.partition.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn whitespace_is_trimmed() {
        let table = PolicyTable::from_reader(" gpu , normal | big ,\n".as_bytes()).unwrap();
        assert_eq!(table.entries()[0].partition, "gpu");
        assert_eq!(table.entries()[0].qos, vec!["normal", "big"]);
    }

    #[test]
    fn rows_without_qos_are_skipped() {
        let table = PolicyTable::from_reader("gpu,,\ncpu,normal,\n".as_bytes()).unwrap();
        assert_eq!(table.entries().len(), 1);
        assert!(entry(&table, "gpu").is_none());
    }

    #[test]
    fn wrong_column_count_is_an_error() {
        let err = PolicyTable::from_reader("gpu,normal\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            PolicyError::WrongColumnCount { row: 1, fields: 2 }
        ));
    }

    #[test]
    fn load_from_file() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"a100_part,a100_qos,\nrtx3090,normal|rtx_qos,\n").unwrap();
        let table = PolicyTable::load_from_file(f.path()).unwrap();
        assert_eq!(table.entries().len(), 2);
        assert_eq!(entry(&table, "rtx3090").unwrap().preferred_qos(), Some("rtx_qos"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = PolicyTable::load_from_file(Path::new("/nonexistent/partitions.csv")).unwrap_err();
        assert!(matches!(err, PolicyError::Open { .. }));
    }
}
