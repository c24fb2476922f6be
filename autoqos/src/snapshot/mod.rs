/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-node resource snapshot parsed from a node detail block.
//!
//! ```text
//! scontrol show node anode01 ──► NodeFields ──► ResourceSnapshot
//!                                 (Key=Value)     device, counts, CPUs, partitions
//! ```
//!
//! # Device count precedence
//! 1. `Gres=gpu:8` – first `:` token is the device, last is the total.
//! 2. If that last token is not a plain number (`gpu:a100:8(S:0-1)`,
//!    `(null)`), the last `gres/<name>=<count>` entry of `CfgTRES=` supplies
//!    both the device and the total.  No entry at all means a CPU-only node.
//! 3. `AllocTRES=`:
//!    * empty → nothing allocated; device and total are refreshed from
//!      `CfgTRES=` when it has a `gres/` entry, and everything is available;
//!    * `gres/<name>=<n>` entries → available = total − n.  When several
//!      entries are present the last one wins (heterogeneous multi-type
//!      nodes are not modelled);
//!    * only non-GRES `key=value` entries → no device is allocated;
//!    * anything else → [`NodeParseError::NoGresFound`].

pub mod error;
pub mod fields;

pub use error::NodeParseError;
use fields::NodeFields;

const GRES_FIELD: &str = "Gres";
const ADDR_FIELD: &str = "NodeAddr";
const CFG_TRES_FIELD: &str = "CfgTRES";
const ALLOC_TRES_FIELD: &str = "AllocTRES";
const PARTITIONS_FIELD: &str = "Partitions";
const CPU_ALLOC_FIELD: &str = "CPUAlloc";
const CPU_TOT_FIELD: &str = "CPUTot";

// ── ResourceSnapshot ──────────────────────────────────────────────────────────

/// Resources a single node can offer right now.
///
/// Fields are private so that `available_device_count ≤ total_device_count`
/// holds for every value that exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSnapshot {
    node_name: String,
    address: String,
    device_name: Option<String>,
    total_device_count: u32,
    available_device_count: u32,
    cpu_available_count: u32,
    partitions: String,
}

impl ResourceSnapshot {
    /// Build a snapshot from already-extracted values.
    ///
    /// A node with no configured device (`total_device_count == 0`) is
    /// CPU-only whatever `device_name` says.
    ///
    /// # Errors
    /// [`NodeParseError::AvailableExceedsTotal`] if more devices are
    /// available than configured.
    pub fn new(
        node_name: impl Into<String>,
        device_name: Option<String>,
        total_device_count: u32,
        available_device_count: u32,
        cpu_available_count: u32,
        partitions: impl Into<String>,
    ) -> Result<Self, NodeParseError> {
        let node_name = node_name.into();
        if available_device_count > total_device_count {
            return Err(NodeParseError::AvailableExceedsTotal {
                node: node_name,
                available: available_device_count,
                total: total_device_count,
            });
        }
        Ok(Self {
            address: node_name.clone(),
            node_name,
            device_name: device_name.filter(|d| total_device_count > 0 && !is_null_device(d)),
            total_device_count,
            available_device_count,
            cpu_available_count,
            partitions: partitions.into(),
        })
    }

    /// Parse the detail block reported for `node_name`.
    ///
    /// # Errors
    /// * [`NodeParseError::MissingField`] – a required field is absent.
    /// * [`NodeParseError::InvalidNumber`] – a count is not an integer.
    /// * [`NodeParseError::NoGresFound`] – `AllocTRES=` is not interpretable.
    /// * [`NodeParseError::AllocationExceedsTotal`] – allocation above total.
    pub fn parse(node_name: &str, block: &str) -> Result<Self, NodeParseError> {
        let fields = NodeFields::parse(block);
        let require = |field: &'static str| {
            fields.get(field).ok_or_else(|| NodeParseError::MissingField {
                node: node_name.to_string(),
                field,
            })
        };

        let gres = require(GRES_FIELD)?;
        let address = require(ADDR_FIELD)?;
        let cfg_tres = require(CFG_TRES_FIELD)?;
        let alloc_tres = require(ALLOC_TRES_FIELD)?;
        let partitions = require(PARTITIONS_FIELD)?;
        let cpu_alloc = parse_count(node_name, CPU_ALLOC_FIELD, require(CPU_ALLOC_FIELD)?)?;
        let cpu_tot = parse_count(node_name, CPU_TOT_FIELD, require(CPU_TOT_FIELD)?)?;

        // ── Total from Gres=, CfgTRES= as fallback ───────────────────────────
        let mut device_name = gres.split(':').next().map(str::to_string);
        let last_token = gres.rsplit(':').next().unwrap_or_default();
        let mut total = if is_plain_number(last_token) {
            parse_count(node_name, GRES_FIELD, last_token)?
        } else {
            match configured_gres(node_name, cfg_tres)? {
                Some((name, count)) => {
                    device_name = Some(name);
                    count
                }
                None => 0,
            }
        };

        // ── Availability from AllocTRES= ─────────────────────────────────────
        let available = if alloc_tres.is_empty() {
            if let Some((name, count)) = configured_gres(node_name, cfg_tres)? {
                device_name = Some(name);
                total = count;
            }
            total
        } else {
            let mut available = None;
            for entry in alloc_tres.split(',') {
                let Some(gres_entry) = entry.strip_prefix("gres/") else {
                    continue;
                };
                let (name, count) = split_tres(node_name, ALLOC_TRES_FIELD, gres_entry)?;
                let remaining = total.checked_sub(count).ok_or_else(|| {
                    NodeParseError::AllocationExceedsTotal {
                        node: node_name.to_string(),
                        resource: name.clone(),
                        allocated: count,
                        total,
                    }
                })?;
                device_name = Some(name);
                available = Some(remaining);
            }

            match available {
                Some(available) => available,
                // Allocation tracked as generic TRES only: no device is in use.
                None if alloc_tres.contains('=') => total,
                None => {
                    return Err(NodeParseError::NoGresFound {
                        node: node_name.to_string(),
                        alloc_tres: alloc_tres.to_string(),
                    })
                }
            }
        };

        let cpu_available_count =
            cpu_tot
                .checked_sub(cpu_alloc)
                .ok_or_else(|| NodeParseError::AllocationExceedsTotal {
                    node: node_name.to_string(),
                    resource: "CPU".to_string(),
                    allocated: cpu_alloc,
                    total: cpu_tot,
                })?;

        let mut snapshot = Self::new(
            node_name,
            device_name,
            total,
            available,
            cpu_available_count,
            partitions,
        )?;
        snapshot.address = address.to_string();
        Ok(snapshot)
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// `NodeAddr=` of the node.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Accelerator type, or `None` for a node without GRES.
    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    pub fn total_device_count(&self) -> u32 {
        self.total_device_count
    }

    pub fn available_device_count(&self) -> u32 {
        self.available_device_count
    }

    /// `CPUTot − CPUAlloc`.
    pub fn cpu_available_count(&self) -> u32 {
        self.cpu_available_count
    }

    /// Free CPUs per free device, rounded down.  A node with no free device
    /// divides by one.
    pub fn cpu_per_device(&self) -> u32 {
        self.cpu_available_count / self.available_device_count.max(1)
    }

    /// Raw `Partitions=` value, used verbatim in generated commands.
    pub fn partitions(&self) -> &str {
        &self.partitions
    }

    /// `true` when the node has no accelerator at all.
    pub fn is_cpu_only(&self) -> bool {
        self.device_name.is_none()
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn is_null_device(name: &str) -> bool {
    name.is_empty() || name.contains("null")
}

fn is_plain_number(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn parse_count(node: &str, field: &'static str, value: &str) -> Result<u32, NodeParseError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| NodeParseError::InvalidNumber {
            node: node.to_string(),
            field,
            value: value.to_string(),
        })
}

/// `gpu:a100=3` → `("gpu:a100", 3)`.
fn split_tres(
    node: &str,
    field: &'static str,
    entry: &str,
) -> Result<(String, u32), NodeParseError> {
    let (name, count) = entry
        .split_once('=')
        .ok_or_else(|| NodeParseError::InvalidNumber {
            node: node.to_string(),
            field,
            value: entry.to_string(),
        })?;
    Ok((name.to_string(), parse_count(node, field, count)?))
}

/// Last `gres/<name>=<count>` entry of `CfgTRES=`, if any.
fn configured_gres(node: &str, cfg_tres: &str) -> Result<Option<(String, u32)>, NodeParseError> {
    cfg_tres
        .split(',')
        .filter_map(|entry| entry.strip_prefix("gres/"))
        .last()
        .map(|entry| split_tres(node, CFG_TRES_FIELD, entry))
        .transpose()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Detail block in the layout `scontrol show node` prints.
    fn block(gres: &str, cfg: &str, alloc: &str, cpu_alloc: u32, cpu_tot: u32) -> String {
        format!(
            "NodeName=anode01 Arch=x86_64 CoresPerSocket=16 \n\
             \x20  CPUAlloc={cpu_alloc} CPUEfctv={cpu_tot} CPUTot={cpu_tot} CPULoad=3.01\n\
             \x20  AvailableFeatures=(null)\n\
             \x20  ActiveFeatures=(null)\n\
             \x20  Gres={gres}\n\
             \x20  NodeAddr=anode01 NodeHostName=anode01 Version=23.02.4\n\
             \x20  OS=Linux 5.15.0-91-generic #101-Ubuntu SMP\n\
             \x20  RealMemory=1000000 AllocMem=0 FreeMem=900000 Sockets=2 Boards=1\n\
             \x20  State=MIXED ThreadsPerCore=1 TmpDisk=0 Weight=1 Owner=N/A\n\
             \x20  Partitions=a100_part \n\
             \x20  CfgTRES={cfg}\n\
             \x20  AllocTRES={alloc}\n\
             \x20  CapWatts=n/a\n"
        )
    }

    // ── Device counts ─────────────────────────────────────────────────────────

    #[test]
    fn allocated_gres_is_subtracted_from_configured_total() {
        let text = block(
            "gpu:8",
            "cpu=64,mem=1000000M,billing=64,gres/gpu=8",
            "cpu=16,mem=64000M,gres/gpu=3",
            16,
            64,
        );
        let s = ResourceSnapshot::parse("anode01", &text).unwrap();
        assert_eq!(s.device_name(), Some("gpu"));
        assert_eq!(s.total_device_count(), 8);
        assert_eq!(s.available_device_count(), 5);
        assert_eq!(s.partitions(), "a100_part");
        assert_eq!(s.address(), "anode01");
    }

    #[test]
    fn symbolic_gres_falls_back_to_cfg_tres() {
        let text = block(
            "gpu:a100:8(S:0-1)",
            "cpu=64,mem=1000000M,billing=64,gres/gpu=8",
            "cpu=16,gres/gpu=3",
            16,
            64,
        );
        let s = ResourceSnapshot::parse("anode01", &text).unwrap();
        assert_eq!(s.total_device_count(), 8);
        assert_eq!(s.available_device_count(), 5);
        assert_eq!(s.device_name(), Some("gpu"));
    }

    #[test]
    fn fully_idle_node_has_everything_available() {
        let text = block("gpu:4", "cpu=32,mem=256000M,billing=32,gres/gpu=4", "", 0, 32);
        let s = ResourceSnapshot::parse("anode01", &text).unwrap();
        assert_eq!(s.total_device_count(), 4);
        assert_eq!(s.available_device_count(), 4);
        assert_eq!(s.cpu_available_count(), 32);
        assert_eq!(s.cpu_per_device(), 8);
    }

    #[test]
    fn last_gres_entry_wins_on_typed_allocations() {
        let text = block(
            "gpu:a100:8(S:0-1)",
            "cpu=64,gres/gpu=8,gres/gpu:a100=8",
            "cpu=8,gres/gpu=2,gres/gpu:a100=2",
            8,
            64,
        );
        let s = ResourceSnapshot::parse("anode01", &text).unwrap();
        assert_eq!(s.device_name(), Some("gpu:a100"));
        assert_eq!(s.total_device_count(), 8);
        assert_eq!(s.available_device_count(), 6);
    }

    #[test]
    fn cpu_only_allocation_leaves_devices_free() {
        let text = block("gpu:4", "cpu=32,gres/gpu=4", "cpu=4,mem=8000M", 4, 32);
        let s = ResourceSnapshot::parse("anode01", &text).unwrap();
        assert_eq!(s.available_device_count(), 4);
        assert_eq!(s.cpu_per_device(), 7);
    }

    #[test]
    fn node_without_gres_is_cpu_only() {
        let text = block("(null)", "cpu=64,mem=256000M,billing=64", "cpu=8", 8, 64);
        let s = ResourceSnapshot::parse("cnode01", &text).unwrap();
        assert!(s.is_cpu_only());
        assert_eq!(s.device_name(), None);
        assert_eq!(s.total_device_count(), 0);
        assert_eq!(s.available_device_count(), 0);
        assert_eq!(s.cpu_per_device(), 56);
    }

    #[test]
    fn zero_count_gres_is_cpu_only() {
        let text = block("gpu:0", "cpu=32,mem=128000M", "cpu=4", 4, 32);
        let s = ResourceSnapshot::parse("z01", &text).unwrap();
        assert!(s.is_cpu_only());
        assert_eq!(s.device_name(), None);
        assert_eq!(s.total_device_count(), 0);
        assert_eq!(s.available_device_count(), 0);
        assert_eq!(s.cpu_available_count(), 28);
    }

    #[test]
    fn zero_total_drops_device_name() {
        let s = ResourceSnapshot::new("n", Some("gpu".into()), 0, 0, 8, "p").unwrap();
        assert!(s.is_cpu_only());
        assert_eq!(s.device_name(), None);
    }

    // ── CPUs ──────────────────────────────────────────────────────────────────

    #[test]
    fn cpu_per_device_rounds_down() {
        let text = block("gpu:8", "cpu=64,gres/gpu=8", "cpu=16,gres/gpu=4", 16, 64);
        let s = ResourceSnapshot::parse("anode01", &text).unwrap();
        assert_eq!(s.cpu_available_count(), 48);
        assert_eq!(s.cpu_per_device(), 12);

        let text = block("gpu:8", "cpu=50,gres/gpu=8", "cpu=0,gres/gpu=1", 0, 50);
        let s = ResourceSnapshot::parse("anode01", &text).unwrap();
        assert_eq!(s.cpu_per_device(), 7);
    }

    #[test]
    fn fully_allocated_devices_divide_by_one() {
        let text = block("gpu:4", "cpu=32,gres/gpu=4", "cpu=30,gres/gpu=4", 30, 32);
        let s = ResourceSnapshot::parse("anode01", &text).unwrap();
        assert_eq!(s.available_device_count(), 0);
        assert_eq!(s.cpu_per_device(), 2);
    }

    // ── Failures ──────────────────────────────────────────────────────────────

    #[test]
    fn missing_field_names_node_and_field() {
        let text = block("gpu:4", "cpu=32,gres/gpu=4", "", 0, 32).replace("Partitions=", "Parts=");
        let err = ResourceSnapshot::parse("anode07", &text).unwrap_err();
        assert_eq!(
            err,
            NodeParseError::MissingField {
                node: "anode07".to_string(),
                field: "Partitions",
            }
        );
        assert!(err.to_string().contains("anode07"));
    }

    #[test]
    fn non_numeric_cpu_count_is_rejected() {
        let text = block("gpu:4", "cpu=32,gres/gpu=4", "", 0, 32).replace("CPUTot=32", "CPUTot=many");
        let err = ResourceSnapshot::parse("anode01", &text).unwrap_err();
        assert!(matches!(
            err,
            NodeParseError::InvalidNumber { field: "CPUTot", .. }
        ));
    }

    #[test]
    fn uninterpretable_alloc_tres_is_no_gres_found() {
        let text = block("gpu:4", "cpu=32,gres/gpu=4", "garbage", 0, 32);
        let err = ResourceSnapshot::parse("anode01", &text).unwrap_err();
        assert!(matches!(err, NodeParseError::NoGresFound { .. }));
    }

    #[test]
    fn over_allocation_is_rejected() {
        let text = block("gpu:4", "cpu=32,gres/gpu=4", "cpu=4,gres/gpu=6", 4, 32);
        let err = ResourceSnapshot::parse("anode01", &text).unwrap_err();
        assert!(matches!(
            err,
            NodeParseError::AllocationExceedsTotal { allocated: 6, total: 4, .. }
        ));
    }

    #[test]
    fn constructor_enforces_available_not_above_total() {
        assert!(ResourceSnapshot::new("n", Some("gpu".into()), 4, 5, 8, "p").is_err());
        let s = ResourceSnapshot::new("n", Some("gpu".into()), 4, 4, 8, "a,b").unwrap();
        assert_eq!(s.partitions(), "a,b");
    }

    #[test]
    fn null_device_name_is_normalised() {
        let s = ResourceSnapshot::new("n", Some("(null)".into()), 0, 0, 8, "p").unwrap();
        assert_eq!(s.device_name(), None);
    }
}
