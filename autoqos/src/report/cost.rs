/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Hourly cost of GPUs left idle.
//!
//! Partitions are matched to a device family by case-insensitive substring
//! (`big_suma_a100` → `a100`).  The price table is an ordered list and the
//! first matching family wins, so a partition name that contains two family
//! names is priced deterministically and only once.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Price of one device of a family, per hour.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DevicePrice {
    pub family: String,
    pub price_per_device: f64,
}

impl DevicePrice {
    pub fn new(family: impl Into<String>, price_per_device: f64) -> Self {
        Self {
            family: family.into(),
            price_per_device,
        }
    }
}

/// Ordered price list, first match wins.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct PriceTable {
    entries: Vec<DevicePrice>,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::new(vec![
            DevicePrice::new("a100", 1.89),
            DevicePrice::new("4090", 0.74),
            DevicePrice::new("a6000", 0.79),
            DevicePrice::new("3090", 0.44),
        ])
    }
}

impl PriceTable {
    pub fn new(entries: Vec<DevicePrice>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DevicePrice] {
        &self.entries
    }

    /// Price of the first family contained in `partition`.
    pub fn price_for(&self, partition: &str) -> Option<&DevicePrice> {
        let partition = partition.to_lowercase();
        self.entries
            .iter()
            .find(|p| partition.contains(&p.family.to_lowercase()))
    }

    /// `Σ unused_devices × price` over all partitions with a known family.
    pub fn wasted_cost(&self, empty_devices: &BTreeMap<String, u32>) -> f64 {
        empty_devices
            .iter()
            .filter_map(|(partition, &count)| {
                self.price_for(partition)
                    .map(|p| f64::from(count) * p.price_per_device)
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty(list: &[(&str, u32)]) -> BTreeMap<String, u32> {
        list.iter().map(|(p, n)| (p.to_string(), *n)).collect()
    }

    #[test]
    fn single_partition_cost() {
        let table = PriceTable::new(vec![DevicePrice::new("a100", 1.89)]);
        let cost = table.wasted_cost(&empty(&[("a100_part", 3)]));
        assert!((cost - 5.67).abs() < 1e-9, "got {cost}");
    }

    #[test]
    fn match_is_case_insensitive() {
        let table = PriceTable::default();
        assert_eq!(table.price_for("SUMA_A100").unwrap().family, "a100");
        assert_eq!(table.price_for("big_suma_rtx3090").unwrap().family, "3090");
        assert!(table.price_for("cpu_only").is_none());
    }

    #[test]
    fn first_listed_family_wins() {
        let table = PriceTable::new(vec![
            DevicePrice::new("4090", 0.74),
            DevicePrice::new("a100", 1.89),
        ]);
        assert_eq!(table.price_for("a100_4090_mix").unwrap().family, "4090");
        let cost = table.wasted_cost(&empty(&[("a100_4090_mix", 2)]));
        assert!((cost - 1.48).abs() < 1e-9, "got {cost}");
    }

    #[test]
    fn unknown_families_cost_nothing() {
        let table = PriceTable::default();
        let cost = table.wasted_cost(&empty(&[("cpu", 10), ("rtx4090", 1)]));
        assert!((cost - 0.74).abs() < 1e-9, "got {cost}");
    }
}
