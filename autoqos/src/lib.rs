/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! autoqos – idle GPU capacity recommender for Slurm clusters
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── nodelist/      – bracket node-list expansion (`anode[01-03,07]`)
//! ├── partition      – status table → (state, partition) → nodes index
//! ├── snapshot/      – node detail block → per-node resource snapshot
//! ├── optimizer      – best (gpus per node × nodes) per partition
//! ├── command        – srun commands and #SBATCH resource patches
//! ├── policy         – partition → allowed QoS table (CSV)
//! ├── provider       – scheduler CLI access behind a trait
//! ├── report/        – one recommender run and its output, idle cost
//! └── config/        – YAML configuration
//! ```

pub mod command;
pub mod config;
pub mod nodelist;
pub mod optimizer;
pub mod partition;
pub mod policy;
pub mod provider;
pub mod report;
pub mod snapshot;
