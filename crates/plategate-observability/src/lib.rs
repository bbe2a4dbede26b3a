// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # plategate-observability
//!
//! Logging setup shared by every PlateGate binary, with per-crate debug flag
//! support.
//!
//! ## Features
//! - `file-logging`: per-crate JSON log files with daily rotation and run retention

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known PlateGate crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "plategate",
    "plategate-config",
    "plategate-decision",
    "plategate-hal",
    "plategate-structures",
];

/// Tracing target for a crate name (`plategate-decision` -> `plategate_decision`)
pub fn crate_target(crate_name: &str) -> String {
    crate_name.replace('-', "_")
}
