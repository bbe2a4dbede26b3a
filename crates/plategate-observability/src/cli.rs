// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-plategate-decision`, `--debug-all`, etc.

use std::collections::HashMap;
use std::env;

use crate::{crate_target, KNOWN_CRATES};

/// Per-crate debug flags parsed from command-line arguments
///
/// # Example
/// ```rust
/// use plategate_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-plategate-decision".to_string()]);
/// assert!(flags.is_enabled("plategate-decision"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CrateDebugFlags {
    pub enabled_crates: HashMap<String, bool>,
}

impl CrateDebugFlags {
    /// Parse debug flags from command-line arguments
    ///
    /// Looks for arguments matching `--debug-{crate-name}` pattern.
    /// Also supports `--debug-all` to enable all crates.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut enabled_crates = HashMap::new();
        let mut debug_all = false;

        for arg in args {
            if arg == "--debug-all" {
                debug_all = true;
                continue;
            }

            if let Some(crate_name) = arg.strip_prefix("--debug-") {
                enabled_crates.insert(crate_name.to_string(), true);
            }
        }

        if debug_all {
            for crate_name in KNOWN_CRATES {
                enabled_crates.insert(crate_name.to_string(), true);
            }
        }

        CrateDebugFlags { enabled_crates }
    }

    /// Check if debug is enabled for a specific crate
    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains_key(crate_name)
    }

    /// Check if debug is enabled for any crate
    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// Get log level for a crate
    ///
    /// Returns `tracing::Level::DEBUG` if enabled, `tracing::Level::INFO` otherwise.
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Create a tracing filter from debug flags
    ///
    /// Returns a filter string usable with `EnvFilter`, e.g.
    /// `"plategate_decision=debug,info"`, or just `base_level` when no crate is flagged.
    pub fn to_filter_string(&self, base_level: &str) -> String {
        let base_level = base_level.to_lowercase();
        if self.enabled_crates.is_empty() {
            return base_level;
        }

        let mut crate_names: Vec<&String> = self.enabled_crates.keys().collect();
        crate_names.sort();

        let mut filters: Vec<String> = crate_names
            .into_iter()
            .map(|crate_name| format!("{}=debug", crate_target(crate_name)))
            .collect();
        filters.push(base_level);
        filters.join(",")
    }
}

/// Parse debug flags from the process arguments and `PLATEGATE_DEBUG`
///
/// Environment variable format: comma-separated crate names, e.g.
/// `"plategate-decision,plategate-hal"`, or `"all"`.
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());

    if let Ok(env_var) = env::var("PLATEGATE_DEBUG") {
        merge_env_flags(&mut flags, &env_var);
    }

    flags
}

fn merge_env_flags(flags: &mut CrateDebugFlags, env_var: &str) {
    if env_var == "all" {
        for crate_name in KNOWN_CRATES {
            flags.enabled_crates.insert(crate_name.to_string(), true);
        }
    } else {
        for crate_name in env_var.split(',') {
            let crate_name = crate_name.trim();
            if !crate_name.is_empty() {
                flags.enabled_crates.insert(crate_name.to_string(), true);
            }
        }
    }
}

/// Generate help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  PLATEGATE_DEBUG={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  PLATEGATE_DEBUG=all                               Enable debug for all crates
"#,
        KNOWN_CRATES.join(", ")
    )
}
