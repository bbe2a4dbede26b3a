// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # PlateGate Configuration System
//!
//! Type-safe configuration loader with support for:
//! - TOML file parsing
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! ## Usage
//!
//! ```rust,no_run
//! use plategate_config::{load_config, PlateGateConfig};
//!
//! let config = load_config(None, None).expect("Failed to load config");
//!
//! println!("Scan interval: {:?}", config.scan.interval());
//! println!("Fuzzy threshold: {}", config.matching.fuzzy_threshold);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{apply_cli_overrides, apply_environment_overrides, find_config_file, load_config};
pub use types::*;
pub use validation::{validate_config, ConfigValidationError};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Malformed allow-list at line {line}: {reason}")]
    MalformedAllowList { line: usize, reason: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_types_compile() {
        let _config = PlateGateConfig::default();
    }

    #[test]
    fn test_malformed_allow_list_message() {
        let err = ConfigError::MalformedAllowList {
            line: 3,
            reason: "control character".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed allow-list at line 3: control character"
        );
    }
}
