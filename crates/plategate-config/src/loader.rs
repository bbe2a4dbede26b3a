// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{validate_config, ConfigError, ConfigResult, PlateGateConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "plategate_configuration.toml";

/// Find the PlateGate configuration file
///
/// Search order:
/// 1. `PLATEGATE_CONFIG_PATH` environment variable
/// 2. Current working directory: `./plategate_configuration.toml`
/// 3. Parent directories (searches up to 5 levels)
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("PLATEGATE_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        } else {
            return Err(ConfigError::FileNotFound(format!(
                "Config file specified by PLATEGATE_CONFIG_PATH not found: {}",
                path.display()
            )));
        }
    }

    let mut search_paths = Vec::new();

    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "PlateGate configuration file '{}' not found in any of these locations:\n{}\n\nSet PLATEGATE_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Returns
///
/// Complete, validated `PlateGateConfig` with all overrides applied
///
/// # Errors
///
/// Returns error if config file is not found, contains invalid TOML, or fails validation
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<PlateGateConfig> {
    let config_file = if let Some(path) = config_path {
        path.to_path_buf()
    } else {
        find_config_file()?
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: PlateGateConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    validate_config(&config)?;

    Ok(config)
}

fn parse_flag(value: &str) -> bool {
    let lowered = value.to_lowercase();
    lowered == "true" || lowered == "1" || lowered == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `PLATEGATE_LOG_LEVEL` -> `system.log_level`
/// - `PLATEGATE_ALLOW_LIST` -> `allow_list.path`
/// - `PLATEGATE_SCAN_INTERVAL` -> `scan.interval_secs`
/// - `PLATEGATE_COOLDOWN` -> `scan.cooldown_secs`
/// - `PLATEGATE_FUZZY_THRESHOLD` -> `matching.fuzzy_threshold`
/// - `PLATEGATE_SERIAL_PORT` -> `actuator.port`
/// - `PLATEGATE_BAUD_RATE` -> `actuator.baud_rate`
/// - `PLATEGATE_ACTUATOR_ENABLED` -> `actuator.enabled`
/// - `PLATEGATE_SAVE_ARTIFACTS` -> `debug.save_artifacts`
///
/// Values that fail to parse are ignored and the file value is kept.
pub fn apply_environment_overrides(config: &mut PlateGateConfig) {
    if let Ok(value) = env::var("PLATEGATE_LOG_LEVEL") {
        config.system.log_level = value;
    }
    if let Ok(value) = env::var("PLATEGATE_ALLOW_LIST") {
        config.allow_list.path = PathBuf::from(value);
    }

    if let Ok(value) = env::var("PLATEGATE_SCAN_INTERVAL") {
        if let Ok(secs) = value.parse::<f64>() {
            config.scan.interval_secs = secs;
        }
    }
    if let Ok(value) = env::var("PLATEGATE_COOLDOWN") {
        if let Ok(secs) = value.parse::<f64>() {
            config.scan.cooldown_secs = secs;
        }
    }

    if let Ok(value) = env::var("PLATEGATE_FUZZY_THRESHOLD") {
        if let Ok(threshold) = value.parse::<f64>() {
            config.matching.fuzzy_threshold = threshold;
        }
    }

    if let Ok(value) = env::var("PLATEGATE_SERIAL_PORT") {
        config.actuator.port = value;
    }
    if let Ok(value) = env::var("PLATEGATE_BAUD_RATE") {
        if let Ok(baud) = value.parse::<u32>() {
            config.actuator.baud_rate = baud;
        }
    }
    if let Ok(value) = env::var("PLATEGATE_ACTUATOR_ENABLED") {
        config.actuator.enabled = parse_flag(&value);
    }

    if let Ok(value) = env::var("PLATEGATE_SAVE_ARTIFACTS") {
        config.debug.save_artifacts = parse_flag(&value);
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"serial_port": "/dev/ttyACM0", "cooldown": "15"}`)
pub fn apply_cli_overrides(config: &mut PlateGateConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("log_level") {
        config.system.log_level = value.clone();
    }
    if let Some(value) = cli_args.get("allow_list") {
        config.allow_list.path = PathBuf::from(value);
    }

    if let Some(value) = cli_args.get("scan_interval") {
        if let Ok(secs) = value.parse::<f64>() {
            config.scan.interval_secs = secs;
        }
    }
    if let Some(value) = cli_args.get("cooldown") {
        if let Ok(secs) = value.parse::<f64>() {
            config.scan.cooldown_secs = secs;
        }
    }

    if let Some(value) = cli_args.get("fuzzy_threshold") {
        if let Ok(threshold) = value.parse::<f64>() {
            config.matching.fuzzy_threshold = threshold;
        }
    }

    if let Some(value) = cli_args.get("serial_port") {
        config.actuator.port = value.clone();
    }
    if let Some(value) = cli_args.get("actuator_enabled") {
        config.actuator.enabled = parse_flag(value);
    }

    if let Some(value) = cli_args.get("save_artifacts") {
        config.debug.save_artifacts = parse_flag(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var("PLATEGATE_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("PLATEGATE_CONFIG_PATH");

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var("PLATEGATE_CONFIG_PATH", "/definitely/not/here.toml");
        let result = find_config_file();
        env::remove_var("PLATEGATE_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let saved_interval = env::var("PLATEGATE_SCAN_INTERVAL").ok();
        env::remove_var("PLATEGATE_SCAN_INTERVAL");
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[scan]").unwrap();
        writeln!(file, "interval_secs = 3.5").unwrap();
        writeln!(file, "[actuator]").unwrap();
        writeln!(file, "port = \"/dev/cu.usbserial-110\"").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.scan.interval_secs, 3.5);
        assert_eq!(config.scan.cooldown_secs, 10.0);
        assert_eq!(config.actuator.port, "/dev/cu.usbserial-110");
        assert_eq!(config.matching.fuzzy_threshold, 0.8);

        if let Some(value) = saved_interval {
            env::set_var("PLATEGATE_SCAN_INTERVAL", value);
        }
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[scan\ninterval_secs = ").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[matching]\nfuzzy_threshold = 1.7\n").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = PlateGateConfig::default();

        env::set_var("PLATEGATE_SERIAL_PORT", "/dev/ttyACM1");
        env::set_var("PLATEGATE_COOLDOWN", "15");
        env::set_var("PLATEGATE_ACTUATOR_ENABLED", "no");

        apply_environment_overrides(&mut config);

        env::remove_var("PLATEGATE_SERIAL_PORT");
        env::remove_var("PLATEGATE_COOLDOWN");
        env::remove_var("PLATEGATE_ACTUATOR_ENABLED");

        assert_eq!(config.actuator.port, "/dev/ttyACM1");
        assert_eq!(config.scan.cooldown_secs, 15.0);
        assert!(!config.actuator.enabled);
    }

    #[test]
    fn test_environment_override_ignores_garbage() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = PlateGateConfig::default();

        env::set_var("PLATEGATE_FUZZY_THRESHOLD", "very fuzzy");
        apply_environment_overrides(&mut config);
        env::remove_var("PLATEGATE_FUZZY_THRESHOLD");

        assert_eq!(config.matching.fuzzy_threshold, 0.8);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = PlateGateConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("fuzzy_threshold".to_string(), "0.9".to_string());
        cli_args.insert("save_artifacts".to_string(), "true".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.matching.fuzzy_threshold, 0.9);
        assert!(config.debug.save_artifacts);
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        // CLI overrides take precedence over environment variables
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[scan]").unwrap();
        writeln!(file, "interval_secs = 4.0").unwrap();
        writeln!(file, "cooldown_secs = 8.0").unwrap();

        env::set_var("PLATEGATE_SCAN_INTERVAL", "5");
        env::set_var("PLATEGATE_COOLDOWN", "12");

        let mut cli_args = HashMap::new();
        cli_args.insert("scan_interval".to_string(), "7".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();

        env::remove_var("PLATEGATE_SCAN_INTERVAL");
        env::remove_var("PLATEGATE_COOLDOWN");

        // CLI wins for interval, env wins for cooldown (no CLI override)
        assert_eq!(config.scan.interval_secs, 7.0);
        assert_eq!(config.scan.cooldown_secs, 12.0);
    }
}
