// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Ensures configuration values are within valid ranges before any component
//! turns them into durations, thresholds or serial settings.

use crate::{ConfigError, ConfigResult, PlateGateConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    OutOfRange { field: String, value: f64, min: f64, max: f64 },
    InvalidDuration { field: String, value: f64 },
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => {
                write!(
                    f,
                    "{} = {} is outside valid range ({}-{})",
                    field, value, min, max
                )
            }
            Self::InvalidDuration { field, value } => {
                write!(
                    f,
                    "{} = {} is not a valid duration (must be finite and non-negative)",
                    field, value
                )
            }
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Threshold and fraction ranges
/// - Durations that can be represented
/// - Required fields
/// - Actuator protocol constraints
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &PlateGateConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_ranges(config, &mut errors);
    validate_durations(config, &mut errors);
    validate_required_fields(config, &mut errors);
    validate_actuator(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn check_range(
    field: &str,
    value: f64,
    min: f64,
    max: f64,
    errors: &mut Vec<ConfigValidationError>,
) {
    // NaN fails both comparisons, so test for containment instead
    if !(min..=max).contains(&value) {
        errors.push(ConfigValidationError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
}

fn validate_ranges(config: &PlateGateConfig, errors: &mut Vec<ConfigValidationError>) {
    check_range(
        "matching.fuzzy_threshold",
        config.matching.fuzzy_threshold,
        0.0,
        1.0,
        errors,
    );
    check_range(
        "matching.noise_floor",
        config.matching.noise_floor as f64,
        0.0,
        1.0,
        errors,
    );
    check_range(
        "capture.roi_width_fraction",
        config.capture.roi_width_fraction,
        0.0,
        1.0,
        errors,
    );
    check_range(
        "capture.roi_height_fraction",
        config.capture.roi_height_fraction,
        0.0,
        1.0,
        errors,
    );
}

fn validate_durations(config: &PlateGateConfig, errors: &mut Vec<ConfigValidationError>) {
    let durations = [
        ("scan.interval_secs", config.scan.interval_secs),
        ("scan.cooldown_secs", config.scan.cooldown_secs),
        ("capture.retry_delay_secs", config.capture.retry_delay_secs),
        ("actuator.ack_timeout_secs", config.actuator.ack_timeout_secs),
        ("actuator.settle_delay_secs", config.actuator.settle_delay_secs),
    ];

    for (field, value) in durations {
        if std::time::Duration::try_from_secs_f64(value).is_err() {
            errors.push(ConfigValidationError::InvalidDuration {
                field: field.to_string(),
                value,
            });
        }
    }

    if config.scan.interval_secs == 0.0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "scan.interval_secs".to_string(),
            reason: "must be positive".to_string(),
        });
    }
}

fn validate_required_fields(config: &PlateGateConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.allow_list.path.as_os_str().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "allow_list.path".to_string(),
        });
    }

    if config.actuator.enabled && config.actuator.port.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "actuator.port".to_string(),
        });
    }

    if config.debug.save_artifacts && config.debug.artifact_dir.as_os_str().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "debug.artifact_dir".to_string(),
        });
    }
}

fn validate_actuator(config: &PlateGateConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.actuator.grant_token.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "actuator.grant_token".to_string(),
        });
    } else if config.actuator.grant_token.contains(['\n', '\r']) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "actuator.grant_token".to_string(),
            reason: "must not contain line breaks".to_string(),
        });
    }

    if config.actuator.baud_rate == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "actuator.baud_rate".to_string(),
            reason: "must be positive".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlateGateConfig;

    #[test]
    fn test_default_config_is_valid() {
        let config = PlateGateConfig::default();
        let result = validate_config(&config);
        if let Err(e) = &result {
            eprintln!("Validation error: {}", e);
        }
        assert!(result.is_ok());
    }

    #[test]
    fn test_threshold_out_of_range() {
        let mut config = PlateGateConfig::default();
        config.matching.fuzzy_threshold = 1.5;

        let result = validate_config(&config);
        assert!(result.is_err());

        if let Err(ConfigError::ValidationError(msg)) = result {
            assert!(msg.contains("matching.fuzzy_threshold"));
            assert!(msg.contains("outside valid range"));
        }
    }

    #[test]
    fn test_nan_threshold_rejected() {
        let mut config = PlateGateConfig::default();
        config.matching.fuzzy_threshold = f64::NAN;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_negative_cooldown_rejected() {
        let mut config = PlateGateConfig::default();
        config.scan.cooldown_secs = -1.0;

        let result = validate_config(&config);
        if let Err(ConfigError::ValidationError(msg)) = result {
            assert!(msg.contains("scan.cooldown_secs"));
        } else {
            panic!("negative cooldown should fail validation");
        }
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = PlateGateConfig::default();
        config.scan.interval_secs = 0.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_grant_token_with_newline_rejected() {
        let mut config = PlateGateConfig::default();
        config.actuator.grant_token = "OK\n".to_string();

        let result = validate_config(&config);
        if let Err(ConfigError::ValidationError(msg)) = result {
            assert!(msg.contains("actuator.grant_token"));
            assert!(msg.contains("line breaks"));
        } else {
            panic!("token with newline should fail validation");
        }
    }

    #[test]
    fn test_missing_port_only_matters_when_enabled() {
        let mut config = PlateGateConfig::default();
        config.actuator.port = String::new();
        assert!(validate_config(&config).is_err());

        config.actuator.enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_all_errors_reported_together() {
        let mut config = PlateGateConfig::default();
        config.matching.noise_floor = 2.0;
        config.actuator.baud_rate = 0;

        if let Err(ConfigError::ValidationError(msg)) = validate_config(&config) {
            assert!(msg.contains("matching.noise_floor"));
            assert!(msg.contains("actuator.baud_rate"));
        } else {
            panic!("expected validation failure");
        }
    }
}
