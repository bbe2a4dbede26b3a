// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `plategate_configuration.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Converts a seconds value from the file into a `Duration`.
///
/// Negative, NaN and overflowing values collapse to zero; `validate_config`
/// reports them before they get this far.
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PlateGateConfig {
    pub system: SystemConfig,
    pub allow_list: AllowListConfig,
    pub scan: ScanConfig,
    pub matching: MatchingConfig,
    pub capture: CaptureConfig,
    pub actuator: ActuatorConfig,
    pub debug: DebugConfig,
}

/// System-level configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

/// Allow-list source
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AllowListConfig {
    pub path: PathBuf,
}

impl Default for AllowListConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("allowed_plates.txt"),
        }
    }
}

/// Scan scheduling: how often a scan may run and how long to stay quiet after a grant
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    pub interval_secs: f64,
    pub cooldown_secs: f64,
    /// Start in ReadyToScan instead of waiting out one interval
    pub scan_on_start: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval_secs: 6.0,
            cooldown_secs: 10.0,
            scan_on_start: false,
        }
    }
}

impl ScanConfig {
    pub fn interval(&self) -> Duration {
        secs(self.interval_secs)
    }

    pub fn cooldown(&self) -> Duration {
        secs(self.cooldown_secs)
    }
}

/// Recognition fusion and allow-list matching
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub fuzzy_threshold: f64,
    /// Hypotheses at or below this confidence are dropped before fusion
    pub noise_floor: f32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.8,
            noise_floor: 0.3,
        }
    }
}

/// Observation capture and region-of-interest geometry
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub roi_width_fraction: f64,
    pub roi_height_fraction: f64,
    pub padding: u32,
    pub retry_delay_secs: f64,
    /// Frame size used by sources that synthesize frames (replay)
    pub frame_width: u32,
    pub frame_height: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            roi_width_fraction: 0.4,
            roi_height_fraction: 0.25,
            padding: 15,
            retry_delay_secs: 0.5,
            frame_width: 640,
            frame_height: 480,
        }
    }
}

impl CaptureConfig {
    pub fn retry_delay(&self) -> Duration {
        secs(self.retry_delay_secs)
    }
}

/// Serial actuator link
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ActuatorConfig {
    pub enabled: bool,
    pub port: String,
    pub baud_rate: u32,
    pub grant_token: String,
    pub ack_timeout_secs: f64,
    /// Wait after opening the port; most boards reset when the line opens
    pub settle_delay_secs: f64,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            grant_token: "OK".to_string(),
            ack_timeout_secs: 1.0,
            settle_delay_secs: 2.0,
        }
    }
}

impl ActuatorConfig {
    pub fn ack_timeout(&self) -> Duration {
        secs(self.ack_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        secs(self.settle_delay_secs)
    }
}

/// Offline inspection artifacts
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DebugConfig {
    pub save_artifacts: bool,
    pub artifact_dir: PathBuf,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            save_artifacts: false,
            artifact_dir: PathBuf::from("debug"),
        }
    }
}
