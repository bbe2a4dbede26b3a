// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
PlateGate Replay Runner

Runs the decision loop against a JSON-lines replay script instead of a camera
and an OCR engine, and prints one line per scan decision.

Usage:
  cargo run --bin plategate-replay -- --script scan.jsonl [--config plategate_configuration.toml]

Example:
  cargo run --bin plategate-replay -- --script demos/gate_morning.jsonl --allow-list allowed_plates.txt --debug plategate-decision
*/

use anyhow::{Context, Result};
use clap::Parser;
use plategate::prelude::*;
use plategate::config::{
    apply_cli_overrides, apply_environment_overrides, load_config, validate_config, ConfigError,
};
use plategate::hal::StdTimeProvider;
use plategate::observability::{init_logging, parse_debug_flags, KNOWN_CRATES};
use std::collections::HashMap;
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const CONFIG_PATH_VAR: &str = "PLATEGATE_CONFIG_PATH";

/// Replay a recorded gate session through the PlateGate decision loop
#[derive(Parser, Debug)]
#[command(name = "plategate-replay", version, long_about = None)]
struct Args {
    /// Replay script (JSON lines, one frame per line)
    #[arg(short, long)]
    script: PathBuf,

    /// Configuration file (default: search for plategate_configuration.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Allow-list file, overrides the configuration
    #[arg(short, long)]
    allow_list: Option<PathBuf>,

    /// Fuzzy match threshold, overrides the configuration
    #[arg(long)]
    fuzzy_threshold: Option<f64>,

    /// Signal grants to the real actuator instead of running in demo mode
    #[arg(long, default_value_t = false)]
    use_actuator: bool,

    /// Enable debug logging for a crate (repeatable)
    #[arg(long = "debug", value_name = "CRATE")]
    debug: Vec<String>,

    /// Enable debug logging for all crates (also PLATEGATE_DEBUG=all)
    #[arg(long = "debug-all", default_value_t = false)]
    debug_all: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (config, defaulted) = resolve_config(&args)?;

    let mut debug_flags = parse_debug_flags();
    if args.debug_all {
        for crate_name in KNOWN_CRATES {
            debug_flags.enabled_crates.insert(crate_name.to_string(), true);
        }
    }
    for crate_name in &args.debug {
        debug_flags.enabled_crates.insert(crate_name.clone(), true);
    }
    let _logging = init_logging(
        &debug_flags,
        &config.system.log_level,
        config.system.log_dir.clone(),
        None,
        None,
    )?;
    if let Some(searched) = defaulted {
        warn!("[REPLAY] No configuration file found ({}), using defaults", searched);
    }

    let allow_list = AllowList::load(&config.allow_list.path)
        .with_context(|| format!("Failed to load allow-list {}", config.allow_list.path.display()))?;
    info!("[REPLAY] Loaded {} authorized plates", allow_list.len());

    let script = ReplayScript::load(&args.script)?;
    info!(
        "[REPLAY] {} frames from {}",
        script.len(),
        args.script.display()
    );

    let gateway: Box<dyn ActuatorGateway> = if args.use_actuator {
        open_gateway(&config.actuator, &StdTimeProvider::new())
    } else {
        Box::new(NullGateway)
    };

    let driver = ReplayDriver::from_config(script, &config.capture);
    let mut decision_loop = DecisionLoop::new(&config, allow_list, driver.collaborators(gateway));
    let clock = driver.clock();

    let stats = decision_loop.run_with(|decision| {
        println!("{:>9.3}s  {}", clock.now().as_secs_f64(), decision);
    })?;

    println!(
        "frames: {}  capture failures: {}  scans: {}  grants: {}",
        stats.frames, stats.capture_failures, stats.scans, stats.grants
    );
    Ok(())
}

/// Load the configuration file, or fall back to defaults when none exists
///
/// The second value carries the searched locations when defaults were used;
/// logging is not up yet at this point. A path named by `--config` or
/// `PLATEGATE_CONFIG_PATH` must exist.
fn resolve_config(args: &Args) -> Result<(PlateGateConfig, Option<String>)> {
    let overrides = cli_overrides(args);
    let searched_only = config_path_unset(
        args.config.as_deref(),
        env::var_os(CONFIG_PATH_VAR).as_deref(),
    );

    match load_config(args.config.as_deref(), Some(&overrides)) {
        Ok(config) => Ok((config, None)),
        Err(ConfigError::FileNotFound(searched)) if searched_only => {
            let mut config = PlateGateConfig::default();
            apply_environment_overrides(&mut config);
            apply_cli_overrides(&mut config, &overrides);
            validate_config(&config)?;
            Ok((config, Some(searched)))
        }
        Err(e) => Err(e).with_context(|| {
            format!(
                "Failed to load configuration {}",
                args.config
                    .as_deref()
                    .unwrap_or(Path::new("plategate_configuration.toml"))
                    .display()
            )
        }),
    }
}

/// True when neither the command line nor the environment names a file
fn config_path_unset(cli_path: Option<&Path>, env_path: Option<&OsStr>) -> bool {
    cli_path.is_none() && env_path.map_or(true, |p| p.is_empty())
}

fn cli_overrides(args: &Args) -> HashMap<String, String> {
    let mut overrides = HashMap::new();
    if let Some(path) = &args.allow_list {
        overrides.insert("allow_list".to_string(), path.display().to_string());
    }
    if let Some(threshold) = args.fuzzy_threshold {
        overrides.insert("fuzzy_threshold".to_string(), threshold.to_string());
    }
    overrides
}
