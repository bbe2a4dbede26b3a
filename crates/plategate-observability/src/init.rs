// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Unified logging initialization for PlateGate
//!
//! Console output is always on. With the `file-logging` feature, each run also
//! gets a timestamped folder of JSON log files with configurable retention.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

/// Keeps file writers alive for the lifetime of the process (they flush on drop)
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Run folder the log files are written to, if file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize logging
///
/// With `file-logging` enabled and a `log_dir` given, creates:
/// ```text
/// <log_dir>/
///   └── run_20250101_120000/
///       ├── plategate-decision.log
///       ├── plategate-hal.log
///       └── plategate.log (combined)
/// ```
///
/// # Arguments
/// * `debug_flags` - Per-crate debug flags for filtering
/// * `base_level` - Level for everything not flagged (e.g. `"info"`)
/// * `log_dir` - Base directory for log files; `None` keeps logging on the console only
/// * `retention_days` - Keep logs for N days (default: 30)
/// * `retention_runs` - Keep N most recent runs (default: 10)
pub fn init_logging(
    debug_flags: &CrateDebugFlags,
    base_level: &str,
    log_dir: Option<PathBuf>,
    retention_days: Option<u64>,
    retention_runs: Option<usize>,
) -> Result<LoggingGuard> {
    let filter = debug_flags.to_filter_string(base_level);
    let env_filter = EnvFilter::try_new(&filter)
        .with_context(|| format!("Invalid log filter: {}", filter))?;

    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(env_filter)
        .boxed();
    layers.push(console_layer);

    #[cfg(feature = "file-logging")]
    let (file_guards, run_folder) = match log_dir {
        Some(base_log_dir) => {
            let (file_layers, guards, run_folder) =
                file_layers(&base_log_dir, &filter, retention_days, retention_runs)?;
            layers.extend(file_layers);
            (guards, Some(run_folder))
        }
        None => (Vec::new(), None),
    };

    #[cfg(not(feature = "file-logging"))]
    let run_folder = {
        let _ = (retention_days, retention_runs);
        if let Some(dir) = &log_dir {
            eprintln!(
                "Warning: log_dir {} ignored, built without the file-logging feature",
                dir.display()
            );
        }
        None
    };

    Registry::default()
        .with(layers)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: file_guards,
        log_dir: run_folder,
    })
}

/// Initialize console-only logging at the given base level
pub fn init_logging_default(debug_flags: &CrateDebugFlags, base_level: &str) -> Result<LoggingGuard> {
    init_logging(debug_flags, base_level, None, None, None)
}

#[cfg(feature = "file-logging")]
fn file_layers(
    base_log_dir: &Path,
    filter: &str,
    retention_days: Option<u64>,
    retention_runs: Option<usize>,
) -> Result<(
    Vec<BoxedLayer>,
    Vec<tracing_appender::non_blocking::WorkerGuard>,
    PathBuf,
)> {
    use tracing_appender::rolling;

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let run_folder = base_log_dir.join(format!("run_{}", timestamp));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

    cleanup_old_logs(base_log_dir, retention_days, retention_runs)?;

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guards = Vec::new();

    // One file per crate
    for crate_name in crate::KNOWN_CRATES {
        let file_appender = rolling::daily(&run_folder, format!("{}.log", crate_name));
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        guards.push(guard);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(EnvFilter::new(format!(
                "off,{}=debug",
                crate::crate_target(crate_name)
            )))
            .boxed();
        layers.push(file_layer);
    }

    // Combined log file (all crates)
    let combined_appender = rolling::daily(&run_folder, "plategate.log");
    let (combined_non_blocking, combined_guard) = tracing_appender::non_blocking(combined_appender);
    guards.push(combined_guard);

    let combined_layer = tracing_subscriber::fmt::layer()
        .with_writer(combined_non_blocking)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .with_filter(EnvFilter::new(filter))
        .boxed();
    layers.push(combined_layer);

    Ok((layers, guards, run_folder))
}

/// Clean up old run directories based on retention policy
#[cfg(feature = "file-logging")]
fn cleanup_old_logs(
    base_log_dir: &Path,
    retention_days: Option<u64>,
    retention_runs: Option<usize>,
) -> Result<()> {
    use chrono::{NaiveDateTime, Utc};

    if !base_log_dir.exists() {
        return Ok(());
    }

    let retention_days = retention_days.unwrap_or(30);
    let retention_runs = retention_runs.unwrap_or(10);
    let cutoff_date = Utc::now().naive_utc() - chrono::Duration::days(retention_days as i64);

    let mut runs: Vec<(PathBuf, NaiveDateTime)> = Vec::new();

    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let timestamp = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix("run_"))
            .and_then(|ts| NaiveDateTime::parse_from_str(ts, "%Y%m%d_%H%M%S").ok());
        if let Some(dt) = timestamp {
            runs.push((path, dt));
        }
    }

    // Oldest first
    runs.sort_by_key(|(_, dt)| *dt);

    let (expired, kept): (Vec<_>, Vec<_>) = runs.into_iter().partition(|(_, dt)| *dt < cutoff_date);

    let excess = kept.len().saturating_sub(retention_runs);
    for (path, _) in expired.iter().chain(kept.iter().take(excess)) {
        if let Err(e) = std::fs::remove_dir_all(path) {
            eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            );
        }
    }

    Ok(())
}

#[cfg(all(test, feature = "file-logging"))]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_keeps_most_recent_runs() {
        let dir = tempfile::tempdir().unwrap();
        let now = chrono::Utc::now();
        for hours_ago in 0..4 {
            let ts = (now - chrono::Duration::hours(hours_ago)).format("%Y%m%d_%H%M%S");
            std::fs::create_dir(dir.path().join(format!("run_{}", ts))).unwrap();
        }
        std::fs::create_dir(dir.path().join("not_a_run")).unwrap();

        cleanup_old_logs(dir.path(), Some(30), Some(2)).unwrap();

        let remaining: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("run_"))
            .collect();
        assert_eq!(remaining.len(), 2);
        assert!(dir.path().join("not_a_run").exists());
    }

    #[test]
    fn test_cleanup_removes_expired_runs() {
        let dir = tempfile::tempdir().unwrap();
        let old = chrono::Utc::now() - chrono::Duration::days(40);
        let old_run = dir.path().join(format!("run_{}", old.format("%Y%m%d_%H%M%S")));
        std::fs::create_dir(&old_run).unwrap();

        cleanup_old_logs(dir.path(), Some(30), Some(10)).unwrap();
        assert!(!old_run.exists());
    }
}
