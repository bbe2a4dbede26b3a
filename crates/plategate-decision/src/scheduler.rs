// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Scan Scheduler
//!
//! Decides when the next observation window may be scanned.
//!
//! ```text
//! Waiting ──(interval elapsed | manual trigger)──▶ ReadyToScan
//! ReadyToScan ──(scan: denied / inconclusive)──▶ Waiting
//! ReadyToScan ──(scan: granted)──────────────────▶ Cooldown
//! Cooldown ──(cooldown elapsed)──────────────────▶ Waiting | ReadyToScan
//! ```
//!
//! The scheduler itself holds only the timing configuration. All mutable state
//! lives in a [`SchedulerState`] value owned by the decision loop; every
//! transition takes the current state and returns the next one.
//!
//! Timestamps come from the loop's [`TimeProvider`](plategate_hal::TimeProvider)
//! and are only compared with each other.

use plategate_config::ScanConfig;
use plategate_structures::Identifier;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Scan timing state, owned by the decision loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerState {
    /// Start of the last executed scan. `None` means no interval is pending:
    /// nothing has been scanned yet in immediate-start mode, or a manual
    /// trigger cleared it.
    pub last_scan_at: Option<Duration>,
    /// Time of the last grant; cooldown is measured from here
    pub last_grant_at: Option<Duration>,
    /// Identifier seen by the last scan that detected anything
    pub last_observed: Option<Identifier>,
}

/// Where the scheduler stands at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// A grant happened recently; no scan, no manual trigger
    Cooldown { remaining: Duration },
    /// Scan interval has not elapsed yet
    Waiting { remaining: Duration },
    ReadyToScan,
}

impl ScanPhase {
    pub fn is_ready(&self) -> bool {
        matches!(self, ScanPhase::ReadyToScan)
    }

    pub fn in_cooldown(&self) -> bool {
        matches!(self, ScanPhase::Cooldown { .. })
    }
}

impl Display for ScanPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanPhase::Cooldown { remaining } => {
                write!(f, "Access granted. Cooldown: {:.1}s", remaining.as_secs_f64())
            }
            ScanPhase::Waiting { remaining } => {
                write!(f, "Next scan in {:.1}s", remaining.as_secs_f64())
            }
            ScanPhase::ReadyToScan => write!(f, "Ready to scan"),
        }
    }
}

/// Scan interval + cooldown state machine
#[derive(Debug, Clone)]
pub struct ScanScheduler {
    interval: Duration,
    cooldown: Duration,
    scan_on_start: bool,
}

impl ScanScheduler {
    pub fn new(interval: Duration, cooldown: Duration) -> Self {
        Self {
            interval,
            cooldown,
            scan_on_start: false,
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            interval: config.interval(),
            cooldown: config.cooldown(),
            scan_on_start: config.scan_on_start,
        }
    }

    /// Start in `ReadyToScan` instead of waiting out the first interval
    pub fn with_scan_on_start(mut self, scan_on_start: bool) -> Self {
        self.scan_on_start = scan_on_start;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// State at process start: `Waiting` by default, `ReadyToScan` with scan-on-start
    pub fn initial_state(&self, now: Duration) -> SchedulerState {
        SchedulerState {
            last_scan_at: if self.scan_on_start { None } else { Some(now) },
            last_grant_at: None,
            last_observed: None,
        }
    }

    pub fn phase(&self, state: &SchedulerState, now: Duration) -> ScanPhase {
        if let Some(granted_at) = state.last_grant_at {
            let elapsed = now.saturating_sub(granted_at);
            if elapsed < self.cooldown {
                return ScanPhase::Cooldown {
                    remaining: self.cooldown - elapsed,
                };
            }
        }

        if let Some(scanned_at) = state.last_scan_at {
            let elapsed = now.saturating_sub(scanned_at);
            if elapsed < self.interval {
                return ScanPhase::Waiting {
                    remaining: self.interval - elapsed,
                };
            }
        }

        ScanPhase::ReadyToScan
    }

    /// Operator asked for a scan now
    ///
    /// Accepted (returns `true`) unless in cooldown, which a manual trigger
    /// cannot bypass.
    pub fn manual_trigger(&self, state: &SchedulerState, now: Duration) -> (SchedulerState, bool) {
        if self.phase(state, now).in_cooldown() {
            return (state.clone(), false);
        }
        let next = SchedulerState {
            last_scan_at: None,
            ..state.clone()
        };
        (next, true)
    }

    /// A scan is executing; restarts the interval whatever the outcome
    pub fn begin_scan(&self, state: &SchedulerState, now: Duration) -> SchedulerState {
        SchedulerState {
            last_scan_at: Some(now),
            ..state.clone()
        }
    }

    /// The scan detected nothing; re-arms duplicate suppression
    pub fn record_no_detection(&self, state: &SchedulerState) -> SchedulerState {
        SchedulerState {
            last_observed: None,
            ..state.clone()
        }
    }

    /// Same identifier as the previous detecting scan
    pub fn is_duplicate(&self, state: &SchedulerState, identifier: &Identifier) -> bool {
        state.last_observed.as_ref() == Some(identifier)
    }

    pub fn record_observation(&self, state: &SchedulerState, identifier: Identifier) -> SchedulerState {
        SchedulerState {
            last_observed: Some(identifier),
            ..state.clone()
        }
    }

    /// Access granted; starts the cooldown
    pub fn record_grant(&self, state: &SchedulerState, now: Duration) -> SchedulerState {
        SchedulerState {
            last_grant_at: Some(now),
            ..state.clone()
        }
    }
}
