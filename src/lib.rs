// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # PlateGate - License plate access control
//!
//! Turns a stream of noisy, multi-hypothesis plate recognitions into one
//! debounced, rate-limited grant/deny decision per scan and signals grants to a
//! gate actuator over a serial link.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! plategate = "0.1"  # Default: serial actuator support
//! ```
//!
//! ## Feature Flags
//!
//! - **`serial`** (default): real serial actuator via the `serialport` crate.
//!   Without it every run is in demo mode.
//! - **`file-logging`**: per-crate JSON log files with rotation
//!
//! ## Usage
//!
//! ```rust
//! use plategate::prelude::*;
//!
//! let allow = AllowList::parse("ABC123\nxyz 999\n")?;
//! let matcher = Matcher::default();
//!
//! let result = matcher.evaluate(&Identifier::new("abc125"), &allow);
//! assert!(matches!(result, MatchResult::Fuzzy(_, _)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Running the full loop without hardware, from a replay script:
//!
//! ```rust
//! use plategate::prelude::*;
//!
//! let config = PlateGateConfig::default();
//! let script = ReplayScript::parse(
//!     r#"{"at_ms": 6000, "variants": [[{"text": "ABC123", "confidence": 0.9}]]}"#,
//! )?;
//! let driver = ReplayDriver::from_config(script, &config.capture);
//! let mut decision_loop = DecisionLoop::new(
//!     &config,
//!     AllowList::parse("ABC123")?,
//!     driver.collaborators(Box::new(NullGateway)),
//! );
//!
//! let stats = decision_loop.run()?;
//! assert_eq!(stats.grants, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use plategate_config as config;
pub use plategate_decision as decision;
pub use plategate_hal as hal;
pub use plategate_observability as observability;
pub use plategate_structures as structures;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::{load_config, ConfigError, PlateGateConfig};
    pub use crate::decision::{
        open_gateway, Acknowledgment, ActuatorGateway, AllowList, Collaborators, DecisionLoop,
        MatchResult, Matcher, NullGateway, ObservationSource, OperatorCommand, OperatorControls,
        Preprocessor, RecognitionEngine, RecognitionFusion, ReplayDriver, ReplayScript, ScanPhase,
        ScanScheduler, SchedulerState, TickOutcome,
    };
    pub use crate::hal::{SerialIO, TimeProvider};
    pub use crate::structures::{Decision, Frame, Hypothesis, Identifier, MatchKind};
}
