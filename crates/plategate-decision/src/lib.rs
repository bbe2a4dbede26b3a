// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # plategate-decision
//!
//! Turns noisy, multi-variant plate recognitions into one debounced,
//! rate-limited access decision per scan, and signals grants to the gate
//! actuator.
//!
//! Leaf to root:
//! - [`allow_list`]: authorized plates
//! - [`fusion`]: best hypothesis across preprocessing variants
//! - [`similarity`], [`matcher`]: exact lookup, then fuzzy fallback
//! - [`scheduler`]: scan interval, cooldown and duplicate suppression
//! - [`gateway`]: serial request/response toward the actuator
//! - [`capture`], [`controls`], [`artifacts`]: loop collaborators
//! - [`decision_loop`]: the control loop tying everything together
//! - [`replay`]: scripted collaborators for running without hardware

pub mod allow_list;
pub mod artifacts;
pub mod capture;
pub mod controls;
pub mod decision_loop;
pub mod fusion;
pub mod gateway;
pub mod matcher;
pub mod replay;
pub mod scheduler;
pub mod similarity;

pub use allow_list::AllowList;
pub use artifacts::{DebugArtifactSink, DirectoryArtifactSink};
pub use capture::{
    ObservationSource, PassthroughPreprocessor, PixelRect, Preprocessor, RecognitionEngine,
    RegionOfInterest,
};
pub use controls::{NoControls, OperatorCommand, OperatorControls};
pub use decision_loop::{Collaborators, DecisionLoop, LoopStats, TickOutcome};
pub use fusion::{RecognitionFusion, DEFAULT_NOISE_FLOOR};
pub use gateway::{open_gateway, Acknowledgment, ActuatorGateway, NullGateway, SerialGateway};
pub use matcher::{MatchResult, Matcher, DEFAULT_FUZZY_THRESHOLD};
pub use replay::{ReplayDriver, ReplayError, ReplayFrame, ReplayScript};
pub use scheduler::{ScanPhase, ScanScheduler, SchedulerState};
pub use similarity::{LcsRatio, SimilarityMetric};
