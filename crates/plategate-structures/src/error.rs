// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// Errors raised by an observation source.
///
/// `FrameUnavailable` is recoverable inside the control loop. `SourceUnavailable`
/// means the source could not be acquired at all and is fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("Failed to grab frame: {0}")]
    FrameUnavailable(String),

    #[error("Cannot open observation source: {0}")]
    SourceUnavailable(String),
}

/// A recognition engine failed on one preprocessing variant.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Recognition failed on variant {variant}: {reason}")]
pub struct RecognitionError {
    pub variant: usize,
    pub reason: String,
}

/// Errors from the actuator gateway. Always recoverable: the caller logs them
/// and the grant decision stands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Actuator is not connected")]
    NotConnected,

    #[error("Actuator I/O failure: {0}")]
    Io(String),

    #[error("No acknowledgment from actuator within {0:?}")]
    AckTimeout(Duration),

    #[error("Actuator sent an unreadable acknowledgment: {0}")]
    InvalidAck(String),
}
