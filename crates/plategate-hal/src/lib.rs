// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # plategate-hal
//!
//! Platform-agnostic traits for the pieces of hardware the decision core
//! touches, plus std implementations:
//! - Serial I/O toward the actuator board ([`SerialIO`])
//! - Monotonic time and delays ([`TimeProvider`])

pub mod hal;
pub mod platforms;

pub use hal::{SerialIO, TimeProvider};
pub use platforms::{ManualTimeProvider, StdTimeProvider};

#[cfg(feature = "serial")]
pub use platforms::SerialPortLink;
