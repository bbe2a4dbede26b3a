// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// Serial input/output traits for UART-style communication.
pub mod serial;
/// Timekeeping abstractions (monotonic clock, delays).
pub mod time;

pub use serial::SerialIO;
pub use time::TimeProvider;
