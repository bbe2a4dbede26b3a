// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// Monotonic time and delay abstraction
///
/// Timestamps are offsets from an arbitrary, provider-specific origin. Only
/// differences between two readings of the same provider are meaningful.
pub trait TimeProvider {
    /// Current monotonic time
    fn now(&self) -> Duration;

    /// Block for the given duration
    fn sleep(&self, duration: Duration);

    /// Block for the specified number of milliseconds
    fn delay_ms(&self, ms: u64) {
        self.sleep(Duration::from_millis(ms));
    }
}
