// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::hal::TimeProvider;
use std::time::{Duration, Instant};

/// Wall-clock time provider backed by `std::time::Instant`
#[derive(Debug, Clone, Copy)]
pub struct StdTimeProvider {
    origin: Instant,
}

impl StdTimeProvider {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for StdTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for StdTimeProvider {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
