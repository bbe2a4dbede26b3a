// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::hal::TimeProvider;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Hand-driven clock for simulations and replays
///
/// Clones share the same time, so one handle can be given to the control loop
/// while another advances it. `sleep` advances the clock instead of blocking.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeProvider {
    now: Rc<Cell<Duration>>,
}

impl ManualTimeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl TimeProvider for ManualTimeProvider {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_time() {
        let clock = ManualTimeProvider::new();
        let handle = clock.clone();
        handle.advance(Duration::from_secs(3));
        assert_eq!(clock.now(), Duration::from_secs(3));

        clock.sleep(Duration::from_millis(500));
        assert_eq!(handle.now(), Duration::from_millis(3500));

        handle.set(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::from_secs(1));
    }
}
