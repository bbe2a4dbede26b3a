// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Recognition fusion
//!
//! Every preprocessing variant of a scan is an independent noisy reading of the
//! same plate. Fusion keeps the single most confident reading across all of
//! them instead of voting or averaging.

use plategate_structures::Hypothesis;
use tracing::{debug, trace};

/// Default confidence at or below which a hypothesis is treated as noise
pub const DEFAULT_NOISE_FLOOR: f32 = 0.3;

/// Global-max fusion over per-variant hypothesis lists
#[derive(Debug, Clone, Copy)]
pub struct RecognitionFusion {
    noise_floor: f32,
}

impl Default for RecognitionFusion {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_FLOOR)
    }
}

impl RecognitionFusion {
    pub fn new(noise_floor: f32) -> Self {
        Self { noise_floor }
    }

    pub fn noise_floor(&self) -> f32 {
        self.noise_floor
    }

    /// Pick the best hypothesis across all variants
    ///
    /// Hypotheses with confidence `<= noise_floor` are discarded. Among the
    /// rest the strictly highest confidence wins, so on a tie the one seen
    /// first (variant order, then list order) is kept. Returns `None` when
    /// nothing survives, which is a "no detection" scan.
    pub fn fuse(&self, variants: &[Vec<Hypothesis>]) -> Option<Hypothesis> {
        let mut best: Option<&Hypothesis> = None;

        for (variant, hypotheses) in variants.iter().enumerate() {
            trace!("[FUSION] variant {}: {:?}", variant, hypotheses);
            for hypothesis in hypotheses {
                if hypothesis.confidence.is_nan() || hypothesis.confidence <= self.noise_floor {
                    continue;
                }
                let better = match best {
                    Some(current) => hypothesis.confidence > current.confidence,
                    None => true,
                };
                if better {
                    debug!(
                        "[FUSION] variant {} leads with '{}' ({:.2})",
                        variant, hypothesis.text, hypothesis.confidence
                    );
                    best = Some(hypothesis);
                }
            }
        }

        best.cloned()
    }
}
