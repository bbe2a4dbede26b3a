// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// One candidate reading produced by the recognition engine for one
/// preprocessing variant.
///
/// `text` is kept raw; normalization happens once the hypothesis has won
/// fusion. `confidence` is expected in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub text: String,
    pub confidence: f32,
}

impl Hypothesis {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Hypothesis {
            text: text.into(),
            confidence,
        }
    }
}
