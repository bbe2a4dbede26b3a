// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::Identifier;
use std::fmt::{Display, Formatter};

/// How an observed identifier matched the allow-list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchKind {
    Exact,
    Fuzzy { score: f64 },
}

/// Why a completed scan produced no grant/deny outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InconclusiveReason {
    /// No hypothesis survived fusion
    NoDetection,
    /// Same identifier as the previous scan, skipped before matching
    DuplicateSuppressed,
}

/// Outcome of one completed scan.
///
/// `Denied` and `Inconclusive` are deliberately separate variants so callers
/// can tell "we read a plate and it is not allowed" from "we read nothing".
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Granted {
        identifier: Identifier,
        kind: MatchKind,
    },
    Denied {
        observed: Identifier,
    },
    Inconclusive(InconclusiveReason),
}

impl Decision {
    pub fn is_granted(&self) -> bool {
        matches!(self, Decision::Granted { .. })
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Decision::Denied { .. })
    }

    pub fn is_inconclusive(&self) -> bool {
        matches!(self, Decision::Inconclusive(_))
    }
}

impl Display for Decision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Granted {
                identifier,
                kind: MatchKind::Exact,
            } => write!(f, "GRANTED {} (exact)", identifier),
            Decision::Granted {
                identifier,
                kind: MatchKind::Fuzzy { score },
            } => write!(f, "GRANTED {} (fuzzy {:.2})", identifier, score),
            Decision::Denied { observed } => write!(f, "DENIED {}", observed),
            Decision::Inconclusive(InconclusiveReason::NoDetection) => {
                write!(f, "INCONCLUSIVE (no text detected)")
            }
            Decision::Inconclusive(InconclusiveReason::DuplicateSuppressed) => {
                write!(f, "INCONCLUSIVE (duplicate suppressed)")
            }
        }
    }
}
