// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Allow-list matching: exact lookup first, fuzzy similarity as fallback

use crate::allow_list::AllowList;
use crate::similarity::{LcsRatio, SimilarityMetric};
use plategate_structures::{Identifier, MatchKind};
use tracing::{debug, info};

/// Default minimum similarity ratio for a fuzzy match
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.8;

/// Result of matching one observed identifier against the allow-list
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Exact(Identifier),
    Fuzzy(Identifier, f64),
    NoMatch,
}

impl MatchResult {
    /// Matched entry and how it matched, if any
    pub fn into_grant(self) -> Option<(Identifier, MatchKind)> {
        match self {
            MatchResult::Exact(id) => Some((id, MatchKind::Exact)),
            MatchResult::Fuzzy(id, score) => Some((id, MatchKind::Fuzzy { score })),
            MatchResult::NoMatch => None,
        }
    }
}

/// Exact + fuzzy matcher
///
/// When several entries clear the threshold, the highest score wins and equal
/// scores go to the lexically smallest entry.
#[derive(Debug, Clone)]
pub struct Matcher<M = LcsRatio> {
    threshold: f64,
    metric: M,
}

impl Default for Matcher<LcsRatio> {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZY_THRESHOLD)
    }
}

impl Matcher<LcsRatio> {
    pub fn new(threshold: f64) -> Self {
        Self::with_metric(threshold, LcsRatio)
    }
}

impl<M: SimilarityMetric> Matcher<M> {
    pub fn with_metric(threshold: f64, metric: M) -> Self {
        Self { threshold, metric }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }

    pub fn evaluate(&self, observed: &Identifier, list: &AllowList) -> MatchResult {
        if list.contains(observed) {
            debug!("[MATCH] '{}' is on the allow-list", observed);
            return MatchResult::Exact(observed.clone());
        }

        let mut best: Option<(&Identifier, f64)> = None;
        for candidate in list.iter() {
            let score = self.metric.ratio(observed.as_str(), candidate.as_str());
            if score < self.threshold {
                continue;
            }
            // Entries arrive in lexical order, so strict > keeps the smallest on ties
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((candidate, score));
            }
        }

        match best {
            Some((candidate, score)) => {
                info!(
                    "[MATCH] Fuzzy match: '{}' matches '{}' ({:.2})",
                    observed, candidate, score
                );
                MatchResult::Fuzzy(candidate.clone(), score)
            }
            None => {
                debug!(
                    "[MATCH] '{}' has no entry at or above {:.2}",
                    observed, self.threshold
                );
                MatchResult::NoMatch
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingMetric {
        calls: Cell<usize>,
    }

    impl SimilarityMetric for CountingMetric {
        fn ratio(&self, a: &str, b: &str) -> f64 {
            self.calls.set(self.calls.get() + 1);
            LcsRatio.ratio(a, b)
        }
    }

    fn list(entries: &[&str]) -> AllowList {
        AllowList::from_identifiers(entries.iter().map(|e| Identifier::new(e)))
    }

    #[test]
    fn test_exact_match_short_circuits() {
        let matcher = Matcher::with_metric(
            0.8,
            CountingMetric {
                calls: Cell::new(0),
            },
        );
        let allow = list(&["ABC123", "ABC124", "ABD123"]);

        let result = matcher.evaluate(&Identifier::new("ABC123"), &allow);
        assert_eq!(result, MatchResult::Exact(Identifier::new("ABC123")));
        assert_eq!(matcher.metric().calls.get(), 0);

        matcher.evaluate(&Identifier::new("ABC129"), &allow);
        assert_eq!(matcher.metric().calls.get(), 3);
    }

    #[test]
    fn test_fuzzy_match() {
        let result = Matcher::default().evaluate(&Identifier::new("ABC125"), &list(&["ABC123"]));
        match result {
            MatchResult::Fuzzy(id, score) => {
                assert_eq!(id.as_str(), "ABC123");
                assert!((score - 10.0 / 12.0).abs() < 1e-9);
            }
            other => panic!("expected fuzzy match, got {:?}", other),
        }
    }

    #[test]
    fn test_no_match() {
        let result = Matcher::default().evaluate(&Identifier::new("XYZ999"), &list(&["ABC123"]));
        assert_eq!(result, MatchResult::NoMatch);
    }

    #[test]
    fn test_empty_list_never_matches() {
        let result = Matcher::default().evaluate(&Identifier::new("ABC123"), &AllowList::empty());
        assert_eq!(result, MatchResult::NoMatch);
    }

    #[test]
    fn test_raising_threshold_above_score_yields_no_match() {
        let allow = list(&["ABC123"]);
        let observed = Identifier::new("ABC125");
        let score = match Matcher::new(0.8).evaluate(&observed, &allow) {
            MatchResult::Fuzzy(_, score) => score,
            other => panic!("expected fuzzy match, got {:?}", other),
        };
        assert_eq!(
            Matcher::new(score + 1e-6).evaluate(&observed, &allow),
            MatchResult::NoMatch
        );
    }

    #[test]
    fn test_highest_score_wins() {
        // ABC12 vs ABC123 = 10/11, vs ABC1 = 8/9
        let allow = list(&["ABC1", "ABC123"]);
        match Matcher::new(0.8).evaluate(&Identifier::new("ABC12"), &allow) {
            MatchResult::Fuzzy(id, _) => assert_eq!(id.as_str(), "ABC123"),
            other => panic!("expected fuzzy match, got {:?}", other),
        }
    }

    #[test]
    fn test_equal_scores_resolve_lexically() {
        let allow = list(&["ABC129", "ABC123", "ABC127"]);
        match Matcher::new(0.8).evaluate(&Identifier::new("ABC120"), &allow) {
            MatchResult::Fuzzy(id, _) => assert_eq!(id.as_str(), "ABC123"),
            other => panic!("expected fuzzy match, got {:?}", other),
        }
    }

    #[test]
    fn test_into_grant() {
        assert_eq!(
            MatchResult::Exact(Identifier::new("A1")).into_grant(),
            Some((Identifier::new("A1"), MatchKind::Exact))
        );
        assert_eq!(MatchResult::NoMatch.into_grant(), None);
    }
}
