// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! String similarity used for fuzzy plate matching

/// Similarity score between two identifiers, in `[0, 1]` with `1.0` meaning identical
pub trait SimilarityMetric {
    fn ratio(&self, a: &str, b: &str) -> f64;
}

/// `2·M / T`, where `M` is the length of the longest common subsequence and
/// `T` the combined length of both strings, counted in chars.
///
/// ```
/// use plategate_decision::similarity::{LcsRatio, SimilarityMetric};
///
/// let ratio = LcsRatio.ratio("ABC125", "ABC123");
/// assert!((ratio - 10.0 / 12.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LcsRatio;

impl SimilarityMetric for LcsRatio {
    fn ratio(&self, a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let total = a.len() + b.len();
        if total == 0 {
            return 1.0;
        }
        2.0 * lcs_len(&a, &b) as f64 / total as f64
    }
}

/// Longest common subsequence length, single-row dynamic programming
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diagonal = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_identical_is_one() {
        assert!(close(LcsRatio.ratio("ABC123", "ABC123"), 1.0));
        assert!(close(LcsRatio.ratio("", ""), 1.0));
    }

    #[test]
    fn test_disjoint_is_zero() {
        assert!(close(LcsRatio.ratio("ABC123", "XYZ999"), 0.0));
        assert!(close(LcsRatio.ratio("ABC", ""), 0.0));
    }

    #[test]
    fn test_one_substitution() {
        assert!(close(LcsRatio.ratio("ABC125", "ABC123"), 10.0 / 12.0));
    }

    #[test]
    fn test_transposition_and_length_mismatch() {
        // LCS of "AB12" and "BA12" is 3
        assert!(close(LcsRatio.ratio("AB12", "BA12"), 6.0 / 8.0));
        // "ABC12" inside "XABC123": LCS 5, total 12
        assert!(close(LcsRatio.ratio("ABC12", "XABC123"), 10.0 / 12.0));
    }

    #[test]
    fn test_symmetric() {
        let pairs = [("KSA7788", "K5A778"), ("DUBAI1", "DUBA11"), ("Q", "QQQ")];
        for (a, b) in pairs {
            assert!(close(LcsRatio.ratio(a, b), LcsRatio.ratio(b, a)));
        }
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        // Two-byte chars must not inflate the denominator
        assert!(close(LcsRatio.ratio("١٢٣", "١٢٤"), 4.0 / 6.0));
    }
}
