// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tolerance-based token matching for one page.

use drawdiff_core::config::CompareConfig;
use drawdiff_core::error::{CompareError, Result};
use drawdiff_core::types::{PageComparison, TextToken};

/// Classifies tokens of two versions of a page as missing or extra.
///
/// Two tokens match when their text is equal and every bbox coordinate
/// differs by strictly less than the tolerance. The test is existential: one
/// token may satisfy any number of tokens on the other side. Cost is
/// O(n·m) per page; a grid index keyed by rounded coordinates would be the
/// next step for very dense pages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenMatcher {
    tolerance: f32,
}

impl TokenMatcher {
    pub fn new(tolerance: f32) -> Self {
        Self { tolerance }
    }

    pub fn from_config(config: &CompareConfig) -> Self {
        Self::new(config.tolerance)
    }

    /// Same text at the same location, within tolerance.
    pub fn is_same_location(&self, a: &TextToken, b: &TextToken) -> bool {
        a.text == b.text && a.bbox.within(&b.bbox, self.tolerance)
    }

    /// Missing = tokens of `a` unmatched in `b`; extra = tokens of `b`
    /// unmatched in `a`. Input order is preserved.
    pub fn compare(&self, page_index: usize, a: &[TextToken], b: &[TextToken]) -> PageComparison {
        PageComparison {
            page_index,
            missing: self.unmatched(a, b),
            extra: self.unmatched(b, a),
        }
    }

    fn unmatched(&self, side: &[TextToken], other: &[TextToken]) -> Vec<TextToken> {
        side.iter()
            .filter(|token| !other.iter().any(|candidate| self.is_same_location(token, candidate)))
            .cloned()
            .collect()
    }

    /// Reject token sets that can't belong to `page_index`: a foreign page
    /// index or a non-finite / inverted box.
    pub fn check_consistency(&self, page_index: usize, a: &[TextToken], b: &[TextToken]) -> Result<()> {
        for (side, tokens) in [("first", a), ("second", b)] {
            for token in tokens {
                if token.page_index != page_index {
                    return Err(CompareError::Match {
                        page: page_index,
                        detail: format!(
                            "{side} document token {:?} belongs to page {}",
                            token.text, token.page_index
                        ),
                    });
                }
                if !token.bbox.is_valid() {
                    return Err(CompareError::Match {
                        page: page_index,
                        detail: format!(
                            "{side} document token {:?} has an invalid box {:?}",
                            token.text, token.bbox
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for TokenMatcher {
    fn default() -> Self {
        Self::new(drawdiff_core::config::DEFAULT_TOLERANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawdiff_core::types::Rect;

    fn tok(text: &str, x0: f32, y0: f32, x1: f32, y1: f32) -> TextToken {
        TextToken::new(text, Rect::new(x0, y0, x1, y1), 0)
    }

    fn sample_a() -> Vec<TextToken> {
        vec![
            tok("R10", 10.0, 10.0, 30.0, 20.0),
            tok("M6", 50.0, 10.0, 62.0, 20.0),
            tok("THRU", 100.0, 200.0, 130.0, 210.0),
            tok("R10", 300.0, 300.0, 320.0, 310.0),
        ]
    }

    fn sample_b() -> Vec<TextToken> {
        vec![
            tok("R10", 12.0, 11.0, 32.0, 21.0),
            tok("M8", 50.0, 10.0, 62.0, 20.0),
            tok("THRU", 104.0, 200.0, 134.0, 210.0),
            tok("Ø5", 400.0, 400.0, 410.0, 410.0),
        ]
    }

    #[test]
    fn scenario_a_token_only_in_first() {
        let result = TokenMatcher::default().compare(0, &[tok("R10", 10.0, 10.0, 30.0, 20.0)], &[]);
        assert_eq!(result.missing.len(), 1);
        assert_eq!(result.missing[0].text, "R10");
        assert!(result.extra.is_empty());
    }

    #[test]
    fn scenario_b_within_tolerance() {
        let result = TokenMatcher::new(5.0).compare(
            0,
            &[tok("R10", 10.0, 10.0, 30.0, 20.0)],
            &[tok("R10", 11.0, 11.0, 31.0, 21.0)],
        );
        assert!(result.is_clean());
    }

    #[test]
    fn scenario_c_far_apart_before_filtering() {
        let result = TokenMatcher::default().compare(
            0,
            &[tok("X", 0.0, 0.0, 5.0, 5.0)],
            &[tok("X", 100.0, 100.0, 105.0, 105.0)],
        );
        assert_eq!(result.missing.len(), 1);
        assert_eq!(result.extra.len(), 1);
        assert_eq!(result.missing[0].bbox.x0, 0.0);
        assert_eq!(result.extra[0].bbox.x0, 100.0);
    }

    #[test]
    fn tolerance_is_strict() {
        let a = [tok("A", 0.0, 0.0, 10.0, 10.0)];
        let b = [tok("A", 5.0, 0.0, 15.0, 10.0)];
        assert!(!TokenMatcher::new(5.0).compare(0, &a, &b).is_clean());
        assert!(TokenMatcher::new(5.01).compare(0, &a, &b).is_clean());
    }

    #[test]
    fn text_must_match_exactly() {
        let result = TokenMatcher::default().compare(
            0,
            &[tok("r10", 0.0, 0.0, 10.0, 10.0)],
            &[tok("R10", 0.0, 0.0, 10.0, 10.0)],
        );
        assert_eq!(result.missing.len(), 1);
        assert_eq!(result.extra.len(), 1);
    }

    #[test]
    fn symmetry() {
        let matcher = TokenMatcher::new(3.0);
        let (a, b) = (sample_a(), sample_b());
        let forward = matcher.compare(0, &a, &b);
        let backward = matcher.compare(0, &b, &a);
        assert_eq!(forward.missing, backward.extra);
        assert_eq!(forward.extra, backward.missing);
    }

    #[test]
    fn idempotence_for_any_tolerance() {
        let a = sample_a();
        for tolerance in [0.001, 1.0, 5.0, 50.0] {
            assert!(TokenMatcher::new(tolerance).compare(0, &a, &a.clone()).is_clean());
        }
    }

    #[test]
    fn zero_tolerance_matches_nothing() {
        let a = sample_a();
        let result = TokenMatcher::new(0.0).compare(0, &a, &a);
        assert_eq!(result.missing.len(), a.len());
    }

    #[test]
    fn tolerance_monotonicity() {
        let (a, b) = (sample_a(), sample_b());
        let mut previous = TokenMatcher::new(0.5).compare(0, &a, &b);
        for tolerance in [1.0, 2.5, 5.0, 10.0, 100.0] {
            let current = TokenMatcher::new(tolerance).compare(0, &a, &b);
            assert!(current.missing.iter().all(|t| previous.missing.contains(t)));
            assert!(current.extra.iter().all(|t| previous.extra.contains(t)));
            previous = current;
        }
    }

    #[test]
    fn many_to_one_is_preserved() {
        let a = [
            tok("R10", 10.0, 10.0, 30.0, 20.0),
            tok("R10", 11.0, 10.0, 31.0, 20.0),
        ];
        let b = [tok("R10", 10.5, 10.0, 30.5, 20.0)];
        assert!(TokenMatcher::default().compare(0, &a, &b).is_clean());
    }

    #[test]
    fn consistency_rejects_foreign_page_and_bad_boxes() {
        let matcher = TokenMatcher::default();
        let foreign = TextToken::new("A", Rect::new(0.0, 0.0, 1.0, 1.0), 2);
        assert!(matches!(
            matcher.check_consistency(0, &[foreign], &[]),
            Err(CompareError::Match { page: 0, .. })
        ));

        let inverted = tok("B", 5.0, 5.0, 1.0, 1.0);
        assert!(matcher.check_consistency(0, &[], &[inverted]).is_err());
        assert!(matcher.check_consistency(0, &sample_a(), &sample_b()).is_ok());
    }
}
