// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cross-document de-noising of a page comparison.

use std::collections::HashSet;

use drawdiff_core::types::PageComparison;
use tracing::debug;

/// Drops tokens whose text appears anywhere on the opposite side.
///
/// A token that fails the positional test but whose text survives on the
/// other page is treated as layout drift, not a content change.
pub struct CrossFilter;

impl CrossFilter {
    pub fn apply(comparison: PageComparison) -> PageComparison {
        let PageComparison {
            page_index,
            missing,
            extra,
        } = comparison;

        let missing_texts: HashSet<&str> = missing.iter().map(|t| t.text.as_str()).collect();
        let extra_texts: HashSet<&str> = extra.iter().map(|t| t.text.as_str()).collect();

        let kept_missing: Vec<_> = missing
            .iter()
            .filter(|t| !extra_texts.contains(t.text.as_str()))
            .cloned()
            .collect();
        let kept_extra: Vec<_> = extra
            .iter()
            .filter(|t| !missing_texts.contains(t.text.as_str()))
            .cloned()
            .collect();

        debug!(
            page = page_index,
            dropped_missing = missing.len() - kept_missing.len(),
            dropped_extra = extra.len() - kept_extra.len(),
            "Cross-filter applied"
        );

        PageComparison {
            page_index,
            missing: kept_missing,
            extra: kept_extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::TokenMatcher;
    use drawdiff_core::types::{Rect, TextToken};

    fn tok(text: &str, x: f32) -> TextToken {
        TextToken::new(text, Rect::new(x, 0.0, x + 5.0, 5.0), 0)
    }

    #[test]
    fn scenario_c_reflow_is_removed() {
        let raw = TokenMatcher::default().compare(
            0,
            &[TextToken::new("X", Rect::new(0.0, 0.0, 5.0, 5.0), 0)],
            &[TextToken::new("X", Rect::new(100.0, 100.0, 105.0, 105.0), 0)],
        );
        let filtered = CrossFilter::apply(raw);
        assert!(filtered.is_clean());
    }

    #[test]
    fn no_text_on_both_sides_after_filtering() {
        let comparison = PageComparison {
            page_index: 3,
            missing: vec![tok("A", 0.0), tok("B", 10.0), tok("A", 20.0), tok("C", 30.0)],
            extra: vec![tok("A", 500.0), tok("D", 510.0), tok("C", 520.0)],
        };
        let filtered = CrossFilter::apply(comparison);

        let missing: Vec<&str> = filtered.missing.iter().map(|t| t.text.as_str()).collect();
        let extra: Vec<&str> = filtered.extra.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(missing, ["B"]);
        assert_eq!(extra, ["D"]);
        assert!(missing.iter().all(|m| !extra.contains(m)));
        assert_eq!(filtered.page_index, 3);
    }

    #[test]
    fn one_sided_lists_are_untouched() {
        let comparison = PageComparison {
            page_index: 0,
            missing: vec![tok("A", 0.0), tok("A", 10.0)],
            extra: Vec::new(),
        };
        assert_eq!(CrossFilter::apply(comparison.clone()), comparison);
    }
}
