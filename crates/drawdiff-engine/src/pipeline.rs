// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-request comparison pipeline.
//
// A `Session` owns both documents for the lifetime of one request; dropping it
// releases them on every exit path. Pages are processed independently, so a
// page-local failure skips that page and the rest still run.

use drawdiff_core::config::CompareConfig;
use drawdiff_core::error::Result;
use drawdiff_core::types::{ComparisonId, PageComparison, SkippedPage, SummaryReport};
use drawdiff_document::{SourceDocument, TextExtractor};
use drawdiff_security::fingerprint;
use tracing::{debug, info, instrument, warn};

use crate::filter::CrossFilter;
use crate::matcher::TokenMatcher;

/// Both documents of one comparison request.
pub struct Session {
    id: ComparisonId,
    first: SourceDocument,
    second: SourceDocument,
    matcher: TokenMatcher,
}

/// What happened to each compared page.
#[derive(Debug, Clone, Default)]
pub struct PageOutcomes {
    /// Filtered comparisons of the pages that made it through, in page order.
    pub comparisons: Vec<PageComparison>,
    pub skipped: Vec<SkippedPage>,
}

impl PageOutcomes {
    pub fn summary(&self) -> SummaryReport {
        SummaryReport::from_comparisons(&self.comparisons)
    }
}

impl Session {
    /// Open both documents. Either one failing to open aborts the request.
    #[instrument(skip_all, fields(first_len = first.len(), second_len = second.len()))]
    pub fn open(first: &[u8], second: &[u8], config: &CompareConfig) -> Result<Self> {
        let id = ComparisonId::new();
        let first_doc = SourceDocument::from_bytes(first)?;
        let second_doc = SourceDocument::from_bytes(second)?;

        info!(
            %id,
            first = %fingerprint(first),
            second = %fingerprint(second),
            first_pages = first_doc.page_count(),
            second_pages = second_doc.page_count(),
            tolerance = config.tolerance,
            "Comparison session opened"
        );

        Ok(Self {
            id,
            first: first_doc,
            second: second_doc,
            matcher: TokenMatcher::from_config(config),
        })
    }

    pub fn id(&self) -> ComparisonId {
        self.id
    }

    pub fn first(&self) -> &SourceDocument {
        &self.first
    }

    pub fn second(&self) -> &SourceDocument {
        &self.second
    }

    /// Pages beyond the shorter document are never compared.
    pub fn compared_pages(&self) -> usize {
        self.first.page_count().min(self.second.page_count())
    }

    /// Extract, match, and cross-filter one page.
    pub fn compare_page(&self, page_index: usize) -> Result<PageComparison> {
        let first = TextExtractor::extract_page(&self.first, page_index)?;
        let second = TextExtractor::extract_page(&self.second, page_index)?;
        self.matcher.check_consistency(page_index, &first, &second)?;

        let raw = self.matcher.compare(page_index, &first, &second);
        debug!(
            page = page_index,
            first_tokens = first.len(),
            second_tokens = second.len(),
            missing = raw.missing.len(),
            extra = raw.extra.len(),
            "Page matched"
        );
        Ok(CrossFilter::apply(raw))
    }

    /// Compare every shared page and hand each result to `render` along with
    /// both working copies.
    ///
    /// Page-local errors from any stage are recorded as skipped pages. Any
    /// other error ends the run.
    #[instrument(skip_all, fields(id = %self.id, pages = self.compared_pages()))]
    pub fn run<F>(&mut self, mut render: F) -> Result<PageOutcomes>
    where
        F: FnMut(&mut SourceDocument, &mut SourceDocument, &PageComparison) -> Result<()>,
    {
        let mut outcomes = PageOutcomes::default();

        for page_index in 0..self.compared_pages() {
            let result = self
                .compare_page(page_index)
                .and_then(|cmp| render(&mut self.first, &mut self.second, &cmp).map(|()| cmp));

            match result {
                Ok(cmp) => outcomes.comparisons.push(cmp),
                Err(err) => match err.stage() {
                    Some(stage) => {
                        let reason = err.to_string();
                        warn!(page = page_index, %stage, %reason, "Page skipped");
                        outcomes.skipped.push(SkippedPage {
                            page: page_index,
                            stage,
                            reason,
                        });
                    }
                    None => return Err(err),
                },
            }
        }

        info!(
            compared = outcomes.comparisons.len(),
            skipped = outcomes.skipped.len(),
            "Comparison run finished"
        );
        Ok(outcomes)
    }

    pub fn into_documents(self) -> (SourceDocument, SourceDocument) {
        (self.first, self.second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawdiff_core::error::CompareError;
    use drawdiff_core::types::{PageCounts, PipelineStage};
    use drawdiff_document::fixtures::{SamplePage, sample_pdf};

    fn page() -> SamplePage {
        SamplePage::new(612.0, 792.0)
    }

    fn drawing(pages: usize) -> Vec<u8> {
        let pages: Vec<SamplePage> = (0..pages)
            .map(|i| page().word("R10", 72.0, 100.0, 12.0).word(&format!("P{i}"), 300.0, 400.0, 12.0))
            .collect();
        sample_pdf(&pages)
    }

    fn no_render(_: &mut SourceDocument, _: &mut SourceDocument, _: &PageComparison) -> Result<()> {
        Ok(())
    }

    #[test]
    fn identical_documents_compare_clean() {
        let bytes = drawing(2);
        let mut session = Session::open(&bytes, &bytes, &CompareConfig::default()).unwrap();
        let outcomes = session.run(no_render).unwrap();

        assert_eq!(outcomes.comparisons.len(), 2);
        assert!(outcomes.comparisons.iter().all(PageComparison::is_clean));
        assert!(outcomes.skipped.is_empty());
    }

    #[test]
    fn scenario_d_only_shared_pages_are_compared() {
        let mut session =
            Session::open(&drawing(3), &drawing(5), &CompareConfig::default()).unwrap();
        assert_eq!(session.compared_pages(), 3);

        let summary = session.run(no_render).unwrap().summary();
        let pages: Vec<usize> = summary.iter().map(|(page, _)| page).collect();
        assert_eq!(pages, [0, 1, 2]);
    }

    #[test]
    fn changed_words_survive_the_cross_filter() {
        let first = sample_pdf(&[page()
            .word("R10", 72.0, 100.0, 12.0)
            .word("M6", 200.0, 100.0, 12.0)
            .word("THRU", 300.0, 300.0, 12.0)]);
        let second = sample_pdf(&[page()
            .word("R10", 73.0, 101.0, 12.0)
            .word("M8", 200.0, 100.0, 12.0)
            .word("THRU", 300.0, 500.0, 12.0)]);
        let session = Session::open(&first, &second, &CompareConfig::default()).unwrap();

        let cmp = session.compare_page(0).unwrap();
        let missing: Vec<&str> = cmp.missing.iter().map(|t| t.text.as_str()).collect();
        let extra: Vec<&str> = cmp.extra.iter().map(|t| t.text.as_str()).collect();
        // THRU moved too far but exists on both sides.
        assert_eq!(missing, ["M6"]);
        assert_eq!(extra, ["M8"]);
    }

    #[test]
    fn page_local_failure_skips_the_page() {
        let bytes = drawing(3);
        let mut session = Session::open(&bytes, &bytes, &CompareConfig::default()).unwrap();
        let outcomes = session
            .run(|_, _, cmp| {
                if cmp.page_index == 1 {
                    return Err(CompareError::Render {
                        page: 1,
                        detail: "synthetic".into(),
                    });
                }
                Ok(())
            })
            .unwrap();

        assert_eq!(outcomes.skipped.len(), 1);
        assert_eq!(outcomes.skipped[0].page, 1);
        assert_eq!(outcomes.skipped[0].stage, PipelineStage::Rendering);
        let summary = outcomes.summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary.get(1), None);
        assert_eq!(summary.get(2), Some(PageCounts::default()));
    }

    #[test]
    fn unreadable_page_is_skipped_at_extraction() {
        let first = sample_pdf(&[
            page().word("R10", 72.0, 100.0, 12.0),
            page().unreadable_contents(),
            page().word("M6", 72.0, 100.0, 12.0),
        ]);
        let second = sample_pdf(&[
            page().word("R10", 72.0, 100.0, 12.0),
            page().word("M8", 72.0, 100.0, 12.0),
            page().word("M8", 72.0, 100.0, 12.0),
        ]);
        let mut session = Session::open(&first, &second, &CompareConfig::default()).unwrap();
        let mut rendered = Vec::new();
        let outcomes = session
            .run(|_, _, cmp| {
                rendered.push(cmp.page_index);
                Ok(())
            })
            .unwrap();

        assert_eq!(rendered, [0, 2]);
        assert_eq!(outcomes.skipped.len(), 1);
        assert_eq!(outcomes.skipped[0].page, 1);
        assert_eq!(outcomes.skipped[0].stage, PipelineStage::Extraction);

        let summary = outcomes.summary();
        let pages: Vec<usize> = summary.iter().map(|(page, _)| page).collect();
        assert_eq!(pages, [0, 2]);
        assert_eq!(summary.get(2), Some(PageCounts { missing: 1, extra: 1 }));
    }

    #[test]
    fn fatal_error_ends_the_run() {
        let bytes = drawing(2);
        let mut session = Session::open(&bytes, &bytes, &CompareConfig::default()).unwrap();
        let result = session.run(|_, _, _| Err(CompareError::Packaging("disk full".into())));
        assert!(matches!(result, Err(CompareError::Packaging(_))));
    }

    #[test]
    fn unreadable_upload_aborts_the_request() {
        let result = Session::open(b"not a pdf", &drawing(1), &CompareConfig::default());
        assert!(matches!(result, Err(CompareError::Open(_))));
    }

    #[test]
    fn render_sees_both_working_copies() {
        let mut session =
            Session::open(&drawing(2), &drawing(4), &CompareConfig::default()).unwrap();
        let mut seen = Vec::new();
        session
            .run(|first, second, cmp| {
                seen.push((cmp.page_index, first.page_count(), second.page_count()));
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, [(0, 2, 4), (1, 2, 4)]);
    }
}
