// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output packaging — turns a comparison run into one of the deliverables.
//
// Every variant opens its own `Session`, so the documents of one request are
// never shared with another. Errors raised after the page loop are packaging
// failures: no partial output is returned once assembly has started.

use chrono::NaiveDateTime;
use drawdiff_core::config::CompareConfig;
use drawdiff_core::error::{CompareError, Result};
use drawdiff_core::types::{OutputVariant, Palette, SkippedPage, SummaryReport};
use drawdiff_document::{
    AnnotationRenderer, Mark, Placement, SourceDocument, SummaryPage, SummaryReportBuilder,
    Watermark,
};
use tracing::{info, instrument};

use crate::archive::{self, EXTRA_ENTRY, MISSING_ENTRY, SUMMARY_ENTRY};
use crate::pipeline::Session;

/// A packaged output, ready to be written or streamed.
#[derive(Debug, Clone)]
pub struct Deliverable {
    pub variant: OutputVariant,
    pub bytes: Vec<u8>,
    pub summary: SummaryReport,
    pub skipped: Vec<SkippedPage>,
}

impl Deliverable {
    pub fn file_name(&self) -> &'static str {
        self.variant.file_name()
    }

    pub fn content_type(&self) -> &'static str {
        self.variant.content_type()
    }
}

/// Result of the summary-only request.
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    pub summary: SummaryReport,
    pub skipped: Vec<SkippedPage>,
}

/// Runs comparisons and packages their output.
#[derive(Debug, Clone)]
pub struct Comparer {
    config: CompareConfig,
}

impl Comparer {
    pub fn new(config: CompareConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Build the deliverable for `variant`. `Archive` and the PDF variants all
    /// go through here; the summary-only request does not produce bytes.
    pub fn produce(&self, variant: OutputVariant, first: &[u8], second: &[u8]) -> Result<Deliverable> {
        match variant {
            OutputVariant::FullReport => self.full_report(first, second),
            OutputVariant::MissingOnly => self.missing_only(first, second),
            OutputVariant::ExtraOnly => self.extra_only(first, second),
            OutputVariant::Merged => self.merged(first, second),
            OutputVariant::Archive => self.archive(first, second),
        }
    }

    /// Per-page counts without rendering anything.
    #[instrument(skip_all)]
    pub fn summary(&self, first: &[u8], second: &[u8]) -> Result<SummaryOutcome> {
        let mut session = Session::open(first, second, &self.config)?;
        let outcomes = session.run(|_, _, _| Ok(()))?;
        Ok(SummaryOutcome {
            summary: outcomes.summary(),
            skipped: outcomes.skipped,
        })
    }

    /// Document A with both kinds of differences highlighted, watermarked,
    /// followed by the summary pages.
    ///
    /// Every compared page is watermarked, including pages skipped after a
    /// page-local failure.
    #[instrument(skip_all, fields(variant = ?OutputVariant::FullReport))]
    pub fn full_report(&self, first: &[u8], second: &[u8]) -> Result<Deliverable> {
        let palette = &self.config.palettes.full_report;
        let watermark = Watermark::from_config(&self.config);

        let mut session = Session::open(first, second, &self.config)?;
        let outcomes = session.run(|doc_a, _, cmp| {
            AnnotationRenderer::highlight(doc_a, cmp.page_index, &cmp.missing, palette.missing.color)?;
            AnnotationRenderer::highlight(doc_a, cmp.page_index, &cmp.extra, palette.extra.color)
                .map(drop)
        })?;
        let summary = outcomes.summary();
        let compared = session.compared_pages();

        let (mut doc_a, _) = session.into_documents();
        let bytes = assemble(|| {
            for page in 0..compared {
                AnnotationRenderer::watermark(&mut doc_a, page, &watermark)?;
            }

            let summary_pages = self.summary_page(SummaryPage::report(), palette, &summary)?;
            let start = doc_a.page_count();
            doc_a.graft_pages(&summary_pages, Placement::Back)?;
            let plain = Watermark {
                backdrop: false,
                ..watermark.clone()
            };
            for page in start..doc_a.page_count() {
                AnnotationRenderer::watermark(&mut doc_a, page, &plain)?;
            }
            doc_a.into_bytes()
        })?;

        Ok(deliver(OutputVariant::FullReport, bytes, summary, outcomes.skipped))
    }

    /// Document A with missing tokens highlighted.
    #[instrument(skip_all, fields(variant = ?OutputVariant::MissingOnly))]
    pub fn missing_only(&self, first: &[u8], second: &[u8]) -> Result<Deliverable> {
        let color = self.config.palettes.missing_only.missing.color;
        let mut session = Session::open(first, second, &self.config)?;
        let outcomes = session.run(|doc_a, _, cmp| {
            AnnotationRenderer::highlight(doc_a, cmp.page_index, &cmp.missing, color).map(drop)
        })?;

        let (doc_a, _) = session.into_documents();
        let bytes = assemble(|| doc_a.into_bytes())?;
        Ok(deliver(OutputVariant::MissingOnly, bytes, outcomes.summary(), outcomes.skipped))
    }

    /// Document B with extra tokens highlighted.
    #[instrument(skip_all, fields(variant = ?OutputVariant::ExtraOnly))]
    pub fn extra_only(&self, first: &[u8], second: &[u8]) -> Result<Deliverable> {
        let color = self.config.palettes.extra_only.extra.color;
        let mut session = Session::open(first, second, &self.config)?;
        let outcomes = session.run(|_, doc_b, cmp| {
            AnnotationRenderer::highlight(doc_b, cmp.page_index, &cmp.extra, color).map(drop)
        })?;

        let (_, doc_b) = session.into_documents();
        let bytes = assemble(|| doc_b.into_bytes())?;
        Ok(deliver(OutputVariant::ExtraOnly, bytes, outcomes.summary(), outcomes.skipped))
    }

    /// Summary pages sized like A's first page, followed by document A with
    /// missing tokens highlighted and extra tokens written in.
    #[instrument(skip_all, fields(variant = ?OutputVariant::Merged))]
    pub fn merged(&self, first: &[u8], second: &[u8]) -> Result<Deliverable> {
        let palette = &self.config.palettes.merged;
        let mut session = Session::open(first, second, &self.config)?;
        let outcomes = session.run(|doc_a, _, cmp| {
            AnnotationRenderer::apply(doc_a, cmp.page_index, &cmp.missing, Mark::Highlight, palette.missing.color)?;
            AnnotationRenderer::apply(doc_a, cmp.page_index, &cmp.extra, Mark::InsertText, palette.extra.color)
                .map(drop)
        })?;
        let summary = outcomes.summary();

        let (mut doc_a, _) = session.into_documents();
        let bytes = assemble(|| {
            let geometry = doc_a.geometry(0).ok_or_else(|| {
                CompareError::Packaging("first document has no first page".into())
            })?;
            let preset = SummaryPage::matching(geometry.width(), geometry.height());
            let page = self.summary_page(preset, palette, &summary)?;
            doc_a.graft_pages(&page, Placement::Front)?;
            doc_a.into_bytes()
        })?;

        Ok(deliver(OutputVariant::Merged, bytes, summary, outcomes.skipped))
    }

    /// Zip of A with missing highlights, B with extra highlights, and the
    /// summary JSON.
    #[instrument(skip_all, fields(variant = ?OutputVariant::Archive))]
    pub fn archive(&self, first: &[u8], second: &[u8]) -> Result<Deliverable> {
        let missing = self.config.palettes.missing_only.missing.color;
        let extra = self.config.palettes.extra_only.extra.color;
        let mut session = Session::open(first, second, &self.config)?;
        let outcomes = session.run(|doc_a, doc_b, cmp| {
            AnnotationRenderer::highlight(doc_a, cmp.page_index, &cmp.missing, missing)?;
            AnnotationRenderer::highlight(doc_b, cmp.page_index, &cmp.extra, extra).map(drop)
        })?;
        let summary = outcomes.summary();

        let (doc_a, doc_b) = session.into_documents();
        let bytes = assemble(|| {
            let first_pdf = doc_a.into_bytes()?;
            let second_pdf = doc_b.into_bytes()?;
            let json = summary.to_json()?;
            archive::bundle(&[
                (MISSING_ENTRY, first_pdf.as_slice()),
                (EXTRA_ENTRY, second_pdf.as_slice()),
                (SUMMARY_ENTRY, json.as_bytes()),
            ])
        })?;

        Ok(deliver(OutputVariant::Archive, bytes, summary, outcomes.skipped))
    }

    fn summary_page(
        &self,
        preset: SummaryPage,
        palette: &Palette,
        summary: &SummaryReport,
    ) -> Result<SourceDocument> {
        let pdf = SummaryReportBuilder::new(preset, palette.clone(), generated_at()).build(summary)?;
        SourceDocument::from_bytes(&pdf)
    }
}

fn generated_at() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Run an assembly step, reporting any failure as a packaging failure.
fn assemble<T>(step: impl FnOnce() -> Result<T>) -> Result<T> {
    step().map_err(|err| match err {
        CompareError::Packaging(_) => err,
        other => CompareError::Packaging(other.to_string()),
    })
}

fn deliver(
    variant: OutputVariant,
    bytes: Vec<u8>,
    summary: SummaryReport,
    skipped: Vec<SkippedPage>,
) -> Deliverable {
    info!(
        ?variant,
        output_bytes = bytes.len(),
        pages = summary.len(),
        missing = summary.total_missing(),
        extra = summary.total_extra(),
        skipped = skipped.len(),
        "Deliverable packaged"
    );
    Deliverable {
        variant,
        bytes,
        summary,
        skipped,
    }
}
