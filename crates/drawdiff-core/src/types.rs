// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the drawdiff comparison engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Unique identifier for one comparison request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComparisonId(pub Uuid);

impl ComparisonId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ComparisonId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ComparisonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// -- Geometry -----------------------------------------------------------------

/// Axis-aligned box in page space (points, top-left origin, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Finite coordinates with `x0 < x1` and `y0 < y1`.
    pub fn is_valid(&self) -> bool {
        [self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|v| v.is_finite())
            && self.x0 < self.x1
            && self.y0 < self.y1
    }

    /// True when every coordinate differs from `other`'s by strictly less than
    /// `tolerance`.
    pub fn within(&self, other: &Rect, tolerance: f32) -> bool {
        (self.x0 - other.x0).abs() < tolerance
            && (self.y0 - other.y0).abs() < tolerance
            && (self.x1 - other.x1).abs() < tolerance
            && (self.y1 - other.y1).abs() < tolerance
    }

    pub fn top_left(&self) -> (f32, f32) {
        (self.x0, self.y0)
    }
}

// -- Tokens and comparison results ---------------------------------------------

/// A single word-level text run with its bounding box on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextToken {
    pub text: String,
    pub bbox: Rect,
    /// `bbox.y1 - bbox.y0`. Only used to size synthesised text, never for matching.
    pub font_size_estimate: f32,
    pub page_index: usize,
}

impl TextToken {
    pub fn new(text: impl Into<String>, bbox: Rect, page_index: usize) -> Self {
        Self {
            text: text.into(),
            font_size_estimate: bbox.height(),
            bbox,
            page_index,
        }
    }
}

/// Missing/extra tokens for one compared page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageComparison {
    pub page_index: usize,
    /// Tokens of document A with no counterpart in document B.
    pub missing: Vec<TextToken>,
    /// Tokens of document B with no counterpart in document A.
    pub extra: Vec<TextToken>,
}

impl PageComparison {
    pub fn counts(&self) -> PageCounts {
        PageCounts {
            missing: self.missing.len(),
            extra: self.extra.len(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

/// Number of differences found on a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCounts {
    pub missing: usize,
    pub extra: usize,
}

/// Per-page difference counts, ordered by page index.
///
/// Serialises as `{"summary_data": {"<pageIndex>": {"missing": n, "extra": n}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryReport {
    #[serde(rename = "summary_data")]
    pages: BTreeMap<usize, PageCounts>,
}

impl SummaryReport {
    pub fn from_comparisons<'a>(comparisons: impl IntoIterator<Item = &'a PageComparison>) -> Self {
        Self {
            pages: comparisons
                .into_iter()
                .map(|cmp| (cmp.page_index, cmp.counts()))
                .collect(),
        }
    }

    pub fn get(&self, page_index: usize) -> Option<PageCounts> {
        self.pages.get(&page_index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, PageCounts)> + '_ {
        self.pages.iter().map(|(page, counts)| (*page, *counts))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn total_missing(&self) -> usize {
        self.pages.values().map(|c| c.missing).sum()
    }

    pub fn total_extra(&self) -> usize {
        self.pages.values().map(|c| c.extra).sum()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// -- Colours ------------------------------------------------------------------

/// RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const RED: Rgb = Rgb::new(1.0, 0.0, 0.0);
    pub const BLUE: Rgb = Rgb::new(0.0, 0.0, 1.0);
    pub const YELLOW: Rgb = Rgb::new(1.0, 1.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(level: f32) -> Self {
        Self::new(level, level, level)
    }

    pub fn components(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// A colour together with the name used for it in the summary legend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swatch {
    pub name: String,
    pub color: Rgb,
}

impl Swatch {
    pub fn new(name: impl Into<String>, color: Rgb) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

/// Colours for the two difference kinds in one output variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub missing: Swatch,
    pub extra: Swatch,
}

impl Palette {
    /// Red missing / blue extra, used by the download variants.
    pub fn red_blue() -> Self {
        Self {
            missing: Swatch::new("red", Rgb::RED),
            extra: Swatch::new("blue", Rgb::BLUE),
        }
    }

    /// White missing / yellow extra, used by the full report.
    pub fn white_yellow() -> Self {
        Self {
            missing: Swatch::new("white", Rgb::WHITE),
            extra: Swatch::new("yellow", Rgb::YELLOW),
        }
    }
}

// -- Output variants ----------------------------------------------------------

/// The deliverables the engine can package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputVariant {
    /// Annotated document A, watermark, appended summary page.
    FullReport,
    /// Document A with missing tokens highlighted.
    MissingOnly,
    /// Document B with extra tokens highlighted.
    ExtraOnly,
    /// Summary page followed by document A carrying both kinds of marks.
    Merged,
    /// Zip bundle of the missing-only and extra-only documents plus summary JSON.
    Archive,
}

impl OutputVariant {
    /// Fixed download filename for the variant.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::FullReport => "compared_output.pdf",
            Self::MissingOnly => "missing-pdf.pdf",
            Self::ExtraOnly => "extra-pdf.pdf",
            Self::Merged => "compain-missing-extra.pdf",
            Self::Archive => "comparison_result.zip",
        }
    }

    /// MIME type for the response body.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Archive => "application/zip",
            _ => "application/pdf",
        }
    }
}

// -- Per-page failures --------------------------------------------------------

/// Pipeline stage at which a page was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Extraction,
    Matching,
    Rendering,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Extraction => "extraction",
            Self::Matching => "matching",
            Self::Rendering => "rendering",
        };
        f.write_str(label)
    }
}

/// A page that was left out of the result after a recoverable failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPage {
    pub page: usize,
    pub stage: PipelineStage,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_tolerance_is_strict() {
        let a = Rect::new(10.0, 10.0, 30.0, 20.0);
        assert!(a.within(&Rect::new(11.0, 11.0, 31.0, 21.0), 5.0));
        assert!(!a.within(&Rect::new(15.0, 10.0, 30.0, 20.0), 5.0));
        assert!(!a.within(&a, 0.0));
    }

    #[test]
    fn rect_validity() {
        assert!(Rect::new(0.0, 0.0, 1.0, 1.0).is_valid());
        assert!(!Rect::new(1.0, 0.0, 1.0, 1.0).is_valid());
        assert!(!Rect::new(0.0, 0.0, f32::NAN, 1.0).is_valid());
    }

    #[test]
    fn token_font_size_is_bbox_height() {
        let token = TextToken::new("R10", Rect::new(10.0, 10.0, 30.0, 22.5), 0);
        assert_eq!(token.font_size_estimate, 12.5);
    }

    #[test]
    fn summary_json_shape() {
        let comparisons = vec![
            PageComparison {
                page_index: 0,
                missing: vec![TextToken::new("A", Rect::new(0.0, 0.0, 1.0, 1.0), 0)],
                extra: Vec::new(),
            },
            PageComparison {
                page_index: 2,
                ..Default::default()
            },
        ];
        let report = SummaryReport::from_comparisons(&comparisons);
        assert_eq!(
            report.to_json().unwrap(),
            r#"{"summary_data":{"0":{"missing":1,"extra":0},"2":{"missing":0,"extra":0}}}"#
        );
        assert_eq!(report.total_missing(), 1);
        assert_eq!(report.get(1), None);
    }

    #[test]
    fn variant_download_contract() {
        assert_eq!(OutputVariant::MissingOnly.file_name(), "missing-pdf.pdf");
        assert_eq!(OutputVariant::ExtraOnly.file_name(), "extra-pdf.pdf");
        assert_eq!(OutputVariant::Merged.file_name(), "compain-missing-extra.pdf");
        assert_eq!(OutputVariant::Merged.content_type(), "application/pdf");
        assert_eq!(OutputVariant::Archive.content_type(), "application/zip");
    }
}
