// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// drawdiff-document — Everything that touches PDF bytes.
//
// Opens drawings, extracts positioned words, marks differences on working
// copies, renders the summary page, and grafts pages between documents.

pub mod pdf;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

// Re-export the primary types so callers can use `drawdiff_document::TextExtractor` etc.
pub use pdf::annotate::{AnnotationRenderer, Mark, Watermark};
pub use pdf::extract::TextExtractor;
pub use pdf::reader::{PageGeometry, Placement, SourceDocument};
pub use pdf::writer::{SummaryPage, SummaryReportBuilder};
