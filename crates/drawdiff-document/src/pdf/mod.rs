// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — opening, extraction, marking, and summary generation.

pub mod annotate;
pub mod extract;
pub mod metrics;
pub mod reader;
pub mod writer;

pub use annotate::AnnotationRenderer;
pub use extract::TextExtractor;
pub use reader::SourceDocument;
pub use writer::SummaryReportBuilder;
