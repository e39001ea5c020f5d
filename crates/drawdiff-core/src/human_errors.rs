// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error reports for callers of the engine.
//
// Every technical error is mapped to a plain sentence plus a suggestion. The
// report is what a host hands back to an external caller: it never carries a
// backtrace or `Debug` output.

use serde::Serialize;

use crate::error::CompareError;

/// Who has to act for the request to succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Blame {
    /// The uploaded files or the supplied configuration are at fault.
    Input,
    /// The engine failed on otherwise acceptable input.
    Engine,
}

/// Structured, serialisable error for external callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    /// Plain English summary.
    #[serde(rename = "error")]
    pub message: String,
    /// What the caller could try next.
    pub suggestion: String,
    /// Offending page index, where one is known.
    pub page: Option<usize>,
    pub blame: Blame,
}

impl ErrorReport {
    /// Suggested HTTP-style status code for hosts that speak HTTP.
    pub fn status_code(&self) -> u16 {
        match self.blame {
            Blame::Input => 400,
            Blame::Engine => 500,
        }
    }
}

/// Convert a `CompareError` into an `ErrorReport`.
pub fn humanize_error(err: &CompareError) -> ErrorReport {
    let page = err.page();
    match err {
        CompareError::Open(_) => ErrorReport {
            message: "Invalid PDF file.".into(),
            suggestion: "Check that both uploads are complete, readable PDF documents.".into(),
            page,
            blame: Blame::Input,
        },

        CompareError::Unsupported(detail) => ErrorReport {
            message: "This PDF can't be compared.".into(),
            suggestion: format!(
                "Remove password protection and make sure the document has pages. ({detail})"
            ),
            page,
            blame: Blame::Input,
        },

        CompareError::Extraction { page: p, .. } => ErrorReport {
            message: format!("Text on page {} could not be read.", p + 1),
            suggestion: "The page was left out of the comparison.".into(),
            page,
            blame: Blame::Engine,
        },

        CompareError::Match { page: p, .. } => ErrorReport {
            message: format!("Page {} could not be compared.", p + 1),
            suggestion: "The page was left out of the comparison.".into(),
            page,
            blame: Blame::Engine,
        },

        CompareError::Render { page: p, .. } => ErrorReport {
            message: format!("Differences on page {} could not be marked.", p + 1),
            suggestion: "The page was left out of the comparison.".into(),
            page,
            blame: Blame::Engine,
        },

        CompareError::Packaging(_) => ErrorReport {
            message: "The comparison result could not be assembled.".into(),
            suggestion: "Try again; if it keeps failing, try with fewer pages.".into(),
            page,
            blame: Blame::Engine,
        },

        CompareError::InvalidUpload(detail) => ErrorReport {
            message: detail.clone(),
            suggestion: "Upload two PDF files within the size limit.".into(),
            page,
            blame: Blame::Input,
        },

        CompareError::Config(detail) => ErrorReport {
            message: "The comparison settings are invalid.".into(),
            suggestion: detail.clone(),
            page,
            blame: Blame::Input,
        },

        CompareError::Io(_) => ErrorReport {
            message: "A file could not be read or written.".into(),
            suggestion: "Check the file paths and permissions.".into(),
            page,
            blame: Blame::Engine,
        },

        CompareError::Serialization(_) => ErrorReport {
            message: "The comparison summary could not be encoded.".into(),
            suggestion: "Try again.".into(),
            page,
            blame: Blame::Engine,
        },
    }
}
