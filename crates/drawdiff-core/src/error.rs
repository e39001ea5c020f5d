// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for drawdiff.

use thiserror::Error;

use crate::types::PipelineStage;

/// Top-level error type for all comparison operations.
#[derive(Debug, Error)]
pub enum CompareError {
    // -- Request-fatal document errors --
    #[error("failed to open PDF: {0}")]
    Open(String),

    #[error("unsupported document: {0}")]
    Unsupported(String),

    // -- Page-local errors (the page is skipped) --
    #[error("text extraction failed on page {page}: {detail}")]
    Extraction { page: usize, detail: String },

    #[error("token matching failed on page {page}: {detail}")]
    Match { page: usize, detail: String },

    #[error("rendering failed on page {page}: {detail}")]
    Render { page: usize, detail: String },

    // -- Output assembly --
    #[error("packaging failed: {0}")]
    Packaging(String),

    // -- Intake / configuration --
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CompareError {
    /// Page index the error refers to, when it is tied to a single page.
    pub fn page(&self) -> Option<usize> {
        match self {
            Self::Extraction { page, .. } | Self::Match { page, .. } | Self::Render { page, .. } => {
                Some(*page)
            }
            _ => None,
        }
    }

    /// Stage that failed, for errors the pipeline may recover from by
    /// skipping the page. `None` means the whole request fails.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::Extraction { .. } => Some(PipelineStage::Extraction),
            Self::Match { .. } => Some(PipelineStage::Matching),
            Self::Render { .. } => Some(PipelineStage::Rendering),
            _ => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CompareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_errors_are_local() {
        let err = CompareError::Render {
            page: 3,
            detail: "inverted bbox".into(),
        };
        assert_eq!(err.page(), Some(3));
        assert_eq!(err.stage(), Some(PipelineStage::Rendering));
    }

    #[test]
    fn open_and_packaging_are_fatal() {
        assert_eq!(CompareError::Open("garbage".into()).stage(), None);
        assert_eq!(CompareError::Packaging("save".into()).stage(), None);
        assert_eq!(CompareError::Unsupported("encrypted".into()).page(), None);
    }

    #[test]
    fn display_names_the_page() {
        let err = CompareError::Extraction {
            page: 1,
            detail: "bad stream".into(),
        };
        assert_eq!(
            err.to_string(),
            "text extraction failed on page 1: bad stream"
        );
    }
}
