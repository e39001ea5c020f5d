// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Upload intake — filename sanitisation, extension whitelist, and size cap.

use drawdiff_core::error::{CompareError, Result};
use tracing::{debug, warn};

use crate::integrity::fingerprint;

/// Reduce an uploaded filename to a safe basename.
///
/// Any directory components (either separator style) are dropped, `.`/`..`
/// segments vanish with them, and whitespace becomes `_`.
pub fn sanitize_filename(raw: &str) -> String {
    let basename = raw
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();

    let cleaned: String = basename
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();

    match cleaned.as_str() {
        "." | ".." => String::new(),
        _ => cleaned,
    }
}

/// True when `filename` has a `.pdf` extension (case-insensitive).
pub fn is_allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((stem, ext)) => !stem.is_empty() && ext.eq_ignore_ascii_case("pdf"),
        None => false,
    }
}

/// A validated PDF upload, ready to hand to the engine.
#[derive(Debug, Clone)]
pub struct PdfUpload {
    file_name: String,
    bytes: Vec<u8>,
    fingerprint: String,
}

impl PdfUpload {
    /// Validate a raw upload against the intake rules.
    pub fn new(raw_name: &str, bytes: Vec<u8>, max_bytes: usize) -> Result<Self> {
        let file_name = sanitize_filename(raw_name);
        if file_name.is_empty() {
            return Err(CompareError::InvalidUpload(
                "both PDF files must have a valid name".into(),
            ));
        }
        if !is_allowed_file(&file_name) {
            warn!(%file_name, "rejected non-PDF upload");
            return Err(CompareError::InvalidUpload(
                "only PDF files are allowed".into(),
            ));
        }
        if bytes.is_empty() {
            return Err(CompareError::InvalidUpload(format!("{file_name} is empty")));
        }
        if bytes.len() > max_bytes {
            warn!(%file_name, len = bytes.len(), max_bytes, "rejected oversized upload");
            return Err(CompareError::InvalidUpload(format!(
                "file size exceeds the {} limit",
                human_size(max_bytes)
            )));
        }

        let fingerprint = fingerprint(&bytes);
        debug!(%file_name, len = bytes.len(), %fingerprint, "upload accepted");

        Ok(Self {
            file_name,
            bytes,
            fingerprint,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

fn human_size(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{bytes} bytes")
    }
}
