// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// drawdiff-security — Upload intake and document fingerprints.
//
// Uploads are validated here before the engine ever sees their bytes: file
// names are reduced to a bare, whitespace-free basename, only `.pdf` is
// accepted, and each payload is capped in size. Fingerprints identify uploads
// in logs without logging their content.

pub mod integrity;
pub mod upload;

pub use integrity::{fingerprint, hash_bytes};
pub use upload::{PdfUpload, is_allowed_file, sanitize_filename};
