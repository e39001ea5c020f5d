// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document integrity — SHA-256 hashing for upload identification.

use sha2::{Digest, Sha256};

/// Number of hex characters kept by [`fingerprint`].
const FINGERPRINT_LEN: usize = 12;

/// Lowercase hex SHA-256 of an upload.
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Short hash prefix used to correlate an upload across log lines.
pub fn fingerprint(data: &[u8]) -> String {
    let mut full = hash_bytes(data);
    full.truncate(FINGERPRINT_LEN);
    full
}
