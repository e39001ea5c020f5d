// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Zip bundle for the archive deliverable.

use std::io::{Cursor, Write};

use drawdiff_core::error::{CompareError, Result};
use tracing::debug;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Document A with its missing tokens highlighted.
pub const MISSING_ENTRY: &str = "missing_highlighted_in_pdf1.pdf";
/// Document B with its extra tokens highlighted.
pub const EXTRA_ENTRY: &str = "extra_highlighted_in_pdf2.pdf";
/// The summary JSON.
pub const SUMMARY_ENTRY: &str = "summary.json";

/// Zip `entries` in order, deflated.
pub fn bundle(entries: &[(&str, &[u8])]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, data) in entries {
        writer
            .start_file(*name, options)
            .map_err(|err| CompareError::Packaging(format!("zip entry {name}: {err}")))?;
        writer
            .write_all(data)
            .map_err(|err| CompareError::Packaging(format!("zip entry {name}: {err}")))?;
    }

    let cursor = writer
        .finish()
        .map_err(|err| CompareError::Packaging(format!("zip finalisation: {err}")))?;
    let bytes = cursor.into_inner();
    debug!(entries = entries.len(), archive_bytes = bytes.len(), "Archive written");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn entries_read_back_in_order() {
        let archive = bundle(&[
            (MISSING_ENTRY, b"%PDF-first".as_slice()),
            (EXTRA_ENTRY, b"%PDF-second".as_slice()),
            (SUMMARY_ENTRY, br#"{"summary_data":{}}"#.as_slice()),
        ])
        .unwrap();

        let mut reader = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
        assert_eq!(reader.len(), 3);
        let names: Vec<&str> = reader.file_names().collect();
        assert!(names.contains(&MISSING_ENTRY));
        assert!(names.contains(&SUMMARY_ENTRY));

        let mut json = String::new();
        reader
            .by_name(SUMMARY_ENTRY)
            .unwrap()
            .read_to_string(&mut json)
            .unwrap();
        assert_eq!(json, r#"{"summary_data":{}}"#);

        let mut first = Vec::new();
        reader.by_index(0).unwrap().read_to_end(&mut first).unwrap();
        assert_eq!(first, b"%PDF-first");
    }

    #[test]
    fn empty_bundle_is_a_valid_zip() {
        let archive = bundle(&[]).unwrap();
        assert_eq!(zip::ZipArchive::new(Cursor::new(archive)).unwrap().len(), 0);
    }
}
