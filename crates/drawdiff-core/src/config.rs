// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CompareError, Result};
use crate::types::Palette;

/// Default positional tolerance in points.
pub const DEFAULT_TOLERANCE: f32 = 5.0;

/// Default per-upload size cap (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Decorative drawing glyphs (GD&T symbols and the like).
const DEFAULT_IGNORED_SYMBOLS: &[&str] = &[
    "⏤", "◯", "⌭", "⌖", "∅", "⊥", "∠", "⌰", "⌙", "⌑", "|", "↕", "∓", "〈", "〉", "▽", "⊓", "⌴",
    "⌵", "⌃", "⌄", "M", "UN", "⌀",
];

/// Settings consumed by the comparison engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Maximum per-coordinate delta (points) for two tokens to share a location.
    pub tolerance: f32,
    /// Reserved for excluding decorative glyphs; not applied by matching.
    pub ignored_symbols: BTreeSet<String>,
    /// Text stamped across pages of the full report.
    pub watermark_text: String,
    /// Fill alpha of the watermark text.
    pub watermark_opacity: f32,
    /// Paint a light backdrop beneath compared pages of the full report.
    pub watermark_backdrop: bool,
    /// Per-upload size cap in bytes.
    pub max_upload_bytes: usize,
    /// Colour scheme for each output variant.
    pub palettes: Palettes,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            ignored_symbols: DEFAULT_IGNORED_SYMBOLS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            watermark_text: "CADSTER".into(),
            watermark_opacity: 0.35,
            watermark_backdrop: true,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            palettes: Palettes::default(),
        }
    }
}

impl CompareConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Same configuration with a different tolerance.
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(CompareError::Config(format!(
                "tolerance must be a finite, non-negative number of points (got {})",
                self.tolerance
            )));
        }
        if !(0.0..=1.0).contains(&self.watermark_opacity) {
            return Err(CompareError::Config(format!(
                "watermark_opacity must lie in 0..=1 (got {})",
                self.watermark_opacity
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(CompareError::Config(
                "max_upload_bytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Colour schemes for the packaged outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palettes {
    pub full_report: Palette,
    pub missing_only: Palette,
    pub extra_only: Palette,
    pub merged: Palette,
}

impl Default for Palettes {
    fn default() -> Self {
        Self {
            full_report: Palette::white_yellow(),
            missing_only: Palette::red_blue(),
            extra_only: Palette::red_blue(),
            merged: Palette::red_blue(),
        }
    }
}
