// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Built-in glyph metrics for the standard Helvetica faces.
//
// Used when a font carries no /Widths of its own (standard 14 fonts) and to
// estimate text widths when laying out the summary page.

/// Advance widths (1/1000 em) for ASCII 32..=126 in Helvetica.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

/// Advance widths (1/1000 em) for ASCII 32..=126 in Helvetica-Bold.
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    333, 333, 584, 584, 584, 611, 975, // :..@
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    333, 278, 333, 584, 556, 333, // [..`
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a..m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n..z
    389, 280, 389, 584, // {..~
];

/// Width used for anything outside the ASCII tables.
const FALLBACK_WIDTH: f32 = 556.0;

/// Which built-in face to fall back on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFace {
    Helvetica,
    HelveticaBold,
}

impl BuiltinFace {
    /// Guess the face from a /BaseFont name.
    pub fn from_base_font(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.contains("bold") || lower.contains("black") || lower.contains("heavy") {
            Self::HelveticaBold
        } else {
            Self::Helvetica
        }
    }

    /// Advance width of `c` in 1/1000 em.
    pub fn char_width(&self, c: char) -> f32 {
        let table = match self {
            Self::Helvetica => &HELVETICA,
            Self::HelveticaBold => &HELVETICA_BOLD,
        };
        let code = c as u32;
        if (32..=126).contains(&code) {
            table[(code - 32) as usize] as f32
        } else {
            FALLBACK_WIDTH
        }
    }
}

/// Estimated rendered width of `text` in points.
pub fn text_width(text: &str, size: f32, face: BuiltinFace) -> f32 {
    text.chars().map(|c| face.char_width(c)).sum::<f32>() * size / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_lookup() {
        assert_eq!(BuiltinFace::Helvetica.char_width(' '), 278.0);
        assert_eq!(BuiltinFace::Helvetica.char_width('W'), 944.0);
        assert_eq!(BuiltinFace::HelveticaBold.char_width('b'), 611.0);
        assert_eq!(BuiltinFace::Helvetica.char_width('~'), 584.0);
        assert_eq!(BuiltinFace::Helvetica.char_width('⌀'), FALLBACK_WIDTH);
    }

    #[test]
    fn width_scales_with_size() {
        let w10 = text_width("R10", 10.0, BuiltinFace::Helvetica);
        let w20 = text_width("R10", 20.0, BuiltinFace::Helvetica);
        assert!((w20 - 2.0 * w10).abs() < 1e-4);
        assert!((w10 - (722.0 + 556.0 + 556.0) / 100.0).abs() < 1e-4);
    }

    #[test]
    fn face_from_base_font() {
        assert_eq!(
            BuiltinFace::from_base_font("ABCDEF+Arial-BoldMT"),
            BuiltinFace::HelveticaBold
        );
        assert_eq!(BuiltinFace::from_base_font("Helvetica"), BuiltinFace::Helvetica);
    }
}
