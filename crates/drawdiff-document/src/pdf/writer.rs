// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Summary page writer — a tabular report of per-page difference counts,
// generated with `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: the page is a `Vec<Op>` operation
// list. Layout below is computed top-down in points and flipped into PDF space
// when ops are emitted.

use chrono::NaiveDateTime;
use drawdiff_core::error::{CompareError, Result};
use drawdiff_core::types::{Palette, Rgb, SummaryReport};
use printpdf::{
    BuiltinFont, Color, LinePoint, Mm, Op, PaintMode, PdfDocument, PdfPage, PdfSaveOptions,
    PdfWarnMsg, Point, Polygon, PolygonRing, Pt, Rgb as PdfRgb, TextItem, WindingOrder,
};
use tracing::{debug, info, instrument};

use super::metrics::{BuiltinFace, text_width};

const MARGIN: f32 = 50.0;
const ROW_HEIGHT: f32 = 40.0;
const COLUMN_WIDTHS: [f32; 3] = [120.0, 180.0, 180.0];
const HEADERS: [&str; 3] = [
    "Page Number",
    "Missing Items Based on PDF2",
    "Extra Items Based on PDF1",
];

const TIMESTAMP_SIZE: f32 = 13.0;
const TITLE_SIZE: f32 = 22.0;
const BODY_SIZE: f32 = 12.0;
const BODY_LEADING: f32 = 15.0;
const HEADER_SIZE: f32 = 11.0;
const CELL_SIZE: f32 = 14.0;

const HEADER_FILL: f32 = 0.8;
const STRIPE_FILL: f32 = 0.95;

/// A4 in points.
const A4: (f32, f32) = (595.28, 841.89);
/// Extra height of the full-report summary page.
const REPORT_EXTRA_HEIGHT: f32 = 200.0;

/// Page size of the generated summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryPage {
    width: f32,
    height: f32,
}

impl SummaryPage {
    /// Same size as a page of the compared drawing.
    pub fn matching(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Landscape A4 extended by 200pt.
    pub fn report() -> Self {
        Self {
            width: A4.1,
            height: A4.0 + REPORT_EXTRA_HEIGHT,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }
}

/// Renders a [`SummaryReport`] as a standalone PDF of one or more pages.
pub struct SummaryReportBuilder {
    page: SummaryPage,
    palette: Palette,
    generated_at: NaiveDateTime,
}

/// One op list per summary page plus how many table rows were laid out.
struct Layout {
    pages: Vec<Vec<Op>>,
    rows_drawn: usize,
}

impl SummaryReportBuilder {
    pub fn new(page: SummaryPage, palette: Palette, generated_at: NaiveDateTime) -> Self {
        Self {
            page,
            palette,
            generated_at,
        }
    }

    /// Serialise the summary. A table too long for one page continues on
    /// further pages of the same size, each repeating the header row.
    #[instrument(skip_all, fields(pages = report.len()))]
    pub fn build(&self, report: &SummaryReport) -> Result<Vec<u8>> {
        let layout = self.layout(report);
        info!(
            rows = layout.rows_drawn,
            summary_pages = layout.pages.len(),
            width = self.page.width,
            height = self.page.height,
            "Building summary page"
        );

        let pages = layout
            .pages
            .into_iter()
            .map(|ops| PdfPage::new(to_mm(self.page.width), to_mm(self.page.height), ops))
            .collect();
        let mut doc = PdfDocument::new("Summary Report");
        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(count = warnings.len(), "printpdf reported warnings");
        }
        if output.is_empty() {
            return Err(CompareError::Packaging(
                "summary page serialised to nothing".into(),
            ));
        }
        Ok(output)
    }

    fn layout(&self, report: &SummaryReport) -> Layout {
        let mut canvas = Canvas::new(self.page.height);
        let width = self.page.width;
        let table_width: f32 = COLUMN_WIDTHS.iter().sum();
        let start_x = ((width - table_width) / 2.0).max(0.0);
        let bottom = self.page.height - MARGIN;
        let mut y = MARGIN;

        let stamp = format!(
            "Comparison generated on : {}",
            self.generated_at.format("%d-%m-%y       Time: %H:%M:%S")
        );
        y += TIMESTAMP_SIZE;
        canvas.centered_text(&stamp, 0.0, width, y, TIMESTAMP_SIZE, BuiltinFace::Helvetica);
        y += 12.0;

        y += TITLE_SIZE;
        canvas.centered_text(
            "Summary Report",
            0.0,
            width,
            y,
            TITLE_SIZE,
            BuiltinFace::HelveticaBold,
        );
        y += 16.0;

        for line in self.description(table_width) {
            y += BODY_LEADING;
            canvas.text(&line, start_x, y, BODY_SIZE, BuiltinFace::Helvetica);
        }
        y += BODY_LEADING;

        y = canvas.header_row(start_x, y);
        // A fresh page always takes at least one row.
        let mut rows_on_page = 0;

        let mut pages = Vec::new();
        let mut rows_drawn = 0;
        for (index, (page, counts)) in report.iter().enumerate() {
            if y + ROW_HEIGHT > bottom && rows_on_page > 0 {
                pages.push(std::mem::take(&mut canvas.ops));
                y = canvas.header_row(start_x, MARGIN);
                rows_on_page = 0;
            }
            let fill = (index % 2 == 0).then(|| Rgb::gray(STRIPE_FILL));
            let cells = [
                (page + 1).to_string(),
                counts.missing.to_string(),
                counts.extra.to_string(),
            ];
            let mut x = start_x;
            for (cell, col_width) in cells.iter().zip(COLUMN_WIDTHS) {
                canvas.rect(x, y, col_width, ROW_HEIGHT, fill);
                canvas.cell_text(cell, x, y, col_width, CELL_SIZE, BuiltinFace::Helvetica);
                x += col_width;
            }
            y += ROW_HEIGHT;
            rows_on_page += 1;
            rows_drawn += 1;
        }
        pages.push(canvas.ops);

        if pages.len() > 1 {
            debug!(summary_pages = pages.len(), "Summary table continued on extra pages");
        }
        Layout { pages, rows_drawn }
    }

    fn description(&self, max_width: f32) -> Vec<String> {
        let missing = &self.palette.missing.name;
        let extra = &self.palette.extra.name;
        let paragraphs = [
            "Functionalities of PDF-to-PDF Engineering Drawing Comparison Tool:".to_string(),
            format!(
                "1. Identifies missing ({missing}) and extra ({extra}) annotations or text between two PDFs."
            ),
            "2. Clearly marks changes using distinct colors for easy review.".to_string(),
            "3. Offers detailed comparison for each page of the drawings.".to_string(),
            "4. Provides page-wise comparison details.".to_string(),
        ];
        paragraphs
            .iter()
            .flat_map(|p| wrap_to_width(p, max_width, BODY_SIZE, BuiltinFace::Helvetica))
            .collect()
    }
}

// -- Drawing helpers ----------------------------------------------------------

/// Op list with a top-down coordinate system.
struct Canvas {
    height: f32,
    ops: Vec<Op>,
}

impl Canvas {
    fn new(height: f32) -> Self {
        Self {
            height,
            ops: Vec::new(),
        }
    }

    fn point(&self, x: f32, y_top: f32) -> LinePoint {
        LinePoint {
            p: Point {
                x: Pt(x),
                y: Pt(self.height - y_top),
            },
            bezier: false,
        }
    }

    /// Stroked cell outline, optionally filled first.
    fn rect(&mut self, x: f32, y_top: f32, width: f32, height: f32, fill: Option<Rgb>) {
        let ring = PolygonRing {
            points: vec![
                self.point(x, y_top),
                self.point(x + width, y_top),
                self.point(x + width, y_top + height),
                self.point(x, y_top + height),
            ],
        };
        if let Some(fill) = fill {
            self.ops.push(Op::SetFillColor { col: color(fill) });
        }
        self.ops.push(Op::SetOutlineColor {
            col: color(Rgb::BLACK),
        });
        self.ops.push(Op::SetOutlineThickness { pt: Pt(0.8) });
        self.ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![ring],
                mode: if fill.is_some() {
                    PaintMode::FillStroke
                } else {
                    PaintMode::Stroke
                },
                winding_order: WindingOrder::NonZero,
            },
        });
    }

    /// Shaded header cells; returns the top of the first data row.
    fn header_row(&mut self, x: f32, y_top: f32) -> f32 {
        let mut x = x;
        for (header, col_width) in HEADERS.iter().zip(COLUMN_WIDTHS) {
            self.rect(x, y_top, col_width, ROW_HEIGHT, Some(Rgb::gray(HEADER_FILL)));
            self.cell_text(header, x, y_top, col_width, HEADER_SIZE, BuiltinFace::HelveticaBold);
            x += col_width;
        }
        y_top + ROW_HEIGHT
    }

    fn text(&mut self, text: &str, x: f32, baseline: f32, size: f32, face: BuiltinFace) {
        let font = builtin(face);
        self.ops.push(Op::SetFillColor {
            col: color(Rgb::BLACK),
        });
        self.ops.push(Op::StartTextSection);
        self.ops.push(Op::SetTextCursor {
            pos: Point {
                x: Pt(x),
                y: Pt(self.height - baseline),
            },
        });
        self.ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(size),
            font,
        });
        self.ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(text.to_string())],
            font,
        });
        self.ops.push(Op::EndTextSection);
    }

    fn centered_text(
        &mut self,
        text: &str,
        left: f32,
        width: f32,
        baseline: f32,
        size: f32,
        face: BuiltinFace,
    ) {
        let x = left + (width - text_width(text, size, face)) / 2.0;
        self.text(text, x.max(left), baseline, size, face);
    }

    /// Text centred horizontally and vertically within a table cell.
    fn cell_text(&mut self, text: &str, x: f32, y_top: f32, width: f32, size: f32, face: BuiltinFace) {
        let baseline = y_top + (ROW_HEIGHT + size * 0.7) / 2.0;
        self.centered_text(text, x, width, baseline, size, face);
    }
}

fn builtin(face: BuiltinFace) -> BuiltinFont {
    match face {
        BuiltinFace::Helvetica => BuiltinFont::Helvetica,
        BuiltinFace::HelveticaBold => BuiltinFont::HelveticaBold,
    }
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(PdfRgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
        icc_profile: None,
    })
}

fn to_mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

/// Greedy word wrap against an estimated rendered width.
///
/// Words wider than `max_width` sit on a line of their own.
fn wrap_to_width(text: &str, max_width: f32, size: f32, face: BuiltinFace) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if text_width(&candidate, size, face) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::SourceDocument;
    use chrono::NaiveDate;
    use drawdiff_core::types::{PageComparison, Rect, TextToken};

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 9)
            .and_then(|d| d.and_hms_opt(14, 5, 7))
            .unwrap()
    }

    fn report(pages: usize) -> SummaryReport {
        let comparisons: Vec<PageComparison> = (0..pages)
            .map(|page_index| PageComparison {
                page_index,
                missing: vec![TextToken::new("A", Rect::new(0.0, 0.0, 1.0, 1.0), page_index)],
                extra: Vec::new(),
            })
            .collect();
        SummaryReport::from_comparisons(&comparisons)
    }

    fn written_text(ops: &[Op]) -> Vec<String> {
        ops.iter()
            .filter_map(|op| match op {
                Op::WriteTextBuiltinFont { items, .. } => Some(items),
                _ => None,
            })
            .flatten()
            .filter_map(|item| match item {
                TextItem::Text(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn report_preset_is_extended_landscape_a4() {
        let page = SummaryPage::report();
        assert!(page.width() > page.height() - REPORT_EXTRA_HEIGHT);
        assert!((page.height() - 795.28).abs() < 0.01);
    }

    #[test]
    fn layout_has_timestamp_title_and_rows() {
        let builder =
            SummaryReportBuilder::new(SummaryPage::report(), Palette::red_blue(), timestamp());
        let layout = builder.layout(&report(3));
        assert_eq!(layout.rows_drawn, 3);
        assert_eq!(layout.pages.len(), 1);

        let text = written_text(&layout.pages[0]);
        assert!(text.contains(&"Comparison generated on : 09-03-26       Time: 14:05:07".to_string()));
        assert!(text.contains(&"Summary Report".to_string()));
        assert!(text.iter().any(|t| t.contains("missing (red)")));
        for header in HEADERS {
            assert!(text.contains(&header.to_string()));
        }
        // Page numbers are 1-based.
        assert!(text.contains(&"3".to_string()));
    }

    #[test]
    fn long_table_continues_on_further_pages() {
        let builder = SummaryReportBuilder::new(
            SummaryPage::matching(612.0, 400.0),
            Palette::white_yellow(),
            timestamp(),
        );
        let layout = builder.layout(&report(20));
        assert_eq!(layout.rows_drawn, 20);
        assert!(layout.pages.len() > 1);

        let mut numbers = Vec::new();
        for ops in &layout.pages {
            let text = written_text(ops);
            // Every page repeats the header row.
            for header in HEADERS {
                assert!(text.contains(&header.to_string()));
            }
            // Cells are written page number first, then missing and extra.
            let cells: Vec<&String> = text
                .iter()
                .skip_while(|t| t.as_str() != HEADERS[2])
                .skip(1)
                .collect();
            numbers.extend(cells.chunks(3).map(|row| row[0].parse::<usize>().unwrap()));
        }
        assert_eq!(numbers, (1..=20).collect::<Vec<_>>());

        // Only the first page carries the title block.
        assert!(written_text(&layout.pages[0]).contains(&"Summary Report".to_string()));
        assert!(!written_text(&layout.pages[1]).contains(&"Summary Report".to_string()));
    }

    #[test]
    fn overflowing_summary_builds_a_multi_page_pdf() {
        let builder = SummaryReportBuilder::new(
            SummaryPage::matching(842.0, 595.0),
            Palette::red_blue(),
            timestamp(),
        );
        let bytes = builder.build(&report(20)).unwrap();
        let doc = SourceDocument::from_bytes(&bytes).unwrap();
        assert!(doc.page_count() > 1);
        for page in 0..doc.page_count() {
            let geometry = doc.geometry(page).unwrap();
            assert!((geometry.width() - 842.0).abs() < 0.5);
        }
    }

    #[test]
    fn builds_a_single_page_pdf_of_the_requested_size() {
        let builder = SummaryReportBuilder::new(
            SummaryPage::matching(612.0, 792.0),
            Palette::red_blue(),
            timestamp(),
        );
        let bytes = builder.build(&report(2)).unwrap();
        let doc = SourceDocument::from_bytes(&bytes).unwrap();
        assert_eq!(doc.page_count(), 1);
        let geometry = doc.geometry(0).unwrap();
        assert!((geometry.width() - 612.0).abs() < 0.5);
        assert!((geometry.height() - 792.0).abs() < 0.5);
    }

    #[test]
    fn wrap_respects_width() {
        let lines = wrap_to_width(
            "one two three four five six seven",
            60.0,
            12.0,
            BuiltinFace::Helvetica,
        );
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 12.0, BuiltinFace::Helvetica) <= 60.0 || !line.contains(' '));
        }
        assert_eq!(lines.join(" "), "one two three four five six seven");
    }
}
