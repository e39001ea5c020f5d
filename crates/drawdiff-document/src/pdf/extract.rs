// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Word-level text extraction.
//
// Page content streams are interpreted with lopdf, tracking just enough of the
// graphics and text state to place every glyph. Glyphs are then grouped into
// words with page-space bounding boxes.

use std::collections::HashMap;

use drawdiff_core::error::{CompareError, Result};
use drawdiff_core::types::TextToken;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, Stream};
use tracing::{debug, instrument, warn};

use super::metrics::BuiltinFace;
use super::reader::{PageGeometry, SourceDocument, dict_get, number, resolve, resolve_inherited};

/// Nesting limit for Form XObjects.
const MAX_FORM_DEPTH: usize = 8;

/// Glyph box extents (em) when a font has no usable descriptor.
const DEFAULT_ASCENT: f32 = 0.8;
const DEFAULT_DESCENT: f32 = -0.2;

/// A baseline move larger than this fraction of the font size starts a new word.
const BASELINE_SHIFT: f32 = 0.5;
/// A horizontal gap wider than this fraction of an em starts a new word.
const WORD_GAP: f32 = 0.25;

/// Upper bound on a single `/W` range, against hostile font dictionaries.
const MAX_CID_RANGE: u32 = 0xFFFF;

type Interp<T> = std::result::Result<T, String>;

/// Reads positioned words out of PDF pages.
pub struct TextExtractor;

impl TextExtractor {
    /// Tokens for every page of a PDF buffer, in page order.
    ///
    /// Fails as a whole if any page can't be read; use
    /// [`TextExtractor::extract_page`] to recover per page.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn extract(bytes: &[u8]) -> Result<Vec<Vec<TextToken>>> {
        let doc = SourceDocument::from_bytes(bytes)?;
        (0..doc.page_count())
            .map(|index| Self::extract_page(&doc, index))
            .collect()
    }

    /// Tokens of a single page, in content-stream order.
    #[instrument(skip(doc))]
    pub fn extract_page(doc: &SourceDocument, page_index: usize) -> Result<Vec<TextToken>> {
        let fail = |detail: String| CompareError::Extraction {
            page: page_index,
            detail,
        };

        let (page_id, geometry) = doc
            .page_id(page_index)
            .zip(doc.geometry(page_index))
            .ok_or_else(|| fail(format!("page {page_index} out of range")))?;

        let document = doc.document();
        let page = document
            .get_dictionary(page_id)
            .map_err(|err| fail(err.to_string()))?;
        let content = page_content(document, page).map_err(fail)?;
        let resources =
            resolve_inherited(document, page_id, b"Resources").and_then(|obj| obj.as_dict().ok());

        let mut interpreter = Interpreter::new(document);
        interpreter
            .run(&content, resources, Matrix::IDENTITY, 0)
            .map_err(fail)?;

        let tokens = group_words(&interpreter.glyphs, &geometry, page_index);
        debug!(
            glyphs = interpreter.glyphs.len(),
            words = tokens.len(),
            "Page extracted"
        );
        Ok(tokens)
    }
}

// -- Geometry -----------------------------------------------------------------

/// PDF affine transform `[a b c d e f]`, row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn translate(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        match operands {
            [a, b, c, d, e, f] => Some(Self::new(
                number(a)?,
                number(b)?,
                number(c)?,
                number(d)?,
                number(e)?,
                number(f)?,
            )),
            _ => None,
        }
    }

    /// `self` followed by `next`.
    fn then(&self, next: &Matrix) -> Matrix {
        Matrix {
            a: self.a * next.a + self.b * next.c,
            b: self.a * next.b + self.b * next.d,
            c: self.c * next.a + self.d * next.c,
            d: self.c * next.b + self.d * next.d,
            e: self.e * next.a + self.f * next.c + next.e,
            f: self.e * next.b + self.f * next.d + next.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }
}

// -- Interpreter state --------------------------------------------------------

#[derive(Debug, Clone)]
struct TextState {
    font: Option<Vec<u8>>,
    size: f32,
    char_spacing: f32,
    word_spacing: f32,
    h_scale: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    text: TextState,
}

/// A placed glyph in user space.
#[derive(Debug, Clone)]
struct Glyph {
    text: String,
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    baseline: f32,
    size: f32,
    space: bool,
}

/// Width and extent information for one font resource.
struct LoadedFont<'a> {
    dict: Option<&'a Dictionary>,
    two_byte: bool,
    first_char: u32,
    widths: Vec<f32>,
    cid_widths: HashMap<u32, f32>,
    default_width: f32,
    ascent: f32,
    descent: f32,
    face: BuiltinFace,
}

impl<'a> LoadedFont<'a> {
    fn fallback() -> Self {
        Self {
            dict: None,
            two_byte: false,
            first_char: 0,
            widths: Vec::new(),
            cid_widths: HashMap::new(),
            default_width: 1000.0,
            ascent: DEFAULT_ASCENT,
            descent: DEFAULT_DESCENT,
            face: BuiltinFace::Helvetica,
        }
    }

    fn load(doc: &'a Document, dict: &'a Dictionary) -> Self {
        let base_font = dict_get(doc, dict, b"BaseFont")
            .and_then(|obj| obj.as_name().ok())
            .map(String::from_utf8_lossy)
            .unwrap_or_default();
        let is_type0 = dict_get(doc, dict, b"Subtype")
            .and_then(|obj| obj.as_name().ok())
            .is_some_and(|name| name == b"Type0");

        let mut font = Self {
            dict: Some(dict),
            face: BuiltinFace::from_base_font(&base_font),
            ..Self::fallback()
        };

        let descriptor_host = if is_type0 {
            font.two_byte = true;
            let descendant = dict_get(doc, dict, b"DescendantFonts")
                .and_then(|obj| obj.as_array().ok())
                .and_then(|fonts| fonts.first())
                .and_then(|obj| resolve(doc, obj).as_dict().ok());
            if let Some(descendant) = descendant {
                font.default_width = dict_get(doc, descendant, b"DW")
                    .and_then(number)
                    .unwrap_or(1000.0);
                if let Some(w) = dict_get(doc, descendant, b"W").and_then(|obj| obj.as_array().ok()) {
                    font.cid_widths = parse_cid_widths(doc, w);
                }
            }
            descendant
        } else {
            font.first_char = dict_get(doc, dict, b"FirstChar")
                .and_then(number)
                .unwrap_or(0.0) as u32;
            font.widths = dict_get(doc, dict, b"Widths")
                .and_then(|obj| obj.as_array().ok())
                .map(|items| {
                    items
                        .iter()
                        .map(|item| number(resolve(doc, item)).unwrap_or(0.0))
                        .collect()
                })
                .unwrap_or_default();
            Some(dict)
        };

        let descriptor = descriptor_host
            .and_then(|host| dict_get(doc, host, b"FontDescriptor"))
            .and_then(|obj| obj.as_dict().ok());
        if let Some(descriptor) = descriptor {
            let ascent = dict_get(doc, descriptor, b"Ascent").and_then(number);
            let descent = dict_get(doc, descriptor, b"Descent").and_then(number);
            if let (Some(ascent), Some(descent)) = (ascent, descent) {
                if ascent > 0.0 && ascent > descent {
                    font.ascent = ascent / 1000.0;
                    font.descent = descent.min(0.0) / 1000.0;
                }
            }
        }

        font
    }

    /// Advance width of `code` in 1/1000 em.
    fn width(&self, code: u32, text: &str) -> f32 {
        if self.two_byte {
            return self
                .cid_widths
                .get(&code)
                .copied()
                .unwrap_or(self.default_width);
        }
        let explicit = code
            .checked_sub(self.first_char)
            .and_then(|index| self.widths.get(index as usize))
            .copied()
            .filter(|w| *w > 0.0);
        match explicit {
            Some(w) => w,
            None => text
                .chars()
                .next()
                .map(|c| self.face.char_width(c))
                .unwrap_or(0.0),
        }
    }
}

fn parse_cid_widths(doc: &Document, items: &[Object]) -> HashMap<u32, f32> {
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < items.len() {
        let Some(first) = number(resolve(doc, &items[i])).map(|n| n as u32) else {
            break;
        };
        match items.get(i + 1).map(|obj| resolve(doc, obj)) {
            Some(Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    // Runs past the end of the CID space are cut short.
                    let Some(cid) = u32::try_from(offset).ok().and_then(|o| first.checked_add(o))
                    else {
                        break;
                    };
                    if let Some(w) = number(resolve(doc, w)) {
                        widths.insert(cid, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let w = items.get(i + 2).map(|obj| resolve(doc, obj)).and_then(number);
                let (Some(last), Some(w)) = (number(last).map(|n| n as u32), w) else {
                    break;
                };
                for cid in first..=last.min(first.saturating_add(MAX_CID_RANGE)) {
                    widths.insert(cid, w);
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

fn load_fonts<'a>(
    doc: &'a Document,
    resources: Option<&'a Dictionary>,
) -> HashMap<Vec<u8>, LoadedFont<'a>> {
    let mut fonts = HashMap::new();
    let font_dict = resources
        .and_then(|res| dict_get(doc, res, b"Font"))
        .and_then(|obj| obj.as_dict().ok());
    let Some(font_dict) = font_dict else {
        return fonts;
    };
    for (name, value) in font_dict.iter() {
        if let Ok(dict) = resolve(doc, value).as_dict() {
            fonts.insert(name.clone(), LoadedFont::load(doc, dict));
        }
    }
    fonts
}

// -- Content interpretation ---------------------------------------------------

struct Interpreter<'a> {
    doc: &'a Document,
    glyphs: Vec<Glyph>,
}

impl<'a> Interpreter<'a> {
    fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            glyphs: Vec::new(),
        }
    }

    fn run(
        &mut self,
        data: &[u8],
        resources: Option<&'a Dictionary>,
        ctm: Matrix,
        depth: usize,
    ) -> Interp<()> {
        let content = Content::decode(data).map_err(|err| format!("content stream: {err}"))?;
        let fonts = load_fonts(self.doc, resources);
        let fallback = LoadedFont::fallback();

        let mut gs = GraphicsState {
            ctm,
            text: TextState::default(),
        };
        let mut saved: Vec<GraphicsState> = Vec::new();
        let mut tm = Matrix::IDENTITY;
        let mut tlm = Matrix::IDENTITY;

        for op in &content.operations {
            let operands = op.operands.as_slice();
            match op.operator.as_str() {
                "q" => saved.push(gs.clone()),
                "Q" => {
                    if let Some(previous) = saved.pop() {
                        gs = previous;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        gs.ctm = m.then(&gs.ctm);
                    }
                }
                "BT" => {
                    tm = Matrix::IDENTITY;
                    tlm = Matrix::IDENTITY;
                }
                "Tf" => {
                    if let [name, size] = operands {
                        gs.text.font = name.as_name().ok().map(<[u8]>::to_vec);
                        gs.text.size = number(size).unwrap_or(gs.text.size);
                    }
                }
                "Tc" => set_number(&mut gs.text.char_spacing, operands),
                "Tw" => set_number(&mut gs.text.word_spacing, operands),
                "TL" => set_number(&mut gs.text.leading, operands),
                "Ts" => set_number(&mut gs.text.rise, operands),
                "Tz" => {
                    if let Some(scale) = operands.first().and_then(number) {
                        gs.text.h_scale = scale / 100.0;
                    }
                }
                "Td" | "TD" => {
                    if let [tx, ty] = operands {
                        let (Some(tx), Some(ty)) = (number(tx), number(ty)) else {
                            continue;
                        };
                        if op.operator == "TD" {
                            gs.text.leading = -ty;
                        }
                        tlm = Matrix::translate(tx, ty).then(&tlm);
                        tm = tlm;
                    }
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        tlm = m;
                        tm = m;
                    }
                }
                "T*" => {
                    tlm = Matrix::translate(0.0, -gs.text.leading).then(&tlm);
                    tm = tlm;
                }
                "Tj" | "'" | "\"" => {
                    let shown = match op.operator.as_str() {
                        "Tj" | "'" => operands.first(),
                        _ => {
                            set_number(&mut gs.text.word_spacing, operands);
                            set_number(&mut gs.text.char_spacing, operands.get(1..).unwrap_or(&[]));
                            operands.get(2)
                        }
                    };
                    if op.operator != "Tj" {
                        tlm = Matrix::translate(0.0, -gs.text.leading).then(&tlm);
                        tm = tlm;
                    }
                    if let Some(Object::String(bytes, _)) = shown {
                        let font = current_font(&fonts, &gs, &fallback);
                        self.show(bytes, font, &gs, &mut tm);
                    }
                }
                "TJ" => {
                    let Some(Object::Array(items)) = operands.first() else {
                        continue;
                    };
                    let font = current_font(&fonts, &gs, &fallback);
                    for item in items {
                        match item {
                            Object::String(bytes, _) => self.show(bytes, font, &gs, &mut tm),
                            other => {
                                if let Some(adjust) = number(other) {
                                    let tx = -adjust / 1000.0 * gs.text.size * gs.text.h_scale;
                                    tm = Matrix::translate(tx, 0.0).then(&tm);
                                }
                            }
                        }
                    }
                }
                "Do" => {
                    if let Some(name) = operands.first().and_then(|obj| obj.as_name().ok()) {
                        self.draw_form(name, resources, &gs.ctm, depth);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Interpret a Form XObject. Image XObjects and unreadable forms are skipped.
    fn draw_form(
        &mut self,
        name: &[u8],
        resources: Option<&'a Dictionary>,
        ctm: &Matrix,
        depth: usize,
    ) {
        let doc = self.doc;
        let xobject = resources
            .and_then(|res| dict_get(doc, res, b"XObject"))
            .and_then(|obj| obj.as_dict().ok())
            .and_then(|xobjects| dict_get(doc, xobjects, name));
        let Some(Object::Stream(stream)) = xobject else {
            return;
        };
        let is_form = stream
            .dict
            .get(b"Subtype")
            .and_then(Object::as_name)
            .is_ok_and(|subtype| subtype == b"Form");
        if !is_form {
            return;
        }
        if depth >= MAX_FORM_DEPTH {
            warn!(depth, "Form XObject nesting too deep, skipping");
            return;
        }

        let matrix = dict_get(doc, &stream.dict, b"Matrix")
            .and_then(|obj| obj.as_array().ok())
            .and_then(|items| Matrix::from_operands(items))
            .unwrap_or(Matrix::IDENTITY);
        let form_resources = dict_get(doc, &stream.dict, b"Resources")
            .and_then(|obj| obj.as_dict().ok())
            .or(resources);

        let result = stream_data(stream)
            .and_then(|data| self.run(&data, form_resources, matrix.then(ctm), depth + 1));
        if let Err(err) = result {
            warn!(%err, "Skipping unreadable Form XObject");
        }
    }

    /// Place the glyphs of one shown string and advance the text matrix.
    fn show(&mut self, bytes: &[u8], font: &LoadedFont<'a>, gs: &GraphicsState, tm: &mut Matrix) {
        let state = &gs.text;
        let encoding = font
            .dict
            .and_then(|dict| dict.get_font_encoding(self.doc).ok());
        let code_len = if font.two_byte { 2 } else { 1 };

        for code_bytes in bytes.chunks(code_len) {
            let code = code_bytes
                .iter()
                .fold(0u32, |acc, byte| (acc << 8) | u32::from(*byte));
            let decoded = match &encoding {
                Some(enc) => Document::decode_text(enc, code_bytes)
                    .unwrap_or_else(|_| decode_simple(code_bytes)),
                None => decode_simple(code_bytes),
            };
            let advance = font.width(code, &decoded) / 1000.0;

            let trm = Matrix::new(
                state.size * state.h_scale,
                0.0,
                0.0,
                state.size,
                0.0,
                state.rise,
            )
            .then(tm)
            .then(&gs.ctm);

            let is_space = !decoded.is_empty() && decoded.chars().all(char::is_whitespace);
            let text: String = decoded.chars().filter(|c| !c.is_control()).collect();
            if is_space || !text.is_empty() {
                let corners = [
                    trm.apply(0.0, font.descent),
                    trm.apply(advance, font.descent),
                    trm.apply(0.0, font.ascent),
                    trm.apply(advance, font.ascent),
                ];
                let (xs, ys): (Vec<f32>, Vec<f32>) = corners.into_iter().unzip();
                self.glyphs.push(Glyph {
                    text,
                    x0: xs.iter().copied().fold(f32::INFINITY, f32::min),
                    y0: ys.iter().copied().fold(f32::INFINITY, f32::min),
                    x1: xs.iter().copied().fold(f32::NEG_INFINITY, f32::max),
                    y1: ys.iter().copied().fold(f32::NEG_INFINITY, f32::max),
                    baseline: trm.apply(0.0, 0.0).1,
                    size: trm.c.hypot(trm.d),
                    space: is_space,
                });
            }

            let word_spacing = if code_bytes == b" " {
                state.word_spacing
            } else {
                0.0
            };
            let tx = (advance * state.size + state.char_spacing + word_spacing) * state.h_scale;
            *tm = Matrix::translate(tx, 0.0).then(tm);
        }
    }
}

fn current_font<'f, 'a>(
    fonts: &'f HashMap<Vec<u8>, LoadedFont<'a>>,
    gs: &GraphicsState,
    fallback: &'f LoadedFont<'a>,
) -> &'f LoadedFont<'a> {
    gs.text
        .font
        .as_ref()
        .and_then(|name| fonts.get(name))
        .unwrap_or(fallback)
}

fn set_number(slot: &mut f32, operands: &[Object]) {
    if let Some(value) = operands.first().and_then(number) {
        *slot = value;
    }
}

fn decode_simple(code: &[u8]) -> String {
    match code {
        [byte] => char::from(*byte).to_string(),
        [hi, lo] => char::from_u32(u32::from(u16::from_be_bytes([*hi, *lo])))
            .map(String::from)
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn stream_data(stream: &Stream) -> Interp<Vec<u8>> {
    if stream.dict.has(b"Filter") {
        stream
            .decompressed_content()
            .map_err(|err| format!("cannot decompress stream: {err}"))
    } else {
        Ok(stream.content.clone())
    }
}

/// Concatenated content streams of a page. A page without /Contents is empty.
fn page_content(doc: &Document, page: &Dictionary) -> Interp<Vec<u8>> {
    match dict_get(doc, page, b"Contents") {
        None | Some(Object::Null) => Ok(Vec::new()),
        Some(Object::Stream(stream)) => stream_data(stream),
        Some(Object::Array(parts)) => {
            let mut data = Vec::new();
            for part in parts {
                match resolve(doc, part) {
                    Object::Stream(stream) => {
                        data.extend(stream_data(stream)?);
                        data.push(b'\n');
                    }
                    Object::Null => {}
                    _ => return Err("page /Contents array holds a non-stream".into()),
                }
            }
            Ok(data)
        }
        Some(_) => Err("page /Contents is neither a stream nor an array".into()),
    }
}

// -- Word grouping ------------------------------------------------------------

struct WordInProgress {
    text: String,
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    baseline: f32,
    size: f32,
}

impl WordInProgress {
    fn start(glyph: &Glyph) -> Self {
        Self {
            text: glyph.text.clone(),
            x0: glyph.x0,
            y0: glyph.y0,
            x1: glyph.x1,
            y1: glyph.y1,
            baseline: glyph.baseline,
            size: glyph.size,
        }
    }

    fn breaks_before(&self, glyph: &Glyph) -> bool {
        let size = self.size.max(glyph.size);
        (glyph.baseline - self.baseline).abs() > BASELINE_SHIFT * size
            || glyph.x0 - self.x1 > WORD_GAP * size
            || glyph.x0 < self.x1 - size
    }

    fn push(&mut self, glyph: &Glyph) {
        self.text.push_str(&glyph.text);
        self.x0 = self.x0.min(glyph.x0);
        self.y0 = self.y0.min(glyph.y0);
        self.x1 = self.x1.max(glyph.x1);
        self.y1 = self.y1.max(glyph.y1);
        self.size = self.size.max(glyph.size);
    }
}

fn group_words(glyphs: &[Glyph], geometry: &PageGeometry, page_index: usize) -> Vec<TextToken> {
    let mut tokens = Vec::new();
    let mut current: Option<WordInProgress> = None;

    let mut flush = |word: Option<WordInProgress>| {
        let Some(word) = word else { return };
        let text = word.text.trim();
        if text.is_empty() {
            return;
        }
        let bbox = geometry.to_page_rect(word.x0, word.y0, word.x1, word.y1);
        if !bbox.is_valid() {
            debug!(page = page_index, text, "Dropping word with degenerate box");
            return;
        }
        tokens.push(TextToken::new(text, bbox, page_index));
    };

    for glyph in glyphs {
        if glyph.space {
            flush(current.take());
            continue;
        }
        if current.as_ref().is_some_and(|word| word.breaks_before(glyph)) {
            flush(current.take());
        }
        match current.as_mut() {
            Some(word) => word.push(glyph),
            None => current = Some(WordInProgress::start(glyph)),
        }
    }
    flush(current.take());

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{SamplePage, sample_pdf};

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    fn texts(tokens: &[TextToken]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    fn single_page(page: SamplePage) -> Vec<TextToken> {
        let bytes = sample_pdf(&[page]);
        let doc = SourceDocument::from_bytes(&bytes).unwrap();
        TextExtractor::extract_page(&doc, 0).unwrap()
    }

    #[test]
    fn word_box_in_top_left_page_space() {
        let tokens = single_page(SamplePage::new(612.0, 792.0).word("R10", 72.0, 100.0, 12.0));
        assert_eq!(texts(&tokens), ["R10"]);

        let bbox = tokens[0].bbox;
        let width = (722.0 + 556.0 + 556.0) / 1000.0 * 12.0;
        assert!(close(bbox.x0, 72.0));
        assert!(close(bbox.x1, 72.0 + width));
        assert!(close(bbox.y0, 100.0 - 0.8 * 12.0));
        assert!(close(bbox.y1, 100.0 + 0.2 * 12.0));
        assert!(close(tokens[0].font_size_estimate, 12.0));
        assert_eq!(tokens[0].page_index, 0);
    }

    #[test]
    fn spaces_split_words() {
        let tokens = single_page(SamplePage::new(612.0, 792.0).word("THRU  HOLE X2", 50.0, 60.0, 10.0));
        assert_eq!(texts(&tokens), ["THRU", "HOLE", "X2"]);
        assert!(tokens[0].bbox.x1 < tokens[1].bbox.x0);
    }

    #[test]
    fn kerning_gap_splits_but_small_kern_does_not() {
        let tokens = single_page(
            SamplePage::new(612.0, 792.0)
                .raw("BT /F1 10 Tf 100 500 Td [(AB) -400 (CD)] TJ ET")
                .raw("BT /F1 10 Tf 100 400 Td [(EF) -20 (GH)] TJ ET"),
        );
        assert_eq!(texts(&tokens), ["AB", "CD", "EFGH"]);
    }

    #[test]
    fn baseline_change_splits() {
        let tokens = single_page(
            SamplePage::new(612.0, 792.0)
                .raw("BT /F1 10 Tf 12 TL 100 500 Td (AB) Tj T* (CD) Tj ET"),
        );
        assert_eq!(texts(&tokens), ["AB", "CD"]);
        assert!(close(tokens[1].bbox.y0 - tokens[0].bbox.y0, 12.0));
    }

    #[test]
    fn ctm_scales_boxes() {
        let tokens = single_page(
            SamplePage::new(612.0, 792.0).raw("q 2 0 0 2 0 0 cm BT /F1 10 Tf 50 50 Td (BIG) Tj ET Q"),
        );
        assert_eq!(texts(&tokens), ["BIG"]);
        assert!(close(tokens[0].font_size_estimate, 20.0));
        assert!(close(tokens[0].bbox.x0, 100.0));
    }

    #[test]
    fn form_xobject_text_is_found() {
        let tokens = single_page(
            SamplePage::new(612.0, 792.0)
                .word("OUTSIDE", 10.0, 20.0, 8.0)
                .form("BT /F1 10 Tf 50 50 Td (INSIDE) Tj ET"),
        );
        assert_eq!(texts(&tokens), ["OUTSIDE", "INSIDE"]);
        assert!(close(tokens[1].bbox.x0, 50.0));
    }

    #[test]
    fn empty_page_has_no_tokens() {
        assert!(single_page(SamplePage::new(612.0, 792.0)).is_empty());
    }

    #[test]
    fn whole_document_in_page_order() {
        let bytes = sample_pdf(&[
            SamplePage::new(612.0, 792.0).word("ONE", 10.0, 20.0, 10.0),
            SamplePage::new(612.0, 792.0).word("TWO", 10.0, 20.0, 10.0),
        ]);
        let pages = TextExtractor::extract(&bytes).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1][0].text, "TWO");
        assert_eq!(pages[1][0].page_index, 1);
    }

    #[test]
    fn out_of_range_page_is_extraction_error() {
        let bytes = sample_pdf(&[SamplePage::new(612.0, 792.0)]);
        let doc = SourceDocument::from_bytes(&bytes).unwrap();
        let err = TextExtractor::extract_page(&doc, 3).unwrap_err();
        assert!(matches!(err, CompareError::Extraction { page: 3, .. }));
    }

    #[test]
    fn matrix_composition_order() {
        let scale = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let shift = Matrix::translate(10.0, 5.0);
        assert_eq!(scale.then(&shift).apply(1.0, 1.0), (12.0, 7.0));
        assert_eq!(shift.then(&scale).apply(1.0, 1.0), (22.0, 12.0));
    }

    #[test]
    fn cid_width_ranges() {
        let doc = Document::with_version("1.5");
        let w = vec![
            Object::Integer(1),
            Object::Array(vec![Object::Integer(500), Object::Integer(600)]),
            Object::Integer(10),
            Object::Integer(12),
            Object::Integer(250),
        ];
        let widths = parse_cid_widths(&doc, &w);
        assert_eq!(widths.get(&2), Some(&600.0));
        assert_eq!(widths.get(&11), Some(&250.0));
        assert_eq!(widths.get(&13), None);
    }

    #[test]
    fn cid_widths_stop_at_the_end_of_the_cid_space() {
        let doc = Document::with_version("1.5");
        let w = vec![
            Object::Real(4_294_967_295.0),
            Object::Array(vec![Object::Integer(500), Object::Integer(600)]),
        ];
        let widths = parse_cid_widths(&doc, &w);
        assert_eq!(widths.len(), 1);
        assert_eq!(widths.get(&u32::MAX), Some(&500.0));
    }

    #[test]
    fn non_stream_contents_is_extraction_error() {
        let bytes = sample_pdf(&[
            SamplePage::new(612.0, 792.0).word("R10", 72.0, 100.0, 12.0),
            SamplePage::new(612.0, 792.0).unreadable_contents(),
        ]);
        let doc = SourceDocument::from_bytes(&bytes).unwrap();
        assert_eq!(texts(&TextExtractor::extract_page(&doc, 0).unwrap()), ["R10"]);

        let err = TextExtractor::extract_page(&doc, 1).unwrap_err();
        assert!(matches!(err, CompareError::Extraction { page: 1, .. }));
        assert!(TextExtractor::extract(&bytes).is_err());
    }
}
