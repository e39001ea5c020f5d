// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page marking — highlight annotations, synthesised text, and watermarks
// drawn onto a working copy of a document with `lopdf`.

use drawdiff_core::config::CompareConfig;
use drawdiff_core::error::{CompareError, Result};
use drawdiff_core::types::{Rgb, TextToken};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use tracing::{debug, instrument};

use super::metrics::{BuiltinFace, text_width};
use super::reader::{PageGeometry, SourceDocument, resolve, resolve_inherited};

/// Fill alpha of highlight appearances.
const HIGHLIGHT_ALPHA: f32 = 0.4;
/// Annotation flag: print.
const PRINT_FLAG: i64 = 4;

/// Smallest font size used for synthesised text.
const MIN_INSERT_SIZE: f32 = 4.0;
const INSERT_SIZE_RATIO: f32 = 0.7;

const WATERMARK_SIZE_RATIO: f32 = 0.1;
const WATERMARK_GRAY: f32 = 0.7;
const BACKDROP_GRAY: f32 = 0.85;

const BOLD_FONT: &str = "DdHelvBold";
const REGULAR_FONT: &str = "DdHelv";
const WATERMARK_GS: &str = "DdWatermark";

/// How a set of tokens is marked on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    /// Translucent highlight annotation over each token box.
    Highlight,
    /// The token's text drawn in bold at its top-left corner.
    InsertText,
}

/// Watermark settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Watermark {
    pub text: String,
    pub opacity: f32,
    /// Paint a light backdrop beneath the page content.
    pub backdrop: bool,
}

impl Watermark {
    pub fn from_config(config: &CompareConfig) -> Self {
        Self {
            text: config.watermark_text.clone(),
            opacity: config.watermark_opacity,
            backdrop: config.watermark_backdrop,
        }
    }
}

/// Draws difference marks onto pages of a working copy.
///
/// Every operation checks all token boxes before touching the page, so a
/// rejected call leaves the page as it was.
pub struct AnnotationRenderer;

impl AnnotationRenderer {
    /// Apply `mark` in `color` for every token.
    pub fn apply(
        doc: &mut SourceDocument,
        page_index: usize,
        tokens: &[TextToken],
        mark: Mark,
        color: Rgb,
    ) -> Result<usize> {
        match mark {
            Mark::Highlight => Self::highlight(doc, page_index, tokens, color),
            Mark::InsertText => Self::insert_text(doc, page_index, tokens, color),
        }
    }

    /// Add one highlight annotation per token.
    #[instrument(skip(doc, tokens), fields(tokens = tokens.len()))]
    pub fn highlight(
        doc: &mut SourceDocument,
        page_index: usize,
        tokens: &[TextToken],
        color: Rgb,
    ) -> Result<usize> {
        let (page_id, geometry) = target(doc, page_index)?;
        check_boxes(tokens, page_index)?;
        if tokens.is_empty() {
            return Ok(0);
        }

        let fail = |detail: String| CompareError::Render {
            page: page_index,
            detail,
        };
        let document = doc.document_mut();
        let mut annots = Vec::with_capacity(tokens.len());

        for token in tokens {
            let [x0, y0, x1, y1] = geometry.to_user_rect(&token.bbox);
            let appearance = encode(vec![
                Operation::new("gs", vec![name("GS0")]),
                Operation::new("rg", reals(&color.components())),
                Operation::new("re", reals(&[x0, y0, x1 - x0, y1 - y0])),
                Operation::new("f", vec![]),
            ])
            .map_err(fail)?;
            let appearance_id = document.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => reals(&[x0, y0, x1, y1]),
                    "Resources" => dictionary! {
                        "ExtGState" => dictionary! {
                            "GS0" => dictionary! {
                                "Type" => "ExtGState",
                                "ca" => Object::Real(HIGHLIGHT_ALPHA),
                            },
                        },
                    },
                },
                appearance,
            ));

            annots.push(document.add_object(dictionary! {
                "Type" => "Annot",
                "Subtype" => "Highlight",
                "P" => page_id,
                "F" => PRINT_FLAG,
                "Rect" => reals(&[x0, y0, x1, y1]),
                "QuadPoints" => reals(&[x0, y1, x1, y1, x0, y0, x1, y0]),
                "C" => reals(&color.components()),
                "CA" => Object::Real(HIGHLIGHT_ALPHA),
                "Contents" => Object::string_literal(token.text.clone()),
                "AP" => dictionary! { "N" => appearance_id },
            }));
        }

        append_annotations(document, page_id, &annots).map_err(fail)?;
        debug!(page = page_index, added = annots.len(), "Highlights added");
        Ok(annots.len())
    }

    /// Draw each token's text in bold Helvetica at its top-left corner.
    #[instrument(skip(doc, tokens), fields(tokens = tokens.len()))]
    pub fn insert_text(
        doc: &mut SourceDocument,
        page_index: usize,
        tokens: &[TextToken],
        color: Rgb,
    ) -> Result<usize> {
        let (page_id, geometry) = target(doc, page_index)?;
        check_boxes(tokens, page_index)?;
        if tokens.is_empty() {
            return Ok(0);
        }

        let fail = |detail: String| CompareError::Render {
            page: page_index,
            detail,
        };
        let mut ops = vec![
            Operation::new("q", vec![]),
            Operation::new("rg", reals(&color.components())),
        ];
        for token in tokens {
            let size = (token.bbox.height() * INSERT_SIZE_RATIO)
                .floor()
                .max(MIN_INSERT_SIZE);
            let (x, y) = token.bbox.top_left();
            let (ux, uy) = geometry.to_user_point(x, y);
            ops.extend(show_text(BOLD_FONT, size, ux, uy, &token.text));
        }
        ops.push(Operation::new("Q", vec![]));
        let overlay = encode(ops).map_err(fail)?;

        let document = doc.document_mut();
        let font = standard_font(document, "Helvetica-Bold");
        register_resource(document, page_id, b"Font", BOLD_FONT, font).map_err(fail)?;
        wrap_contents(document, page_id, None, overlay).map_err(fail)?;

        debug!(page = page_index, added = tokens.len(), "Text inserted");
        Ok(tokens.len())
    }

    /// Stamp `watermark` centred on the page, with an optional backdrop
    /// beneath the existing content.
    #[instrument(skip(doc, watermark))]
    pub fn watermark(doc: &mut SourceDocument, page_index: usize, watermark: &Watermark) -> Result<()> {
        let (page_id, geometry) = target(doc, page_index)?;
        let fail = |detail: String| CompareError::Render {
            page: page_index,
            detail,
        };

        let [mx0, my0, _, _] = geometry.media_box();
        let backdrop = if watermark.backdrop {
            let ops = vec![
                Operation::new("q", vec![]),
                Operation::new("rg", reals(&Rgb::gray(BACKDROP_GRAY).components())),
                Operation::new("re", reals(&[mx0, my0, geometry.width(), geometry.height()])),
                Operation::new("f", vec![]),
                Operation::new("Q", vec![]),
            ];
            Some(encode(ops).map_err(fail)?)
        } else {
            None
        };

        let mut overlay = Vec::new();
        let text = watermark.text.trim();
        if !text.is_empty() {
            let size = geometry.width() * WATERMARK_SIZE_RATIO;
            let width = text_width(text, size, BuiltinFace::Helvetica);
            let x = (geometry.width() - width) / 2.0;
            let baseline = (geometry.height() + size * INSERT_SIZE_RATIO) / 2.0;
            let (ux, uy) = geometry.to_user_point(x, baseline);

            let mut ops = vec![
                Operation::new("q", vec![]),
                Operation::new("gs", vec![name(WATERMARK_GS)]),
                Operation::new("rg", reals(&Rgb::gray(WATERMARK_GRAY).components())),
            ];
            ops.extend(show_text(REGULAR_FONT, size, ux, uy, text));
            ops.push(Operation::new("Q", vec![]));
            overlay = encode(ops).map_err(fail)?;
        }

        let document = doc.document_mut();
        if !overlay.is_empty() {
            let font = standard_font(document, "Helvetica");
            register_resource(document, page_id, b"Font", REGULAR_FONT, font).map_err(fail)?;
            let gs = Object::Dictionary(dictionary! {
                "Type" => "ExtGState",
                "ca" => Object::Real(watermark.opacity),
                "CA" => Object::Real(watermark.opacity),
            });
            register_resource(document, page_id, b"ExtGState", WATERMARK_GS, gs).map_err(fail)?;
        }
        wrap_contents(document, page_id, backdrop, overlay).map_err(fail)?;

        debug!(page = page_index, "Watermark applied");
        Ok(())
    }
}

// -- Helpers ------------------------------------------------------------------

type Draw<T> = std::result::Result<T, String>;

fn target(doc: &SourceDocument, page_index: usize) -> Result<(ObjectId, PageGeometry)> {
    doc.page_id(page_index)
        .zip(doc.geometry(page_index))
        .ok_or_else(|| CompareError::Render {
            page: page_index,
            detail: format!("page {page_index} out of range"),
        })
}

fn check_boxes(tokens: &[TextToken], page_index: usize) -> Result<()> {
    match tokens.iter().find(|token| !token.bbox.is_valid()) {
        Some(token) => Err(CompareError::Render {
            page: page_index,
            detail: format!("token {:?} has an invalid box {:?}", token.text, token.bbox),
        }),
        None => Ok(()),
    }
}

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

fn reals(values: &[f32]) -> Vec<Object> {
    values.iter().map(|v| Object::Real(*v)).collect()
}

/// `BT /font size Tf x y Td (text) Tj ET` in user space.
fn show_text(font: &str, size: f32, x: f32, y: f32, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![name(font), Object::Real(size)]),
        Operation::new("Td", reals(&[x, y])),
        Operation::new("Tj", vec![Object::string_literal(win_ansi(text))]),
        Operation::new("ET", vec![]),
    ]
}

/// Latin-1 bytes for a WinAnsi font; anything outside becomes `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

fn encode(operations: Vec<Operation>) -> Draw<Vec<u8>> {
    Content { operations }
        .encode()
        .map_err(|err| format!("cannot encode content: {err}"))
}

fn standard_font(document: &mut Document, base_font: &str) -> Object {
    let id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    });
    Object::Reference(id)
}

fn page_dict_mut(document: &mut Document, page_id: ObjectId) -> Draw<&mut Dictionary> {
    document
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|err| format!("page object unreadable: {err}"))
}

/// Add `name` under `category` in the page's own /Resources.
///
/// Inherited or shared resource dictionaries are copied onto the page first,
/// so other pages are unaffected.
fn register_resource(
    document: &mut Document,
    page_id: ObjectId,
    category: &[u8],
    name: &str,
    value: Object,
) -> Draw<()> {
    let mut resources = resolve_inherited(document, page_id, b"Resources")
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);
    let mut entries = resources
        .get(category)
        .ok()
        .map(|obj| resolve(document, obj))
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);

    entries.set(name, value);
    resources.set(category.to_vec(), Object::Dictionary(entries));
    page_dict_mut(document, page_id)?.set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Isolate the existing content in `q … Q`, then place `before` under it and
/// `after` over it.
fn wrap_contents(
    document: &mut Document,
    page_id: ObjectId,
    before: Option<Vec<u8>>,
    after: Vec<u8>,
) -> Draw<()> {
    let existing: Vec<Object> = {
        let page = document
            .get_dictionary(page_id)
            .map_err(|err| format!("page object unreadable: {err}"))?;
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match document.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    };

    let mut head = before.unwrap_or_default();
    head.extend_from_slice(b"\nq\n");
    let mut tail = b"\nQ\n".to_vec();
    tail.extend(after);

    let head_id = document.add_object(Stream::new(Dictionary::new(), head));
    let tail_id = document.add_object(Stream::new(Dictionary::new(), tail));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(head_id));
    contents.extend(existing);
    contents.push(Object::Reference(tail_id));
    page_dict_mut(document, page_id)?.set("Contents", Object::Array(contents));
    Ok(())
}

/// Append annotation references to the page's /Annots, inline or indirect.
fn append_annotations(document: &mut Document, page_id: ObjectId, annots: &[ObjectId]) -> Draw<()> {
    let mut all: Vec<Object> = {
        let page = document
            .get_dictionary(page_id)
            .map_err(|err| format!("page object unreadable: {err}"))?;
        page.get(b"Annots")
            .ok()
            .and_then(|obj| resolve(document, obj).as_array().ok())
            .cloned()
            .unwrap_or_default()
    };
    all.extend(annots.iter().map(|id| Object::Reference(*id)));
    page_dict_mut(document, page_id)?.set("Annots", Object::Array(all));
    Ok(())
}
