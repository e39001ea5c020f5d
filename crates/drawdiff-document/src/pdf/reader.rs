// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open drawings, resolve page geometry, and graft pages between
// documents using the `lopdf` crate.

use std::collections::HashMap;

use drawdiff_core::error::{CompareError, Result};
use drawdiff_core::types::Rect;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info, instrument, warn};

/// US Letter, used when a page tree carries no /MediaBox at all.
const LETTER: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Guard against malformed, self-referencing page trees.
const MAX_TREE_DEPTH: usize = 32;

static NULL: Object = Object::Null;

/// An opened PDF document.
///
/// Wraps `lopdf::Document` with a stable 0-based page index. Cloning yields an
/// independent working copy; the original is never written to.
#[derive(Clone)]
pub struct SourceDocument {
    document: Document,
    /// Page object ids in reading order.
    page_ids: Vec<ObjectId>,
}

/// Where grafted pages are inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Front,
    Back,
}

impl SourceDocument {
    // -- Construction ---------------------------------------------------------

    /// Parse a PDF already in memory.
    ///
    /// Unparseable input is `Open`; encrypted or page-less documents are
    /// `Unsupported`.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| match err {
            lopdf::Error::Decryption(_) => {
                CompareError::Unsupported("document is encrypted".into())
            }
            other => CompareError::Open(other.to_string()),
        })?;

        if document.is_encrypted() {
            return Err(CompareError::Unsupported("document is encrypted".into()));
        }

        let page_ids = collect_page_ids(&document);
        if page_ids.is_empty() {
            return Err(CompareError::Unsupported("document has no pages".into()));
        }

        debug!(pages = page_ids.len(), "PDF loaded from bytes");
        Ok(Self { document, page_ids })
    }

    // -- Inspection -----------------------------------------------------------

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Object id of the page at `index` (0-based).
    pub fn page_id(&self, index: usize) -> Option<ObjectId> {
        self.page_ids.get(index).copied()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub(crate) fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Media box of the page at `index`, following /Parent inheritance.
    pub fn geometry(&self, index: usize) -> Option<PageGeometry> {
        let page_id = self.page_id(index)?;
        let media_box = resolve_inherited(&self.document, page_id, b"MediaBox")
            .and_then(|obj| rect_from_array(&self.document, obj))
            .unwrap_or(LETTER);
        Some(PageGeometry::new(media_box))
    }

    // -- Assembly -------------------------------------------------------------

    /// Copy every page of `donor` into this document at `placement`.
    ///
    /// Inherited page attributes are materialised on the copies, and shared
    /// objects are cloned once. Returns the number of pages grafted.
    #[instrument(skip_all, fields(donor_pages = donor.page_count(), ?placement))]
    pub fn graft_pages(&mut self, donor: &SourceDocument, placement: Placement) -> Result<usize> {
        let pages_id = self.pages_root()?;
        let mut memo: HashMap<ObjectId, ObjectId> = HashMap::new();
        let mut grafted = Vec::with_capacity(donor.page_ids.len());

        for &page_id in &donor.page_ids {
            let page = donor.document.get_object(page_id).map_err(|err| {
                CompareError::Packaging(format!("cannot read page object {page_id:?}: {err}"))
            })?;

            let new_id = self.document.new_object_id();
            memo.insert(page_id, new_id);

            let mut cloned = deep_clone_object(&donor.document, &mut self.document, page, &mut memo);
            if let Object::Dictionary(dict) = &mut cloned {
                for key in [&b"MediaBox"[..], b"CropBox", b"Resources", b"Rotate"] {
                    if dict.has(key) {
                        continue;
                    }
                    if let Some(value) = resolve_inherited(&donor.document, page_id, key) {
                        let value =
                            deep_clone_object(&donor.document, &mut self.document, value, &mut memo);
                        dict.set(key.to_vec(), value);
                    }
                }
                dict.set("Parent", Object::Reference(pages_id));
            }
            self.document.objects.insert(new_id, cloned);
            grafted.push(Object::Reference(new_id));
        }

        let added = grafted.len();
        let pages_dict = self
            .document
            .get_object_mut(pages_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| CompareError::Packaging(format!("page tree root unreadable: {err}")))?;

        match pages_dict.get_mut(b"Kids") {
            Ok(Object::Array(kids)) => match placement {
                Placement::Front => {
                    kids.splice(0..0, grafted);
                }
                Placement::Back => kids.extend(grafted),
            },
            _ => {
                return Err(CompareError::Packaging(
                    "page tree root has no /Kids array".into(),
                ));
            }
        }
        let count = pages_dict
            .get(b"Count")
            .and_then(Object::as_i64)
            .unwrap_or(0);
        pages_dict.set("Count", Object::Integer(count + added as i64));

        self.page_ids = collect_page_ids(&self.document);
        info!(added, total = self.page_ids.len(), "Pages grafted");
        Ok(added)
    }

    /// Serialise the document.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.document.save_to(&mut output).map_err(|err| {
            CompareError::Packaging(format!("failed to serialise PDF: {err}"))
        })?;
        debug!(output_bytes = output.len(), "PDF serialised");
        Ok(output)
    }

    fn pages_root(&self) -> Result<ObjectId> {
        self.document
            .catalog()
            .and_then(|catalog| catalog.get(b"Pages"))
            .and_then(Object::as_reference)
            .map_err(|err| CompareError::Packaging(format!("no usable /Pages root: {err}")))
    }
}

// -- Page geometry ------------------------------------------------------------

/// A page's media box in PDF user space (origin bottom-left).
///
/// Converts between user space and the top-left-origin page space in which
/// token boxes are reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    media_box: [f32; 4],
}

impl PageGeometry {
    pub fn new(media_box: [f32; 4]) -> Self {
        let [a, b, c, d] = media_box;
        Self {
            media_box: [a.min(c), b.min(d), a.max(c), b.max(d)],
        }
    }

    pub fn width(&self) -> f32 {
        self.media_box[2] - self.media_box[0]
    }

    pub fn height(&self) -> f32 {
        self.media_box[3] - self.media_box[1]
    }

    pub fn media_box(&self) -> [f32; 4] {
        self.media_box
    }

    /// Map a user-space box to page space.
    pub fn to_page_rect(&self, x0: f32, y0: f32, x1: f32, y1: f32) -> Rect {
        let [mx0, _, _, my1] = self.media_box;
        Rect::new(
            x0.min(x1) - mx0,
            my1 - y0.max(y1),
            x0.max(x1) - mx0,
            my1 - y0.min(y1),
        )
    }

    /// Map a page-space box back to user space as `[x0, y0, x1, y1]`.
    pub fn to_user_rect(&self, rect: &Rect) -> [f32; 4] {
        let [mx0, _, _, my1] = self.media_box;
        [rect.x0 + mx0, my1 - rect.y1, rect.x1 + mx0, my1 - rect.y0]
    }

    /// Map a page-space point to user space.
    pub fn to_user_point(&self, x: f32, y: f32) -> (f32, f32) {
        let [mx0, _, _, my1] = self.media_box;
        (x + mx0, my1 - y)
    }
}

// -- Object helpers -----------------------------------------------------------

/// Follow references until a direct object is reached.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    let mut current = object;
    for _ in 0..MAX_TREE_DEPTH {
        match current {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(next) => current = next,
                Err(_) => return &NULL,
            },
            _ => return current,
        }
    }
    &NULL
}

/// Look up a dictionary entry, resolving a reference in its value.
pub(crate) fn dict_get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().map(|obj| resolve(doc, obj))
}

/// Numeric value of an integer or real object.
pub(crate) fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Page attribute lookup walking up the /Parent chain.
pub(crate) fn resolve_inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(resolve(doc, value));
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn rect_from_array(doc: &Document, object: &Object) -> Option<[f32; 4]> {
    let items = object.as_array().ok()?;
    if items.len() != 4 {
        return None;
    }
    let mut out = [0.0; 4];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = number(resolve(doc, item))?;
    }
    Some(out)
}

fn collect_page_ids(document: &Document) -> Vec<ObjectId> {
    // get_pages is keyed by 1-based page number, already in order.
    document.get_pages().into_values().collect()
}

/// Deep-clone an object from `source` into `target`.
///
/// `memo` maps source ids to ids already allocated in `target`, so shared
/// objects are copied once and reference cycles terminate. /Parent entries are
/// dropped; the caller re-links copied pages into the target tree.
fn deep_clone_object(
    source: &Document,
    target: &mut Document,
    object: &Object,
    memo: &mut HashMap<ObjectId, ObjectId>,
) -> Object {
    match object {
        Object::Dictionary(dict) => Object::Dictionary(clone_dict(source, target, dict, memo)),
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| deep_clone_object(source, target, item, memo))
                .collect(),
        ),
        Object::Reference(ref_id) => {
            if let Some(mapped) = memo.get(ref_id) {
                return Object::Reference(*mapped);
            }
            match source.get_object(*ref_id) {
                Ok(referenced) => {
                    let new_id = target.new_object_id();
                    memo.insert(*ref_id, new_id);
                    let cloned = deep_clone_object(source, target, referenced, memo);
                    target.objects.insert(new_id, cloned);
                    Object::Reference(new_id)
                }
                Err(err) => {
                    warn!(?ref_id, %err, "Cannot resolve reference, using Null");
                    Object::Null
                }
            }
        }
        Object::Stream(stream) => Object::Stream(lopdf::Stream::new(
            clone_dict(source, target, &stream.dict, memo),
            stream.content.clone(),
        )),
        other => other.clone(),
    }
}

fn clone_dict(
    source: &Document,
    target: &mut Document,
    dict: &Dictionary,
    memo: &mut HashMap<ObjectId, ObjectId>,
) -> Dictionary {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        if key == b"Parent" {
            continue;
        }
        new_dict.set(key.clone(), deep_clone_object(source, target, value, memo));
    }
    new_dict
}
