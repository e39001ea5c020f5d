// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic drawings for tests and benchmarks.
//
// Pages are built directly with lopdf so each word's position is known
// exactly. Only compiled for tests or with the `fixtures` feature.

use lopdf::{Document, Object, ObjectId, Stream, dictionary};

struct SampleWord {
    text: String,
    x: f32,
    baseline: f32,
    size: f32,
}

/// One page of a synthetic drawing.
pub struct SamplePage {
    width: f32,
    height: f32,
    words: Vec<SampleWord>,
    raw: Vec<String>,
    form: Option<String>,
    unreadable: bool,
}

impl SamplePage {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            words: Vec::new(),
            raw: Vec::new(),
            form: None,
            unreadable: false,
        }
    }

    /// Place `text` in Helvetica with its origin at (`x`, `baseline`) in
    /// top-left page space.
    pub fn word(mut self, text: &str, x: f32, baseline: f32, size: f32) -> Self {
        self.words.push(SampleWord {
            text: text.to_string(),
            x,
            baseline,
            size,
        });
        self
    }

    /// Append raw content-stream operators (user space, /F1 is Helvetica).
    pub fn raw(mut self, ops: &str) -> Self {
        self.raw.push(ops.to_string());
        self
    }

    /// Draw `ops` through a Form XObject named /Fm0.
    pub fn form(mut self, ops: &str) -> Self {
        self.form = Some(ops.to_string());
        self
    }

    /// Replace /Contents with an integer, which no reader can interpret.
    pub fn unreadable_contents(mut self) -> Self {
        self.unreadable = true;
        self
    }
}

/// Serialise `pages` into a complete PDF.
pub fn sample_pdf(pages: &[SamplePage]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::with_capacity(pages.len());
    for page in pages {
        let mut ops = String::new();
        for word in &page.words {
            ops.push_str(&format!(
                "BT /F1 {} Tf {} {} Td ({}) Tj ET\n",
                word.size,
                word.x,
                page.height - word.baseline,
                escape(&word.text)
            ));
        }
        for raw in &page.raw {
            ops.push_str(raw);
            ops.push('\n');
        }

        let mut resources = dictionary! {
            "Font" => Object::Dictionary(dictionary! { "F1" => font_id }),
        };
        if let Some(form) = &page.form {
            let form_stream = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => media_box(page.width, page.height),
                    "Resources" => Object::Dictionary(dictionary! {
                        "Font" => Object::Dictionary(dictionary! { "F1" => font_id }),
                    }),
                },
                form.as_bytes().to_vec(),
            );
            let form_id = doc.add_object(Object::Stream(form_stream));
            resources.set("XObject", Object::Dictionary(dictionary! { "Fm0" => form_id }));
            ops.push_str("/Fm0 Do\n");
        }

        let contents = if page.unreadable {
            Object::Integer(0)
        } else {
            Object::from(doc.add_object(Object::Stream(Stream::new(
                lopdf::Dictionary::new(),
                ops.into_bytes(),
            ))))
        };
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box(page.width, page.height),
            "Contents" => contents,
            "Resources" => Object::Dictionary(resources),
        });
        kids.push(Object::from(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save sample PDF");
    buf
}

fn media_box(width: f32, height: f32) -> Vec<Object> {
    vec![
        Object::Real(0.0),
        Object::Real(0.0),
        Object::Real(width),
        Object::Real(height),
    ]
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}
