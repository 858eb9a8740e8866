use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use regex::Regex;

use super::*;
use crate::model::ImageRef;
use crate::resolver::{ImageResolver, ResolveError};
use crate::writer::HtmlWriter;

mod html;
mod parser;

/// Wraps block nodes, given as JSON, into a BoxNote file.
pub fn note(blocks: &str) -> String {
    format!(r#"{{"version": 1, "doc": {{"type": "doc", "content": [{blocks}]}}}}"#)
}

pub fn parse(blocks: &str) -> BoxNoteDocument {
    match BoxNoteDocument::parse(&note(blocks)) {
        Ok(doc) => doc,
        Err(err) => panic!("failed to parse note: {err}"),
    }
}

/// Renders an HTML fragment of the note, without exporting images.
pub fn conv(blocks: &str) -> String {
    let doc = parse(blocks);
    let html = HtmlWriter::new(doc.images().clone())
        .render(doc.root())
        .unwrap();

    static REG: OnceLock<Regex> = OnceLock::new();
    let reg = REG.get_or_init(|| Regex::new(r"image_[0-9a-f]{10}").unwrap());
    reg.replace_all(html.trim_end(), "image_redacted").into_owned()
}

/// Warning messages recorded for a document, in order.
pub fn messages(doc: &BoxNoteDocument) -> Vec<String> {
    doc.warnings()
        .into_iter()
        .map(|w| w.message.to_string())
        .collect()
}

/// A 4x2 PNG image.
pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([200, 30, 30, 255]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .unwrap();
    buffer
}

/// Serves the same bytes for every reference and counts the requests.
pub struct StaticResolver {
    pub data: Vec<u8>,
    pub calls: AtomicUsize,
}

impl StaticResolver {
    pub fn new(data: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            data,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageResolver for StaticResolver {
    fn resolve(&self, _image: &ImageRef) -> Result<Vec<u8>, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.data.clone())
    }
}

/// Fails every request with the same error and counts the requests.
pub struct FailingResolver {
    pub error: ResolveError,
    pub calls: AtomicUsize,
}

impl FailingResolver {
    pub fn new(error: ResolveError) -> Arc<Self> {
        Arc::new(Self {
            error,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageResolver for FailingResolver {
    fn resolve(&self, _image: &ImageRef) -> Result<Vec<u8>, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

/// Fails with a transient error a number of times, then succeeds.
pub struct FlakyResolver {
    pub failures: usize,
    pub data: Vec<u8>,
    pub calls: AtomicUsize,
}

impl FlakyResolver {
    pub fn new(failures: usize, data: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            failures,
            data,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageResolver for FlakyResolver {
    fn resolve(&self, _image: &ImageRef) -> Result<Vec<u8>, ResolveError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(ResolveError::NetworkFailure("connection reset".into()));
        }
        Ok(self.data.clone())
    }
}
