//! # boxnote
//!
//! Converts Box Notes documents to DOCX, optionally through a standalone
//! HTML rendition with the embedded images exported next to it.

pub mod common;
pub mod converter;
pub mod diagnostics;
mod error;
pub mod model;
pub mod parser;
pub mod resolver;
pub mod writer;

use std::sync::Arc;

use ecow::EcoString;

pub use error::*;

pub use crate::common::Format;
use crate::common::FormatWriter;
pub use crate::converter::{
    validate_boxnote, BatchSummary, ConversionResult, ConvertOptions, ConvertedFiles, Converter,
};
use crate::diagnostics::{Warning, WarningCollector};
use crate::model::Node;
use crate::parser::BoxNoteParser;
use crate::resolver::{ImageResolver, ImageSource};
use crate::writer::{HtmlWriter, WriterFactory};

/// The result type for boxnote.
pub type Result<T, Err = Error> = std::result::Result<T, Err>;

/// A parsed BoxNote, ready to be rendered.
///
/// The parser and both renderers report into the same warning collector, and
/// share one image cache.
#[derive(Debug, Clone)]
pub struct BoxNoteDocument {
    root: Node,
    warnings: WarningCollector,
    images: ImageSource,
    title: Option<EcoString>,
}

impl BoxNoteDocument {
    /// Parses a BoxNote. Images are not exported until a resolver is set.
    pub fn parse(source: &str) -> Result<Self> {
        let warnings = WarningCollector::new();
        let root = BoxNoteParser::new(warnings.clone()).parse(source)?;
        Ok(Self::new(root, warnings))
    }

    /// Create a new BoxNoteDocument instance from a parsed tree
    pub fn new(root: Node, warnings: WarningCollector) -> Self {
        Self {
            images: ImageSource::new(None, warnings.clone()),
            root,
            warnings,
            title: None,
        }
    }

    /// Sets the resolver fetching images, and how often a transient failure
    /// is retried.
    pub fn with_resolver(
        mut self,
        resolver: Option<Arc<dyn ImageResolver>>,
        max_retries: usize,
    ) -> Self {
        self.images =
            ImageSource::new(resolver, self.warnings.clone()).with_max_retries(max_retries);
        self
    }

    /// Sets the title of the HTML page.
    pub fn with_title(mut self, title: impl Into<EcoString>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// The normalized document tree.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The image cache shared by the renderers.
    pub fn images(&self) -> &ImageSource {
        &self.images
    }

    /// Warnings recorded so far.
    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings.snapshot()
    }

    /// Convert the document to a standalone HTML page
    pub fn to_html_string(&self) -> Result<EcoString> {
        let mut writer = HtmlWriter::new(self.images.clone()).standalone(true);
        if let Some(title) = &self.title {
            writer = writer.with_title(title.clone());
        }

        let mut output = EcoString::new();
        writer.write_eco(&self.root, &mut output)?;
        Ok(output)
    }

    /// Convert the document to a DOCX document
    pub fn to_docx(&self) -> Result<Vec<u8>> {
        self.write(Format::Docx)
    }

    /// Convert the document to bytes in the given format.
    pub fn write(&self, format: Format) -> Result<Vec<u8>> {
        let mut writer = WriterFactory::create(format, self.images.clone(), self.warnings.clone());
        writer.write_vec(&self.root)
    }
}

#[cfg(test)]
mod tests;
