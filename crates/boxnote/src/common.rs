//! Common types for the conversion system.

use ecow::EcoString;

use crate::model::Node;
use crate::Result;

/// Valid formats for the conversion.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// A standalone HTML page.
    Html,
    /// A Word document.
    #[default]
    Docx,
}

impl Format {
    /// The file extension of documents in this format.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Html => "html",
            Format::Docx => "docx",
        }
    }
}

/// Format writer trait for rendering a document tree to a specific format.
pub trait FormatWriter {
    /// Write the document to a string.
    fn write_eco(&mut self, document: &Node, output: &mut EcoString) -> Result<()>;

    /// Write the document to bytes.
    fn write_vec(&mut self, document: &Node) -> Result<Vec<u8>>;
}
