//! Writer implementations for different output formats

pub mod docx;
pub mod html;

pub use self::docx::DocxWriter;
pub use html::HtmlWriter;

use crate::common::{Format, FormatWriter};
use crate::diagnostics::WarningCollector;
use crate::resolver::ImageSource;

/// Create a writer instance based on the specified format
pub fn create_writer(
    format: Format,
    images: ImageSource,
    warnings: WarningCollector,
) -> Box<dyn FormatWriter> {
    match format {
        Format::Html => Box::new(HtmlWriter::new(images).standalone(true)),
        Format::Docx => Box::new(DocxWriter::new(images, warnings)),
    }
}

/// Creates writers by format.
pub struct WriterFactory;

impl WriterFactory {
    /// See [`create_writer`].
    pub fn create(
        format: Format,
        images: ImageSource,
        warnings: WarningCollector,
    ) -> Box<dyn FormatWriter> {
        create_writer(format, images, warnings)
    }
}
