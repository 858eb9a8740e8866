//! DOCX writer implementation using docx-rs
//!
//! This module is organized into several main components:
//! - Writer: renders the document tree to a `Docx` and packs it
//! - Styles: document style management
//! - Numbering: list numbering management
//! - Image processor: transcoding and sizing of embedded images

mod image_processor;
mod numbering;
mod styles;
mod writer;

pub use image_processor::{DocxImageProcessor, PreparedImage, EMU_PER_PX, MAX_WIDTH_EMU};
pub use numbering::{list_indent, MAX_LIST_LEVEL};
pub use writer::{DocxWriter, MAX_TABLE_DEPTH};

#[cfg(test)]
pub(crate) use writer::{css_color_to_hex, font_size_half_points, highlight_name};
