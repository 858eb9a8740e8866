//! Image processing functionality for DOCX conversion

use docx_rs::*;
use image::GenericImageView;
use std::io::Cursor;

use crate::resolver::is_svg;
use crate::Result;

/// EMUs per CSS pixel at 96 DPI.
pub const EMU_PER_PX: u32 = 9525;
/// Widest image the page holds: 6 inches.
pub const MAX_WIDTH_EMU: u32 = 5_486_400;

/// Image bytes in a format DOCX embeds, with their size in pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImage {
    /// PNG or JPEG bytes.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Image processor for DOCX documents
#[derive(Debug, Clone, Default)]
pub struct DocxImageProcessor;

impl DocxImageProcessor {
    /// Create a new image processor
    pub fn new() -> Self {
        Self
    }

    /// Rasterizes SVG data to PNG. Returns the PNG together with the size of
    /// the SVG in pixels.
    pub fn convert_svg_to_png(&self, svg_data: &[u8]) -> Result<PreparedImage> {
        let svg_str = std::str::from_utf8(svg_data)
            .map_err(|_| "Unable to parse SVG data as UTF-8 string")?;

        let dpi = 192.0;
        let scale_factor = dpi / 96.0;

        let opt = resvg::usvg::Options {
            dpi,
            ..resvg::usvg::Options::default()
        };

        let rtree = resvg::usvg::Tree::from_str(svg_str, &opt)
            .map_err(|e| format!("SVG parsing error: {e:?}"))?;

        let size = rtree.size().to_int_size();
        let width = (size.width() as f32 * scale_factor) as u32;
        let height = (size.height() as f32 * scale_factor) as u32;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or("Unable to create pixel buffer")?;

        resvg::render(
            &rtree,
            resvg::tiny_skia::Transform::from_scale(scale_factor, scale_factor),
            &mut pixmap.as_mut(),
        );

        let data = pixmap
            .encode_png()
            .map_err(|e| format!("PNG encoding error: {e:?}"))?;

        Ok(PreparedImage {
            data,
            width: size.width(),
            height: size.height(),
        })
    }

    /// Brings image data into a format DOCX embeds. PNG and JPEG are kept,
    /// SVG is rasterized and anything else is transcoded to PNG.
    pub fn prepare(&self, data: &[u8]) -> Result<PreparedImage> {
        if is_svg(data) {
            return self.convert_svg_to_png(data);
        }

        let format = image::guess_format(data).map_err(|_| "Unknown image format")?;
        let img = image::load_from_memory(data)
            .map_err(|e| format!("Unable to load image: {e}"))?;
        let (width, height) = img.dimensions();

        let data = match format {
            image::ImageFormat::Png | image::ImageFormat::Jpeg => data.to_vec(),
            _ => {
                let mut buffer = Vec::new();
                img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
                    .map_err(|e| format!("Unable to convert image to PNG: {e}"))?;
                buffer
            }
        };

        Ok(PreparedImage {
            data,
            width,
            height,
        })
    }

    /// Builds the picture for an image, sized by the requested pixel size or
    /// the intrinsic one.
    pub fn build_pic(
        &self,
        data: &[u8],
        requested: (Option<u32>, Option<u32>),
    ) -> Result<Pic> {
        let prepared = self.prepare(data)?;
        let (width, height) =
            Self::calculate_image_dimensions((prepared.width, prepared.height), requested);
        Ok(Pic::new(&prepared.data).size(width, height))
    }

    /// Calculate image dimensions in EMU for DOCX, keeping the aspect ratio
    /// and bounding the width to the page.
    pub fn calculate_image_dimensions(
        intrinsic: (u32, u32),
        requested: (Option<u32>, Option<u32>),
    ) -> (u32, u32) {
        let (iw, ih) = (intrinsic.0.max(1) as f64, intrinsic.1.max(1) as f64);
        let (w, h) = match requested {
            (Some(w), Some(h)) => (w as f64, h as f64),
            (Some(w), None) => (w as f64, w as f64 * ih / iw),
            (None, Some(h)) => (h as f64 * iw / ih, h as f64),
            (None, None) => (iw, ih),
        };

        let mut width = w * EMU_PER_PX as f64;
        let mut height = h * EMU_PER_PX as f64;
        if width > MAX_WIDTH_EMU as f64 {
            height *= MAX_WIDTH_EMU as f64 / width;
            width = MAX_WIDTH_EMU as f64;
        }

        (width.round().max(1.0) as u32, height.round().max(1.0) as u32)
    }
}
