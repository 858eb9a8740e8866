//! Document style management for DOCX conversion

use docx_rs::*;

/// Body font of the generated documents.
pub const BODY_FONT: &str = "Calibri";
/// Body font size in half-points.
pub const BODY_SIZE: usize = 22;

/// Document style management
#[derive(Clone, Debug, Default)]
pub struct DocxStyles;

impl DocxStyles {
    /// Create a new style manager
    pub fn new() -> Self {
        Self
    }

    /// Create a heading style with the specified parameters
    fn create_heading_style(name: &str, display_name: &str, size: usize) -> Style {
        Style::new(name, StyleType::Paragraph)
            .name(display_name)
            .size(size)
            .bold()
    }

    /// The heading style of a heading level, clamped to 1..=6.
    pub fn heading(level: u8) -> &'static str {
        match level {
            0 | 1 => "Heading1",
            2 => "Heading2",
            3 => "Heading3",
            4 => "Heading4",
            5 => "Heading5",
            _ => "Heading6",
        }
    }

    /// Initialize all document styles
    pub fn initialize_styles(&self, docx: Docx) -> Docx {
        let body_fonts = RunFonts::new()
            .ascii(BODY_FONT)
            .hi_ansi(BODY_FONT)
            .east_asia(BODY_FONT)
            .cs(BODY_FONT);

        let heading1 = Self::create_heading_style("Heading1", "Heading 1", 32);
        let heading2 = Self::create_heading_style("Heading2", "Heading 2", 28);
        let heading3 = Self::create_heading_style("Heading3", "Heading 3", 26);
        let heading4 = Self::create_heading_style("Heading4", "Heading 4", 24);
        let heading5 = Self::create_heading_style("Heading5", "Heading 5", 22);
        let heading6 = Self::create_heading_style("Heading6", "Heading 6", 20);

        let courier_fonts = RunFonts::new()
            .ascii("Courier New")
            .hi_ansi("Courier New")
            .east_asia("Courier New")
            .cs("Courier New");

        let code_block = Style::new("CodeBlock", StyleType::Paragraph)
            .name("Code Block")
            .fonts(courier_fonts.clone())
            .size(18);

        let code_inline = Style::new("CodeInline", StyleType::Character)
            .name("Code Inline")
            .fonts(courier_fonts)
            .size(18);

        let hyperlink = Style::new("Hyperlink", StyleType::Character)
            .name("Hyperlink")
            .color("0000FF")
            .underline("single");

        let blockquote = Style::new("Blockquote", StyleType::Paragraph)
            .name("Block Quote")
            .indent(Some(720), None, None, None)
            .italic();

        let image_placeholder = Style::new("ImagePlaceholder", StyleType::Paragraph)
            .name("Image Placeholder")
            .color("808080")
            .italic();

        let horizontal_rule = Style::new("HorizontalRule", StyleType::Paragraph)
            .name("Horizontal Rule")
            .color("A0A0A0")
            .align(AlignmentType::Center);

        let table = Style::new("TableGrid", StyleType::Table).name("Table Grid");

        docx.default_fonts(body_fonts)
            .default_size(BODY_SIZE)
            .add_style(heading1)
            .add_style(heading2)
            .add_style(heading3)
            .add_style(heading4)
            .add_style(heading5)
            .add_style(heading6)
            .add_style(code_block)
            .add_style(code_inline)
            .add_style(hyperlink)
            .add_style(blockquote)
            .add_style(image_placeholder)
            .add_style(horizontal_rule)
            .add_style(table)
    }
}
