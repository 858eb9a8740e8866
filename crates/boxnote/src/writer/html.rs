//! HTML writer implementation

use ecow::EcoString;

use crate::common::FormatWriter;
use crate::model::{ImageRef, Mark, Node, NodeKind};
use crate::resolver::{ImageOutcome, ImageSource};
use crate::Result;

const STYLESHEET: &str = "\
body { font-family: Calibri, Arial, sans-serif; font-size: 11pt; }
table { border-collapse: collapse; }
td { padding: 4px 8px; vertical-align: top; }
ul.check-list { list-style: none; padding-left: 1.2em; }
.image-placeholder { color: #808080; font-style: italic; }
";

/// HTML writer rendering a document tree to markup.
///
/// Fragments are written by default; [`HtmlWriter::standalone`] wraps them
/// into a complete page.
pub struct HtmlWriter {
    images: ImageSource,
    standalone: bool,
    title: Option<EcoString>,
}

impl HtmlWriter {
    /// Creates a fragment writer looking images up in `images`.
    pub fn new(images: ImageSource) -> Self {
        Self {
            images,
            standalone: false,
            title: None,
        }
    }

    /// Whether to emit a complete page with `<head>` and styles.
    pub fn standalone(mut self, standalone: bool) -> Self {
        self.standalone = standalone;
        self
    }

    /// Sets the page title of standalone output.
    pub fn with_title(mut self, title: impl Into<EcoString>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Renders the document to a string.
    pub fn render(&self, document: &Node) -> Result<String> {
        let mut renderer = HtmlRenderer::new(&self.images);
        if !self.standalone {
            renderer.write_node(document)?;
            return renderer.into_string();
        }

        renderer.write_trusted_html("<!DOCTYPE html>\n")?;
        renderer.start_tag("html")?;
        renderer.finish_tag()?;
        renderer.write_trusted_html("\n<head>\n<meta charset=\"utf-8\" />\n")?;
        renderer.start_tag("title")?;
        renderer.finish_tag()?;
        renderer.text(self.title.as_deref().unwrap_or("BoxNote"))?;
        renderer.end_tag("title")?;
        renderer.write_trusted_html("\n<style>\n")?;
        renderer.write_trusted_html(STYLESHEET)?;
        renderer.write_trusted_html("</style>\n</head>\n<body>\n")?;
        renderer.write_node(document)?;
        renderer.write_trusted_html("</body>\n</html>\n")?;
        renderer.into_string()
    }
}

impl FormatWriter for HtmlWriter {
    fn write_eco(&mut self, document: &Node, output: &mut EcoString) -> Result<()> {
        output.push_str(&self.render(document)?);
        Ok(())
    }

    fn write_vec(&mut self, document: &Node) -> Result<Vec<u8>> {
        Ok(self.render(document)?.into_bytes())
    }
}

struct HtmlRenderer<'a> {
    images: &'a ImageSource,
    buffer: String,
    tag_opened: bool,
}

impl<'a> HtmlRenderer<'a> {
    fn new(images: &'a ImageSource) -> Self {
        Self {
            images,
            buffer: String::new(),
            tag_opened: false,
        }
    }

    fn into_string(mut self) -> Result<String> {
        self.ensure_tag_closed()?;
        Ok(self.buffer)
    }

    fn ensure_tag_closed(&mut self) -> Result<()> {
        if self.tag_opened {
            self.buffer.push('>');
            self.tag_opened = false;
        }
        Ok(())
    }

    fn start_tag(&mut self, tag_name: &str) -> Result<()> {
        self.ensure_tag_closed()?;
        self.buffer.push('<');
        self.buffer.push_str(tag_name);
        self.tag_opened = true;
        Ok(())
    }

    fn attribute(&mut self, key: &str, value: &str) -> Result<()> {
        if !self.tag_opened {
            return Err("Cannot write attribute: no tag is currently open.".into());
        }
        self.buffer.push(' ');
        self.buffer.push_str(key);
        self.buffer.push_str("=\"");
        self.buffer
            .push_str(html_escape::encode_double_quoted_attribute(value).as_ref());
        self.buffer.push('"');
        Ok(())
    }

    fn finish_tag(&mut self) -> Result<()> {
        self.ensure_tag_closed()
    }

    fn finish_self_closing_tag(&mut self) -> Result<()> {
        if !self.tag_opened {
            return Err("Cannot finish self-closing tag: no tag is currently open.".into());
        }
        self.buffer.push_str(" />");
        self.tag_opened = false;
        Ok(())
    }

    fn self_closing_tag(&mut self, tag_name: &str) -> Result<()> {
        self.start_tag(tag_name)?;
        self.finish_self_closing_tag()
    }

    fn end_tag(&mut self, tag_name: &str) -> Result<()> {
        self.ensure_tag_closed()?;
        self.buffer.push_str("</");
        self.buffer.push_str(tag_name);
        self.buffer.push('>');
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.ensure_tag_closed()?;
        self.buffer.push_str(html_escape::encode_text(text).as_ref());
        Ok(())
    }

    fn write_trusted_html(&mut self, html: &str) -> Result<()> {
        self.ensure_tag_closed()?;
        self.buffer.push_str(html);
        Ok(())
    }

    fn write_children(&mut self, node: &Node) -> Result<()> {
        for child in &node.children {
            self.write_node(child)?;
        }
        Ok(())
    }

    /// Writes a block element whose children are blocks, each on its own
    /// line.
    fn write_container(&mut self, tag: &str, node: &Node) -> Result<()> {
        self.start_tag(tag)?;
        self.finish_tag()?;
        self.write_trusted_html("\n")?;
        self.write_children(node)?;
        self.end_tag(tag)?;
        self.write_trusted_html("\n")
    }

    /// Writes a block element whose children are inline content.
    fn write_textblock(&mut self, tag: &str, node: &Node) -> Result<()> {
        self.start_tag(tag)?;
        self.write_block_style(node)?;
        self.finish_tag()?;
        self.write_children(node)?;
        self.end_tag(tag)?;
        self.write_trusted_html("\n")
    }

    fn write_block_style(&mut self, node: &Node) -> Result<()> {
        let mut styles = Vec::new();
        if let Some(align) = node.align() {
            styles.push(format!("text-align:{}", align.as_css()));
        }
        let indent = node.indent();
        if indent > 0 {
            styles.push(format!("margin-left:{indent}em"));
        }
        if styles.is_empty() {
            return Ok(());
        }
        self.attribute("style", &styles.join(";"))
    }

    fn write_node(&mut self, node: &Node) -> Result<()> {
        match &node.kind {
            NodeKind::Document | NodeKind::Passthrough { .. } => self.write_children(node),
            NodeKind::Paragraph => self.write_textblock("p", node),
            NodeKind::Heading { level } => {
                let tag_name = format!("h{}", (*level).clamp(1, 6));
                self.write_textblock(&tag_name, node)
            }
            NodeKind::BulletList => self.write_container("ul", node),
            NodeKind::OrderedList { start } => {
                self.start_tag("ol")?;
                if *start != 1 {
                    self.attribute("start", &start.to_string())?;
                }
                self.finish_tag()?;
                self.write_trusted_html("\n")?;
                self.write_children(node)?;
                self.end_tag("ol")?;
                self.write_trusted_html("\n")
            }
            NodeKind::CheckList => {
                self.start_tag("ul")?;
                self.attribute("class", "check-list")?;
                self.finish_tag()?;
                self.write_trusted_html("\n")?;
                self.write_children(node)?;
                self.end_tag("ul")?;
                self.write_trusted_html("\n")
            }
            NodeKind::ListItem => {
                self.start_tag("li")?;
                self.finish_tag()?;
                self.write_children(node)?;
                self.end_tag("li")?;
                self.write_trusted_html("\n")
            }
            NodeKind::CheckItem { checked } => {
                self.start_tag("li")?;
                self.finish_tag()?;
                self.start_tag("input")?;
                self.attribute("type", "checkbox")?;
                self.attribute("disabled", "disabled")?;
                if *checked {
                    self.attribute("checked", "checked")?;
                }
                self.finish_self_closing_tag()?;
                self.write_children(node)?;
                self.end_tag("li")?;
                self.write_trusted_html("\n")
            }
            NodeKind::Table { column_widths } => self.write_table(node, column_widths),
            NodeKind::TableRow => self.write_container("tr", node),
            NodeKind::TableCell {
                colspan, rowspan, ..
            } => {
                self.start_tag("td")?;
                if *colspan > 1 {
                    self.attribute("colspan", &colspan.to_string())?;
                }
                if *rowspan > 1 {
                    self.attribute("rowspan", &rowspan.to_string())?;
                }
                self.finish_tag()?;
                self.write_children(node)?;
                self.end_tag("td")?;
                self.write_trusted_html("\n")
            }
            NodeKind::CodeBlock { language } => {
                self.start_tag("pre")?;
                self.finish_tag()?;
                self.start_tag("code")?;
                if let Some(lang) = language {
                    self.attribute("class", &format!("language-{}", lang.trim()))?;
                }
                self.finish_tag()?;
                for child in &node.children {
                    match &child.kind {
                        NodeKind::Text(text) => self.text(text)?,
                        NodeKind::LineBreak => self.text("\n")?,
                        _ => self.write_node(child)?,
                    }
                }
                self.end_tag("code")?;
                self.end_tag("pre")?;
                self.write_trusted_html("\n")
            }
            NodeKind::Blockquote => self.write_container("blockquote", node),
            NodeKind::HorizontalRule => {
                self.self_closing_tag("hr")?;
                self.write_trusted_html("\n")
            }
            NodeKind::LineBreak => self.self_closing_tag("br"),
            NodeKind::Image(image) => self.write_image(image),
            NodeKind::Text(text) => self.write_text(text, node),
        }
    }

    fn write_table(&mut self, node: &Node, column_widths: &[Option<u32>]) -> Result<()> {
        self.start_tag("table")?;
        self.attribute("border", "1")?;
        self.attribute("cellspacing", "0")?;
        self.finish_tag()?;
        self.write_trusted_html("\n")?;

        if column_widths.iter().any(Option::is_some) {
            self.start_tag("colgroup")?;
            self.finish_tag()?;
            for width in column_widths {
                self.start_tag("col")?;
                if let Some(width) = width {
                    self.attribute("style", &format!("width:{width}px"))?;
                }
                self.finish_self_closing_tag()?;
            }
            self.end_tag("colgroup")?;
            self.write_trusted_html("\n")?;
        }

        self.write_children(node)?;
        self.end_tag("table")?;
        self.write_trusted_html("\n")
    }

    fn write_image(&mut self, image: &ImageRef) -> Result<()> {
        let src = match self.images.fetch(image) {
            ImageOutcome::Resolved(resolved) => resolved.relative_path(),
            ImageOutcome::NotExported => image.source.clone(),
            ImageOutcome::Failed(_) => {
                self.start_tag("span")?;
                self.attribute("class", "image-placeholder")?;
                self.finish_tag()?;
                let label = image.alt.as_deref().unwrap_or(image.source.as_str());
                self.text(&format!("[Image unavailable: {label}]"))?;
                return self.end_tag("span");
            }
        };

        self.start_tag("img")?;
        self.attribute("src", &src)?;
        self.attribute("alt", image.alt.as_deref().unwrap_or_default())?;
        if let Some(title) = &image.title {
            self.attribute("title", title)?;
        }
        if let Some(width) = image.width {
            self.attribute("width", &width.to_string())?;
        }
        if let Some(height) = image.height {
            self.attribute("height", &height.to_string())?;
        }
        self.finish_self_closing_tag()
    }

    /// Writes a text run, wrapped in one element per mark. The first mark
    /// is the outermost.
    fn write_text(&mut self, text: &str, node: &Node) -> Result<()> {
        let mut closing = Vec::with_capacity(node.marks.len());
        for mark in &node.marks {
            let tag = match mark {
                Mark::Link { href } => {
                    self.start_tag("a")?;
                    self.attribute("href", href)?;
                    "a"
                }
                Mark::Color(color) => {
                    self.start_tag("span")?;
                    self.attribute("style", &format!("color: {color}"))?;
                    "span"
                }
                Mark::FontSize(size) => {
                    self.start_tag("span")?;
                    let unit = if size.bytes().all(|b| b.is_ascii_digit()) {
                        "px"
                    } else {
                        ""
                    };
                    self.attribute("style", &format!("font-size: {size}{unit}"))?;
                    "span"
                }
                Mark::Highlight(color) => {
                    self.start_tag("mark")?;
                    if let Some(color) = color {
                        self.attribute("style", &format!("background-color: {color}"))?;
                    }
                    "mark"
                }
                Mark::Bold => {
                    self.start_tag("strong")?;
                    "strong"
                }
                Mark::Italic => {
                    self.start_tag("em")?;
                    "em"
                }
                Mark::Underline => {
                    self.start_tag("u")?;
                    "u"
                }
                Mark::Strike => {
                    self.start_tag("s")?;
                    "s"
                }
                Mark::Code => {
                    self.start_tag("code")?;
                    "code"
                }
                Mark::Unknown(_) => continue,
            };
            self.finish_tag()?;
            closing.push(tag);
        }

        self.text(text)?;
        for tag in closing.into_iter().rev() {
            self.end_tag(tag)?;
        }
        Ok(())
    }
}
