//! DOCX document writer implementation

use docx_rs::*;
use ecow::{eco_format, EcoString};
use log::debug;
use std::io::Cursor;

use crate::common::FormatWriter;
use crate::diagnostics::{Warning, WarningCollector};
use crate::model::{Align, ImageRef, ListKind, Mark, Marks, Node, NodeKind};
use crate::resolver::{ImageOutcome, ImageSource};
use crate::{Error, Result};

use super::image_processor::DocxImageProcessor;
use super::numbering::{list_indent, DocxNumbering, MAX_LIST_LEVEL};
use super::styles::DocxStyles;

/// Tables nested deeper than this are flattened into paragraphs.
pub const MAX_TABLE_DEPTH: usize = 3;
/// Width in twips shared by columns without a known width.
const TABLE_WIDTH: usize = 9000;
const TWIPS_PER_PX: usize = 15;

/// A rendered body element, before it lands in the document or a cell.
enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// Rendered image content: the picture, or the text shown in its place.
enum Embedded {
    Pic(Pic),
    Placeholder(String),
}

/// DOCX writer that generates DOCX directly from the document tree
pub struct DocxWriter {
    styles: DocxStyles,
    numbering: DocxNumbering,
    image_processor: DocxImageProcessor,
    images: ImageSource,
    warnings: WarningCollector,
    list_depth: usize,
    table_depth: usize,
    quote_depth: usize,
}

impl Default for DocxWriter {
    fn default() -> Self {
        Self::new(ImageSource::disabled(), WarningCollector::new())
    }
}

impl DocxWriter {
    /// Creates a writer embedding images from `images`.
    pub fn new(images: ImageSource, warnings: WarningCollector) -> Self {
        Self {
            styles: DocxStyles::new(),
            numbering: DocxNumbering::new(),
            image_processor: DocxImageProcessor::new(),
            images,
            warnings,
            list_depth: 0,
            table_depth: 0,
            quote_depth: 0,
        }
    }

    fn warn(&self, subject: impl Into<EcoString>, message: impl Into<EcoString>) {
        self.warnings.push(Warning::new(subject, message));
    }

    /// Builds the document without packing it.
    pub fn render(&mut self, document: &Node) -> Result<Docx> {
        self.numbering = DocxNumbering::new();
        self.list_depth = 0;
        self.table_depth = 0;
        self.quote_depth = 0;

        let mut docx = Docx::new();
        docx = self.styles.initialize_styles(docx);

        let mut blocks = Vec::new();
        match document.kind {
            NodeKind::Document => self.render_blocks(&document.children, &mut blocks)?,
            _ => self.render_blocks(std::slice::from_ref(document), &mut blocks)?,
        }

        for block in blocks {
            docx = match block {
                Block::Paragraph(para) => docx.add_paragraph(para),
                Block::Table(table) => docx.add_table(table),
            };
        }

        docx = self.numbering.initialize_numbering(docx);
        Ok(docx)
    }

    /// Generate DOCX document
    pub fn generate_docx(&mut self, document: &Node) -> Result<Vec<u8>> {
        let docx = self.render(document)?;

        let docx_built = docx.build();
        let mut buffer = Vec::new();
        docx_built
            .pack(&mut Cursor::new(&mut buffer))
            .map_err(|e| format!("Failed to pack DOCX: {e}"))?;

        Ok(buffer)
    }

    /// Renders sibling blocks. Consecutive sibling lists of the same kind
    /// share one numbering instance.
    fn render_blocks(&mut self, nodes: &[Node], sink: &mut Vec<Block>) -> Result<()> {
        let mut prev_list = None;
        for node in nodes {
            prev_list = match node.list_kind() {
                Some(kind) => Some(self.render_list(node, kind, prev_list, sink)?),
                None => {
                    self.render_block(node, sink)?;
                    None
                }
            };
        }
        Ok(())
    }

    fn render_block(&mut self, node: &Node, sink: &mut Vec<Block>) -> Result<()> {
        match &node.kind {
            NodeKind::Document => return Err(Error::render("nested document")),
            NodeKind::TableRow => return Err(Error::render("table row outside of a table")),
            NodeKind::TableCell { .. } => {
                return Err(Error::render("table cell outside of a table row"));
            }
            NodeKind::ListItem | NodeKind::CheckItem { .. } => {
                return Err(Error::render("list item outside of a list"));
            }
            NodeKind::BulletList | NodeKind::OrderedList { .. } | NodeKind::CheckList => {
                self.render_blocks(std::slice::from_ref(node), sink)?;
            }
            NodeKind::Paragraph | NodeKind::Heading { .. } => {
                let mut para = self.build_textblock(node, Paragraph::new())?;
                let indent = node.indent();
                if indent > 0 {
                    para = para.indent(Some(720 * indent as i32), None, None, None);
                }
                sink.push(Block::Paragraph(para));
            }
            NodeKind::Blockquote => {
                self.quote_depth += 1;
                let result = self.render_blocks(&node.children, sink);
                self.quote_depth -= 1;
                result?;
            }
            NodeKind::CodeBlock { .. } => {
                let mut code = String::new();
                for child in &node.children {
                    match &child.kind {
                        NodeKind::LineBreak => code.push('\n'),
                        _ => code.push_str(&child.plain_text()),
                    }
                }
                for line in code.split('\n') {
                    let para = Paragraph::new()
                        .style("CodeBlock")
                        .add_run(Run::new().add_text(line));
                    sink.push(Block::Paragraph(para));
                }
            }
            NodeKind::HorizontalRule => {
                let para = Paragraph::new()
                    .style("HorizontalRule")
                    .add_run(Run::new().add_text("─".repeat(40)));
                sink.push(Block::Paragraph(para));
            }
            NodeKind::Table { column_widths } => {
                self.render_table(node, column_widths, sink)?;
            }
            NodeKind::Image(image) => {
                let para = match self.embed_image(image) {
                    Embedded::Pic(pic) => Paragraph::new().add_run(Run::new().add_image(pic)),
                    Embedded::Placeholder(text) => Paragraph::new()
                        .style("ImagePlaceholder")
                        .add_run(Run::new().add_text(text)),
                };
                sink.push(Block::Paragraph(para));
            }
            NodeKind::Text(_) | NodeKind::LineBreak => {
                let para = self.add_inlines(Paragraph::new(), std::slice::from_ref(node))?;
                sink.push(Block::Paragraph(para));
            }
            NodeKind::Passthrough { type_name } => {
                debug!("rendering children of unknown node `{type_name}`");
                if !node.children.is_empty() && node.children.iter().all(Node::is_inline) {
                    let para = self.add_inlines(Paragraph::new(), &node.children)?;
                    sink.push(Block::Paragraph(para));
                } else {
                    self.render_blocks(&node.children, sink)?;
                }
            }
        }
        Ok(())
    }

    /// Fills a paragraph with the style and inline content of a text block.
    fn build_textblock(&mut self, node: &Node, mut para: Paragraph) -> Result<Paragraph> {
        match node.kind {
            NodeKind::Heading { level } => para = para.style(DocxStyles::heading(level)),
            NodeKind::Paragraph if self.quote_depth > 0 => para = para.style("Blockquote"),
            _ => {}
        }
        if let Some(align) = node.align() {
            para = para.align(match align {
                Align::Left => AlignmentType::Left,
                Align::Center => AlignmentType::Center,
                Align::Right => AlignmentType::Right,
                Align::Justify => AlignmentType::Both,
            });
        }
        self.add_inlines(para, &node.children)
    }

    /// Appends inline content to a paragraph. Adjacent runs linking to the
    /// same target share one hyperlink.
    fn add_inlines(&mut self, mut para: Paragraph, nodes: &[Node]) -> Result<Paragraph> {
        let mut link: Option<(EcoString, Hyperlink)> = None;

        for node in nodes {
            let run = match &node.kind {
                NodeKind::Text(text) => self.build_run(text, &node.marks),
                NodeKind::LineBreak => Run::new().add_break(BreakType::TextWrapping),
                NodeKind::Image(image) => match self.embed_image(image) {
                    Embedded::Pic(pic) => Run::new().add_image(pic),
                    Embedded::Placeholder(text) => {
                        Run::new().add_text(text).italic().color("808080")
                    }
                },
                NodeKind::Passthrough { .. } => {
                    if let Some((_, hyperlink)) = link.take() {
                        para = para.add_hyperlink(hyperlink);
                    }
                    para = self.add_inlines(para, &node.children)?;
                    continue;
                }
                _ => {
                    debug!("unhandled inline node in DOCX export: {:?}", node.kind);
                    continue;
                }
            };

            match node.marks.link() {
                Some(href) => {
                    link = Some(match link.take() {
                        Some((current, hyperlink)) if current == *href => {
                            (current, hyperlink.add_run(run))
                        }
                        other => {
                            if let Some((_, hyperlink)) = other {
                                para = para.add_hyperlink(hyperlink);
                            }
                            let hyperlink = Hyperlink::new(href.as_str(), HyperlinkType::External)
                                .add_run(run);
                            (href.clone(), hyperlink)
                        }
                    });
                }
                None => {
                    if let Some((_, hyperlink)) = link.take() {
                        para = para.add_hyperlink(hyperlink);
                    }
                    para = para.add_run(run);
                }
            }
        }

        if let Some((_, hyperlink)) = link {
            para = para.add_hyperlink(hyperlink);
        }
        Ok(para)
    }

    /// Builds a run carrying the marks of a text node.
    fn build_run(&self, text: &str, marks: &Marks) -> Run {
        let mut run = Run::new().add_text(text);
        for mark in marks {
            run = match mark {
                Mark::Link { .. } => run.style("Hyperlink"),
                Mark::Color(color) => match css_color_to_hex(color) {
                    Some(hex) => run.color(hex),
                    None => run,
                },
                Mark::FontSize(size) => match font_size_half_points(size) {
                    Some(size) => run.size(size),
                    None => run,
                },
                Mark::Highlight(color) => run.highlight(highlight_name(color.as_deref())),
                Mark::Bold => run.bold(),
                Mark::Italic => run.italic(),
                Mark::Underline => run.underline("single"),
                Mark::Strike => run.strike(),
                Mark::Code => run.style("CodeInline"),
                Mark::Unknown(_) => run,
            };
        }
        run
    }

    fn embed_image(&self, image: &ImageRef) -> Embedded {
        let label = image.alt.as_deref().unwrap_or(image.source.as_str());
        match self.images.fetch(image) {
            ImageOutcome::Resolved(resolved) => {
                match self
                    .image_processor
                    .build_pic(&resolved.data, (image.width, image.height))
                {
                    Ok(pic) => Embedded::Pic(pic),
                    Err(err) => {
                        self.warn(
                            image.source.clone(),
                            eco_format!("cannot embed image, {}", err.message()),
                        );
                        Embedded::Placeholder(format!("[Image unavailable: {label}]"))
                    }
                }
            }
            ImageOutcome::NotExported => Embedded::Placeholder(format!("[Image: {label}]")),
            ImageOutcome::Failed(_) => {
                Embedded::Placeholder(format!("[Image unavailable: {label}]"))
            }
        }
    }

    /// Renders a list. Continues the numbering of `prev` when it is a list
    /// of the same kind. Returns the kind and numbering id used.
    fn render_list(
        &mut self,
        node: &Node,
        kind: ListKind,
        prev: Option<(ListKind, usize)>,
        sink: &mut Vec<Block>,
    ) -> Result<(ListKind, usize)> {
        let level = self.list_depth.min(MAX_LIST_LEVEL);
        let num_id = match (kind, prev) {
            (ListKind::Check, _) => 0,
            (kind, Some((prev_kind, num_id))) if kind == prev_kind => num_id,
            (ListKind::Ordered, _) => {
                let start = match node.kind {
                    NodeKind::OrderedList { start } => start.max(1) as usize,
                    _ => 1,
                };
                self.numbering.create_ordered_numbering(start)
            }
            (ListKind::Bullet, _) => self.numbering.create_unordered_numbering(),
        };

        self.list_depth += 1;
        let result = node
            .children
            .iter()
            .try_for_each(|item| self.render_list_item(item, kind, num_id, level, sink));
        self.list_depth -= 1;
        result?;

        Ok((kind, num_id))
    }

    fn render_list_item(
        &mut self,
        item: &Node,
        kind: ListKind,
        num_id: usize,
        level: usize,
        sink: &mut Vec<Block>,
    ) -> Result<()> {
        let marker = match (&item.kind, kind) {
            (NodeKind::CheckItem { checked }, ListKind::Check) => {
                let box_char = if *checked { "☒ " } else { "☐ " };
                Paragraph::new()
                    .indent(Some(list_indent(level)), None, None, None)
                    .add_run(Run::new().add_text(box_char))
            }
            (NodeKind::ListItem, ListKind::Bullet | ListKind::Ordered) => Paragraph::new()
                .numbering(NumberingId::new(num_id), IndentLevel::new(level)),
            _ => return Err(Error::render("list child is not a matching list item")),
        };

        let item_start = sink.len();
        let mut marker = Some(marker);
        let mut prev_list = None;

        for child in &item.children {
            if let Some(child_kind) = child.list_kind() {
                prev_list = Some(self.render_list(child, child_kind, prev_list, sink)?);
                continue;
            }
            prev_list = None;

            match (&child.kind, marker.take()) {
                (NodeKind::Paragraph | NodeKind::Heading { .. }, Some(para)) => {
                    let para = self.build_textblock(child, para)?;
                    sink.push(Block::Paragraph(para));
                }
                (NodeKind::Paragraph | NodeKind::Heading { .. }, None) => {
                    let para = Paragraph::new().indent(Some(list_indent(level)), None, None, None);
                    let para = self.build_textblock(child, para)?;
                    sink.push(Block::Paragraph(para));
                }
                (_, taken) => {
                    if let Some(para) = taken {
                        sink.push(Block::Paragraph(para));
                    }
                    self.render_block(child, sink)?;
                }
            }
        }

        // Items starting with a nested list still show their marker.
        if let Some(para) = marker {
            sink.insert(item_start, Block::Paragraph(para));
        }

        Ok(())
    }

    /// Process table
    fn render_table(
        &mut self,
        node: &Node,
        column_widths: &[Option<u32>],
        sink: &mut Vec<Block>,
    ) -> Result<()> {
        if self.table_depth >= MAX_TABLE_DEPTH {
            self.warn(
                "table",
                eco_format!("table nested deeper than {MAX_TABLE_DEPTH} levels flattened"),
            );
            for row in &node.children {
                for cell in &row.children {
                    self.render_blocks(&cell.children, sink)?;
                }
            }
            return Ok(());
        }

        self.table_depth += 1;
        let result = self.build_table(node, column_widths);
        self.table_depth -= 1;

        if let Some(table) = result? {
            sink.push(Block::Table(table));
        }
        Ok(())
    }

    fn build_table(&mut self, node: &Node, column_widths: &[Option<u32>]) -> Result<Option<Table>> {
        let columns = column_widths.len();
        if node.children.is_empty() || columns == 0 {
            return Ok(None);
        }

        let grid = grid_widths(column_widths);
        let mut vmerge = vec![0usize; columns];
        let mut rows = Vec::with_capacity(node.children.len());

        for row in &node.children {
            if !matches!(row.kind, NodeKind::TableRow) {
                return Err(Error::render("table child is not a table row"));
            }

            let mut cells = Vec::new();
            let mut col_index = 0;
            let mut cell_iter = row.children.iter();

            while col_index < columns {
                if vmerge[col_index] > 0 {
                    cells.push(
                        TableCell::new()
                            .width(grid[col_index], WidthType::Dxa)
                            .vertical_merge(VMergeType::Continue)
                            .add_paragraph(Paragraph::new()),
                    );
                    vmerge[col_index] -= 1;
                    col_index += 1;
                    continue;
                }

                let Some(cell) = cell_iter.next() else {
                    cells.push(
                        TableCell::new()
                            .width(grid[col_index], WidthType::Dxa)
                            .add_paragraph(Paragraph::new()),
                    );
                    col_index += 1;
                    continue;
                };

                let NodeKind::TableCell {
                    colspan, rowspan, ..
                } = cell.kind
                else {
                    return Err(Error::render("table row child is not a table cell"));
                };
                let colspan = colspan.clamp(1, columns - col_index);
                let width = grid[col_index..col_index + colspan].iter().sum::<usize>();

                let mut table_cell = self.build_table_cell(cell)?.width(width, WidthType::Dxa);
                if colspan > 1 {
                    table_cell = table_cell.grid_span(colspan);
                }
                if rowspan > 1 {
                    table_cell = table_cell.vertical_merge(VMergeType::Restart);
                    for slot in &mut vmerge[col_index..col_index + colspan] {
                        *slot = (*slot).max(rowspan - 1);
                    }
                }
                cells.push(table_cell);
                col_index += colspan;
            }

            if cell_iter.next().is_some() {
                debug!("dropping table cells beyond {columns} columns");
            }
            rows.push(TableRow::new(cells));
        }

        Ok(Some(Table::new(rows).set_grid(grid).style("TableGrid")))
    }

    fn build_table_cell(&mut self, cell: &Node) -> Result<TableCell> {
        let mut blocks = Vec::new();
        self.render_blocks(&cell.children, &mut blocks)?;

        let mut table_cell = TableCell::new();
        // A cell must end with a paragraph.
        if !matches!(blocks.last(), Some(Block::Paragraph(_))) {
            blocks.push(Block::Paragraph(Paragraph::new()));
        }
        for block in blocks {
            table_cell = match block {
                Block::Paragraph(para) => table_cell.add_paragraph(para),
                Block::Table(table) => table_cell.add_table(table),
            };
        }
        Ok(table_cell)
    }
}

impl FormatWriter for DocxWriter {
    fn write_vec(&mut self, document: &Node) -> Result<Vec<u8>> {
        self.generate_docx(document)
    }

    fn write_eco(&mut self, _document: &Node, _output: &mut EcoString) -> Result<()> {
        Err("DOCX format does not support EcoString output".into())
    }
}

/// Grid column widths in twips. Known pixel widths are converted, the
/// others share what is left of the default table width.
fn grid_widths(column_widths: &[Option<u32>]) -> Vec<usize> {
    let known: usize = column_widths
        .iter()
        .flatten()
        .map(|px| *px as usize * TWIPS_PER_PX)
        .sum();
    let unknown = column_widths.iter().filter(|w| w.is_none()).count();
    let share = if unknown == 0 {
        0
    } else {
        (TABLE_WIDTH.saturating_sub(known) / unknown).max(TABLE_WIDTH / 10)
    };

    column_widths
        .iter()
        .map(|w| w.map_or(share, |px| px as usize * TWIPS_PER_PX))
        .collect()
}

/// Converts a CSS color to the `RRGGBB` form DOCX expects.
pub(crate) fn css_color_to_hex(color: &str) -> Option<String> {
    let color = color.trim();
    if let Some(hex) = color.strip_prefix('#') {
        return match hex.len() {
            6 if hex.bytes().all(|b| b.is_ascii_hexdigit()) => Some(hex.to_ascii_uppercase()),
            3 if hex.bytes().all(|b| b.is_ascii_hexdigit()) => Some(
                hex.chars()
                    .flat_map(|c| [c, c])
                    .collect::<String>()
                    .to_ascii_uppercase(),
            ),
            _ => None,
        };
    }

    let lower = color.to_ascii_lowercase();
    if let Some(args) = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let channels: Vec<u8> = args
            .split(',')
            .take(3)
            .map(|c| c.trim().parse::<f64>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8))
            .collect::<Option<_>>()?;
        if channels.len() != 3 {
            return None;
        }
        return Some(hex::encode_upper(channels));
    }

    let named = match lower.as_str() {
        "black" => "000000",
        "white" => "FFFFFF",
        "red" => "FF0000",
        "green" => "008000",
        "blue" => "0000FF",
        "yellow" => "FFFF00",
        "orange" => "FFA500",
        "purple" => "800080",
        "gray" | "grey" => "808080",
        _ => return None,
    };
    Some(named.to_owned())
}

/// Converts a CSS font size to half-points. Bare numbers are pixels.
pub(crate) fn font_size_half_points(size: &str) -> Option<usize> {
    let size = size.trim().to_ascii_lowercase();
    let (value, points_per_unit) = if let Some(pt) = size.strip_suffix("pt") {
        (pt, 1.0)
    } else if let Some(px) = size.strip_suffix("px") {
        (px, 0.75)
    } else {
        (size.as_str(), 0.75)
    };
    let value: f64 = value.trim().parse().ok()?;
    if value <= 0.0 {
        return None;
    }
    Some((value * points_per_unit * 2.0).round() as usize)
}

/// Maps a highlight color onto the named highlight colors of DOCX,
/// defaulting to yellow.
pub(crate) fn highlight_name(color: Option<&str>) -> &'static str {
    const NAMES: [&str; 16] = [
        "yellow",
        "green",
        "cyan",
        "magenta",
        "blue",
        "red",
        "darkBlue",
        "darkCyan",
        "darkGreen",
        "darkMagenta",
        "darkRed",
        "darkYellow",
        "darkGray",
        "lightGray",
        "black",
        "white",
    ];
    color
        .map(str::trim)
        .and_then(|c| NAMES.iter().find(|name| name.eq_ignore_ascii_case(c)))
        .copied()
        .unwrap_or("yellow")
}
