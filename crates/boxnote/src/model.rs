//! Normalized document model for a parsed BoxNote.
//!
//! The tree is built once by [`crate::parser`] and consumed read-only by the
//! writers. Typed, kind-specific properties live in [`NodeKind`]; the raw
//! `attrs` object of the source node is kept in [`Node::attrs`] so that
//! renderers can read presentation hints (alignment, indent) and unknown
//! nodes survive untouched.

use std::collections::BTreeMap;

use ecow::EcoString;
use serde_json::Value;

/// Raw attributes of a node, in key order.
pub type Attrs = BTreeMap<EcoString, Value>;

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// What the node is.
    pub kind: NodeKind,
    /// The raw `attrs` of the source node.
    pub attrs: Attrs,
    /// Inline styles, only set on text nodes.
    pub marks: Marks,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

/// The kind of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The root of a document.
    Document,
    /// A paragraph of inline content.
    Paragraph,
    /// A heading of inline content.
    Heading {
        /// Level between 1 and 6.
        level: u8,
    },
    /// A list of [`NodeKind::ListItem`]s with bullets.
    BulletList,
    /// A numbered list of [`NodeKind::ListItem`]s.
    OrderedList {
        /// Number of the first item.
        start: u32,
    },
    /// An item of a bullet or ordered list, holding blocks.
    ListItem,
    /// A list of [`NodeKind::CheckItem`]s.
    CheckList,
    /// An item of a check list, holding blocks.
    CheckItem {
        /// Whether the box is ticked.
        checked: bool,
    },
    /// A table whose rows all cover the same number of grid columns.
    Table {
        /// Column widths in pixels, one entry per grid column.
        column_widths: Vec<Option<u32>>,
    },
    /// A row of [`NodeKind::TableCell`]s.
    TableRow,
    /// A table cell, holding blocks.
    TableCell {
        /// Grid columns taken by the cell, at least 1.
        colspan: usize,
        /// Rows taken by the cell, at least 1.
        rowspan: usize,
        /// Widths in pixels of the columns this cell spans.
        colwidth: Vec<u32>,
    },
    /// An image, inline or on its own.
    Image(ImageRef),
    /// A run of text carrying [`Node::marks`].
    Text(EcoString),
    /// A hard line break.
    LineBreak,
    /// Preformatted code, holding text and line breaks.
    CodeBlock {
        /// The language tag, if any.
        language: Option<EcoString>,
    },
    /// A quotation, holding blocks.
    Blockquote,
    /// A thematic break.
    HorizontalRule,
    /// A node type this crate does not know. Its children are rendered
    /// transparently.
    Passthrough {
        /// The node type of the source node.
        type_name: EcoString,
    },
}

/// Which flavor of list a list node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    /// [`NodeKind::BulletList`]
    Bullet,
    /// [`NodeKind::OrderedList`]
    Ordered,
    /// [`NodeKind::CheckList`]
    Check,
}

/// A lazily resolved reference to an embedded image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    /// An URL, a Box file link, a `data:` URL or a local path.
    pub source: EcoString,
    /// Text shown in place of the image.
    pub alt: Option<EcoString>,
    /// Tooltip of the image.
    pub title: Option<EcoString>,
    /// Display width in pixels.
    pub width: Option<u32>,
    /// Display height in pixels.
    pub height: Option<u32>,
}

impl ImageRef {
    /// A reference with no alt text, title or size.
    pub fn new(source: impl Into<EcoString>) -> Self {
        Self {
            source: source.into(),
            alt: None,
            title: None,
            width: None,
            height: None,
        }
    }

    /// Whether the image bytes are embedded in the reference itself.
    pub fn is_data_url(&self) -> bool {
        self.source.starts_with("data:")
    }
}

/// An inline style annotation of a text node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mark {
    /// A hyperlink.
    Link {
        /// The link target.
        href: EcoString,
    },
    /// Text color, as a CSS color.
    Color(EcoString),
    /// Font size, a CSS length or a bare pixel count.
    FontSize(EcoString),
    /// Background highlight, with an optional CSS color.
    Highlight(Option<EcoString>),
    /// Bold text.
    Bold,
    /// Italic text.
    Italic,
    /// Underlined text.
    Underline,
    /// Strikethrough.
    Strike,
    /// Inline code.
    Code,
    /// A mark type this crate does not know. Renderers ignore it.
    Unknown(EcoString),
}

impl Mark {
    /// The position of the mark in the rendering order. Lower ranks wrap
    /// higher ranks.
    pub fn rank(&self) -> u8 {
        match self {
            Mark::Link { .. } => 0,
            Mark::Color(_) => 1,
            Mark::FontSize(_) => 2,
            Mark::Highlight(_) => 3,
            Mark::Bold => 4,
            Mark::Italic => 5,
            Mark::Underline => 6,
            Mark::Strike => 7,
            Mark::Code => 8,
            Mark::Unknown(_) => 9,
        }
    }

    fn same_kind(&self, other: &Mark) -> bool {
        match (self, other) {
            (Mark::Unknown(a), Mark::Unknown(b)) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

/// A set of marks, kept sorted by [`Mark::rank`].
///
/// Inserting a mark of a kind already present replaces the old one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Marks(Vec<Mark>);

impl Marks {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mark, keeping the set ordered.
    pub fn insert(&mut self, mark: Mark) {
        if let Some(slot) = self.0.iter_mut().find(|m| m.same_kind(&mark)) {
            *slot = mark;
            return;
        }
        let pos = self.0.partition_point(|m| m.rank() <= mark.rank());
        self.0.insert(pos, mark);
    }

    /// The marks, outermost first.
    pub fn iter(&self) -> std::slice::Iter<'_, Mark> {
        self.0.iter()
    }

    /// Whether the set holds no mark.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of marks.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The target of the link mark, if any.
    pub fn link(&self) -> Option<&EcoString> {
        self.0.iter().find_map(|m| match m {
            Mark::Link { href } => Some(href),
            _ => None,
        })
    }
}

impl FromIterator<Mark> for Marks {
    fn from_iter<I: IntoIterator<Item = Mark>>(iter: I) -> Self {
        let mut marks = Marks::new();
        for mark in iter {
            marks.insert(mark);
        }
        marks
    }
}

impl<'a> IntoIterator for &'a Marks {
    type Item = &'a Mark;
    type IntoIter = std::slice::Iter<'a, Mark>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Horizontal alignment of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Align {
    Left,
    Center,
    Right,
    Justify,
}

impl Align {
    /// The value of the CSS `text-align` property.
    pub fn as_css(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
            Align::Justify => "justify",
        }
    }
}

impl Node {
    /// A node without attributes, marks or children.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attrs: Attrs::new(),
            marks: Marks::new(),
            children: Vec::new(),
        }
    }

    /// A node holding the given children.
    pub fn with_children(kind: NodeKind, children: Vec<Node>) -> Self {
        Self {
            children,
            ..Self::new(kind)
        }
    }

    /// An unstyled text node.
    pub fn text(text: impl Into<EcoString>) -> Self {
        Self::new(NodeKind::Text(text.into()))
    }

    /// A text node carrying marks.
    pub fn text_with_marks(text: impl Into<EcoString>, marks: Marks) -> Self {
        Self {
            marks,
            ..Self::text(text)
        }
    }

    /// Whether the node belongs inside a text block.
    pub fn is_inline(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Text(_) | NodeKind::LineBreak | NodeKind::Image(_)
        )
    }

    /// The flavor of a list node, `None` for anything else.
    pub fn list_kind(&self) -> Option<ListKind> {
        match self.kind {
            NodeKind::BulletList => Some(ListKind::Bullet),
            NodeKind::OrderedList { .. } => Some(ListKind::Ordered),
            NodeKind::CheckList => Some(ListKind::Check),
            _ => None,
        }
    }

    /// Paragraph alignment from the `align` or `textAlign` attribute.
    pub fn align(&self) -> Option<Align> {
        let value = self
            .attrs
            .get("align")
            .or_else(|| self.attrs.get("textAlign"))?
            .as_str()?;
        match value.to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Align::Left),
            "center" => Some(Align::Center),
            "right" | "end" => Some(Align::Right),
            "justify" => Some(Align::Justify),
            _ => None,
        }
    }

    /// Indent level from the `indent` attribute, zero when absent.
    pub fn indent(&self) -> u32 {
        match self.attrs.get("indent") {
            Some(Value::Number(n)) => n.as_u64().map_or(0, |n| n.min(u32::MAX as u64) as u32),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    /// Concatenated text of the subtree, line breaks as spaces.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::LineBreak => out.push(' '),
            NodeKind::Image(image) => {
                if let Some(alt) = &image.alt {
                    out.push_str(alt);
                }
            }
            _ => {
                for child in &self.children {
                    child.collect_text(out);
                }
            }
        }
    }
}
