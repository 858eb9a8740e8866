//! BoxNote parser core, containing the main structure and general node
//! conversion logic.

use ecow::{eco_format, EcoString};
use log::debug;
use serde_json::{Map, Value};

use crate::diagnostics::{Warning, WarningCollector};
use crate::model::{Attrs, ImageRef, Marks, Node, NodeKind};
use crate::{Error, Result};

use super::list::ListParser;
use super::marks::convert_marks;
use super::raw::{attr_str, attr_u64, RawNode};
use super::table::TableParser;

/// Base URL for legacy `box_image` nodes, which only carry a file id.
const BOX_FILE_URL: &str = "https://app.box.com/file/";

/// BoxNote JSON to document model parser.
pub struct BoxNoteParser {
    pub(crate) warnings: WarningCollector,
}

impl BoxNoteParser {
    /// Creates a parser reporting into the given collector.
    pub fn new(warnings: WarningCollector) -> Self {
        Self { warnings }
    }

    /// Parses a BoxNote document into a normalized tree rooted at a
    /// [`NodeKind::Document`].
    pub fn parse(&self, source: &str) -> Result<Node> {
        let value: Value = serde_json::from_str(source)?;
        let Value::Object(mut root) = value else {
            return Err(Error::parse("root must be a JSON object"));
        };

        let doc = match root.remove("doc") {
            Some(doc) => doc,
            None => Value::Object(root),
        };
        let raw: RawNode = serde_json::from_value(doc)
            .map_err(|e| Error::parse(format!("invalid node tree: {e}")))?;

        if raw.ty != "doc" {
            return Err(Error::parse(if raw.ty.is_empty() {
                "missing document root".to_owned()
            } else {
                format!("missing document root, found node of type `{}`", raw.ty)
            }));
        }

        Ok(Node {
            kind: NodeKind::Document,
            attrs: convert_attrs(&raw.attrs),
            marks: Marks::new(),
            children: self.convert_blocks(&raw.content),
        })
    }

    pub(crate) fn warn(&self, subject: impl Into<EcoString>, message: impl Into<EcoString>) {
        self.warnings.push(Warning::new(subject, message));
    }

    /// Converts the children of a block container. Runs of bare inline
    /// nodes are wrapped into paragraphs.
    pub(crate) fn convert_blocks(&self, content: &[RawNode]) -> Vec<Node> {
        let mut blocks = Vec::new();
        let mut inline_buffer: Vec<Node> = Vec::new();

        for raw in content {
            for node in self.convert_node(raw) {
                if matches!(node.kind, NodeKind::Text(_) | NodeKind::LineBreak) {
                    inline_buffer.push(node);
                    continue;
                }
                Self::flush_inline_buffer(&mut inline_buffer, &mut blocks);
                blocks.push(node);
            }
        }
        Self::flush_inline_buffer(&mut inline_buffer, &mut blocks);

        blocks
    }

    fn flush_inline_buffer(buffer: &mut Vec<Node>, blocks: &mut Vec<Node>) {
        if !buffer.is_empty() {
            blocks.push(Node::with_children(
                NodeKind::Paragraph,
                std::mem::take(buffer),
            ));
        }
    }

    /// Converts one raw node. May yield several nodes when the input has to
    /// be restructured, or none when it carries nothing.
    pub(crate) fn convert_node(&self, raw: &RawNode) -> Vec<Node> {
        if !raw.marks.is_empty() && raw.ty != "text" {
            debug!("dropping marks on non-text node `{}`", raw.ty);
        }

        match raw.ty.as_str() {
            "doc" => {
                self.warn("doc", "nested document flattened into its parent");
                self.convert_blocks(&raw.content)
            }
            "paragraph" => self.convert_textblock(raw, NodeKind::Paragraph),
            "heading" => {
                let level = attr_u64(&raw.attrs, "level").unwrap_or(1).clamp(1, 6) as u8;
                self.convert_textblock(raw, NodeKind::Heading { level })
            }
            "code_block" | "codeBlock" => {
                let language = attr_str(&raw.attrs, "language").map(EcoString::from);
                self.convert_textblock(raw, NodeKind::CodeBlock { language })
            }
            "bullet_list" | "bulletList" => {
                vec![ListParser::convert_list(self, raw, NodeKind::BulletList)]
            }
            "ordered_list" | "orderedList" => {
                let start = attr_u64(&raw.attrs, "order")
                    .or_else(|| attr_u64(&raw.attrs, "start"))
                    .unwrap_or(1)
                    .min(u32::MAX as u64) as u32;
                vec![ListParser::convert_list(self, raw, NodeKind::OrderedList { start })]
            }
            "check_list" | "checkList" => {
                vec![ListParser::convert_list(self, raw, NodeKind::CheckList)]
            }
            "list_item" | "listItem" | "check_list_item" | "checkItem" => {
                vec![ListParser::wrap_orphan_item(self, raw)]
            }
            "table" => vec![TableParser::convert_table(self, raw)],
            "table_row" | "tableRow" | "table_cell" | "tableCell" | "table_header"
            | "tableHeader" => vec![TableParser::wrap_orphan(self, raw)],
            "blockquote" => vec![self.convert_container(raw, NodeKind::Blockquote)],
            "horizontal_rule" | "horizontalRule" => {
                vec![self.leaf(raw, NodeKind::HorizontalRule)]
            }
            "hard_break" | "hardBreak" => vec![self.leaf(raw, NodeKind::LineBreak)],
            "image" | "box_image" => vec![self.convert_image(raw)],
            "text" => self.convert_text(raw).into_iter().collect(),
            "" => {
                self.warn("node", "node without a type ignored");
                Vec::new()
            }
            other => {
                debug!("passing through unknown node type `{other}`");
                let kind = NodeKind::Passthrough {
                    type_name: other.into(),
                };
                let children = raw
                    .content
                    .iter()
                    .flat_map(|child| self.convert_node(child))
                    .collect();
                vec![Node {
                    kind,
                    attrs: convert_attrs(&raw.attrs),
                    marks: Marks::new(),
                    children,
                }]
            }
        }
    }

    fn leaf(&self, raw: &RawNode, kind: NodeKind) -> Node {
        Node {
            attrs: convert_attrs(&raw.attrs),
            ..Node::new(kind)
        }
    }

    pub(crate) fn convert_container(&self, raw: &RawNode, kind: NodeKind) -> Node {
        Node {
            kind,
            attrs: convert_attrs(&raw.attrs),
            marks: Marks::new(),
            children: self.convert_blocks(&raw.content),
        }
    }

    /// Converts a node that may only hold inline content. Block children are
    /// hoisted out, splitting the text block around them.
    fn convert_textblock(&self, raw: &RawNode, kind: NodeKind) -> Vec<Node> {
        let attrs = convert_attrs(&raw.attrs);
        let children = raw.content.iter().flat_map(|child| self.convert_node(child));

        let mut out = Vec::new();
        let mut current: Vec<Node> = Vec::new();
        let mut split = false;
        for child in children {
            if child.is_inline() {
                current.push(child);
                continue;
            }
            split = true;
            if !current.is_empty() {
                out.push(Node {
                    kind: kind.clone(),
                    attrs: attrs.clone(),
                    marks: Marks::new(),
                    children: std::mem::take(&mut current),
                });
            }
            out.push(child);
        }

        if split {
            self.warn(
                raw.ty.as_str(),
                "block content inside a text block was moved out of it",
            );
            if !current.is_empty() {
                out.push(Node {
                    kind,
                    attrs,
                    marks: Marks::new(),
                    children: current,
                });
            }
        } else {
            out.push(Node {
                kind,
                attrs,
                marks: Marks::new(),
                children: current,
            });
        }

        out
    }

    fn convert_text(&self, raw: &RawNode) -> Option<Node> {
        if !raw.content.is_empty() {
            self.warn("text", "children of a text node ignored");
        }
        let text = raw.text.as_deref().filter(|t| !t.is_empty())?;
        Some(Node::text_with_marks(text, convert_marks(&raw.marks)))
    }

    fn convert_image(&self, raw: &RawNode) -> Node {
        let source = if raw.ty == "box_image" {
            attr_str(&raw.attrs, "file_id")
                .map(|id| eco_format!("{BOX_FILE_URL}{id}"))
                .or_else(|| attr_u64(&raw.attrs, "file_id").map(|id| eco_format!("{BOX_FILE_URL}{id}")))
        } else {
            ["src", "boxSharedLink", "url"]
                .iter()
                .find_map(|key| attr_str(&raw.attrs, key))
                .map(EcoString::from)
        };

        let Some(source) = source else {
            self.warn(raw.ty.as_str(), "image without a source kept as passthrough");
            return Node {
                kind: NodeKind::Passthrough {
                    type_name: raw.ty.as_str().into(),
                },
                attrs: convert_attrs(&raw.attrs),
                marks: Marks::new(),
                children: Vec::new(),
            };
        };

        let image = ImageRef {
            source,
            alt: attr_str(&raw.attrs, "alt").map(EcoString::from),
            title: attr_str(&raw.attrs, "title").map(EcoString::from),
            width: attr_u64(&raw.attrs, "width").map(|w| w.min(u32::MAX as u64) as u32),
            height: attr_u64(&raw.attrs, "height").map(|h| h.min(u32::MAX as u64) as u32),
        };

        Node {
            attrs: convert_attrs(&raw.attrs),
            ..Node::new(NodeKind::Image(image))
        }
    }
}

pub(crate) fn convert_attrs(attrs: &Map<String, Value>) -> Attrs {
    attrs
        .iter()
        .map(|(k, v)| (EcoString::from(k.as_str()), v.clone()))
        .collect()
}
