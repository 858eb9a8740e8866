//! List normalization

use crate::model::{Marks, Node, NodeKind};

use super::core::{convert_attrs, BoxNoteParser};
use super::raw::{attr_bool, RawNode};

/// List parser
pub(super) struct ListParser;

impl ListParser {
    /// Converts a list node. Every child of the result is an item matching
    /// the list flavor: [`NodeKind::CheckItem`] for check lists,
    /// [`NodeKind::ListItem`] otherwise.
    pub fn convert_list(parser: &BoxNoteParser, raw: &RawNode, kind: NodeKind) -> Node {
        let check = matches!(kind, NodeKind::CheckList);
        let mut items: Vec<Node> = Vec::with_capacity(raw.content.len());

        for child in &raw.content {
            if is_item(child) {
                items.push(Self::convert_item(parser, child, check));
                continue;
            }

            let blocks = parser.convert_blocks(std::slice::from_ref(child));
            if blocks.is_empty() {
                continue;
            }

            // A list directly inside a list belongs to the preceding item.
            let nested_list = blocks.iter().all(|b| b.list_kind().is_some());
            match items.last_mut() {
                Some(prev) if nested_list => prev.children.extend(blocks),
                _ => {
                    parser.warn(
                        raw.ty.as_str(),
                        format!("`{}` inside a list wrapped into a list item", child.ty),
                    );
                    items.push(Node::with_children(item_kind(check, false), blocks));
                }
            }
        }

        Node {
            kind,
            attrs: convert_attrs(&raw.attrs),
            marks: Marks::new(),
            children: items,
        }
    }

    /// Wraps a list item met outside of any list into a single-item list.
    pub fn wrap_orphan_item(parser: &BoxNoteParser, raw: &RawNode) -> Node {
        let check = is_check_item(raw);
        parser.warn(
            raw.ty.as_str(),
            "list item outside of a list wrapped into a list",
        );
        let kind = if check {
            NodeKind::CheckList
        } else {
            NodeKind::BulletList
        };
        Node::with_children(kind, vec![Self::convert_item(parser, raw, check)])
    }

    fn convert_item(parser: &BoxNoteParser, raw: &RawNode, check: bool) -> Node {
        let checked = is_check_item(raw) && attr_bool(&raw.attrs, "checked");
        Node {
            kind: item_kind(check, checked),
            attrs: convert_attrs(&raw.attrs),
            marks: Marks::new(),
            children: parser.convert_blocks(&raw.content),
        }
    }
}

fn item_kind(check: bool, checked: bool) -> NodeKind {
    if check {
        NodeKind::CheckItem { checked }
    } else {
        NodeKind::ListItem
    }
}

fn is_item(raw: &RawNode) -> bool {
    matches!(raw.ty.as_str(), "list_item" | "listItem") || is_check_item(raw)
}

fn is_check_item(raw: &RawNode) -> bool {
    matches!(raw.ty.as_str(), "check_list_item" | "checkItem")
}
