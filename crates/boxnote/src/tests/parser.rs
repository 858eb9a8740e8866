use crate::model::{ListKind, Mark, Node, NodeKind};
use crate::parser::MAX_SPAN;
use crate::tests::*;
use crate::{BoxNoteDocument, ErrorKind};

fn kinds(nodes: &[Node]) -> Vec<&NodeKind> {
    nodes.iter().map(|n| &n.kind).collect()
}

#[test]
fn test_root_with_and_without_envelope() {
    let wrapped = parse(r#"{"type": "paragraph", "content": [{"type": "text", "text": "hi"}]}"#);
    let bare = BoxNoteDocument::parse(
        r#"{"type": "doc", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "hi"}]}]}"#,
    )
    .unwrap();

    assert_eq!(wrapped.root(), bare.root());
    assert_eq!(wrapped.root().kind, NodeKind::Document);
    assert_eq!(wrapped.root().plain_text(), "hi");
}

#[test]
fn test_malformed_input() {
    let err = BoxNoteDocument::parse(r#"{"doc": {"type": "doc", "content": ["#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(err.message().starts_with("malformed JSON"), "{err}");

    let err = BoxNoteDocument::parse("[1, 2]").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert_eq!(err.message(), "root must be a JSON object");

    let err = BoxNoteDocument::parse(r#"{"doc": {"type": "paragraph"}}"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(err.message().starts_with("missing document root"), "{err}");

    let err = BoxNoteDocument::parse(r#"{"version": 1}"#).unwrap_err();
    assert_eq!(err.message(), "missing document root");
}

#[test]
fn test_empty_document() {
    let doc = parse("");
    assert!(doc.root().children.is_empty());
    assert!(doc.warnings().is_empty());
}

#[test]
fn test_heading_level_is_clamped() {
    let doc = parse(
        r#"{"type": "heading", "attrs": {"level": 9}, "content": [{"type": "text", "text": "Deep"}]},
           {"type": "heading", "attrs": {"level": 0}, "content": [{"type": "text", "text": "Top"}]},
           {"type": "heading", "content": [{"type": "text", "text": "Plain"}]}"#,
    );
    assert_eq!(
        kinds(&doc.root().children),
        vec![
            &NodeKind::Heading { level: 6 },
            &NodeKind::Heading { level: 1 },
            &NodeKind::Heading { level: 1 },
        ]
    );
}

#[test]
fn test_bare_inline_content_is_wrapped() {
    let doc = parse(
        r#"{"type": "text", "text": "loose"},
           {"type": "hard_break"},
           {"type": "text", "text": "text"},
           {"type": "horizontal_rule"}"#,
    );
    let children = &doc.root().children;
    assert_eq!(
        kinds(children),
        vec![&NodeKind::Paragraph, &NodeKind::HorizontalRule]
    );
    assert_eq!(children[0].children.len(), 3);
    assert_eq!(children[0].plain_text(), "loose text");
}

#[test]
fn test_empty_text_is_dropped() {
    let doc = parse(
        r#"{"type": "paragraph", "content": [{"type": "text", "text": ""}, {"type": "text", "text": "kept"}]}"#,
    );
    assert_eq!(doc.root().children[0].children, vec![Node::text("kept")]);
}

#[test]
fn test_block_inside_paragraph_is_hoisted() {
    let doc = parse(
        r#"{"type": "paragraph", "content": [
            {"type": "text", "text": "before"},
            {"type": "bullet_list", "content": [
                {"type": "list_item", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "item"}]}]}
            ]},
            {"type": "text", "text": "after"}
        ]}"#,
    );
    assert_eq!(
        kinds(&doc.root().children),
        vec![&NodeKind::Paragraph, &NodeKind::BulletList, &NodeKind::Paragraph]
    );
    assert_eq!(
        messages(&doc),
        vec!["block content inside a text block was moved out of it"]
    );
}

#[test]
fn test_marks_are_deduplicated_and_ordered() {
    let doc = parse(
        r##"{"type": "paragraph", "content": [{"type": "text", "text": "x", "marks": [
            {"type": "em"},
            {"type": "strong"},
            {"type": "font_color", "attrs": {"color": "#ff0000"}},
            {"type": "strong"},
            {"type": "sparkle"},
            {"type": "link", "attrs": {"href": "https://box.com"}}
        ]}]}"##,
    );
    let text = &doc.root().children[0].children[0];
    let marks: Vec<&Mark> = text.marks.iter().collect();
    assert_eq!(
        marks,
        vec![
            &Mark::Link {
                href: "https://box.com".into()
            },
            &Mark::Color("#ff0000".into()),
            &Mark::Bold,
            &Mark::Italic,
            &Mark::Unknown("sparkle".into()),
        ]
    );
}

#[test]
fn test_font_size_mark_accepts_numbers() {
    let doc = parse(
        r#"{"type": "paragraph", "content": [
            {"type": "text", "text": "a", "marks": [{"type": "font_size", "attrs": {"size": 18}}]},
            {"type": "text", "text": "b", "marks": [{"type": "font_size", "attrs": {"size": " 12pt "}}]}
        ]}"#,
    );
    let para = &doc.root().children[0];
    assert!(para.children[0].marks.iter().eq([&Mark::FontSize("18".into())]));
    assert!(para.children[1].marks.iter().eq([&Mark::FontSize("12pt".into())]));
}

#[test]
fn test_unknown_node_passes_through() {
    let doc = parse(
        r#"{"type": "callout", "attrs": {"emoji": "tada"}, "content": [
            {"type": "paragraph", "content": [{"type": "text", "text": "inside"}]}
        ]}"#,
    );
    let callout = &doc.root().children[0];
    assert_eq!(
        callout.kind,
        NodeKind::Passthrough {
            type_name: "callout".into()
        }
    );
    assert_eq!(callout.attrs["emoji"], "tada");
    assert_eq!(callout.plain_text(), "inside");
    assert!(doc.warnings().is_empty());
}

#[test]
fn test_node_without_type_is_ignored() {
    let doc = parse(r#"{"content": [{"type": "text", "text": "lost"}]}"#);
    assert!(doc.root().children.is_empty());
    assert_eq!(messages(&doc), vec!["node without a type ignored"]);
}

#[test]
fn test_lists() {
    let doc = parse(
        r#"{"type": "ordered_list", "attrs": {"order": 3}, "content": [
            {"type": "list_item", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "three"}]}]},
            {"type": "bullet_list", "content": [
                {"type": "list_item", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "nested"}]}]}
            ]}
        ]},
        {"type": "check_list", "content": [
            {"type": "check_list_item", "attrs": {"checked": true}, "content": [{"type": "paragraph", "content": [{"type": "text", "text": "done"}]}]},
            {"type": "check_list_item", "attrs": {"checked": "false"}, "content": [{"type": "paragraph", "content": [{"type": "text", "text": "todo"}]}]}
        ]}"#,
    );
    let [ordered, check] = doc.root().children.as_slice() else {
        panic!("expected two lists, got {:?}", doc.root().children);
    };

    assert_eq!(ordered.kind, NodeKind::OrderedList { start: 3 });
    // The nested list joins the preceding item.
    assert_eq!(ordered.children.len(), 1);
    let item = &ordered.children[0];
    assert_eq!(
        kinds(&item.children),
        vec![&NodeKind::Paragraph, &NodeKind::BulletList]
    );
    assert_eq!(item.children[1].list_kind(), Some(ListKind::Bullet));

    assert_eq!(
        kinds(&check.children),
        vec![
            &NodeKind::CheckItem { checked: true },
            &NodeKind::CheckItem { checked: false },
        ]
    );
    assert!(doc.warnings().is_empty());
}

#[test]
fn test_list_children_are_items() {
    let doc = parse(
        r#"{"type": "bullet_list", "content": [
            {"type": "paragraph", "content": [{"type": "text", "text": "stray"}]}
        ]},
        {"type": "list_item", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "orphan"}]}]}"#,
    );
    let [wrapped, orphan] = doc.root().children.as_slice() else {
        panic!("expected two lists");
    };
    assert_eq!(kinds(&wrapped.children), vec![&NodeKind::ListItem]);
    assert_eq!(orphan.kind, NodeKind::BulletList);
    assert_eq!(kinds(&orphan.children), vec![&NodeKind::ListItem]);
    assert_eq!(
        messages(&doc),
        vec![
            "`paragraph` inside a list wrapped into a list item",
            "list item outside of a list wrapped into a list",
        ]
    );
}

#[test]
fn test_ragged_table_is_padded() {
    let doc = parse(
        r#"{"type": "table", "content": [
            {"type": "table_row", "content": [
                {"type": "table_cell", "attrs": {"colwidth": [120]}, "content": [{"type": "paragraph", "content": [{"type": "text", "text": "A"}]}]},
                {"type": "table_cell", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "B"}]}]},
                {"type": "table_cell", "content": []}
            ]},
            {"type": "table_row", "content": [
                {"type": "table_cell", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "C"}]}]}
            ]}
        ]}"#,
    );
    let table = &doc.root().children[0];
    assert_eq!(
        table.kind,
        NodeKind::Table {
            column_widths: vec![Some(120), None, None]
        }
    );
    assert_eq!(table.children[1].children.len(), 3);
    assert_eq!(messages(&doc), vec!["ragged table rows padded with empty cells"]);
}

#[test]
fn test_row_spans_count_as_covered() {
    let doc = parse(
        r#"{"type": "table", "content": [
            {"type": "table_row", "content": [
                {"type": "table_cell", "attrs": {"rowspan": 2}, "content": []},
                {"type": "table_cell", "content": []}
            ]},
            {"type": "table_row", "content": [
                {"type": "table_cell", "content": []}
            ]}
        ]}"#,
    );
    let table = &doc.root().children[0];
    assert_eq!(table.children[1].children.len(), 1);
    assert!(doc.warnings().is_empty());
}

#[test]
fn test_cell_spans_and_widths() {
    let doc = parse(
        r#"{"type": "table", "content": [
            {"type": "table_row", "content": [
                {"type": "table_header", "attrs": {"colspan": 2, "colwidth": [100, "50px"]}, "content": []}
            ]},
            {"type": "table_row", "content": [
                {"type": "table_cell", "attrs": {"colspan": 0}, "content": []},
                {"type": "table_cell", "content": []}
            ]}
        ]}"#,
    );
    let table = &doc.root().children[0];
    assert_eq!(
        table.kind,
        NodeKind::Table {
            column_widths: vec![Some(100), Some(50)]
        }
    );
    assert_eq!(
        table.children[0].children[0].kind,
        NodeKind::TableCell {
            colspan: 2,
            rowspan: 1,
            colwidth: vec![100, 50],
        }
    );
    assert!(matches!(
        table.children[1].children[0].kind,
        NodeKind::TableCell { colspan: 1, .. }
    ));
}

#[test]
fn test_huge_spans_are_clamped() {
    let doc = parse(
        r#"{"type": "table", "content": [
            {"type": "table_row", "content": [
                {"type": "table_cell", "attrs": {"colspan": 18446744073709551615, "rowspan": 10000000}, "content": []}
            ]}
        ]}"#,
    );
    let table = &doc.root().children[0];
    assert_eq!(
        table.children[0].children[0].kind,
        NodeKind::TableCell {
            colspan: MAX_SPAN,
            rowspan: MAX_SPAN,
            colwidth: vec![],
        }
    );
    let NodeKind::Table { column_widths } = &table.kind else {
        panic!("expected a table");
    };
    assert_eq!(column_widths.len(), MAX_SPAN);
    assert_eq!(table.children[0].children.len(), 1);
    assert_eq!(
        messages(&doc),
        vec![
            "colspan 18446744073709551615 clamped to 63",
            "rowspan 10000000 clamped to 63",
        ]
    );
}

#[test]
fn test_orphan_table_parts_are_wrapped() {
    let doc = parse(
        r#"{"type": "table_cell", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "lonely"}]}]}"#,
    );
    let table = &doc.root().children[0];
    assert!(matches!(table.kind, NodeKind::Table { .. }));
    assert_eq!(table.children[0].kind, NodeKind::TableRow);
    assert_eq!(table.plain_text(), "lonely");
    assert_eq!(
        messages(&doc),
        vec!["table part outside of a table wrapped into a table"]
    );
}

#[test]
fn test_images() {
    let doc = parse(
        r#"{"type": "image", "attrs": {"src": "https://example.com/a.png", "alt": "chart", "width": "320px", "height": 200}},
           {"type": "box_image", "attrs": {"file_id": 12345}},
           {"type": "image", "attrs": {"alt": "nothing"}}"#,
    );
    let children = &doc.root().children;
    let NodeKind::Image(image) = &children[0].kind else {
        panic!("expected an image, got {:?}", children[0].kind);
    };
    assert_eq!(image.source, "https://example.com/a.png");
    assert_eq!(image.alt.as_deref(), Some("chart"));
    assert_eq!((image.width, image.height), (Some(320), Some(200)));

    let NodeKind::Image(image) = &children[1].kind else {
        panic!("expected an image, got {:?}", children[1].kind);
    };
    assert_eq!(image.source, "https://app.box.com/file/12345");

    assert_eq!(
        children[2].kind,
        NodeKind::Passthrough {
            type_name: "image".into()
        }
    );
    assert_eq!(
        messages(&doc),
        vec!["image without a source kept as passthrough"]
    );
}

#[test]
fn test_nested_document_is_flattened() {
    let doc = parse(
        r#"{"type": "doc", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "inner"}]}]}"#,
    );
    assert_eq!(kinds(&doc.root().children), vec![&NodeKind::Paragraph]);
    assert_eq!(
        messages(&doc),
        vec!["nested document flattened into its parent"]
    );
}

#[test]
fn test_alignment_and_indent() {
    let doc = parse(
        r#"{"type": "paragraph", "attrs": {"align": "Center", "indent": 2}, "content": [{"type": "text", "text": "x"}]}"#,
    );
    let para = &doc.root().children[0];
    assert_eq!(para.align(), Some(crate::model::Align::Center));
    assert_eq!(para.indent(), 2);
}
