use crate::resolver::{ImageSource, ResolveError};
use crate::tests::*;
use crate::writer::HtmlWriter;
use crate::BoxNoteDocument;

#[test]
fn test_paragraph_marks() {
    insta::assert_snapshot!(conv(r#"
{"type": "paragraph", "content": [
    {"type": "text", "text": "Hello "},
    {"type": "text", "text": "world", "marks": [{"type": "strong"}, {"type": "link", "attrs": {"href": "https://box.com"}}]}
]}
        "#), @r#"<p>Hello <a href="https://box.com"><strong>world</strong></a></p>"#);
    insta::assert_snapshot!(conv(r#"
{"type": "paragraph", "content": [
    {"type": "text", "text": "x", "marks": [{"type": "em"}, {"type": "strong"}, {"type": "font_color", "attrs": {"color": "red"}}]}
]}
        "#), @r#"<p><span style="color: red"><strong><em>x</em></strong></span></p>"#);
    insta::assert_snapshot!(conv(r#"
{"type": "paragraph", "content": [
    {"type": "text", "text": "big", "marks": [{"type": "font_size", "attrs": {"size": 18}}]},
    {"type": "text", "text": "lit", "marks": [{"type": "highlight", "attrs": {"color": "yellow"}}, {"type": "sparkle"}]}
]}
        "#), @r#"<p><span style="font-size: 18px">big</span><mark style="background-color: yellow">lit</mark></p>"#);
}

#[test]
fn test_text_is_escaped() {
    insta::assert_snapshot!(conv(r#"
{"type": "paragraph", "content": [{"type": "text", "text": "a < b & c"}]}
        "#), @"<p>a &lt; b &amp; c</p>");
}

#[test]
fn test_block_style() {
    insta::assert_snapshot!(conv(r#"
{"type": "paragraph", "attrs": {"align": "right", "indent": 1}, "content": [{"type": "text", "text": "x"}]},
{"type": "heading", "attrs": {"level": 2, "textAlign": "center"}, "content": [{"type": "text", "text": "Title"}]}
        "#), @r#"
    <p style="text-align:right;margin-left:1em">x</p>
    <h2 style="text-align:center">Title</h2>
    "#);
}

#[test]
fn test_lists() {
    insta::assert_snapshot!(conv(r#"
{"type": "bullet_list", "content": [
    {"type": "list_item", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "a"}]}]}
]},
{"type": "ordered_list", "attrs": {"order": 3}, "content": [
    {"type": "list_item", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "c"}]}]}
]},
{"type": "check_list", "content": [
    {"type": "check_list_item", "attrs": {"checked": true}, "content": [{"type": "paragraph", "content": [{"type": "text", "text": "done"}]}]},
    {"type": "check_list_item", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "todo"}]}]}
]}
        "#), @r#"
    <ul>
    <li><p>a</p>
    </li>
    </ul>
    <ol start="3">
    <li><p>c</p>
    </li>
    </ol>
    <ul class="check-list">
    <li><input type="checkbox" disabled="disabled" checked="checked" /><p>done</p>
    </li>
    <li><input type="checkbox" disabled="disabled" /><p>todo</p>
    </li>
    </ul>
    "#);
}

#[test]
fn test_table() {
    insta::assert_snapshot!(conv(r#"
{"type": "table", "content": [
    {"type": "table_row", "content": [
        {"type": "table_cell", "attrs": {"colwidth": [100]}, "content": [{"type": "paragraph", "content": [{"type": "text", "text": "A"}]}]},
        {"type": "table_cell", "attrs": {"rowspan": 2}, "content": [{"type": "paragraph", "content": [{"type": "text", "text": "B"}]}]}
    ]},
    {"type": "table_row", "content": [
        {"type": "table_cell", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "C"}]}]}
    ]}
]}
        "#), @r#"
    <table border="1" cellspacing="0">
    <colgroup><col style="width:100px" /><col /></colgroup>
    <tr>
    <td><p>A</p>
    </td>
    <td rowspan="2"><p>B</p>
    </td>
    </tr>
    <tr>
    <td><p>C</p>
    </td>
    </tr>
    </table>
    "#);
}

#[test]
fn test_code_quote_and_rule() {
    insta::assert_snapshot!(conv(r#"
{"type": "code_block", "attrs": {"language": "rust"}, "content": [
    {"type": "text", "text": "fn main() {}"},
    {"type": "hard_break"},
    {"type": "text", "text": "// done"}
]},
{"type": "blockquote", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "quoted"}]}]},
{"type": "horizontal_rule"}
        "#), @r#"
    <pre><code class="language-rust">fn main() {}
    // done</code></pre>
    <blockquote>
    <p>quoted</p>
    </blockquote>
    <hr />
    "#);
}

#[test]
fn test_rendering_is_deterministic() {
    let blocks = r##"
{"type": "heading", "attrs": {"level": 1}, "content": [{"type": "text", "text": "Plan"}]},
{"type": "paragraph", "content": [
    {"type": "text", "text": "mixed", "marks": [{"type": "underline"}, {"type": "font_color", "attrs": {"color": "#336699"}}, {"type": "em"}, {"type": "strong"}, {"type": "link", "attrs": {"href": "https://box.com"}}]}
]},
{"type": "ordered_list", "content": [
    {"type": "list_item", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "one"}]}]}
]},
{"type": "table", "content": [
    {"type": "table_row", "content": [{"type": "table_cell", "attrs": {"colwidth": [80]}, "content": []}]}
]}
"##;
    let doc = parse(blocks);
    let writer = HtmlWriter::new(doc.images().clone()).standalone(true);
    let first = writer.render(doc.root()).unwrap();
    let second = writer.render(doc.root()).unwrap();
    assert_eq!(first, second);

    // A fresh parse of the same input renders the same bytes.
    assert_eq!(conv(blocks), conv(blocks));
    assert_eq!(
        parse(blocks).to_html_string().unwrap(),
        doc.to_html_string().unwrap()
    );
    assert!(first.contains(
        r#"<a href="https://box.com"><span style="color: #336699"><strong><em><u>mixed</u></em></strong></span></a>"#
    ));
}

#[test]
fn test_image_without_export_keeps_source() {
    insta::assert_snapshot!(conv(r#"
{"type": "image", "attrs": {"src": "https://example.com/a.png", "alt": "chart", "width": 320}}
        "#), @r#"<img src="https://example.com/a.png" alt="chart" width="320" />"#);
}

#[test]
fn test_inline_data_url_is_exported() {
    let png = png_bytes();
    let src = format!(
        "data:image/png;base64,{}",
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &png)
    );
    let html = conv(&format!(
        r#"{{"type": "paragraph", "content": [{{"type": "image", "attrs": {{"src": "{src}"}}}}]}}"#
    ));
    insta::assert_snapshot!(html, @r#"<p><img src="images/image_redacted.png" alt="" /></p>"#);
}

#[test]
fn test_failed_image_placeholder() {
    let resolver = FailingResolver::new(ResolveError::NotFound("gone".into()));
    let doc = parse(
        r#"{"type": "image", "attrs": {"src": "https://example.com/gone.png", "alt": "chart"}},
           {"type": "image", "attrs": {"src": "https://example.com/gone.png"}}"#,
    )
    .with_resolver(Some(resolver.clone()), 2);

    let html = HtmlWriter::new(doc.images().clone())
        .render(doc.root())
        .unwrap();
    insta::assert_snapshot!(html, @r#"<span class="image-placeholder">[Image unavailable: chart]</span><span class="image-placeholder">[Image unavailable: https://example.com/gone.png]</span>"#);

    // Not-found is final, and the second reference hits the cache.
    assert_eq!(resolver.calls(), 1);
    assert_eq!(
        messages(&doc),
        vec!["image unavailable, not found: gone"]
    );
}

#[test]
fn test_resolved_image_points_into_image_dir() {
    let resolver = StaticResolver::new(png_bytes());
    let doc = parse(r#"{"type": "image", "attrs": {"src": "https://example.com/a", "title": "A"}}"#)
        .with_resolver(Some(resolver), 2);

    let html = HtmlWriter::new(doc.images().clone())
        .render(doc.root())
        .unwrap();
    let resolved = doc.images().resolved();
    assert_eq!(resolved.len(), 1);
    assert!(resolved[0].file_name.ends_with(".png"));
    assert_eq!(
        html,
        format!(
            r#"<img src="images/{}" alt="" title="A" />"#,
            resolved[0].file_name
        )
    );
}

#[test]
fn test_standalone_page() {
    let doc = BoxNoteDocument::parse(&note(
        r#"{"type": "paragraph", "content": [{"type": "text", "text": "body"}]}"#,
    ))
    .unwrap()
    .with_title("Plan <draft>");
    let html = doc.to_html_string().unwrap();

    assert!(html.starts_with("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n"));
    assert!(html.contains("<title>Plan &lt;draft&gt;</title>"));
    assert!(html.contains("<body>\n<p>body</p>\n</body>"));
    assert!(html.ends_with("</html>\n"));

    let untitled = HtmlWriter::new(ImageSource::disabled())
        .standalone(true)
        .render(doc.root())
        .unwrap();
    assert!(untitled.contains("<title>BoxNote</title>"));
}

#[test]
fn test_html_does_not_refetch_after_docx() {
    let resolver = StaticResolver::new(png_bytes());
    let doc = parse(r#"{"type": "image", "attrs": {"src": "https://example.com/a.png"}}"#)
        .with_resolver(Some(resolver.clone()), 2);

    doc.to_docx().unwrap();
    doc.to_html_string().unwrap();
    assert_eq!(resolver.calls(), 1);
}
