//! Table normalization

use crate::model::{Marks, Node, NodeKind};

use super::core::{convert_attrs, BoxNoteParser};
use super::raw::{attr_u64, value_u64, RawNode};

/// Widest span a cell may claim, in rows or columns. DOCX tables hold at
/// most 63 columns.
pub const MAX_SPAN: usize = 63;

/// Table parser
pub(super) struct TableParser;

impl TableParser {
    /// Converts a table node into a rectangular grid of rows and cells.
    pub fn convert_table(parser: &BoxNoteParser, raw: &RawNode) -> Node {
        let mut rows = Vec::with_capacity(raw.content.len());
        for child in &raw.content {
            if is_row(child) {
                rows.push(Self::convert_row(parser, child));
            } else if is_cell(child) {
                parser.warn("table", "table cell outside of a row wrapped into a row");
                rows.push(Node::with_children(
                    NodeKind::TableRow,
                    vec![Self::convert_cell(parser, child)],
                ));
            } else {
                let blocks = parser.convert_blocks(std::slice::from_ref(child));
                if blocks.is_empty() {
                    continue;
                }
                parser.warn("table", format!("`{}` inside a table wrapped into a row", child.ty));
                rows.push(Node::with_children(
                    NodeKind::TableRow,
                    vec![empty_cell_with(blocks)],
                ));
            }
        }

        let columns = Self::pad_rows(parser, &mut rows);
        let column_widths = Self::column_widths(&rows, columns);

        Node {
            kind: NodeKind::Table { column_widths },
            attrs: convert_attrs(&raw.attrs),
            marks: Marks::new(),
            children: rows,
        }
    }

    /// Wraps a row or a cell met outside of any table into a table.
    pub fn wrap_orphan(parser: &BoxNoteParser, raw: &RawNode) -> Node {
        parser.warn(raw.ty.as_str(), "table part outside of a table wrapped into a table");
        let row = if is_row(raw) {
            Self::convert_row(parser, raw)
        } else {
            Node::with_children(NodeKind::TableRow, vec![Self::convert_cell(parser, raw)])
        };
        let mut rows = vec![row];
        let columns = Self::pad_rows(parser, &mut rows);
        let column_widths = Self::column_widths(&rows, columns);
        Node::with_children(NodeKind::Table { column_widths }, rows)
    }

    fn convert_row(parser: &BoxNoteParser, raw: &RawNode) -> Node {
        let mut cells = Vec::with_capacity(raw.content.len());
        for child in &raw.content {
            if is_cell(child) {
                cells.push(Self::convert_cell(parser, child));
                continue;
            }
            let blocks = parser.convert_blocks(std::slice::from_ref(child));
            if blocks.is_empty() {
                continue;
            }
            parser.warn(
                raw.ty.as_str(),
                format!("`{}` inside a table row wrapped into a cell", child.ty),
            );
            cells.push(empty_cell_with(blocks));
        }

        Node {
            kind: NodeKind::TableRow,
            attrs: convert_attrs(&raw.attrs),
            marks: Marks::new(),
            children: cells,
        }
    }

    fn convert_cell(parser: &BoxNoteParser, raw: &RawNode) -> Node {
        let colspan = Self::span(parser, raw, "colspan");
        let rowspan = Self::span(parser, raw, "rowspan");
        let colwidth = raw
            .attrs
            .get("colwidth")
            .and_then(|v| v.as_array())
            .map(|widths| {
                widths
                    .iter()
                    .filter_map(value_u64)
                    .map(|w| w.min(u32::MAX as u64) as u32)
                    .collect()
            })
            .unwrap_or_default();

        Node {
            kind: NodeKind::TableCell {
                colspan,
                rowspan,
                colwidth,
            },
            attrs: convert_attrs(&raw.attrs),
            marks: Marks::new(),
            children: parser.convert_blocks(&raw.content),
        }
    }

    fn span(parser: &BoxNoteParser, raw: &RawNode, key: &str) -> usize {
        let span = attr_u64(&raw.attrs, key).unwrap_or(1).max(1);
        if span > MAX_SPAN as u64 {
            parser.warn(
                raw.ty.as_str(),
                format!("{key} {span} clamped to {MAX_SPAN}"),
            );
            return MAX_SPAN;
        }
        span as usize
    }

    /// Pads short rows with empty cells so that every row covers the same
    /// number of grid columns. Returns that number.
    fn pad_rows(parser: &BoxNoteParser, rows: &mut [Node]) -> usize {
        let covered = covered_columns(rows);
        let columns = covered.iter().copied().max().unwrap_or(0);

        let mut padded = false;
        for (row, covered) in rows.iter_mut().zip(covered) {
            for _ in covered..columns {
                row.children.push(empty_cell_with(Vec::new()));
                padded = true;
            }
        }
        if padded {
            parser.warn("table", "ragged table rows padded with empty cells");
        }

        columns
    }

    /// Column widths taken from the `colwidth` of the first row's cells.
    fn column_widths(rows: &[Node], columns: usize) -> Vec<Option<u32>> {
        let mut widths = vec![None; columns];
        let Some(first) = rows.first() else {
            return widths;
        };

        let mut col = 0;
        for cell in &first.children {
            let NodeKind::TableCell {
                colspan, colwidth, ..
            } = &cell.kind
            else {
                continue;
            };
            if colwidth.len() == *colspan {
                for (slot, width) in widths.iter_mut().skip(col).zip(colwidth) {
                    *slot = Some(*width);
                }
            }
            col += colspan;
        }

        widths
    }
}

/// Counts, for each row, the grid columns taken either by its own cells or
/// by cells spanning down from the rows above.
fn covered_columns(rows: &[Node]) -> Vec<usize> {
    // Rows left to cover, current row included, for each grid column.
    let mut pending: Vec<usize> = Vec::new();
    let mut covered = Vec::with_capacity(rows.len());

    for row in rows {
        let mut col = 0;
        for cell in &row.children {
            while pending.get(col).is_some_and(|p| *p > 0) {
                col += 1;
            }
            let (colspan, rowspan) = match cell.kind {
                NodeKind::TableCell {
                    colspan, rowspan, ..
                } => (colspan, rowspan),
                _ => (1, 1),
            };
            if pending.len() < col + colspan {
                pending.resize(col + colspan, 0);
            }
            for slot in &mut pending[col..col + colspan] {
                *slot = rowspan;
            }
            col += colspan;
        }

        covered.push(pending.iter().filter(|p| **p > 0).count());
        for slot in &mut pending {
            *slot = slot.saturating_sub(1);
        }
    }

    covered
}

fn empty_cell_with(children: Vec<Node>) -> Node {
    Node::with_children(
        NodeKind::TableCell {
            colspan: 1,
            rowspan: 1,
            colwidth: Vec::new(),
        },
        children,
    )
}

fn is_row(raw: &RawNode) -> bool {
    matches!(raw.ty.as_str(), "table_row" | "tableRow")
}

fn is_cell(raw: &RawNode) -> bool {
    matches!(
        raw.ty.as_str(),
        "table_cell" | "tableCell" | "table_header" | "tableHeader"
    )
}
