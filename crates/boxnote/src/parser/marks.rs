//! Mark resolution.

use ecow::EcoString;
use log::debug;

use crate::model::{Mark, Marks};

use super::raw::{attr_str, value_u64, RawMark};

/// Resolves raw marks into a deduplicated, ordered [`Marks`] set.
pub(crate) fn convert_marks(raw: &[RawMark]) -> Marks {
    raw.iter().filter_map(convert_mark).collect()
}

fn convert_mark(raw: &RawMark) -> Option<Mark> {
    let mark = match raw.ty.as_str() {
        "strong" | "bold" => Mark::Bold,
        "em" | "italic" => Mark::Italic,
        "underline" => Mark::Underline,
        "strikethrough" | "strike" => Mark::Strike,
        "code" => Mark::Code,
        "highlight" => Mark::Highlight(attr_str(&raw.attrs, "color").map(EcoString::from)),
        "font_color" | "text_color" | "color" => {
            Mark::Color(attr_str(&raw.attrs, "color")?.into())
        }
        "font_size" | "fontSize" => {
            let size = raw.attrs.get("size")?;
            match size {
                serde_json::Value::String(s) if !s.trim().is_empty() => {
                    Mark::FontSize(s.trim().into())
                }
                other => Mark::FontSize(value_u64(other)?.to_string().into()),
            }
        }
        "link" => Mark::Link {
            href: attr_str(&raw.attrs, "href").unwrap_or("#").into(),
        },
        "" => return None,
        other => {
            debug!("unknown mark type: {other}");
            Mark::Unknown(other.into())
        }
    };
    Some(mark)
}
