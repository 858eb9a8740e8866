//! Raw serde shape of BoxNote nodes, before normalization.

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawNode {
    #[serde(rename = "type")]
    pub ty: String,
    pub attrs: Map<String, Value>,
    pub content: Vec<RawNode>,
    pub marks: Vec<RawMark>,
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawMark {
    #[serde(rename = "type")]
    pub ty: String,
    pub attrs: Map<String, Value>,
}

/// Reads a non-empty string attribute.
pub(crate) fn attr_str<'a>(attrs: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    attrs
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Reads an unsigned attribute, accepting numbers, numeric strings and CSS
/// pixel strings such as `"120px"`.
pub(crate) fn attr_u64(attrs: &Map<String, Value>, key: &str) -> Option<u64> {
    value_u64(attrs.get(key)?)
}

pub(crate) fn value_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => {
            let s = s.trim();
            let s = s.strip_suffix("px").unwrap_or(s).trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
        }
        _ => None,
    }
}

pub(crate) fn attr_bool(attrs: &Map<String, Value>, key: &str) -> bool {
    match attrs.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim(), "true" | "1" | "checked"),
        Some(Value::Number(n)) => n.as_u64().is_some_and(|n| n != 0),
        _ => false,
    }
}
