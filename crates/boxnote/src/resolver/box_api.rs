//! Box reference parsing.

use std::sync::LazyLock;

use regex::Regex;

/// Base URL of the Box content API.
pub const API_BASE: &str = "https://api.box.com/2.0";

/// A Box file reference extracted from an image source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoxFile {
    /// A numeric file id, from a `box.com/file/<id>` link or a bare id.
    Id(String),
    /// A shared link, `box.com/s/<token>`. Carries the full link.
    SharedLink(String),
}

static SHARED_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"box\.com/s/([a-zA-Z0-9]+)").unwrap());
static FILE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"box\.com/file/(\d+)").unwrap());
static RAW_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)$").unwrap());

/// Extracts the Box file behind an image reference.
pub fn extract_file(reference: &str) -> Option<BoxFile> {
    let reference = reference.trim();
    if SHARED_LINK.is_match(reference) {
        return Some(BoxFile::SharedLink(reference.to_owned()));
    }
    FILE_LINK
        .captures(reference)
        .or_else(|| RAW_ID.captures(reference))
        .map(|caps| BoxFile::Id(caps[1].to_owned()))
}

/// The API endpoint serving the content of a file.
pub fn content_url(file_id: &str) -> String {
    format!("{API_BASE}/files/{file_id}/content")
}

/// The API endpoint resolving a shared link to file metadata.
pub fn shared_items_url() -> String {
    format!("{API_BASE}/shared_items")
}
