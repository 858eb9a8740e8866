//! Image resolution.
//!
//! Image nodes only carry a reference. The bytes are fetched lazily while a
//! renderer walks the tree, through an [`ImageResolver`]. The per-document
//! [`ImageSource`] sits in front of the resolver and takes care of caching,
//! retries, `data:` URLs and file naming.

pub mod box_api;
mod file;
#[cfg(feature = "http")]
mod http;
mod source;

use std::fmt;
use std::path::Path;

use ecow::EcoString;
use serde::Deserialize;

use crate::model::ImageRef;
use crate::{Error, Result};

pub use file::FileResolver;
#[cfg(feature = "http")]
pub use http::HttpResolver;
#[cfg(all(test, feature = "http"))]
pub(crate) use http::error_for_status;
pub(crate) use source::is_svg;
pub use source::{ImageOutcome, ImageSource, ResolvedImage, IMAGE_DIR};

/// Turns an image reference into the image bytes.
///
/// Implementations must not retry on their own; [`ImageSource`] does.
pub trait ImageResolver: Send + Sync {
    /// Fetches the bytes of the referenced image.
    fn resolve(&self, image: &ImageRef) -> Result<Vec<u8>, ResolveError>;
}

/// Why an image reference could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The credential was rejected or is missing.
    Unauthorized(EcoString),
    /// The referenced file does not exist, or is not an image.
    NotFound(EcoString),
    /// A transport failure or an unexpected response.
    NetworkFailure(EcoString),
}

impl ResolveError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ResolveError::NetworkFailure(_))
    }

    /// The detail message, without the error class.
    pub fn message(&self) -> &str {
        match self {
            ResolveError::Unauthorized(msg)
            | ResolveError::NotFound(msg)
            | ResolveError::NetworkFailure(msg) => msg,
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
            ResolveError::NotFound(msg) => write!(f, "not found: {msg}"),
            ResolveError::NetworkFailure(msg) => write!(f, "network failure: {msg}"),
        }
    }
}

impl std::error::Error for ResolveError {}

/// A browser cookie captured by the login flow.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
}

impl fmt::Debug for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cookie")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// How image downloads authenticate against Box.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// A Box API bearer token.
    Token(String),
    /// Cookies of an authenticated web session.
    Session(Vec<Cookie>),
}

impl Credential {
    /// Loads session cookies from a JSON file.
    ///
    /// Accepts a bare array of `{"name", "value"}` objects, as exported by
    /// browser drivers, or an object holding such an array under `cookies`.
    pub fn from_cookie_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::from(e).context(path.display()))?;
        Self::from_cookie_json(&content).map_err(|e| e.context(path.display()))
    }

    /// Parses session cookies from the content of a cookie file.
    pub fn from_cookie_json(content: &str) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum CookieFile {
            List(Vec<Cookie>),
            State { cookies: Vec<Cookie> },
        }

        let cookies = match serde_json::from_str::<CookieFile>(content)
            .map_err(|e| Error::auth(format!("invalid cookie file: {e}")))?
        {
            CookieFile::List(cookies) | CookieFile::State { cookies } => cookies,
        };
        if cookies.is_empty() {
            return Err(Error::auth("cookie file holds no cookies"));
        }
        Ok(Credential::Session(cookies))
    }

    /// The value of a `Cookie` request header carrying the session.
    pub fn cookie_header(&self) -> Option<String> {
        let Credential::Session(cookies) = self else {
            return None;
        };
        let pairs: Vec<String> = cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();
        Some(pairs.join("; "))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Token(_) => f.write_str("Token(<redacted>)"),
            Credential::Session(cookies) => f.debug_tuple("Session").field(cookies).finish(),
        }
    }
}
