use std::collections::BTreeMap;
use std::sync::Arc;

use base64::Engine;
use ecow::{eco_format, EcoString};
use log::debug;
use parking_lot::Mutex;
use percent_encoding::percent_decode_str;
use sha2::{Digest, Sha256};

use super::{ImageResolver, ResolveError};
use crate::diagnostics::{Warning, WarningCollector};
use crate::model::ImageRef;

/// Directory, relative to the HTML file, holding exported images.
pub const IMAGE_DIR: &str = "images";

/// Image bytes fetched for one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    /// Deterministic file name, `image_<hash>.<ext>`.
    pub file_name: EcoString,
    /// The image bytes as fetched.
    pub data: Arc<[u8]>,
}

impl ResolvedImage {
    fn new(source: &str, data: Vec<u8>) -> Self {
        let digest = hex::encode(Sha256::digest(source.as_bytes()));
        let ext = extension_of(source, &data);
        Self {
            file_name: eco_format!("image_{}.{ext}", &digest[..10]),
            data: data.into(),
        }
    }

    /// Path of the exported file relative to the HTML file.
    pub fn relative_path(&self) -> EcoString {
        eco_format!("{IMAGE_DIR}/{}", self.file_name)
    }
}

/// The result of looking up one image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    /// The image bytes were fetched.
    Resolved(ResolvedImage),
    /// No resolver is configured, so the image is kept as a reference.
    NotExported,
    /// Fetching failed; a warning was recorded.
    Failed(ResolveError),
}

/// Per-document front end over an [`ImageResolver`].
///
/// Clones share the same cache, so the HTML and the DOCX renderer fetch a
/// reference at most once between them.
#[derive(Clone)]
pub struct ImageSource {
    resolver: Option<Arc<dyn ImageResolver>>,
    max_retries: usize,
    warnings: WarningCollector,
    cache: Arc<Mutex<BTreeMap<EcoString, ImageOutcome>>>,
}

impl std::fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSource")
            .field("has_resolver", &self.resolver.is_some())
            .field("max_retries", &self.max_retries)
            .field("warnings", &self.warnings)
            .finish_non_exhaustive()
    }
}

impl ImageSource {
    /// Retries of a transient failure when none are configured.
    pub const DEFAULT_MAX_RETRIES: usize = 2;

    /// Creates a source over an optional resolver. Without one, only
    /// `data:` URLs are exported.
    pub fn new(resolver: Option<Arc<dyn ImageResolver>>, warnings: WarningCollector) -> Self {
        Self {
            resolver,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            warnings,
            cache: Arc::default(),
        }
    }

    /// A source that exports no images besides inline `data:` URLs.
    pub fn disabled() -> Self {
        Self::new(None, WarningCollector::new())
    }

    /// Sets how often a transient failure is retried.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Looks up an image, consulting the resolver on the first request for
    /// a reference only.
    pub fn fetch(&self, image: &ImageRef) -> ImageOutcome {
        if let Some(hit) = self.cache.lock().get(&image.source) {
            return hit.clone();
        }

        let outcome = match self.load(image) {
            Some(Ok(data)) if data.is_empty() => {
                ImageOutcome::Failed(ResolveError::NotFound("empty image data".into()))
            }
            Some(Ok(data)) => ImageOutcome::Resolved(ResolvedImage::new(&image.source, data)),
            Some(Err(err)) => ImageOutcome::Failed(err),
            None => ImageOutcome::NotExported,
        };
        if let ImageOutcome::Failed(err) = &outcome {
            self.warnings.push(Warning::new(
                image.source.clone(),
                eco_format!("image unavailable, {err}"),
            ));
        }

        self.cache
            .lock()
            .insert(image.source.clone(), outcome.clone());
        outcome
    }

    fn load(&self, image: &ImageRef) -> Option<Result<Vec<u8>, ResolveError>> {
        if image.is_data_url() {
            return Some(decode_data_url(&image.source));
        }
        let resolver = self.resolver.as_ref()?;

        let mut attempt = 0;
        loop {
            match resolver.resolve(image) {
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    debug!("retrying {} ({attempt}/{}): {err}", image.source, self.max_retries);
                }
                result => return Some(result),
            }
        }
    }

    /// Every image resolved so far, each file name once.
    pub fn resolved(&self) -> Vec<ResolvedImage> {
        let mut images: BTreeMap<EcoString, ResolvedImage> = BTreeMap::new();
        for outcome in self.cache.lock().values() {
            if let ImageOutcome::Resolved(image) = outcome {
                images
                    .entry(image.file_name.clone())
                    .or_insert_with(|| image.clone());
            }
        }
        images.into_values().collect()
    }
}

/// Decodes the payload of a `data:` URL.
fn decode_data_url(url: &str) -> Result<Vec<u8>, ResolveError> {
    let invalid = |why: &str| ResolveError::NotFound(eco_format!("malformed data URL, {why}"));

    let rest = url.strip_prefix("data:").ok_or_else(|| invalid("missing scheme"))?;
    let (header, payload) = rest.split_once(',').ok_or_else(|| invalid("missing payload"))?;

    if header.ends_with(";base64") {
        let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|err| invalid(&err.to_string()))
    } else {
        Ok(percent_decode_str(payload).collect())
    }
}

pub(crate) fn is_svg(data: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&data[..data.len().min(512)]);
    let head = head.trim_start_matches('\u{feff}').trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

/// Picks a file extension from the image content, then from the reference,
/// falling back to `jpg`.
fn extension_of(source: &str, data: &[u8]) -> &'static str {
    if let Ok(format) = image::guess_format(data) {
        if let Some(ext) = format.extensions_str().first() {
            return ext;
        }
    }
    if is_svg(data) {
        return "svg";
    }

    let path = source.split(['?', '#']).next().unwrap_or_default();
    let ext = path
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "png",
        Some("gif") => "gif",
        Some("bmp") => "bmp",
        Some("webp") => "webp",
        Some("svg") => "svg",
        _ => "jpg",
    }
}
