use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ecow::eco_format;

use super::{ImageResolver, ResolveError};
use crate::model::ImageRef;

/// Resolves local paths and `file://` URLs, relative paths against a base
/// directory.
#[derive(Debug, Clone)]
pub struct FileResolver {
    root: PathBuf,
}

impl FileResolver {
    /// Resolves relative paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_of(&self, source: &str) -> Option<PathBuf> {
        let path = match source.strip_prefix("file://") {
            Some(rest) => Path::new(rest),
            None if source.contains("://") => return None,
            None => Path::new(source),
        };
        Some(if path.is_absolute() {
            path.to_owned()
        } else {
            self.root.join(path)
        })
    }
}

impl ImageResolver for FileResolver {
    fn resolve(&self, image: &ImageRef) -> Result<Vec<u8>, ResolveError> {
        let Some(path) = self.path_of(&image.source) else {
            return Err(ResolveError::NotFound(eco_format!(
                "{}: not a local reference",
                image.source
            )));
        };
        std::fs::read(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => ResolveError::NotFound(eco_format!("{}", path.display())),
            ErrorKind::PermissionDenied => {
                ResolveError::Unauthorized(eco_format!("{}", path.display()))
            }
            _ => ResolveError::NetworkFailure(eco_format!("{}: {err}", path.display())),
        })
    }
}
