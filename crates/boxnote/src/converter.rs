//! Single-file and batch conversion of BoxNote files to the output layout.
//!
//! For an input `notes/Plan.boxnote` and the output directory `out`:
//!
//! ```text
//! out/Plan.docx
//! out/Plan/Plan.html          (with HTML)
//! out/Plan/images/image_*.png (with HTML, one file per resolved image)
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde_json::Value;
use walkdir::WalkDir;

use crate::diagnostics::Warning;
use crate::resolver::{Credential, ImageResolver, ImageSource, IMAGE_DIR};
use crate::{BoxNoteDocument, Error, ErrorKind, Format, Result};

/// The file extension of BoxNote documents.
pub const BOXNOTE_EXTENSION: &str = "boxnote";

/// Options of a conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Directory receiving the converted files.
    pub output_dir: PathBuf,
    /// Also write a standalone HTML page per document.
    pub emit_html: bool,
    /// Download the embedded images.
    pub export_images: bool,
    /// Authenticates image downloads.
    pub credential: Option<Credential>,
    /// Retries of a transient image download failure.
    pub max_retries: usize,
    /// Timeout of a single image download.
    pub timeout: Duration,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            emit_html: false,
            export_images: false,
            credential: None,
            max_retries: ImageSource::DEFAULT_MAX_RETRIES,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Files written for one converted document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertedFiles {
    /// The DOCX file.
    pub docx: PathBuf,
    /// The HTML page, when HTML output is enabled.
    pub html: Option<PathBuf>,
    /// The exported images.
    pub images: Vec<PathBuf>,
}

/// The outcome of converting one file.
#[derive(Debug)]
pub struct ConversionResult {
    /// The converted file.
    pub input: PathBuf,
    /// The written files, or why the conversion failed.
    pub outcome: Result<ConvertedFiles>,
    /// Recoverable problems met along the way.
    pub warnings: Vec<Warning>,
}

impl ConversionResult {
    /// Whether the file was converted.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Whether the failure is one that retrying with other inputs cannot fix.
    pub fn is_fatal(&self) -> bool {
        matches!(&self.outcome, Err(err) if err.kind() == ErrorKind::Authentication)
    }
}

/// Counts of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Number of converted inputs.
    pub converted: usize,
    /// Failed inputs with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    /// Tallies the results of a run.
    pub fn from_results(results: &[ConversionResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            match &result.outcome {
                Ok(_) => summary.converted += 1,
                Err(err) => summary
                    .failed
                    .push((result.input.clone(), err.to_string())),
            }
        }
        summary
    }

    /// Number of inputs.
    pub fn total(&self) -> usize {
        self.converted + self.failed.len()
    }

    /// Whether every input was converted.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} files converted",
            self.converted,
            self.total()
        )?;
        if !self.failed.is_empty() {
            write!(f, ", {} failed", self.failed.len())?;
        }
        Ok(())
    }
}

/// Drives the conversion of BoxNote files.
pub struct Converter {
    options: ConvertOptions,
    resolver: Option<Arc<dyn ImageResolver>>,
}

impl Converter {
    /// Creates a converter. With image export enabled, images are fetched
    /// over HTTP with the configured credential, which must be present.
    pub fn new(options: ConvertOptions) -> Result<Self> {
        let resolver = if options.export_images {
            Some(Self::http_resolver(&options)?)
        } else {
            None
        };
        Ok(Self { options, resolver })
    }

    #[cfg(feature = "http")]
    fn http_resolver(options: &ConvertOptions) -> Result<Arc<dyn ImageResolver>> {
        let Some(credential) = options.credential.clone() else {
            return Err(Error::auth(
                "image export needs an API token or session cookies",
            ));
        };
        let resolver = crate::resolver::HttpResolver::new(credential, options.timeout)?;
        Ok(Arc::new(resolver))
    }

    #[cfg(not(feature = "http"))]
    fn http_resolver(options: &ConvertOptions) -> Result<Arc<dyn ImageResolver>> {
        if options.credential.is_none() {
            return Err(Error::auth(
                "image export needs an API token or session cookies",
            ));
        }
        Err("image export over HTTP needs the `http` feature".into())
    }

    /// Creates a converter fetching images with the given resolver.
    pub fn with_resolver(options: ConvertOptions, resolver: Arc<dyn ImageResolver>) -> Self {
        Self {
            options,
            resolver: Some(resolver),
        }
    }

    /// Creates a converter that exports no images.
    pub fn without_images(options: ConvertOptions) -> Self {
        Self {
            options,
            resolver: None,
        }
    }

    /// The options of this converter.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Converts one file into the output directory.
    pub fn convert(&self, input: &Path) -> ConversionResult {
        self.convert_into(input, &self.options.output_dir)
    }

    fn convert_into(&self, input: &Path, output_dir: &Path) -> ConversionResult {
        let mut warnings = Vec::new();
        let outcome = self
            .convert_file(input, output_dir, &mut warnings)
            .map_err(|err| err.context(input.display()));

        match &outcome {
            Ok(files) => info!("converted {} to {}", input.display(), files.docx.display()),
            Err(err) => warn!("failed to convert {err}"),
        }

        ConversionResult {
            input: input.to_owned(),
            outcome,
            warnings,
        }
    }

    fn convert_file(
        &self,
        input: &Path,
        output_dir: &Path,
        warnings: &mut Vec<Warning>,
    ) -> Result<ConvertedFiles> {
        let source = read_source(input)?;
        let name = output_name(input);

        let doc = BoxNoteDocument::parse(&source)?
            .with_resolver(self.resolver.clone(), self.options.max_retries)
            .with_title(name.as_str());
        let result = self.write_outputs(&doc, output_dir, &name);
        *warnings = doc.warnings();
        result
    }

    fn write_outputs(
        &self,
        doc: &BoxNoteDocument,
        output_dir: &Path,
        name: &str,
    ) -> Result<ConvertedFiles> {
        std::fs::create_dir_all(output_dir)?;

        let docx = output_dir.join(format!("{name}.{}", Format::Docx.extension()));
        std::fs::write(&docx, doc.to_docx()?)?;
        debug!("wrote {}", docx.display());

        let mut files = ConvertedFiles {
            docx,
            ..Default::default()
        };
        if !self.options.emit_html {
            return Ok(files);
        }

        let html_dir = output_dir.join(name);
        std::fs::create_dir_all(&html_dir)?;
        let html = html_dir.join(format!("{name}.{}", Format::Html.extension()));
        std::fs::write(&html, doc.to_html_string()?.as_bytes())?;
        files.html = Some(html);

        let resolved = doc.images().resolved();
        if !resolved.is_empty() {
            let image_dir = html_dir.join(IMAGE_DIR);
            std::fs::create_dir_all(&image_dir)?;
            for image in resolved {
                let path = image_dir.join(image.file_name.as_str());
                std::fs::write(&path, &image.data)?;
                files.images.push(path);
            }
        }

        Ok(files)
    }

    /// Converts every BoxNote below a directory, in path order. A failing
    /// file does not stop the run.
    ///
    /// Outputs mirror the subdirectories of the inputs, so `in/a/Notes.boxnote`
    /// lands in `<output_dir>/a/Notes.docx`.
    pub fn convert_batch(&self, dir: &Path) -> Result<Vec<ConversionResult>> {
        if !dir.exists() {
            return Err(Error::from(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("input path {} does not exist", dir.display()),
            )));
        }

        let inputs = find_boxnotes(dir);
        if inputs.is_empty() {
            warn!("no .{BOXNOTE_EXTENSION} files found in {}", dir.display());
            return Ok(Vec::new());
        }

        info!("converting {} files from {}", inputs.len(), dir.display());
        let results = inputs
            .iter()
            .map(|input| {
                let output_dir = match input.strip_prefix(dir).ok().and_then(Path::parent) {
                    Some(relative) if !relative.as_os_str().is_empty() => {
                        self.options.output_dir.join(relative)
                    }
                    _ => self.options.output_dir.clone(),
                };
                self.convert_into(input, &output_dir)
            })
            .collect();
        Ok(results)
    }
}

/// BoxNote files below a directory, sorted by path.
pub fn find_boxnotes(dir: &Path) -> Vec<PathBuf> {
    let mut inputs: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(BOXNOTE_EXTENSION))
        })
        .collect();
    inputs.sort();
    inputs
}

/// The base name of the outputs of an input file: its file name without
/// any `.boxnote` or `.docx` suffix.
pub fn output_name(input: &Path) -> String {
    let mut name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    loop {
        let lower = name.to_ascii_lowercase();
        let Some(suffix) = [".boxnote", ".docx"]
            .into_iter()
            .find(|suffix| lower.ends_with(suffix) && lower.len() > suffix.len())
        else {
            break;
        };
        name.truncate(name.len() - suffix.len());
    }
    if name.is_empty() {
        name.push_str("document");
    }
    name
}

/// Reads a BoxNote file. Content that is not UTF-8 is a parse error.
fn read_source(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    String::from_utf8(bytes).map_err(|err| Error::parse(format!("not valid UTF-8: {err}")))
}

/// Checks that a file looks like a BoxNote, without converting it.
pub fn validate_boxnote(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(Error::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a file", path.display()),
        )));
    }
    let is_boxnote = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(BOXNOTE_EXTENSION));
    if !is_boxnote {
        warn!("{} does not have a .{BOXNOTE_EXTENSION} extension", path.display());
    }

    let source = read_source(path)?;
    let value: Value = serde_json::from_str(&source)?;
    let Value::Object(root) = &value else {
        return Err(Error::parse("root must be a JSON object"));
    };
    let doc = root.get("doc").unwrap_or(&value);
    if doc.get("type").and_then(Value::as_str) != Some("doc") {
        return Err(Error::parse("missing document root"));
    }
    if doc.get("content").is_some_and(|content| !content.is_array()) {
        return Err(Error::parse("document content must be a list"));
    }
    Ok(())
}
