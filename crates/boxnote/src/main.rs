#![doc = include_str!("../README.md")]

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};

use boxnote::{
    resolver::{Credential, ImageSource},
    validate_boxnote, BatchSummary, ConvertOptions, Converter, Result,
};
use clap::Parser;

/// Converts Box Notes documents to DOCX.
#[derive(Debug, Clone, Parser)]
#[clap(name = "boxnote", version)]
pub struct ConvertArgs {
    /// A `.boxnote` file, or a directory searched recursively for them
    #[clap(value_name = "INPUT")]
    pub input: PathBuf,

    /// Directory receiving the converted files
    #[clap(short = 'd', long, default_value = "output", value_name = "DIR")]
    pub dest_dir: PathBuf,

    /// Downloads the embedded images from Box
    #[clap(long)]
    pub export_images: bool,

    /// Box API token used to download images
    #[clap(long, env = "BOX_API_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// JSON file holding the cookies of a logged-in Box web session, used
    /// when no API token is given
    #[clap(long, value_name = "FILE")]
    pub session_cookies: Option<PathBuf>,

    /// Also writes a standalone HTML page per document
    #[clap(long)]
    pub generate_html: bool,

    /// Timeout of a single image download
    #[clap(long, default_value_t = 60, value_name = "SECS")]
    pub timeout: u64,

    /// Retries of a failed image download
    #[clap(long, default_value_t = ImageSource::DEFAULT_MAX_RETRIES, value_name = "N")]
    pub retries: usize,

    /// Logs every step of the conversion
    #[clap(short, long)]
    pub verbose: bool,
}

fn main() -> ExitCode {
    let args = ConvertArgs::parse();

    // `RUST_LOG` takes precedence over `--verbose`.
    let mut builder = env_logger::builder();
    if std::env::var_os("RUST_LOG").is_none() {
        let level = if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        builder.filter_module("boxnote", level);
    }
    let _ = builder.try_init();

    match run(args) {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: ConvertArgs) -> Result<BatchSummary> {
    let credential = match (&args.api_token, &args.session_cookies) {
        (Some(token), _) if !token.trim().is_empty() => {
            Some(Credential::Token(token.trim().to_owned()))
        }
        (_, Some(path)) => Some(Credential::from_cookie_file(path)?),
        _ => None,
    };

    let converter = Converter::new(ConvertOptions {
        output_dir: args.dest_dir,
        emit_html: args.generate_html,
        export_images: args.export_images,
        credential,
        max_retries: args.retries,
        timeout: Duration::from_secs(args.timeout),
    })?;

    let results = if args.input.is_dir() {
        converter.convert_batch(&args.input)?
    } else {
        validate_boxnote(&args.input).map_err(|err| err.context(args.input.display()))?;
        vec![converter.convert(&args.input)]
    };

    for result in &results {
        for warning in &result.warnings {
            log::debug!("{}: {warning}", result.input.display());
        }
    }

    let summary = BatchSummary::from_results(&results);
    report(&args.input, &summary);
    Ok(summary)
}

fn report(input: &Path, summary: &BatchSummary) {
    if summary.total() == 0 {
        return;
    }
    if summary.is_success() {
        log::info!("{summary}");
        return;
    }

    log::error!("{summary} from {}", input.display());
    for (path, reason) in &summary.failed {
        log::error!("  {}: {reason}", path.display());
    }
}
