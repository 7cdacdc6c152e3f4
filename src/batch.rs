//! Batch stamping of every PDF in a directory
//!
//! The batch never fails as a whole: a missing input directory yields an empty
//! report, and each document's error is logged and recorded in its
//! [`FileOutcome`] before moving on to the next file.

use std::path::{Path, PathBuf};

use glob::{glob, Pattern};
use tracing::{error, info, instrument, warn};

use crate::config::StampConfig;
use crate::error::{Error, Result};
use crate::stamper::{stamp_pdf, StampSummary};

/// Outcome of stamping one file of the batch
#[derive(Debug)]
pub struct FileOutcome {
    /// File name without the `.pdf` extension
    pub name: String,
    pub source: PathBuf,
    pub output: PathBuf,
    pub result: Result<StampSummary>,
}

/// Per-file outcomes of a batch run, in processing order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<FileOutcome>,
}

impl BatchReport {
    /// Files that were written
    pub fn succeeded(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|file| file.result.is_ok())
    }

    /// Files that could not be stamped
    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|file| file.result.is_err())
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// List the PDF files directly inside `input_dir`, sorted by path
///
/// Only regular files (or symlinks to regular files) named `*.pdf` are
/// returned; directories matching the pattern are skipped.
pub fn find_pdfs(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let escaped_dir = Pattern::escape(&input_dir.to_string_lossy());
    let pattern = format!("{}/*.pdf", escaped_dir.trim_end_matches('/'));

    let mut paths = Vec::new();
    for entry in glob(&pattern).map_err(|err| Error::InvalidGlob(err.to_string()))? {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(path) => warn!("Skipping {}: not a regular file", path.display()),
            Err(err) => warn!("Skipping unreadable entry: {}", err),
        }
    }

    // Sort paths for consistent ordering
    paths.sort();

    Ok(paths)
}

/// Stamp every PDF in `config.input_dir` into `config.output_dir`
///
/// # Example
///
/// ```no_run
/// use pdf_stamp::{process_directory, StampConfig};
///
/// let report = process_directory(&StampConfig::default());
/// println!("{} stamped, {} failed", report.succeeded().count(), report.failed().count());
/// ```
#[instrument(skip_all, fields(input_dir = %config.input_dir.display()))]
pub fn process_directory(config: &StampConfig) -> BatchReport {
    let mut report = BatchReport::default();

    if !config.input_dir.is_dir() {
        warn!("Input directory {} does not exist", config.input_dir.display());
        return report;
    }

    let sources = match find_pdfs(&config.input_dir) {
        Ok(sources) => sources,
        Err(err) => {
            error!("{}", err);
            return report;
        }
    };

    if sources.is_empty() {
        info!("No PDF files found in {}", config.input_dir.display());
        return report;
    }

    if let Err(err) = std::fs::create_dir_all(&config.output_dir) {
        error!(
            "Could not create output directory {}: {}",
            config.output_dir.display(),
            err
        );
    }

    info!("Found {} PDF files in {}", sources.len(), config.input_dir.display());

    for source in sources {
        let name = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = config.output_path_for(&name);

        info!("Processing {}", name);
        let result = stamp_pdf(&source, &config.stamp_path, &output, &config.options);

        match &result {
            Ok(summary) => {
                let failed = summary.failed_pages().count();
                if failed > 0 {
                    warn!(
                        "{}: {} of {} pages could not be stamped",
                        name, failed, summary.source_pages
                    );
                }
            }
            Err(err) => error!("{}: {}", name, err),
        }

        report.files.push(FileOutcome {
            name,
            source,
            output,
            result,
        });
    }

    report
}
