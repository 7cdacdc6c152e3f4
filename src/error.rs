//! Error types for the PDF stamping library
//!
//! Two kinds of failure exist. [`Error`] is fatal to the document being
//! processed: nothing is written for it and the batch moves on to the next
//! file. [`PageError`] only affects one page and is recorded in the page's
//! [`crate::stamper::PageOutcome`] so the caller can decide what to do with it.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PDF stamping library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Source document does not exist
    #[error("Source PDF not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Source document exists but could not be read or parsed
    #[error("Could not read source PDF {}: {}", .path.display(), .detail)]
    SourceUnreadable { path: PathBuf, detail: String },

    /// Stamp image does not exist
    #[error("Stamp image not found: {}", .0.display())]
    StampNotFound(PathBuf),

    /// Stamp image exists but could not be decoded
    #[error("Could not open stamp image {}: {}", .path.display(), .detail)]
    StampUnreadable { path: PathBuf, detail: String },

    /// Writing the stamped document failed
    #[error("Failed to write output PDF {}: {}", .path.display(), .detail)]
    OutputWriteFailed { path: PathBuf, detail: String },

    /// Scale factor is not a positive finite number
    #[error("Invalid stamp scale {0}: must be a positive number")]
    InvalidScale(f32),

    /// A page failed and the failure policy asked to abort the document
    #[error("Stopped processing {}: {}", .path.display(), .source)]
    PageAborted {
        path: PathBuf,
        #[source]
        source: PageError,
    },

    /// Invalid glob pattern
    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyPdf(PathBuf),
}

/// Failure confined to a single page of a document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PageError {
    /// The overlay for this page could not be drawn
    #[error("failed to draw stamp on page {page}: {detail}")]
    RenderFailed { page: u32, detail: String },

    /// The overlay could not be merged onto this page
    #[error("failed to merge stamp with page {page}: {detail}")]
    MergeFailed { page: u32, detail: String },
}

impl PageError {
    /// 1-based number of the page that failed
    pub fn page(&self) -> u32 {
        match self {
            PageError::RenderFailed { page, .. } | PageError::MergeFailed { page, .. } => *page,
        }
    }
}
