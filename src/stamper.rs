//! Stamping a single PDF document
//!
//! [`stamp_pdf`] opens the source document, decodes the stamp, composites an
//! overlay onto every page and writes the result. Each page's outcome is kept
//! as a value in [`PageOutcome`]; what happens to failed pages is decided
//! afterwards by the configured [`PageFailurePolicy`].

use std::path::{Path, PathBuf};

use lopdf::{Document, ObjectId};
use tracing::{debug, info, instrument, warn};

use crate::config::{PageFailurePolicy, StampOptions};
use crate::error::{Error, PageError, Result};
use crate::layout::{placement_in_media_box, Placement};
use crate::pdf::merge::merge_overlay;
use crate::pdf::metadata::page_media_box;
use crate::pdf::overlay::Overlay;
use crate::pdf::stamp::StampImage;

/// Result of stamping one page
#[derive(Debug, Clone, PartialEq)]
pub struct PageOutcome {
    /// 1-based page number in the source document
    pub page: u32,
    /// Where the stamp was placed, or why the page could not be stamped
    pub result: std::result::Result<Placement, PageError>,
}

impl PageOutcome {
    pub fn is_stamped(&self) -> bool {
        self.result.is_ok()
    }
}

/// Summary of a stamped document
#[derive(Debug, Clone)]
pub struct StampSummary {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Pages in the source document
    pub source_pages: usize,
    /// Pages written to the output document
    pub output_pages: usize,
    /// One entry per source page, in order
    pub outcomes: Vec<PageOutcome>,
}

impl StampSummary {
    /// Pages that could not be stamped
    pub fn failed_pages(&self) -> impl Iterator<Item = &PageError> {
        self.outcomes.iter().filter_map(|outcome| outcome.result.as_ref().err())
    }

    /// Number of pages that carry the stamp
    pub fn stamped_pages(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.is_stamped()).count()
    }
}

/// Stamp every page of `source` with the image at `stamp_image`, writing to `output`
///
/// Missing or unreadable inputs abort before anything is written. Pages that
/// fail to render or merge are handled according to
/// `options.on_page_failure`.
///
/// # Example
///
/// ```no_run
/// use pdf_stamp::{stamp_pdf, StampOptions};
/// use std::path::Path;
///
/// let summary = stamp_pdf(
///     Path::new("notas/invoice.pdf"),
///     Path::new("assets/stamp.png"),
///     Path::new("out/invoice.pdf"),
///     &StampOptions::default(),
/// ).expect("Failed to stamp");
///
/// println!("{} of {} pages stamped", summary.stamped_pages(), summary.source_pages);
/// ```
#[instrument(skip_all, fields(source = %source.display()))]
pub fn stamp_pdf(
    source: &Path,
    stamp_image: &Path,
    output: &Path,
    options: &StampOptions,
) -> Result<StampSummary> {
    options.validate()?;

    let mut doc = open_source(source)?;
    let stamp = StampImage::open(stamp_image)?;

    let source_pages = doc.get_pages().len();
    info!(pages = source_pages, "Stamping {}", source.display());

    let outcomes = stamp_document(&mut doc, &stamp, options.scale);
    apply_failure_policy(&mut doc, &outcomes, options.on_page_failure, source)?;

    let output_pages = doc.get_pages().len();
    if output_pages == 0 {
        warn!("No pages left to write for {}", source.display());
    }

    doc.compress();
    doc.save(output).map_err(|err| Error::OutputWriteFailed {
        path: output.to_path_buf(),
        detail: err.to_string(),
    })?;

    info!(
        output_pages,
        stamped = outcomes.iter().filter(|o| o.is_stamped()).count(),
        "Wrote {}",
        output.display()
    );

    Ok(StampSummary {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        source_pages,
        output_pages,
        outcomes,
    })
}

/// Load the source document
fn open_source(source: &Path) -> Result<Document> {
    if !source.exists() {
        return Err(Error::SourceNotFound(source.to_path_buf()));
    }

    Document::load(source).map_err(|err| Error::SourceUnreadable {
        path: source.to_path_buf(),
        detail: err.to_string(),
    })
}

/// Composite the stamp onto every page of an already loaded document
///
/// Returns one outcome per page in page order. Failed pages are left exactly
/// as they were in `doc`. The stamp image is stored once and shared by every
/// stamped page.
pub fn stamp_document(doc: &mut Document, stamp: &StampImage, scale: f32) -> Vec<PageOutcome> {
    // Collect page info first (to avoid borrow issues)
    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
    let mut shared_image = None;

    pages
        .into_iter()
        .map(|(page, page_id)| {
            let result = stamp_page(doc, page, page_id, stamp, scale, &mut shared_image);
            if let Err(err) = &result {
                warn!("{}", err);
            }
            PageOutcome { page, result }
        })
        .collect()
}

fn stamp_page(
    doc: &mut Document,
    page: u32,
    page_id: ObjectId,
    stamp: &StampImage,
    scale: f32,
    shared_image: &mut Option<ObjectId>,
) -> std::result::Result<Placement, PageError> {
    let media_box = page_media_box(doc, page_id).ok_or_else(|| PageError::RenderFailed {
        page,
        detail: "page has no usable MediaBox".to_string(),
    })?;

    let (width, height) = stamp.scaled_size(scale);
    let placement = placement_in_media_box(media_box, width, height);
    debug!(
        page,
        media_box = ?media_box,
        x = placement.x,
        y = placement.y,
        "Placing stamp"
    );

    let overlay = Overlay::render(stamp, placement, page)?;
    merge_overlay(doc, page_id, page, overlay, shared_image)?;

    Ok(placement)
}

/// Remove, keep or reject failed pages
fn apply_failure_policy(
    doc: &mut Document,
    outcomes: &[PageOutcome],
    policy: PageFailurePolicy,
    source: &Path,
) -> Result<()> {
    let failed: Vec<&PageError> = outcomes
        .iter()
        .filter_map(|outcome| outcome.result.as_ref().err())
        .collect();

    if failed.is_empty() {
        return Ok(());
    }

    match policy {
        PageFailurePolicy::Drop => {
            let numbers: Vec<u32> = failed.iter().map(|err| err.page()).collect();
            warn!(pages = ?numbers, "Dropping pages that could not be stamped");
            doc.delete_pages(&numbers);
        }
        PageFailurePolicy::PassThrough => {
            warn!(count = failed.len(), "Keeping pages that could not be stamped without a stamp");
        }
        PageFailurePolicy::Abort => {
            return Err(Error::PageAborted {
                path: source.to_path_buf(),
                source: failed[0].clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_invalid_scale_checked_first() {
        let options = StampOptions { scale: 0.0, ..Default::default() };
        let result = stamp_pdf(
            &PathBuf::from("missing.pdf"),
            &PathBuf::from("missing.png"),
            &PathBuf::from("out.pdf"),
            &options,
        );
        assert!(matches!(result, Err(Error::InvalidScale(_))));
    }

    #[test]
    fn test_missing_source_reported_before_stamp() {
        let result = stamp_pdf(
            &PathBuf::from("missing.pdf"),
            &PathBuf::from("missing.png"),
            &PathBuf::from("out.pdf"),
            &StampOptions::default(),
        );
        assert!(matches!(result, Err(Error::SourceNotFound(_))));
    }

    #[test]
    fn test_page_outcome_is_stamped() {
        let ok = PageOutcome {
            page: 1,
            result: Ok(Placement { x: 0.0, y: 0.0, width: 1.0, height: 1.0 }),
        };
        let failed = PageOutcome {
            page: 2,
            result: Err(PageError::MergeFailed { page: 2, detail: "bad".to_string() }),
        };
        assert!(ok.is_stamped());
        assert!(!failed.is_stamped());
    }
}
