//! PDF Stamp Library
//!
//! Overlays a fixed stamp image (a signature or seal) onto every page of PDF
//! documents. This library provides functionality to:
//! - Decode a stamp image, honouring its transparency
//! - Compute the stamp's placement on each page
//! - Render the stamp onto a single-page overlay and merge it onto a page
//! - Stamp a whole document, or every PDF found in a directory
//!
//! # Example
//!
//! ```no_run
//! use pdf_stamp::{process_directory, StampConfig};
//! use std::path::PathBuf;
//!
//! let config = StampConfig {
//!     input_dir: PathBuf::from("notas"),
//!     output_dir: PathBuf::from("out"),
//!     ..Default::default()
//! };
//!
//! let report = process_directory(&config);
//! for file in report.failed() {
//!     eprintln!("{} was not stamped", file.name);
//! }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod layout;
pub mod pdf;
pub mod stamper;

// Re-export commonly used items
pub use batch::{find_pdfs, process_directory, BatchReport, FileOutcome};
pub use config::{PageFailurePolicy, StampConfig, StampOptions};
pub use error::{Error, PageError, Result};
pub use stamper::{stamp_document, stamp_pdf, PageOutcome, StampSummary};
