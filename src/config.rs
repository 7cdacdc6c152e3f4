//! Configuration for stamping runs
//!
//! [`StampConfig`] holds everything the batch driver needs; [`StampOptions`]
//! is the subset used when stamping a single document. Defaults match the
//! directory layout the tool has always used: PDFs in `./notas`, results in
//! `./out`, stamp at `./assets/stamp.png`.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Default directory scanned for PDFs
pub const DEFAULT_INPUT_DIR: &str = "./notas";

/// Default directory receiving stamped PDFs
pub const DEFAULT_OUTPUT_DIR: &str = "./out";

/// Default stamp image
pub const DEFAULT_STAMP_PATH: &str = "./assets/stamp.png";

/// Default scale applied to the stamp's pixel dimensions
pub const DEFAULT_SCALE: f32 = 0.35;

/// What to do with a page whose stamp could not be drawn or merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageFailurePolicy {
    /// Leave the page out of the output document
    #[default]
    Drop,
    /// Keep the page without a stamp
    PassThrough,
    /// Fail the whole document and write nothing
    Abort,
}

/// Options for stamping one document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampOptions {
    /// Multiplier from stamp pixels to points
    pub scale: f32,
    /// Handling of pages that fail to render or merge
    pub on_page_failure: PageFailurePolicy,
}

impl Default for StampOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            on_page_failure: PageFailurePolicy::default(),
        }
    }
}

impl StampOptions {
    /// Reject scales that would produce an empty or undefined stamp
    pub fn validate(&self) -> Result<()> {
        if self.scale.is_finite() && self.scale > 0.0 {
            Ok(())
        } else {
            Err(Error::InvalidScale(self.scale))
        }
    }
}

/// Configuration for a batch run over a directory
#[derive(Debug, Clone)]
pub struct StampConfig {
    /// Directory scanned for `*.pdf` files
    pub input_dir: PathBuf,
    /// Directory receiving stamped copies
    pub output_dir: PathBuf,
    /// Stamp image applied to every page
    pub stamp_path: PathBuf,
    /// Prepended to each output file name
    pub output_prefix: String,
    /// Per-document options
    pub options: StampOptions,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            stamp_path: PathBuf::from(DEFAULT_STAMP_PATH),
            output_prefix: String::new(),
            options: StampOptions::default(),
        }
    }
}

impl StampConfig {
    /// Output path for a document with the given base name
    pub fn output_path_for(&self, name: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}{}.pdf", self.output_prefix, name))
    }
}
