//! PDF Stamp CLI tool
//!
//! A command-line tool that stamps a signature or seal image onto every page
//! of PDF documents.

use std::io;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use pdf_stamp::config::{DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR, DEFAULT_SCALE, DEFAULT_STAMP_PATH};
use pdf_stamp::layout::{placement_in_media_box, PageDimensions};
use pdf_stamp::pdf::{extract_metadata, StampImage};
use pdf_stamp::{process_directory, stamp_pdf, PageFailurePolicy, StampConfig, StampOptions};

/// PDF Stamp - Overlay a stamp image onto every page of PDF documents
#[derive(Parser)]
#[command(name = "pdf-stamp")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Stamp every PDF in ./notas into ./out using ./assets/stamp.png
    pdf-stamp

    # Same, with explicit directories and a smaller stamp
    pdf-stamp batch --input-dir scans --output-dir signed --scale 0.25

    # Stamp a single document, keeping pages that fail unstamped
    pdf-stamp file invoice.pdf -o invoice-signed.pdf --on-page-failure pass-through

    # Show page sizes and where the stamp would land
    pdf-stamp info invoice.pdf")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable DEBUG-level logs
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Stamp every PDF in a directory (the default when no command is given)
    Batch(BatchArgs),

    /// Stamp a single PDF file
    File {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        stamp: StampArgs,
    },

    /// Show page sizes of a PDF and where the stamp would be placed
    Info {
        /// PDF file to inspect
        input: PathBuf,

        /// Stamp image used to compute placements
        #[arg(long, default_value = DEFAULT_STAMP_PATH)]
        stamp: PathBuf,

        /// Scale applied to the stamp's pixel size
        #[arg(long, default_value_t = DEFAULT_SCALE)]
        scale: f32,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Batch(BatchArgs::default())
    }
}

#[derive(Args)]
struct BatchArgs {
    /// Directory containing the PDFs to stamp
    #[arg(long, default_value = DEFAULT_INPUT_DIR)]
    input_dir: PathBuf,

    /// Directory receiving the stamped PDFs
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Text prepended to each output file name
    #[arg(long, default_value = "")]
    prefix: String,

    #[command(flatten)]
    stamp: StampArgs,
}

impl Default for BatchArgs {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            prefix: String::new(),
            stamp: StampArgs::default(),
        }
    }
}

#[derive(Args)]
struct StampArgs {
    /// Stamp image (PNG with transparency recommended)
    #[arg(long, default_value = DEFAULT_STAMP_PATH)]
    stamp: PathBuf,

    /// Scale applied to the stamp's pixel size to get its size in points
    #[arg(long, default_value_t = DEFAULT_SCALE)]
    scale: f32,

    /// What to do with pages the stamp could not be applied to
    #[arg(long, value_enum, default_value_t = PolicyArg::Drop)]
    on_page_failure: PolicyArg,
}

impl Default for StampArgs {
    fn default() -> Self {
        Self {
            stamp: PathBuf::from(DEFAULT_STAMP_PATH),
            scale: DEFAULT_SCALE,
            on_page_failure: PolicyArg::Drop,
        }
    }
}

impl StampArgs {
    fn options(&self) -> StampOptions {
        StampOptions {
            scale: self.scale,
            on_page_failure: self.on_page_failure.into(),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    /// Leave failed pages out of the output
    Drop,
    /// Keep failed pages without a stamp
    PassThrough,
    /// Skip the whole document
    Abort,
}

impl From<PolicyArg> for PageFailurePolicy {
    fn from(v: PolicyArg) -> Self {
        match v {
            PolicyArg::Drop => PageFailurePolicy::Drop,
            PolicyArg::PassThrough => PageFailurePolicy::PassThrough,
            PolicyArg::Abort => PageFailurePolicy::Abort,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let result = match cli.command.unwrap_or_default() {
        Commands::Batch(args) => cmd_batch(args),
        Commands::File { input, output, stamp } => cmd_file(input, output, stamp),
        Commands::Info { input, stamp, scale } => cmd_info(input, stamp, scale),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Stamp every PDF in a directory
///
/// Individual failures are reported in the summary; the run itself succeeds.
fn cmd_batch(args: BatchArgs) -> Result<()> {
    let config = StampConfig {
        input_dir: args.input_dir,
        output_dir: args.output_dir,
        stamp_path: args.stamp.stamp.clone(),
        output_prefix: args.prefix,
        options: args.stamp.options(),
    };

    let report = process_directory(&config);

    if report.is_empty() {
        println!("No PDF files processed from {}", config.input_dir.display());
        return Ok(());
    }

    for file in &report.files {
        match &file.result {
            Ok(summary) => println!(
                "{}: {} of {} pages stamped -> {}",
                file.name,
                summary.stamped_pages(),
                summary.source_pages,
                file.output.display()
            ),
            Err(err) => println!("{}: not stamped ({})", file.name, err),
        }
    }

    println!(
        "Stamped {} of {} files",
        report.succeeded().count(),
        report.files.len()
    );

    Ok(())
}

/// Stamp a single PDF
fn cmd_file(input: PathBuf, output: PathBuf, stamp: StampArgs) -> Result<()> {
    let summary = stamp_pdf(&input, &stamp.stamp, &output, &stamp.options())
        .with_context(|| format!("Failed to stamp {}", input.display()))?;

    for failure in summary.failed_pages() {
        eprintln!("Warning: {}", failure);
    }

    println!(
        "Stamped {} of {} pages",
        summary.stamped_pages(),
        summary.source_pages
    );
    println!("Output: {}", output.display());

    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: PathBuf, stamp_path: PathBuf, scale: f32) -> Result<()> {
    let metadata = extract_metadata(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    // Placement is only shown when the stamp can be decoded
    let stamp_size = match StampImage::open(&stamp_path) {
        Ok(stamp) => Some(stamp.scaled_size(scale)),
        Err(err) => {
            eprintln!("Note: {}", err);
            None
        }
    };

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }

    for (i, media_box) in metadata.media_boxes.iter().enumerate() {
        let page_number = i + 1;
        let Some(media_box) = *media_box else {
            println!("  Page {}: no usable MediaBox", page_number);
            continue;
        };

        let size = PageDimensions::from_media_box(media_box);
        match stamp_size {
            Some((w, h)) => {
                let placement = placement_in_media_box(media_box, w, h);
                println!(
                    "  Page {}: {} x {} pt, stamp at ({}, {}) size {} x {}",
                    page_number, size.width, size.height, placement.x, placement.y, w, h
                );
            }
            None => println!("  Page {}: {} x {} pt", page_number, size.width, size.height),
        }
    }

    Ok(())
}
