//! PDF manipulation module

pub mod merge;
pub mod metadata;
pub mod overlay;
pub mod stamp;

// Re-export commonly used items
pub use merge::merge_overlay;
pub use metadata::{count_pages, extract_metadata, page_dimensions, PdfMetadata};
pub use overlay::Overlay;
pub use stamp::StampImage;
