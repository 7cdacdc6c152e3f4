//! PDF metadata and page geometry

use std::path::Path;
use lopdf::{Document, Object, ObjectId, Dictionary};
use crate::error::{Error, Result};
use crate::layout::PageDimensions;

/// Upper bound on page-tree depth when walking `Parent` links
const MAX_TREE_DEPTH: usize = 64;

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
    /// MediaBox of each page in order; `None` where the page has no usable one
    pub media_boxes: Vec<Option<[f32; 4]>>,
}

/// Follow a reference to the object it points at
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object> {
    match object {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Numeric value of an integer or real object
pub(crate) fn as_number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(n) => Some(*n as f32),
        Object::Real(n) => Some(*n),
        _ => None,
    }
}

/// Look up a page attribute, falling back to ancestor page-tree nodes
///
/// `MediaBox` and `Resources` may be declared on a `Pages` node instead of the
/// page itself. The returned object has references resolved.
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;

    for _ in 0..MAX_TREE_DEPTH {
        let dict = match doc.get_object(current) {
            Ok(Object::Dictionary(dict)) => dict,
            _ => return None,
        };

        if let Ok(value) = dict.get(key) {
            return resolve(doc, value).ok().cloned();
        }

        current = match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => *parent,
            _ => return None,
        };
    }

    None
}

/// Read a page's MediaBox as `[llx lly urx ury]`
pub fn page_media_box(doc: &Document, page_id: ObjectId) -> Option<[f32; 4]> {
    let media_box = inherited_attribute(doc, page_id, b"MediaBox")?;

    let values: Vec<f32> = match media_box {
        Object::Array(items) => items
            .iter()
            .filter_map(|item| resolve(doc, item).ok().and_then(as_number))
            .collect(),
        _ => return None,
    };

    match values.as_slice() {
        [llx, lly, urx, ury] => Some([*llx, *lly, *urx, *ury]),
        _ => None,
    }
}

/// Page size in points from the page's MediaBox
pub fn page_dimensions(doc: &Document, page_id: ObjectId) -> Option<PageDimensions> {
    page_media_box(doc, page_id).map(PageDimensions::from_media_box)
}

/// Read a text entry of the Info dictionary
fn info_string(doc: &Document, info: &Dictionary, key: &[u8]) -> Option<String> {
    let value = resolve(doc, info.get(key).ok()?).ok()?;
    let bytes = value.as_str().ok()?;
    String::from_utf8(bytes.to_vec()).ok()
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    let pages = doc.get_pages();

    if pages.is_empty() {
        return Err(Error::EmptyPdf(path.to_path_buf()));
    }

    let media_boxes = pages
        .values()
        .map(|page_id| page_media_box(&doc, *page_id))
        .collect();

    let info = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|info| resolve(&doc, info).ok())
        .and_then(|info| info.as_dict().ok());

    let (title, author) = match info {
        Some(info) => (
            info_string(&doc, info, b"Title"),
            info_string(&doc, info, b"Author"),
        ),
        None => (None, None),
    };

    Ok(PdfMetadata {
        page_count: pages.len(),
        title,
        author,
        media_boxes,
    })
}

/// Count the number of pages in a PDF file
pub fn count_pages(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    Ok(doc.get_pages().len())
}
