//! Overlay page rendering
//!
//! An overlay is a standalone single-page PDF, US Letter sized, holding only
//! the stamp image at its computed placement. It is built for one source page
//! and consumed by [`crate::pdf::merge::merge_overlay`].

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::PageError;
use crate::layout::{PageDimensions, Placement};
use crate::pdf::stamp::StampImage;

/// Resource name of the stamp image inside the overlay page
pub const STAMP_IMAGE_NAME: &str = "Im0";

/// A rendered single-page overlay document
#[derive(Debug, Clone)]
pub struct Overlay {
    document: Document,
    image_id: ObjectId,
}

impl Overlay {
    /// Draw `stamp` at `placement` on a fresh Letter-sized page
    ///
    /// `page` is the 1-based number of the source page this overlay is for,
    /// used only for error reporting.
    pub fn render(stamp: &StampImage, placement: Placement, page: u32) -> Result<Self, PageError> {
        let render_failed = |detail: String| PageError::RenderFailed { page, detail };

        if !placement.is_finite() {
            return Err(render_failed(format!("placement is not finite: {:?}", placement)));
        }
        if placement.width <= 0.0 || placement.height <= 0.0 {
            return Err(render_failed(format!(
                "stamp size {}x{} is empty",
                placement.width, placement.height
            )));
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let image_id = stamp.add_to(&mut doc);

        // Unit square scaled to the stamp size, then moved to (x, y)
        let content = format!(
            "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
            placement.width, placement.height, placement.x, placement.y, STAMP_IMAGE_NAME
        );
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let mut xobjects = Dictionary::new();
        xobjects.set(STAMP_IMAGE_NAME, Object::Reference(image_id));
        let mut resources = Dictionary::new();
        resources.set("XObject", Object::Dictionary(xobjects));

        let canvas = PageDimensions::letter();
        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Parent", Object::Reference(pages_id));
        page_dict.set("MediaBox", Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(canvas.width),
            Object::Real(canvas.height),
        ]));
        page_dict.set("Resources", Object::Dictionary(resources));
        page_dict.set("Contents", Object::Reference(content_id));
        let page_id = doc.add_object(Object::Dictionary(page_dict));

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Count", Object::Integer(1));
        pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(Object::Dictionary(catalog));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        Ok(Self { document: doc, image_id })
    }

    /// The overlay document
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Object id of the stamp image inside the overlay document
    pub fn image_id(&self) -> ObjectId {
        self.image_id
    }

    /// Object id of the overlay's only page
    pub fn page_id(&self) -> Option<ObjectId> {
        self.document.get_pages().values().next().copied()
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}
