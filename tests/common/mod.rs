//! Fixture builders shared by the integration tests

#![allow(dead_code)]

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;

pub const LETTER: (i64, i64) = (612, 792);
pub const A4: (i64, i64) = (595, 842);

/// Write a PDF with one page per entry of `page_sizes`
///
/// Pages whose 0-based index is listed in `broken` get an invalid Resources
/// entry, which makes merging a stamp onto them fail.
pub fn write_pdf(path: &Path, page_sizes: &[(i64, i64)], broken: &[usize]) {
    let media_boxes: Vec<[i64; 4]> = page_sizes
        .iter()
        .map(|(width, height)| [0, 0, *width, *height])
        .collect();
    write_pdf_with_media_boxes(path, &media_boxes, broken);
}

/// Write a PDF with one page per MediaBox `[llx lly urx ury]`
pub fn write_pdf_with_media_boxes(path: &Path, media_boxes: &[[i64; 4]], broken: &[usize]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    let font_id = doc.add_object(Object::Dictionary(font));

    let mut kids = Vec::new();
    for (i, media_box) in media_boxes.iter().enumerate() {
        let content = format!("BT\n/F1 12 Tf\n72 720 Td\n(Page {}) Tj\nET\n", i + 1);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let resources = if broken.contains(&i) {
            Object::Integer(5)
        } else {
            let mut fonts = Dictionary::new();
            fonts.set("F1", Object::Reference(font_id));
            let mut resources = Dictionary::new();
            resources.set("Font", Object::Dictionary(fonts));
            Object::Dictionary(resources)
        };

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set(
            "MediaBox",
            Object::Array(media_box.iter().map(|v| Object::Integer(*v)).collect()),
        );
        page.set("Contents", Object::Reference(content_id));
        page.set("Resources", resources);
        kids.push(Object::Reference(doc.add_object(Object::Dictionary(page))));
    }

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(kids.len() as i64));
    pages.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.save(path).expect("Failed to write fixture PDF");
}

/// Write a one-page Letter PDF whose `Contents` is a reference to an array of
/// two content streams
pub fn write_pdf_with_indirect_contents(path: &Path) {
    write_pdf(path, &[LETTER], &[]);

    let mut doc = Document::load(path).expect("Failed to reload fixture PDF");
    let page_id = doc.get_pages()[&1];
    let mut page = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .expect("fixture page")
        .clone();
    let first = page
        .get(b"Contents")
        .and_then(Object::as_reference)
        .expect("fixture contents");
    let second = doc.add_object(Stream::new(
        Dictionary::new(),
        b"0 0 m 612 792 l S\n".to_vec(),
    ));
    let array_id = doc.add_object(Object::Array(vec![
        Object::Reference(first),
        Object::Reference(second),
    ]));
    page.set("Contents", Object::Reference(array_id));
    doc.objects.insert(page_id, Object::Dictionary(page));

    doc.save(path).expect("Failed to write fixture PDF");
}

/// Number of image streams (soft masks included) in the document
pub fn image_stream_count(doc: &Document) -> usize {
    doc.objects
        .values()
        .filter_map(|object| object.as_stream().ok())
        .filter(|stream| {
            let subtype = stream.dict.get(b"Subtype").and_then(Object::as_name);
            subtype.ok() == Some(b"Image".as_slice())
        })
        .count()
}

/// Write a half-transparent PNG stamp
pub fn write_stamp(path: &Path, width: u32, height: u32) {
    let mut image = RgbaImage::from_pixel(width, height, Rgba([0, 0, 160, 255]));
    for x in 0..width {
        image.put_pixel(x, 0, Rgba([0, 0, 0, 0]));
    }
    image.save(path).expect("Failed to write fixture stamp");
}

/// Write a PNG stamp without an alpha channel
pub fn write_opaque_stamp(path: &Path, width: u32, height: u32) {
    RgbImage::from_pixel(width, height, Rgb([160, 0, 0]))
        .save(path)
        .expect("Failed to write fixture stamp");
}

/// Load a PDF with all streams decompressed
pub fn load_decompressed(path: &Path) -> Document {
    let mut doc = Document::load(path).expect("Failed to load output PDF");
    doc.decompress();
    doc
}

/// Content of the stamp form drawn on `page_id`, if any
pub fn stamp_form_content(doc: &Document, page_id: ObjectId) -> Option<String> {
    let page = doc.get_object(page_id).ok()?.as_dict().ok()?;
    let resources = page.get(b"Resources").ok()?.as_dict().ok()?;
    let xobjects = resources.get(b"XObject").ok()?.as_dict().ok()?;

    xobjects.iter().find_map(|(name, value)| {
        if !name.starts_with(b"Stamp") {
            return None;
        }
        let form = doc.get_object(value.as_reference().ok()?).ok()?.as_stream().ok()?;
        Some(String::from_utf8_lossy(&form.content).into_owned())
    })
}

/// True when any image in the document carries a soft mask
pub fn has_soft_mask(doc: &Document) -> bool {
    doc.objects.values().any(|object| match object {
        Object::Stream(stream) => stream.dict.has(b"SMask"),
        _ => false,
    })
}
