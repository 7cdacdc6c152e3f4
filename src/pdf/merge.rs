//! Overlay merging using lopdf
//!
//! The overlay page is imported into the target document as a Form XObject and
//! drawn after the page's own content. The page's original content streams are
//! wrapped in `q`/`Q` so any transformation they leave behind does not move or
//! scale the stamp.

use std::collections::{HashMap, HashSet};
use lopdf::{Document, Object, ObjectId, Dictionary, Stream};
use crate::error::PageError;
use crate::layout::PageDimensions;
use crate::pdf::metadata::{inherited_attribute, page_media_box, resolve};
use crate::pdf::overlay::Overlay;

/// Preferred resource name of the stamp form on the target page
pub const STAMP_FORM_NAME: &str = "Stamp";

/// Overlay content and resources, renumbered into the target document
struct ImportedOverlay {
    content: Vec<u8>,
    resources: Dictionary,
    /// Stamp image the resources point at
    image_id: ObjectId,
}

/// Merge `overlay` on top of the page `page_id` of `doc`
///
/// `page_number` is the 1-based page number, used for error reporting. Every
/// check runs before the page is touched, so on error the page is left exactly
/// as it was.
///
/// `shared_image` holds the stamp image already imported by an earlier merge
/// into `doc`. When set, the overlay's own image is not copied again and the
/// new form points at the shared one; otherwise it is set to the image
/// imported by this merge.
pub fn merge_overlay(
    doc: &mut Document,
    page_id: ObjectId,
    page_number: u32,
    overlay: Overlay,
    shared_image: &mut Option<ObjectId>,
) -> Result<(), PageError> {
    let merge_failed = |detail: String| PageError::MergeFailed { page: page_number, detail };

    let mut page_dict = match doc.get_object(page_id) {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(_) => return Err(merge_failed("page object is not a dictionary".to_string())),
        Err(err) => return Err(merge_failed(err.to_string())),
    };

    let existing_contents = content_references(doc, &page_dict).map_err(merge_failed)?;
    let mut resources = page_resources(doc, page_id).map_err(merge_failed)?;
    let mut xobjects = xobject_dictionary(doc, &resources).map_err(merge_failed)?;
    let bbox = form_bounding_box(doc, page_id);

    let imported = import_overlay(doc, overlay, *shared_image).map_err(merge_failed)?;
    *shared_image = Some(imported.image_id);
    let form_id = create_form_xobject(doc, imported, bbox);

    let name = unique_xobject_name(&xobjects);
    xobjects.set(name.as_str(), Object::Reference(form_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let stamp_content = format!("Q\nq\n/{} Do\nQ\n", name);
    let stamp_id = doc.add_object(Stream::new(Dictionary::new(), stamp_content.into_bytes()));

    let mut contents = Vec::with_capacity(existing_contents.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing_contents);
    contents.push(Object::Reference(stamp_id));

    page_dict.set("Contents", Object::Array(contents));
    // Set the Resources directly on the page so inherited entries stay visible
    page_dict.set("Resources", Object::Dictionary(resources));
    doc.objects.insert(page_id, Object::Dictionary(page_dict));

    Ok(())
}

/// The page's content stream references, in drawing order
///
/// `Contents` may be a stream reference, a direct array, or a reference to an
/// array object; the last is flattened so the result only names streams.
fn content_references(doc: &Document, page_dict: &Dictionary) -> Result<Vec<Object>, String> {
    match page_dict.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => Ok(items.clone()),
            Ok(Object::Stream(_)) => Ok(vec![Object::Reference(*id)]),
            Ok(other) => Err(format!("Contents {:?} is not a stream: {:?}", id, other)),
            Err(err) => Err(format!("Contents {:?}: {}", id, err)),
        },
        Ok(Object::Array(items)) => Ok(items.clone()),
        Ok(other) => Err(format!("unexpected Contents entry: {:?}", other)),
        Err(_) => Ok(Vec::new()),
    }
}

/// The page's resources, own or inherited, as an owned dictionary
fn page_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary, String> {
    match inherited_attribute(doc, page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => Ok(dict),
        Some(other) => Err(format!("Resources is not a dictionary: {:?}", other)),
        None => Ok(Dictionary::new()),
    }
}

/// The XObject subdictionary of `resources`, dereferenced
fn xobject_dictionary(doc: &Document, resources: &Dictionary) -> Result<Dictionary, String> {
    let Ok(xobjects) = resources.get(b"XObject") else {
        return Ok(Dictionary::new());
    };

    match resolve(doc, xobjects) {
        Ok(Object::Dictionary(dict)) => Ok(dict.clone()),
        Ok(other) => Err(format!("XObject resources are not a dictionary: {:?}", other)),
        Err(err) => Err(err.to_string()),
    }
}

/// Bounding box covering both the Letter canvas and the target page
fn form_bounding_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let canvas = PageDimensions::letter();
    let [llx, lly, urx, ury] = page_media_box(doc, page_id).unwrap_or([0.0, 0.0, 0.0, 0.0]);

    [
        llx.min(0.0),
        lly.min(0.0),
        urx.max(canvas.width),
        ury.max(canvas.height),
    ]
}

/// Pick a name for the stamp form that the page does not already use
fn unique_xobject_name(xobjects: &Dictionary) -> String {
    let mut name = STAMP_FORM_NAME.to_string();
    let mut suffix = 1;

    while xobjects.has(name.as_bytes()) {
        name = format!("{}{}", STAMP_FORM_NAME, suffix);
        suffix += 1;
    }

    name
}

/// Copy the overlay's objects into `doc` under fresh ids
///
/// The overlay's page tree and its page content streams are left behind: the
/// content becomes the body of the Form XObject instead. With `shared_image`
/// set, the overlay's image and its soft mask are left behind too and
/// references to the image are pointed at the shared copy.
fn import_overlay(
    doc: &mut Document,
    overlay: Overlay,
    shared_image: Option<ObjectId>,
) -> Result<ImportedOverlay, String> {
    let overlay_page_id = overlay.page_id().ok_or("overlay has no page")?;
    let overlay_image_id = overlay.image_id();
    let overlay_doc = overlay.into_document();

    let content = overlay_doc
        .get_page_content(overlay_page_id)
        .map_err(|err| err.to_string())?;

    let page_dict = match overlay_doc.get_object(overlay_page_id) {
        Ok(Object::Dictionary(dict)) => dict,
        _ => return Err("overlay page is not a dictionary".to_string()),
    };

    // Objects that only make sense inside the overlay's own document
    let mut skipped: HashSet<ObjectId> = HashSet::new();
    skipped.insert(overlay_page_id);
    if let Ok(Object::Reference(pages_id)) = page_dict.get(b"Parent") {
        skipped.insert(*pages_id);
    }
    if let Ok(Object::Reference(catalog_id)) = overlay_doc.trailer.get(b"Root") {
        skipped.insert(*catalog_id);
    }
    if let Ok(contents) = page_dict.get(b"Contents") {
        match contents {
            Object::Reference(id) => {
                skipped.insert(*id);
            }
            Object::Array(items) => {
                skipped.extend(items.iter().filter_map(|item| item.as_reference().ok()));
            }
            _ => {}
        }
    }

    if shared_image.is_some() {
        skipped.insert(overlay_image_id);
        if let Ok(Object::Stream(image)) = overlay_doc.get_object(overlay_image_id) {
            if let Ok(Object::Reference(mask_id)) = image.dict.get(b"SMask") {
                skipped.insert(*mask_id);
            }
        }
    }

    // Build complete ID map first
    let id_offset = doc.max_id + 1;
    let mut id_map: HashMap<ObjectId, ObjectId> = overlay_doc
        .objects
        .keys()
        .map(|old_id| (*old_id, (old_id.0 + id_offset, old_id.1)))
        .collect();
    if let Some(shared_id) = shared_image {
        id_map.insert(overlay_image_id, shared_id);
    }
    let image_id = id_map
        .get(&overlay_image_id)
        .copied()
        .ok_or("overlay image is missing")?;

    let resources = match page_dict.get(b"Resources") {
        Ok(res) => match resolve(&overlay_doc, res) {
            Ok(Object::Dictionary(dict)) => renumber_dictionary(dict, &id_map),
            _ => return Err("overlay resources are not a dictionary".to_string()),
        },
        Err(_) => Dictionary::new(),
    };

    for (old_id, object) in overlay_doc.objects.iter() {
        if skipped.contains(old_id) {
            continue;
        }
        doc.objects.insert(id_map[old_id], renumber_object_references(object, &id_map));
    }

    doc.max_id = overlay_doc.max_id + id_offset;

    Ok(ImportedOverlay {
        content,
        resources,
        image_id,
    })
}

/// Renumber all object references in an object
fn renumber_object_references(object: &Object, id_map: &HashMap<ObjectId, ObjectId>) -> Object {
    match object {
        Object::Reference(old_id) => {
            Object::Reference(id_map.get(old_id).copied().unwrap_or(*old_id))
        }
        Object::Array(arr) => {
            Object::Array(arr.iter().map(|obj| renumber_object_references(obj, id_map)).collect())
        }
        Object::Dictionary(dict) => Object::Dictionary(renumber_dictionary(dict, id_map)),
        Object::Stream(stream) => {
            let mut new_stream =
                Stream::new(renumber_dictionary(&stream.dict, id_map), stream.content.clone());
            new_stream.allows_compression = stream.allows_compression;
            Object::Stream(new_stream)
        }
        _ => object.clone(),
    }
}

fn renumber_dictionary(dict: &Dictionary, id_map: &HashMap<ObjectId, ObjectId>) -> Dictionary {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        new_dict.set(key.clone(), renumber_object_references(value, id_map));
    }
    new_dict
}

/// Wrap the overlay content in a Form XObject
fn create_form_xobject(doc: &mut Document, overlay: ImportedOverlay, bbox: [f32; 4]) -> ObjectId {
    let mut xobject_dict = Dictionary::new();
    xobject_dict.set("Type", Object::Name(b"XObject".to_vec()));
    xobject_dict.set("Subtype", Object::Name(b"Form".to_vec()));
    xobject_dict.set("FormType", Object::Integer(1));
    xobject_dict.set("BBox", Object::Array(bbox.iter().map(|v| Object::Real(*v)).collect()));
    xobject_dict.set("Matrix", Object::Array(vec![
        Object::Integer(1),
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(1),
        Object::Integer(0),
        Object::Integer(0),
    ]));
    xobject_dict.set("Resources", Object::Dictionary(overlay.resources));

    doc.add_object(Stream::new(xobject_dict, overlay.content))
}
