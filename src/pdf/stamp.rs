//! Stamp image decoding
//!
//! The stamp is decoded once per document and kept as raw samples, ready to be
//! written as an Image XObject into each overlay. An alpha channel becomes a
//! soft mask so the transparent parts of the stamp leave the page visible.

use std::io::ErrorKind;
use std::path::Path;

use image::DynamicImage;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::layout::scaled_size;

/// A decoded stamp image
#[derive(Debug, Clone, PartialEq)]
pub struct StampImage {
    width: u32,
    height: u32,
    /// 8-bit RGB samples, row by row
    rgb: Vec<u8>,
    /// 8-bit alpha samples; `None` when the image is fully opaque
    alpha: Option<Vec<u8>>,
}

impl StampImage {
    /// Read and decode the stamp image at `path`
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => Error::StampNotFound(path.to_path_buf()),
            _ => Error::StampUnreadable {
                path: path.to_path_buf(),
                detail: err.to_string(),
            },
        })?;

        let image = image::load_from_memory(&bytes).map_err(|err| Error::StampUnreadable {
            path: path.to_path_buf(),
            detail: err.to_string(),
        })?;

        if image.width() == 0 || image.height() == 0 {
            return Err(Error::StampUnreadable {
                path: path.to_path_buf(),
                detail: "image has no pixels".to_string(),
            });
        }

        let stamp = Self::from_image(&image);
        debug!(
            width = stamp.width,
            height = stamp.height,
            alpha = stamp.has_alpha(),
            "Stamp image decoded"
        );
        Ok(stamp)
    }

    /// Convert an already decoded image
    pub fn from_image(image: &DynamicImage) -> Self {
        let alpha = if image.color().has_alpha() {
            let samples: Vec<u8> = image.to_rgba8().pixels().map(|pixel| pixel.0[3]).collect();
            // An alpha channel that is opaque everywhere needs no mask
            samples.iter().any(|&a| a != u8::MAX).then_some(samples)
        } else {
            None
        };

        Self {
            width: image.width(),
            height: image.height(),
            rgb: image.to_rgb8().into_raw(),
            alpha,
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn has_alpha(&self) -> bool {
        self.alpha.is_some()
    }

    /// Rendered size in points at the given scale
    pub fn scaled_size(&self, scale: f32) -> (f32, f32) {
        scaled_size(self.width, self.height, scale)
    }

    /// Add the image (and its soft mask) to `doc`, returning the image object
    pub fn add_to(&self, doc: &mut Document) -> ObjectId {
        let mut image_dict = self.image_dictionary(b"DeviceRGB");

        if let Some(alpha) = &self.alpha {
            let mask_id = doc.add_object(Stream::new(
                self.image_dictionary(b"DeviceGray"),
                alpha.clone(),
            ));
            image_dict.set("SMask", Object::Reference(mask_id));
        }

        doc.add_object(Stream::new(image_dict, self.rgb.clone()))
    }

    fn image_dictionary(&self, color_space: &[u8]) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(self.width as i64));
        dict.set("Height", Object::Integer(self.height as i64));
        dict.set("ColorSpace", Object::Name(color_space.to_vec()));
        dict.set("BitsPerComponent", Object::Integer(8));
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use std::path::PathBuf;

    fn translucent_stamp() -> StampImage {
        let mut image = RgbaImage::from_pixel(4, 2, Rgba([0, 0, 255, 255]));
        image.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        StampImage::from_image(&DynamicImage::ImageRgba8(image))
    }

    #[test]
    fn test_alpha_channel_kept_as_mask() {
        let stamp = translucent_stamp();
        assert_eq!(stamp.width(), 4);
        assert_eq!(stamp.height(), 2);
        assert!(stamp.has_alpha());
        assert_eq!(stamp.rgb.len(), 4 * 2 * 3);
        assert_eq!(stamp.alpha.as_ref().map(Vec::len), Some(8));
    }

    #[test]
    fn test_opaque_images_have_no_mask() {
        let rgb = RgbImage::from_pixel(3, 3, Rgb([10, 20, 30]));
        assert!(!StampImage::from_image(&DynamicImage::ImageRgb8(rgb)).has_alpha());

        let opaque = RgbaImage::from_pixel(3, 3, Rgba([10, 20, 30, 255]));
        assert!(!StampImage::from_image(&DynamicImage::ImageRgba8(opaque)).has_alpha());
    }

    #[test]
    fn test_add_to_links_soft_mask() {
        let mut doc = Document::with_version("1.5");
        let image_id = translucent_stamp().add_to(&mut doc);

        let image = doc.get_object(image_id).and_then(Object::as_stream).expect("image stream");
        assert_eq!(image.dict.get(b"Width").and_then(Object::as_i64).ok(), Some(4));
        let mask_id = image.dict.get(b"SMask").and_then(Object::as_reference).expect("smask");

        let mask = doc.get_object(mask_id).and_then(Object::as_stream).expect("mask stream");
        assert_eq!(mask.content.len(), 8);
    }

    #[test]
    fn test_scaled_size() {
        let stamp = translucent_stamp();
        assert_eq!(stamp.scaled_size(2.0), (8.0, 4.0));
    }

    #[test]
    fn test_open_missing_file() {
        let result = StampImage::open(&PathBuf::from("does/not/exist.png"));
        assert!(matches!(result, Err(Error::StampNotFound(_))));
    }

    #[test]
    fn test_open_garbage_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("stamp.png");
        std::fs::write(&path, b"definitely not a png").expect("write");

        let result = StampImage::open(&path);
        assert!(matches!(result, Err(Error::StampUnreadable { .. })));
    }
}
