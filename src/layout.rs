//! Page layout calculations
//!
//! All values are PDF points (1/72 inch) with the origin at the bottom-left
//! corner of the page.

/// Horizontal shift applied after centering, leaving room for a signature line
pub const STAMP_OFFSET_X: f32 = 90.0;

/// Vertical shift applied after centering
pub const STAMP_OFFSET_Y: f32 = -10.0;

/// Page dimensions in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDimensions {
    pub width: f32,
    pub height: f32,
}

impl PageDimensions {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// US Letter size (8.5" × 11"), the size of every overlay canvas
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self::new(595.28, 841.89)
    }

    /// Build dimensions from a MediaBox `[llx lly urx ury]`
    pub fn from_media_box(media_box: [f32; 4]) -> Self {
        let [llx, lly, urx, ury] = media_box;
        Self::new((urx - llx).abs(), (ury - lly).abs())
    }
}

/// Where and how large the stamp is drawn on a page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Left edge of the stamp
    pub x: f32,
    /// Bottom edge of the stamp
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Placement {
    /// True when every coordinate is a finite number
    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }
}

/// Size of the stamp in points for an image of `pixel_width` × `pixel_height`
pub fn scaled_size(pixel_width: u32, pixel_height: u32, scale: f32) -> (f32, f32) {
    (pixel_width as f32 * scale, pixel_height as f32 * scale)
}

/// Compute the stamp placement on a page
///
/// The stamp is centered on the page, then shifted by [`STAMP_OFFSET_X`] and
/// [`STAMP_OFFSET_Y`]:
///
/// ```text
/// x = (page_width  - stamp_width)  / 2 + 90
/// y = (page_height - stamp_height) / 2 - 10
/// ```
pub fn compute_placement(page: &PageDimensions, stamp_width: f32, stamp_height: f32) -> Placement {
    Placement {
        x: (page.width - stamp_width) / 2.0 + STAMP_OFFSET_X,
        y: (page.height - stamp_height) / 2.0 + STAMP_OFFSET_Y,
        width: stamp_width,
        height: stamp_height,
    }
}

/// Compute the stamp placement on a page with MediaBox `[llx lly urx ury]`
///
/// The formula of [`compute_placement`] is applied inside the box, so a box
/// whose lower-left corner is not at the origin moves the stamp with it.
pub fn placement_in_media_box(
    media_box: [f32; 4],
    stamp_width: f32,
    stamp_height: f32,
) -> Placement {
    let [llx, lly, urx, ury] = media_box;
    let page = PageDimensions::from_media_box(media_box);
    let placement = compute_placement(&page, stamp_width, stamp_height);

    Placement {
        x: placement.x + llx.min(urx),
        y: placement.y + lly.min(ury),
        ..placement
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_letter_size() {
        let letter = PageDimensions::letter();
        assert_eq!(letter.width, 612.0);
        assert_eq!(letter.height, 792.0);
    }

    #[test]
    fn test_scaled_size() {
        let (w, h) = scaled_size(200, 100, 0.5);
        assert!(approx(w, 100.0));
        assert!(approx(h, 50.0));
    }

    #[test]
    fn test_placement_on_letter_page() {
        let placement = compute_placement(&PageDimensions::letter(), 100.0, 50.0);
        assert!(approx(placement.x, 346.0));
        assert!(approx(placement.y, 361.0));
        assert!(approx(placement.width, 100.0));
        assert!(approx(placement.height, 50.0));
    }

    #[test]
    fn test_placement_matches_formula_for_a4() {
        let page = PageDimensions::a4();
        let (w, h) = scaled_size(640, 480, 0.35);
        let placement = compute_placement(&page, w, h);

        assert!(approx(placement.x, (page.width - w) / 2.0 + 90.0));
        assert!(approx(placement.y, (page.height - h) / 2.0 - 10.0));
    }

    #[test]
    fn test_placement_can_go_negative_for_large_stamp() {
        let placement = compute_placement(&PageDimensions::letter(), 1000.0, 1000.0);
        assert!(approx(placement.x, -104.0));
        assert!(approx(placement.y, -114.0));
        assert!(placement.is_finite());
    }

    #[test]
    fn test_from_media_box_with_offset_origin() {
        let dims = PageDimensions::from_media_box([10.0, 20.0, 622.0, 812.0]);
        assert_eq!(dims, PageDimensions::letter());
    }

    #[test]
    fn test_placement_in_box_at_origin_matches_formula() {
        let placement = placement_in_media_box([0.0, 0.0, 612.0, 792.0], 100.0, 50.0);
        assert_eq!(placement, compute_placement(&PageDimensions::letter(), 100.0, 50.0));
    }

    #[test]
    fn test_placement_follows_offset_origin() {
        let placement = placement_in_media_box([100.0, 100.0, 712.0, 892.0], 100.0, 50.0);
        assert!(approx(placement.x, 446.0));
        assert!(approx(placement.y, 461.0));
        assert!(approx(placement.width, 100.0));
        assert!(approx(placement.height, 50.0));
    }

    #[test]
    fn test_placement_with_flipped_corners() {
        let placement = placement_in_media_box([712.0, 892.0, 100.0, 100.0], 100.0, 50.0);
        assert!(approx(placement.x, 446.0));
        assert!(approx(placement.y, 461.0));
    }
}
