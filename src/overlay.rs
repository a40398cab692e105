//! Frame annotation for the local preview.
//!
//! Unique regions are drawn as green rectangles two pixels thick. The info
//! line is rendered by the display, which owns the font.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::detect::Region;
use crate::observation::CrowdObservation;

pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const BOX_THICKNESS: u32 = 2;

/// Draw every region onto `image` in place.
///
/// Zero-sized regions and regions whose origin does not fit an `i32` are
/// skipped; parts of a box outside the image are clipped.
pub fn draw_regions(image: &mut RgbImage, regions: &[Region]) {
    for region in regions {
        let (Ok(x), Ok(y)) = (i32::try_from(region.x), i32::try_from(region.y)) else {
            continue;
        };
        for inset in 0..BOX_THICKNESS {
            let width = region.width.saturating_sub(inset * 2);
            let height = region.height.saturating_sub(inset * 2);
            if width == 0 || height == 0 {
                break;
            }
            let rect = Rect::at(x.saturating_add(inset as i32), y.saturating_add(inset as i32))
                .of_size(width, height);
            draw_hollow_rect_mut(image, rect, BOX_COLOR);
        }
    }
}

/// Preview text, e.g. `People: 3 | Confidence: 30.0%`.
pub fn info_text(observation: &CrowdObservation) -> String {
    format!(
        "People: {} | Confidence: {:.1}%",
        observation.count, observation.confidence
    )
}
