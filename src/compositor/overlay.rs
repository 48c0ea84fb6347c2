// SPDX-License-Identifier: MPL-2.0

//! Overlay primitives drawn over the graded frame

use crate::constants::render::{
    RETICLE_ARM, RETICLE_OFFSET, RETICLE_STROKE, TAG_ALPHA, TAG_GAP, TAG_HEIGHT, TAG_WIDTH,
};
use image::{Rgba, RgbaImage};

/// Score bar inset inside the tag plate
const BAR_INSET: i32 = 8;
const BAR_HEIGHT: i32 = 4;

/// Pixel rectangle, may extend past the image edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Intersection with the image, as `(x0, y0, x1, y1)` exclusive
    fn clip(&self, image: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.width).min(image.width() as i32);
        let y1 = (self.y + self.height).min(image.height() as i32);
        (x0 < x1 && y0 < y1).then_some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

pub fn fill_rect(image: &mut RgbaImage, rect: PixelRect, color: [u8; 3]) {
    let Some((x0, y0, x1, y1)) = rect.clip(image) else {
        return;
    };
    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x, y, Rgba([color[0], color[1], color[2], 255]));
        }
    }
}

/// Source-over blend of a flat colour
pub fn blend_rect(image: &mut RgbaImage, rect: PixelRect, color: [u8; 3], alpha: f32) {
    let Some((x0, y0, x1, y1)) = rect.clip(image) else {
        return;
    };
    let alpha = alpha.clamp(0.0, 1.0);
    for y in y0..y1 {
        for x in x0..x1 {
            let px = image.get_pixel_mut(x, y);
            for c in 0..3 {
                let v = color[c] as f32 * alpha + px[c] as f32 * (1.0 - alpha);
                px[c] = v.round() as u8;
            }
        }
    }
}

/// Horizontal stroke centred on `y`
fn hline(image: &mut RgbaImage, x0: i32, x1: i32, y: i32, color: [u8; 3]) {
    let half = RETICLE_STROKE / 2;
    let (a, b) = (x0.min(x1), x0.max(x1));
    fill_rect(
        image,
        PixelRect::new(a - half, y - half, b - a + RETICLE_STROKE, RETICLE_STROKE),
        color,
    );
}

/// Vertical stroke centred on `x`
fn vline(image: &mut RgbaImage, x: i32, y0: i32, y1: i32, color: [u8; 3]) {
    let half = RETICLE_STROKE / 2;
    let (a, b) = (y0.min(y1), y0.max(y1));
    fill_rect(
        image,
        PixelRect::new(x - half, a - half, RETICLE_STROKE, b - a + RETICLE_STROKE),
        color,
    );
}

/// Corner brackets around a box given as `(min_x, min_y, max_x, max_y)`
pub fn draw_reticle(image: &mut RgbaImage, bounds: (i32, i32, i32, i32), color: [u8; 3]) {
    let left = bounds.0 - RETICLE_OFFSET;
    let top = bounds.1 - RETICLE_OFFSET;
    let right = bounds.2 + RETICLE_OFFSET;
    let bottom = bounds.3 + RETICLE_OFFSET;
    let arm = RETICLE_ARM;

    // top-left
    vline(image, left, top + arm, top, color);
    hline(image, left, left + arm, top, color);
    // top-right
    hline(image, right - arm, right, top, color);
    vline(image, right, top, top + arm, color);
    // bottom-left
    vline(image, left, bottom - arm, bottom, color);
    hline(image, left, left + arm, bottom, color);
    // bottom-right
    hline(image, right - arm, right, bottom, color);
    vline(image, right, bottom, bottom - arm, color);
}

/// Translucent status plate above the reticle with a score bar
pub fn draw_tag(image: &mut RgbaImage, bounds: (i32, i32, i32, i32), score: f32, color: [u8; 3]) {
    let plate = PixelRect::new(
        bounds.0 - RETICLE_OFFSET,
        bounds.1 - RETICLE_OFFSET - TAG_GAP,
        TAG_WIDTH as i32,
        TAG_HEIGHT as i32,
    );
    blend_rect(image, plate, [0, 0, 0], TAG_ALPHA);

    let track = plate.width - 2 * BAR_INSET;
    let filled = (track as f32 * score.clamp(0.0, 100.0) / 100.0).round() as i32;
    if filled > 0 {
        fill_rect(
            image,
            PixelRect::new(
                plate.x + BAR_INSET,
                plate.y + (plate.height - BAR_HEIGHT) / 2,
                filled,
                BAR_HEIGHT,
            ),
            color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREEN: [u8; 3] = [0x39, 0xff, 0x14];

    fn canvas() -> RgbaImage {
        RgbaImage::from_pixel(400, 300, Rgba([100, 100, 100, 255]))
    }

    fn rgb(image: &RgbaImage, x: u32, y: u32) -> [u8; 3] {
        let p = image.get_pixel(x, y);
        [p[0], p[1], p[2]]
    }

    #[test]
    fn test_reticle_corners() {
        let mut image = canvas();
        draw_reticle(&mut image, (100, 100, 200, 180), GREEN);
        // Corners sit RETICLE_OFFSET outside the box
        assert_eq!(rgb(&image, 70, 70), GREEN);
        assert_eq!(rgb(&image, 230, 70), GREEN);
        assert_eq!(rgb(&image, 70, 210), GREEN);
        assert_eq!(rgb(&image, 230, 210), GREEN);
        // Arms end after RETICLE_ARM pixels
        assert_eq!(rgb(&image, 70 + 19, 70), GREEN);
        assert_eq!(rgb(&image, 70 + 25, 70), [100, 100, 100]);
        // Box interior untouched
        assert_eq!(rgb(&image, 150, 140), [100, 100, 100]);
    }

    #[test]
    fn test_reticle_clipped_at_edges() {
        let mut image = canvas();
        draw_reticle(&mut image, (-50, -50, 500, 500), GREEN);
        assert_eq!(rgb(&image, 200, 150), [100, 100, 100]);
    }

    #[test]
    fn test_tag_plate_darkens_and_bar_scales() {
        let mut image = canvas();
        draw_tag(&mut image, (100, 100, 200, 180), 50.0, GREEN);
        let plate_y = (100 - RETICLE_OFFSET - TAG_GAP) as u32;
        let plate_x = (100 - RETICLE_OFFSET) as u32;
        // 100 * 0.4 = 40
        assert_eq!(rgb(&image, plate_x + 1, plate_y + 1), [40, 40, 40]);
        // Half of the 104 px track is filled
        let bar_y = plate_y + 7;
        assert_eq!(rgb(&image, plate_x + 8, bar_y), GREEN);
        assert_eq!(rgb(&image, plate_x + 8 + 51, bar_y), GREEN);
        assert_eq!(rgb(&image, plate_x + 8 + 53, bar_y), [40, 40, 40]);
    }
}
