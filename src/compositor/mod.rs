// SPDX-License-Identifier: MPL-2.0

//! Render compositor
//!
//! Turns the latest camera frame plus the latest landmark snapshot into the
//! frame shown on the kiosk: mirrored, colour graded, with a reticle and score
//! tag around every detected face. Rendering never waits for perception; the
//! snapshot may be several frames old.

pub mod grade;
pub mod overlay;

pub use grade::GradeOperator;

use crate::config::BoothConfig;
use crate::constants::render::{COLOR_IDLE, COLOR_SMILING};
use crate::perception::LandmarkSnapshot;
use image::RgbaImage;
use image::imageops;

/// Per-configuration rendering state
#[derive(Debug, Clone)]
pub struct Compositor {
    grade: GradeOperator,
    mirror: bool,
}

impl Compositor {
    pub fn new(config: &BoothConfig) -> Self {
        Self {
            grade: GradeOperator::new(&config.grade),
            mirror: config.mirror_preview,
        }
    }

    /// Mirror (selfie view) without grading or overlay
    pub fn mirror(&self, frame: &RgbaImage) -> RgbaImage {
        if self.mirror {
            imageops::flip_horizontal(frame)
        } else {
            frame.clone()
        }
    }

    /// Full composite of one frame
    pub fn render(&self, frame: &RgbaImage, snapshot: &LandmarkSnapshot) -> RgbaImage {
        let mut output = self.mirror(frame);
        self.grade.apply(&mut output);
        self.draw_overlay(&mut output, snapshot);
        output
    }

    fn draw_overlay(&self, output: &mut RgbaImage, snapshot: &LandmarkSnapshot) {
        if !snapshot.has_data() {
            return;
        }

        // One colour for every face, following the global smile predicate
        let color = if snapshot.face_predicate {
            COLOR_SMILING
        } else {
            COLOR_IDLE
        };
        let (width, height) = output.dimensions();

        for face in &snapshot.faces {
            let region = if self.mirror {
                face.bounds.mirrored()
            } else {
                face.bounds
            };
            let bounds = region.to_pixels(width, height);
            overlay::draw_reticle(output, bounds, color);
            overlay::draw_tag(output, bounds, face.score, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColorGrade;
    use crate::constants::render::RETICLE_OFFSET;
    use crate::perception::FrameRegion;
    use crate::perception::smile::FaceOverlay;
    use image::Rgba;

    fn plain_config() -> BoothConfig {
        BoothConfig {
            grade: ColorGrade {
                contrast: 1.0,
                brightness: 1.0,
                saturation: 1.0,
                hue_rotate_degrees: 0.0,
            },
            ..BoothConfig::default()
        }
    }

    fn marked_frame() -> RgbaImage {
        let mut frame = RgbaImage::from_pixel(400, 200, Rgba([0, 0, 0, 255]));
        frame.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        frame
    }

    fn snapshot_with_face(smiling: bool) -> LandmarkSnapshot {
        LandmarkSnapshot {
            face_predicate: smiling,
            face_score: 60.0,
            faces: vec![FaceOverlay {
                bounds: FrameRegion {
                    x: 0.1,
                    y: 0.4,
                    width: 0.2,
                    height: 0.3,
                },
                score: 60.0,
                smiling,
            }],
            timestamp_ms: Some(1),
            face_updated_ms: Some(1),
            ..LandmarkSnapshot::default()
        }
    }

    #[test]
    fn test_frame_is_mirrored() {
        let compositor = Compositor::new(&plain_config());
        let out = compositor.render(&marked_frame(), &LandmarkSnapshot::default());
        assert_eq!(out.get_pixel(399, 0).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_no_snapshot_no_overlay() {
        let compositor = Compositor::new(&plain_config());
        let frame = RgbaImage::from_pixel(64, 64, Rgba([9, 9, 9, 255]));
        let out = compositor.render(&frame, &LandmarkSnapshot::default());
        assert!(out.pixels().all(|p| p.0 == [9, 9, 9, 255]));
    }

    #[test]
    fn test_overlay_colour_and_mirrored_position() {
        let compositor = Compositor::new(&plain_config());
        let frame = marked_frame();

        let out = compositor.render(&frame, &snapshot_with_face(true));
        // Unmirrored box spans x 40..120; mirrored spans 280..360
        let left = 280 - RETICLE_OFFSET as u32;
        let top = 80 - RETICLE_OFFSET as u32;
        assert_eq!(&out.get_pixel(left, top).0[..3], &COLOR_SMILING);
        assert_eq!(&out.get_pixel(40 - RETICLE_OFFSET as u32 + 5, top + 5).0[..3], &[0, 0, 0]);

        let out = compositor.render(&frame, &snapshot_with_face(false));
        assert_eq!(&out.get_pixel(left, top).0[..3], &COLOR_IDLE);
    }

    #[test]
    fn test_mirror_disabled() {
        let config = BoothConfig {
            mirror_preview: false,
            ..plain_config()
        };
        let compositor = Compositor::new(&config);
        let out = compositor.render(&marked_frame(), &LandmarkSnapshot::default());
        assert_eq!(out.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }
}
