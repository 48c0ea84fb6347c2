// SPDX-License-Identifier: MPL-2.0

//! Landmark types reported by the perception collaborators
//!
//! Coordinates are normalized (0.0 to 1.0) relative to the frame the detector
//! was given, with y growing downwards. The detector owns the index scheme;
//! index constants live in [`crate::constants::landmarks`].

use serde::{Deserialize, Serialize};

/// A single landmark point
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Planar distance, ignoring depth
    pub fn distance_2d(&self, other: &Landmark) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A rectangular region within a frame
///
/// Coordinates are normalized (0.0 to 1.0) relative to the frame dimensions,
/// so the overlay can be mapped onto any output size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRegion {
    /// Left edge (0.0 = left of frame, 1.0 = right of frame)
    pub x: f32,
    /// Top edge (0.0 = top of frame, 1.0 = bottom of frame)
    pub y: f32,
    /// Width as fraction of frame width
    pub width: f32,
    /// Height as fraction of frame height
    pub height: f32,
}

impl FrameRegion {
    /// Mirror horizontally (selfie view)
    pub fn mirrored(&self) -> Self {
        Self {
            x: 1.0 - self.x - self.width,
            ..*self
        }
    }

    /// Pixel-space bounds `(min_x, min_y, max_x, max_y)` for a frame size
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> (i32, i32, i32, i32) {
        let fw = frame_width as f32;
        let fh = frame_height as f32;
        (
            (self.x * fw).round() as i32,
            (self.y * fh).round() as i32,
            ((self.x + self.width) * fw).round() as i32,
            ((self.y + self.height) * fh).round() as i32,
        )
    }
}

/// One detected hand or face: an ordered sequence of landmarks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    pub points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Tight bounding box around every landmark
    pub fn bounds(&self) -> Option<FrameRegion> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(FrameRegion {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }
}
