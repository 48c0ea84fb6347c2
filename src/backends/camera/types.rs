// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera sources

use image::RgbaImage;
use std::sync::Arc;
use std::time::Instant;

/// A single RGBA frame from a camera source
///
/// Pixel data is shared; the compositor, perception and capture all hold the
/// same allocation.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub image: Arc<RgbaImage>,
    /// When the source produced the frame
    pub captured_at: Instant,
    /// Monotonic per-source frame counter
    pub sequence: u64,
}

impl CameraFrame {
    pub fn new(image: Arc<RgbaImage>, sequence: u64) -> Self {
        Self {
            image,
            captured_at: Instant::now(),
            sequence,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Frame sender type
pub type FrameSender = futures::channel::mpsc::Sender<CameraFrame>;

/// Frame receiver type
pub type FrameReceiver = futures::channel::mpsc::Receiver<CameraFrame>;

/// Bounded frame channel; producers drop frames when it is full
pub fn frame_channel(capacity: usize) -> (FrameSender, FrameReceiver) {
    futures::channel::mpsc::channel(capacity)
}
