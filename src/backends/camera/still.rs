// SPDX-License-Identifier: GPL-3.0-only

//! Still-image camera source
//!
//! Streams one image file as a live feed at a fixed frame rate. Used for
//! demos and for kiosks without a camera attached.

use super::CameraSource;
use super::frame_loop::{FrameLoopController, LoopAction};
use super::types::{CameraFrame, FrameReceiver, frame_channel};
use crate::constants::pipeline;
use crate::errors::{BoothError, BoothResult};
use image::RgbaImage;
use image::imageops::FilterType;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Frame pacing for the still source
const STILL_FRAME_INTERVAL: Duration = Duration::from_millis(66);

/// Loops a single image
pub struct StillImageSource {
    path: PathBuf,
    width: u32,
    height: u32,
    producer: Option<FrameLoopController>,
}

impl StillImageSource {
    pub fn new(path: PathBuf, width: u32, height: u32) -> Self {
        Self {
            path,
            width,
            height,
            producer: None,
        }
    }

    /// Load and scale the image to the configured frame size
    fn load(&self) -> BoothResult<RgbaImage> {
        let decoded = image::open(&self.path).map_err(|e| match e {
            image::ImageError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
                BoothError::CameraNotFound
            }
            image::ImageError::IoError(io)
                if io.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                BoothError::CameraPermissionDenied
            }
            other => BoothError::CameraDriverFault(format!("{}: {}", self.path.display(), other)),
        })?;

        let rgba = decoded.to_rgba8();
        if rgba.dimensions() == (self.width, self.height) {
            return Ok(rgba);
        }
        debug!(
            from = ?rgba.dimensions(),
            to = ?(self.width, self.height),
            "Scaling still image"
        );
        Ok(image::imageops::resize(
            &rgba,
            self.width,
            self.height,
            FilterType::Triangle,
        ))
    }
}

impl CameraSource for StillImageSource {
    fn name(&self) -> &str {
        "still-image"
    }

    fn start(&mut self) -> BoothResult<FrameReceiver> {
        self.stop();

        let image = Arc::new(self.load()?);
        let (mut sender, receiver) = frame_channel(pipeline::FRAME_CHANNEL_CAPACITY);
        let mut sequence = 0u64;

        self.producer = Some(FrameLoopController::start(
            "still-image",
            STILL_FRAME_INTERVAL,
            move || {
                if sender.is_closed() {
                    return LoopAction::Stop;
                }
                // Full channel means the consumer is behind; skip this frame
                let _ = sender.try_send(CameraFrame::new(Arc::clone(&image), sequence));
                sequence += 1;
                LoopAction::Continue
            },
        ));

        info!(path = %self.path.display(), "Still image source streaming");
        Ok(receiver)
    }

    fn stop(&mut self) {
        if let Some(mut producer) = self.producer.take() {
            producer.stop();
            debug!("Still image source stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_missing_file_is_camera_not_found() {
        let mut source = StillImageSource::new(PathBuf::from("/nonexistent/booth.png"), 8, 8);
        assert_eq!(source.start().unwrap_err(), BoothError::CameraNotFound);
    }

    #[tokio::test]
    async fn test_streams_scaled_frames() {
        let path = std::env::temp_dir().join(format!("gesture-booth-still-{}.png", std::process::id()));
        RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let mut source = StillImageSource::new(path.clone(), 8, 6);
        let mut frames = source.start().unwrap();
        let first = frames.next().await.unwrap();
        let second = frames.next().await.unwrap();
        assert_eq!((first.width(), first.height()), (8, 6));
        assert!(second.sequence > first.sequence);

        source.stop();
        let _ = std::fs::remove_file(path);
    }
}
