// SPDX-License-Identifier: MPL-2.0

//! Camera sources
//!
//! A [`CameraSource`] produces a stream of RGBA [`CameraFrame`]s. Starting a
//! source is where hardware problems surface; they are reported as the camera
//! variants of [`BoothError`](crate::errors::BoothError) so the engine can show
//! the matching fault screen.
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐
//! │ V4l2Camera   │   │ StillImage   │
//! │ (GStreamer)  │   │ (file loop)  │
//! └──────┬───────┘   └──────┬───────┘
//!        └────────┬─────────┘
//!                 ▼
//!          FrameReceiver → engine
//! ```

pub mod frame_loop;
pub mod pipeline;
pub mod still;
pub mod types;

pub use pipeline::V4l2Camera;
pub use still::StillImageSource;
pub use types::*;

use crate::config::BoothConfig;
use crate::errors::BoothResult;

/// A frame producer the engine can start and stop
pub trait CameraSource: Send {
    fn name(&self) -> &str;

    /// Open the device and begin streaming
    ///
    /// Calling `start` on a running source restarts it.
    fn start(&mut self) -> BoothResult<FrameReceiver>;

    /// Release the device; the receiver returned by `start` ends
    fn stop(&mut self);
}

/// Build the source selected by the configuration
pub fn from_config(config: &BoothConfig) -> Box<dyn CameraSource> {
    match &config.still_image {
        Some(path) => Box::new(StillImageSource::new(
            path.clone(),
            config.frame_width,
            config.frame_height,
        )),
        None => Box::new(V4l2Camera::new(
            config.camera_device.clone(),
            config.frame_width,
            config.frame_height,
        )),
    }
}
