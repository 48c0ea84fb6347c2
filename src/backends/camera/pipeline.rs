// SPDX-License-Identifier: MPL-2.0

//! V4L2 capture through a GStreamer appsink pipeline
//!
//! `v4l2src ! videoconvert ! videoscale ! video/x-raw,format=RGBA ! appsink`
//!
//! The device node is probed before the pipeline is built so the common
//! failures (no camera, no permission) are reported precisely instead of as a
//! generic pipeline error.

use super::CameraSource;
use super::types::{CameraFrame, FrameReceiver, FrameSender, frame_channel};
use crate::constants::pipeline;
use crate::errors::{BoothError, BoothResult};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use image::RgbaImage;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Check that a device node exists and can be opened for reading
pub fn probe_device(path: &Path) -> BoothResult<()> {
    match std::fs::OpenOptions::new().read(true).open(path) {
        Ok(_) => Ok(()),
        Err(e) => match e.kind() {
            ErrorKind::NotFound => Err(BoothError::CameraNotFound),
            ErrorKind::PermissionDenied => Err(BoothError::CameraPermissionDenied),
            _ => Err(BoothError::CameraDriverFault(format!(
                "{}: {}",
                path.display(),
                e
            ))),
        },
    }
}

/// Map a GStreamer bus error onto the camera error taxonomy
fn classify_bus_error(err: &gstreamer::message::Error) -> BoothError {
    let error = err.error();
    let details = match err.debug() {
        Some(debug) => format!("{} ({})", error, debug),
        None => error.to_string(),
    };

    match error.kind::<gstreamer::ResourceError>() {
        Some(gstreamer::ResourceError::NotFound) => return BoothError::CameraNotFound,
        Some(gstreamer::ResourceError::NotAuthorized) => {
            return BoothError::CameraPermissionDenied;
        }
        _ => {}
    }

    if details.to_lowercase().contains("permission denied") {
        BoothError::CameraPermissionDenied
    } else {
        BoothError::CameraDriverFault(details)
    }
}

/// Copy an RGBA buffer row by row, dropping stride padding
fn copy_rgba_rows(data: &[u8], width: u32, height: u32, stride: usize) -> Option<RgbaImage> {
    let row_bytes = width as usize * 4;
    if stride < row_bytes {
        return None;
    }
    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(data.get(start..start + row_bytes)?);
    }
    RgbaImage::from_raw(width, height, pixels)
}

/// A running capture pipeline; dropping it releases the device
struct CapturePipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
}

impl CapturePipeline {
    fn launch(device: &str, width: u32, height: u32, sender: FrameSender) -> BoothResult<Self> {
        gstreamer::init().map_err(|e| BoothError::CameraDriverFault(e.to_string()))?;

        let description = format!(
            "v4l2src device={} ! videoconvert ! videoscale ! \
             video/x-raw,format={},width={},height={} ! appsink name=sink",
            device,
            pipeline::OUTPUT_FORMAT,
            width,
            height
        );
        debug!(pipeline = %description, "Launching capture pipeline");

        let element = gstreamer::parse::launch(&description)
            .map_err(|e| BoothError::CameraDriverFault(format!("pipeline: {}", e)))?;
        let gst_pipeline = element
            .dynamic_cast::<gstreamer::Pipeline>()
            .map_err(|_| BoothError::CameraDriverFault("not a pipeline".into()))?;

        let appsink = gst_pipeline
            .by_name("sink")
            .ok_or_else(|| BoothError::CameraDriverFault("missing appsink".into()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| BoothError::CameraDriverFault("sink is not an appsink".into()))?;

        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);

        let sequence = Arc::new(AtomicU64::new(0));
        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let sample = appsink.pull_sample().map_err(|_| gstreamer::FlowError::Eos)?;
                    let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
                    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
                    let info =
                        VideoInfo::from_caps(caps).map_err(|_| gstreamer::FlowError::Error)?;
                    let map = buffer
                        .map_readable()
                        .map_err(|_| gstreamer::FlowError::Error)?;

                    let Some(image) = copy_rgba_rows(
                        map.as_slice(),
                        info.width(),
                        info.height(),
                        info.stride()[0] as usize,
                    ) else {
                        warn!(
                            width = info.width(),
                            height = info.height(),
                            "Short buffer from capture pipeline, skipping frame"
                        );
                        return Ok(gstreamer::FlowSuccess::Ok);
                    };

                    let n = sequence.fetch_add(1, Ordering::Relaxed);
                    let frame = CameraFrame::new(Arc::new(image), n);
                    let mut sender = sender.clone();
                    if let Err(e) = sender.try_send(frame) {
                        if e.is_disconnected() {
                            return Err(gstreamer::FlowError::Eos);
                        }
                        debug!(frame = n, "Frame dropped (channel full)");
                    }
                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        let capture = Self {
            pipeline: gst_pipeline,
            appsink,
        };
        capture.play()?;
        Ok(capture)
    }

    /// Set PLAYING and wait until the pipeline gets there or reports an error
    fn play(&self) -> BoothResult<()> {
        let bus = self
            .pipeline
            .bus()
            .ok_or_else(|| BoothError::CameraDriverFault("pipeline has no bus".into()))?;

        let state_change = self.pipeline.set_state(gstreamer::State::Playing);

        let deadline = Instant::now() + Duration::from_secs(pipeline::START_TIMEOUT_SECS);
        while Instant::now() < deadline {
            let Some(msg) = bus.timed_pop_filtered(
                gstreamer::ClockTime::from_mseconds(100),
                &[
                    gstreamer::MessageType::Error,
                    gstreamer::MessageType::AsyncDone,
                    gstreamer::MessageType::StateChanged,
                ],
            ) else {
                if state_change.is_err() {
                    break;
                }
                continue;
            };

            match msg.view() {
                gstreamer::MessageView::Error(err) => {
                    error!(
                        error = %err.error(),
                        debug = ?err.debug(),
                        source = ?err.src().map(|s| s.name()),
                        "Capture pipeline failed to start"
                    );
                    return Err(classify_bus_error(&err));
                }
                gstreamer::MessageView::AsyncDone(_) => return Ok(()),
                gstreamer::MessageView::StateChanged(changed)
                    if changed.src() == Some(self.pipeline.upcast_ref::<gstreamer::Object>())
                        && changed.current() == gstreamer::State::Playing =>
                {
                    return Ok(());
                }
                _ => {}
            }
        }

        match state_change {
            Ok(_) => {
                warn!("Capture pipeline did not confirm PLAYING in time, continuing");
                Ok(())
            }
            Err(e) => Err(BoothError::CameraDriverFault(format!(
                "failed to start pipeline: {}",
                e
            ))),
        }
    }
}

impl Drop for CapturePipeline {
    fn drop(&mut self) {
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!(error = %e, "Failed to stop capture pipeline");
            return;
        }
        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            pipeline::STOP_TIMEOUT_SECS,
        ));
        debug!(result = ?result, state = ?state, "Capture pipeline stopped");
    }
}

/// V4L2 camera captured through GStreamer
pub struct V4l2Camera {
    device: String,
    width: u32,
    height: u32,
    running: Option<CapturePipeline>,
}

impl V4l2Camera {
    pub fn new(device: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            device: device.into(),
            width,
            height,
            running: None,
        }
    }
}

impl CameraSource for V4l2Camera {
    fn name(&self) -> &str {
        &self.device
    }

    fn start(&mut self) -> BoothResult<FrameReceiver> {
        self.stop();
        probe_device(Path::new(&self.device))?;

        let (sender, receiver) = frame_channel(pipeline::FRAME_CHANNEL_CAPACITY);
        let capture = CapturePipeline::launch(&self.device, self.width, self.height, sender)?;
        info!(
            device = %self.device,
            width = self.width,
            height = self.height,
            "Camera streaming"
        );
        self.running = Some(capture);
        Ok(receiver)
    }

    fn stop(&mut self) {
        if self.running.take().is_some() {
            info!(device = %self.device, "Camera stopped");
        }
    }
}
