// SPDX-License-Identifier: MPL-2.0

//! Hardware backends
//!
//! - [`camera`]: frame sources (V4L2 through GStreamer, or a still image)

pub mod camera;
