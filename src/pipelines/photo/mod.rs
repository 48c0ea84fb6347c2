// SPDX-License-Identifier: MPL-2.0

//! Async photo capture pipeline
//!
//! ```text
//! Composited frame → PNG encoding (blocking pool) → CapturedPhoto → upload
//!        ↓
//! Rendering and sampling continue uninterrupted
//! ```

pub mod capture;
pub mod encoding;

pub use capture::{CaptureRequest, capture_photo, encode_capture};
pub use encoding::{EncodedImage, encode_png, encode_png_async};
