// SPDX-License-Identifier: GPL-3.0-only

//! PNG encoding for captured photos
//!
//! Encoding is CPU-bound and runs on the blocking pool so the engine task
//! keeps sampling while a photo is being written.

use crate::errors::{BoothError, BoothResult};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

/// Encoded image data
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
}

/// Encode synchronously
pub fn encode_png(image: &RgbaImage) -> BoothResult<Vec<u8>> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}

/// Encode on the blocking pool
pub async fn encode_png_async(image: Arc<RgbaImage>) -> BoothResult<EncodedImage> {
    let (width, height) = image.dimensions();
    let data = tokio::task::spawn_blocking(move || encode_png(&image))
        .await
        .map_err(|e| BoothError::Encoding(format!("encoding task error: {}", e)))??;

    debug!(width, height, size = data.len(), "PNG encoded");
    Ok(EncodedImage {
        data: Arc::new(data),
        width,
        height,
    })
}
