// SPDX-License-Identifier: MPL-2.0

//! Building a [`CapturedPhoto`] from the composited frame

use super::encoding::encode_png_async;
use crate::errors::BoothResult;
use crate::gallery::{CapturedPhoto, PhotoId, PhotoMetadata, PhotoStatus};
use chrono::Utc;
use image::RgbaImage;
use std::sync::Arc;
use tracing::info;

/// Confidence recorded for gesture-triggered captures
pub const TRIGGER_CONFIDENCE: f32 = 1.0;

/// Snapshot of what to capture, taken on the trigger tick
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub id: PhotoId,
    pub image: Arc<RgbaImage>,
    pub resolution: String,
}

impl CaptureRequest {
    pub fn new(image: Arc<RgbaImage>, resolution: impl Into<String>) -> Self {
        Self {
            id: PhotoId::new(),
            image,
            resolution: resolution.into(),
        }
    }

    /// Photo record for the roll, status `Uploading`, PNG not yet encoded
    pub fn pending_photo(&self) -> CapturedPhoto {
        CapturedPhoto {
            id: self.id,
            image: Arc::clone(&self.image),
            png: Arc::default(),
            captured_at: Utc::now(),
            status: PhotoStatus::Uploading,
            share_url: None,
            metadata: PhotoMetadata {
                confidence: TRIGGER_CONFIDENCE,
                resolution: self.resolution.clone(),
            },
        }
    }
}

/// PNG bytes for a captured frame
pub async fn encode_capture(id: PhotoId, image: Arc<RgbaImage>) -> BoothResult<Arc<Vec<u8>>> {
    let encoded = encode_png_async(image).await?;
    info!(
        %id,
        width = encoded.width,
        height = encoded.height,
        bytes = encoded.data.len(),
        "Photo encoded"
    );
    Ok(encoded.data)
}

/// Encode the frame and assemble the complete photo record
pub async fn capture_photo(request: CaptureRequest) -> BoothResult<CapturedPhoto> {
    let mut photo = request.pending_photo();
    photo.png = encode_capture(request.id, request.image).await?;
    Ok(photo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_capture_builds_uploading_record() {
        let request = CaptureRequest::new(Arc::new(RgbaImage::new(4, 4)), "1280x720");
        let id = request.id;
        let photo = capture_photo(request).await.unwrap();
        assert_eq!(photo.id, id);
        assert_eq!(photo.status, PhotoStatus::Uploading);
        assert!(photo.share_url.is_none());
        assert_eq!(photo.metadata.confidence, 1.0);
        assert_eq!(photo.metadata.resolution, "1280x720");
        assert!(photo.is_encoded());
    }

    #[test]
    fn test_pending_photo_has_no_png_yet() {
        let request = CaptureRequest::new(Arc::new(RgbaImage::new(4, 4)), "4x4");
        let photo = request.pending_photo();
        assert_eq!(photo.id, request.id);
        assert_eq!(photo.status, PhotoStatus::Uploading);
        assert!(!photo.is_encoded());
    }
}
