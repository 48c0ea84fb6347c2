// SPDX-License-Identifier: MPL-2.0

//! Error types for the booth

use std::fmt;

/// Result type alias using BoothError
pub type BoothResult<T> = Result<T, BoothError>;

/// Main booth error type
///
/// Perception and camera variants are fatal to the running session: the
/// engine stops evaluating triggers until initialization is retried.
/// Upload failures are scoped to a single photo.
#[derive(Debug, Clone, PartialEq)]
pub enum BoothError {
    /// Landmark detection library could not be loaded
    PerceptionLibraryUnavailable(String),
    /// The user or system refused camera access
    CameraPermissionDenied,
    /// No capture device present
    CameraNotFound,
    /// Device present but the driver or pipeline failed
    CameraDriverFault(String),
    /// A share upload failed (non-fatal, per photo)
    UploadFailure(String),
    /// Configuration errors
    Config(String),
    /// Image encoding errors
    Encoding(String),
    /// Storage/filesystem errors
    Storage(String),
}

/// How a fatal error is presented to the person at the kiosk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPresentation {
    /// Short headline
    pub title: &'static str,
    /// Explanation shown under the headline
    pub details: String,
    /// Status bar label while the error is active
    pub status: &'static str,
    /// Line written to the session log
    pub log_line: &'static str,
}

impl BoothError {
    /// Whether this error halts the capture engine until retried
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BoothError::PerceptionLibraryUnavailable(_)
                | BoothError::CameraPermissionDenied
                | BoothError::CameraNotFound
                | BoothError::CameraDriverFault(_)
        )
    }

    /// User-facing presentation, or `None` for errors that never reach the kiosk screen
    pub fn presentation(&self) -> Option<ErrorPresentation> {
        let presentation = match self {
            BoothError::PerceptionLibraryUnavailable(msg) => ErrorPresentation {
                title: "MEDIAPIPE_LOAD_FAIL",
                details: format!("CRITICAL_LIBRARIES_NOT_FOUND: {}", msg),
                status: "CORE_FAILURE",
                log_line: "MEDIAPIPE_LOAD_FAIL",
            },
            BoothError::CameraPermissionDenied => ErrorPresentation {
                title: "PERMISSION_DENIED",
                details: "The booth needs access to the camera. Grant access to the video \
                          device and retry."
                    .to_string(),
                status: "ACCESS_BLOCKED",
                log_line: "CAMERA_PERMISSION_DENIED: ACTION_REQUIRED",
            },
            BoothError::CameraNotFound => ErrorPresentation {
                title: "HARDWARE_NOT_FOUND",
                details: "No compatible camera detected. Check cables.".to_string(),
                status: "HARDWARE_FAULT",
                log_line: "HARDWARE_DISCONNECTED: NO_CAM_FOUND",
            },
            BoothError::CameraDriverFault(msg) => ErrorPresentation {
                title: "CAMERA_INIT_FAIL",
                details: format!("Unexpected driver fault: {}", msg),
                status: "HARDWARE_FAULT",
                log_line: "CRITICAL_INIT_FAULT: CONTACT_ADMIN",
            },
            _ => return None,
        };
        Some(presentation)
    }
}

impl fmt::Display for BoothError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoothError::PerceptionLibraryUnavailable(msg) => {
                write!(f, "Perception library unavailable: {}", msg)
            }
            BoothError::CameraPermissionDenied => write!(f, "Camera permission denied"),
            BoothError::CameraNotFound => write!(f, "No camera device found"),
            BoothError::CameraDriverFault(msg) => write!(f, "Camera driver fault: {}", msg),
            BoothError::UploadFailure(msg) => write!(f, "Upload failed: {}", msg),
            BoothError::Config(msg) => write!(f, "Configuration error: {}", msg),
            BoothError::Encoding(msg) => write!(f, "Encoding error: {}", msg),
            BoothError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for BoothError {}

impl From<std::io::Error> for BoothError {
    fn from(err: std::io::Error) -> Self {
        BoothError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for BoothError {
    fn from(err: serde_json::Error) -> Self {
        BoothError::Config(err.to_string())
    }
}

impl From<image::ImageError> for BoothError {
    fn from(err: image::ImageError) -> Self {
        BoothError::Encoding(err.to_string())
    }
}

impl From<reqwest::Error> for BoothError {
    fn from(err: reqwest::Error) -> Self {
        BoothError::UploadFailure(err.to_string())
    }
}
