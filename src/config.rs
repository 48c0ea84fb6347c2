// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{app_info, hold, landmarks, lockout, pipeline, render, share};
use crate::errors::{BoothError, BoothResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Colour grade applied to every rendered frame
///
/// Values follow CSS filter semantics: 1.0 leaves the channel untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorGrade {
    /// Contrast multiplier around mid-grey
    pub contrast: f32,
    /// Brightness multiplier
    pub brightness: f32,
    /// Saturation multiplier
    pub saturation: f32,
    /// Hue rotation in degrees
    pub hue_rotate_degrees: f32,
}

impl Default for ColorGrade {
    fn default() -> Self {
        Self {
            contrast: 1.2,
            brightness: 1.05,
            saturation: 1.1,
            hue_rotate_degrees: 280.0,
        }
    }
}

/// Smile score calibration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmileCalibration {
    /// Mouth/face ratio that maps to 0
    pub neutral_ratio: f32,
    /// Mouth/face ratio that maps to 100
    pub full_ratio: f32,
    /// Score strictly above which a face is smiling
    pub threshold: f32,
}

impl Default for SmileCalibration {
    fn default() -> Self {
        Self {
            neutral_ratio: landmarks::SMILE_RATIO_NEUTRAL,
            full_ratio: landmarks::SMILE_RATIO_FULL,
            threshold: landmarks::SMILE_THRESHOLD,
        }
    }
}

/// Booth configuration
///
/// Every field has a default, so a partial JSON file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoothConfig {
    /// Capture device path (V4L2)
    pub camera_device: String,
    /// Loop this image instead of a live camera (kiosk demos)
    pub still_image: Option<PathBuf>,
    /// Capture and output width
    pub frame_width: u32,
    /// Capture and output height
    pub frame_height: u32,
    /// Mirror the preview horizontally (selfie mode)
    pub mirror_preview: bool,
    /// Colour grade for the live feed
    pub grade: ColorGrade,
    /// Smile calibration
    pub smile: SmileCalibration,
    /// Hold duration before capture, in milliseconds
    pub required_hold_ms: u64,
    /// Hold sampling tick, in milliseconds
    pub sample_interval_ms: u64,
    /// Tolerated predicate dropout while holding, in milliseconds
    pub hold_grace_ms: u64,
    /// Post-capture lockout in seconds
    pub cooldown_seconds: u8,
    /// Render cadence, in milliseconds
    pub render_interval_ms: u64,
    /// File host upload endpoint
    pub upload_url: String,
    /// Upload timeout in seconds
    pub upload_timeout_secs: u64,
    /// JSON-lines hand detection script for the replay detector
    pub hand_script: Option<PathBuf>,
    /// JSON-lines face detection script for the replay detector
    pub face_script: Option<PathBuf>,
    /// Replay detector latency, in milliseconds
    pub replay_latency_ms: u64,
    /// Also keep a PNG of every capture here
    pub archive_dir: Option<PathBuf>,
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            camera_device: pipeline::DEFAULT_DEVICE.to_string(),
            still_image: None,
            frame_width: render::OUTPUT_WIDTH,
            frame_height: render::OUTPUT_HEIGHT,
            mirror_preview: true, // Default to mirrored (selfie mode)
            grade: ColorGrade::default(),
            smile: SmileCalibration::default(),
            required_hold_ms: hold::REQUIRED_HOLD_MS,
            sample_interval_ms: hold::SAMPLE_INTERVAL.as_millis() as u64,
            hold_grace_ms: hold::DEFAULT_GRACE_MS,
            cooldown_seconds: lockout::COOLDOWN_SECONDS,
            render_interval_ms: render::FRAME_INTERVAL.as_millis() as u64,
            upload_url: share::UPLOAD_URL.to_string(),
            upload_timeout_secs: share::REQUEST_TIMEOUT.as_secs(),
            hand_script: None,
            face_script: None,
            replay_latency_ms: 120,
            archive_dir: None,
        }
    }
}

impl BoothConfig {
    /// Default config file location (`~/.config/gesture-booth/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(app_info::APP_DIR).join(app_info::CONFIG_FILE))
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> BoothResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded booth configuration");
        Ok(config)
    }

    /// Load from an explicit path, else the default location, else defaults
    ///
    /// An explicitly named file must exist; a missing default file is not an error.
    pub fn load_or_default(explicit: Option<&Path>) -> BoothResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            Some(path) => {
                info!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            None => {
                warn!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write configuration as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> BoothResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values that would stall or divide by zero
    pub fn validate(&self) -> BoothResult<()> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(BoothError::Config("frame size must be non-zero".into()));
        }
        if self.sample_interval_ms == 0 || self.render_interval_ms == 0 {
            return Err(BoothError::Config("timer intervals must be non-zero".into()));
        }
        if self.cooldown_seconds == 0 {
            return Err(BoothError::Config(
                "cooldown_seconds must be at least 1".into(),
            ));
        }
        if self.required_hold_ms == 0 {
            return Err(BoothError::Config("required_hold_ms must be non-zero".into()));
        }
        if self.smile.full_ratio <= self.smile.neutral_ratio {
            return Err(BoothError::Config(
                "smile.full_ratio must exceed smile.neutral_ratio".into(),
            ));
        }
        Ok(())
    }

    /// Resolution label used in photo metadata
    pub fn resolution_label(&self) -> String {
        format!("{}x{}", self.frame_width, self.frame_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: BoothConfig =
            serde_json::from_str(r#"{ "cooldown_seconds": 5, "grade": { "contrast": 1.0 } }"#)
                .unwrap();
        assert_eq!(config.cooldown_seconds, 5);
        assert_eq!(config.grade.contrast, 1.0);
        assert_eq!(config.grade.hue_rotate_degrees, 280.0);
        assert_eq!(config.required_hold_ms, 1400);
    }

    #[test]
    fn test_validate_rejects_inverted_smile_range() {
        let mut config = BoothConfig::default();
        config.smile.full_ratio = 0.3;
        assert!(matches!(config.validate(), Err(BoothError::Config(_))));
    }

    #[test]
    fn test_resolution_label() {
        assert_eq!(BoothConfig::default().resolution_label(), "1280x720");
    }
}
