// SPDX-License-Identifier: MPL-2.0

//! Engine-owned state and the read-only view published to front ends

use crate::constants::session::BOOT_MESSAGES;
use crate::errors::BoothError;
use crate::gallery::{CapturedPhoto, PhotoId, PhotoRoll, PhotoStatus};
use crate::session_log::{LogEntry, SessionLog};
use crate::share::qr_image_url;
use crate::trigger::{HoldTrigger, Lockout};

/// Status before the first initialization attempt
pub const STATUS_LINK_ESTABLISHED: &str = "LINK_ESTABLISHED";
/// Status while detectors and camera start
pub const STATUS_INITIALIZING: &str = "INITIALIZING_OPTICS";

/// Logged when initialization begins
pub const LOG_REQUESTING_MEDIA: &str = "REQUESTING_MEDIA_ACCESS...";
/// Logged when initialization succeeds
pub const LOG_OPTICS_ACTIVE: &str = "UPLINK_STABLE: OPTICS_ACTIVE";
/// Logged when a hold completes before the camera delivered a frame
pub const LOG_CAPTURE_NO_FRAME: &str = "ERROR: CAPTURE_FAULT: NO_FRAME";

/// Everything the engine task mutates
#[derive(Debug)]
pub struct BoothState {
    pub status: &'static str,
    pub hold: HoldTrigger,
    pub lockout: Lockout,
    pub roll: PhotoRoll,
    pub log: SessionLog,
    pub error: Option<BoothError>,
    pub ready: bool,
    /// Indicator copies of the last evaluated sample
    pub hand_active: bool,
    pub face_active: bool,
    pub face_score: f32,
}

impl BoothState {
    pub fn new(hold: HoldTrigger) -> Self {
        let mut log = SessionLog::default();
        for message in BOOT_MESSAGES {
            log.push(message);
        }
        Self {
            status: STATUS_LINK_ESTABLISHED,
            hold,
            lockout: Lockout::default(),
            roll: PhotoRoll::new(),
            log,
            error: None,
            ready: false,
            hand_active: false,
            face_active: false,
            face_score: 0.0,
        }
    }

    /// Put a freshly triggered photo at the head of the roll
    pub fn record_capture(&mut self, photo: CapturedPhoto) {
        self.log.push(format!("MATCH_DETECTED: {}", photo.id));
        self.roll.prepend(photo);
    }

    /// Mark a photo whose PNG could not be produced
    ///
    /// Returns false for an unknown id.
    pub fn capture_failed(&mut self, id: PhotoId) -> bool {
        let Some(photo) = self.roll.get_mut(id) else {
            return false;
        };
        photo.status = PhotoStatus::Error;
        self.log.push(format!("ERROR: CAPTURE_FAULT_{}", id));
        true
    }

    pub fn view(&self) -> BoothView {
        let error = self.error.as_ref().and_then(|e| {
            e.presentation().map(|p| ErrorView {
                title: p.title.to_string(),
                details: p.details,
            })
        });

        let photos = self
            .roll
            .iter()
            .map(|photo| PhotoSummary {
                id: photo.id,
                label: photo.id.to_string(),
                status: photo.status,
                qr_url: photo.share_url.as_deref().map(qr_image_url),
                share_url: photo.share_url.clone(),
                timestamp: photo.timestamp(),
                resolution: photo.metadata.resolution.clone(),
                confidence: photo.metadata.confidence,
            })
            .collect();

        BoothView {
            status: self.status.to_string(),
            hint: self.hold.hint().map(str::to_string),
            hand_active: self.hand_active,
            face_active: self.face_active,
            face_score: self.face_score,
            hold_progress: self.hold.progress(),
            locked: self.lockout.is_locked(),
            lockout_remaining: self.lockout.remaining(),
            ready: self.ready,
            error,
            photos,
            selected: self.roll.selected_id(),
            log: self.log.to_vec(),
        }
    }
}

/// Fatal error as shown on the kiosk, with a retry affordance
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorView {
    pub title: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhotoSummary {
    pub id: PhotoId,
    /// `NODE_XXXXXXXX`
    pub label: String,
    pub status: PhotoStatus,
    pub share_url: Option<String>,
    pub qr_url: Option<String>,
    /// RFC 3339
    pub timestamp: String,
    pub resolution: String,
    pub confidence: f32,
}

/// Read-only projection of [`BoothState`], republished after every engine step
#[derive(Debug, Clone, PartialEq)]
pub struct BoothView {
    pub status: String,
    pub hint: Option<String>,
    pub hand_active: bool,
    pub face_active: bool,
    pub face_score: f32,
    pub hold_progress: u8,
    pub locked: bool,
    pub lockout_remaining: u8,
    pub ready: bool,
    pub error: Option<ErrorView>,
    /// Newest first
    pub photos: Vec<PhotoSummary>,
    pub selected: Option<PhotoId>,
    /// Newest first
    pub log: Vec<LogEntry>,
}

impl Default for BoothView {
    fn default() -> Self {
        BoothState::new(HoldTrigger::default()).view()
    }
}

impl BoothView {
    pub fn selected_photo(&self) -> Option<&PhotoSummary> {
        let id = self.selected?;
        self.photos.iter().find(|p| p.id == id)
    }

    pub fn photo(&self, id: PhotoId) -> Option<&PhotoSummary> {
        self.photos.iter().find(|p| p.id == id)
    }
}
