// SPDX-License-Identifier: MPL-2.0

//! Captured photos and the selection over them

use chrono::{DateTime, SecondsFormat, Utc};
use image::RgbaImage;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Photo identifier
///
/// Backed by a random UUID; displayed in the kiosk's `NODE_XXXXXXXX` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhotoId(Uuid);

impl PhotoId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// First eight hex digits, upper case
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_uppercase()
    }
}

impl Default for PhotoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NODE_{}", self.short())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoStatus {
    Uploading,
    Success,
    Error,
}

impl PhotoStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PhotoStatus::Uploading => "UPLOADING",
            PhotoStatus::Success => "SYNCED",
            PhotoStatus::Error => "UPLINK_FAULT",
        }
    }
}

impl fmt::Display for PhotoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhotoMetadata {
    pub confidence: f32,
    /// `"WxH"`
    pub resolution: String,
}

/// One captured photo
///
/// Image and PNG bytes are immutable after capture; only `status` and
/// `share_url` change, and only through the upload lifecycle.
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    pub id: PhotoId,
    pub image: Arc<RgbaImage>,
    pub png: Arc<Vec<u8>>,
    pub captured_at: DateTime<Utc>,
    pub status: PhotoStatus,
    pub share_url: Option<String>,
    pub metadata: PhotoMetadata,
}

impl CapturedPhoto {
    /// RFC 3339 capture time
    pub fn timestamp(&self) -> String {
        self.captured_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// False until the PNG for the upload exists
    pub fn is_encoded(&self) -> bool {
        !self.png.is_empty()
    }
}

/// Newest-first collection of captured photos plus the selection
#[derive(Debug, Default)]
pub struct PhotoRoll {
    photos: Vec<CapturedPhoto>,
    selected: Option<PhotoId>,
}

impl PhotoRoll {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new photo at the front
    ///
    /// The new photo becomes the selection: any explicit selection is dropped
    /// so the roll follows the newest capture again.
    pub fn prepend(&mut self, photo: CapturedPhoto) {
        self.photos.insert(0, photo);
        self.selected = None;
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CapturedPhoto> {
        self.photos.iter()
    }

    pub fn get(&self, id: PhotoId) -> Option<&CapturedPhoto> {
        self.photos.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: PhotoId) -> Option<&mut CapturedPhoto> {
        self.photos.iter_mut().find(|p| p.id == id)
    }

    pub fn newest(&self) -> Option<&CapturedPhoto> {
        self.photos.first()
    }

    /// Remove a photo; a selection naming it falls back to the newest
    pub fn remove(&mut self, id: PhotoId) -> Option<CapturedPhoto> {
        let index = self.photos.iter().position(|p| p.id == id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Some(self.photos.remove(index))
    }

    /// Select a photo explicitly; unknown ids are ignored
    pub fn select(&mut self, id: PhotoId) -> bool {
        if self.get(id).is_some() {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Whether the selection was set explicitly
    pub fn has_explicit_selection(&self) -> bool {
        self.selected.is_some()
    }

    /// Explicit selection if it still exists, else the newest photo
    pub fn selected(&self) -> Option<&CapturedPhoto> {
        self.selected
            .and_then(|id| self.get(id))
            .or_else(|| self.newest())
    }

    pub fn selected_id(&self) -> Option<PhotoId> {
        self.selected().map(|p| p.id)
    }

    /// Move the selection by `delta` positions (negative = newer)
    pub fn step_selection(&mut self, delta: isize) -> Option<PhotoId> {
        if self.photos.is_empty() {
            return None;
        }
        let current = self
            .selected_id()
            .and_then(|id| self.photos.iter().position(|p| p.id == id))
            .unwrap_or(0);
        let last = self.photos.len() as isize - 1;
        let next = (current as isize + delta).clamp(0, last) as usize;
        let id = self.photos[next].id;
        self.selected = Some(id);
        Some(id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn photo() -> CapturedPhoto {
        CapturedPhoto {
            id: PhotoId::new(),
            image: Arc::new(RgbaImage::new(2, 2)),
            png: Arc::new(Vec::new()),
            captured_at: Utc::now(),
            status: PhotoStatus::Uploading,
            share_url: None,
            metadata: PhotoMetadata {
                confidence: 1.0,
                resolution: "2x2".into(),
            },
        }
    }

    #[test]
    fn test_photo_id_display() {
        let id = PhotoId::new();
        let text = id.to_string();
        assert!(text.starts_with("NODE_"));
        assert_eq!(text.len(), 13);
        assert!(text[5..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_newest_first_and_default_selection() {
        let mut roll = PhotoRoll::new();
        assert!(roll.selected().is_none());

        let a = photo();
        let b = photo();
        let (a_id, b_id) = (a.id, b.id);
        roll.prepend(a);
        roll.prepend(b);

        let order: Vec<_> = roll.iter().map(|p| p.id).collect();
        assert_eq!(order, vec![b_id, a_id]);
        assert_eq!(roll.selected_id(), Some(b_id));
    }

    #[test]
    fn test_explicit_selection_persists_until_cleared_or_removed() {
        let mut roll = PhotoRoll::new();
        let a = photo();
        let a_id = a.id;
        roll.prepend(a);
        roll.prepend(photo());

        assert!(roll.select(a_id));
        assert_eq!(roll.selected_id(), Some(a_id));
        assert!(!roll.select(PhotoId::new()));
        assert_eq!(roll.selected_id(), Some(a_id));

        roll.remove(a_id);
        assert!(!roll.has_explicit_selection());
        assert_eq!(roll.selected_id(), roll.newest().map(|p| p.id));

        let c = photo();
        let c_id = c.id;
        roll.prepend(c);
        roll.step_selection(1);
        assert_ne!(roll.selected_id(), Some(c_id));
        roll.clear_selection();
        assert_eq!(roll.selected_id(), Some(c_id));
    }

    #[test]
    fn test_new_capture_takes_selection() {
        let mut roll = PhotoRoll::new();
        let a = photo();
        let a_id = a.id;
        roll.prepend(a);
        roll.prepend(photo());
        roll.select(a_id);

        let c = photo();
        let c_id = c.id;
        roll.prepend(c);
        assert_eq!(roll.selected_id(), Some(c_id));
    }

    #[test]
    fn test_step_selection_clamps() {
        let mut roll = PhotoRoll::new();
        assert_eq!(roll.step_selection(1), None);
        let a = photo();
        let a_id = a.id;
        roll.prepend(a);
        let b = photo();
        let b_id = b.id;
        roll.prepend(b);

        assert_eq!(roll.step_selection(-1), Some(b_id));
        assert_eq!(roll.step_selection(5), Some(a_id));
        assert_eq!(roll.step_selection(-1), Some(b_id));
    }
}
