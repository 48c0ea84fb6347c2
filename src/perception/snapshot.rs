// SPDX-License-Identifier: MPL-2.0

//! Single-slot landmark snapshot shared between perception and its consumers
//!
//! Last value wins, no backlog: a perception result that arrives before the
//! previous one was read simply replaces it. Readers (compositor, hold state
//! machine) always see whatever is current and never wait for a new result.

use super::smile::FaceAnalysis;
use super::smile::FaceOverlay;
use std::sync::Arc;
use tokio::sync::watch;

/// Latest perception state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkSnapshot {
    /// First hand shows the peace sign
    pub hand_predicate: bool,
    /// Any face is smiling
    pub face_predicate: bool,
    /// Highest smile score across faces
    pub face_score: f32,
    /// Faces for the overlay (may be several render cycles stale)
    pub faces: Vec<FaceOverlay>,
    /// Time of the most recent write from either stream, `None` before the first result
    pub timestamp_ms: Option<u64>,
    pub hand_updated_ms: Option<u64>,
    pub face_updated_ms: Option<u64>,
}

impl LandmarkSnapshot {
    /// Both predicates hold
    pub fn dual_predicate(&self) -> bool {
        self.hand_predicate && self.face_predicate
    }

    /// At least one perception result has been written
    pub fn has_data(&self) -> bool {
        self.timestamp_ms.is_some()
    }
}

/// Overwrite-on-write cell holding the current [`LandmarkSnapshot`]
///
/// Each perception stream writes only its own fields.
#[derive(Debug, Clone)]
pub struct SnapshotCell {
    sender: Arc<watch::Sender<LandmarkSnapshot>>,
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotCell {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(LandmarkSnapshot::default());
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Overwrite the hand fields
    pub fn write_hand(&self, predicate: bool, now_ms: u64) {
        self.sender.send_modify(|snapshot| {
            snapshot.hand_predicate = predicate;
            snapshot.hand_updated_ms = Some(now_ms);
            snapshot.timestamp_ms = Some(now_ms);
        });
    }

    /// Overwrite the face fields
    pub fn write_face(&self, analysis: FaceAnalysis, now_ms: u64) {
        self.sender.send_modify(|snapshot| {
            snapshot.face_predicate = analysis.predicate;
            snapshot.face_score = analysis.best_score;
            snapshot.faces = analysis.faces;
            snapshot.face_updated_ms = Some(now_ms);
            snapshot.timestamp_ms = Some(now_ms);
        });
    }

    /// Copy of the current value
    pub fn current(&self) -> LandmarkSnapshot {
        self.sender.borrow().clone()
    }

    /// Read the current value without copying it
    pub fn read<R>(&self, f: impl FnOnce(&LandmarkSnapshot) -> R) -> R {
        f(&self.sender.borrow())
    }

    /// Receiver that is notified on every write
    pub fn subscribe(&self) -> watch::Receiver<LandmarkSnapshot> {
        self.sender.subscribe()
    }

    /// Forget everything (used when perception restarts)
    pub fn clear(&self) {
        self.sender.send_replace(LandmarkSnapshot::default());
    }
}
