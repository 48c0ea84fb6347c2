// SPDX-License-Identifier: MPL-2.0

//! Landmark perception
//!
//! Detectors run asynchronously on camera frames and report landmark sets.
//! Results are reduced to the hand and face predicates by the [`Ingestor`] and
//! written into the shared [`SnapshotCell`]; nothing downstream ever waits on a
//! detector.

pub mod gesture;
pub mod landmarks;
pub mod replay;
pub mod smile;
pub mod snapshot;

pub use landmarks::{FrameRegion, Landmark, LandmarkSet};
pub use replay::ReplayDetector;
pub use snapshot::{LandmarkSnapshot, SnapshotCell};

use crate::backends::camera::types::CameraFrame;
use crate::config::SmileCalibration;
use crate::errors::BoothResult;
use crate::lifecycle::{Clock, EngineContext};
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, trace};

/// Which landmark stream a detector produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkKind {
    Hand,
    Face,
}

impl std::fmt::Display for LandmarkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LandmarkKind::Hand => write!(f, "hand"),
            LandmarkKind::Face => write!(f, "face"),
        }
    }
}

/// A landmark detection collaborator
///
/// `initialize` is awaited once per (re)initialization and may fail with
/// [`BoothError::PerceptionLibraryUnavailable`](crate::errors::BoothError).
/// `detect` returns an owned future so the caller can spawn it and move on.
pub trait LandmarkDetector: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> LandmarkKind;

    fn initialize(&self) -> BoxFuture<'_, BoothResult<()>>;

    /// Detect landmarks in one frame; zero detections is `Ok(vec![])`
    fn detect(&self, frame: Arc<CameraFrame>)
    -> BoxFuture<'static, Result<Vec<LandmarkSet>, String>>;
}

/// Reduces detector output to predicates and writes the snapshot
#[derive(Clone)]
pub struct Ingestor {
    cell: SnapshotCell,
    clock: Arc<dyn Clock>,
    calibration: SmileCalibration,
}

impl Ingestor {
    pub fn new(cell: SnapshotCell, clock: Arc<dyn Clock>, calibration: SmileCalibration) -> Self {
        Self {
            cell,
            clock,
            calibration,
        }
    }

    pub fn cell(&self) -> &SnapshotCell {
        &self.cell
    }

    pub fn ingest_hands(&self, hands: &[LandmarkSet]) {
        let predicate = gesture::hand_predicate(hands);
        trace!(hands = hands.len(), predicate, "Hand result");
        self.cell.write_hand(predicate, self.clock.now_ms());
    }

    pub fn ingest_faces(&self, faces: &[LandmarkSet]) {
        let analysis = smile::analyze_faces(faces, &self.calibration);
        trace!(
            faces = faces.len(),
            predicate = analysis.predicate,
            score = analysis.best_score,
            "Face result"
        );
        self.cell.write_face(analysis, self.clock.now_ms());
    }

    /// Ingest one detector result; a failed detection counts as no detections
    pub fn ingest(&self, kind: LandmarkKind, result: Result<Vec<LandmarkSet>, String>) {
        let sets = result.unwrap_or_else(|e| {
            debug!(%kind, error = %e, "Detection failed, treating as empty");
            Vec::new()
        });
        match kind {
            LandmarkKind::Hand => self.ingest_hands(&sets),
            LandmarkKind::Face => self.ingest_faces(&sets),
        }
    }

    /// Fire-and-forget detection of one frame
    ///
    /// The result is discarded if the engine shut down while it was in flight.
    pub fn submit(
        &self,
        detector: &Arc<dyn LandmarkDetector>,
        frame: Arc<CameraFrame>,
        ctx: &EngineContext,
    ) {
        if !ctx.is_active() {
            return;
        }
        let kind = detector.kind();
        let pending = detector.detect(frame);
        let ingestor = self.clone();
        let ctx = ctx.clone();
        tokio::spawn(async move {
            let result = pending.await;
            if ctx.is_active() {
                ingestor.ingest(kind, result);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::ManualClock;

    fn ingestor() -> (Ingestor, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let ingestor = Ingestor::new(
            SnapshotCell::new(),
            clock.clone(),
            SmileCalibration::default(),
        );
        (ingestor, clock)
    }

    #[test]
    fn test_ingest_writes_only_own_stream() {
        let (ingestor, clock) = ingestor();
        clock.set(100);
        ingestor.ingest_hands(&[gesture::tests::hand([true, true, false, false])]);
        clock.set(140);
        ingestor.ingest_faces(&[smile::tests::face_with_ratio(0.55)]);

        let snap = ingestor.cell().current();
        assert!(snap.hand_predicate);
        assert!(snap.face_predicate);
        assert_eq!(snap.hand_updated_ms, Some(100));
        assert_eq!(snap.face_updated_ms, Some(140));
        assert_eq!(snap.faces.len(), 1);

        ingestor.ingest_hands(&[]);
        let snap = ingestor.cell().current();
        assert!(!snap.hand_predicate);
        assert!(snap.face_predicate);
    }

    #[test]
    fn test_failed_detection_is_empty() {
        let (ingestor, _) = ingestor();
        ingestor.ingest_faces(&[smile::tests::face_with_ratio(0.55)]);
        ingestor.ingest(LandmarkKind::Face, Err("model crashed".into()));
        let snap = ingestor.cell().current();
        assert!(!snap.face_predicate);
        assert_eq!(snap.face_score, 0.0);
        assert!(snap.faces.is_empty());
    }
}
