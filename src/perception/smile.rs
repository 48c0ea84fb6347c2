// SPDX-License-Identifier: MPL-2.0

//! Smile scoring from face mesh landmarks
//!
//! The score is the mouth-corner distance normalized by the cheek-to-cheek
//! width, mapped linearly onto 0..=100.

use super::landmarks::{FrameRegion, LandmarkSet};
use crate::config::SmileCalibration;
use crate::constants::landmarks::{CHEEK_LEFT, CHEEK_RIGHT, MOUTH_LEFT, MOUTH_RIGHT};

/// Per-face smile measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmileReading {
    /// Mouth width / face width
    pub ratio: f32,
    /// Calibrated score in 0..=100
    pub score: f32,
    /// `score` above the calibration threshold
    pub smiling: bool,
}

/// Mouth width over face width, `None` if the mesh lacks the required points
pub fn smile_ratio(face: &LandmarkSet) -> Option<f32> {
    let mouth = face.get(MOUTH_LEFT)?.distance_2d(face.get(MOUTH_RIGHT)?);
    let width = face.get(CHEEK_LEFT)?.distance_2d(face.get(CHEEK_RIGHT)?);
    let width = if width == 0.0 { 1.0 } else { width };
    Some(mouth / width)
}

/// Map a ratio onto the calibrated 0..=100 scale
pub fn smile_score(ratio: f32, calibration: &SmileCalibration) -> f32 {
    let span = calibration.full_ratio - calibration.neutral_ratio;
    (100.0 * (ratio - calibration.neutral_ratio) / span).clamp(0.0, 100.0)
}

pub fn read_smile(face: &LandmarkSet, calibration: &SmileCalibration) -> Option<SmileReading> {
    let ratio = smile_ratio(face)?;
    let score = smile_score(ratio, calibration);
    Some(SmileReading {
        ratio,
        score,
        smiling: score > calibration.threshold,
    })
}

/// A face as the overlay needs it
#[derive(Debug, Clone, PartialEq)]
pub struct FaceOverlay {
    /// Landmark bounding box in detector (unmirrored) coordinates
    pub bounds: FrameRegion,
    pub score: f32,
    pub smiling: bool,
}

/// Result of scoring every face in one detection result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceAnalysis {
    /// True if any face is smiling
    pub predicate: bool,
    /// Highest score across faces (0 when none)
    pub best_score: f32,
    pub faces: Vec<FaceOverlay>,
}

pub fn analyze_faces(faces: &[LandmarkSet], calibration: &SmileCalibration) -> FaceAnalysis {
    let mut analysis = FaceAnalysis::default();

    for face in faces {
        let Some(reading) = read_smile(face, calibration) else {
            continue;
        };
        let Some(bounds) = face.bounds() else {
            continue;
        };

        analysis.predicate |= reading.smiling;
        analysis.best_score = analysis.best_score.max(reading.score);
        analysis.faces.push(FaceOverlay {
            bounds,
            score: reading.score,
            smiling: reading.smiling,
        });
    }

    analysis
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::perception::landmarks::Landmark;

    /// Face mesh whose mouth/cheek ratio equals `ratio` (cheek width 0.5)
    pub(crate) fn face_with_ratio(ratio: f32) -> LandmarkSet {
        let mut points = vec![Landmark::new(0.5, 0.5, 0.0); 468];
        points[CHEEK_LEFT] = Landmark::new(0.25, 0.5, 0.0);
        points[CHEEK_RIGHT] = Landmark::new(0.75, 0.5, 0.0);
        let half_mouth = ratio * 0.5 / 2.0;
        points[MOUTH_LEFT] = Landmark::new(0.5 - half_mouth, 0.7, 0.0);
        points[MOUTH_RIGHT] = Landmark::new(0.5 + half_mouth, 0.7, 0.0);
        LandmarkSet::new(points)
    }

    #[test]
    fn test_score_calibration_endpoints() {
        let cal = SmileCalibration::default();
        assert_eq!(smile_score(0.42, &cal), 0.0);
        assert!((smile_score(0.58, &cal) - 100.0).abs() < 1e-3);
        assert!((smile_score(0.50, &cal) - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_score_clamped() {
        let cal = SmileCalibration::default();
        assert_eq!(smile_score(0.1, &cal), 0.0);
        assert_eq!(smile_score(0.9, &cal), 100.0);
    }

    #[test]
    fn test_ratio_from_mesh() {
        let ratio = smile_ratio(&face_with_ratio(0.5)).unwrap();
        assert!((ratio - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_zero_face_width_does_not_divide_by_zero() {
        let mut face = face_with_ratio(0.5);
        face.points[CHEEK_RIGHT] = face.points[CHEEK_LEFT];
        let ratio = smile_ratio(&face).unwrap();
        assert!(ratio.is_finite());
    }

    #[test]
    fn test_threshold_is_strict() {
        let cal = SmileCalibration::default();
        // ratio giving exactly 35
        let at_threshold = 0.42 + 0.16 * 0.35;
        let reading = read_smile(&face_with_ratio(at_threshold + 0.01), &cal).unwrap();
        assert!(reading.smiling);
        let reading = read_smile(&face_with_ratio(0.44), &cal).unwrap();
        assert!(!reading.smiling);
    }

    #[test]
    fn test_any_smiling_face_sets_predicate() {
        let cal = SmileCalibration::default();
        let analysis = analyze_faces(&[face_with_ratio(0.43), face_with_ratio(0.56)], &cal);
        assert!(analysis.predicate);
        assert_eq!(analysis.faces.len(), 2);
        assert!(analysis.best_score > 80.0);

        let none = analyze_faces(&[], &cal);
        assert!(!none.predicate);
        assert_eq!(none.best_score, 0.0);
    }
}
