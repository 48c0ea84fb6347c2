// SPDX-License-Identifier: MPL-2.0

//! Peace-sign detection from hand landmarks

use super::landmarks::LandmarkSet;
use crate::constants::landmarks::*;

/// Whether a fingertip sits above its PIP joint (smaller y)
///
/// `None` when either landmark is missing from the set.
fn finger_up(hand: &LandmarkSet, tip: usize, pip: usize) -> Option<bool> {
    Some(hand.get(tip)?.y < hand.get(pip)?.y)
}

fn finger_down(hand: &LandmarkSet, tip: usize, pip: usize) -> Option<bool> {
    Some(hand.get(tip)?.y > hand.get(pip)?.y)
}

/// Index and middle extended, ring and pinky folded
pub fn is_peace_sign(hand: &LandmarkSet) -> bool {
    let check = || -> Option<bool> {
        Some(
            finger_up(hand, INDEX_TIP, INDEX_PIP)?
                && finger_up(hand, MIDDLE_TIP, MIDDLE_PIP)?
                && finger_down(hand, RING_TIP, RING_PIP)?
                && finger_down(hand, PINKY_TIP, PINKY_PIP)?,
        )
    };
    check().unwrap_or(false)
}

/// Hand predicate over a detection result: only the first hand counts
pub fn hand_predicate(hands: &[LandmarkSet]) -> bool {
    hands.first().is_some_and(is_peace_sign)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::perception::landmarks::Landmark;

    /// Build a 21-point hand; `up` flags index, middle, ring, pinky
    pub(crate) fn hand(up: [bool; 4]) -> LandmarkSet {
        let mut points = vec![Landmark::new(0.5, 0.5, 0.0); HAND_LANDMARK_COUNT];
        let fingers = [
            (INDEX_TIP, INDEX_PIP),
            (MIDDLE_TIP, MIDDLE_PIP),
            (RING_TIP, RING_PIP),
            (PINKY_TIP, PINKY_PIP),
        ];
        for ((tip, pip), is_up) in fingers.into_iter().zip(up) {
            points[pip].y = 0.5;
            points[tip].y = if is_up { 0.3 } else { 0.6 };
        }
        LandmarkSet::new(points)
    }

    #[test]
    fn test_peace_sign() {
        assert!(is_peace_sign(&hand([true, true, false, false])));
    }

    #[test]
    fn test_other_gestures_rejected() {
        assert!(!is_peace_sign(&hand([true, true, true, true]))); // open palm
        assert!(!is_peace_sign(&hand([false, false, false, false]))); // fist
        assert!(!is_peace_sign(&hand([true, false, false, false]))); // pointing
        assert!(!is_peace_sign(&hand([true, true, true, false])));
    }

    #[test]
    fn test_truncated_hand_is_not_a_gesture() {
        let mut set = hand([true, true, false, false]);
        set.points.truncate(15);
        assert!(!is_peace_sign(&set));
    }

    #[test]
    fn test_only_first_hand_counts() {
        let peace = hand([true, true, false, false]);
        let fist = hand([false, false, false, false]);
        assert!(hand_predicate(&[peace.clone(), fist.clone()]));
        assert!(!hand_predicate(&[fist, peace]));
        assert!(!hand_predicate(&[]));
    }
}
