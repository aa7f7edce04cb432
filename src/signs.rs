//! Finger-state extraction and the static letter table.
//!
//! A non-thumb finger counts as up when its tip sits above its PIP joint in
//! the frame; the thumb counts as extended when its tip is left of its IP
//! joint. Both checks assume a mirrored frame and do not generalize to
//! un-mirrored input or the other hand.

use crate::types::{FingerState, Landmark, NUM_LANDMARKS, landmark};

#[derive(Clone, Copy, Debug)]
pub struct SignPattern {
    pub letter: char,
    pub thumb: bool,
    pub fingers: [bool; 4],
}

const fn sign(letter: char, thumb: bool, fingers: [u8; 4]) -> SignPattern {
    SignPattern {
        letter,
        thumb,
        fingers: [
            fingers[0] != 0,
            fingers[1] != 0,
            fingers[2] != 0,
            fingers[3] != 0,
        ],
    }
}

/// Pose patterns for A–Y (no J or Z, which need motion). First match in
/// table order wins; the table holds no duplicate patterns.
pub const LETTER_SIGNS: &[SignPattern] = &[
    sign('A', true, [0, 0, 0, 0]),
    sign('B', false, [1, 1, 1, 1]),
    sign('C', true, [1, 0, 0, 1]),
    sign('D', false, [1, 0, 0, 0]),
    sign('E', false, [0, 0, 0, 0]),
    sign('F', true, [0, 1, 1, 1]),
    sign('G', true, [0, 1, 1, 0]),
    sign('H', false, [1, 1, 0, 0]),
    sign('I', false, [0, 0, 0, 1]),
    sign('K', false, [1, 0, 1, 1]),
    sign('L', true, [1, 0, 0, 0]),
    sign('M', false, [0, 1, 1, 0]),
    sign('N', true, [1, 1, 1, 0]),
    sign('O', true, [0, 0, 1, 1]),
    sign('P', true, [1, 0, 1, 1]),
    sign('Q', true, [0, 1, 0, 0]),
    sign('R', false, [1, 1, 0, 1]),
    sign('S', false, [0, 1, 0, 1]),
    sign('T', false, [0, 0, 1, 0]),
    sign('U', true, [1, 1, 0, 1]),
    sign('V', true, [1, 1, 0, 0]),
    sign('W', false, [1, 1, 1, 0]),
    sign('Y', true, [0, 0, 0, 1]),
    sign(' ', true, [1, 1, 1, 1]),
];

fn finger_up(points: &[Landmark; NUM_LANDMARKS], tip: usize, pip: usize) -> bool {
    points[tip].y < points[pip].y
}

/// Derive the five extended/not-extended booleans from one hand's landmarks.
pub fn finger_states(points: &[Landmark; NUM_LANDMARKS]) -> FingerState {
    FingerState {
        thumb: points[landmark::THUMB_TIP].x < points[landmark::THUMB_IP].x,
        index: finger_up(points, landmark::INDEX_TIP, landmark::INDEX_PIP),
        middle: finger_up(points, landmark::MIDDLE_TIP, landmark::MIDDLE_PIP),
        ring: finger_up(points, landmark::RING_TIP, landmark::RING_PIP),
        pinky: finger_up(points, landmark::PINKY_TIP, landmark::PINKY_PIP),
    }
}

/// Exact-match lookup against the letter table.
pub fn classify(state: FingerState) -> Option<char> {
    let fingers = state.non_thumb();
    LETTER_SIGNS
        .iter()
        .find(|p| p.thumb == state.thumb && p.fingers == fingers)
        .map(|p| p.letter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_for(pattern: &SignPattern) -> FingerState {
        FingerState {
            thumb: pattern.thumb,
            index: pattern.fingers[0],
            middle: pattern.fingers[1],
            ring: pattern.fingers[2],
            pinky: pattern.fingers[3],
        }
    }

    #[test]
    fn every_table_entry_classifies_to_itself() {
        for pattern in LETTER_SIGNS {
            assert_eq!(classify(state_for(pattern)), Some(pattern.letter));
        }
    }

    #[test]
    fn table_has_no_duplicate_patterns() {
        for (i, a) in LETTER_SIGNS.iter().enumerate() {
            for b in &LETTER_SIGNS[i + 1..] {
                assert!(
                    a.thumb != b.thumb || a.fingers != b.fingers,
                    "{} and {} share a pattern",
                    a.letter,
                    b.letter
                );
            }
        }
    }

    #[test]
    fn unmatched_pattern_classifies_to_none() {
        // Thumb folded, index + ring up: not in the table.
        let state = FingerState {
            thumb: false,
            index: true,
            middle: false,
            ring: true,
            pinky: false,
        };
        assert_eq!(classify(state), None);
    }

    fn landmarks_for(state: FingerState) -> [Landmark; NUM_LANDMARKS] {
        let mut points = [Landmark::default(); NUM_LANDMARKS];
        for p in points.iter_mut() {
            *p = Landmark {
                x: 0.5,
                y: 0.5,
                z: 0.0,
            };
        }
        points[landmark::THUMB_IP].x = 0.4;
        points[landmark::THUMB_TIP].x = if state.thumb { 0.3 } else { 0.5 };
        let fingers = [
            (landmark::INDEX_TIP, landmark::INDEX_PIP, state.index),
            (landmark::MIDDLE_TIP, landmark::MIDDLE_PIP, state.middle),
            (landmark::RING_TIP, landmark::RING_PIP, state.ring),
            (landmark::PINKY_TIP, landmark::PINKY_PIP, state.pinky),
        ];
        for (tip, pip, up) in fingers {
            points[pip].y = 0.5;
            points[tip].y = if up { 0.3 } else { 0.7 };
        }
        points
    }

    #[test]
    fn finger_states_from_landmark_geometry() {
        let want = FingerState {
            thumb: false,
            index: true,
            middle: true,
            ring: false,
            pinky: false,
        };
        let got = finger_states(&landmarks_for(want));
        assert_eq!(got, want);
        // This is the H pattern.
        assert_eq!(classify(got), Some('H'));
    }
}
