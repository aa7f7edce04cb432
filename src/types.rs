use std::time::Instant;

/// One decoded camera frame, RGBA, already mirrored horizontally.
#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: Instant,
}

/// MediaPipe hand landmark indices.
#[allow(dead_code)]
pub mod landmark {
    pub const WRIST: usize = 0;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_PIP: usize = 14;
    pub const RING_TIP: usize = 16;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_TIP: usize = 20;
}

pub const NUM_LANDMARKS: usize = 21;

/// A normalized landmark: x and y in [0, 1] relative to the frame,
/// z relative to the wrist.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// One tracked hand for one frame.
#[derive(Clone, Debug)]
pub struct TrackedHand {
    pub landmarks: [Landmark; NUM_LANDMARKS],
    /// Landmarks in frame pixel coordinates, for overlay drawing.
    pub projected: Vec<(f32, f32)>,
    pub confidence: f32,
}

/// A frame paired with the tracker's verdict for it.
#[derive(Clone, Debug)]
pub struct TrackedFrame {
    pub frame: Frame,
    pub hand: Option<TrackedHand>,
}

/// Per-finger extended/not-extended booleans, derived per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FingerState {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerState {
    pub fn bits(&self) -> [u8; 5] {
        [
            self.thumb as u8,
            self.index as u8,
            self.middle as u8,
            self.ring as u8,
            self.pinky as u8,
        ]
    }

    pub fn non_thumb(&self) -> [bool; 4] {
        [self.index, self.middle, self.ring, self.pinky]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_are_five_zero_or_one() {
        let state = FingerState {
            thumb: true,
            index: false,
            middle: true,
            ring: false,
            pinky: true,
        };
        let bits = state.bits();
        assert_eq!(bits.len(), 5);
        assert_eq!(bits, [1, 0, 1, 0, 1]);
        assert!(bits.iter().all(|&b| b == 0 || b == 1));
    }
}
