//! The three thin front-ends over the shared pipeline: terminal redraw,
//! HTTP, and a single streaming stdout line.

pub mod server;
pub mod stream;
pub mod terminal;

use crate::{
    signs,
    types::{FingerState, TrackedHand},
};

/// Derive the finger state and classified letter for one tracked frame.
/// No hand yields `(None, None)`, which the accumulator treats as a
/// debounce-clearing observation.
pub fn hand_letter(hand: Option<&TrackedHand>) -> (Option<FingerState>, Option<char>) {
    match hand {
        Some(hand) => {
            let state = signs::finger_states(&hand.landmarks);
            (Some(state), signs::classify(state))
        }
        None => (None, None),
    }
}
