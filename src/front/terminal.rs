//! Terminal front-end: two lines redrawn in place.

use std::time::{Duration, Instant};

use anyhow::Result;
use console::Term;

use crate::{
    pipeline::{self, TrackerBackend},
    word::{Tick, WordBuilder},
};

use super::hand_letter;

pub fn run(camera_index: u32, interval: Duration) -> Result<()> {
    let term = Term::stdout();
    term.write_line("ASL + finger state detection (Ctrl+C to quit)")?;
    term.write_line("")?;
    term.write_line("")?;

    let (result_rx, _camera) = pipeline::start(camera_index, TrackerBackend::default())?;
    let mut builder = WordBuilder::new(interval);

    for tracked in result_rx {
        let (state, letter) = hand_letter(tracked.hand.as_ref());
        if builder.observe(letter, Instant::now()) == Tick::Skipped {
            continue;
        }
        // Redraw only while a hand is visible; no hand leaves the last
        // reading on screen.
        let Some(state) = state else { continue };

        let width = term.size().1 as usize;
        let line1 = format!("Current word: {}", builder.word());
        let line2 = format!("Hand: {:?}", state.bits());

        term.clear_last_lines(2)?;
        term.write_line(&pad_to_width(&line1, width))?;
        term.write_line(&pad_to_width(&line2, width))?;
    }

    Ok(())
}

fn pad_to_width(line: &str, width: usize) -> String {
    if line.len() >= width {
        line.to_string()
    } else {
        format!("{line:<width$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_fills_to_terminal_width() {
        assert_eq!(pad_to_width("ab", 5), "ab   ");
        assert_eq!(pad_to_width("abcdef", 3), "abcdef");
    }
}
