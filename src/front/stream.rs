//! Minimal front-end: one `\r`-updated stdout line.

use std::{
    io::{self, Write},
    time::{Duration, Instant},
};

use anyhow::Result;

use crate::{
    pipeline::{self, TrackerBackend},
    word::{Tick, WordBuilder},
};

use super::hand_letter;

pub fn run(camera_index: u32, interval: Duration) -> Result<()> {
    println!("ASL (A-Y) gesture detection (Ctrl+C to quit)");

    let (result_rx, _camera) = pipeline::start(camera_index, TrackerBackend::default())?;
    let mut builder = WordBuilder::new(interval);

    for tracked in result_rx {
        let (_, letter) = hand_letter(tracked.hand.as_ref());
        if let Tick::Evaluated(Some(_)) = builder.observe(letter, Instant::now()) {
            print!("\rCurrent word: {}", builder.word());
            io::stdout().flush()?;
        }
    }

    Ok(())
}
