//! Time-gated letter accumulation.

use std::time::{Duration, Instant};

/// Outcome of feeding one observation to the accumulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// The sampling interval had not elapsed; the observation was ignored.
    Skipped,
    /// The observation was evaluated; a letter may have been appended.
    Evaluated(Option<char>),
}

/// Accumulates classified letters into a word, suppressing repeats while a
/// pose is continuously held. Observations are evaluated at most once per
/// sampling interval; in between they are ignored entirely.
#[derive(Debug)]
pub struct WordBuilder {
    word: String,
    last_letter: Option<char>,
    interval: Duration,
    last_check: Option<Instant>,
}

impl WordBuilder {
    pub fn new(interval: Duration) -> Self {
        Self {
            word: String::new(),
            last_letter: None,
            interval,
            last_check: None,
        }
    }

    /// Feed one observation.
    ///
    /// On an evaluated tick, a letter differing from the last accepted one
    /// is appended and remembered; the same letter held across ticks is
    /// ignored; no letter (no hand, or an unknown pose) clears the memory so
    /// the same letter may be appended again afterwards.
    pub fn observe(&mut self, letter: Option<char>, now: Instant) -> Tick {
        match self.last_check {
            Some(last) if now.duration_since(last) < self.interval => return Tick::Skipped,
            _ => self.last_check = Some(now),
        }

        let appended = match letter {
            Some(l) if self.last_letter != Some(l) => {
                self.word.push(l);
                self.last_letter = Some(l);
                Some(l)
            }
            Some(_) => None,
            None => {
                self.last_letter = None;
                None
            }
        };
        Tick::Evaluated(appended)
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn clear(&mut self) {
        self.word.clear();
        self.last_letter = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> WordBuilder {
        WordBuilder::new(Duration::from_secs(1))
    }

    fn ticks(start: Instant) -> impl Iterator<Item = Instant> {
        (0..).map(move |i| start + Duration::from_secs(i))
    }

    #[test]
    fn held_letter_appends_once() {
        let mut b = builder();
        let mut t = ticks(Instant::now());
        assert_eq!(b.observe(Some('A'), t.next().unwrap()), Tick::Evaluated(Some('A')));
        assert_eq!(b.observe(Some('A'), t.next().unwrap()), Tick::Evaluated(None));
        assert_eq!(b.observe(Some('A'), t.next().unwrap()), Tick::Evaluated(None));
        assert_eq!(b.word(), "A");
    }

    #[test]
    fn different_letter_appends() {
        let mut b = builder();
        let mut t = ticks(Instant::now());
        b.observe(Some('H'), t.next().unwrap());
        assert_eq!(b.observe(Some('I'), t.next().unwrap()), Tick::Evaluated(Some('I')));
        assert_eq!(b.word(), "HI");
    }

    #[test]
    fn no_match_gap_allows_reappend() {
        // Same pattern on two ticks, a no-hand tick, then the pattern again
        // must yield "HH".
        let mut b = builder();
        let mut t = ticks(Instant::now());
        assert_eq!(b.observe(Some('H'), t.next().unwrap()), Tick::Evaluated(Some('H')));
        assert_eq!(b.observe(Some('H'), t.next().unwrap()), Tick::Evaluated(None));
        assert_eq!(b.observe(None, t.next().unwrap()), Tick::Evaluated(None));
        assert_eq!(b.observe(Some('H'), t.next().unwrap()), Tick::Evaluated(Some('H')));
        assert_eq!(b.word(), "HH");
    }

    #[test]
    fn observations_inside_the_interval_are_skipped() {
        let mut b = builder();
        let start = Instant::now();
        assert_eq!(b.observe(Some('A'), start), Tick::Evaluated(Some('A')));
        // Half a second later the gate is still closed, even for a new letter.
        assert_eq!(
            b.observe(Some('B'), start + Duration::from_millis(500)),
            Tick::Skipped
        );
        assert_eq!(
            b.observe(Some('B'), start + Duration::from_millis(1100)),
            Tick::Evaluated(Some('B'))
        );
        assert_eq!(b.word(), "AB");
    }

    #[test]
    fn clear_resets_word_and_memory() {
        let mut b = builder();
        let mut t = ticks(Instant::now());
        b.observe(Some('A'), t.next().unwrap());
        b.clear();
        assert_eq!(b.word(), "");
        // Memory was cleared too, so the held letter appends again.
        assert_eq!(b.observe(Some('A'), t.next().unwrap()), Tick::Evaluated(Some('A')));
    }

    #[test]
    fn space_is_a_letter_like_any_other() {
        let mut b = builder();
        let mut t = ticks(Instant::now());
        b.observe(Some('H'), t.next().unwrap());
        b.observe(Some(' '), t.next().unwrap());
        b.observe(Some('I'), t.next().unwrap());
        assert_eq!(b.word(), "H I");
    }
}
