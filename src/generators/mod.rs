// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Generative engines for chord progressions and melodies.
//!
//! Every generator draws its randomness from a [`RandomSource`], so tests
//! can replay a fixed sequence of values and assert exact selections.
//! Time inside the engine is counted in sixteenth notes.

pub mod arpeggio;
pub mod melody;
pub mod progression;

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::music::{Chord, MidiNote};

/// Sixteenth-note units in one 4/4 bar
pub const SIXTEENTHS_PER_BAR: u32 = 16;

/// Bars in one generated phrase
pub const PHRASE_BARS: f64 = 4.0;

/// Source of uniform random values in `[0, 1)`
pub trait RandomSource {
    /// Next uniform value in `[0, 1)`
    fn next_f64(&mut self) -> f64;

    /// Uniform index into a collection of `len` items (`len` must be non-zero)
    fn index(&mut self, len: usize) -> usize {
        let i = (self.next_f64() * len as f64) as usize;
        i.min(len.saturating_sub(1))
    }

    /// True with probability `p`
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

/// Entropy-seeded random source used outside of tests
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible source for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for StdRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for StdRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of values, wrapping around at the end
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    values: Vec<f64>,
    position: usize,
}

impl SequenceRandom {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            position: 0,
        }
    }

    /// A source that always returns `value`
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

/// Pick one element uniformly
pub fn choose<T: Copy, R: RandomSource + ?Sized>(rng: &mut R, items: &[T]) -> Option<T> {
    if items.is_empty() {
        None
    } else {
        Some(items[rng.index(items.len())])
    }
}

/// A single melody note, timed in sixteenth-note units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MelodyNote {
    /// MIDI pitch
    pub pitch: MidiNote,
    /// Start position in sixteenths from the top of the phrase
    pub start: u32,
    /// Length in sixteenths
    pub duration: u32,
}

impl MelodyNote {
    pub fn new(pitch: MidiNote, start: u32, duration: u32) -> Self {
        Self {
            pitch,
            start,
            duration,
        }
    }

    pub fn end(&self) -> u32 {
        self.start + self.duration
    }
}

/// Start and end of a chord in sixteenth-note units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordSpan {
    pub start: u32,
    pub end: u32,
}

impl ChordSpan {
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, time: u32) -> bool {
        time >= self.start && time < self.end
    }
}

/// Sixteenth-note span of every chord.
///
/// Boundaries are rounded from cumulative bar positions, so spans stay on
/// the integer grid even when bar durations are fractional.
pub fn chord_spans(chords: &[Chord]) -> Vec<ChordSpan> {
    let mut spans = Vec::with_capacity(chords.len());
    let mut bars = 0.0;

    for chord in chords {
        let start = to_sixteenths(bars);
        bars += chord.duration_bars.max(0.0);
        spans.push(ChordSpan {
            start,
            end: to_sixteenths(bars),
        });
    }

    spans
}

/// Total length of a progression in bars
pub fn total_bars(chords: &[Chord]) -> f64 {
    chords.iter().map(|c| c.duration_bars).sum()
}

fn to_sixteenths(bars: f64) -> u32 {
    (bars * SIXTEENTHS_PER_BAR as f64).round() as u32
}

/// Named-parameter access shared by the generators
pub trait Generator {
    /// Set a parameter by name; unknown names are ignored
    fn set_param(&mut self, name: &str, value: f64);

    /// Get a parameter by name
    fn get_param(&self, name: &str) -> Option<f64>;

    /// Get the generator type name
    fn name(&self) -> &'static str;

    /// Get a list of available parameters with their current values
    fn params(&self) -> HashMap<String, f64>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::{build_chord, scale_degrees, ChordType, Mode, Note};

    fn chords_with(durations: &[f64]) -> Vec<Chord> {
        let degrees = scale_degrees(Note::C, Mode::Major);
        durations
            .iter()
            .enumerate()
            .map(|(i, &d)| {
                let mut chord = build_chord(&degrees, i, ChordType::Triad, Mode::Major);
                chord.duration_bars = d;
                chord
            })
            .collect()
    }

    #[test]
    fn test_sequence_random_wraps() {
        let mut rng = SequenceRandom::new(vec![0.1, 0.9]);
        assert_eq!(rng.next_f64(), 0.1);
        assert_eq!(rng.next_f64(), 0.9);
        assert_eq!(rng.next_f64(), 0.1);
    }

    #[test]
    fn test_index_stays_in_bounds() {
        let mut rng = SequenceRandom::constant(1.0);
        assert_eq!(rng.index(5), 4);

        let mut rng = SequenceRandom::constant(0.0);
        assert_eq!(rng.index(5), 0);

        let mut rng = StdRandom::seeded(7);
        for _ in 0..1000 {
            assert!(rng.index(3) < 3);
        }
    }

    #[test]
    fn test_choose() {
        let mut rng = SequenceRandom::constant(0.5);
        assert_eq!(choose(&mut rng, &[10, 20, 30]), Some(20));
        assert_eq!(choose::<u8, _>(&mut rng, &[]), None);
    }

    #[test]
    fn test_melody_note_end() {
        let note = MelodyNote::new(60, 4, 2);
        assert_eq!(note.end(), 6);
    }

    #[test]
    fn test_chord_spans_standard() {
        let chords = chords_with(&[2.0, 1.0, 1.0]);
        let spans = chord_spans(&chords);
        assert_eq!(
            spans,
            vec![
                ChordSpan { start: 0, end: 32 },
                ChordSpan { start: 32, end: 48 },
                ChordSpan { start: 48, end: 64 },
            ]
        );
        assert_eq!(total_bars(&chords), 4.0);
    }

    #[test]
    fn test_chord_spans_fractional() {
        let chords = chords_with(&[0.8; 5]);
        let spans = chord_spans(&chords);
        assert_eq!(spans.len(), 5);
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans[4].end, 64);
        for pair in spans.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }
}
