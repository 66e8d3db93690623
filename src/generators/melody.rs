// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Melody generator.
//!
//! Walks a progression chord by chord and fills each chord's span with
//! quantized notes using one of three strategies:
//!
//! - **Varied**: probabilistic chord tones (with 9th/11th/13th extensions)
//!   and consonant scale tones.
//! - **Conjunct**: stepwise motion from the previous note, snapping to
//!   chord tones on strong beats.
//! - **Arpeggiation**: one of the [`ArpeggioPattern`]s over a normalized
//!   four-tone chord.
//!
//! Non-arpeggiated output is smoothed (no leaps over an octave) and shifted
//! into a window around the progression's chord range. The generator never
//! returns an empty melody for a non-empty progression: chords left silent
//! receive their root (and, if nothing at all was generated, their fifth).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::arpeggio::{arpeggiate, ArpeggioPattern};
use super::progression::Progression;
use super::{choose, ChordSpan, Generator, MelodyNote, RandomSource, StdRandom};
use crate::error::{InvalidSelectorError, SelectorPolicy};
use crate::music::{scale_notes, Chord, MidiNote, Mode, Note};

/// Complexity bounds, as a percentage chance of playing each slot
pub const MIN_COMPLEXITY: u8 = 10;
pub const MAX_COMPLEXITY: u8 = 90;

/// Intervals above the chord root that count as consonant for scale tones
const CONSONANT_INTERVALS: [i16; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Extensions (9th, 11th, 13th) offered as chord tones by the varied strategy
const EXTENSIONS: [u8; 3] = [14, 17, 21];

/// Probability of a chord tone over a scale tone (varied)
const CHORD_TONE_CHANCE: f64 = 0.85;

/// Probability of lifting a chord tone by an octave (varied)
const OCTAVE_LIFT_CHANCE: f64 = 0.3;

/// Probability of stepwise motion over a small leap (conjunct)
const STEPWISE_CHANCE: f64 = 0.85;

/// Probability of snapping to a chord tone on a strong beat (conjunct)
const STRONG_BEAT_SNAP_CHANCE: f64 = 0.7;

/// Melody rhythm strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RhythmPattern {
    #[default]
    Varied,
    Conjunct,
    Arpeggiation,
}

impl RhythmPattern {
    pub const ALL: [RhythmPattern; 3] = [
        RhythmPattern::Varied,
        RhythmPattern::Conjunct,
        RhythmPattern::Arpeggiation,
    ];

    pub fn id(self) -> &'static str {
        match self {
            RhythmPattern::Varied => "varied",
            RhythmPattern::Conjunct => "conjunct",
            RhythmPattern::Arpeggiation => "arpeggiation",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RhythmPattern::Varied => "Varied",
            RhythmPattern::Conjunct => "Conjunct (Stepwise)",
            RhythmPattern::Arpeggiation => "Arpeggiation",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim().to_lowercase();
        match id.as_str() {
            "stepwise" => Some(RhythmPattern::Conjunct),
            "arpeggio" => Some(RhythmPattern::Arpeggiation),
            _ => RhythmPattern::ALL.into_iter().find(|p| p.id() == id),
        }
    }

    /// Resolve an id under `policy`; unknown ids become varied when lenient
    pub fn resolve(id: &str, policy: SelectorPolicy) -> Result<Self, InvalidSelectorError> {
        policy.resolve(
            Self::from_id(id),
            RhythmPattern::Varied,
            InvalidSelectorError::RhythmPattern(id.to_string()),
        )
    }

    fn to_value(self) -> u8 {
        match self {
            RhythmPattern::Varied => 0,
            RhythmPattern::Conjunct => 1,
            RhythmPattern::Arpeggiation => 2,
        }
    }

    fn from_value(value: u8) -> Self {
        match value {
            1 => RhythmPattern::Conjunct,
            2 => RhythmPattern::Arpeggiation,
            _ => RhythmPattern::Varied,
        }
    }
}

impl fmt::Display for RhythmPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Note grid for generated melodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantize {
    Quarter,
    #[default]
    Eighth,
    Sixteenth,
}

impl Quantize {
    pub const ALL: [Quantize; 3] = [Quantize::Quarter, Quantize::Eighth, Quantize::Sixteenth];

    /// Grid size in sixteenth notes
    pub fn step(self) -> u32 {
        match self {
            Quantize::Quarter => 4,
            Quantize::Eighth => 2,
            Quantize::Sixteenth => 1,
        }
    }

    pub fn from_step(step: u32) -> Option<Self> {
        Quantize::ALL.into_iter().find(|q| q.step() == step)
    }

    pub fn id(self) -> &'static str {
        match self {
            Quantize::Quarter => "quarter",
            Quantize::Eighth => "eighth",
            Quantize::Sixteenth => "sixteenth",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Quantize::Quarter => "Quarter Notes",
            Quantize::Eighth => "Eighth Notes",
            Quantize::Sixteenth => "Sixteenth Notes",
        }
    }

    /// Accepts the option id or its step size ("4", "2", "1")
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim().to_lowercase();
        if let Ok(step) = id.parse::<u32>() {
            return Self::from_step(step);
        }
        Quantize::ALL.into_iter().find(|q| q.id() == id)
    }

    /// Resolve an id under `policy`; unknown ids become quarter notes when lenient
    pub fn resolve(id: &str, policy: SelectorPolicy) -> Result<Self, InvalidSelectorError> {
        policy.resolve(
            Self::from_id(id),
            Quantize::Quarter,
            InvalidSelectorError::Quantize(id.to_string()),
        )
    }
}

impl fmt::Display for Quantize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Configuration for the melody generator
#[derive(Debug, Clone, PartialEq)]
pub struct MelodyConfig {
    /// Key whose scale supplies non-chord tones
    pub key: Note,
    pub mode: Mode,
    /// Percentage chance of playing each grid slot (10-90)
    pub complexity: u8,
    pub rhythm: RhythmPattern,
    /// Pattern used when `rhythm` is arpeggiation
    pub arpeggio: ArpeggioPattern,
    pub quantize: Quantize,
}

impl Default for MelodyConfig {
    fn default() -> Self {
        Self {
            key: Note::C,
            mode: Mode::Major,
            complexity: 50,
            rhythm: RhythmPattern::Varied,
            arpeggio: ArpeggioPattern::Ascending,
            quantize: Quantize::Eighth,
        }
    }
}

/// Melody generator
pub struct MelodyGenerator<R = StdRandom> {
    config: MelodyConfig,
    rng: R,
}

impl MelodyGenerator<StdRandom> {
    /// Create a generator with an entropy-seeded random source
    pub fn new(config: MelodyConfig) -> Self {
        Self::with_rng(config, StdRandom::new())
    }
}

impl<R: RandomSource> MelodyGenerator<R> {
    pub fn with_rng(mut config: MelodyConfig, rng: R) -> Self {
        config.complexity = config.complexity.clamp(MIN_COMPLEXITY, MAX_COMPLEXITY);
        Self { config, rng }
    }

    pub fn config(&self) -> &MelodyConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut MelodyConfig {
        &mut self.config
    }

    /// Generate a time-sorted melody over `progression`.
    ///
    /// When arpeggiation yields nothing, the configured pattern advances to
    /// the next one in the catalog for subsequent calls.
    pub fn generate(&mut self, progression: &Progression) -> Vec<MelodyNote> {
        if progression.is_empty() {
            return Vec::new();
        }

        let scale = scale_notes(self.config.key, self.config.mode, 2);
        let spans = progression.spans();
        let step = self.config.quantize.step();
        let rhythm = self.config.rhythm;
        let mut melody = Vec::new();

        for (chord, &span) in progression.chords.iter().zip(&spans) {
            match rhythm {
                RhythmPattern::Varied => self.varied(chord, span, step, &scale, &mut melody),
                RhythmPattern::Conjunct => self.conjunct(chord, span, step, &scale, &mut melody),
                RhythmPattern::Arpeggiation => melody.extend(arpeggiate(
                    chord,
                    span,
                    step,
                    &scale,
                    self.config.arpeggio,
                    &mut self.rng,
                )),
            }
        }
        tracing::debug!("{} strategy produced {} notes", rhythm, melody.len());

        if rhythm != RhythmPattern::Arpeggiation && !melody.is_empty() {
            smooth_leaps(&mut melody);
            if let (Some(lowest), Some(highest)) = (progression.lowest(), progression.highest()) {
                constrain_range(&mut melody, lowest, highest);
            }
        }

        if rhythm == RhythmPattern::Arpeggiation && melody.is_empty() {
            let next = self.config.arpeggio.next();
            tracing::info!(
                "Arpeggiation pattern {} produced no notes, trying {}",
                self.config.arpeggio,
                next
            );
            self.config.arpeggio = next;
            melody = ascending_chord_tones(&progression.chords, &spans, step);
        }

        let nothing_generated = melody.is_empty();
        if nothing_generated {
            tracing::info!("No melody notes were generated, adding fallback notes");
        }
        let added = fill_silent_chords(&mut melody, &progression.chords, &spans, step, nothing_generated);
        if added > 0 {
            tracing::info!("Added {} fallback melody notes", added);
        }

        melody.sort_by_key(|n| n.start);
        melody
    }

    /// Roll whether a grid slot sounds at the current complexity
    fn plays(&mut self) -> bool {
        self.rng.next_f64() * 100.0 < self.config.complexity as f64
    }

    fn varied(
        &mut self,
        chord: &Chord,
        span: ChordSpan,
        step: u32,
        scale: &[MidiNote],
        melody: &mut Vec<MelodyNote>,
    ) {
        let root = chord.root;
        let highest = chord.highest();
        let lowest = chord.lowest() as i16;

        let mut chord_tones = chord.notes.clone();
        chord_tones.extend(EXTENSIONS.iter().map(|&e| root.saturating_add(e)));

        let scale_tones: Vec<MidiNote> = scale
            .iter()
            .copied()
            .filter(|&n| CONSONANT_INTERVALS.contains(&(n as i16 - root as i16).rem_euclid(12)))
            .filter(|&n| n as i16 <= highest as i16 + 12 && n as i16 >= lowest - 12)
            .collect();

        for i in 0..span.len() / step {
            let time = span.start + i * step;
            if !self.plays() {
                continue;
            }

            let pitch = if self.rng.chance(CHORD_TONE_CHANCE) {
                let mut note = choose(&mut self.rng, &chord_tones).unwrap_or(root);
                if self.rng.chance(OCTAVE_LIFT_CHANCE) && (note as i16) < highest as i16 - 3 {
                    let lifted = note.saturating_add(12);
                    if lifted as i16 <= highest as i16 + 7 {
                        note = lifted;
                    }
                }
                note
            } else {
                match choose(&mut self.rng, &scale_tones) {
                    Some(note) => note,
                    None => choose(&mut self.rng, &chord.notes).unwrap_or(root),
                }
            };

            melody.push(MelodyNote::new(pitch, time, step));
        }
    }

    fn conjunct(
        &mut self,
        chord: &Chord,
        span: ChordSpan,
        step: u32,
        scale: &[MidiNote],
        melody: &mut Vec<MelodyNote>,
    ) {
        let lowest = chord.lowest() as i16;
        let highest = chord.highest() as i16;

        let in_range: Vec<MidiNote> = scale
            .iter()
            .copied()
            .filter(|&n| n as i16 >= lowest - 5 && n as i16 <= highest + 7)
            .collect();

        let starting = match melody.last() {
            Some(previous) => previous.pitch,
            None => {
                let mut note = choose(&mut self.rng, &chord.notes).unwrap_or(chord.root) as i16;
                while note > highest + 4 {
                    note -= 12;
                }
                while note < lowest - 2 {
                    note += 12;
                }
                note.clamp(0, 127) as MidiNote
            }
        };

        for i in 0..span.len() / step {
            let time = span.start + i * step;
            if !self.plays() {
                continue;
            }

            if i == 0 {
                melody.push(MelodyNote::new(starting, time, step));
                continue;
            }

            let previous = melody.last().map(|n| n.pitch).unwrap_or(starting);
            let distance = |n: MidiNote| (n as i16 - previous as i16).abs();
            let stepwise: Vec<MidiNote> = in_range.iter().copied().filter(|&n| distance(n) <= 2).collect();
            let leaps: Vec<MidiNote> = in_range
                .iter()
                .copied()
                .filter(|&n| distance(n) > 2 && distance(n) <= 4)
                .collect();

            let options = if self.rng.chance(STEPWISE_CHANCE) || leaps.is_empty() {
                &stepwise
            } else {
                &leaps
            };

            let mut note = match choose(&mut self.rng, options) {
                Some(note) => note,
                None => closest(&in_range, previous).unwrap_or(previous),
            };

            if i % 4 == 0 && self.rng.chance(STRONG_BEAT_SNAP_CHANCE) {
                note = closest(&chord.notes, note).unwrap_or(note);
            }

            melody.push(MelodyNote::new(note, time, step));
        }
    }
}

/// The candidate nearest to `target`; ties keep the earlier candidate
fn closest(candidates: &[MidiNote], target: MidiNote) -> Option<MidiNote> {
    candidates
        .iter()
        .copied()
        .min_by_key(|&n| (n as i16 - target as i16).abs())
}

/// Pull every note within an octave of its predecessor.
///
/// Notes move by whole octaves toward the previous note, so running the
/// pass again changes nothing.
pub fn smooth_leaps(melody: &mut [MelodyNote]) {
    for i in 1..melody.len() {
        let previous = melody[i - 1].pitch as i16;
        let mut pitch = melody[i].pitch as i16;
        while (pitch - previous).abs() > 12 {
            if pitch > previous {
                pitch -= 12;
            } else {
                pitch += 12;
            }
        }
        melody[i].pitch = pitch.clamp(0, 127) as MidiNote;
    }
}

/// Shift notes by octaves into `[lowest - 5, highest + 7]`
pub fn constrain_range(melody: &mut [MelodyNote], lowest: MidiNote, highest: MidiNote) {
    let min = lowest as i16 - 5;
    let max = highest as i16 + 7;

    for note in melody.iter_mut() {
        let mut pitch = note.pitch as i16;
        while pitch > max {
            pitch -= 12;
        }
        while pitch < min {
            pitch += 12;
        }
        note.pitch = pitch.clamp(0, 127) as MidiNote;
    }
}

/// Each chord's own tones, lowest first, one per grid slot
fn ascending_chord_tones(chords: &[Chord], spans: &[ChordSpan], step: u32) -> Vec<MelodyNote> {
    let mut melody = Vec::new();
    for (chord, span) in chords.iter().zip(spans) {
        let mut tones = chord.notes.clone();
        tones.sort_unstable();
        for (i, &pitch) in tones.iter().enumerate() {
            let time = span.start + i as u32 * step;
            if time + step > span.end {
                break;
            }
            melody.push(MelodyNote::new(pitch, time, step));
        }
    }
    melody
}

/// Give every silent chord its root at the chord start.
///
/// With `add_fifths`, chords of at least half a bar also get the fifth at
/// their midpoint. Returns the number of notes added.
fn fill_silent_chords(
    melody: &mut Vec<MelodyNote>,
    chords: &[Chord],
    spans: &[ChordSpan],
    step: u32,
    add_fifths: bool,
) -> usize {
    let before = melody.len();

    for (chord, &span) in chords.iter().zip(spans) {
        if span.is_empty() || melody.iter().any(|n| span.contains(n.start)) {
            continue;
        }

        melody.push(MelodyNote::new(chord.root, span.start, step.min(span.len())));

        if add_fifths && span.len() >= 8 && step <= 4 {
            let middle = span.start + span.len() / 2;
            melody.push(MelodyNote::new(chord.root.saturating_add(7), middle, step));
        }
    }

    melody.len() - before
}

impl<R: RandomSource> Generator for MelodyGenerator<R> {
    fn set_param(&mut self, name: &str, value: f64) {
        match name {
            "complexity" => {
                self.config.complexity = (value as u8).clamp(MIN_COMPLEXITY, MAX_COMPLEXITY);
            }
            "rhythm" => self.config.rhythm = RhythmPattern::from_value(value as u8),
            "arpeggio" => self.config.arpeggio = ArpeggioPattern::from_value(value as u8),
            "quantize" => {
                if let Some(quantize) = Quantize::from_step(value as u32) {
                    self.config.quantize = quantize;
                }
            }
            _ => {}
        }
    }

    fn get_param(&self, name: &str) -> Option<f64> {
        match name {
            "complexity" => Some(self.config.complexity as f64),
            "rhythm" => Some(self.config.rhythm.to_value() as f64),
            "arpeggio" => Some(self.config.arpeggio.to_value() as f64),
            "quantize" => Some(self.config.quantize.step() as f64),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        "melody"
    }

    fn params(&self) -> HashMap<String, f64> {
        ["complexity", "rhythm", "arpeggio", "quantize"]
            .iter()
            .filter_map(|&p| self.get_param(p).map(|v| (p.to_string(), v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{SequenceRandom, SIXTEENTHS_PER_BAR};
    use crate::music::{build_chord, scale_degrees, ChordType};

    fn progression(degrees: &[usize], durations: &[f64]) -> Progression {
        let scale = scale_degrees(Note::C, Mode::Major);
        let chords = degrees
            .iter()
            .zip(durations)
            .map(|(&degree, &bars)| {
                let mut chord = build_chord(&scale, degree, ChordType::Triad, Mode::Major);
                chord.duration_bars = bars;
                chord
            })
            .collect();
        Progression {
            key: Note::C,
            mode: Mode::Major,
            template: "test".to_string(),
            chords,
        }
    }

    fn pop() -> Progression {
        progression(&[0, 4, 5, 3], &[1.0; 4])
    }

    fn config(rhythm: RhythmPattern, quantize: Quantize, complexity: u8) -> MelodyConfig {
        MelodyConfig {
            rhythm,
            quantize,
            complexity,
            ..Default::default()
        }
    }

    fn notes(pitches: &[MidiNote]) -> Vec<MelodyNote> {
        pitches
            .iter()
            .enumerate()
            .map(|(i, &p)| MelodyNote::new(p, i as u32 * 2, 2))
            .collect()
    }

    #[test]
    fn test_selectors() {
        assert_eq!(RhythmPattern::from_id("Conjunct"), Some(RhythmPattern::Conjunct));
        assert_eq!(RhythmPattern::from_id("swing"), None);
        assert_eq!(
            RhythmPattern::resolve("swing", SelectorPolicy::Lenient),
            Ok(RhythmPattern::Varied)
        );
        assert_eq!(Quantize::from_id("sixteenth"), Some(Quantize::Sixteenth));
        assert_eq!(Quantize::from_id("4"), Some(Quantize::Quarter));
        assert_eq!(Quantize::from_id("3"), None);
        assert_eq!(
            Quantize::resolve("whole", SelectorPolicy::Strict),
            Err(InvalidSelectorError::Quantize("whole".into()))
        );
        assert_eq!(Quantize::default().step(), 2);
    }

    #[test]
    fn test_notes_stay_inside_progression() {
        let progressions = [
            pop(),
            progression(&[1, 4, 0], &[2.0, 1.0, 1.0]),
            progression(&[0, 5], &[2.0, 2.0]),
            progression(&[0, 3, 4, 0, 5], &[0.8; 5]),
        ];

        for progression in &progressions {
            let total = (progression.total_bars() * SIXTEENTHS_PER_BAR as f64).round() as u32;
            for rhythm in RhythmPattern::ALL {
                for quantize in Quantize::ALL {
                    for pattern in ArpeggioPattern::ALL {
                        let mut gen = MelodyGenerator::new(MelodyConfig {
                            arpeggio: pattern,
                            ..config(rhythm, quantize, 70)
                        });
                        for note in gen.generate(progression) {
                            assert!(note.duration > 0);
                            assert!(note.end() <= total, "{:?} past {}", note, total);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_never_fewer_notes_than_chords() {
        let progression = pop();
        for rhythm in RhythmPattern::ALL {
            let mut gen = MelodyGenerator::new(config(rhythm, Quantize::Quarter, MIN_COMPLEXITY));
            for _ in 0..100 {
                let melody = gen.generate(&progression);
                assert!(melody.len() >= progression.len());
                for span in progression.spans() {
                    assert!(melody.iter().any(|n| span.contains(n.start)));
                }
            }
        }
    }

    #[test]
    fn test_output_is_time_sorted() {
        let mut gen = MelodyGenerator::new(config(RhythmPattern::Varied, Quantize::Sixteenth, 60));
        let melody = gen.generate(&pop());
        for pair in melody.windows(2) {
            assert!(pair[0].start <= pair[1].start);
        }
    }

    #[test]
    fn test_varied_exact_selection() {
        // Every roll is zero: always play, always a chord tone, always the
        // root, always lifted by an octave.
        let rng = SequenceRandom::constant(0.0);
        let mut gen = MelodyGenerator::with_rng(config(RhythmPattern::Varied, Quantize::Eighth, 90), rng);
        let melody = gen.generate(&pop());

        assert_eq!(melody.len(), 32);
        let firsts: Vec<MidiNote> = melody.chunks(8).map(|c| c[0].pitch).collect();
        assert_eq!(firsts, vec![72, 79, 81, 77]);
        assert!(melody[..8].iter().all(|n| n.pitch == 72));
        assert_eq!(melody[9].start, 18);
    }

    #[test]
    fn test_conjunct_holds_starting_note() {
        let rng = SequenceRandom::constant(0.0);
        let mut gen = MelodyGenerator::with_rng(config(RhythmPattern::Conjunct, Quantize::Eighth, 90), rng);
        let melody = gen.generate(&pop());

        assert_eq!(melody.len(), 32);
        assert!(melody[..8].iter().all(|n| n.pitch == 60));
        // The next chord picks up from the previous note.
        assert_eq!(melody[8].pitch, 60);
        assert_eq!(melody[9].pitch, 62);
    }

    #[test]
    fn test_conjunct_moves_in_small_steps() {
        let mut gen = MelodyGenerator::new(config(RhythmPattern::Conjunct, Quantize::Sixteenth, 90));
        let progression = progression(&[0], &[4.0]);
        for _ in 0..20 {
            let melody = gen.generate(&progression);
            let chord_tones = &progression.chords[0].notes;
            for pair in melody.windows(2) {
                let interval = (pair[1].pitch as i16 - pair[0].pitch as i16).abs();
                assert!(
                    interval <= 4 || chord_tones.contains(&pair[1].pitch),
                    "{} -> {}",
                    pair[0].pitch,
                    pair[1].pitch
                );
            }
        }
    }

    #[test]
    fn test_arpeggiation_quarter_notes() {
        let rng = SequenceRandom::constant(0.5);
        let mut gen = MelodyGenerator::with_rng(
            config(RhythmPattern::Arpeggiation, Quantize::Quarter, 50),
            rng,
        );
        let melody = gen.generate(&pop());

        assert_eq!(melody.len(), 16);
        let first_bar: Vec<MidiNote> = melody[..4].iter().map(|n| n.pitch).collect();
        assert_eq!(first_bar, vec![60, 64, 67, 72]);
        assert_eq!(gen.config().arpeggio, ArpeggioPattern::Ascending);
    }

    #[test]
    fn test_silent_arpeggio_advances_pattern() {
        let progression = progression(&[0], &[0.125]);
        let mut gen = MelodyGenerator::new(config(RhythmPattern::Arpeggiation, Quantize::Quarter, 50));
        let melody = gen.generate(&progression);

        assert_eq!(gen.config().arpeggio, ArpeggioPattern::Descending);
        assert_eq!(melody, vec![MelodyNote::new(60, 0, 2)]);
    }

    #[test]
    fn test_fallback_roots_and_fifths() {
        // Rolls of 0.99 never beat the complexity, so nothing is played.
        let rng = SequenceRandom::constant(0.99);
        let mut gen = MelodyGenerator::with_rng(config(RhythmPattern::Varied, Quantize::Eighth, 50), rng);
        let melody = gen.generate(&pop());

        assert_eq!(
            melody,
            vec![
                MelodyNote::new(60, 0, 2),
                MelodyNote::new(67, 8, 2),
                MelodyNote::new(67, 16, 2),
                MelodyNote::new(74, 24, 2),
                MelodyNote::new(69, 32, 2),
                MelodyNote::new(76, 40, 2),
                MelodyNote::new(65, 48, 2),
                MelodyNote::new(72, 56, 2),
            ]
        );
    }

    #[test]
    fn test_empty_progression() {
        let mut gen = MelodyGenerator::new(MelodyConfig::default());
        assert!(gen.generate(&progression(&[], &[])).is_empty());
    }

    #[test]
    fn test_smooth_leaps() {
        let mut melody = notes(&[60, 80, 50, 90]);
        smooth_leaps(&mut melody);
        let pitches: Vec<MidiNote> = melody.iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![60, 68, 62, 66]);
    }

    #[test]
    fn test_smooth_leaps_is_idempotent() {
        let mut gen = MelodyGenerator::new(config(RhythmPattern::Varied, Quantize::Sixteenth, 90));
        let progression = pop();
        for _ in 0..50 {
            let mut melody = gen.generate(&progression);
            smooth_leaps(&mut melody);
            let once = melody.clone();
            smooth_leaps(&mut melody);
            assert_eq!(melody, once);
        }

        let mut wild = notes(&[30, 100, 45, 110, 20]);
        smooth_leaps(&mut wild);
        let once = wild.clone();
        smooth_leaps(&mut wild);
        assert_eq!(wild, once);
    }

    #[test]
    fn test_constrain_range() {
        let mut melody = notes(&[86, 40, 60, 74, 55]);
        constrain_range(&mut melody, 60, 67);
        let pitches: Vec<MidiNote> = melody.iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![74, 64, 60, 74, 55]);
    }

    #[test]
    fn test_complexity_is_clamped() {
        let gen = MelodyGenerator::new(MelodyConfig {
            complexity: 100,
            ..Default::default()
        });
        assert_eq!(gen.config().complexity, MAX_COMPLEXITY);
    }

    #[test]
    fn test_melody_params() {
        let mut gen = MelodyGenerator::new(MelodyConfig::default());
        gen.set_param("complexity", 5.0);
        gen.set_param("rhythm", 1.0);
        gen.set_param("arpeggio", 5.0);
        gen.set_param("quantize", 1.0);
        gen.set_param("quantize", 3.0);

        assert_eq!(gen.get_param("complexity"), Some(10.0));
        assert_eq!(gen.config().rhythm, RhythmPattern::Conjunct);
        assert_eq!(gen.config().arpeggio, ArpeggioPattern::InsideOut);
        assert_eq!(gen.config().quantize, Quantize::Sixteenth);
        assert_eq!(gen.params().len(), 4);
        assert_eq!(gen.name(), "melody");
    }
}
