// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord progression generator.
//!
//! Picks a common progression template for the mode, stretches or trims it
//! to the requested chord count, splits the four-bar phrase between the
//! chords and builds each chord with a randomly chosen enabled chord type.

use std::collections::HashMap;

use serde::Serialize;

use super::{chord_spans, choose, ChordSpan, Generator, RandomSource, StdRandom, PHRASE_BARS};
use crate::error::{InvalidSelectorError, SelectorPolicy};
use crate::music::{build_chord, scale_degrees, Chord, ChordType, MidiNote, Mode, Note};

/// A named sequence of 0-based scale degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionTemplate {
    pub name: &'static str,
    pub degrees: &'static [usize],
}

const MAJOR_TEMPLATES: [ProgressionTemplate; 5] = [
    ProgressionTemplate { name: "I-IV-V-I (Classic)", degrees: &[0, 3, 4, 0] },
    ProgressionTemplate { name: "I-V-vi-IV (Pop)", degrees: &[0, 4, 5, 3] },
    ProgressionTemplate { name: "ii-V-I (Jazz)", degrees: &[1, 4, 0] },
    ProgressionTemplate { name: "I-vi-IV-V (50s)", degrees: &[0, 5, 3, 4] },
    ProgressionTemplate { name: "I-IV-vi-V (Hopeful)", degrees: &[0, 3, 5, 4] },
];

const MINOR_TEMPLATES: [ProgressionTemplate; 5] = [
    ProgressionTemplate { name: "i-iv-v-i (Classic)", degrees: &[0, 3, 4, 0] },
    ProgressionTemplate { name: "i-VI-III-VII (Epic)", degrees: &[0, 5, 2, 6] },
    ProgressionTemplate { name: "i-iv-VII-III (Emotional)", degrees: &[0, 3, 6, 2] },
    ProgressionTemplate { name: "i-VII-VI-VII (Rock)", degrees: &[0, 6, 5, 6] },
    ProgressionTemplate { name: "i-v-VI-VII (Andalusian)", degrees: &[0, 4, 5, 6] },
];

/// Progression templates for a mode
pub fn templates(mode: Mode) -> &'static [ProgressionTemplate] {
    match mode {
        Mode::Major => &MAJOR_TEMPLATES,
        Mode::Minor => &MINOR_TEMPLATES,
    }
}

/// Repeat a template's degrees cyclically and cut to exactly `count`
pub fn fit_degrees(template: &ProgressionTemplate, count: usize) -> Vec<usize> {
    if template.degrees.is_empty() {
        return vec![0; count];
    }
    template.degrees.iter().copied().cycle().take(count).collect()
}

/// Bar durations for `count` chords, summing to one four-bar phrase
pub fn duration_split<R: RandomSource + ?Sized>(count: usize, rng: &mut R) -> Vec<f64> {
    let mut durations = match count {
        0 => return Vec::new(),
        2 => vec![2.0, 2.0],
        3 => {
            if rng.chance(0.5) {
                vec![2.0, 1.0, 1.0]
            } else {
                vec![1.0, 1.0, 2.0]
            }
        }
        4 => vec![1.0, 1.0, 1.0, 1.0],
        _ => {
            tracing::warn!("Unexpected number of chords: {}. Using equal distribution.", count);
            vec![PHRASE_BARS / count as f64; count]
        }
    };

    normalize_durations(&mut durations);
    durations
}

/// Rescale durations so they total exactly four bars
pub fn normalize_durations(durations: &mut [f64]) {
    let total: f64 = durations.iter().sum();
    if total > 0.0 && (total - PHRASE_BARS).abs() > 0.001 {
        tracing::warn!("Total chord duration ({}) does not equal {} bars. Adjusting...", total, PHRASE_BARS);
        let factor = PHRASE_BARS / total;
        for d in durations.iter_mut() {
            *d *= factor;
        }
    }
}

/// A generated progression with the key it was built in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progression {
    pub key: Note,
    pub mode: Mode,
    /// Name of the template the degrees came from
    pub template: String,
    pub chords: Vec<Chord>,
}

impl Progression {
    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    /// Total length in bars
    pub fn total_bars(&self) -> f64 {
        super::total_bars(&self.chords)
    }

    /// Sixteenth-note span of each chord
    pub fn spans(&self) -> Vec<ChordSpan> {
        chord_spans(&self.chords)
    }

    /// Lowest chord note across the whole progression
    pub fn lowest(&self) -> Option<MidiNote> {
        self.chords.iter().flat_map(|c| c.notes.iter().copied()).min()
    }

    /// Highest chord note across the whole progression
    pub fn highest(&self) -> Option<MidiNote> {
        self.chords.iter().flat_map(|c| c.notes.iter().copied()).max()
    }
}

/// Configuration for the progression generator
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionConfig {
    pub key: Note,
    pub mode: Mode,
    /// Number of chords in the phrase
    pub chord_count: usize,
    /// Chord types drawn from for each position
    pub chord_types: Vec<ChordType>,
    pub policy: SelectorPolicy,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            key: Note::C,
            mode: Mode::Major,
            chord_count: 4,
            chord_types: vec![ChordType::Triad],
            policy: SelectorPolicy::Lenient,
        }
    }
}

/// Progression generator
pub struct ProgressionGenerator<R = StdRandom> {
    config: ProgressionConfig,
    rng: R,
}

impl ProgressionGenerator<StdRandom> {
    /// Create a generator with an entropy-seeded random source
    pub fn new(config: ProgressionConfig) -> Self {
        Self::with_rng(config, StdRandom::new())
    }
}

impl<R: RandomSource> ProgressionGenerator<R> {
    pub fn with_rng(config: ProgressionConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ProgressionConfig {
        &mut self.config
    }

    /// Generate a fresh progression.
    ///
    /// Only fails in strict mode, when no chord type is enabled or no
    /// chords are requested.
    pub fn generate(&mut self) -> Result<Progression, InvalidSelectorError> {
        let ProgressionConfig {
            key,
            mode,
            chord_count,
            policy,
            ..
        } = self.config;

        if chord_count == 0 {
            if policy.is_strict() {
                return Err(InvalidSelectorError::ChordCount(0));
            }
            tracing::warn!("Progression requested with zero chords");
        }

        let chord_types = if self.config.chord_types.is_empty() {
            policy.resolve(None, vec![ChordType::Triad], InvalidSelectorError::NoChordTypes)?
        } else {
            self.config.chord_types.clone()
        };

        let all = templates(mode);
        let eligible: Vec<ProgressionTemplate> = all
            .iter()
            .filter(|t| t.degrees.len() >= chord_count)
            .copied()
            .collect();
        let pool = if eligible.is_empty() { all } else { &eligible[..] };
        let template = choose(&mut self.rng, pool).unwrap_or(all[0]);

        let degrees = fit_degrees(&template, chord_count);
        let durations = duration_split(chord_count, &mut self.rng);
        tracing::debug!(
            "Template {} -> durations {:?} for {} chords",
            template.name,
            durations,
            chord_count
        );

        let scale = scale_degrees(key, mode);
        let chords = degrees
            .iter()
            .zip(durations)
            .map(|(&degree, duration)| {
                let chord_type = choose(&mut self.rng, chord_types.as_slice()).unwrap_or_default();
                let mut chord = build_chord(&scale, degree, chord_type, mode);
                chord.duration_bars = duration;
                chord
            })
            .collect();

        Ok(Progression {
            key,
            mode,
            template: template.name.to_string(),
            chords,
        })
    }
}

impl<R: RandomSource> Generator for ProgressionGenerator<R> {
    fn set_param(&mut self, name: &str, value: f64) {
        match name {
            "chord_count" => self.config.chord_count = (value as usize).clamp(1, 16),
            "key" => self.config.key = Note::from_pitch_class(value as u8),
            "mode" => {
                self.config.mode = if value >= 0.5 { Mode::Minor } else { Mode::Major };
            }
            _ => {}
        }
    }

    fn get_param(&self, name: &str) -> Option<f64> {
        match name {
            "chord_count" => Some(self.config.chord_count as f64),
            "key" => Some(self.config.key.pitch_class() as f64),
            "mode" => Some(match self.config.mode {
                Mode::Major => 0.0,
                Mode::Minor => 1.0,
            }),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        "progression"
    }

    fn params(&self) -> HashMap<String, f64> {
        ["chord_count", "key", "mode"]
            .iter()
            .filter_map(|&p| self.get_param(p).map(|v| (p.to_string(), v)))
            .collect()
    }
}
