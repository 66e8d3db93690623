// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord types and concrete chord construction.
//!
//! A chord is built from a scale degree and a chord type: the degree's
//! pitch class is resolved to its reference-octave MIDI value and the chord
//! type's intervals are stacked on top of it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::scale::{midi_note_name, MidiNote, Mode, Note};
use crate::error::{InvalidSelectorError, SelectorPolicy};

/// Chord type catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChordType {
    #[default]
    Triad,
    Seventh,
    Major7,
    Minor7,
    Sus4,
    Add9,
}

impl ChordType {
    pub const ALL: [ChordType; 6] = [
        ChordType::Triad,
        ChordType::Seventh,
        ChordType::Major7,
        ChordType::Minor7,
        ChordType::Sus4,
        ChordType::Add9,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ChordType::Triad => "triad",
            ChordType::Seventh => "seventh",
            ChordType::Major7 => "major7",
            ChordType::Minor7 => "minor7",
            ChordType::Sus4 => "sus4",
            ChordType::Add9 => "add9",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChordType::Triad => "Triads",
            ChordType::Seventh => "7th Chords",
            ChordType::Major7 => "Major 7th",
            ChordType::Minor7 => "Minor 7th",
            ChordType::Sus4 => "Sus4",
            ChordType::Add9 => "Add9",
        }
    }

    /// Semitone offsets from the chord root.
    ///
    /// The triad entry is display-only: [`build_chord`] stacks the mode's
    /// own thirds instead, so triad quality follows the degree.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ChordType::Triad => &[0, 4, 7],
            ChordType::Seventh => &[0, 4, 7, 10],
            ChordType::Major7 => &[0, 4, 7, 11],
            ChordType::Minor7 => &[0, 3, 7, 10],
            ChordType::Sus4 => &[0, 5, 7],
            ChordType::Add9 => &[0, 4, 7, 14],
        }
    }

    /// Name suffix before any mode-dependent minor marker
    fn base_suffix(self) -> &'static str {
        match self {
            ChordType::Triad => "",
            ChordType::Seventh => "7",
            ChordType::Major7 => "maj7",
            ChordType::Minor7 => "m7",
            ChordType::Sus4 => "sus4",
            ChordType::Add9 => "add9",
        }
    }

    /// Look up a chord type by catalog id
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim().to_lowercase();
        ChordType::ALL.into_iter().find(|t| t.id() == id)
    }

    /// Resolve an id under `policy`; unknown ids become a triad when lenient
    pub fn resolve(id: &str, policy: SelectorPolicy) -> Result<Self, InvalidSelectorError> {
        policy.resolve(
            Self::from_id(id),
            ChordType::Triad,
            InvalidSelectorError::ChordType(id.to_string()),
        )
    }
}

impl fmt::Display for ChordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Name suffix for a chord type on a 0-based scale degree.
///
/// Only triads pick up the "m" marker; every other type carries its own
/// quality in the suffix.
pub fn chord_suffix(degree: usize, mode: Mode, chord_type: ChordType) -> String {
    let suffix = chord_type.base_suffix();
    if chord_type == ChordType::Triad && mode.minor_degrees().contains(&(degree % 7)) {
        format!("m{}", suffix)
    } else {
        suffix.to_string()
    }
}

/// Root, third and fifth of the triad on a 0-based degree, stacked from the mode's own thirds
pub fn diatonic_triad(mode: Mode, degree: usize) -> [u8; 3] {
    let intervals = mode.intervals();
    let d = degree % 7;
    let above_root = |step: usize| (intervals[(d + step) % 7] + 12 - intervals[d]) % 12;
    [0, above_root(2), above_root(4)]
}

/// A concrete chord placed in a progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    /// Display name (e.g. "Am", "G7")
    pub name: String,
    /// Roman numeral for the scale degree
    pub numeral: String,
    /// MIDI pitches in generation order (never empty)
    pub notes: Vec<MidiNote>,
    /// Tonic of the chord before intervals were added
    pub root: MidiNote,
    /// Length in bars
    pub duration_bars: f64,
}

impl Chord {
    /// Lowest pitch in the chord
    pub fn lowest(&self) -> MidiNote {
        self.notes.iter().copied().min().unwrap_or(self.root)
    }

    /// Highest pitch in the chord
    pub fn highest(&self) -> MidiNote {
        self.notes.iter().copied().max().unwrap_or(self.root)
    }

    /// Whether the display name marks a minor quality
    pub fn is_minor(&self) -> bool {
        self.name.contains('m') && !self.name.contains("maj")
    }

    /// Chord tones as scientific pitch names joined by " - "
    pub fn format_notes(&self) -> String {
        self.notes
            .iter()
            .map(|&n| midi_note_name(n))
            .collect::<Vec<_>>()
            .join(" - ")
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.numeral)
    }
}

/// Chord tones of `chord` as pitch names, e.g. "C4 - E4 - G4"
pub fn format_chord_notes(chord: &Chord) -> String {
    chord.format_notes()
}

/// Build the chord on `degree` (0-based, wraps past the seventh) of a scale.
///
/// The duration defaults to one bar; the progression generator overwrites it.
pub fn build_chord(scale_degrees: &[Note], degree: usize, chord_type: ChordType, mode: Mode) -> Chord {
    let root_note = if scale_degrees.is_empty() {
        Note::C
    } else {
        scale_degrees[degree % scale_degrees.len()]
    };
    let root = root_note.midi_value();

    let triad;
    let intervals: &[u8] = match chord_type {
        ChordType::Triad => {
            triad = diatonic_triad(mode, degree);
            &triad
        }
        _ => chord_type.intervals(),
    };
    let notes = intervals.iter().map(|&interval| root + interval).collect();

    Chord {
        name: format!("{}{}", root_note, chord_suffix(degree, mode, chord_type)),
        numeral: mode.numeral(degree).to_string(),
        notes,
        root,
        duration_bars: 1.0,
    }
}
