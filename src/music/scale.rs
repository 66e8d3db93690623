// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Scale and key tables.
//!
//! Provides the twelve key pitch classes, the major/minor modes with their
//! interval sets and Roman-numeral labels, and scale construction in both
//! pitch-class and absolute MIDI form.

use std::fmt;

use serde::{Deserialize, Serialize};

/// MIDI note number type (0-127)
pub type MidiNote = u8;

/// Semitone offset type
pub type Semitones = i8;

/// MIDI value of each key's tonic in the reference octave (C4 = 60)
pub const REFERENCE_OCTAVE_BASE: MidiNote = 60;

/// Note names (pitch classes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Note {
    C,
    Cs, // C# / Db
    D,
    Ds, // D# / Eb
    E,
    F,
    Fs, // F# / Gb
    G,
    Gs, // G# / Ab
    A,
    As, // A# / Bb
    B,
}

impl Note {
    /// All notes in chromatic order
    pub const ALL: [Note; 12] = [
        Note::C,
        Note::Cs,
        Note::D,
        Note::Ds,
        Note::E,
        Note::F,
        Note::Fs,
        Note::G,
        Note::Gs,
        Note::A,
        Note::As,
        Note::B,
    ];

    /// Get the pitch class (0-11) for this note
    pub fn pitch_class(self) -> u8 {
        match self {
            Note::C => 0,
            Note::Cs => 1,
            Note::D => 2,
            Note::Ds => 3,
            Note::E => 4,
            Note::F => 5,
            Note::Fs => 6,
            Note::G => 7,
            Note::Gs => 8,
            Note::A => 9,
            Note::As => 10,
            Note::B => 11,
        }
    }

    /// Get note from pitch class
    pub fn from_pitch_class(pc: u8) -> Self {
        Note::ALL[(pc % 12) as usize]
    }

    /// Parse note from string (e.g., "C", "C#", "Db", or a key label like "C#/Db")
    pub fn from_str(s: &str) -> Option<Self> {
        // Key labels carry both spellings; the sharp spelling comes first.
        let s = s.split('/').next().unwrap_or(s);
        let s = s.trim().to_uppercase();
        match s.as_str() {
            "C" => Some(Note::C),
            "C#" | "CS" | "DB" => Some(Note::Cs),
            "D" => Some(Note::D),
            "D#" | "DS" | "EB" => Some(Note::Ds),
            "E" | "FB" => Some(Note::E),
            "F" | "E#" | "ES" => Some(Note::F),
            "F#" | "FS" | "GB" => Some(Note::Fs),
            "G" => Some(Note::G),
            "G#" | "GS" | "AB" => Some(Note::Gs),
            "A" => Some(Note::A),
            "A#" | "AS" | "BB" => Some(Note::As),
            "B" | "CB" => Some(Note::B),
            _ => None,
        }
    }

    /// Key-selector label, with both enharmonic spellings for black keys
    pub fn key_label(self) -> &'static str {
        match self {
            Note::C => "C",
            Note::Cs => "C#/Db",
            Note::D => "D",
            Note::Ds => "D#/Eb",
            Note::E => "E",
            Note::F => "F",
            Note::Fs => "F#/Gb",
            Note::G => "G",
            Note::Gs => "G#/Ab",
            Note::A => "A",
            Note::As => "A#/Bb",
            Note::B => "B",
        }
    }

    /// MIDI value of this note in the reference octave (C = 60 ... B = 71)
    pub fn midi_value(self) -> MidiNote {
        REFERENCE_OCTAVE_BASE + self.pitch_class()
    }

    /// Transpose by semitones
    pub fn transpose(self, semitones: Semitones) -> Self {
        let new_pc = (self.pitch_class() as i8 + semitones).rem_euclid(12) as u8;
        Note::from_pitch_class(new_pc)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Note::C => write!(f, "C"),
            Note::Cs => write!(f, "C#"),
            Note::D => write!(f, "D"),
            Note::Ds => write!(f, "D#"),
            Note::E => write!(f, "E"),
            Note::F => write!(f, "F"),
            Note::Fs => write!(f, "F#"),
            Note::G => write!(f, "G"),
            Note::Gs => write!(f, "G#"),
            Note::A => write!(f, "A"),
            Note::As => write!(f, "A#"),
            Note::B => write!(f, "B"),
        }
    }
}

/// Scale modes supported by the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Major,
    Minor,
}

const MAJOR_INTERVALS: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
const MINOR_INTERVALS: [u8; 7] = [0, 2, 3, 5, 7, 8, 10];

const MAJOR_NUMERALS: [&str; 7] = ["I", "ii", "iii", "IV", "V", "vi", "vii°"];
const MINOR_NUMERALS: [&str; 7] = ["i", "ii°", "III", "iv", "v", "VI", "VII"];

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Major, Mode::Minor];

    /// Get the intervals (semitones from root) for this mode
    pub fn intervals(self) -> &'static [u8; 7] {
        match self {
            Mode::Major => &MAJOR_INTERVALS,
            Mode::Minor => &MINOR_INTERVALS,
        }
    }

    /// Roman numerals for each scale degree
    pub fn numerals(self) -> &'static [&'static str; 7] {
        match self {
            Mode::Major => &MAJOR_NUMERALS,
            Mode::Minor => &MINOR_NUMERALS,
        }
    }

    /// Roman numeral for a 0-based scale degree (wraps past the seventh)
    pub fn numeral(self, degree: usize) -> &'static str {
        self.numerals()[degree % 7]
    }

    /// 0-based degrees whose triad takes a minor suffix in this mode
    pub fn minor_degrees(self) -> &'static [usize] {
        match self {
            Mode::Major => &[1, 2, 5],
            Mode::Minor => &[0, 3, 4],
        }
    }

    /// Parse mode from string
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "major" | "ionian" | "maj" => Some(Mode::Major),
            "minor" | "aeolian" | "naturalminor" | "natural_minor" | "min" => Some(Mode::Minor),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A seven-note scale built on a key
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    root: Note,
    mode: Mode,
    notes: Vec<Note>,
}

impl Scale {
    /// Create a new scale from root and mode
    pub fn new(root: Note, mode: Mode) -> Self {
        let notes = mode
            .intervals()
            .iter()
            .map(|&i| root.transpose(i as Semitones))
            .collect();

        Self { root, mode, notes }
    }

    /// Get the root note
    pub fn root(&self) -> Note {
        self.root
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Pitch classes of the scale, tonic first
    pub fn degrees(&self) -> &[Note] {
        &self.notes
    }

    /// Check if a MIDI note's pitch class is in this scale
    pub fn contains_midi(&self, midi_note: MidiNote) -> bool {
        self.notes.contains(&Note::from_pitch_class(midi_note % 12))
    }

    /// Absolute scale pitches over `octaves` octaves, starting at the
    /// root's reference-octave MIDI value
    pub fn midi_notes(&self, octaves: u8) -> Vec<MidiNote> {
        let root = self.root.midi_value() as u16;
        let mut notes = Vec::with_capacity(octaves as usize * 7);

        for octave in 0..octaves as u16 {
            for &interval in self.mode.intervals() {
                let note = root + interval as u16 + octave * 12;
                if note <= 127 {
                    notes.push(note as MidiNote);
                }
            }
        }

        notes
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.root, self.mode)
    }
}

/// The seven pitch classes of `key` in `mode`
pub fn scale_degrees(key: Note, mode: Mode) -> Vec<Note> {
    Scale::new(key, mode).notes
}

/// Scale pitches across `octaves` octaves above the key's reference value
pub fn scale_notes(key: Note, mode: Mode, octaves: u8) -> Vec<MidiNote> {
    Scale::new(key, mode).midi_notes(octaves)
}

/// Scientific pitch name (60 -> "C4")
pub fn midi_note_name(note: MidiNote) -> String {
    let octave = (note / 12) as i8 - 1;
    format!("{}{}", Note::from_pitch_class(note % 12), octave)
}
