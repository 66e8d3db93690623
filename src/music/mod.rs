// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music theory utilities for chordlab.
//!
//! This module provides the key and mode tables, scale construction, and
//! the chord-type catalog used to build concrete chords.

pub mod chord;
pub mod scale;

pub use chord::{build_chord, format_chord_notes, Chord, ChordType};
pub use scale::{midi_note_name, scale_degrees, scale_notes, MidiNote, Mode, Note, Scale};
