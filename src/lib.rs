// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! chordlab - chord progression and melody generator.
//!
//! Builds diatonic chord progressions in a chosen key and mode, writes a
//! melody over them, and exports both as Standard MIDI Files.

pub mod config;
pub mod error;
pub mod export;
pub mod generators;
pub mod music;
pub mod playback;

pub use config::{validate_config, Session, SessionFile};
pub use error::{InvalidSelectorError, SelectorPolicy};
pub use export::{DirectorySink, FileSaveSink, MidiEncoder, TimedNote};
pub use generators::arpeggio::ArpeggioPattern;
pub use generators::melody::{MelodyConfig, MelodyGenerator, Quantize, RhythmPattern};
pub use generators::progression::{Progression, ProgressionConfig, ProgressionGenerator};
pub use generators::{Generator, MelodyNote, RandomSource, SequenceRandom, StdRandom};
pub use music::{build_chord, Chord, ChordType, MidiNote, Mode, Note, Scale};
pub use playback::{AudioContext, Pacing, PlaybackMode, PlaybackSink, RecordingSink};
