// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI export for progressions and melodies.
//!
//! Converts chords and melody notes to a flat timed-note list, encodes it
//! and hands the bytes to a [`FileSaveSink`] under the conventional
//! filename.

pub mod midi;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use midi::{MidiEncoder, TimedNote};

use crate::generators::progression::Progression;
use crate::generators::MelodyNote;
use crate::music::{Chord, Mode, Note};

/// MIME type handed to file-save sinks
pub const MIDI_MIME_TYPE: &str = "audio/midi";

/// Prefix of every exported filename
pub const PRODUCT_NAME: &str = "chordlab";

/// What an exported file contains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Progression,
    Melody,
}

impl ExportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportKind::Progression => "progression",
            ExportKind::Melody => "melody",
        }
    }
}

/// Conventional filename, e.g. `chordlab-melody-F#-minor.mid`
pub fn export_filename(kind: ExportKind, key: Note, mode: Mode) -> String {
    format!("{}-{}-{}-{}.mid", PRODUCT_NAME, kind.as_str(), key, mode)
}

/// Destination for exported files
pub trait FileSaveSink {
    /// Save `buffer` under `filename`
    fn save(&mut self, buffer: &[u8], filename: &str, mime_type: &str) -> Result<()>;
}

/// Saves files into a directory, creating it when missing
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where `filename` ends up
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }
}

impl FileSaveSink for DirectorySink {
    fn save(&mut self, buffer: &[u8], filename: &str, mime_type: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output directory: {}", self.dir.display()))?;

        let path = self.path_for(filename);
        fs::write(&path, buffer)
            .with_context(|| format!("Failed to write file: {}", path.display()))?;

        tracing::info!("Saved {} ({} bytes, {})", path.display(), buffer.len(), mime_type);
        Ok(())
    }
}

/// Every chord tone, starting with its chord and held for the chord's span
pub fn progression_to_notes(chords: &[Chord]) -> Vec<TimedNote> {
    chords
        .iter()
        .zip(crate::generators::chord_spans(chords))
        .flat_map(|(chord, span)| {
            chord
                .notes
                .iter()
                .map(move |&pitch| TimedNote::new(pitch, span.start, span.len()))
        })
        .filter(|note| note.duration > 0)
        .collect()
}

/// Melody notes as encoder input
pub fn melody_to_notes(melody: &[MelodyNote]) -> Vec<TimedNote> {
    melody
        .iter()
        .map(|n| TimedNote::new(n.pitch, n.start, n.duration))
        .collect()
}

/// Encode the progression's chords and save them; returns the filename used
pub fn export_progression<S: FileSaveSink + ?Sized>(
    progression: &Progression,
    bpm: f64,
    sink: &mut S,
) -> Result<String> {
    let filename = export_filename(ExportKind::Progression, progression.key, progression.mode);
    let buffer = midi::encode(&progression_to_notes(&progression.chords), bpm);
    sink.save(&buffer, &filename, MIDI_MIME_TYPE)
        .with_context(|| format!("Failed to export {}", filename))?;
    Ok(filename)
}

/// Encode a melody and save it; returns the filename used
pub fn export_melody<S: FileSaveSink + ?Sized>(
    melody: &[MelodyNote],
    key: Note,
    mode: Mode,
    bpm: f64,
    sink: &mut S,
) -> Result<String> {
    let filename = export_filename(ExportKind::Melody, key, mode);
    let buffer = midi::encode(&melody_to_notes(melody), bpm);
    sink.save(&buffer, &filename, MIDI_MIME_TYPE)
        .with_context(|| format!("Failed to export {}", filename))?;
    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::{build_chord, scale_degrees, ChordType};

    fn progression() -> Progression {
        let scale = scale_degrees(Note::C, Mode::Major);
        let chords = [(0, 2.0), (4, 1.0), (0, 1.0)]
            .iter()
            .map(|&(degree, bars)| {
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

    #[test]
    fn test_filenames() {
        assert_eq!(
            export_filename(ExportKind::Progression, Note::C, Mode::Major),
            "chordlab-progression-C-major.mid"
        );
        assert_eq!(
            export_filename(ExportKind::Melody, Note::Fs, Mode::Minor),
            "chordlab-melody-F#-minor.mid"
        );
    }

    #[test]
    fn test_progression_to_notes() {
        let notes = progression_to_notes(&progression().chords);
        assert_eq!(notes.len(), 9);
        assert_eq!(notes[0], TimedNote::new(60, 0, 32));
        assert_eq!(notes[3], TimedNote::new(67, 32, 16));
        assert_eq!(notes[8], TimedNote::new(67, 48, 16));
    }

    #[test]
    fn test_melody_to_notes() {
        let melody = vec![MelodyNote::new(72, 4, 2)];
        assert_eq!(melody_to_notes(&melody), vec![TimedNote::new(72, 4, 2)]);
    }

    #[test]
    fn test_directory_sink() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path().join("midi"));

        let filename = export_progression(&progression(), 100.0, &mut sink).unwrap();
        assert_eq!(filename, "chordlab-progression-C-major.mid");

        let saved = std::fs::read(sink.path_for(&filename)).unwrap();
        let expected = midi::encode(&progression_to_notes(&progression().chords), 100.0);
        assert_eq!(saved, expected);
    }

    #[test]
    fn test_export_melody() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path());
        let melody = vec![MelodyNote::new(60, 0, 4), MelodyNote::new(62, 4, 4)];

        let filename = export_melody(&melody, Note::A, Mode::Minor, 120.0, &mut sink).unwrap();
        assert_eq!(filename, "chordlab-melody-A-minor.mid");
        assert!(sink.path_for(&filename).exists());
    }
}
