// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI file encoder.
//!
//! Writes a format 1 file with two tracks at 480 ticks per quarter note:
//! a tempo track (4/4 time signature and tempo) and a note track on a
//! piano program. Notes that share a start time are written as one chord
//! whose note-offs all fall after the first note's duration.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::music::MidiNote;

/// Ticks per quarter note written to the header
pub const TICKS_PER_QUARTER: u16 = 480;

/// Ticks per sixteenth-note unit
pub const TICKS_PER_SIXTEENTH: u32 = TICKS_PER_QUARTER as u32 / 4;

/// Tempo limits in BPM
pub const MIN_TEMPO: f64 = 20.0;
pub const MAX_TEMPO: f64 = 300.0;

const NOTE_ON_VELOCITY: u8 = 0x64;
const NOTE_OFF_VELOCITY: u8 = 0x40;

/// Acoustic grand piano
const PIANO_PROGRAM: u8 = 0;

/// A note to encode, timed in sixteenth-note units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedNote {
    pub pitch: MidiNote,
    pub start: u32,
    pub duration: u32,
}

impl TimedNote {
    pub fn new(pitch: MidiNote, start: u32, duration: u32) -> Self {
        Self {
            pitch,
            start,
            duration,
        }
    }
}

/// MIDI file encoder
#[derive(Debug, Clone)]
pub struct MidiEncoder {
    /// Tempo in BPM
    tempo: f64,
    /// Program for the note track
    program: u8,
}

impl MidiEncoder {
    /// Create an encoder at `bpm` (clamped to 20-300)
    pub fn new(bpm: f64) -> Self {
        let mut encoder = Self {
            tempo: 120.0,
            program: PIANO_PROGRAM,
        };
        encoder.set_tempo(bpm);
        encoder
    }

    /// Set tempo
    pub fn set_tempo(&mut self, bpm: f64) {
        self.tempo = if bpm.is_finite() {
            bpm.clamp(MIN_TEMPO, MAX_TEMPO)
        } else {
            120.0
        };
    }

    /// Get tempo
    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn set_program(&mut self, program: u8) {
        self.program = program & 0x7F;
    }

    /// Microseconds per quarter note, rounded down
    pub fn microseconds_per_quarter(&self) -> u32 {
        (60_000_000.0 / self.tempo).floor() as u32
    }

    /// Encode `notes` into a complete file
    pub fn encode(&self, notes: &[TimedNote]) -> Vec<u8> {
        let mut buffer = Vec::new();
        write_header(&mut buffer, 1, 2);
        write_chunk(&mut buffer, b"MTrk", &self.tempo_track());
        write_chunk(&mut buffer, b"MTrk", &self.note_track(notes));
        buffer
    }

    /// Write MIDI data to writer
    pub fn write<W: Write>(&self, notes: &[TimedNote], writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.encode(notes))
    }

    /// Export to file
    pub fn export<P: AsRef<Path>>(&self, notes: &[TimedNote], path: P) -> io::Result<()> {
        let mut file = File::create(path)?;
        self.write(notes, &mut file)
    }

    fn tempo_track(&self) -> Vec<u8> {
        let mut track = Vec::new();

        // 4/4, 24 clocks per click, 8 32nds per quarter
        track.extend_from_slice(&[0x00, 0xFF, 0x58, 0x04, 0x04, 0x02, 0x18, 0x08]);

        let microseconds = self.microseconds_per_quarter();
        track.extend_from_slice(&[
            0x00,
            0xFF,
            0x51,
            0x03,
            ((microseconds >> 16) & 0xFF) as u8,
            ((microseconds >> 8) & 0xFF) as u8,
            (microseconds & 0xFF) as u8,
        ]);

        track.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        track
    }

    fn note_track(&self, notes: &[TimedNote]) -> Vec<u8> {
        let mut track = vec![0x00, 0xC0, self.program];

        // Simultaneous notes keep their input order within a group.
        let mut groups: BTreeMap<u32, Vec<&TimedNote>> = BTreeMap::new();
        for note in notes {
            groups.entry(note.start).or_default().push(note);
        }

        let mut last_tick: u64 = 0;
        for (start, group) in &groups {
            let tick = *start as u64 * TICKS_PER_SIXTEENTH as u64;
            write_variable_length(&mut track, delta(tick, last_tick));
            last_tick = tick;

            for (i, note) in group.iter().enumerate() {
                if i > 0 {
                    write_variable_length(&mut track, 0);
                }
                track.extend_from_slice(&[0x90, note.pitch & 0x7F, NOTE_ON_VELOCITY]);
            }

            // The whole group is released after the first note's duration.
            let duration = group[0].duration as u64 * TICKS_PER_SIXTEENTH as u64;
            write_variable_length(&mut track, delta(duration, 0));

            for (i, note) in group.iter().enumerate() {
                if i > 0 {
                    write_variable_length(&mut track, 0);
                }
                track.extend_from_slice(&[0x80, note.pitch & 0x7F, NOTE_OFF_VELOCITY]);
            }

            last_tick += duration;
        }

        track.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        track
    }
}

impl Default for MidiEncoder {
    fn default() -> Self {
        Self::new(120.0)
    }
}

/// Encode `notes` at `bpm`
pub fn encode(notes: &[TimedNote], bpm: f64) -> Vec<u8> {
    MidiEncoder::new(bpm).encode(notes)
}

/// Tick difference, clamped at zero when groups overlap
fn delta(tick: u64, last_tick: u64) -> u32 {
    tick.saturating_sub(last_tick).min(0x0FFF_FFFF) as u32
}

/// Write MIDI file header chunk
fn write_header(buffer: &mut Vec<u8>, format: u16, num_tracks: u16) {
    buffer.extend_from_slice(b"MThd");
    buffer.extend_from_slice(&6u32.to_be_bytes());
    buffer.extend_from_slice(&format.to_be_bytes());
    buffer.extend_from_slice(&num_tracks.to_be_bytes());
    buffer.extend_from_slice(&TICKS_PER_QUARTER.to_be_bytes());
}

fn write_chunk(buffer: &mut Vec<u8>, id: &[u8; 4], data: &[u8]) {
    buffer.extend_from_slice(id);
    buffer.extend_from_slice(&(data.len() as u32).to_be_bytes());
    buffer.extend_from_slice(data);
}

/// Write variable-length quantity, most significant group first
pub fn write_variable_length(buffer: &mut Vec<u8>, mut value: u32) {
    let mut bytes = Vec::with_capacity(4);

    bytes.push((value & 0x7F) as u8);
    value >>= 7;

    while value > 0 {
        bytes.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }

    bytes.reverse();
    buffer.extend_from_slice(&bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER_LEN: usize = 14;
    const TEMPO_TRACK_LEN: usize = 8 + 19;

    fn vlq(value: u32) -> Vec<u8> {
        let mut buffer = Vec::new();
        write_variable_length(&mut buffer, value);
        buffer
    }

    /// Body of the second track chunk
    fn note_track(bytes: &[u8]) -> &[u8] {
        let chunk = &bytes[HEADER_LEN + TEMPO_TRACK_LEN..];
        assert_eq!(&chunk[0..4], b"MTrk");
        let len = u32::from_be_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]) as usize;
        &chunk[8..8 + len]
    }

    #[test]
    fn test_variable_length() {
        assert_eq!(vlq(0), vec![0x00]);
        assert_eq!(vlq(0x40), vec![0x40]);
        assert_eq!(vlq(0x7F), vec![0x7F]);
        assert_eq!(vlq(0x80), vec![0x81, 0x00]);
        assert_eq!(vlq(1920), vec![0x8F, 0x00]);
        assert_eq!(vlq(0x3FFF), vec![0xFF, 0x7F]);
        assert_eq!(vlq(0x20_0000), vec![0x81, 0x80, 0x80, 0x00]);
        assert_eq!(vlq(0x0FFF_FFFF), vec![0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn test_header() {
        let bytes = MidiEncoder::default().encode(&[]);
        assert_eq!(&bytes[0..4], b"MThd");
        assert_eq!(&bytes[4..8], &[0, 0, 0, 6]);
        assert_eq!(&bytes[8..10], &[0, 1]); // Format 1
        assert_eq!(&bytes[10..12], &[0, 2]); // 2 tracks
        assert_eq!(&bytes[12..14], &[0x01, 0xE0]); // 480 PPQN
    }

    #[test]
    fn test_tempo_track() {
        let bytes = encode(&[], 120.0);
        let chunk = &bytes[HEADER_LEN..HEADER_LEN + TEMPO_TRACK_LEN];
        assert_eq!(&chunk[0..8], &[b'M', b'T', b'r', b'k', 0, 0, 0, 19]);
        assert_eq!(&chunk[8..16], &[0x00, 0xFF, 0x58, 0x04, 0x04, 0x02, 0x18, 0x08]);
        // 500000 us per quarter
        assert_eq!(&chunk[16..23], &[0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]);
        assert_eq!(&chunk[23..27], &[0x00, 0xFF, 0x2F, 0x00]);
    }

    #[test]
    fn test_tempo_is_clamped() {
        assert_eq!(MidiEncoder::new(10.0).tempo(), 20.0);
        assert_eq!(MidiEncoder::new(500.0).tempo(), 300.0);
        assert_eq!(MidiEncoder::new(f64::NAN).tempo(), 120.0);
        assert_eq!(MidiEncoder::new(90.0).microseconds_per_quarter(), 666_666);
    }

    #[test]
    fn test_empty_input_is_valid_file() {
        let bytes = encode(&[], 120.0);
        assert_eq!(note_track(&bytes), &[0x00, 0xC0, 0x00, 0x00, 0xFF, 0x2F, 0x00]);
        assert_eq!(bytes.len(), HEADER_LEN + TEMPO_TRACK_LEN + 8 + 7);
    }

    #[test]
    fn test_single_whole_note() {
        let bytes = encode(&[TimedNote::new(60, 0, 16)], 120.0);
        assert_eq!(
            note_track(&bytes),
            &[
                0x00, 0xC0, 0x00, // program change
                0x00, 0x90, 60, 0x64, // note on
                0x8F, 0x00, 0x80, 60, 0x40, // note off after 1920 ticks
                0x00, 0xFF, 0x2F, 0x00,
            ]
        );
    }

    #[test]
    fn test_sequential_notes() {
        let notes = [
            TimedNote::new(60, 0, 2),
            TimedNote::new(62, 4, 2),
        ];
        let bytes = encode(&notes, 120.0);
        assert_eq!(
            note_track(&bytes),
            &[
                0x00, 0xC0, 0x00,
                0x00, 0x90, 60, 0x64,
                0x81, 0x70, 0x80, 60, 0x40, // 240 ticks
                0x81, 0x70, 0x90, 62, 0x64, // rest of 240 ticks
                0x81, 0x70, 0x80, 62, 0x40,
                0x00, 0xFF, 0x2F, 0x00,
            ]
        );
    }

    #[test]
    fn test_chord_released_after_first_duration() {
        // The E is only two sixteenths long but is held with the C.
        let notes = [
            TimedNote::new(60, 0, 16),
            TimedNote::new(64, 0, 2),
            TimedNote::new(67, 0, 16),
        ];
        let bytes = encode(&notes, 120.0);
        assert_eq!(
            note_track(&bytes),
            &[
                0x00, 0xC0, 0x00,
                0x00, 0x90, 60, 0x64,
                0x00, 0x90, 64, 0x64,
                0x00, 0x90, 67, 0x64,
                0x8F, 0x00, 0x80, 60, 0x40,
                0x00, 0x80, 64, 0x40,
                0x00, 0x80, 67, 0x40,
                0x00, 0xFF, 0x2F, 0x00,
            ]
        );
    }

    #[test]
    fn test_overlapping_groups_clamp_delta() {
        let notes = [TimedNote::new(60, 0, 8), TimedNote::new(64, 4, 2)];
        let bytes = encode(&notes, 120.0);
        let track = note_track(&bytes);
        // Second note-on is written with a zero delta after the first release.
        assert_eq!(&track[12..16], &[0x00, 0x90, 64, 0x64]);
    }

    #[test]
    fn test_unsorted_input_is_grouped_by_time() {
        let notes = [TimedNote::new(64, 4, 4), TimedNote::new(60, 0, 4)];
        let bytes = encode(&notes, 120.0);
        let track = note_track(&bytes);
        assert_eq!(&track[3..7], &[0x00, 0x90, 60, 0x64]);
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mid");
        let encoder = MidiEncoder::default();
        let notes = [TimedNote::new(60, 0, 4)];
        encoder.export(&notes, &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), encoder.encode(&notes));
    }
}
