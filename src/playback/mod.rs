// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback of generated progressions and melodies.
//!
//! The engine does not make sound itself. It converts chords and melody
//! notes into a time-ordered schedule in seconds, using a caller-owned
//! [`AudioContext`] for tempo, volume and what to play, and hands each event
//! to a [`PlaybackSink`].

pub mod midi_port;

pub use midi_port::{MidiMessageSink, MidiOutput};
#[cfg(feature = "midi-out")]
pub use midi_port::{list_ports, open_port, MidirOutput};

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::generators::progression::Progression;
use crate::generators::MelodyNote;
use crate::music::MidiNote;

/// Beats in one 4/4 bar
const BEATS_PER_BAR: f64 = 4.0;

/// Sixteenth notes in one bar
const SIXTEENTHS_PER_BAR: f64 = crate::generators::SIXTEENTHS_PER_BAR as f64;

/// Longest single sleep while pacing in real time
const PACING_SLICE: Duration = Duration::from_millis(5);

/// Something that can sound chords and notes
pub trait PlaybackSink {
    /// Start a single note lasting `duration_seconds`
    fn play_note(&mut self, pitch: MidiNote, duration_seconds: f64) -> Result<()>;

    /// Start a chord lasting `duration_seconds`
    fn play_chord(&mut self, pitches: &[MidiNote], duration_seconds: f64) -> Result<()>;

    /// Set output volume as a percentage (0-100)
    fn set_volume(&mut self, percent: u8) -> Result<()>;

    /// Called regularly while waiting for the next event
    fn advance(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called once after the last event has finished
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Which parts of the music are played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    #[default]
    Both,
    Chords,
    Melody,
}

impl PlaybackMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "both" | "all" => Some(PlaybackMode::Both),
            "chords" | "chord" => Some(PlaybackMode::Chords),
            "melody" => Some(PlaybackMode::Melody),
            _ => None,
        }
    }

    pub fn plays_chords(self) -> bool {
        matches!(self, PlaybackMode::Both | PlaybackMode::Chords)
    }

    pub fn plays_melody(self) -> bool {
        matches!(self, PlaybackMode::Both | PlaybackMode::Melody)
    }
}

impl fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackMode::Both => write!(f, "both"),
            PlaybackMode::Chords => write!(f, "chords"),
            PlaybackMode::Melody => write!(f, "melody"),
        }
    }
}

/// Playback settings owned by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct AudioContext {
    /// Tempo in BPM
    pub bpm: f64,
    /// Volume percentage (0-100)
    pub volume: u8,
    pub mode: PlaybackMode,
    /// Times the schedule is played back to back (at least 1)
    pub repeat: u32,
}

impl Default for AudioContext {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            volume: 75,
            mode: PlaybackMode::Both,
            repeat: 1,
        }
    }
}

impl AudioContext {
    /// Length of one 4/4 bar
    pub fn seconds_per_bar(&self) -> f64 {
        BEATS_PER_BAR * 60.0 / self.bpm.max(1.0)
    }

    pub fn bars_to_seconds(&self, bars: f64) -> f64 {
        bars * self.seconds_per_bar()
    }

    pub fn sixteenths_to_seconds(&self, sixteenths: u32) -> f64 {
        sixteenths as f64 * self.seconds_per_bar() / SIXTEENTHS_PER_BAR
    }

    /// Output gain for the current volume
    pub fn gain_db(&self) -> f64 {
        volume_to_db(self.volume)
    }
}

/// Map a volume percentage onto -60..0 dB; zero is silence
pub fn volume_to_db(percent: u8) -> f64 {
    if percent == 0 {
        f64::NEG_INFINITY
    } else {
        -60.0 + (percent.min(100) as f64 / 100.0) * 60.0
    }
}

/// What a scheduled event plays
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackAction {
    /// Chord `index` of the progression
    Chord { index: usize, pitches: Vec<MidiNote> },
    Note { pitch: MidiNote },
}

/// A single scheduled event, timed in seconds from the top of the phrase
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackEvent {
    pub at: f64,
    pub duration: f64,
    pub action: PlaybackAction,
}

/// Build the time-ordered schedule for one pass through the phrase.
///
/// Chords are placed at their cumulative bar position and held for their
/// full duration; melody notes use their sixteenth-note timing. At equal
/// times chords come before notes.
pub fn schedule(progression: &Progression, melody: &[MelodyNote], ctx: &AudioContext) -> Vec<PlaybackEvent> {
    let mut events = Vec::new();

    if ctx.mode.plays_chords() {
        let mut bars = 0.0;
        for (index, chord) in progression.chords.iter().enumerate() {
            events.push(PlaybackEvent {
                at: ctx.bars_to_seconds(bars),
                duration: ctx.bars_to_seconds(chord.duration_bars),
                action: PlaybackAction::Chord {
                    index,
                    pitches: chord.notes.clone(),
                },
            });
            bars += chord.duration_bars;
        }
    }

    if ctx.mode.plays_melody() {
        for note in melody {
            events.push(PlaybackEvent {
                at: ctx.sixteenths_to_seconds(note.start),
                duration: ctx.sixteenths_to_seconds(note.duration),
                action: PlaybackAction::Note { pitch: note.pitch },
            });
        }
    }

    events.sort_by(|a, b| a.at.total_cmp(&b.at));
    events
}

/// How `perform` waits between events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Hand every event over at once
    Immediate,
    /// Wait for each event's time on the wall clock
    RealTime,
}

/// Play `events` through `sink`, `ctx.repeat` times.
///
/// `phrase_seconds` is the length of one pass; later passes are offset by
/// it.
pub fn perform<S: PlaybackSink + ?Sized>(
    events: &[PlaybackEvent],
    phrase_seconds: f64,
    ctx: &AudioContext,
    sink: &mut S,
    pacing: Pacing,
) -> Result<()> {
    sink.set_volume(ctx.volume)?;
    let started = Instant::now();
    let passes = ctx.repeat.max(1);

    for pass in 0..passes {
        let offset = pass as f64 * phrase_seconds;
        tracing::debug!("Playback pass {} of {}", pass + 1, passes);

        for event in events {
            if pacing == Pacing::RealTime {
                wait_until(started, offset + event.at, sink)?;
            }
            match &event.action {
                PlaybackAction::Chord { pitches, .. } => sink.play_chord(pitches, event.duration)?,
                PlaybackAction::Note { pitch } => sink.play_note(*pitch, event.duration)?,
            }
        }
    }

    if pacing == Pacing::RealTime {
        wait_until(started, passes as f64 * phrase_seconds, sink)?;
    }
    sink.finish()
}

fn wait_until<S: PlaybackSink + ?Sized>(started: Instant, at_seconds: f64, sink: &mut S) -> Result<()> {
    let target = started + Duration::from_secs_f64(at_seconds.max(0.0));
    loop {
        sink.advance()?;
        let now = Instant::now();
        if now >= target {
            return Ok(());
        }
        thread::sleep((target - now).min(PACING_SLICE));
    }
}

/// A call received by a [`RecordingSink`]
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Note { pitch: MidiNote, duration: f64 },
    Chord { pitches: Vec<MidiNote>, duration: f64 },
    Volume(u8),
}

/// Sink that records every call instead of making sound
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub calls: Vec<SinkCall>,
    finished: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl PlaybackSink for RecordingSink {
    fn play_note(&mut self, pitch: MidiNote, duration_seconds: f64) -> Result<()> {
        self.calls.push(SinkCall::Note {
            pitch,
            duration: duration_seconds,
        });
        Ok(())
    }

    fn play_chord(&mut self, pitches: &[MidiNote], duration_seconds: f64) -> Result<()> {
        self.calls.push(SinkCall::Chord {
            pitches: pitches.to_vec(),
            duration: duration_seconds,
        });
        Ok(())
    }

    fn set_volume(&mut self, percent: u8) -> Result<()> {
        self.calls.push(SinkCall::Volume(percent));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
