// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback over a MIDI output port.
//!
//! [`MidiMessageSink`] turns playback calls into raw channel messages and
//! releases each note once its duration has elapsed. The port itself sits
//! behind the [`MidiOutput`] trait; with the `midi-out` feature a midir
//! connection provides it.

use std::time::{Duration, Instant};

use anyhow::Result;

use super::PlaybackSink;
use crate::music::MidiNote;

/// MIDI message constants
pub mod messages {
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const CONTROL_CHANGE: u8 = 0xB0;
    pub const CC_VOLUME: u8 = 7;
    pub const CC_ALL_NOTES_OFF: u8 = 123;
}

/// Velocity for chord tones
const CHORD_VELOCITY: u8 = 0x50;
/// Velocity for melody notes
const MELODY_VELOCITY: u8 = 0x64;

/// Something that accepts raw MIDI bytes
pub trait MidiOutput {
    /// Send a MIDI message immediately.
    ///
    /// # Arguments
    /// * `message` - Raw MIDI bytes (e.g., `[0x90, 60, 127]` for Note On)
    fn send(&mut self, message: &[u8]) -> Result<()>;
}

struct PendingOff {
    pitch: MidiNote,
    at: Instant,
}

/// Playback sink that drives a MIDI output on one channel
pub struct MidiMessageSink<O: MidiOutput> {
    output: O,
    channel: u8,
    pending: Vec<PendingOff>,
}

impl<O: MidiOutput> MidiMessageSink<O> {
    pub fn new(output: O) -> Self {
        Self::with_channel(output, 0)
    }

    /// Use MIDI channel `channel` (0-15)
    pub fn with_channel(output: O, channel: u8) -> Self {
        Self {
            output,
            channel: channel & 0x0F,
            pending: Vec::new(),
        }
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    /// Notes still sounding
    pub fn sounding(&self) -> usize {
        self.pending.len()
    }

    fn note_on(&mut self, pitch: MidiNote, velocity: u8, duration_seconds: f64) -> Result<()> {
        let pitch = pitch.min(127);
        self.output.send(&[messages::NOTE_ON | self.channel, pitch, velocity])?;
        self.pending.push(PendingOff {
            pitch,
            at: Instant::now() + Duration::from_secs_f64(duration_seconds.max(0.0)),
        });
        Ok(())
    }

    /// Send note-offs for everything due by `now`
    fn release_due(&mut self, now: Instant) -> Result<()> {
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].at <= now {
                let off = self.pending.swap_remove(i);
                self.output.send(&[messages::NOTE_OFF | self.channel, off.pitch, 0])?;
            } else {
                i += 1;
            }
        }
        Ok(())
    }
}

impl<O: MidiOutput> PlaybackSink for MidiMessageSink<O> {
    fn play_note(&mut self, pitch: MidiNote, duration_seconds: f64) -> Result<()> {
        self.note_on(pitch, MELODY_VELOCITY, duration_seconds)
    }

    fn play_chord(&mut self, pitches: &[MidiNote], duration_seconds: f64) -> Result<()> {
        for &pitch in pitches {
            self.note_on(pitch, CHORD_VELOCITY, duration_seconds)?;
        }
        Ok(())
    }

    fn set_volume(&mut self, percent: u8) -> Result<()> {
        let value = (percent.min(100) as u32 * 127 / 100) as u8;
        self.output
            .send(&[messages::CONTROL_CHANGE | self.channel, messages::CC_VOLUME, value])
    }

    fn advance(&mut self) -> Result<()> {
        self.release_due(Instant::now())
    }

    /// Release whatever is still held, then silence the channel
    fn finish(&mut self) -> Result<()> {
        for off in std::mem::take(&mut self.pending) {
            self.output.send(&[messages::NOTE_OFF | self.channel, off.pitch, 0])?;
        }
        self.output
            .send(&[messages::CONTROL_CHANGE | self.channel, messages::CC_ALL_NOTES_OFF, 0])
    }
}

#[cfg(feature = "midi-out")]
pub use port::{list_ports, open_port, MidirOutput};

#[cfg(feature = "midi-out")]
mod port {
    use anyhow::{anyhow, Context, Result};
    use midir::{MidiOutput as MidirPorts, MidiOutputConnection};

    use super::MidiOutput;

    const CLIENT_NAME: &str = "chordlab";

    /// An open midir output connection
    pub struct MidirOutput {
        connection: MidiOutputConnection,
        name: String,
    }

    impl MidirOutput {
        pub fn port_name(&self) -> &str {
            &self.name
        }
    }

    impl MidiOutput for MidirOutput {
        fn send(&mut self, message: &[u8]) -> Result<()> {
            self.connection
                .send(message)
                .map_err(|e| anyhow!("MIDI send failed: {}", e))
        }
    }

    /// Names of the available output ports
    pub fn list_ports() -> Result<Vec<String>> {
        let output = MidirPorts::new(CLIENT_NAME).map_err(|e| anyhow!("{}", e))?;
        Ok(output
            .ports()
            .iter()
            .map(|p| output.port_name(p).unwrap_or_else(|_| "Unnamed port".to_string()))
            .collect())
    }

    /// Connect to the first port whose name contains `name`, or the first port
    pub fn open_port(name: Option<&str>) -> Result<MidirOutput> {
        let output = MidirPorts::new(CLIENT_NAME).map_err(|e| anyhow!("{}", e))?;
        let ports = output.ports();

        let index = match name {
            Some(wanted) => ports.iter().position(|p| {
                output
                    .port_name(p)
                    .map(|n| n.to_lowercase().contains(&wanted.to_lowercase()))
                    .unwrap_or(false)
            }),
            None => (!ports.is_empty()).then_some(0),
        }
        .context("No matching MIDI output port")?;

        let port = &ports[index];
        let port_name = output
            .port_name(port)
            .unwrap_or_else(|_| "Unnamed port".to_string());
        let connection = output
            .connect(port, "chordlab-playback")
            .map_err(|e| anyhow!("Failed to open {}: {}", port_name, e))?;

        tracing::info!("Opened MIDI output: {}", port_name);
        Ok(MidirOutput {
            connection,
            name: port_name,
        })
    }
}
