// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session settings for chordlab.
//!
//! A session file holds the selectors for one generation run: key, mode,
//! chord count and types, tempo, the melody options and playback settings.
//! Files are YAML or TOML, chosen by extension. Selectors stay strings in
//! the file and are turned into typed values by [`SessionFile::resolve`].

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{InvalidSelectorError, SelectorPolicy};
use crate::generators::arpeggio::ArpeggioPattern;
use crate::generators::melody::{MelodyConfig, Quantize, RhythmPattern};
use crate::generators::progression::ProgressionConfig;
use crate::music::{ChordType, Mode, Note};
use crate::playback::{AudioContext, PlaybackMode};

/// On-disk format of a session file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension; anything but `.toml` is YAML
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// Root of a session file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionFile {
    /// Key name (e.g., "C", "F#", "Bb")
    #[serde(default = "default_key")]
    pub key: String,
    /// "major" or "minor"
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_chord_count")]
    pub chord_count: usize,
    /// Chord type ids (e.g., "triad", "seventh")
    #[serde(default = "default_chord_types")]
    pub chord_types: Vec<String>,
    /// Tempo in BPM
    #[serde(default = "default_bpm")]
    pub bpm: f64,
    /// Reject unknown selectors instead of substituting defaults
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub melody: MelodySection,
    #[serde(default)]
    pub playback: PlaybackSection,
}

fn default_key() -> String {
    "C".to_string()
}
fn default_mode() -> String {
    "major".to_string()
}
fn default_chord_count() -> usize {
    4
}
fn default_chord_types() -> Vec<String> {
    vec!["triad".to_string()]
}
fn default_bpm() -> f64 {
    120.0
}

impl Default for SessionFile {
    fn default() -> Self {
        Self {
            key: default_key(),
            mode: default_mode(),
            chord_count: default_chord_count(),
            chord_types: default_chord_types(),
            bpm: default_bpm(),
            strict: false,
            melody: MelodySection::default(),
            playback: PlaybackSection::default(),
        }
    }
}

/// Melody options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MelodySection {
    /// Generate a melody over the progression
    #[serde(default)]
    pub enabled: bool,
    /// Note density percentage (10-90)
    #[serde(default = "default_complexity")]
    pub complexity: u8,
    #[serde(default = "default_rhythm")]
    pub rhythm: String,
    #[serde(default = "default_arpeggio")]
    pub arpeggio: String,
    #[serde(default = "default_quantize")]
    pub quantize: String,
}

fn default_complexity() -> u8 {
    50
}
fn default_rhythm() -> String {
    "varied".to_string()
}
fn default_arpeggio() -> String {
    "ascending".to_string()
}
fn default_quantize() -> String {
    "eighth".to_string()
}

impl Default for MelodySection {
    fn default() -> Self {
        Self {
            enabled: false,
            complexity: default_complexity(),
            rhythm: default_rhythm(),
            arpeggio: default_arpeggio(),
            quantize: default_quantize(),
        }
    }
}

/// Playback settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaybackSection {
    /// Volume percentage (0-100)
    #[serde(default = "default_volume")]
    pub volume: u8,
    #[serde(default)]
    pub mode: PlaybackMode,
    /// Passes through the phrase
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

fn default_volume() -> u8 {
    75
}
fn default_repeat() -> u32 {
    1
}

impl Default for PlaybackSection {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            mode: PlaybackMode::default(),
            repeat: default_repeat(),
        }
    }
}

/// Typed settings produced from a [`SessionFile`]
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub progression: ProgressionConfig,
    /// Present when the melody section is enabled
    pub melody: Option<MelodyConfig>,
    pub audio: AudioContext,
}

impl SessionFile {
    /// Load a session from a YAML or TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        match ConfigFormat::from_path(path) {
            ConfigFormat::Yaml => Self::from_yaml(&contents),
            ConfigFormat::Toml => Self::from_toml(&contents),
        }
    }

    /// Parse a session from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Parse a session from TOML string
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).context("Failed to parse TOML configuration")
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize configuration to TOML")
    }

    /// Save the session, in the format matching the file extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = match ConfigFormat::from_path(path) {
            ConfigFormat::Yaml => self.to_yaml()?,
            ConfigFormat::Toml => self.to_toml()?,
        };
        fs::write(path, contents).with_context(|| format!("Failed to write config file: {:?}", path))
    }

    pub fn policy(&self) -> SelectorPolicy {
        if self.strict {
            SelectorPolicy::Strict
        } else {
            SelectorPolicy::Lenient
        }
    }

    /// Turn the selector strings into typed generator settings
    pub fn resolve(&self) -> Result<Session, InvalidSelectorError> {
        self.resolve_with(self.policy())
    }

    /// Resolve under an explicit policy instead of the file's own
    pub fn resolve_with(&self, policy: SelectorPolicy) -> Result<Session, InvalidSelectorError> {
        let key = policy.resolve(
            Note::from_str(&self.key),
            Note::C,
            InvalidSelectorError::Key(self.key.clone()),
        )?;
        let mode = policy.resolve(
            Mode::from_str(&self.mode),
            Mode::Major,
            InvalidSelectorError::Mode(self.mode.clone()),
        )?;

        let mut chord_types = Vec::with_capacity(self.chord_types.len());
        for id in &self.chord_types {
            let chord_type = ChordType::resolve(id, policy)?;
            if !chord_types.contains(&chord_type) {
                chord_types.push(chord_type);
            }
        }

        let progression = ProgressionConfig {
            key,
            mode,
            chord_count: self.chord_count,
            chord_types,
            policy,
        };

        let melody = if self.melody.enabled {
            Some(MelodyConfig {
                key,
                mode,
                complexity: self.melody.complexity,
                rhythm: RhythmPattern::resolve(&self.melody.rhythm, policy)?,
                arpeggio: ArpeggioPattern::resolve(&self.melody.arpeggio, policy)?,
                quantize: Quantize::resolve(&self.melody.quantize, policy)?,
            })
        } else {
            None
        };

        let audio = AudioContext {
            bpm: self.bpm,
            volume: self.playback.volume.min(100),
            mode: self.playback.mode,
            repeat: self.playback.repeat.max(1),
        };

        Ok(Session {
            progression,
            melody,
            audio,
        })
    }
}

/// Load a session file and check every selector in it
pub fn validate_config<P: AsRef<Path>>(path: P) -> Result<SessionFile> {
    let path = path.as_ref();
    let session = SessionFile::load(path)?;
    session
        .resolve_with(SelectorPolicy::Strict)
        .with_context(|| format!("Invalid selector in {:?}", path))?;
    Ok(session)
}
