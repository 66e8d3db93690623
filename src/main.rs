// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chordlab::export::{export_melody, export_progression, DirectorySink};
use chordlab::generators::Generator;
use chordlab::music::midi_note_name;
use chordlab::playback::{perform, schedule, Pacing};
#[cfg(not(feature = "midi-out"))]
use chordlab::playback::{RecordingSink, SinkCall};
use chordlab::{
    MelodyConfig, MelodyGenerator, MelodyNote, Progression, ProgressionConfig, ProgressionGenerator,
    SelectorPolicy, SessionFile,
};

fn print_usage() {
    println!("chordlab - Chord progression and melody generator");
    println!();
    println!("Usage: chordlab [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --key <KEY>             Key, e.g. C, F#, Bb (default C)");
    println!("  --mode <MODE>           major or minor (default major)");
    println!("  --chords <N>            Number of chords (default 4)");
    println!("  --types <LIST>          Comma-separated chord types: triad,seventh,major7,minor7,sus4,add9");
    println!("  --melody                Generate a melody over the progression");
    println!("  --rhythm <PATTERN>      varied, conjunct or arpeggiation");
    println!("  --arpeggio <PATTERN>    Arpeggio pattern, e.g. ascending, inside-out, random");
    println!("  --quantize <GRID>       quarter, eighth or sixteenth");
    println!("  --complexity <PCT>      Melody density, 10-90");
    println!("  --bpm <BPM>             Tempo for export and playback (default 120)");
    println!("  --config <FILE>         Load session settings from a YAML or TOML file");
    println!("  --out <DIR>             Write MIDI files into DIR");
    println!("  --strict                Reject unknown selectors instead of using defaults");
    println!("  --param <NAME=VALUE>    Set a generator parameter by name");
    println!("  --play                  Play the result (dry run unless built with midi-out)");
    #[cfg(feature = "midi-out")]
    println!("  --port <NAME>           MIDI output port for --play (default first port)");
    println!("  --help                  Show this help message");
}

#[derive(Debug, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    key: Option<String>,
    mode: Option<String>,
    chords: Option<usize>,
    types: Option<Vec<String>>,
    melody: bool,
    rhythm: Option<String>,
    arpeggio: Option<String>,
    quantize: Option<String>,
    complexity: Option<u8>,
    bpm: Option<f64>,
    out: Option<PathBuf>,
    strict: bool,
    params: Vec<(String, f64)>,
    play: bool,
    port: Option<String>,
    help: bool,
}

fn parse_args(args: &[String]) -> Result<CliOptions> {
    let mut options = CliOptions::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let arg = arg.as_str();
        let mut value = |flag: &str| -> Result<String> {
            iter.next()
                .cloned()
                .with_context(|| format!("{} requires a value", flag))
        };

        match arg {
            "--help" | "-h" => options.help = true,
            "--config" => options.config = Some(PathBuf::from(value(arg)?)),
            "--key" => options.key = Some(value(arg)?),
            "--mode" => options.mode = Some(value(arg)?),
            "--chords" => {
                let raw = value(arg)?;
                options.chords = Some(raw.parse().with_context(|| format!("Invalid chord count: {}", raw))?);
            }
            "--types" => {
                let raw = value(arg)?;
                options.types = Some(raw.split(',').map(|s| s.trim().to_string()).collect());
            }
            "--melody" => options.melody = true,
            "--rhythm" => options.rhythm = Some(value(arg)?),
            "--arpeggio" => options.arpeggio = Some(value(arg)?),
            "--quantize" => options.quantize = Some(value(arg)?),
            "--complexity" => {
                let raw = value(arg)?;
                options.complexity = Some(raw.parse().with_context(|| format!("Invalid complexity: {}", raw))?);
            }
            "--bpm" => {
                let raw = value(arg)?;
                options.bpm = Some(raw.parse().with_context(|| format!("Invalid tempo: {}", raw))?);
            }
            "--out" => options.out = Some(PathBuf::from(value(arg)?)),
            "--strict" => options.strict = true,
            "--param" => {
                let raw = value(arg)?;
                let (name, v) = raw
                    .split_once('=')
                    .with_context(|| format!("Expected NAME=VALUE, got {}", raw))?;
                let v: f64 = v
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid value for {}: {}", name, v))?;
                options.params.push((name.trim().to_string(), v));
            }
            "--play" => options.play = true,
            "--port" => options.port = Some(value(arg)?),
            other => bail!("Unknown option: {} (run with --help)", other),
        }
    }

    Ok(options)
}

/// Session file with command-line overrides applied
fn build_session(options: &CliOptions) -> Result<SessionFile> {
    let mut session = match &options.config {
        Some(path) => SessionFile::load(path)?,
        None => SessionFile::default(),
    };

    if let Some(key) = &options.key {
        session.key = key.clone();
    }
    if let Some(mode) = &options.mode {
        session.mode = mode.clone();
    }
    if let Some(count) = options.chords {
        session.chord_count = count;
    }
    if let Some(types) = &options.types {
        session.chord_types = types.clone();
    }
    if let Some(bpm) = options.bpm {
        session.bpm = bpm;
    }
    if options.strict {
        session.strict = true;
    }

    let melody = &mut session.melody;
    if options.melody {
        melody.enabled = true;
    }
    if let Some(rhythm) = &options.rhythm {
        melody.rhythm = rhythm.clone();
    }
    if let Some(arpeggio) = &options.arpeggio {
        melody.arpeggio = arpeggio.clone();
    }
    if let Some(quantize) = &options.quantize {
        melody.quantize = quantize.clone();
    }
    if let Some(complexity) = options.complexity {
        melody.complexity = complexity;
    }

    Ok(session)
}

/// Keep the melody in the progression's key after parameter overrides
fn follow_progression_key(progression: &ProgressionConfig, melody: &mut MelodyConfig) {
    melody.key = progression.key;
    melody.mode = progression.mode;
}

/// Route each `--param` to whichever generator knows the name
fn apply_params(
    params: &[(String, f64)],
    progression: &mut dyn Generator,
    melody: &mut dyn Generator,
    policy: SelectorPolicy,
) -> Result<()> {
    for (name, value) in params {
        if progression.params().contains_key(name) {
            progression.set_param(name, *value);
        } else if melody.params().contains_key(name) {
            melody.set_param(name, *value);
        } else if policy.is_strict() {
            bail!("Unknown parameter: {}", name);
        } else {
            tracing::warn!("Ignoring unknown parameter: {}", name);
        }
    }
    Ok(())
}

fn print_progression(progression: &Progression) {
    println!(
        "{} {} - {} ({:.1} bars)",
        progression.key,
        progression.mode.name(),
        progression.template,
        progression.total_bars()
    );
    for chord in &progression.chords {
        println!(
            "  {:<8} {:<5} {:<28} {:.2} bars",
            chord.name,
            chord.numeral,
            chord.format_notes(),
            chord.duration_bars
        );
    }
}

fn print_melody(melody: &[MelodyNote]) {
    println!("Melody ({} notes):", melody.len());
    for note in melody {
        println!(
            "  {:>3}  {:<4} +{}",
            note.start,
            midi_note_name(note.pitch),
            note.duration
        );
    }
}

fn play(
    progression: &Progression,
    melody: &[MelodyNote],
    audio: &chordlab::AudioContext,
    port: Option<&str>,
) -> Result<()> {
    let events = schedule(progression, melody, audio);
    let phrase_seconds = audio.bars_to_seconds(progression.total_bars());

    #[cfg(feature = "midi-out")]
    {
        let output = chordlab::playback::open_port(port)?;
        println!("Playing on {} ({} events)...", output.port_name(), events.len());
        let mut sink = chordlab::playback::MidiMessageSink::new(output);
        return perform(&events, phrase_seconds, audio, &mut sink, Pacing::RealTime);
    }

    #[cfg(not(feature = "midi-out"))]
    {
        if port.is_some() {
            tracing::warn!("--port needs the midi-out feature; doing a dry run");
        }
        let mut sink = RecordingSink::new();
        perform(&events, phrase_seconds, audio, &mut sink, Pacing::Immediate)?;

        let chords = sink.calls.iter().filter(|c| matches!(c, SinkCall::Chord { .. })).count();
        let notes = sink.calls.iter().filter(|c| matches!(c, SinkCall::Note { .. })).count();
        println!(
            "Dry run: {} chords, {} notes over {:.1}s at {:.1} dB ({} pass{})",
            chords,
            notes,
            phrase_seconds * audio.repeat.max(1) as f64,
            audio.gain_db(),
            audio.repeat.max(1),
            if audio.repeat > 1 { "es" } else { "" }
        );
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chordlab=info")))
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let options = parse_args(&args)?;
    if options.help {
        print_usage();
        return Ok(());
    }

    let session_file = build_session(&options)?;
    let policy = session_file.policy();
    let session = session_file.resolve()?;

    let mut progression_gen = ProgressionGenerator::new(session.progression.clone());
    let mut melody_gen = MelodyGenerator::new(session.melody.clone().unwrap_or_default());
    apply_params(&options.params, &mut progression_gen, &mut melody_gen, policy)?;
    follow_progression_key(progression_gen.config(), melody_gen.config_mut());

    let progression = progression_gen.generate()?;
    print_progression(&progression);

    let melody = if session.melody.is_some() {
        let notes = melody_gen.generate(&progression);
        println!();
        print_melody(&notes);
        notes
    } else {
        Vec::new()
    };

    if let Some(dir) = &options.out {
        let mut sink = DirectorySink::new(dir);
        let filename = export_progression(&progression, session.audio.bpm, &mut sink)?;
        println!("Wrote {}", sink.path_for(&filename).display());

        if !melody.is_empty() {
            let filename = export_melody(
                &melody,
                progression.key,
                progression.mode,
                session.audio.bpm,
                &mut sink,
            )?;
            println!("Wrote {}", sink.path_for(&filename).display());
        }
    }

    if options.play {
        play(&progression, &melody, &session.audio, options.port.as_deref())?;
    }

    Ok(())
}
