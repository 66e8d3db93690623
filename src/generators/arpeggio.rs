// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Arpeggio patterns for the arpeggiation melody strategy.
//!
//! Each chord is first normalized to four tones, then expanded across two
//! octaves into a note pool. A pattern turns the pool into a short cycle
//! that is repeated at the quantize rate until the chord's span is full.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ChordSpan, MelodyNote, RandomSource};
use crate::error::{InvalidSelectorError, SelectorPolicy};
use crate::music::{Chord, MidiNote};

/// Octaves the chord tones are spread across
pub const ARPEGGIO_OCTAVE_RANGE: u8 = 2;

/// Lowest pitch an arpeggio may use (C2)
pub const ARPEGGIO_LOWEST: MidiNote = 36;

/// Highest pitch an arpeggio may use (C6)
pub const ARPEGGIO_HIGHEST: MidiNote = 84;

/// Tones per chord after normalization, and notes per pattern cycle
const NOTES_PER_CYCLE: usize = 4;

/// Quantize step (in sixteenths) that switches patterns to their one-note-per-beat form
const QUARTER_STEP: u32 = 4;

/// Arpeggio pattern catalog, in selector order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArpeggioPattern {
    /// Raw chord tones, lowest first
    None,
    #[default]
    Ascending,
    Descending,
    /// Up then back down
    AscendingDescending,
    /// Down then back up
    DescendingAscending,
    /// Expand from the centre of the pool
    InsideOut,
    /// Contract from the edges of the pool
    OutsideIn,
    Random,
}

impl ArpeggioPattern {
    pub const ALL: [ArpeggioPattern; 8] = [
        ArpeggioPattern::None,
        ArpeggioPattern::Ascending,
        ArpeggioPattern::Descending,
        ArpeggioPattern::AscendingDescending,
        ArpeggioPattern::DescendingAscending,
        ArpeggioPattern::InsideOut,
        ArpeggioPattern::OutsideIn,
        ArpeggioPattern::Random,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ArpeggioPattern::None => "none",
            ArpeggioPattern::Ascending => "ascending",
            ArpeggioPattern::Descending => "descending",
            ArpeggioPattern::AscendingDescending => "ascending-descending",
            ArpeggioPattern::DescendingAscending => "descending-ascending",
            ArpeggioPattern::InsideOut => "inside-out",
            ArpeggioPattern::OutsideIn => "outside-in",
            ArpeggioPattern::Random => "random",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ArpeggioPattern::None => "None",
            ArpeggioPattern::Ascending => "Ascending",
            ArpeggioPattern::Descending => "Descending",
            ArpeggioPattern::AscendingDescending => "Ascending-Descending",
            ArpeggioPattern::DescendingAscending => "Descending-Ascending",
            ArpeggioPattern::InsideOut => "Inside-Out",
            ArpeggioPattern::OutsideIn => "Outside-In",
            ArpeggioPattern::Random => "Random",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim().to_lowercase().replace('_', "-");
        ArpeggioPattern::ALL.into_iter().find(|p| p.id() == id)
    }

    /// Resolve an id under `policy`; unknown ids become ascending when lenient
    pub fn resolve(id: &str, policy: SelectorPolicy) -> Result<Self, InvalidSelectorError> {
        policy.resolve(
            Self::from_id(id),
            ArpeggioPattern::Ascending,
            InvalidSelectorError::ArpeggioPattern(id.to_string()),
        )
    }

    /// The following pattern in catalog order, wrapping at the end
    pub fn next(self) -> Self {
        let index = self.to_value() as usize;
        ArpeggioPattern::ALL[(index + 1) % ArpeggioPattern::ALL.len()]
    }

    /// Catalog index as a numeric parameter value
    pub fn to_value(self) -> u8 {
        ArpeggioPattern::ALL
            .iter()
            .position(|&p| p == self)
            .unwrap_or(0) as u8
    }

    pub fn from_value(value: u8) -> Self {
        ArpeggioPattern::ALL
            .get(value as usize)
            .copied()
            .unwrap_or_default()
    }
}

impl fmt::Display for ArpeggioPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Bring a chord to exactly four tones.
///
/// Chords with four or more tones keep their first four. Smaller chords
/// borrow extensions (9th and 6th first) whose pitch class is in the scale,
/// and pad with the root an octave up when that is not enough.
pub fn normalize_chord_tones(chord: &Chord, scale_notes: &[MidiNote]) -> Vec<MidiNote> {
    if chord.notes.len() >= NOTES_PER_CYCLE {
        return chord.notes[..NOTES_PER_CYCLE].to_vec();
    }

    let root = chord.root;
    let ninth = root.saturating_add(14);
    let sixth = root.saturating_add(9);
    let extensions = if chord.is_minor() {
        [ninth, root.saturating_add(17), sixth]
    } else {
        [ninth, sixth, root.saturating_add(11)]
    };

    let mut valid: Vec<MidiNote> = extensions
        .into_iter()
        .filter(|&ext| scale_notes.iter().any(|&s| s % 12 == ext % 12))
        .collect();
    valid.sort_by_key(|&ext| if ext == ninth || ext == sixth { 0 } else { 1 });

    let mut tones = chord.notes.clone();
    let missing = NOTES_PER_CYCLE - tones.len();
    tones.extend(valid.into_iter().take(missing));
    while tones.len() < NOTES_PER_CYCLE {
        tones.push(root.saturating_add(12));
    }
    tones
}

/// Sorted pool of pitches an arpeggio over `chord` may draw from.
///
/// The pool is empty only when every candidate falls outside the allowed
/// range; otherwise it holds at least four pitches.
pub fn note_pool(chord: &Chord, scale_notes: &[MidiNote]) -> Vec<MidiNote> {
    let tones = normalize_chord_tones(chord, scale_notes);
    let low = chord.lowest() as i16 - 7;
    let high = chord.highest() as i16 + 12;

    let mut pool: Vec<MidiNote> = (0..ARPEGGIO_OCTAVE_RANGE)
        .flat_map(|octave| tones.iter().map(move |&n| n as u16 + octave as u16 * 12))
        .filter(|&n| n >= ARPEGGIO_LOWEST as u16 && n <= ARPEGGIO_HIGHEST as u16)
        .map(|n| n as MidiNote)
        .filter(|&n| (n as i16) >= low && (n as i16) <= high)
        .collect();
    pool.sort_unstable();

    if pool.is_empty() {
        return pool;
    }
    while pool.len() < NOTES_PER_CYCLE {
        let raised: Vec<MidiNote> = pool.iter().map(|&n| n.saturating_add(12)).collect();
        pool.extend(raised);
    }
    pool
}

/// Arpeggiate one chord across its span with notes `step` sixteenths long
pub fn arpeggiate<R: RandomSource + ?Sized>(
    chord: &Chord,
    span: ChordSpan,
    step: u32,
    scale_notes: &[MidiNote],
    pattern: ArpeggioPattern,
    rng: &mut R,
) -> Vec<MelodyNote> {
    if step == 0 {
        return Vec::new();
    }
    let count = (span.len() / step) as usize;
    if count == 0 {
        return Vec::new();
    }

    let pool = if pattern == ArpeggioPattern::None {
        let mut tones = chord.notes.clone();
        tones.sort_unstable();
        tones
    } else {
        note_pool(chord, scale_notes)
    };
    if pool.is_empty() {
        return Vec::new();
    }
    let quarter = step == QUARTER_STEP;

    let cycle = match pattern {
        ArpeggioPattern::None => pool,
        ArpeggioPattern::Ascending => ascending(&pool),
        ArpeggioPattern::Descending => descending(&pool),
        ArpeggioPattern::AscendingDescending if quarter => ascending(&pool),
        ArpeggioPattern::AscendingDescending => palindrome(ascending(&pool)),
        ArpeggioPattern::DescendingAscending if quarter => descending(&pool),
        ArpeggioPattern::DescendingAscending => palindrome(descending(&pool)),
        ArpeggioPattern::InsideOut if quarter => inside_out_quarter(&pool),
        ArpeggioPattern::InsideOut => inside_out(&pool),
        ArpeggioPattern::OutsideIn if quarter => outside_in_quarter(&pool),
        ArpeggioPattern::OutsideIn => outside_in(&pool),
        ArpeggioPattern::Random if quarter => return random_bars(&pool, span.start, count, step, rng),
        ArpeggioPattern::Random => {
            return (0..count)
                .filter_map(|i| {
                    super::choose(&mut *rng, pool.as_slice()).map(|pitch| note_at(pitch, span.start, i, step))
                })
                .collect();
        }
    };

    repeat_cycle(&cycle, span.start, count, step)
}

fn note_at(pitch: MidiNote, start: u32, index: usize, step: u32) -> MelodyNote {
    MelodyNote::new(pitch, start + index as u32 * step, step)
}

fn repeat_cycle(cycle: &[MidiNote], start: u32, count: usize, step: u32) -> Vec<MelodyNote> {
    if cycle.is_empty() {
        return Vec::new();
    }
    (0..count)
        .map(|i| note_at(cycle[i % cycle.len()], start, i, step))
        .collect()
}

fn ascending(pool: &[MidiNote]) -> Vec<MidiNote> {
    pool.iter().copied().take(NOTES_PER_CYCLE).collect()
}

fn descending(pool: &[MidiNote]) -> Vec<MidiNote> {
    pool.iter().rev().copied().take(NOTES_PER_CYCLE).collect()
}

/// First half of a cycle followed by its inner notes reversed
fn palindrome(run: Vec<MidiNote>) -> Vec<MidiNote> {
    let half = NOTES_PER_CYCLE.div_ceil(2);
    let mut cycle: Vec<MidiNote> = run.into_iter().take(half).collect();
    if cycle.len() > 2 {
        let inner: Vec<MidiNote> = cycle[1..cycle.len() - 1].iter().rev().copied().collect();
        cycle.extend(inner);
    }
    cycle
}

fn inside_out_quarter(pool: &[MidiNote]) -> Vec<MidiNote> {
    let mid = pool.len() / 2;
    let last = pool[pool.len() - 1];
    let above = pool.get(mid + 1).copied().unwrap_or(pool[0].saturating_add(12));
    let below = if mid >= 1 {
        pool[mid - 1]
    } else {
        last.saturating_sub(12)
    };
    vec![pool[mid], above, below, last]
}

fn inside_out(pool: &[MidiNote]) -> Vec<MidiNote> {
    let mid = pool.len() / 2;
    let mut cycle = Vec::with_capacity(NOTES_PER_CYCLE);
    for i in 0..pool.len().min(NOTES_PER_CYCLE) {
        let offset = i.div_ceil(2);
        if i % 2 == 0 {
            if let Some(&n) = pool.get(mid + offset) {
                cycle.push(n);
            }
        } else if mid >= offset {
            cycle.push(pool[mid - offset]);
        }
    }
    cycle
}

fn outside_in_quarter(pool: &[MidiNote]) -> Vec<MidiNote> {
    let len = pool.len();
    let first = pool[0];
    let last = pool[len - 1];
    let second_highest = if len > 2 {
        pool[len - 2]
    } else {
        last.saturating_sub(1)
    };
    let second_lowest = if len > 3 { pool[1] } else { first.saturating_add(1) };
    vec![last, first, second_highest, second_lowest]
}

fn outside_in(pool: &[MidiNote]) -> Vec<MidiNote> {
    let len = pool.len();
    let mut cycle = Vec::with_capacity(NOTES_PER_CYCLE * 2);
    for i in 0..len.div_ceil(2).min(NOTES_PER_CYCLE) {
        let high = len - 1 - i;
        cycle.push(pool[high]);
        if i < high {
            cycle.push(pool[i]);
        }
    }
    cycle
}

/// Four fresh random picks per bar of quarter notes
fn random_bars<R: RandomSource + ?Sized>(
    pool: &[MidiNote],
    start: u32,
    count: usize,
    step: u32,
    rng: &mut R,
) -> Vec<MelodyNote> {
    let mut notes = Vec::with_capacity(count);
    for bar in 0..count.div_ceil(NOTES_PER_CYCLE) {
        let picks: Vec<MidiNote> = (0..NOTES_PER_CYCLE)
            .map(|_| pool[rng.index(pool.len())])
            .collect();
        for (i, &pitch) in picks.iter().enumerate() {
            let index = bar * NOTES_PER_CYCLE + i;
            if index >= count {
                break;
            }
            notes.push(note_at(pitch, start, index, step));
        }
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{SequenceRandom, StdRandom};
    use crate::music::{build_chord, scale_degrees, scale_notes, ChordType, Mode, Note};

    fn c_major_chord(degree: usize, chord_type: ChordType) -> Chord {
        let degrees = scale_degrees(Note::C, Mode::Major);
        build_chord(&degrees, degree, chord_type, Mode::Major)
    }

    fn bar() -> ChordSpan {
        ChordSpan { start: 0, end: 16 }
    }

    fn pitches(notes: &[MelodyNote]) -> Vec<MidiNote> {
        notes.iter().map(|n| n.pitch).collect()
    }

    #[test]
    fn test_catalog_order() {
        assert_eq!(ArpeggioPattern::ALL.len(), 8);
        assert_eq!(ArpeggioPattern::default(), ArpeggioPattern::Ascending);
        assert_eq!(ArpeggioPattern::None.next(), ArpeggioPattern::Ascending);
        assert_eq!(ArpeggioPattern::Random.next(), ArpeggioPattern::None);
        assert_eq!(ArpeggioPattern::from_id("inside_out"), Some(ArpeggioPattern::InsideOut));
        assert_eq!(ArpeggioPattern::from_value(6), ArpeggioPattern::OutsideIn);
        assert_eq!(ArpeggioPattern::from_value(99), ArpeggioPattern::Ascending);
    }

    #[test]
    fn test_resolve_unknown_pattern() {
        assert_eq!(
            ArpeggioPattern::resolve("spiral", SelectorPolicy::Lenient),
            Ok(ArpeggioPattern::Ascending)
        );
        assert!(ArpeggioPattern::resolve("spiral", SelectorPolicy::Strict).is_err());
    }

    #[test]
    fn test_normalize_major_triad() {
        let scale = scale_notes(Note::C, Mode::Major, 2);
        let chord = c_major_chord(0, ChordType::Triad);
        assert_eq!(normalize_chord_tones(&chord, &scale), vec![60, 64, 67, 74]);
    }

    #[test]
    fn test_normalize_minor_triad() {
        let scale = scale_notes(Note::C, Mode::Major, 2);
        let chord = c_major_chord(1, ChordType::Triad);
        assert_eq!(normalize_chord_tones(&chord, &scale), vec![62, 65, 69, 76]);
    }

    #[test]
    fn test_normalize_pads_with_octave_root() {
        let chord = c_major_chord(0, ChordType::Triad);
        assert_eq!(normalize_chord_tones(&chord, &[]), vec![60, 64, 67, 72]);

        let seventh = c_major_chord(0, ChordType::Seventh);
        assert_eq!(normalize_chord_tones(&seventh, &[]), vec![60, 64, 67, 70]);
    }

    #[test]
    fn test_note_pool() {
        let scale = scale_notes(Note::C, Mode::Major, 2);
        let chord = c_major_chord(0, ChordType::Triad);
        assert_eq!(note_pool(&chord, &scale), vec![60, 64, 67, 72, 74, 76, 79]);
    }

    #[test]
    fn test_quarter_patterns() {
        let scale = scale_notes(Note::C, Mode::Major, 2);
        let chord = c_major_chord(0, ChordType::Triad);
        let mut rng = SequenceRandom::constant(0.0);
        let mut run = |pattern| pitches(&arpeggiate(&chord, bar(), 4, &scale, pattern, &mut rng));

        assert_eq!(run(ArpeggioPattern::Ascending), vec![60, 64, 67, 72]);
        assert_eq!(run(ArpeggioPattern::Descending), vec![79, 76, 74, 72]);
        assert_eq!(run(ArpeggioPattern::AscendingDescending), vec![60, 64, 67, 72]);
        assert_eq!(run(ArpeggioPattern::InsideOut), vec![72, 74, 67, 79]);
        assert_eq!(run(ArpeggioPattern::OutsideIn), vec![79, 60, 76, 64]);
        assert_eq!(run(ArpeggioPattern::Random), vec![60, 60, 60, 60]);
        assert_eq!(run(ArpeggioPattern::None), vec![60, 64, 67, 60]);
    }

    #[test]
    fn test_eighth_patterns() {
        let scale = scale_notes(Note::C, Mode::Major, 2);
        let chord = c_major_chord(0, ChordType::Triad);
        let mut rng = SequenceRandom::constant(0.0);
        let mut run = |pattern| pitches(&arpeggiate(&chord, bar(), 2, &scale, pattern, &mut rng));

        assert_eq!(run(ArpeggioPattern::AscendingDescending), vec![60, 64, 60, 64, 60, 64, 60, 64]);
        assert_eq!(run(ArpeggioPattern::DescendingAscending), vec![79, 76, 79, 76, 79, 76, 79, 76]);
        assert_eq!(run(ArpeggioPattern::InsideOut), vec![72, 67, 74, 64, 72, 67, 74, 64]);
        assert_eq!(run(ArpeggioPattern::OutsideIn), vec![79, 60, 76, 64, 74, 67, 72, 79]);
    }

    #[test]
    fn test_four_notes_per_bar_at_quarter_rate() {
        let scale = scale_notes(Note::C, Mode::Major, 2);
        let mut rng = StdRandom::seeded(11);
        for degree in 0..7 {
            for chord_type in ChordType::ALL {
                let chord = c_major_chord(degree, chord_type);
                for pattern in ArpeggioPattern::ALL {
                    let notes = arpeggiate(&chord, bar(), 4, &scale, pattern, &mut rng);
                    assert_eq!(notes.len(), 4, "{} {:?}", chord.name, pattern);

                    let two_bars = ChordSpan { start: 16, end: 48 };
                    let notes = arpeggiate(&chord, two_bars, 4, &scale, pattern, &mut rng);
                    assert_eq!(notes.len(), 8, "{} {:?}", chord.name, pattern);
                }
            }
        }
    }

    #[test]
    fn test_notes_fill_span() {
        let scale = scale_notes(Note::C, Mode::Major, 2);
        let chord = c_major_chord(4, ChordType::Add9);
        let span = ChordSpan { start: 32, end: 48 };
        let mut rng = StdRandom::seeded(3);
        for pattern in ArpeggioPattern::ALL {
            let notes = arpeggiate(&chord, span, 1, &scale, pattern, &mut rng);
            assert_eq!(notes.len(), 16);
            for (i, note) in notes.iter().enumerate() {
                assert_eq!(note.start, 32 + i as u32);
                assert_eq!(note.duration, 1);
                assert!(note.end() <= span.end);
            }
        }
    }

    #[test]
    fn test_short_span_is_silent() {
        let scale = scale_notes(Note::C, Mode::Major, 2);
        let chord = c_major_chord(0, ChordType::Triad);
        let mut rng = SequenceRandom::constant(0.5);
        let span = ChordSpan { start: 0, end: 3 };
        assert!(arpeggiate(&chord, span, 4, &scale, ArpeggioPattern::Ascending, &mut rng).is_empty());
    }
}
