//! # Musical Tuning Module
//!
//! Maps frequencies onto twelve-tone equal temperament: pitch class,
//! octave number (scientific pitch notation, C4 = middle C), and the
//! signed deviation in cents from the nearest semitone.
//!
//! Cents are a logarithmic unit of pitch measurement where:
//! - 100 cents = 1 semitone
//! - 1200 cents = 1 octave
//! - Positive values indicate sharpness, negative values indicate flatness

use serde::Serialize;
use std::fmt;

/// Default reference pitch for A4 in Hz.
pub const A4_FREQUENCY: f64 = 440.0;

/// Pitch class names, starting at C.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Index of A in [`NOTE_NAMES`].
const A_INDEX: i64 = 9;

const CENTS_PER_OCTAVE: f64 = 1200.0;
const CENTS_PER_SEMITONE: f64 = 100.0;

/// A frequency expressed as a note of the equal-tempered scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NoteInfo {
    /// Pitch class name, e.g. "A#".
    pub name: &'static str,
    /// Index of `name` in [`NOTE_NAMES`].
    pub note_index: usize,
    /// Octave number; A4 is the reference.
    pub octave: i32,
    /// Deviation from the nearest semitone, in (-50, 50].
    pub deviation_cents: f64,
}

impl NoteInfo {
    /// True if the deviation is within `tolerance_cents` of the semitone.
    pub fn is_in_tune(&self, tolerance_cents: f64) -> bool {
        is_in_tune(self.deviation_cents, tolerance_cents)
    }
}

impl fmt::Display for NoteInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} {:+.1} cents",
            self.name, self.octave, self.deviation_cents
        )
    }
}

/// Calculates the distance of `frequency` from A4 in cents.
///
/// The result is unwrapped: one octave below A4 is -1200, not 0.
pub fn cents_from_a4(frequency: f64, reference_a4: f64) -> f64 {
    CENTS_PER_OCTAVE * (frequency / reference_a4).log2()
}

/// Maps a frequency to its nearest note.
///
/// Returns `None` for frequencies that are not finite and positive.
pub fn note_from_frequency(frequency: f64, reference_a4: f64) -> Option<NoteInfo> {
    if !(frequency.is_finite() && frequency > 0.0) {
        return None;
    }
    Some(note_from_cents(cents_from_a4(frequency, reference_a4)))
}

/// Maps an unwrapped cents value (relative to A4) to its nearest note.
pub fn note_from_cents(cents: f64) -> NoteInfo {
    // Position within the A-based octave, folded into [0, 1200).
    let mut normalized = cents.rem_euclid(CENTS_PER_OCTAVE);
    if normalized >= CENTS_PER_OCTAVE {
        normalized = 0.0;
    }

    // A semitone of 12 lands on A of the next cycle; the index below is
    // taken mod 12.
    let mut semitone = (normalized / CENTS_PER_SEMITONE).round() as i64;
    let mut deviation = normalized - semitone as f64 * CENTS_PER_SEMITONE;
    if deviation > 50.0 {
        deviation -= CENTS_PER_SEMITONE;
        semitone += 1;
    } else if deviation <= -50.0 {
        deviation += CENTS_PER_SEMITONE;
        semitone -= 1;
    }

    let note_index = (semitone + A_INDEX).rem_euclid(12) as usize;

    // Octaves change at C, nine semitones below A. Work from the snapped
    // semitone so a slightly flat C still belongs to its own octave.
    let semitones_from_a4 = ((cents - deviation) / CENTS_PER_SEMITONE).round() as i64;
    let octave = 4 + (semitones_from_a4 + A_INDEX).div_euclid(12);

    NoteInfo {
        name: NOTE_NAMES[note_index],
        note_index,
        octave: octave as i32,
        deviation_cents: deviation,
    }
}

/// Inverse of [`note_from_frequency`].
pub fn frequency_from_note(
    note_index: usize,
    octave: i32,
    deviation_cents: f64,
    reference_a4: f64,
) -> f64 {
    let semitones = (octave as i64 - 4) * 12 + note_index as i64 - A_INDEX;
    let cents = semitones as f64 * CENTS_PER_SEMITONE + deviation_cents;
    reference_a4 * 2f64.powf(cents / CENTS_PER_OCTAVE)
}

/// "In tune" is a threshold on the deviation, inclusive.
pub fn is_in_tune(deviation_cents: f64, tolerance_cents: f64) -> bool {
    deviation_cents.abs() <= tolerance_cents
}
