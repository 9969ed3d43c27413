/*
Pitch Utilities
===============

Pitches use MIDI numbering: one integer per semitone, 0-127, with
A4 = 69 = 440 Hz as the reference tone.

    frequency = 440 * 2^((pitch - 69) / 12)
    pitch     = round(12 * log2(frequency / 440)) + 69

Names combine a note class with an octave number where C4 = 60
("middle C"), so octave = floor(pitch / 12) - 1:

    48 -> C3    60 -> C4    61 -> C#4    69 -> A4    71 -> B4
*/

/// MIDI pitch number (0-127).
pub type Pitch = u8;

/// Highest MIDI pitch.
pub const MAX_PITCH: Pitch = 127;

/// Reference pitch (A4).
pub const REFERENCE_PITCH: Pitch = 69;

/// Reference frequency in Hz.
pub const REFERENCE_FREQUENCY: f32 = 440.0;

/// Note class names, sharps only.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Convert a MIDI pitch to frequency in Hz.
#[inline]
pub fn frequency(pitch: Pitch) -> f32 {
    REFERENCE_FREQUENCY * 2.0_f32.powf((pitch as f32 - REFERENCE_PITCH as f32) / 12.0)
}

/// Convert a frequency to the nearest MIDI pitch.
///
/// Not an exact inverse of [`frequency`] for arbitrary input; results are
/// clamped to 0-127 and non-positive frequencies map to 0.
pub fn from_frequency(hz: f32) -> Pitch {
    if hz.is_nan() || hz <= 0.0 {
        return 0;
    }
    let semitones = (12.0 * (hz / REFERENCE_FREQUENCY).log2()).round();
    (semitones + REFERENCE_PITCH as f32).clamp(0.0, MAX_PITCH as f32) as Pitch
}

/// Note class without octave, e.g. 61 -> "C#".
#[inline]
pub fn note_class(pitch: Pitch) -> &'static str {
    NOTE_NAMES[(pitch % 12) as usize]
}

/// Note name with octave, e.g. 60 -> "C4".
pub fn name(pitch: Pitch) -> String {
    let octave = (pitch / 12) as i32 - 1;
    format!("{}{}", note_class(pitch), octave)
}

/// Whether the pitch sits on a black key.
#[inline]
pub fn is_black_key(pitch: Pitch) -> bool {
    note_class(pitch).ends_with('#')
}
