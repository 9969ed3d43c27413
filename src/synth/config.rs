//! Tunable constants of the piano engine.
//!
//! Defaults reproduce the grand piano voicing; every field can be overridden
//! (and, with the `serde` feature, loaded from a file).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::compressor::CompressorSettings;
use crate::pitch::{Pitch, MAX_PITCH};

/// One oscillator in a voice's stack.
///
/// The oscillator runs at `base_frequency * ratio`, detuned by
/// `detune_cents`, and is mixed into the voice gain at `level`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoiceLayer {
    pub ratio: f32,
    pub detune_cents: f32,
    #[cfg_attr(feature = "serde", serde(default = "unit_level"))]
    pub level: f32,
}

#[cfg(feature = "serde")]
fn unit_level() -> f32 {
    1.0
}

impl VoiceLayer {
    pub const fn new(ratio: f32, detune_cents: f32) -> Self {
        Self {
            ratio,
            detune_cents,
            level: 1.0,
        }
    }
}

/// Grand piano layer stack: fundamental, octave, octave + fifth and two
/// copies of the fundamental detuned ±5 cents for string shimmer.
pub const GRAND_LAYERS: [VoiceLayer; 5] = [
    VoiceLayer::new(1.0, 0.0),
    VoiceLayer::new(2.0, 0.01),
    VoiceLayer::new(3.0, 0.02),
    VoiceLayer::new(1.0, -5.0),
    VoiceLayer::new(1.0, 5.0),
];

/*
Envelope Shape
==============

All times in seconds, v = velocity / 127, p = pitch / 127.

    gain
     ▲      peak = v * peak_level
     │     ╱╲
     │    ╱  ╲___  sustain = v * sustain_level     release
     │   ╱       ‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾╲
     │  ╱                                          ╲___ floor
     └─┴──────┴──────────┴───────────────────────┴──────┴──→ t
      now   attack     decay                   stop   release end
                                                       (+ teardown)

    attack  = attack_base + (1 - v) * attack_velocity_scale
    decay   = decay_base  + (1 - v) * decay_velocity_scale     (from now)
    release = release_base + (1 - p) * release_pitch_scale

Soft notes swell in more slowly. Bass strings ring longer than treble.
*/

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EnvelopeShape {
    /// Starting and final level; never 0 so exponential ramps stay valid
    pub floor: f32,
    pub peak_level: f32,
    pub sustain_level: f32,
    pub attack_base: f64,
    pub attack_velocity_scale: f64,
    pub decay_base: f64,
    pub decay_velocity_scale: f64,
    pub release_base: f64,
    pub release_pitch_scale: f64,
    /// Grace period after the release ramp before the voice is torn down
    pub teardown_delay: f64,
}

impl Default for EnvelopeShape {
    fn default() -> Self {
        Self {
            floor: 0.0001,
            peak_level: 0.9,
            sustain_level: 0.5,
            attack_base: 0.005,
            attack_velocity_scale: 0.01,
            decay_base: 0.1,
            decay_velocity_scale: 0.2,
            release_base: 0.1,
            release_pitch_scale: 2.0,
            teardown_delay: 0.05,
        }
    }
}

impl EnvelopeShape {
    /// Seconds from note-on to the peak.
    pub fn attack_time(&self, velocity: f32) -> f64 {
        self.attack_base + (1.0 - velocity as f64) * self.attack_velocity_scale
    }

    /// Seconds from note-on to reaching sustain.
    pub fn decay_time(&self, velocity: f32) -> f64 {
        self.decay_base + (1.0 - velocity as f64) * self.decay_velocity_scale
    }

    /// Length of the release ramp for `pitch`.
    pub fn release_time(&self, pitch: Pitch) -> f64 {
        let p = pitch.min(MAX_PITCH) as f64 / MAX_PITCH as f64;
        self.release_base + (1.0 - p) * self.release_pitch_scale
    }
}

/// Per-voice send into the convolution reverb:
/// `base + v * velocity_scale + (127 - pitch) / 127 * pitch_scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReverbSend {
    pub base: f32,
    pub velocity_scale: f32,
    pub pitch_scale: f32,
}

impl Default for ReverbSend {
    fn default() -> Self {
        Self {
            base: 0.1,
            velocity_scale: 0.2,
            pitch_scale: 0.1,
        }
    }
}

impl ReverbSend {
    pub fn level(&self, pitch: Pitch, velocity: f32) -> f32 {
        let pitch = pitch.min(MAX_PITCH);
        self.base
            + velocity * self.velocity_scale
            + (MAX_PITCH - pitch) as f32 / MAX_PITCH as f32 * self.pitch_scale
    }
}

/// Impulse response of the reverb room.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RoomSettings {
    pub seconds: f32,
    pub decay_exponent: f32,
    pub seed: u64,
    /// Level of the reverb return into the compressor
    pub return_gain: f32,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            seconds: 2.5,
            decay_exponent: 1.8,
            seed: 0x6772_616e_6421,
            return_gain: 0.18,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SynthConfig {
    pub master_gain: f32,
    pub layers: Vec<VoiceLayer>,
    pub envelope: EnvelopeShape,
    pub reverb_send: ReverbSend,
    pub room: RoomSettings,
    pub compressor: CompressorSettings,
    /// Slots in each control/audio ring buffer
    pub queue_capacity: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            master_gain: 0.8,
            layers: GRAND_LAYERS.to_vec(),
            envelope: EnvelopeShape::default(),
            reverb_send: ReverbSend::default(),
            room: RoomSettings::default(),
            compressor: CompressorSettings::default(),
            queue_capacity: 256,
        }
    }
}

/// Loudest note velocity.
pub const MAX_VELOCITY: u8 = 127;

/// Map a 0-127 velocity to [0, 1].
#[inline]
pub fn normalize_velocity(velocity: u8) -> f32 {
    (velocity as f32 / MAX_VELOCITY as f32).clamp(0.0, 1.0)
}
