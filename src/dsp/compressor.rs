//! Stereo-linked feed-forward dynamics compressor.
//!
//! Sits at the end of the master bus and keeps dense chords from clipping.
//! Both channels feed one peak detector, so a loud left hand ducks the
//! right channel by the same amount and the stereo image stays put.
//!
//! Static curve, in dB, with a quadratic soft knee of width `W` around the
//! threshold `T`:
//!
//! ```text
//! x < T - W/2          y = x
//! |x - T| <= W/2       y = x + (1/R - 1) * (x - T + W/2)^2 / (2W)
//! x > T + W/2          y = T + (x - T) / R
//! ```
//!
//! The gain reduction `y - x` is smoothed with one-pole attack and release
//! filters before being applied. There is no makeup gain.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

fn amp_to_db(amp: f32) -> f32 {
    20.0 * amp.abs().max(1e-10).log10()
}

fn db_to_amp(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// One-pole smoothing coefficient for a time constant in seconds.
fn time_coefficient(seconds: f32, sample_rate: f32) -> f32 {
    if seconds <= 0.0 {
        return 0.0;
    }
    (-1.0 / (seconds * sample_rate)).exp()
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompressorSettings {
    pub threshold_db: f32,
    pub knee_db: f32,
    pub ratio: f32,
    /// Seconds
    pub attack: f32,
    /// Seconds
    pub release: f32,
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self {
            threshold_db: -20.0,
            knee_db: 25.0,
            ratio: 10.0,
            attack: 0.002,
            release: 0.3,
        }
    }
}

impl CompressorSettings {
    /// Output level in dB for an input level in dB, before smoothing.
    pub fn curve(&self, input_db: f32) -> f32 {
        let ratio = self.ratio.max(1.0);
        let over = input_db - self.threshold_db;
        let half_knee = self.knee_db * 0.5;

        if self.knee_db > 0.0 && over.abs() <= half_knee {
            let x = over + half_knee;
            input_db + (1.0 / ratio - 1.0) * x * x / (2.0 * self.knee_db)
        } else if over > 0.0 {
            self.threshold_db + over / ratio
        } else {
            input_db
        }
    }
}

pub struct DynamicsCompressor {
    settings: CompressorSettings,
    attack_coeff: f32,
    release_coeff: f32,
    /// Smoothed gain reduction in dB, always <= 0
    reduction_db: f32,
}

impl DynamicsCompressor {
    pub fn new(settings: CompressorSettings, sample_rate: f32) -> Self {
        Self {
            attack_coeff: time_coefficient(settings.attack, sample_rate),
            release_coeff: time_coefficient(settings.release, sample_rate),
            settings,
            reduction_db: 0.0,
        }
    }

    pub fn settings(&self) -> &CompressorSettings {
        &self.settings
    }

    /// Current gain reduction in dB (0 when idle, negative when compressing).
    pub fn reduction_db(&self) -> f32 {
        self.reduction_db
    }

    /// Compress a stereo block in place.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let peak = l.abs().max(r.abs());
            let input_db = amp_to_db(peak);
            let target = self.settings.curve(input_db) - input_db;

            // More reduction needed: attack. Letting go: release.
            let coeff = if target < self.reduction_db {
                self.attack_coeff
            } else {
                self.release_coeff
            };
            self.reduction_db = coeff * self.reduction_db + (1.0 - coeff) * target;

            let gain = db_to_amp(self.reduction_db);
            *l *= gain;
            *r *= gain;
        }
    }

    pub fn reset(&mut self) {
        self.reduction_db = 0.0;
    }
}
