use crate::dsp::automation::ParamTimeline;
use crate::error::{SynthError, SynthResult};
use crate::graph::node::{GraphNode, RenderCtx};
use crate::graph::oscillator::{OscNode, Waveform};
use crate::pitch::{self, Pitch};
use crate::synth::config::{normalize_velocity, EnvelopeShape, SynthConfig};
use crate::RENDER_QUANTUM;

/*
Piano Voice
===========

Everything that sounds for one key press:

    OscNode (fundamental)      ─┐
    OscNode (octave)           ─┤
    OscNode (octave + fifth)   ─┼─→ Σ ─→ × gain(t) ─┬─→ dry bus
    OscNode (fundamental -5c)  ─┤                    │
    OscNode (fundamental +5c)  ─┘                    └─→ × send ─→ reverb bus

The gain curve is a ParamTimeline scheduled against the audio clock when
the voice is built, and rewritten in place when the key is released.

Lifetime
--------

Voices are built on the control thread (allocation happens there), shipped
to the renderer, and shipped back once finished so they are also dropped
on the control thread. A voice is finished once the audio clock passes its
teardown time, which only exists after a release was scheduled.
*/

/// Identifies one voice instance across both threads.
///
/// Ids are never reused, so a late release or teardown aimed at an old voice
/// can never touch a newer voice for the same pitch.
pub type VoiceId = u64;

/// When and how a voice fades out, in audio clock seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleaseSchedule {
    /// Gain is frozen at its current value here
    pub start: f64,
    /// Exponential ramp reaches `floor` here
    pub end: f64,
    pub floor: f32,
    /// Oscillators stop and the voice is retired here
    pub teardown: f64,
}

impl ReleaseSchedule {
    /// Release of `pitch` starting at `now`.
    pub fn new(now: f64, pitch: Pitch, shape: &EnvelopeShape) -> SynthResult<Self> {
        if !(shape.floor.is_finite() && shape.floor > 0.0) {
            return Err(SynthError::InvalidAutomation {
                curve: "exponential ramp",
                value: shape.floor,
            });
        }
        let end = now + shape.release_time(pitch);
        Ok(Self {
            start: now,
            end,
            floor: shape.floor,
            teardown: end + shape.teardown_delay,
        })
    }
}

pub struct PianoVoice {
    id: VoiceId,
    pitch: Pitch,
    velocity: u8,
    layers: Vec<(OscNode, f32)>,
    gain: ParamTimeline,
    reverb_send: f32,
    teardown_at: Option<f64>,
    mix: Vec<f32>,
    layer_buf: Vec<f32>,
    gain_buf: Vec<f32>,
}

impl PianoVoice {
    /// Build a voice that starts sounding at `now`.
    ///
    /// Fails if the envelope cannot be scheduled, e.g. for velocity 0 (an
    /// exponential ramp cannot reach a peak of zero).
    pub fn new(
        id: VoiceId,
        pitch: Pitch,
        velocity: u8,
        now: f64,
        config: &SynthConfig,
        waveform: &Waveform,
    ) -> SynthResult<Self> {
        let v = normalize_velocity(velocity);
        let shape = &config.envelope;

        let mut gain = ParamTimeline::new(shape.floor);
        gain.set_value_at_time(shape.floor, now)?;
        gain.exponential_ramp_to_value_at_time(v * shape.peak_level, now + shape.attack_time(v))?;
        gain.exponential_ramp_to_value_at_time(v * shape.sustain_level, now + shape.decay_time(v))?;

        let base = pitch::frequency(pitch);
        let layers = config
            .layers
            .iter()
            .map(|layer| {
                let osc = OscNode::new(waveform.clone(), base * layer.ratio)
                    .with_detune(layer.detune_cents)
                    .start_at(now);
                (osc, layer.level)
            })
            .collect();

        Ok(Self {
            id,
            pitch,
            velocity,
            layers,
            gain,
            reverb_send: config.reverb_send.level(pitch, v),
            teardown_at: None,
            mix: vec![0.0; RENDER_QUANTUM],
            layer_buf: vec![0.0; RENDER_QUANTUM],
            gain_buf: vec![0.0; RENDER_QUANTUM],
        })
    }

    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn pitch(&self) -> Pitch {
        self.pitch
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn reverb_send(&self) -> f32 {
        self.reverb_send
    }

    /// Envelope value at `time`.
    pub fn gain_at(&self, time: f64) -> f32 {
        self.gain.value_at(time)
    }

    pub fn teardown_at(&self) -> Option<f64> {
        self.teardown_at
    }

    pub fn is_releasing(&self) -> bool {
        self.teardown_at.is_some()
    }

    /// Fade out from the current level and schedule teardown.
    ///
    /// A second release keeps the earlier teardown.
    pub fn release(&mut self, schedule: ReleaseSchedule) {
        if self.teardown_at.is_some_and(|t| t <= schedule.teardown) {
            return;
        }
        self.gain.cancel_and_hold_at_time(schedule.start);
        let ramp = self
            .gain
            .exponential_ramp_to_value_at_time(schedule.floor, schedule.end);
        debug_assert!(ramp.is_ok(), "release floor validated by ReleaseSchedule");

        for (osc, _) in &mut self.layers {
            osc.stop(schedule.teardown);
        }
        self.teardown_at = Some(schedule.teardown);
    }

    /// True once the audio clock has passed the teardown time and no layer is still active.
    pub fn is_finished(&self, time: f64) -> bool {
        self.teardown_at.is_some_and(|t| time >= t)
            && self.layers.iter().all(|(osc, _)| !osc.is_active(time))
    }

    /// Render into the dry and reverb-send buses (accumulating).
    pub fn render(&mut self, dry: &mut [f32], send: &mut [f32], ctx: &RenderCtx) {
        debug_assert_eq!(dry.len(), send.len());
        let chunk = self.mix.len();
        let mut offset = 0;

        while offset < dry.len() {
            let len = chunk.min(dry.len() - offset);
            let sub_ctx = RenderCtx::new(ctx.sample_rate, ctx.sample_time(offset));

            let mix = &mut self.mix[..len];
            mix.fill(0.0);
            for (osc, level) in &mut self.layers {
                let buf = &mut self.layer_buf[..len];
                osc.render_block(buf, &sub_ctx);
                for (m, s) in mix.iter_mut().zip(buf.iter()) {
                    *m += s * *level;
                }
            }

            let gain = &mut self.gain_buf[..len];
            self.gain.render(gain, sub_ctx.time, sub_ctx.sample_rate);

            let dry_out = &mut dry[offset..offset + len];
            let send_out = &mut send[offset..offset + len];
            for (((d, s), m), g) in dry_out
                .iter_mut()
                .zip(send_out.iter_mut())
                .zip(mix.iter())
                .zip(gain.iter())
            {
                let voiced = m * g;
                *d += voiced;
                *s += voiced * self.reverb_send;
            }

            offset += len;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 8_000.0;

    fn voice(velocity: u8, now: f64) -> SynthResult<PianoVoice> {
        PianoVoice::new(7, 60, velocity, now, &SynthConfig::default(), &Waveform::Sine)
    }

    #[test]
    fn envelope_hits_peak_and_sustain() {
        let v = voice(127, 1.0).unwrap();
        assert!((v.gain_at(1.0) - 0.0001).abs() < 1e-7);
        assert!((v.gain_at(1.005) - 0.9).abs() < 1e-4);
        assert!((v.gain_at(1.1) - 0.5).abs() < 1e-4);
        // No hold segment: stays at sustain indefinitely
        assert!((v.gain_at(30.0) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn soft_notes_attack_slower() {
        let soft = voice(32, 0.0).unwrap();
        let v = 32.0 / 127.0;
        let attack = 0.005 + (1.0 - v as f64) * 0.01;
        assert!((soft.gain_at(attack) - v * 0.9).abs() < 1e-4);
        assert!(soft.gain_at(0.005) < v * 0.9);
    }

    #[test]
    fn zero_velocity_is_rejected() {
        assert!(matches!(
            voice(0, 0.0),
            Err(SynthError::InvalidAutomation { .. })
        ));
    }

    #[test]
    fn five_layers_and_send() {
        let v = voice(127, 0.0).unwrap();
        assert_eq!(v.layer_count(), 5);
        let expected = 0.1 + 0.2 + (127.0 - 60.0) / 127.0 * 0.1;
        assert!((v.reverb_send() - expected).abs() < 1e-6);
    }

    #[test]
    fn release_fades_to_floor_and_finishes() {
        let mut v = voice(127, 0.0).unwrap();
        let schedule = ReleaseSchedule::new(0.5, 60, &EnvelopeShape::default()).unwrap();
        v.release(schedule);

        let release = 0.1 + (1.0 - 60.0 / 127.0) * 2.0;
        assert!((schedule.end - (0.5 + release)).abs() < 1e-9);
        assert!((schedule.teardown - (schedule.end + 0.05)).abs() < 1e-9);

        // Held at sustain when the release begins
        assert!((v.gain_at(0.5) - 0.5).abs() < 1e-4);
        assert!(v.gain_at(0.5 + release / 2.0) < 0.5);
        assert!((v.gain_at(schedule.end) - 0.0001).abs() < 1e-6);

        assert!(!v.is_finished(schedule.end));
        assert!(v.is_finished(schedule.teardown));
    }

    #[test]
    fn not_finished_while_a_layer_still_runs() {
        let mut v = voice(100, 0.0).unwrap();
        let schedule = ReleaseSchedule::new(0.2, 60, &EnvelopeShape::default()).unwrap();
        v.release(schedule);
        assert!(v.is_finished(schedule.teardown));

        v.layers[0].0 = OscNode::sine(261.63);
        assert!(!v.is_finished(schedule.teardown));
        assert!(!v.is_finished(schedule.teardown + 10.0));
    }

    #[test]
    fn release_during_attack_holds_current_level() {
        let mut v = voice(127, 0.0).unwrap();
        let mid_attack = v.gain_at(0.0025);
        v.release(ReleaseSchedule::new(0.0025, 60, &EnvelopeShape::default()).unwrap());
        assert!((v.gain_at(0.0025) - mid_attack).abs() < 1e-6);
        assert!(v.gain_at(0.005) < mid_attack);
    }

    #[test]
    fn held_voice_never_finishes() {
        let v = voice(100, 0.0).unwrap();
        assert!(!v.is_releasing());
        assert!(!v.is_finished(1e6));
    }

    #[test]
    fn render_feeds_dry_and_send() {
        let mut v = voice(127, 0.0).unwrap();
        let mut dry = vec![0.0f32; 300];
        let mut send = vec![0.0f32; 300];
        v.render(&mut dry, &mut send, &RenderCtx::new(SR, 0.0));

        assert!(dry.iter().any(|s| s.abs() > 0.1));
        for (d, s) in dry.iter().zip(&send) {
            assert!((s - d * v.reverb_send()).abs() < 1e-6);
        }
    }

    #[test]
    fn rejects_non_positive_floor() {
        let shape = EnvelopeShape {
            floor: 0.0,
            ..EnvelopeShape::default()
        };
        assert!(ReleaseSchedule::new(0.0, 60, &shape).is_err());
    }
}
