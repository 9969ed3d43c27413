use std::f32::consts::TAU;
use std::sync::Arc;

use crate::dsp::periodic_wave::PeriodicWave;
use crate::graph::node::{GraphNode, RenderCtx};

/*
Scheduled Oscillator
====================

A tone generator that runs between a start time and an optional stop time
on the audio clock. Outside that window it outputs silence, which lets the
control thread schedule "sound from t0, silent from t1" without waiting.

         start                      stop
    ───────┬─────────────────────────┬──────→ audio clock
   silence │ ∿∿∿∿∿∿∿∿∿∿∿∿∿∿∿∿∿∿∿∿∿∿∿ │ silence (finished for good)

Pitch
-----

    final_frequency = frequency * 2^(detune_cents / 1200)

100 cents = 1 semitone. A few cents either side of the fundamental beat
slowly against it, the chorus-like shimmer of a piano's multiple strings
per note.

Waveforms
---------

Periodic: reads a band-limited table from a shared PeriodicWave. The
table is chosen per block from the current frequency so harmonics never
cross Nyquist.

Sine: plain sin(). Also the fallback when a custom wave could not be
built.
*/

#[derive(Clone)]
pub enum Waveform {
    Sine,
    Periodic(Arc<PeriodicWave>),
}

pub struct OscNode {
    waveform: Waveform,
    frequency: f32,
    detune_cents: f32,
    /// Phase in cycles, [0, 1)
    phase: f32,
    start_time: f64,
    stop_time: Option<f64>,
}

impl OscNode {
    pub fn new(waveform: Waveform, frequency: f32) -> Self {
        Self {
            waveform,
            frequency,
            detune_cents: 0.0,
            phase: 0.0,
            start_time: 0.0,
            stop_time: None,
        }
    }

    pub fn sine(frequency: f32) -> Self {
        Self::new(Waveform::Sine, frequency)
    }

    /// Set detune in cents (100 cents = 1 semitone).
    pub fn with_detune(mut self, cents: f32) -> Self {
        self.detune_cents = cents;
        self
    }

    /// Begin sounding at `time` on the audio clock.
    pub fn start_at(mut self, time: f64) -> Self {
        self.start_time = time;
        self
    }

    /// Fall silent at `time`. An earlier stop already scheduled wins.
    pub fn stop(&mut self, time: f64) {
        self.stop_time = Some(self.stop_time.map_or(time, |t| t.min(time)));
    }

    pub fn final_frequency(&self) -> f32 {
        if self.detune_cents != 0.0 {
            self.frequency * 2.0_f32.powf(self.detune_cents / 1200.0)
        } else {
            self.frequency
        }
    }

    #[inline]
    fn is_sounding(&self, time: f64) -> bool {
        time >= self.start_time && self.stop_time.map_or(true, |stop| time < stop)
    }
}

impl GraphNode for OscNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let freq = self.final_frequency();
        let increment = freq / ctx.sample_rate;

        let table = match &self.waveform {
            Waveform::Periodic(wave) => match wave.table_for(freq, ctx.sample_rate) {
                Some(table) => Some(table),
                // Fundamental above Nyquist: nothing audible to render
                None => {
                    out.fill(0.0);
                    return;
                }
            },
            Waveform::Sine => None,
        };

        for (i, sample) in out.iter_mut().enumerate() {
            if !self.is_sounding(ctx.sample_time(i)) {
                *sample = 0.0;
                continue;
            }

            *sample = match table {
                Some(table) => PeriodicWave::sample(table, self.phase),
                None => (TAU * self.phase).sin(),
            };

            self.phase += increment;
            self.phase -= self.phase.floor();
        }
    }

    fn is_active(&self, time: f64) -> bool {
        self.stop_time.map_or(true, |stop| time < stop)
    }
}
