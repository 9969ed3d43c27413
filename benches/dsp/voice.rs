//! Benchmarks for a single layered piano voice.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion};
use grand_dsp::dsp::periodic_wave::PeriodicWave;
use grand_dsp::graph::node::RenderCtx;
use grand_dsp::graph::oscillator::Waveform;
use grand_dsp::graph::voice::PianoVoice;
use grand_dsp::synth::SynthConfig;

use crate::BLOCK_SIZES;

pub fn bench_voice(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/voice");
    let config = SynthConfig::default();
    let waveform = Waveform::Periodic(Arc::new(PeriodicWave::piano().unwrap()));
    let ctx = RenderCtx::new(48_000.0, 0.01);

    for &size in BLOCK_SIZES {
        let mut dry = vec![0.0f32; size];
        let mut send = vec![0.0f32; size];

        // Five oscillators through one gain curve (middle C)
        let mut voice = PianoVoice::new(1, 60, 100, 0.0, &config, &waveform).unwrap();
        group.bench_with_input(BenchmarkId::new("five_layers", size), &size, |b, _| {
            b.iter(|| {
                dry.fill(0.0);
                send.fill(0.0);
                voice.render(black_box(&mut dry), black_box(&mut send), black_box(&ctx));
            })
        });
    }

    group.finish();
}
