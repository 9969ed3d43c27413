//! Benchmarks for oscillator waveform generation.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion};
use grand_dsp::dsp::periodic_wave::PeriodicWave;
use grand_dsp::graph::node::{GraphNode, RenderCtx};
use grand_dsp::graph::oscillator::{OscNode, Waveform};

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let ctx = RenderCtx::new(48_000.0, 0.0);
    let wave = Arc::new(PeriodicWave::piano().unwrap());

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Sine - uses sin() transcendental function
        let mut osc = OscNode::sine(440.0);
        group.bench_with_input(BenchmarkId::new("sine", size), &size, |b, _| {
            b.iter(|| {
                osc.render_block(black_box(&mut buffer), black_box(&ctx));
            })
        });

        // Periodic - table lookup with linear interpolation
        let mut osc = OscNode::new(Waveform::Periodic(Arc::clone(&wave)), 440.0);
        group.bench_with_input(BenchmarkId::new("piano_table", size), &size, |b, _| {
            b.iter(|| {
                osc.render_block(black_box(&mut buffer), black_box(&ctx));
            })
        });

        // Detuned layer - same table, one pow() per block
        let mut osc =
            OscNode::new(Waveform::Periodic(Arc::clone(&wave)), 440.0).with_detune(5.0);
        group.bench_with_input(BenchmarkId::new("detuned", size), &size, |b, _| {
            b.iter(|| {
                osc.render_block(black_box(&mut buffer), black_box(&ctx));
            })
        });
    }

    group.finish();
}
