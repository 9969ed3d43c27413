//! Benchmarks for the full output chain.
//!
//! Voices -> master gain -> convolution reverb -> compressor, as the audio
//! callback runs it.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use grand_dsp::synth::{PianoEngine, SynthConfig};

use crate::BLOCK_SIZES;

/// Chord sizes: silence, a triad, both hands, a sustained smear
const VOICE_COUNTS: &[usize] = &[0, 3, 10, 24];

pub fn bench_renderer(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/renderer");
    group.sample_size(30);

    for &voices in VOICE_COUNTS {
        for &size in BLOCK_SIZES {
            let mut engine = PianoEngine::new(SynthConfig::default());
            let mut renderer = engine.init(48_000.0).unwrap();
            for i in 0..voices {
                engine.play_note(36 + 2 * i as u8, 100).unwrap();
            }

            let mut left = vec![0.0f32; size];
            let mut right = vec![0.0f32; size];
            // Let the starts land and the reverb fill up
            for _ in 0..16 {
                renderer.render(&mut left, &mut right);
            }

            group.bench_with_input(
                BenchmarkId::new(format!("{voices}_voices"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        renderer.render(black_box(&mut left), black_box(&mut right));
                    })
                },
            );
        }
    }

    group.finish();
}
