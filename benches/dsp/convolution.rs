//! Benchmarks for the partitioned convolution engine.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use grand_dsp::dsp::convolution::PartitionedConvolver;
use grand_dsp::dsp::impulse::decaying_noise;

use crate::BLOCK_SIZES;

pub fn bench_convolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/convolution");
    let sample_rate = 48_000.0;

    // Short room and the full 2.5 s hall
    let rooms = [("short_room", 0.5), ("hall", 2.5)];

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin() * 0.1).collect();

        for (name, seconds) in rooms {
            let [left, right] = decaying_noise(sample_rate, seconds, 1.8, 7);
            let mut convolver = PartitionedConvolver::new(&[&left, &right], size);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    convolver.process_block(black_box(&input));
                    convolver.output(0)[0]
                })
            });
        }
    }

    group.finish();
}
