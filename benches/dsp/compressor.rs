//! Benchmarks for the dynamics compressor.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use grand_dsp::dsp::compressor::{CompressorSettings, DynamicsCompressor};

use crate::BLOCK_SIZES;

pub fn bench_compressor(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/compressor");

    for &size in BLOCK_SIZES {
        let source: Vec<f32> = (0..size).map(|i| (i as f32 * 0.03).sin() * 0.8).collect();
        let mut left = source.clone();
        let mut right = source.clone();

        let mut compressor = DynamicsCompressor::new(CompressorSettings::default(), 48_000.0);
        group.bench_with_input(BenchmarkId::new("loud_stereo", size), &size, |b, _| {
            b.iter(|| {
                left.copy_from_slice(&source);
                right.copy_from_slice(&source);
                compressor.process(black_box(&mut left), black_box(&mut right));
            })
        });
    }

    group.finish();
}
