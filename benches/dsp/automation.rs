//! Benchmarks for parameter timeline rendering.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use grand_dsp::dsp::automation::ParamTimeline;

use crate::BLOCK_SIZES;

pub fn bench_automation(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/automation");
    let sample_rate = 48_000.0;

    // The piano gain curve: floor -> peak -> sustain, then a release
    let mut timeline = ParamTimeline::new(0.0001);
    timeline.set_value_at_time(0.0001, 0.0).unwrap();
    timeline.exponential_ramp_to_value_at_time(0.9, 0.005).unwrap();
    timeline.exponential_ramp_to_value_at_time(0.5, 0.1).unwrap();
    timeline.cancel_and_hold_at_time(0.5);
    timeline.exponential_ramp_to_value_at_time(0.0001, 1.5).unwrap();

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Inside the exponential decay segment
        group.bench_with_input(BenchmarkId::new("exponential", size), &size, |b, _| {
            b.iter(|| {
                timeline.render(black_box(&mut buffer), black_box(0.02), sample_rate);
            })
        });

        // Holding after the last event
        group.bench_with_input(BenchmarkId::new("hold", size), &size, |b, _| {
            b.iter(|| {
                timeline.render(black_box(&mut buffer), black_box(2.0), sample_rate);
            })
        });
    }

    group.finish();
}
