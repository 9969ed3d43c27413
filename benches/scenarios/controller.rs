//! Benchmarks for the control side: input events down to renderer commands.

use std::hint::black_box;
use std::time::Duration;

use criterion::Criterion;
use grand_dsp::input::{KeyboardController, ManualClock};
use grand_dsp::synth::{PianoEngine, SynthConfig};

pub fn bench_controller(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/controller");

    let mut engine = PianoEngine::new(SynthConfig::default());
    let mut renderer = engine.init(48_000.0).unwrap();
    let clock = ManualClock::new();
    let mut controller = KeyboardController::new(engine, clock.clone());
    let mut left = vec![0.0f32; 128];
    let mut right = vec![0.0f32; 128];

    // A run up the bound keys, each pressed then released. Rendering one
    // quantum per note keeps the command ring drained.
    let keys = ['z', 's', 'x', 'd', 'c', 'v', 'g', 'b', 'h', 'n', 'j', 'm'];
    group.bench_function("scale_run", |b| {
        b.iter(|| {
            for &key in &keys {
                clock.advance(Duration::from_millis(60));
                controller.key_down(black_box(key), false);
                controller.key_up(black_box(key));
                controller.output_mut().maintain();
                renderer.render(&mut left, &mut right);
            }
        })
    });

    group.finish();
}
