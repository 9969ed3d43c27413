//! Benchmarks for low-level DSP primitives.

mod automation;
mod compressor;
mod convolution;
mod oscillator;
mod voice;

pub use automation::bench_automation;
pub use compressor::bench_compressor;
pub use convolution::bench_convolution;
pub use oscillator::bench_oscillator;
pub use voice::bench_voice;
