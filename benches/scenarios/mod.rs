//! Real-world scenario benchmarks.
//!
//! These model what happens while someone plays: many voices ringing
//! through the reverb and compressor, and bursts of input events.

mod controller;
mod renderer;

pub use controller::bench_controller;
pub use renderer::bench_renderer;
