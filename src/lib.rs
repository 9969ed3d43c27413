pub mod dsp;
pub mod error;
pub mod graph; // Voice signal graph
pub mod input; // Note-event controller
pub mod pitch;
pub mod recording; // Session ledger and melody payload
pub mod synth; // Engine (control thread) and renderer (audio thread)

pub use error::{SynthError, SynthResult};

/// Frames processed per renderer step.
pub const RENDER_QUANTUM: usize = 128;
