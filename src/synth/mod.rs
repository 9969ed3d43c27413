// Purpose: the piano voice engine, split across two threads.
// PianoEngine lives with the input layer; PianoRenderer lives in the audio callback.

pub mod clock;
pub mod config;
pub mod engine;
pub mod message;
pub mod renderer;

pub use clock::AudioClock;
pub use config::{SynthConfig, VoiceLayer};
pub use engine::PianoEngine;
pub use renderer::PianoRenderer;
