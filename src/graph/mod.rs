//! Signal graph of the piano: scheduled oscillators, voices and the hall.
//!
//! Nodes render blocks against the audio clock carried in [`RenderCtx`], so
//! everything the control thread schedules (starts, stops, gain curves)
//! lands on an exact sample.
//!
//! [`RenderCtx`]: node::RenderCtx

/// Core traits shared by all graph nodes.
pub mod node;
/// Scheduled wavetable and sine oscillators.
pub mod oscillator;
/// Stereo convolution reverb fed by the send bus.
pub mod reverb;
/// One sounding key: layered oscillators under a shared gain curve.
pub mod voice;

pub use node::{GraphNode, RenderCtx};
pub use oscillator::{OscNode, Waveform};
pub use reverb::ConvolutionReverb;
pub use voice::{PianoVoice, ReleaseSchedule, VoiceId};
