//! Low-level DSP primitives used by the voice graph and the master bus.
//!
//! Everything here is plain signal-processing math with no knowledge of
//! voices, pitches or threads. Construction may allocate (FFT planning, wave
//! tables, impulse responses); processing does not.

/// Web-Audio-style parameter automation timeline.
pub mod automation;
/// Stereo-linked soft-knee compressor.
pub mod compressor;
/// Uniformly partitioned FFT convolution.
pub mod convolution;
/// Procedural decaying-noise impulse responses.
pub mod impulse;
/// Band-limited wave tables from Fourier coefficients.
pub mod periodic_wave;

pub use automation::{AutomationEvent, ParamTimeline};
pub use compressor::{CompressorSettings, DynamicsCompressor};
pub use convolution::PartitionedConvolver;
pub use periodic_wave::PeriodicWave;
