//! Error types for the synthesis engine and recording layer.

use thiserror::Error;

/// Result type for engine operations.
pub type SynthResult<T> = Result<T, SynthError>;

/// Errors that can occur while building or driving the piano engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SynthError {
    /// Fourier coefficients could not be turned into a wave table.
    #[error("invalid periodic wave: {message}")]
    InvalidPeriodicWave {
        /// What was wrong with the coefficients.
        message: String,
    },

    /// An automation event carried a value the curve cannot reach.
    #[error("invalid automation value {value} for {curve}")]
    InvalidAutomation {
        /// Curve kind (e.g. "exponential ramp").
        curve: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// `play_note` was called before `init`.
    #[error("audio engine has not been initialised")]
    NotInitialized,

    /// The control-to-audio command queue had no room left.
    #[error("command queue full, dropped {command}")]
    QueueFull {
        /// Name of the dropped command.
        command: &'static str,
    },

    /// The render half was dropped, so nothing can sound anymore.
    #[error("renderer disconnected")]
    RendererDisconnected,

    /// Melody was requested while the session is still recording.
    #[error("recording session is still active")]
    RecordingActive,

    /// Melody was requested for a session without notes.
    #[error("no notes recorded")]
    EmptyRecording,
}

impl SynthError {
    /// Creates an invalid periodic wave error.
    pub fn periodic_wave(message: impl Into<String>) -> Self {
        Self::InvalidPeriodicWave {
            message: message.into(),
        }
    }
}
