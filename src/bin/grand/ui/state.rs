//! Shared state types for UI rendering

use grand_dsp::input::KeyboardLayout;
use grand_dsp::pitch::Pitch;
use grand_dsp::recording::MelodyPayload;

/// Sent from the audio callback after every buffer (allocation-free, Copy)
#[derive(Clone, Copy, Debug, Default)]
pub struct MeterUpdate {
    /// Output peak of the last buffer (0.0-1.0)
    pub peak: f32,
    /// Voices in the mix, held and releasing
    pub voices: usize,
    /// Compressor gain reduction in dB (<= 0)
    pub reduction_db: f32,
}

/// Where the sound is going
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AudioStatus {
    /// Device opens on the first note
    Pending,
    /// Playing at this sample rate
    Running(f32),
    /// No usable device; notes are tracked but not heard
    Silent,
}

/// Everything one frame needs, borrowed from the app
pub struct ViewState<'a> {
    pub layout: &'a KeyboardLayout,
    pub recording: bool,
    pub notes_recorded: usize,
    /// Newest first
    pub played_notes: Vec<&'a str>,
    pub held: Vec<Pitch>,
    pub meter: MeterUpdate,
    pub audio: AudioStatus,
    pub key_releases: bool,
    pub last_melody: Option<&'a MelodyPayload>,
}
