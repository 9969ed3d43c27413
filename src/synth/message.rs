use crate::graph::voice::{PianoVoice, ReleaseSchedule, VoiceId};

/// Control thread → audio thread.
pub enum GraphCommand {
    /// Add a fully built voice to the mix.
    Start(Box<PianoVoice>),
    /// Fade a voice out and retire it at the schedule's teardown time.
    Release { id: VoiceId, schedule: ReleaseSchedule },
    /// Remove a voice right away, without a release tail.
    HardStop { id: VoiceId },
}

impl GraphCommand {
    pub fn name(&self) -> &'static str {
        match self {
            GraphCommand::Start(_) => "start",
            GraphCommand::Release { .. } => "release",
            GraphCommand::HardStop { .. } => "hard stop",
        }
    }
}

/// Audio thread → control thread.
pub enum RendererEvent {
    /// A voice left the mix; dropping it is the control thread's job.
    Finished(Box<PianoVoice>),
}
