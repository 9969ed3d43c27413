use crate::error::SynthResult;
use crate::pitch::Pitch;

/// Where accepted note transitions go.
///
/// Implemented by [`PianoEngine`](crate::synth::PianoEngine); tests and
/// headless hosts can plug in their own.
pub trait NoteOutput {
    fn play_note(&mut self, pitch: Pitch, velocity: u8) -> SynthResult<()>;
    fn stop_note(&mut self, pitch: Pitch);
    fn stop_all(&mut self);
}

impl<T: NoteOutput + ?Sized> NoteOutput for &mut T {
    fn play_note(&mut self, pitch: Pitch, velocity: u8) -> SynthResult<()> {
        (**self).play_note(pitch, velocity)
    }

    fn stop_note(&mut self, pitch: Pitch) {
        (**self).stop_note(pitch)
    }

    fn stop_all(&mut self) {
        (**self).stop_all()
    }
}
