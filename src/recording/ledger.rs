use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{SynthError, SynthResult};
use crate::input::clock::Clock;
use crate::pitch::Pitch;
use crate::recording::melody::{MelodyPayload, SessionSettings};

/// One note of a recorded session. Times in seconds from session start.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RecordedNote {
    #[cfg_attr(feature = "serde", serde(rename = "note"))]
    pub pitch: Pitch,
    pub start_time: f64,
    /// 0 until the note is released
    pub duration: f64,
    pub velocity: u8,
}

impl RecordedNote {
    pub fn is_open(&self) -> bool {
        self.duration == 0.0
    }
}

/// Append-only log of the notes played during a recording session.
///
/// Entries are only ever added at the end and only their duration is ever
/// filled in, so the log reads in note-on order.
#[derive(Debug)]
pub struct RecordingLedger<C: Clock> {
    clock: C,
    active: bool,
    started_at: Option<Duration>,
    notes: Vec<RecordedNote>,
}

impl<C: Clock> RecordingLedger<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            active: false,
            started_at: None,
            notes: Vec::new(),
        }
    }

    /// Begin a session, discarding the previous one.
    pub fn start(&mut self) {
        self.notes.clear();
        self.started_at = Some(self.clock.now());
        self.active = true;
        log::info!("recording started");
    }

    /// End the session. Notes still open keep a duration of 0.
    pub fn stop(&mut self) {
        if self.active {
            log::info!("recording stopped with {} notes", self.notes.len());
        }
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn notes(&self) -> &[RecordedNote] {
        &self.notes
    }

    /// Log a note-on. Ignored outside a session.
    pub fn append(&mut self, pitch: Pitch, velocity: u8) {
        let Some(elapsed) = self.elapsed() else {
            return;
        };
        self.notes.push(RecordedNote {
            pitch,
            start_time: elapsed,
            duration: 0.0,
            velocity,
        });
    }

    /// Fill in the duration of the latest open entry for `pitch`.
    /// Ignored outside a session.
    pub fn close(&mut self, pitch: Pitch) {
        let Some(elapsed) = self.elapsed() else {
            return;
        };
        let open = self
            .notes
            .iter_mut()
            .rev()
            .find(|n| n.pitch == pitch && n.is_open());

        match open {
            Some(note) => note.duration = elapsed - note.start_time,
            None => {
                debug_assert!(false, "no open note for pitch {pitch}");
                log::warn!("note-off for pitch {pitch} without an open entry");
            }
        }
    }

    /// Package a finished session for the analysis service.
    pub fn melody(&self, settings: &SessionSettings) -> SynthResult<MelodyPayload> {
        if self.active {
            return Err(SynthError::RecordingActive);
        }
        if self.notes.is_empty() {
            return Err(SynthError::EmptyRecording);
        }
        Ok(MelodyPayload::new(self.notes.clone(), settings))
    }

    fn elapsed(&self) -> Option<f64> {
        if !self.active {
            return None;
        }
        let start = self.started_at?;
        Some(self.clock.now().saturating_sub(start).as_secs_f64())
    }
}
