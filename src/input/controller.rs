use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::SynthResult;
use crate::input::clock::Clock;
use crate::input::keymap;
use crate::input::layout::KeyboardLayout;
use crate::input::output::NoteOutput;
use crate::input::source::{InputSource, PointerId, TouchId};
use crate::pitch::{self, Pitch};
use crate::recording::{MelodyPayload, RecordingLedger, SessionSettings};

/*
Keyboard Controller
===================

Turns a messy stream of raw input events into clean note-on/note-off
transitions. Per pitch:

              press (any source)            last source lets go
    idle ───────────────────────→ held ───────────────────────────→ idle
                                  │  ↑                               (engine
                                  └──┘                                releases
                         press again after the                        the voice)
                         debounce window: restart voice

Raw events come from three kinds of sources at once (computer keys,
pointers, touch points) and arrive duplicated, out of order, or not at
all. The rules that keep the keyboard sane:

  - A pitch is held while any source holds it; it goes idle only when the
    last one lets go.
  - A second press within the debounce window (50 ms) is swallowed. The
    source is still tracked, so its release is recognised later.
  - A press on a pitch that has been held longer than that restarts the
    voice (stuck-note recovery) without logging a new note.
  - A release from a source that isn't holding the pitch does nothing.
  - Focus loss, hiding the window or a double-click stop everything and
    forget all state: release events may never arrive after those.

While a recording session runs, accepted note-ons are appended to the
ledger and the matching note-offs close them.
*/

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ControllerConfig {
    /// Repeated presses of a held pitch closer together than this are ignored
    pub debounce: Duration,
    /// Velocity for every note (keys and pointers carry no pressure)
    pub velocity: u8,
    /// Entries kept in the played-notes display list
    pub history_limit: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(50),
            velocity: 127,
            history_limit: 50,
        }
    }
}

#[derive(Debug, Clone)]
struct HeldNote {
    sources: Vec<InputSource>,
    pressed_at: Duration,
}

#[derive(Debug, Clone, Copy, Default)]
struct PointerState {
    button_down: bool,
    pitch: Option<Pitch>,
}

pub struct KeyboardController<O: NoteOutput, C: Clock + Clone> {
    output: O,
    clock: C,
    config: ControllerConfig,
    held: BTreeMap<Pitch, HeldNote>,
    pointers: HashMap<PointerId, PointerState>,
    touches: HashMap<TouchId, Pitch>,
    layout: KeyboardLayout,
    ledger: RecordingLedger<C>,
    played_notes: VecDeque<String>,
}

impl<O: NoteOutput, C: Clock + Clone> KeyboardController<O, C> {
    pub fn new(output: O, clock: C) -> Self {
        Self::with_config(output, clock, ControllerConfig::default())
    }

    pub fn with_config(output: O, clock: C, config: ControllerConfig) -> Self {
        Self {
            ledger: RecordingLedger::new(clock.clone()),
            output,
            clock,
            played_notes: VecDeque::with_capacity(config.history_limit),
            config,
            held: BTreeMap::new(),
            pointers: HashMap::new(),
            touches: HashMap::new(),
            layout: KeyboardLayout::default(),
        }
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn layout(&self) -> &KeyboardLayout {
        &self.layout
    }

    pub fn ledger(&self) -> &RecordingLedger<C> {
        &self.ledger
    }

    /// Names of notes played this session, newest first.
    pub fn played_notes(&self) -> impl Iterator<Item = &str> {
        self.played_notes.iter().map(String::as_str)
    }

    pub fn is_held(&self, pitch: Pitch) -> bool {
        self.held.contains_key(&pitch)
    }

    /// Held pitches, ascending.
    pub fn held_pitches(&self) -> Vec<Pitch> {
        self.held.keys().copied().collect()
    }

    pub fn is_recording(&self) -> bool {
        self.ledger.is_active()
    }

    // -- computer keyboard -------------------------------------------------

    /// Returns true if the event started (or restarted) a note.
    pub fn key_down(&mut self, key: char, repeat: bool) -> bool {
        if repeat {
            return false;
        }
        let Some(pitch) = keymap::pitch_for_key(key) else {
            return false;
        };
        self.press(InputSource::Key(key.to_ascii_lowercase()), pitch)
    }

    /// Returns true if the event ended a note.
    pub fn key_up(&mut self, key: char) -> bool {
        let Some(pitch) = keymap::pitch_for_key(key) else {
            return false;
        };
        self.release(InputSource::Key(key.to_ascii_lowercase()), pitch)
    }

    // -- pointers ------------------------------------------------------------

    /// Button pressed over the key for `pitch`.
    pub fn pointer_down(&mut self, id: PointerId, pitch: Pitch) -> bool {
        let previous = self.pointers.insert(
            id,
            PointerState {
                button_down: true,
                pitch: Some(pitch),
            },
        );
        if let Some(old) = previous.and_then(|p| p.pitch).filter(|&old| old != pitch) {
            self.release(InputSource::Pointer(id), old);
        }
        self.press(InputSource::Pointer(id), pitch)
    }

    /// Pointer moved onto the key for `pitch`. Plays it when dragging.
    pub fn pointer_enter(&mut self, id: PointerId, pitch: Pitch) -> bool {
        let Some(state) = self.pointers.get_mut(&id) else {
            return false;
        };
        if !state.button_down || state.pitch == Some(pitch) {
            return false;
        }
        let previous = state.pitch.replace(pitch);
        if let Some(old) = previous {
            self.release(InputSource::Pointer(id), old);
        }
        self.press(InputSource::Pointer(id), pitch)
    }

    /// Pointer moved off the key for `pitch`.
    pub fn pointer_leave(&mut self, id: PointerId, pitch: Pitch) -> bool {
        let Some(state) = self.pointers.get_mut(&id) else {
            return false;
        };
        if !state.button_down || state.pitch != Some(pitch) {
            return false;
        }
        state.pitch = None;
        self.release(InputSource::Pointer(id), pitch)
    }

    /// Button released, over a key or anywhere else.
    pub fn pointer_up(&mut self, id: PointerId) -> bool {
        match self.pointers.remove(&id).and_then(|state| state.pitch) {
            Some(pitch) => self.release(InputSource::Pointer(id), pitch),
            None => false,
        }
    }

    // -- touch ---------------------------------------------------------------

    pub fn touch_start(&mut self, id: TouchId, pitch: Pitch) -> bool {
        if let Some(old) = self.touches.insert(id, pitch).filter(|&old| old != pitch) {
            self.release(InputSource::Touch(id), old);
        }
        self.press(InputSource::Touch(id), pitch)
    }

    pub fn touch_end(&mut self, id: TouchId) -> bool {
        match self.touches.remove(&id) {
            Some(pitch) => self.release(InputSource::Touch(id), pitch),
            None => false,
        }
    }

    pub fn touch_cancel(&mut self, id: TouchId) -> bool {
        self.touch_end(id)
    }

    // -- global safety -------------------------------------------------------

    /// Window lost focus.
    pub fn blur(&mut self) {
        log::debug!("focus lost, releasing all notes");
        self.reset();
    }

    pub fn visibility_changed(&mut self, hidden: bool) {
        if hidden {
            log::debug!("window hidden, releasing all notes");
            self.reset();
        }
    }

    /// Double-click anywhere: panic button.
    pub fn double_click(&mut self) {
        self.reset();
    }

    /// Stop every voice and forget all held, pointer and touch state.
    ///
    /// The recording ledger is left alone: notes still open stay open with
    /// a duration of 0.
    pub fn reset(&mut self) {
        self.output.stop_all();
        self.held.clear();
        self.pointers.clear();
        self.touches.clear();
        self.layout.clear_pressed();
    }

    // -- recording -----------------------------------------------------------

    pub fn start_recording(&mut self) {
        self.reset();
        self.played_notes.clear();
        self.ledger.start();
    }

    pub fn stop_recording(&mut self) {
        self.reset();
        self.ledger.stop();
    }

    /// Flip recording on or off; returns the new state.
    pub fn toggle_recording(&mut self) -> bool {
        if self.is_recording() {
            self.stop_recording();
        } else {
            self.start_recording();
        }
        self.is_recording()
    }

    /// Payload of the last finished session.
    pub fn melody(&self, settings: &SessionSettings) -> SynthResult<MelodyPayload> {
        self.ledger.melody(settings)
    }

    // -- transitions -----------------------------------------------------------

    fn press(&mut self, source: InputSource, pitch: Pitch) -> bool {
        let now = self.clock.now();
        let velocity = self.config.velocity;

        if let Some(held) = self.held.get_mut(&pitch) {
            if !held.sources.contains(&source) {
                held.sources.push(source);
            }
            if now.saturating_sub(held.pressed_at) < self.config.debounce {
                log::trace!("debounced {} from {source:?}", pitch::name(pitch));
                return false;
            }
            held.pressed_at = now;

            // Stuck-note recovery: engine hard-stops and rebuilds the voice
            return match self.output.play_note(pitch, velocity) {
                Ok(()) => true,
                Err(err) => {
                    log::warn!("restart of {} failed: {err}", pitch::name(pitch));
                    // Whatever still sounds for the pitch has lost its owner
                    self.output.stop_note(pitch);
                    self.held.remove(&pitch);
                    self.layout.set_pressed(pitch, false);
                    self.ledger.close(pitch);
                    false
                }
            };
        }

        if let Err(err) = self.output.play_note(pitch, velocity) {
            log::warn!("could not play {}: {err}", pitch::name(pitch));
            return false;
        }

        self.held.insert(
            pitch,
            HeldNote {
                sources: vec![source],
                pressed_at: now,
            },
        );
        self.layout.set_pressed(pitch, true);

        if self.ledger.is_active() {
            self.ledger.append(pitch, velocity);
            self.remember(pitch);
        }
        true
    }

    fn release(&mut self, source: InputSource, pitch: Pitch) -> bool {
        let Some(held) = self.held.get_mut(&pitch) else {
            return false;
        };
        let Some(idx) = held.sources.iter().position(|s| *s == source) else {
            return false;
        };
        held.sources.swap_remove(idx);
        if !held.sources.is_empty() {
            return false;
        }

        self.held.remove(&pitch);
        self.layout.set_pressed(pitch, false);
        self.output.stop_note(pitch);
        self.ledger.close(pitch);
        true
    }

    fn remember(&mut self, pitch: Pitch) {
        if self.config.history_limit == 0 {
            return;
        }
        if self.played_notes.len() == self.config.history_limit {
            self.played_notes.pop_back();
        }
        self.played_notes.push_front(pitch::name(pitch));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SynthError;
    use crate::input::clock::ManualClock;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Play(Pitch),
        Stop(Pitch),
        StopAll,
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        fail_next: bool,
    }

    impl NoteOutput for Recorder {
        fn play_note(&mut self, pitch: Pitch, _velocity: u8) -> SynthResult<()> {
            if std::mem::take(&mut self.fail_next) {
                return Err(SynthError::QueueFull { command: "start" });
            }
            self.calls.push(Call::Play(pitch));
            Ok(())
        }

        fn stop_note(&mut self, pitch: Pitch) {
            self.calls.push(Call::Stop(pitch));
        }

        fn stop_all(&mut self) {
            self.calls.push(Call::StopAll);
        }
    }

    fn controller() -> (KeyboardController<Recorder, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (KeyboardController::new(Recorder::default(), clock.clone()), clock)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn key_press_and_release() {
        let (mut ctl, _) = controller();
        assert!(ctl.key_down('z', false));
        assert!(ctl.is_held(48));
        assert!(ctl.layout().key(48).is_some_and(|k| k.pressed));
        assert!(ctl.key_up('z'));
        assert!(!ctl.is_held(48));
        assert_eq!(ctl.output().calls, vec![Call::Play(48), Call::Stop(48)]);
    }

    #[test]
    fn auto_repeat_is_ignored() {
        let (mut ctl, clock) = controller();
        ctl.key_down('q', false);
        clock.advance(ms(500));
        assert!(!ctl.key_down('q', true));
        assert_eq!(ctl.output().calls, vec![Call::Play(60)]);
    }

    #[test]
    fn unmapped_keys_do_nothing() {
        let (mut ctl, _) = controller();
        assert!(!ctl.key_down('a', false));
        assert!(!ctl.key_up('a'));
        assert!(ctl.output().calls.is_empty());
    }

    #[test]
    fn duplicate_press_within_window_is_debounced() {
        let (mut ctl, clock) = controller();
        ctl.pointer_down(1, 60);
        clock.advance(ms(10));
        assert!(!ctl.key_down(',', false));
        assert_eq!(ctl.output().calls, vec![Call::Play(60)]);

        // Both sources must let go
        assert!(!ctl.pointer_up(1));
        assert!(ctl.is_held(60));
        assert!(ctl.key_up(','));
        assert!(!ctl.is_held(60));
    }

    #[test]
    fn late_press_restarts_voice_without_new_entry() {
        let (mut ctl, clock) = controller();
        ctl.start_recording();
        ctl.key_down(',', false);
        clock.advance(ms(200));
        assert!(ctl.key_down('q', false));

        let plays = ctl
            .output()
            .calls
            .iter()
            .filter(|c| **c == Call::Play(60))
            .count();
        assert_eq!(plays, 2);
        assert_eq!(ctl.ledger().notes().len(), 1);

        // One entry, closed once the last source lets go
        clock.advance(ms(300));
        assert!(!ctl.key_up(','));
        assert!(ctl.ledger().notes()[0].is_open());
        assert!(ctl.key_up('q'));

        let notes = ctl.ledger().notes();
        assert_eq!(notes.len(), 1);
        assert!((notes[0].duration - 0.5).abs() < 1e-9);
    }

    #[test]
    fn failed_restart_stops_the_old_voice() {
        let (mut ctl, clock) = controller();
        ctl.start_recording();
        ctl.key_down(',', false);
        clock.advance(ms(200));

        ctl.output_mut().fail_next = true;
        assert!(!ctl.key_down('q', false));

        assert!(!ctl.is_held(60));
        assert!(ctl.layout().pressed_pitches().is_empty());
        assert_eq!(ctl.output().calls.last(), Some(&Call::Stop(60)));
        let notes = ctl.ledger().notes();
        assert_eq!(notes.len(), 1);
        assert!((notes[0].duration - 0.2).abs() < 1e-9);

        // Nothing left to release
        assert!(!ctl.key_up(','));
        assert!(!ctl.key_up('q'));
    }

    #[test]
    fn release_from_foreign_source_is_ignored() {
        let (mut ctl, _) = controller();
        ctl.key_down('z', false);
        assert!(!ctl.pointer_up(9));
        assert!(!ctl.touch_end(3));
        assert!(!ctl.key_up('x'));
        assert!(ctl.is_held(48));
    }

    #[test]
    fn failed_play_leaves_pitch_idle() {
        let (mut ctl, _) = controller();
        ctl.start_recording();
        ctl.output_mut().fail_next = true;
        assert!(!ctl.key_down('z', false));
        assert!(!ctl.is_held(48));
        assert!(ctl.ledger().notes().is_empty());
        assert!(ctl.layout().pressed_pitches().is_empty());
        assert!(!ctl.key_up('z'));
    }

    #[test]
    fn drag_moves_between_keys() {
        let (mut ctl, _) = controller();
        ctl.pointer_down(1, 60);
        assert!(ctl.pointer_enter(1, 62));
        assert_eq!(ctl.held_pitches(), vec![62]);
        assert!(ctl.pointer_leave(1, 62));
        assert!(ctl.held_pitches().is_empty());
        assert!(ctl.pointer_enter(1, 64));
        assert!(ctl.pointer_up(1));
        assert_eq!(
            ctl.output().calls,
            vec![
                Call::Play(60),
                Call::Stop(60),
                Call::Play(62),
                Call::Stop(62),
                Call::Play(64),
                Call::Stop(64)
            ]
        );
    }

    #[test]
    fn hovering_without_button_plays_nothing() {
        let (mut ctl, _) = controller();
        assert!(!ctl.pointer_enter(1, 60));
        ctl.pointer_down(1, 60);
        ctl.pointer_up(1);
        assert!(!ctl.pointer_enter(1, 62));
    }

    #[test]
    fn multi_touch_chord() {
        let (mut ctl, _) = controller();
        ctl.touch_start(1, 60);
        ctl.touch_start(2, 64);
        ctl.touch_start(3, 67);
        assert_eq!(ctl.held_pitches(), vec![60, 64, 67]);
        ctl.touch_cancel(2);
        assert_eq!(ctl.held_pitches(), vec![60, 67]);
        ctl.touch_end(1);
        ctl.touch_end(3);
        assert!(ctl.held_pitches().is_empty());
    }

    #[test]
    fn blur_resets_everything() {
        let (mut ctl, _) = controller();
        ctl.key_down('z', false);
        ctl.pointer_down(1, 62);
        ctl.touch_start(1, 64);
        ctl.blur();

        assert!(ctl.held_pitches().is_empty());
        assert!(ctl.layout().pressed_pitches().is_empty());
        assert_eq!(ctl.output().calls.last(), Some(&Call::StopAll));

        // Stale releases after the reset are no-ops
        assert!(!ctl.key_up('z'));
        assert!(!ctl.pointer_up(1));
        assert!(!ctl.touch_end(1));
    }

    #[test]
    fn visibility_only_resets_when_hidden() {
        let (mut ctl, _) = controller();
        ctl.key_down('z', false);
        ctl.visibility_changed(false);
        assert!(ctl.is_held(48));
        ctl.visibility_changed(true);
        assert!(!ctl.is_held(48));
    }

    #[test]
    fn recording_logs_names_newest_first() {
        let (mut ctl, clock) = controller();
        ctl.key_down('z', false);
        ctl.key_up('z');
        ctl.start_recording();
        for key in ['z', 'x', 'c'] {
            ctl.key_down(key, false);
            clock.advance(ms(100));
            ctl.key_up(key);
        }
        let names: Vec<&str> = ctl.played_notes().collect();
        assert_eq!(names, vec!["E3", "D3", "C3"]);

        let notes = ctl.ledger().notes();
        assert_eq!(notes.len(), 3);
        assert!(notes.iter().all(|n| (n.duration - 0.1).abs() < 1e-9));
    }

    #[test]
    fn history_is_capped() {
        let clock = ManualClock::new();
        let config = ControllerConfig {
            history_limit: 2,
            ..ControllerConfig::default()
        };
        let mut ctl = KeyboardController::with_config(Recorder::default(), clock, config);
        ctl.start_recording();
        for key in ['z', 'x', 'c'] {
            ctl.key_down(key, false);
            ctl.key_up(key);
        }
        let names: Vec<&str> = ctl.played_notes().collect();
        assert_eq!(names, vec!["E3", "D3"]);
    }

    #[test]
    fn recording_toggle_stops_sounding_notes() {
        let (mut ctl, _) = controller();
        ctl.key_down('z', false);
        assert!(ctl.toggle_recording());
        assert!(!ctl.is_held(48));
        assert!(ctl.output().calls.contains(&Call::StopAll));
        assert!(!ctl.toggle_recording());
    }
}
