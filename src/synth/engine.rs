use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use rtrb::{Consumer, Producer, PushError, RingBuffer};

use crate::dsp::periodic_wave::PeriodicWave;
use crate::error::{SynthError, SynthResult};
use crate::graph::oscillator::Waveform;
use crate::graph::voice::{PianoVoice, ReleaseSchedule, VoiceId};
use crate::input::NoteOutput;
use crate::pitch::{self, Pitch};
use crate::synth::clock::AudioClock;
use crate::synth::config::SynthConfig;
use crate::synth::message::{GraphCommand, RendererEvent};
use crate::synth::renderer::PianoRenderer;

/*
Piano Engine (control thread half)
==================================

Owns the bookkeeping; the renderer owns the sound.

    active:    pitch → voice id     voices whose key is still down
    releasing: voice id → pitch     voices fading out, owned by the renderer
                                    until it hands them back

A pitch has at most one voice across both maps. Re-triggering a pitch
hard-stops whatever voice it has (held or releasing) before building the
new one.

Commands go out over a ring buffer. Stops never fail: when the ring is
full they wait in `backlog`, which is flushed (in order) before anything
else on every call. Starts do fail when there's no room, and roll their
registration back. A failed re-trigger still hard-stops the old voice, so
the pitch is left silent and consistent.
*/

struct Connection {
    clock: AudioClock,
    commands: Producer<GraphCommand>,
    events: Consumer<RendererEvent>,
}

pub struct PianoEngine {
    config: SynthConfig,
    waveform: Waveform,
    connection: Option<Connection>,
    active: BTreeMap<Pitch, VoiceId>,
    releasing: HashMap<VoiceId, Pitch>,
    backlog: VecDeque<GraphCommand>,
    next_id: VoiceId,
}

impl Default for PianoEngine {
    fn default() -> Self {
        Self::new(SynthConfig::default())
    }
}

impl PianoEngine {
    pub fn new(config: SynthConfig) -> Self {
        Self {
            config,
            waveform: Waveform::Sine,
            connection: None,
            active: BTreeMap::new(),
            releasing: HashMap::new(),
            backlog: VecDeque::new(),
            next_id: 1,
        }
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Build the signal graph and hand back its render half.
    ///
    /// Only the first call does anything; later calls return `None`. Must
    /// run after the host has permission to make sound (a user gesture).
    pub fn init(&mut self, sample_rate: f32) -> Option<PianoRenderer> {
        if self.connection.is_some() {
            log::debug!("piano engine already initialised");
            return None;
        }

        self.waveform = match PeriodicWave::piano() {
            Ok(wave) => Waveform::Periodic(Arc::new(wave)),
            Err(err) => {
                log::warn!("{err}; falling back to sine voices");
                Waveform::Sine
            }
        };

        let capacity = self.config.queue_capacity.max(2);
        let (commands, command_rx) = RingBuffer::new(capacity);
        let (event_tx, events) = RingBuffer::new(capacity);
        let clock = AudioClock::new(sample_rate);

        let renderer = PianoRenderer::new(&self.config, clock.clone(), command_rx, event_tx);
        self.connection = Some(Connection {
            clock,
            commands,
            events,
        });
        log::info!("piano engine initialised at {sample_rate} Hz");

        Some(renderer)
    }

    pub fn is_initialized(&self) -> bool {
        self.connection.is_some()
    }

    /// Audio clock position in seconds, once initialised.
    pub fn current_time(&self) -> Option<f64> {
        self.connection.as_ref().map(|c| c.clock.now())
    }

    /// Start a voice for `pitch`, replacing any voice it already has.
    pub fn play_note(&mut self, pitch: Pitch, velocity: u8) -> SynthResult<()> {
        self.maintain();

        let Some(connection) = &self.connection else {
            log::warn!("play_note({pitch}) before init; ignoring");
            return Err(SynthError::NotInitialized);
        };
        if connection.commands.is_abandoned() {
            log::warn!("play_note({pitch}): renderer is gone");
            return Err(SynthError::RendererDisconnected);
        }
        let now = connection.clock.now();

        // The old voice goes even if the new one can't start: stops never
        // fail, and the pitch must not be left sounding without an owner
        self.hard_stop(pitch);

        let has_room = self
            .connection
            .as_ref()
            .is_some_and(|c| c.commands.slots() > 0);
        if !self.backlog.is_empty() || !has_room {
            log::warn!("play_note({pitch}): command queue full");
            return Err(SynthError::QueueFull { command: "start" });
        }

        let id = self.next_id;
        self.next_id += 1;
        self.active.insert(pitch, id);

        let voice = match PianoVoice::new(id, pitch, velocity, now, &self.config, &self.waveform) {
            Ok(voice) => voice,
            Err(err) => {
                self.active.remove(&pitch);
                log::warn!("play_note({pitch}, {velocity}): {err}");
                return Err(err);
            }
        };

        let pushed = self
            .connection
            .as_mut()
            .map(|c| c.commands.push(GraphCommand::Start(Box::new(voice))));
        match pushed {
            Some(Ok(())) => {
                log::trace!("voice {id} started: {} ({velocity})", pitch::name(pitch));
                Ok(())
            }
            Some(Err(PushError::Full(_))) | None => {
                self.active.remove(&pitch);
                log::warn!("play_note({pitch}): command queue full");
                Err(SynthError::QueueFull { command: "start" })
            }
        }
    }

    /// Release the voice held for `pitch`. No-op if there is none.
    pub fn stop_note(&mut self, pitch: Pitch) {
        self.maintain();

        let Some(id) = self.active.remove(&pitch) else {
            return;
        };
        let Some(now) = self.current_time() else {
            return;
        };

        match ReleaseSchedule::new(now, pitch, &self.config.envelope) {
            Ok(schedule) => {
                self.releasing.insert(id, pitch);
                self.send(GraphCommand::Release { id, schedule });
                log::trace!("voice {id} releasing until {:.3}s", schedule.teardown);
            }
            Err(err) => {
                log::warn!("stop_note({pitch}): {err}; cutting voice");
                self.send(GraphCommand::HardStop { id });
            }
        }
    }

    /// Release every held voice.
    pub fn stop_all(&mut self) {
        let pitches: Vec<Pitch> = self.active.keys().copied().collect();
        for pitch in pitches {
            self.stop_note(pitch);
        }
    }

    /// Drop voices the renderer has finished with and flush queued stops.
    pub fn maintain(&mut self) {
        let Some(connection) = self.connection.as_mut() else {
            return;
        };

        while let Ok(RendererEvent::Finished(voice)) = connection.events.pop() {
            self.releasing.remove(&voice.id());
            log::trace!("voice {} retired", voice.id());
        }

        if connection.commands.is_abandoned() {
            if !self.releasing.is_empty() || !self.backlog.is_empty() {
                log::warn!("renderer dropped; forgetting releasing voices");
            }
            self.releasing.clear();
            self.backlog.clear();
            return;
        }

        while let Some(command) = self.backlog.pop_front() {
            if let Err(PushError::Full(command)) = connection.commands.push(command) {
                self.backlog.push_front(command);
                break;
            }
        }
    }

    /// True if `pitch` has a voice, held or releasing.
    pub fn is_sounding(&self, pitch: Pitch) -> bool {
        self.active.contains_key(&pitch) || self.releasing.values().any(|&p| p == pitch)
    }

    /// Pitches with a held voice, ascending.
    pub fn active_pitches(&self) -> Vec<Pitch> {
        self.active.keys().copied().collect()
    }

    /// Voice id held for `pitch`, if any.
    pub fn held_voice(&self, pitch: Pitch) -> Option<VoiceId> {
        self.active.get(&pitch).copied()
    }

    pub fn releasing_count(&self) -> usize {
        self.releasing.len()
    }

    /// Commands waiting for room in the ring.
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Remove every voice `pitch` has, skipping the release tail.
    fn hard_stop(&mut self, pitch: Pitch) {
        if let Some(id) = self.active.remove(&pitch) {
            self.send(GraphCommand::HardStop { id });
        }
        let fading: Vec<VoiceId> = self
            .releasing
            .iter()
            .filter(|(_, p)| **p == pitch)
            .map(|(&id, _)| id)
            .collect();
        for id in fading {
            self.releasing.remove(&id);
            self.send(GraphCommand::HardStop { id });
        }
    }

    /// Queue a command for the renderer; never fails.
    fn send(&mut self, command: GraphCommand) {
        let Some(connection) = self.connection.as_mut() else {
            return;
        };
        if !self.backlog.is_empty() {
            self.backlog.push_back(command);
            return;
        }
        if let Err(PushError::Full(command)) = connection.commands.push(command) {
            log::debug!("command queue full, deferring {}", command.name());
            self.backlog.push_back(command);
        }
    }
}

impl NoteOutput for PianoEngine {
    fn play_note(&mut self, pitch: Pitch, velocity: u8) -> SynthResult<()> {
        PianoEngine::play_note(self, pitch, velocity)
    }

    fn stop_note(&mut self, pitch: Pitch) {
        PianoEngine::stop_note(self, pitch)
    }

    fn stop_all(&mut self) {
        PianoEngine::stop_all(self)
    }
}
