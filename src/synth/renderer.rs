use rtrb::{Consumer, Producer, PushError};

use crate::dsp::compressor::DynamicsCompressor;
use crate::graph::node::RenderCtx;
use crate::graph::reverb::ConvolutionReverb;
use crate::graph::voice::{PianoVoice, VoiceId};
use crate::pitch::MAX_PITCH;
use crate::synth::clock::AudioClock;
use crate::synth::config::SynthConfig;
use crate::synth::message::{GraphCommand, RendererEvent};
use crate::RENDER_QUANTUM;

/*
Renderer (audio thread half)
============================

Owns the signal graph and nothing else:

    voices ─┬─→ dry bus ─→ × master ─────────────┐
            │                                     ├─→ compressor ─→ clip ─→ out
            └─→ send bus ─→ convolution reverb ──┘

Work happens in fixed render quanta of RENDER_QUANTUM frames. Callers may
ask for any number of frames; leftovers of the last quantum are handed out
on the next call.

Per quantum:
  1. apply queued commands (start / release / hard stop)
  2. render voices into the dry and send buses
  3. reverb, master gain, compressor, clip
  4. advance the audio clock
  5. hand finished voices back to the control thread

Nothing here allocates or locks. Voice storage is sized for one voice per
pitch up front, and finished voices that can't be handed back right away
wait in `retired` until the return ring has room.
*/

/// Upper bound on simultaneous voices (one per pitch).
const VOICE_CAPACITY: usize = MAX_PITCH as usize + 1;

pub struct PianoRenderer {
    clock: AudioClock,
    commands: Consumer<GraphCommand>,
    events: Producer<RendererEvent>,
    voices: Vec<Box<PianoVoice>>,
    retired: Vec<Box<PianoVoice>>,
    reverb: ConvolutionReverb,
    compressor: DynamicsCompressor,
    master_gain: f32,
    dry: Vec<f32>,
    send: Vec<f32>,
    left: Vec<f32>,
    right: Vec<f32>,
    /// Read position into `left`/`right`
    cursor: usize,
}

impl PianoRenderer {
    pub(crate) fn new(
        config: &SynthConfig,
        clock: AudioClock,
        commands: Consumer<GraphCommand>,
        events: Producer<RendererEvent>,
    ) -> Self {
        let sample_rate = clock.sample_rate();
        Self {
            reverb: ConvolutionReverb::new(&config.room, sample_rate, RENDER_QUANTUM),
            compressor: DynamicsCompressor::new(config.compressor, sample_rate),
            master_gain: config.master_gain,
            clock,
            commands,
            events,
            voices: Vec::with_capacity(VOICE_CAPACITY),
            retired: Vec::with_capacity(VOICE_CAPACITY),
            dry: vec![0.0; RENDER_QUANTUM],
            send: vec![0.0; RENDER_QUANTUM],
            left: vec![0.0; RENDER_QUANTUM],
            right: vec![0.0; RENDER_QUANTUM],
            cursor: RENDER_QUANTUM,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.clock.sample_rate()
    }

    pub fn clock(&self) -> &AudioClock {
        &self.clock
    }

    /// Voices currently in the mix (held and releasing).
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Current compressor gain reduction in dB.
    pub fn gain_reduction_db(&self) -> f32 {
        self.compressor.reduction_db()
    }

    /// Fill a stereo pair of buffers.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len().min(right.len());
        let mut written = 0;
        while written < frames {
            if self.cursor == RENDER_QUANTUM {
                self.render_quantum();
            }
            let n = (RENDER_QUANTUM - self.cursor).min(frames - written);
            left[written..written + n].copy_from_slice(&self.left[self.cursor..self.cursor + n]);
            right[written..written + n].copy_from_slice(&self.right[self.cursor..self.cursor + n]);
            self.cursor += n;
            written += n;
        }
    }

    /// Fill an interleaved device buffer.
    ///
    /// Mono devices get the average of both channels; channels past the
    /// second are silent.
    pub fn render_interleaved(&mut self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for frame in data.chunks_mut(channels) {
            if self.cursor == RENDER_QUANTUM {
                self.render_quantum();
            }
            let (l, r) = (self.left[self.cursor], self.right[self.cursor]);
            self.cursor += 1;

            match frame {
                [mono] => *mono = (l + r) * 0.5,
                [first, second, rest @ ..] => {
                    *first = l;
                    *second = r;
                    rest.fill(0.0);
                }
                [] => {}
            }
        }
    }

    fn render_quantum(&mut self) {
        self.return_retired();
        self.apply_commands();

        let ctx = RenderCtx::new(self.clock.sample_rate(), self.clock.now());

        self.dry.fill(0.0);
        self.send.fill(0.0);
        for voice in &mut self.voices {
            voice.render(&mut self.dry, &mut self.send, &ctx);
        }

        for ((l, r), d) in self.left.iter_mut().zip(self.right.iter_mut()).zip(&self.dry) {
            *l = d * self.master_gain;
            *r = d * self.master_gain;
        }
        self.reverb.process(&self.send, &mut self.left, &mut self.right);
        self.compressor.process(&mut self.left, &mut self.right);
        for s in self.left.iter_mut().chain(self.right.iter_mut()) {
            *s = s.clamp(-1.0, 1.0);
        }

        self.clock.advance(RENDER_QUANTUM as u64);
        self.cursor = 0;

        let end = ctx.end_time(RENDER_QUANTUM);
        let mut i = 0;
        while i < self.voices.len() {
            if self.voices[i].is_finished(end) {
                let voice = self.voices.swap_remove(i);
                self.retire(voice);
            } else {
                i += 1;
            }
        }
    }

    fn apply_commands(&mut self) {
        while let Ok(command) = self.commands.pop() {
            match command {
                GraphCommand::Start(voice) => {
                    if self.voices.len() == VOICE_CAPACITY {
                        // Engine keeps one voice per pitch, so this means a
                        // bookkeeping bug; refuse rather than reallocate
                        self.retire(voice);
                    } else {
                        self.voices.push(voice);
                    }
                }
                GraphCommand::Release { id, schedule } => {
                    if let Some(voice) = self.voices.iter_mut().find(|v| v.id() == id) {
                        voice.release(schedule);
                    }
                }
                GraphCommand::HardStop { id } => {
                    if let Some(idx) = self.position(id) {
                        let voice = self.voices.swap_remove(idx);
                        self.retire(voice);
                    }
                }
            }
        }
    }

    fn position(&self, id: VoiceId) -> Option<usize> {
        self.voices.iter().position(|v| v.id() == id)
    }

    fn retire(&mut self, voice: Box<PianoVoice>) {
        if !self.retired.is_empty() {
            self.retired.push(voice);
            return;
        }
        if let Err(PushError::Full(RendererEvent::Finished(voice))) =
            self.events.push(RendererEvent::Finished(voice))
        {
            self.retired.push(voice);
        }
    }

    fn return_retired(&mut self) {
        while let Some(voice) = self.retired.pop() {
            if let Err(PushError::Full(RendererEvent::Finished(voice))) =
                self.events.push(RendererEvent::Finished(voice))
            {
                self.retired.push(voice);
                break;
            }
        }
    }
}
