//! Grand - wires the terminal, the audio device and the piano together

use std::collections::HashMap;
use std::io::stdout;
use std::time::{Duration, Instant};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossterm::event::{
    self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags, MouseButton,
    MouseEvent, MouseEventKind, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use ratatui::{layout::Rect, DefaultTerminal};
use rtrb::{Consumer, RingBuffer};

use grand_dsp::input::{keymap, KeyboardController, PointerId, SystemClock};
use grand_dsp::pitch::Pitch;
use grand_dsp::recording::{MelodyPayload, SessionSettings};
use grand_dsp::synth::{PianoEngine, PianoRenderer, SynthConfig};

use crate::ui::{self, AudioStatus, MeterUpdate, ViewState};

/// The mouse is the only pointer a terminal reports
const MOUSE: PointerId = 0;
/// Hold time for keys on terminals that never report key releases
const AUTO_RELEASE: Duration = Duration::from_millis(300);
const DOUBLE_CLICK: Duration = Duration::from_millis(300);

/// Enable mouse, focus and (where supported) key release reporting for the
/// duration of `f`. `f` is told whether key releases will arrive.
pub fn with_input_reporting<T>(f: impl FnOnce(bool) -> EyreResult<T>) -> EyreResult<T> {
    let key_releases = crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
    let mut out = stdout();

    execute!(out, EnableMouseCapture, EnableFocusChange)?;
    if key_releases {
        execute!(
            out,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }

    let result = f(key_releases);

    if key_releases {
        execute!(out, PopKeyboardEnhancementFlags)?;
    }
    execute!(out, DisableFocusChange, DisableMouseCapture)?;
    result
}

struct AudioOutput {
    _stream: cpal::Stream,
    sample_rate: f32,
    meter_rx: Consumer<MeterUpdate>,
}

/// Rate the engine runs at when there is no device to play through
const SILENT_SAMPLE_RATE: f32 = 22_050.0;

/// Stands in for a device: pulls the renderer along in wall-clock time and
/// throws the samples away, so voices still age and retire.
struct SilentSink {
    renderer: PianoRenderer,
    last_pull: Instant,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl SilentSink {
    fn new(renderer: PianoRenderer) -> Self {
        Self {
            renderer,
            last_pull: Instant::now(),
            left: vec![0.0; 1024],
            right: vec![0.0; 1024],
        }
    }

    fn pull(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_pull).as_secs_f32();
        let mut frames = (elapsed * self.renderer.sample_rate()) as usize;
        if frames == 0 {
            return;
        }
        self.last_pull = now;

        while frames > 0 {
            let n = frames.min(self.left.len());
            self.renderer
                .render(&mut self.left[..n], &mut self.right[..n]);
            frames -= n;
        }
    }
}

enum Audio {
    Device(AudioOutput),
    Silent(SilentSink),
}

pub struct App {
    controller: KeyboardController<PianoEngine, SystemClock>,
    audio: Option<Audio>,
    meter: MeterUpdate,
    settings: SessionSettings,
    last_melody: Option<MelodyPayload>,
    /// Keys held on terminals without release events, with their deadline
    auto_release: HashMap<char, Instant>,
    key_releases: bool,
    mouse_pitch: Option<Pitch>,
    last_mouse_up: Option<Instant>,
    keyboard_area: Rect,
    should_quit: bool,
}

impl App {
    pub fn new(config: SynthConfig) -> EyreResult<Self> {
        Ok(Self {
            controller: KeyboardController::new(PianoEngine::new(config), SystemClock::new()),
            audio: None,
            meter: MeterUpdate::default(),
            settings: SessionSettings::default(),
            last_melody: None,
            auto_release: HashMap::new(),
            key_releases: true,
            mouse_pitch: None,
            last_mouse_up: None,
            keyboard_area: Rect::default(),
            should_quit: false,
        })
    }

    pub fn last_melody(&self) -> Option<&MelodyPayload> {
        self.last_melody.as_ref()
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal, key_releases: bool) -> EyreResult<()> {
        self.key_releases = key_releases;
        if !key_releases {
            log::info!("terminal does not report key releases; keys auto-release");
        }

        while !self.should_quit {
            self.poll_meter();
            if let Some(Audio::Silent(sink)) = self.audio.as_mut() {
                sink.pull();
            }
            self.expire_auto_releases();
            self.controller.output_mut().maintain();

            let mut keyboard_area = self.keyboard_area;
            terminal.draw(|frame| keyboard_area = ui::render(frame, &self.view()))?;
            self.keyboard_area = keyboard_area;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                let event = event::read()?;
                self.handle_event(event)?;
            }
        }

        if self.controller.is_recording() {
            self.toggle_recording();
        }
        self.controller.reset();
        Ok(())
    }

    /// Start sound on the first gesture so nothing plays before the player
    /// touches a key. Without a usable device the engine runs against a
    /// silent sink: notes, held state and recording keep working.
    fn ensure_audio(&mut self) {
        if self.audio.is_some() {
            return;
        }

        let audio = match self.open_device() {
            Ok(output) => Audio::Device(output),
            Err(err) => {
                log::warn!("audio unavailable, playing silently: {err:#}");
                match self.controller.output_mut().init(SILENT_SAMPLE_RATE) {
                    Some(renderer) => Audio::Silent(SilentSink::new(renderer)),
                    None => {
                        log::error!("piano engine initialised without a renderer");
                        return;
                    }
                }
            }
        };
        self.audio = Some(audio);
    }

    fn open_device(&mut self) -> EyreResult<AudioOutput> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let supported = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = supported.sample_rate().0 as f32;
        let channels = supported.channels() as usize;

        // The renderer only exists once the engine is initialised, and the
        // engine is only initialised once the stream is playing
        let (mut handoff_tx, mut handoff_rx) = RingBuffer::<PianoRenderer>::new(1);
        let (mut meter_tx, meter_rx) = RingBuffer::<MeterUpdate>::new(64);
        let mut renderer: Option<PianoRenderer> = None;

        let stream = device
            .build_output_stream(
                &supported.into(),
                move |data: &mut [f32], _| {
                    if renderer.is_none() {
                        renderer = handoff_rx.pop().ok();
                    }
                    let Some(renderer) = renderer.as_mut() else {
                        data.fill(0.0);
                        return;
                    };
                    renderer.render_interleaved(data, channels);
                    let peak = data.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
                    // Dropped updates only make the meter lag
                    let _ = meter_tx.push(MeterUpdate {
                        peak,
                        voices: renderer.voice_count(),
                        reduction_db: renderer.gain_reduction_db(),
                    });
                },
                |err| log::error!("audio stream error: {err}"),
                None,
            )
            .wrap_err("failed to build output stream")?;
        stream.play().wrap_err("failed to start output stream")?;

        let renderer = self
            .controller
            .output_mut()
            .init(sample_rate)
            .ok_or_else(|| eyre!("piano engine was already initialised"))?;
        if handoff_tx.push(renderer).is_err() {
            return Err(eyre!("audio callback did not take the renderer"));
        }

        log::info!("audio running: {sample_rate} Hz, {channels} channels");
        Ok(AudioOutput {
            _stream: stream,
            sample_rate,
            meter_rx,
        })
    }

    fn poll_meter(&mut self) {
        if let Some(Audio::Device(audio)) = self.audio.as_mut() {
            // Keep only the latest update
            while let Ok(update) = audio.meter_rx.pop() {
                self.meter = update;
            }
        }
    }

    fn expire_auto_releases(&mut self) {
        let now = Instant::now();
        let expired: Vec<char> = self
            .auto_release
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(&key, _)| key)
            .collect();
        for key in expired {
            self.auto_release.remove(&key);
            self.controller.key_up(key);
        }
    }

    fn handle_event(&mut self, event: Event) -> EyreResult<()> {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::FocusLost => {
                self.controller.blur();
                self.auto_release.clear();
                self.mouse_pitch = None;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> EyreResult<()> {
        if key.kind == KeyEventKind::Press {
            match key.code {
                KeyCode::Esc => {
                    self.should_quit = true;
                    return Ok(());
                }
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.should_quit = true;
                    return Ok(());
                }
                KeyCode::Tab => {
                    self.toggle_recording();
                    return Ok(());
                }
                _ => {}
            }
        }

        let KeyCode::Char(c) = key.code else {
            return Ok(());
        };
        if keymap::pitch_for_key(c).is_none() {
            return Ok(());
        }

        match key.kind {
            KeyEventKind::Press => {
                if !self.key_releases {
                    // Held keys arrive as a stream of presses: extend the hold
                    let deadline = Instant::now() + AUTO_RELEASE;
                    if self.auto_release.insert(c.to_ascii_lowercase(), deadline).is_some() {
                        return Ok(());
                    }
                }
                self.ensure_audio();
                self.controller.key_down(c, false);
            }
            KeyEventKind::Repeat => {
                self.controller.key_down(c, true);
            }
            KeyEventKind::Release => {
                self.controller.key_up(c);
            }
        }
        Ok(())
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> EyreResult<()> {
        let pitch = ui::keyboard::pitch_at(
            self.keyboard_area,
            self.controller.layout(),
            mouse.column,
            mouse.row,
        );

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(pitch) = pitch {
                    self.ensure_audio();
                    self.controller.pointer_down(MOUSE, pitch);
                }
                self.mouse_pitch = pitch;
            }
            MouseEventKind::Drag(MouseButton::Left) if pitch != self.mouse_pitch => {
                if let Some(old) = self.mouse_pitch {
                    self.controller.pointer_leave(MOUSE, old);
                }
                if let Some(new) = pitch {
                    self.controller.pointer_enter(MOUSE, new);
                }
                self.mouse_pitch = pitch;
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.controller.pointer_up(MOUSE);
                self.mouse_pitch = None;

                let now = Instant::now();
                if self
                    .last_mouse_up
                    .is_some_and(|t| now.duration_since(t) < DOUBLE_CLICK)
                {
                    log::debug!("double click, releasing all notes");
                    self.controller.double_click();
                    self.auto_release.clear();
                    self.last_mouse_up = None;
                } else {
                    self.last_mouse_up = Some(now);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn toggle_recording(&mut self) {
        let recording = self.controller.toggle_recording();
        self.auto_release.clear();
        self.mouse_pitch = None;
        if recording {
            return;
        }

        match self.controller.melody(&self.settings) {
            Ok(melody) => {
                log::info!(
                    "recorded {} notes over {:.1}s",
                    melody.notes.len(),
                    melody.length()
                );
                self.last_melody = Some(melody);
            }
            Err(err) => log::info!("nothing to keep: {err}"),
        }
    }

    fn view(&self) -> ViewState<'_> {
        ViewState {
            layout: self.controller.layout(),
            recording: self.controller.is_recording(),
            notes_recorded: self.controller.ledger().notes().len(),
            played_notes: self.controller.played_notes().collect(),
            held: self.controller.held_pitches(),
            meter: self.meter,
            audio: match &self.audio {
                None => AudioStatus::Pending,
                Some(Audio::Device(output)) => AudioStatus::Running(output.sample_rate),
                Some(Audio::Silent(_)) => AudioStatus::Silent,
            },
            key_releases: self.key_releases,
            last_melody: self.last_melody.as_ref(),
        }
    }
}
