use crate::input::keymap;
use crate::pitch::{self, Pitch};

/// One key of the on-screen keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PianoKey {
    pub pitch: Pitch,
    pub name: String,
    pub is_black: bool,
    /// Computer key that plays this pitch, for labelling
    pub binding: Option<char>,
    pub pressed: bool,
}

/// Visual model of the playable keyboard: which keys exist and which are
/// drawn pressed.
#[derive(Debug, Clone)]
pub struct KeyboardLayout {
    keys: Vec<PianoKey>,
}

impl Default for KeyboardLayout {
    /// Two octaves from C3.
    fn default() -> Self {
        Self::new(48, 2)
    }
}

impl KeyboardLayout {
    pub fn new(first: Pitch, octaves: u8) -> Self {
        let count = octaves as usize * 12;
        let keys = (0..count)
            .map_while(|i| u8::try_from(i).ok().and_then(|i| first.checked_add(i)))
            .take_while(|&pitch| pitch <= pitch::MAX_PITCH)
            .map(|pitch| PianoKey {
                pitch,
                name: pitch::name(pitch),
                is_black: pitch::is_black_key(pitch),
                binding: keymap::key_for_pitch(pitch),
                pressed: false,
            })
            .collect();
        Self { keys }
    }

    pub fn keys(&self) -> &[PianoKey] {
        &self.keys
    }

    pub fn key(&self, pitch: Pitch) -> Option<&PianoKey> {
        self.keys.iter().find(|k| k.pitch == pitch)
    }

    pub fn contains(&self, pitch: Pitch) -> bool {
        self.key(pitch).is_some()
    }

    pub fn first_pitch(&self) -> Option<Pitch> {
        self.keys.first().map(|k| k.pitch)
    }

    pub fn white_keys(&self) -> impl Iterator<Item = &PianoKey> {
        self.keys.iter().filter(|k| !k.is_black)
    }

    pub fn black_keys(&self) -> impl Iterator<Item = &PianoKey> {
        self.keys.iter().filter(|k| k.is_black)
    }

    pub fn set_pressed(&mut self, pitch: Pitch, pressed: bool) {
        if let Some(key) = self.keys.iter_mut().find(|k| k.pitch == pitch) {
            key.pressed = pressed;
        }
    }

    pub fn clear_pressed(&mut self) {
        for key in &mut self.keys {
            key.pressed = false;
        }
    }

    pub fn pressed_pitches(&self) -> Vec<Pitch> {
        self.keys.iter().filter(|k| k.pressed).map(|k| k.pitch).collect()
    }
}
