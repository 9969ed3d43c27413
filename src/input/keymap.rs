/*
Computer Keyboard Map
=====================

Two rows per octave, sharps on the row above, the layout every tracker
and DAW uses:

     s d   g h j         l ;              2 3   5 6 7
    z x c v b n m       , . /            q w e r t y u
    C3 ............ B3   C4 .. E4         C4 ............ B4

',' through '/' and 'q' through 'e' overlap (both reach C4-E4), so either
hand can play the middle of the keyboard.
*/

use crate::pitch::Pitch;

/// Key bindings in priority order; the first key bound to a pitch is its
/// label on the on-screen keyboard.
pub const KEY_BINDINGS: [(char, Pitch); 29] = [
    ('z', 48),
    ('s', 49),
    ('x', 50),
    ('d', 51),
    ('c', 52),
    ('v', 53),
    ('g', 54),
    ('b', 55),
    ('h', 56),
    ('n', 57),
    ('j', 58),
    ('m', 59),
    (',', 60),
    ('l', 61),
    ('.', 62),
    (';', 63),
    ('/', 64),
    ('q', 60),
    ('2', 61),
    ('w', 62),
    ('3', 63),
    ('e', 64),
    ('r', 65),
    ('5', 66),
    ('t', 67),
    ('6', 68),
    ('y', 69),
    ('7', 70),
    ('u', 71),
];

/// Pitch bound to `key`, case-insensitive.
pub fn pitch_for_key(key: char) -> Option<Pitch> {
    let key = key.to_ascii_lowercase();
    KEY_BINDINGS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|&(_, pitch)| pitch)
}

/// First key bound to `pitch`.
pub fn key_for_pitch(pitch: Pitch) -> Option<char> {
    KEY_BINDINGS
        .iter()
        .find(|(_, p)| *p == pitch)
        .map(|&(key, _)| key)
}
