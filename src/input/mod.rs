//! Note-event input: raw key/pointer/touch events in, clean note
//! transitions out.

/// Wall clock abstraction for timestamps and debouncing.
pub mod clock;
/// The per-pitch note state machine.
pub mod controller;
/// Computer keyboard to pitch bindings.
pub mod keymap;
/// On-screen keyboard model.
pub mod layout;
/// Trait the controller drives (implemented by the engine).
pub mod output;
/// Input source identities.
pub mod source;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{ControllerConfig, KeyboardController};
pub use layout::{KeyboardLayout, PianoKey};
pub use output::NoteOutput;
pub use source::{InputSource, PointerId, TouchId};
