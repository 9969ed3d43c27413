//! Session recording: the timestamped note log and the payload built from it.

pub mod ledger;
pub mod melody;

pub use ledger::{RecordedNote, RecordingLedger};
pub use melody::{MelodyPayload, SessionSettings};
