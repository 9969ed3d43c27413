#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::recording::ledger::RecordedNote;

/// Musical context the player picked for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct SessionSettings {
    pub musical_style: String,
    #[cfg_attr(feature = "serde", serde(rename = "tempoBPM"))]
    pub tempo_bpm: u32,
    pub time_signature: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            musical_style: "classical".to_string(),
            tempo_bpm: 120,
            time_signature: "4/4".to_string(),
        }
    }
}

/// A finished recording, ready to hand to the analysis service.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct MelodyPayload {
    pub notes: Vec<RecordedNote>,
    pub musical_style: String,
    #[cfg_attr(feature = "serde", serde(rename = "tempoBPM"))]
    pub tempo_bpm: u32,
    pub time_signature: String,
}

impl MelodyPayload {
    pub fn new(notes: Vec<RecordedNote>, settings: &SessionSettings) -> Self {
        Self {
            notes,
            musical_style: settings.musical_style.clone(),
            tempo_bpm: settings.tempo_bpm,
            time_signature: settings.time_signature.clone(),
        }
    }

    /// Seconds from the first note-on to the last note-off.
    pub fn length(&self) -> f64 {
        self.notes
            .iter()
            .map(|n| n.start_time + n.duration)
            .fold(0.0, f64::max)
    }
}
