//! Mood presets for adaptive soundtracks.

use crate::condition::ConditionVector;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Game state the soundtrack should follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Calm,
    Happy,
    Tense,
    Battle,
    #[default]
    Exploration,
}

/// Rendering parameters of a mood.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoodSettings {
    pub tempo_bpm: f64,
    /// Transposition in semitones; may be fractional
    pub transpose: f32,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Calm,
        Mood::Happy,
        Mood::Tense,
        Mood::Battle,
        Mood::Exploration,
    ];

    pub fn settings(self) -> MoodSettings {
        let (tempo_bpm, transpose) = match self {
            Mood::Calm => (60.0, -2.0),
            Mood::Happy => (90.0, 0.0),
            Mood::Tense => (120.0, 2.0),
            Mood::Battle => (140.0, 3.0),
            Mood::Exploration => (110.0, 2.5),
        };
        MoodSettings {
            tempo_bpm,
            transpose,
        }
    }

    /// `[combat_intensity, tempo_factor, tension]` for the conditioned model.
    pub fn condition(self) -> ConditionVector {
        match self {
            Mood::Calm => [1.0, 1.0, 0.2],
            Mood::Happy => [1.2, 1.1, 0.3],
            Mood::Tense => [1.5, 1.1, 0.6],
            Mood::Battle => [2.0, 1.2, 0.8],
            Mood::Exploration => [1.0, 1.0, 0.1],
        }
    }

    /// Whole-semitone shift applied to rendered pitches.
    pub fn semitones(self) -> i32 {
        self.settings().transpose.round() as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            Mood::Calm => "calm",
            Mood::Happy => "happy",
            Mood::Tense => "tense",
            Mood::Battle => "battle",
            Mood::Exploration => "exploration",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mood {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Mood::ALL
            .into_iter()
            .find(|m| m.name() == lower)
            .ok_or_else(|| Error::UnknownMood(s.to_string()))
    }
}
