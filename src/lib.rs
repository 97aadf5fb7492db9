//! # moodtrack - Mood-adaptive game music
//!
//! Learns note sequences from a directory of MIDI files with LSTM models and
//! generates new material steered by a mood or by a per-step game-state
//! schedule.
//!
//! ## Architecture
//!
//! moodtrack is an umbrella crate that coordinates:
//! - **moodtrack-core** - Notes, windows, vocabulary, moods, configuration
//! - **moodtrack-midi-io** - MIDI file reading and writing
//! - **moodtrack-burn** - Models, training, checkpoints and generation
//!
//! ## Quick Start
//!
//! ```ignore
//! use moodtrack::prelude::*;
//!
//! let session = Session::builder()
//!     .config(MoodtrackConfig::load("moodtrack.toml")?)
//!     .build()?;
//!
//! let corpus = session.load_corpus()?;
//! session.train_pitch_lstm(&corpus.pitches())?;
//!
//! let pitches = session.generate_pitches(&corpus.pitches())?;
//! session.write_pitches(&pitches, "generated/adaptive_battle.mid")?;
//! ```

/// Re-export of moodtrack-core for direct access
pub use moodtrack_core as core;
pub use moodtrack_midi_io as midi;
pub use moodtrack_burn as models;

pub use moodtrack_core::{
    ConditionSchedule, ConditionVector, Mood, MoodSettings, MoodtrackConfig, Note, NoteFeatures,
    Vocabulary,
};
pub use moodtrack_burn::{Architecture, DevicePlacement, TrainingReport};

mod error;
pub use error::{Error, Result};

mod corpus;
pub use corpus::{read_pitches_json, write_pitches_json, Corpus};

mod builder;
mod session;

pub use builder::SessionBuilder;
pub use session::Session;

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{Corpus, Session, SessionBuilder};

    pub use crate::core::{ConditionSchedule, Mood, MoodtrackConfig, Note};
    pub use crate::models::{Architecture, DevicePlacement, TrainingReport};
}
