//! Core types for moodtrack.
//!
//! Everything here is independent of the tensor backend and of MIDI files:
//! notes and their feature view, windowing into training pairs, the pitch
//! vocabulary, mood presets, condition schedules and pipeline configuration.

mod error;
pub use error::{Error, Result};

pub mod note;
pub use note::{
    features_to_note, sanitize_features, sort_by_start, Note, NoteFeatures, NoteSequence,
    DEFAULT_SEED_FEATURES, MIN_NOTE_DURATION,
};

pub mod window;
pub use window::{
    create_conditioned_windows, create_token_windows, create_windows, TokenWindows,
    WindowBatch, WindowFeatures, WindowSet, FEATURES,
};

pub mod vocab;
pub use vocab::Vocabulary;

pub mod mood;
pub use mood::{Mood, MoodSettings};

pub mod condition;
pub use condition::{ConditionSchedule, ConditionVector, CONDITION_SIZE, NEUTRAL_CONDITION};

pub mod config;
pub use config::{DataConfig, GenerateConfig, MoodtrackConfig, TrainConfig};
