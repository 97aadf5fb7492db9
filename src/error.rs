//! Centralized error type for the moodtrack umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] moodtrack_core::Error),

    #[error("MIDI: {0}")]
    Midi(#[from] moodtrack_midi_io::Error),

    #[error("Model: {0}")]
    Model(#[from] moodtrack_burn::Error),

    #[error("No usable MIDI files in {0}")]
    EmptyCorpus(PathBuf),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
