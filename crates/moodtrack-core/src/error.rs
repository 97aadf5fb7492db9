//! Error types for moodtrack-core.

use thiserror::Error;

/// Error type for moodtrack-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid sequence length: {0}. Must be at least 1")]
    InvalidSequenceLength(usize),

    #[error("Pitch {0} is not in the vocabulary")]
    UnknownPitch(u8),

    #[error("Unknown mood: {0}")]
    UnknownMood(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
