//! Error types for model training and generation.

use crate::checkpoint::Architecture;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] moodtrack_core::Error),

    #[error("Backend init failed: {0}")]
    BackendInit(String),

    #[error("No training windows: {0}")]
    EmptyDataset(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    #[error("Tensor data error: {0}")]
    Tensor(String),

    #[error("Failed to save or load weights: {0}")]
    Recorder(String),

    #[error("Checkpoint holds a {found:?} model, expected {expected:?}")]
    ArchitectureMismatch {
        expected: Architecture,
        found: Architecture,
    },

    #[error("Manifest parse error: {0}")]
    ManifestParse(#[from] toml::de::Error),

    #[error("Manifest serialize error: {0}")]
    ManifestSerialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<burn::record::RecorderError> for Error {
    fn from(e: burn::record::RecorderError) -> Self {
        Error::Recorder(format!("{e:?}"))
    }
}
