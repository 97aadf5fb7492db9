//! Pipeline configuration, loaded from a TOML file.
//!
//! ```toml
//! [data]
//! midi_dir = "data"
//! sequence_length = 32
//!
//! [train]
//! epochs = 20
//! learning_rate = 0.001
//!
//! [generate]
//! steps = 200
//! mood = "battle"
//! ```

use crate::mood::Mood;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoodtrackConfig {
    pub data: DataConfig,
    pub train: TrainConfig,
    pub generate: GenerateConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory scanned for `.mid`/`.midi` files
    pub midi_dir: PathBuf,

    /// Window length of the note models
    pub sequence_length: usize,

    /// Window length of the pitch-token model during training
    pub pitch_sequence_length: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            midi_dir: PathBuf::from("data"),
            sequence_length: 32,
            pitch_sequence_length: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub seed: u64,
    pub shuffle: bool,
    /// Checkpoint directory
    pub model_dir: PathBuf,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 20,
            batch_size: 64,
            learning_rate: 1e-3,
            seed: 42,
            shuffle: true,
            model_dir: PathBuf::from("models"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Notes appended after the seed
    pub steps: usize,

    /// Seed length and look-back window of the pitch-token sampler
    pub pitch_seed_length: usize,

    pub velocity: u8,
    pub mood: Mood,
    pub output_dir: PathBuf,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            steps: 200,
            pitch_seed_length: 100,
            velocity: 100,
            mood: Mood::default(),
            output_dir: PathBuf::from("generated"),
        }
    }
}

impl MoodtrackConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.data.sequence_length == 0
            || self.data.pitch_sequence_length == 0
            || self.generate.pitch_seed_length == 0
        {
            return Err(Error::InvalidConfig(
                "sequence lengths must be at least 1".into(),
            ));
        }
        if self.train.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".into()));
        }
        if !(self.train.learning_rate.is_finite() && self.train.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate {} must be positive",
                self.train.learning_rate
            )));
        }
        if !(1..=127).contains(&self.generate.velocity) {
            return Err(Error::InvalidConfig(format!(
                "velocity {} out of range (1-127)",
                self.generate.velocity
            )));
        }
        Ok(())
    }
}
