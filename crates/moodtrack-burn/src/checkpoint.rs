//! Model checkpoints on disk.
//!
//! A checkpoint is a directory holding the weights (`model.mpk`, written by
//! burn's named MessagePack recorder at full precision) next to a
//! `manifest.toml` that records which architecture the weights belong to and
//! the hyper-parameters needed to rebuild it. Pitch models also carry their
//! vocabulary so token ids decode to the same pitches after reload.

use crate::error::{Error, Result};
use crate::model::{
    ConditionedRnn, ConditionedRnnConfig, NoteRnn, NoteRnnConfig, PitchLstm, PitchLstmConfig,
};
use burn::module::Module;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::backend::Backend;
use moodtrack_core::Vocabulary;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Weights file stem; the recorder appends `.mpk`.
pub const WEIGHTS_FILE: &str = "model";
pub const MANIFEST_FILE: &str = "manifest.toml";

type Recorder = NamedMpkFileRecorder<FullPrecisionSettings>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    NoteRnn,
    ConditionedRnn,
    PitchLstm,
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Architecture::NoteRnn => "note_rnn",
            Architecture::ConditionedRnn => "conditioned_rnn",
            Architecture::PitchLstm => "pitch_lstm",
        })
    }
}

/// Contents of `manifest.toml`.
///
/// Fields that do not apply to an architecture are left at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointManifest {
    pub architecture: Architecture,
    pub sequence_length: usize,
    #[serde(default)]
    pub input_size: usize,
    #[serde(default)]
    pub condition_size: usize,
    #[serde(default)]
    pub output_size: usize,
    #[serde(default)]
    pub embedding_size: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocabulary: Option<Vocabulary>,
}

impl CheckpointManifest {
    pub fn note_rnn(config: &NoteRnnConfig, sequence_length: usize) -> Self {
        Self {
            architecture: Architecture::NoteRnn,
            sequence_length,
            input_size: config.input_size,
            condition_size: 0,
            output_size: config.input_size,
            embedding_size: 0,
            hidden_size: config.hidden_size,
            num_layers: config.num_layers,
            vocabulary: None,
        }
    }

    pub fn conditioned_rnn(config: &ConditionedRnnConfig, sequence_length: usize) -> Self {
        Self {
            architecture: Architecture::ConditionedRnn,
            sequence_length,
            input_size: config.input_size,
            condition_size: config.condition_size,
            output_size: config.output_size,
            embedding_size: 0,
            hidden_size: config.hidden_size,
            num_layers: config.num_layers,
            vocabulary: None,
        }
    }

    pub fn pitch_lstm(config: &PitchLstmConfig, sequence_length: usize, vocab: Vocabulary) -> Self {
        Self {
            architecture: Architecture::PitchLstm,
            sequence_length,
            input_size: 0,
            condition_size: 0,
            output_size: config.vocab_size,
            embedding_size: config.embedding_size,
            hidden_size: config.hidden_size,
            num_layers: config.num_layers,
            vocabulary: Some(vocab),
        }
    }

    fn ensure_architecture(&self, architecture: Architecture) -> Result<()> {
        if self.architecture != architecture {
            return Err(Error::ArchitectureMismatch {
                expected: architecture,
                found: self.architecture,
            });
        }
        Ok(())
    }

    fn note_rnn_config(&self) -> NoteRnnConfig {
        NoteRnnConfig::new()
            .with_input_size(self.input_size)
            .with_hidden_size(self.hidden_size)
            .with_num_layers(self.num_layers)
    }

    fn conditioned_config(&self) -> ConditionedRnnConfig {
        ConditionedRnnConfig::new()
            .with_input_size(self.input_size)
            .with_condition_size(self.condition_size)
            .with_hidden_size(self.hidden_size)
            .with_num_layers(self.num_layers)
            .with_output_size(self.output_size)
    }

    fn pitch_config(&self, vocab_size: usize) -> PitchLstmConfig {
        PitchLstmConfig::new(vocab_size)
            .with_embedding_size(self.embedding_size)
            .with_hidden_size(self.hidden_size)
            .with_num_layers(self.num_layers)
    }
}

/// Write `module` and `manifest` into `dir`, creating it if needed.
pub fn save<B: Backend, M: Module<B>>(
    module: M,
    dir: impl AsRef<Path>,
    manifest: &CheckpointManifest,
) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let text = toml::to_string(manifest)?;
    fs::write(dir.join(MANIFEST_FILE), text)?;

    module.save_file(dir.join(WEIGHTS_FILE), &Recorder::new())?;

    info!(
        "Saved {} checkpoint to {}",
        manifest.architecture,
        dir.display()
    );
    Ok(())
}

pub fn read_manifest(dir: impl AsRef<Path>) -> Result<CheckpointManifest> {
    let text = fs::read_to_string(dir.as_ref().join(MANIFEST_FILE))?;
    Ok(toml::from_str(&text)?)
}

fn weights_path(dir: &Path) -> PathBuf {
    dir.join(WEIGHTS_FILE)
}

pub fn load_note_rnn<B: Backend>(
    dir: impl AsRef<Path>,
    device: &B::Device,
) -> Result<(NoteRnn<B>, CheckpointManifest)> {
    let dir = dir.as_ref();
    let manifest = read_manifest(dir)?;
    manifest.ensure_architecture(Architecture::NoteRnn)?;

    let model = manifest
        .note_rnn_config()
        .init::<B>(device)
        .load_file(weights_path(dir), &Recorder::new(), device)?;
    Ok((model, manifest))
}

pub fn load_conditioned_rnn<B: Backend>(
    dir: impl AsRef<Path>,
    device: &B::Device,
) -> Result<(ConditionedRnn<B>, CheckpointManifest)> {
    let dir = dir.as_ref();
    let manifest = read_manifest(dir)?;
    manifest.ensure_architecture(Architecture::ConditionedRnn)?;

    let model = manifest
        .conditioned_config()
        .init::<B>(device)
        .load_file(weights_path(dir), &Recorder::new(), device)?;
    Ok((model, manifest))
}

pub fn load_pitch_lstm<B: Backend>(
    dir: impl AsRef<Path>,
    device: &B::Device,
) -> Result<(PitchLstm<B>, Vocabulary, CheckpointManifest)> {
    let dir = dir.as_ref();
    let manifest = read_manifest(dir)?;
    manifest.ensure_architecture(Architecture::PitchLstm)?;

    let vocab = manifest
        .vocabulary
        .clone()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::InvalidConfig("pitch checkpoint has no vocabulary".into()))?;

    let model = manifest
        .pitch_config(vocab.len())
        .init::<B>(device)
        .load_file(weights_path(dir), &Recorder::new(), device)?;
    Ok((model, vocab, manifest))
}
