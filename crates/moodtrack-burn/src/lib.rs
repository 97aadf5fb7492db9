//! Burn models for moodtrack.
//!
//! LSTM note models trained with [Burn](https://burn.dev) on NdArray (CPU)
//! or wgpu (GPU), saved as checkpoint directories and rolled out
//! autoregressively.
//!
//! ```rust,ignore
//! let device = NdArrayDevice::default();
//! let model = NoteRnnConfig::new().init::<CpuTrainingBackend>(&device);
//! let (model, report) = train_note_rnn(model, &windows, &TrainingConfig::new(), &device)?;
//! let rows = generate_notes(&model, &seed, &GenerateOptions::default(), None, &device)?;
//! ```

mod error;
mod tensor;

pub mod checkpoint;
pub mod device;
pub mod generate;
pub mod model;
pub mod train;

pub use checkpoint::{
    load_conditioned_rnn, load_note_rnn, load_pitch_lstm, read_manifest, save, Architecture,
    CheckpointManifest, MANIFEST_FILE, WEIGHTS_FILE,
};
pub use device::{DevicePlacement, DevicePool};
pub use error::{Error, Result};
pub use generate::{generate_notes, generate_pitches, prepare_seed, random_seed, GenerateOptions};
pub use model::{
    ConditionedRnn, ConditionedRnnConfig, NotePredictor, NoteRnn, NoteRnnConfig, PitchLstm,
    PitchLstmConfig, StackedLstm,
};
pub use train::{
    train_conditioned, train_note_rnn, train_pitch_lstm, TrainingConfig, TrainingReport,
};

pub use burn;

use burn::backend::{Autodiff, NdArray, Wgpu};

pub use burn::backend::ndarray::NdArrayDevice;
pub use burn::backend::wgpu::WgpuDevice;

/// Inference on CPU.
pub type CpuBackend = NdArray<f32>;
/// Inference on GPU.
pub type GpuBackend = Wgpu;
pub type CpuTrainingBackend = Autodiff<CpuBackend>;
pub type GpuTrainingBackend = Autodiff<GpuBackend>;
