//! Mini-batch training with Adam.
//!
//! Window indices are reshuffled every epoch with a seeded RNG so runs are
//! reproducible. The returned model lives on the inner (non-autodiff)
//! backend, ready for generation or saving.

use crate::error::Error;
use crate::model::{ConditionedRnn, NoteRnn, PitchLstm};
use crate::tensor::{float_tensor, int_tensor};
use burn::config::Config;
use burn::module::AutodiffModule;
use burn::nn::loss::{CrossEntropyLossConfig, MseLoss, Reduction};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor};
use moodtrack_core::{TokenWindows, WindowSet, CONDITION_SIZE, FEATURES};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info};

#[derive(Config, Debug)]
pub struct TrainingConfig {
    #[config(default = 20)]
    pub num_epochs: usize,
    #[config(default = 64)]
    pub batch_size: usize,
    #[config(default = 1.0e-3)]
    pub learning_rate: f64,
    #[config(default = 42)]
    pub seed: u64,
    #[config(default = true)]
    pub shuffle: bool,
}

impl TrainingConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate {} must be positive",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Mean batch loss of every epoch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub epoch_losses: Vec<f64>,
    pub batches_per_epoch: usize,
}

impl TrainingReport {
    pub fn final_loss(&self) -> Option<f64> {
        self.epoch_losses.last().copied()
    }
}

/// Shared epoch/batch loop. `batch_loss` builds the loss of one batch of window indices.
fn fit<B, M, F>(
    mut model: M,
    len: usize,
    config: &TrainingConfig,
    mut batch_loss: F,
) -> (M, TrainingReport)
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    F: FnMut(&M, &[usize]) -> Tensor<B, 1>,
{
    let mut optim = AdamConfig::new().init();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut order: Vec<usize> = (0..len).collect();
    let mut report = TrainingReport {
        epoch_losses: Vec::with_capacity(config.num_epochs),
        batches_per_epoch: len.div_ceil(config.batch_size),
    };

    info!(
        "Training on {} windows, {} batches per epoch",
        len, report.batches_per_epoch
    );

    for epoch in 0..config.num_epochs {
        if config.shuffle {
            order.shuffle(&mut rng);
        }

        let mut total = 0.0;
        for (batch, indices) in order.chunks(config.batch_size).enumerate() {
            let loss = batch_loss(&model, indices);
            let value = loss.clone().into_scalar().elem::<f64>();
            total += value;

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(config.learning_rate, model, grads);

            debug!("Epoch {} batch {}: loss {:.6}", epoch + 1, batch + 1, value);
        }

        let mean = total / report.batches_per_epoch.max(1) as f64;
        info!("Epoch {}/{}, Loss: {:.4}", epoch + 1, config.num_epochs, mean);
        report.epoch_losses.push(mean);
    }

    (model, report)
}

/// Fit a [`NoteRnn`] to predict the note after each window (MSE).
pub fn train_note_rnn<B: AutodiffBackend>(
    model: NoteRnn<B>,
    windows: &WindowSet,
    config: &TrainingConfig,
    device: &B::Device,
) -> crate::error::Result<(NoteRnn<B::InnerBackend>, TrainingReport)> {
    config.validate()?;
    if windows.is_empty() {
        return Err(Error::EmptyDataset(
            "MIDI files may be too short for the sequence length".into(),
        ));
    }

    let loss_fn = MseLoss::new();
    let (model, report) = fit(model, windows.len(), config, |model, indices| {
        let batch = windows.gather(indices);
        let inputs = float_tensor::<B, 3>(
            batch.inputs,
            [batch.len, batch.sequence_length, FEATURES],
            device,
        );
        let targets = float_tensor::<B, 2>(batch.targets, [batch.len, FEATURES], device);
        loss_fn.forward(model.forward(inputs), targets, Reduction::Mean)
    });

    Ok((model.valid(), report))
}

/// Fit a [`ConditionedRnn`] on windows carrying condition vectors (MSE).
pub fn train_conditioned<B: AutodiffBackend>(
    model: ConditionedRnn<B>,
    windows: &WindowSet,
    config: &TrainingConfig,
    device: &B::Device,
) -> crate::error::Result<(ConditionedRnn<B::InnerBackend>, TrainingReport)> {
    config.validate()?;
    if windows.is_empty() {
        return Err(Error::EmptyDataset(
            "MIDI files may be too short for the sequence length".into(),
        ));
    }
    if !windows.is_conditioned() {
        return Err(Error::InvalidConfig(
            "conditioned training needs windows with condition vectors".into(),
        ));
    }

    let loss_fn = MseLoss::new();
    let (model, report) = fit(model, windows.len(), config, |model, indices| {
        let batch = windows.gather(indices);
        let inputs = float_tensor::<B, 3>(
            batch.inputs,
            [batch.len, batch.sequence_length, FEATURES],
            device,
        );
        let conditions = float_tensor::<B, 2>(
            batch.conditions.unwrap_or_default(),
            [batch.len, CONDITION_SIZE],
            device,
        );
        let targets = float_tensor::<B, 2>(batch.targets, [batch.len, FEATURES], device);
        loss_fn.forward(model.forward(inputs, conditions), targets, Reduction::Mean)
    });

    Ok((model.valid(), report))
}

/// Fit a [`PitchLstm`] to classify the token after each window (cross-entropy).
pub fn train_pitch_lstm<B: AutodiffBackend>(
    model: PitchLstm<B>,
    windows: &TokenWindows,
    config: &TrainingConfig,
    device: &B::Device,
) -> crate::error::Result<(PitchLstm<B::InnerBackend>, TrainingReport)> {
    config.validate()?;
    if windows.is_empty() {
        return Err(Error::EmptyDataset(
            "pitch corpus is not longer than the sequence length".into(),
        ));
    }

    let loss_fn = CrossEntropyLossConfig::new().init(device);
    let sequence_length = windows.sequence_length();
    let (model, report) = fit(model, windows.len(), config, |model, indices| {
        let (inputs, targets) = windows.gather(indices);
        let inputs = int_tensor::<B, 2>(inputs, [indices.len(), sequence_length], device);
        let targets = int_tensor::<B, 1>(targets, [indices.len()], device);
        loss_fn.forward(model.forward(inputs), targets)
    });

    Ok((model.valid(), report))
}
