//! Autoregressive generation.
//!
//! Every step feeds the last `sequence_length` rows back into the model and
//! appends its prediction. Returned sequences start with the seed.

use crate::error::{Error, Result};
use crate::model::{NotePredictor, PitchLstm};
use crate::tensor::{argmax, float_tensor, int_tensor, to_vec};
use burn::tensor::backend::Backend;
use moodtrack_core::{
    sanitize_features, ConditionSchedule, NoteFeatures, Vocabulary, CONDITION_SIZE,
    DEFAULT_SEED_FEATURES, FEATURES,
};
use rand::Rng;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
    pub steps: usize,
    pub sequence_length: usize,
}

impl GenerateOptions {
    pub fn new(steps: usize, sequence_length: usize) -> Self {
        Self {
            steps,
            sequence_length,
        }
    }
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self::new(200, 32)
    }
}

/// Sanitize `seed` and left-pad it to `sequence_length` rows.
///
/// Padding repeats the first row, or the default middle-C row when the seed
/// is empty. Longer seeds are kept whole.
pub fn prepare_seed(seed: &[NoteFeatures], sequence_length: usize) -> Vec<NoteFeatures> {
    let rows: Vec<NoteFeatures> = seed.iter().map(|row| sanitize_features(row)).collect();
    let pad = rows.first().copied().unwrap_or(DEFAULT_SEED_FEATURES);
    let missing = sequence_length.saturating_sub(rows.len());

    let mut out = Vec::with_capacity(missing + rows.len());
    out.extend(std::iter::repeat(pad).take(missing));
    out.extend(rows);
    out
}

/// Roll a note model forward `options.steps` times.
///
/// With a schedule, step `i` is conditioned on `schedule.at(i)`; models
/// without a condition input ignore it.
pub fn generate_notes<B: Backend, M: NotePredictor<B>>(
    model: &M,
    seed: &[NoteFeatures],
    options: &GenerateOptions,
    schedule: Option<&ConditionSchedule>,
    device: &B::Device,
) -> Result<Vec<NoteFeatures>> {
    let len = options.sequence_length;
    if len == 0 {
        return Err(Error::InvalidConfig("sequence_length must be at least 1".into()));
    }

    let schedule = match schedule {
        Some(s) if model.condition_size() == 0 => {
            debug!(
                "Ignoring {}-step condition schedule for unconditioned model",
                s.len()
            );
            None
        }
        Some(_) if model.condition_size() != CONDITION_SIZE => {
            return Err(Error::InvalidConfig(format!(
                "model expects {} condition values, schedules carry {}",
                model.condition_size(),
                CONDITION_SIZE
            )));
        }
        other => other,
    };

    let mut generated = prepare_seed(seed, len);
    generated.reserve(options.steps);

    for step in 0..options.steps {
        let window: Vec<f32> = generated[generated.len() - len..]
            .iter()
            .flatten()
            .copied()
            .collect();
        let input = float_tensor::<B, 3>(window, [1, len, FEATURES], device);
        let condition = schedule
            .map(|s| float_tensor::<B, 2>(s.at(step).to_vec(), [1, CONDITION_SIZE], device));

        let output = to_vec(model.predict_next(input, condition))?;
        generated.push(sanitize_features(&output));
    }

    debug!(
        "Generated {} rows from a {}-row window",
        options.steps, len
    );
    Ok(generated)
}

/// Greedy next-pitch rollout. Returns the seed followed by `steps` new pitches.
pub fn generate_pitches<B: Backend>(
    model: &PitchLstm<B>,
    vocab: &Vocabulary,
    seed: &[u8],
    options: &GenerateOptions,
    device: &B::Device,
) -> Result<Vec<u8>> {
    if seed.is_empty() {
        return Err(Error::InvalidSeed("seed needs at least one pitch".into()));
    }
    if options.sequence_length == 0 {
        return Err(Error::InvalidConfig("sequence_length must be at least 1".into()));
    }

    let mut tokens = vocab.encode_all(seed)?;
    tokens.reserve(options.steps);

    for _ in 0..options.steps {
        let start = tokens.len().saturating_sub(options.sequence_length);
        let window: Vec<i64> = tokens[start..].iter().map(|&t| t as i64).collect();
        let width = window.len();

        let logits = to_vec(model.forward(int_tensor::<B, 2>(window, [1, width], device)))?;
        let next = argmax(&logits)
            .ok_or_else(|| Error::Tensor("model returned no logits".into()))?;
        tokens.push(next);
    }

    tokens
        .into_iter()
        .map(|t| {
            vocab
                .decode(t)
                .ok_or_else(|| Error::Tensor(format!("token {t} outside vocabulary")))
        })
        .collect()
}

/// Random starting window: continuous pitches in `48..72`, starts spread over
/// `0..len * 0.25` seconds, durations in `0.05..0.5`.
pub fn random_seed<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<NoteFeatures> {
    let span = len as f32 * 0.25;
    let step = if len > 1 { span / (len - 1) as f32 } else { 0.0 };

    (0..len)
        .map(|i| {
            [
                rng.gen_range(48.0f32..72.0),
                i as f32 * step,
                rng.gen_range(0.05f32..0.5),
            ]
        })
        .collect()
}
