//! Recurrent note models.
//!
//! All three models share the same trunk: a stack of batch-first LSTM layers
//! whose last time step feeds a linear head.
//!
//! - [`NoteRnn`] regresses the next `(pitch, start, duration)` row.
//! - [`ConditionedRnn`] does the same with a game-state vector appended to
//!   every input row.
//! - [`PitchLstm`] embeds pitch tokens and classifies the next token.

use burn::config::Config;
use burn::module::Module;
use burn::nn::{Embedding, EmbeddingConfig, Linear, LinearConfig, Lstm, LstmConfig};
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor, TensorData};
use moodtrack_core::NEUTRAL_CONDITION;

/// LSTM layers applied one after another, each seeing the full output
/// sequence of the previous one.
#[derive(Module, Debug)]
pub struct StackedLstm<B: Backend> {
    layers: Vec<Lstm<B>>,
}

impl<B: Backend> StackedLstm<B> {
    pub fn new(d_input: usize, d_hidden: usize, num_layers: usize, device: &B::Device) -> Self {
        let layers = (0..num_layers.max(1))
            .map(|i| {
                let d_in = if i == 0 { d_input } else { d_hidden };
                LstmConfig::new(d_in, d_hidden, true).init(device)
            })
            .collect();
        Self { layers }
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// `[batch, seq, d_input]` -> `[batch, seq, d_hidden]`
    pub fn forward(&self, input: Tensor<B, 3>) -> Tensor<B, 3> {
        self.layers
            .iter()
            .fold(input, |x, layer| layer.forward(x, None).0)
    }
}

/// `[batch, seq, d]` -> `[batch, d]` at the final time step.
fn last_step<B: Backend>(sequence: Tensor<B, 3>) -> Tensor<B, 2> {
    let [batch, seq, d] = sequence.dims();
    sequence.narrow(1, seq - 1, 1).reshape([batch, d])
}

/// Anything that can continue a window of note features.
pub trait NotePredictor<B: Backend> {
    /// `window` is `[batch, seq, 3]`, `condition` is `[batch, condition_size]`.
    /// Returns `[batch, 3]`.
    fn predict_next(&self, window: Tensor<B, 3>, condition: Option<Tensor<B, 2>>) -> Tensor<B, 2>;

    /// Width of the condition vector; 0 for unconditioned models.
    fn condition_size(&self) -> usize {
        0
    }
}

#[derive(Config, Debug)]
pub struct NoteRnnConfig {
    #[config(default = 3)]
    pub input_size: usize,
    #[config(default = 128)]
    pub hidden_size: usize,
    #[config(default = 2)]
    pub num_layers: usize,
}

impl NoteRnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> NoteRnn<B> {
        NoteRnn {
            lstm: StackedLstm::new(self.input_size, self.hidden_size, self.num_layers, device),
            output: LinearConfig::new(self.hidden_size, self.input_size).init(device),
        }
    }
}

/// Next-note regressor over raw note features.
#[derive(Module, Debug)]
pub struct NoteRnn<B: Backend> {
    lstm: StackedLstm<B>,
    output: Linear<B>,
}

impl<B: Backend> NoteRnn<B> {
    /// `[batch, seq, 3]` -> `[batch, 3]`
    pub fn forward(&self, input: Tensor<B, 3>) -> Tensor<B, 2> {
        self.output.forward(last_step(self.lstm.forward(input)))
    }
}

impl<B: Backend> NotePredictor<B> for NoteRnn<B> {
    fn predict_next(&self, window: Tensor<B, 3>, _condition: Option<Tensor<B, 2>>) -> Tensor<B, 2> {
        self.forward(window)
    }
}

#[derive(Config, Debug)]
pub struct ConditionedRnnConfig {
    #[config(default = 3)]
    pub input_size: usize,
    #[config(default = 3)]
    pub condition_size: usize,
    #[config(default = 256)]
    pub hidden_size: usize,
    #[config(default = 2)]
    pub num_layers: usize,
    #[config(default = 3)]
    pub output_size: usize,
}

impl ConditionedRnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConditionedRnn<B> {
        ConditionedRnn {
            lstm: StackedLstm::new(
                self.input_size + self.condition_size,
                self.hidden_size,
                self.num_layers,
                device,
            ),
            output: LinearConfig::new(self.hidden_size, self.output_size).init(device),
            condition_size: self.condition_size,
        }
    }
}

/// Next-note regressor steered by a per-sequence condition vector.
#[derive(Module, Debug)]
pub struct ConditionedRnn<B: Backend> {
    lstm: StackedLstm<B>,
    output: Linear<B>,
    condition_size: usize,
}

impl<B: Backend> ConditionedRnn<B> {
    /// Predictions for every time step: `[batch, seq, output_size]`.
    pub fn forward_sequence(&self, input: Tensor<B, 3>, condition: Tensor<B, 2>) -> Tensor<B, 3> {
        let [batch, seq, _] = input.dims();
        let [_, width] = condition.dims();
        let repeated = condition.reshape([batch, 1, width]).repeat_dim(1, seq);
        let joined = Tensor::cat(vec![input, repeated], 2);
        self.output.forward(self.lstm.forward(joined))
    }

    /// Prediction after the last time step: `[batch, output_size]`.
    pub fn forward(&self, input: Tensor<B, 3>, condition: Tensor<B, 2>) -> Tensor<B, 2> {
        last_step(self.forward_sequence(input, condition))
    }

    fn neutral_condition(&self, batch: usize, device: &B::Device) -> Tensor<B, 2> {
        let row: Vec<f32> = (0..self.condition_size)
            .map(|i| NEUTRAL_CONDITION.get(i).copied().unwrap_or(0.0))
            .collect();
        let values = row.repeat(batch);
        Tensor::from_data(TensorData::new(values, [batch, self.condition_size]), device)
    }
}

impl<B: Backend> NotePredictor<B> for ConditionedRnn<B> {
    fn predict_next(&self, window: Tensor<B, 3>, condition: Option<Tensor<B, 2>>) -> Tensor<B, 2> {
        let condition = match condition {
            Some(c) => c,
            None => {
                let [batch, _, _] = window.dims();
                self.neutral_condition(batch, &window.device())
            }
        };
        self.forward(window, condition)
    }

    fn condition_size(&self) -> usize {
        self.condition_size
    }
}

#[derive(Config, Debug)]
pub struct PitchLstmConfig {
    pub vocab_size: usize,
    #[config(default = 64)]
    pub embedding_size: usize,
    #[config(default = 128)]
    pub hidden_size: usize,
    #[config(default = 2)]
    pub num_layers: usize,
}

impl PitchLstmConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> PitchLstm<B> {
        PitchLstm {
            embedding: EmbeddingConfig::new(self.vocab_size, self.embedding_size).init(device),
            lstm: StackedLstm::new(self.embedding_size, self.hidden_size, self.num_layers, device),
            output: LinearConfig::new(self.hidden_size, self.vocab_size).init(device),
        }
    }
}

/// Next-pitch classifier over a vocabulary of pitch tokens.
#[derive(Module, Debug)]
pub struct PitchLstm<B: Backend> {
    embedding: Embedding<B>,
    lstm: StackedLstm<B>,
    output: Linear<B>,
}

impl<B: Backend> PitchLstm<B> {
    /// `[batch, seq]` token ids -> `[batch, vocab]` logits.
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let embedded = self.embedding.forward(tokens);
        self.output.forward(last_step(self.lstm.forward(embedded)))
    }
}
