//! Sliding windows over note sequences.
//!
//! Every sequence longer than the window length `L` contributes
//! `len - L` training pairs: `L` consecutive notes as input and the note that
//! follows them as target. Shorter sequences contribute nothing.

use crate::condition::{ConditionVector, CONDITION_SIZE};
use crate::note::{Note, NoteFeatures};
use crate::{Error, Result};
use tracing::debug;

/// Features per note row.
pub const FEATURES: usize = 3;

/// Fixed-length input/target pairs, stored flat for cheap batch assembly.
#[derive(Debug, Clone, Default)]
pub struct WindowSet {
    sequence_length: usize,
    /// `[n, L, 3]` row-major
    inputs: Vec<f32>,
    /// `[n, 3]`
    targets: Vec<f32>,
    /// `[n, CONDITION_SIZE]`, present for conditioned sets only
    conditions: Option<Vec<f32>>,
}

/// A gathered mini-batch, still flat.
#[derive(Debug, Clone)]
pub struct WindowBatch {
    pub len: usize,
    pub sequence_length: usize,
    pub inputs: Vec<f32>,
    pub targets: Vec<f32>,
    pub conditions: Option<Vec<f32>>,
}

impl WindowSet {
    pub fn len(&self) -> usize {
        self.targets.len() / FEATURES
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn is_conditioned(&self) -> bool {
        self.conditions.is_some()
    }

    pub fn input(&self, index: usize) -> &[f32] {
        let stride = self.sequence_length * FEATURES;
        &self.inputs[index * stride..(index + 1) * stride]
    }

    pub fn target(&self, index: usize) -> NoteFeatures {
        let row = &self.targets[index * FEATURES..(index + 1) * FEATURES];
        [row[0], row[1], row[2]]
    }

    pub fn condition(&self, index: usize) -> Option<&[f32]> {
        self.conditions
            .as_ref()
            .map(|c| &c[index * CONDITION_SIZE..(index + 1) * CONDITION_SIZE])
    }

    /// Copy the windows at `indices` into one contiguous batch.
    pub fn gather(&self, indices: &[usize]) -> WindowBatch {
        let stride = self.sequence_length * FEATURES;
        let mut inputs = Vec::with_capacity(indices.len() * stride);
        let mut targets = Vec::with_capacity(indices.len() * FEATURES);
        let mut conditions = self
            .conditions
            .as_ref()
            .map(|_| Vec::with_capacity(indices.len() * CONDITION_SIZE));

        for &i in indices {
            inputs.extend_from_slice(self.input(i));
            targets.extend_from_slice(&self.target(i));
            if let (Some(out), Some(cond)) = (conditions.as_mut(), self.condition(i)) {
                out.extend_from_slice(cond);
            }
        }

        WindowBatch {
            len: indices.len(),
            sequence_length: self.sequence_length,
            inputs,
            targets,
            conditions,
        }
    }
}

fn check_length(sequence_length: usize) -> Result<()> {
    if sequence_length == 0 {
        return Err(Error::InvalidSequenceLength(sequence_length));
    }
    Ok(())
}

/// Build `(window, next note)` pairs from every sequence longer than `sequence_length`.
pub fn create_windows(sequences: &[Vec<Note>], sequence_length: usize) -> Result<WindowSet> {
    build_windows(sequences, sequence_length, false)
}

/// Like [`create_windows`], with a condition vector derived from each input window.
pub fn create_conditioned_windows(
    sequences: &[Vec<Note>],
    sequence_length: usize,
) -> Result<WindowSet> {
    build_windows(sequences, sequence_length, true)
}

fn build_windows(
    sequences: &[Vec<Note>],
    sequence_length: usize,
    conditioned: bool,
) -> Result<WindowSet> {
    check_length(sequence_length)?;

    let mut set = WindowSet {
        sequence_length,
        conditions: conditioned.then(Vec::new),
        ..Default::default()
    };

    for seq in sequences {
        if seq.len() <= sequence_length {
            continue;
        }
        for i in 0..seq.len() - sequence_length {
            let window = &seq[i..i + sequence_length];
            for note in window {
                set.inputs.extend_from_slice(&note.features());
            }
            set.targets
                .extend_from_slice(&seq[i + sequence_length].features());
            if let Some(conditions) = set.conditions.as_mut() {
                conditions.extend_from_slice(&WindowFeatures::measure(window).condition());
            }
        }
    }

    debug!(
        "Created {} windows of length {} from {} sequences",
        set.len(),
        sequence_length,
        sequences.len()
    );

    Ok(set)
}

/// Integer token windows for the pitch vocabulary model.
#[derive(Debug, Clone, Default)]
pub struct TokenWindows {
    sequence_length: usize,
    tokens: Vec<usize>,
}

impl TokenWindows {
    pub fn len(&self) -> usize {
        self.tokens.len().saturating_sub(self.sequence_length)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn input(&self, index: usize) -> &[usize] {
        &self.tokens[index..index + self.sequence_length]
    }

    pub fn target(&self, index: usize) -> usize {
        self.tokens[index + self.sequence_length]
    }

    /// Flat `[n, L]` inputs and `[n]` targets for the windows at `indices`.
    pub fn gather(&self, indices: &[usize]) -> (Vec<i64>, Vec<i64>) {
        let mut inputs = Vec::with_capacity(indices.len() * self.sequence_length);
        let mut targets = Vec::with_capacity(indices.len());
        for &i in indices {
            inputs.extend(self.input(i).iter().map(|&t| t as i64));
            targets.push(self.target(i) as i64);
        }
        (inputs, targets)
    }
}

/// Token windows over one encoded stream.
pub fn create_token_windows(tokens: Vec<usize>, sequence_length: usize) -> Result<TokenWindows> {
    check_length(sequence_length)?;
    Ok(TokenWindows {
        sequence_length,
        tokens,
    })
}

/// Summary statistics of a window, used as a stand-in game-state signal
/// when training the conditioned model on plain MIDI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowFeatures {
    /// Onsets per second over the window span
    pub density: f32,
    /// Mean inter-onset interval in seconds
    pub mean_ioi: f32,
    /// Standard deviation of pitch in semitones
    pub pitch_spread: f32,
}

impl WindowFeatures {
    pub fn measure(window: &[Note]) -> Self {
        if window.is_empty() {
            return Self {
                density: 0.0,
                mean_ioi: 0.0,
                pitch_spread: 0.0,
            };
        }

        let first = window[0].start;
        let last_end = window.iter().map(Note::end).fold(first, f64::max);
        let span = (last_end - first).max(1e-3);
        let density = (window.len() as f64 / span) as f32;

        let mean_ioi = if window.len() > 1 {
            let total: f64 = window
                .windows(2)
                .map(|pair| (pair[1].start - pair[0].start).max(0.0))
                .sum();
            (total / (window.len() - 1) as f64) as f32
        } else {
            0.0
        };

        let n = window.len() as f32;
        let mean_pitch = window.iter().map(|note| note.pitch as f32).sum::<f32>() / n;
        let variance = window
            .iter()
            .map(|note| (note.pitch as f32 - mean_pitch).powi(2))
            .sum::<f32>()
            / n;

        Self {
            density,
            mean_ioi,
            pitch_spread: variance.sqrt(),
        }
    }

    /// Map onto `[combat_intensity, tempo_factor, tension]`, the same ranges the mood presets use.
    pub fn condition(&self) -> ConditionVector {
        let intensity = 1.0 + (self.density / 8.0).clamp(0.0, 1.0);
        let tempo_factor = if self.mean_ioi > 0.0 {
            (0.5 / self.mean_ioi).clamp(0.8, 1.2)
        } else {
            1.0
        };
        let tension = (self.pitch_spread / 12.0).clamp(0.0, 1.0);
        [intensity, tempo_factor, tension]
    }
}
