//! Builder for configuring and constructing a [`Session`].

use crate::{Result, Session};
use moodtrack_burn::{
    ConditionedRnnConfig, DevicePlacement, DevicePool, NoteRnnConfig, PitchLstmConfig,
};
use moodtrack_core::MoodtrackConfig;

/// Model sizes default to the burn configs' defaults. The pitch model's
/// vocabulary size is always taken from the training corpus.
///
/// # Example
///
/// ```ignore
/// use moodtrack::prelude::*;
///
/// let session = Session::builder()
///     .config(MoodtrackConfig::load("moodtrack.toml")?)
///     .placement(DevicePlacement::Cpu)
///     .build()?;
///
/// let corpus = session.load_corpus()?;
/// let report = session.train_note_rnn(&corpus)?;
/// ```
pub struct SessionBuilder {
    config: MoodtrackConfig,
    placement: Option<DevicePlacement>,
    note_rnn: NoteRnnConfig,
    conditioned_rnn: ConditionedRnnConfig,
    pitch_lstm: PitchLstmConfig,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            config: MoodtrackConfig::default(),
            placement: None,
            note_rnn: NoteRnnConfig::new(),
            conditioned_rnn: ConditionedRnnConfig::new(),
            pitch_lstm: PitchLstmConfig::new(0),
        }
    }
}

impl SessionBuilder {
    pub fn config(mut self, config: MoodtrackConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: GPU when an adapter is found, CPU otherwise.
    pub fn placement(mut self, placement: DevicePlacement) -> Self {
        self.placement = Some(placement);
        self
    }

    pub fn note_rnn(mut self, config: NoteRnnConfig) -> Self {
        self.note_rnn = config;
        self
    }

    pub fn conditioned_rnn(mut self, config: ConditionedRnnConfig) -> Self {
        self.conditioned_rnn = config;
        self
    }

    /// `vocab_size` is ignored.
    pub fn pitch_lstm(mut self, config: PitchLstmConfig) -> Self {
        self.pitch_lstm = config;
        self
    }

    pub fn build(self) -> Result<Session> {
        self.config.validate()?;

        // Only probe for a GPU when one might be used.
        let pool = match self.placement {
            Some(DevicePlacement::Cpu) => DevicePool::cpu_only(),
            _ => DevicePool::new(),
        };
        let placement = match self.placement {
            Some(requested) => pool.resolve(requested),
            None => pool.default_placement(),
        };

        Ok(Session::new(
            self.config,
            pool,
            placement,
            self.note_rnn,
            self.conditioned_rnn,
            self.pitch_lstm,
        ))
    }
}
