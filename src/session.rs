//! Session that wires corpus loading, training, generation and MIDI output.

use crate::corpus::Corpus;
use crate::{Error, Result};
use moodtrack_burn::{
    generate, load_conditioned_rnn, load_note_rnn, load_pitch_lstm, random_seed, save,
    train_conditioned, train_note_rnn, train_pitch_lstm, Architecture, CheckpointManifest,
    ConditionedRnnConfig, CpuBackend, CpuTrainingBackend, DevicePlacement, DevicePool,
    GenerateOptions, GpuBackend, GpuTrainingBackend, NdArrayDevice, NoteRnnConfig,
    PitchLstmConfig, TrainingConfig, TrainingReport, WgpuDevice,
};
use moodtrack_burn::burn::tensor::backend::{AutodiffBackend, Backend};
use moodtrack_core::{
    create_conditioned_windows, create_token_windows, create_windows, features_to_note,
    ConditionSchedule, Mood, MoodtrackConfig, Note, NoteFeatures, TokenWindows, Vocabulary,
    WindowSet,
};
use moodtrack_midi_io::{render_pitches, write_notes, WriteOptions, DEFAULT_TOKEN_BEATS};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Device a session runs on, borrowed from its pool.
enum Target<'a> {
    Cpu(&'a NdArrayDevice),
    Gpu(&'a WgpuDevice),
}

/// Ties a [`MoodtrackConfig`] to a device and the model hyper-parameters.
///
/// Checkpoints live in `<train.model_dir>/<architecture>`, so each
/// architecture trained by a session can be reloaded for generation.
///
/// # Example
///
/// ```ignore
/// use moodtrack::prelude::*;
///
/// let session = Session::builder().build()?;
/// let corpus = session.load_corpus()?;
/// session.train_conditioned(&corpus)?;
///
/// let notes = session.generate_conditioned(&ConditionSchedule::three_act(200), None)?;
/// session.write_notes(&notes, "generated/adaptive.mid")?;
/// ```
pub struct Session {
    config: MoodtrackConfig,
    pool: DevicePool,
    placement: DevicePlacement,
    note_rnn: NoteRnnConfig,
    conditioned_rnn: ConditionedRnnConfig,
    pitch_lstm: PitchLstmConfig,
}

impl Session {
    pub fn builder() -> crate::SessionBuilder {
        crate::SessionBuilder::default()
    }

    pub(crate) fn new(
        config: MoodtrackConfig,
        pool: DevicePool,
        placement: DevicePlacement,
        note_rnn: NoteRnnConfig,
        conditioned_rnn: ConditionedRnnConfig,
        pitch_lstm: PitchLstmConfig,
    ) -> Self {
        info!("Session running on {:?}", placement);
        Self {
            config,
            pool,
            placement,
            note_rnn,
            conditioned_rnn,
            pitch_lstm,
        }
    }

    pub fn config(&self) -> &MoodtrackConfig {
        &self.config
    }

    pub fn placement(&self) -> DevicePlacement {
        self.placement
    }

    pub fn mood(&self) -> Mood {
        self.config.generate.mood
    }

    pub fn checkpoint_dir(&self, architecture: Architecture) -> PathBuf {
        self.config.train.model_dir.join(architecture.to_string())
    }

    pub fn training_config(&self) -> TrainingConfig {
        let train = &self.config.train;
        TrainingConfig::new()
            .with_num_epochs(train.epochs)
            .with_batch_size(train.batch_size)
            .with_learning_rate(train.learning_rate)
            .with_seed(train.seed)
            .with_shuffle(train.shuffle)
    }

    fn generate_options(&self, sequence_length: usize) -> GenerateOptions {
        GenerateOptions::new(self.config.generate.steps, sequence_length)
    }

    fn target(&self) -> Target<'_> {
        match (self.placement, self.pool.gpu_device()) {
            (DevicePlacement::Gpu, Some(device)) => Target::Gpu(device),
            _ => Target::Cpu(self.pool.cpu_device()),
        }
    }

    // ==================== Corpus ====================

    /// Load `data.midi_dir`.
    pub fn load_corpus(&self) -> Result<Corpus> {
        Corpus::load(&self.config.data.midi_dir)
    }

    // ==================== Training ====================

    /// Train the plain note model and save it to its checkpoint directory.
    pub fn train_note_rnn(&self, corpus: &Corpus) -> Result<TrainingReport> {
        let windows = create_windows(&corpus.note_sequences(), self.config.data.sequence_length)?;
        match self.target() {
            Target::Cpu(device) => self.fit_note_rnn::<CpuTrainingBackend>(&windows, device),
            Target::Gpu(device) => self.fit_note_rnn::<GpuTrainingBackend>(&windows, device),
        }
    }

    /// Train the conditioned model on windows labelled with their own
    /// density, rhythm and register statistics.
    pub fn train_conditioned(&self, corpus: &Corpus) -> Result<TrainingReport> {
        let windows = create_conditioned_windows(
            &corpus.note_sequences(),
            self.config.data.sequence_length,
        )?;
        match self.target() {
            Target::Cpu(device) => self.fit_conditioned::<CpuTrainingBackend>(&windows, device),
            Target::Gpu(device) => self.fit_conditioned::<GpuTrainingBackend>(&windows, device),
        }
    }

    /// Train the pitch-token model on a flat pitch stream.
    pub fn train_pitch_lstm(&self, pitches: &[u8]) -> Result<TrainingReport> {
        let vocab = Vocabulary::from_pitches(pitches);
        let tokens = vocab.encode_all(pitches)?;
        let windows = create_token_windows(tokens, self.config.data.pitch_sequence_length)?;
        info!("Pitch vocabulary: {} distinct pitches", vocab.len());

        match self.target() {
            Target::Cpu(device) => {
                self.fit_pitch_lstm::<CpuTrainingBackend>(&windows, vocab, device)
            }
            Target::Gpu(device) => {
                self.fit_pitch_lstm::<GpuTrainingBackend>(&windows, vocab, device)
            }
        }
    }

    fn fit_note_rnn<B: AutodiffBackend>(
        &self,
        windows: &WindowSet,
        device: &B::Device,
    ) -> Result<TrainingReport> {
        let model = self.note_rnn.init::<B>(device);
        let (model, report) = train_note_rnn(model, windows, &self.training_config(), device)?;
        let manifest = CheckpointManifest::note_rnn(&self.note_rnn, windows.sequence_length());
        save(model, self.checkpoint_dir(Architecture::NoteRnn), &manifest)?;
        Ok(report)
    }

    fn fit_conditioned<B: AutodiffBackend>(
        &self,
        windows: &WindowSet,
        device: &B::Device,
    ) -> Result<TrainingReport> {
        let model = self.conditioned_rnn.init::<B>(device);
        let (model, report) = train_conditioned(model, windows, &self.training_config(), device)?;
        let manifest =
            CheckpointManifest::conditioned_rnn(&self.conditioned_rnn, windows.sequence_length());
        save(model, self.checkpoint_dir(Architecture::ConditionedRnn), &manifest)?;
        Ok(report)
    }

    fn fit_pitch_lstm<B: AutodiffBackend>(
        &self,
        windows: &TokenWindows,
        vocab: Vocabulary,
        device: &B::Device,
    ) -> Result<TrainingReport> {
        let config = PitchLstmConfig {
            vocab_size: vocab.len(),
            ..self.pitch_lstm.clone()
        };
        let model = config.init::<B>(device);
        let (model, report) = train_pitch_lstm(model, windows, &self.training_config(), device)?;
        let manifest = CheckpointManifest::pitch_lstm(&config, windows.sequence_length(), vocab);
        save(model, self.checkpoint_dir(Architecture::PitchLstm), &manifest)?;
        Ok(report)
    }

    // ==================== Generation ====================

    /// Random seed window of `len` rows, reproducible from `train.seed`.
    pub fn random_seed(&self, len: usize) -> Vec<NoteFeatures> {
        let mut rng = StdRng::seed_from_u64(self.config.train.seed);
        random_seed(len, &mut rng)
    }

    /// Roll the saved note model out for `generate.steps` notes.
    ///
    /// Without a seed a random one is used. The returned notes include the seed.
    pub fn generate_notes(&self, seed: Option<&[NoteFeatures]>) -> Result<Vec<Note>> {
        let rows = match self.target() {
            Target::Cpu(device) => self.rollout_note_rnn::<CpuBackend>(seed, device)?,
            Target::Gpu(device) => self.rollout_note_rnn::<GpuBackend>(seed, device)?,
        };
        Ok(self.to_notes(rows))
    }

    /// Roll the saved conditioned model out, following `schedule` step by step.
    pub fn generate_conditioned(
        &self,
        schedule: &ConditionSchedule,
        seed: Option<&[NoteFeatures]>,
    ) -> Result<Vec<Note>> {
        let rows = match self.target() {
            Target::Cpu(device) => {
                self.rollout_conditioned::<CpuBackend>(schedule, seed, device)?
            }
            Target::Gpu(device) => {
                self.rollout_conditioned::<GpuBackend>(schedule, seed, device)?
            }
        };
        Ok(self.to_notes(rows))
    }

    /// Continue `seed` with the saved pitch model. The seed is truncated to
    /// `generate.pitch_seed_length` pitches and included in the result.
    ///
    /// Each step looks back over the last `generate.pitch_seed_length`
    /// tokens, which may be longer than the windows the model was trained on.
    pub fn generate_pitches(&self, seed: &[u8]) -> Result<Vec<u8>> {
        let seed = &seed[..seed.len().min(self.config.generate.pitch_seed_length)];
        match self.target() {
            Target::Cpu(device) => self.rollout_pitches::<CpuBackend>(seed, device),
            Target::Gpu(device) => self.rollout_pitches::<GpuBackend>(seed, device),
        }
    }

    fn rollout_note_rnn<B: Backend>(
        &self,
        seed: Option<&[NoteFeatures]>,
        device: &B::Device,
    ) -> Result<Vec<NoteFeatures>> {
        let (model, manifest) =
            load_note_rnn::<B>(self.checkpoint_dir(Architecture::NoteRnn), device)?;
        let seed = self.seed_or_random(seed, manifest.sequence_length);
        let options = self.generate_options(manifest.sequence_length);
        Ok(generate::generate_notes(&model, &seed, &options, None, device)?)
    }

    fn rollout_conditioned<B: Backend>(
        &self,
        schedule: &ConditionSchedule,
        seed: Option<&[NoteFeatures]>,
        device: &B::Device,
    ) -> Result<Vec<NoteFeatures>> {
        let (model, manifest) =
            load_conditioned_rnn::<B>(self.checkpoint_dir(Architecture::ConditionedRnn), device)?;
        let seed = self.seed_or_random(seed, manifest.sequence_length);
        let options = self.generate_options(manifest.sequence_length);
        Ok(generate::generate_notes(
            &model,
            &seed,
            &options,
            Some(schedule),
            device,
        )?)
    }

    fn rollout_pitches<B: Backend>(&self, seed: &[u8], device: &B::Device) -> Result<Vec<u8>> {
        let (model, vocab, manifest) =
            load_pitch_lstm::<B>(self.checkpoint_dir(Architecture::PitchLstm), device)?;
        debug!(
            "Pitch model trained on {}-token windows, sampling over {}",
            manifest.sequence_length, self.config.generate.pitch_seed_length
        );
        let options = self.generate_options(self.config.generate.pitch_seed_length);
        Ok(generate::generate_pitches(&model, &vocab, seed, &options, device)?)
    }

    fn seed_or_random(&self, seed: Option<&[NoteFeatures]>, len: usize) -> Vec<NoteFeatures> {
        match seed {
            Some(rows) => rows.to_vec(),
            None => self.random_seed(len),
        }
    }

    fn to_notes(&self, rows: Vec<NoteFeatures>) -> Vec<Note> {
        let velocity = self.config.generate.velocity;
        rows.into_iter()
            .map(|row| features_to_note(row, velocity))
            .collect()
    }

    // ==================== Output ====================

    /// Write model notes (timed in seconds) at the session mood's tempo.
    pub fn write_notes(&self, notes: &[Note], path: impl AsRef<Path>) -> Result<()> {
        let options = WriteOptions::default().with_tempo(self.mood().settings().tempo_bpm);
        write_notes(path.as_ref(), notes, &options)?;
        info!("Wrote {} notes to {}", notes.len(), path.as_ref().display());
        Ok(())
    }

    /// Render pitch tokens in the session mood and write them. Returns the
    /// number of notes written.
    pub fn write_pitches(&self, pitches: &[u8], path: impl AsRef<Path>) -> Result<usize> {
        let (notes, options) = render_pitches(pitches, self.mood(), DEFAULT_TOKEN_BEATS);
        if notes.is_empty() && !pitches.is_empty() {
            return Err(Error::Midi(moodtrack_midi_io::Error::MidiFileWrite(format!(
                "no pitch survived the {} transposition",
                self.mood()
            ))));
        }
        write_notes(path.as_ref(), &notes, &options)?;
        info!(
            "Wrote {} {} notes to {}",
            notes.len(),
            self.mood(),
            path.as_ref().display()
        );
        Ok(notes.len())
    }
}
