//! Test helpers and fixtures for moodtrack integration tests
//!
//! Every fixture works inside a scratch directory: a small corpus of
//! generated MIDI files, a configuration pointing at it, and a CPU session
//! with tiny models so training finishes in well under a second.

#![allow(dead_code)]

use moodtrack::midi::{write_notes, WriteOptions, DRUM_CHANNEL};
use moodtrack::models::{ConditionedRnnConfig, NoteRnnConfig, PitchLstmConfig};
use moodtrack::prelude::*;
use std::path::Path;

/// Window length used by test configurations.
pub const TEST_SEQUENCE_LENGTH: usize = 4;

/// Pitch-token window length used by test configurations.
pub const TEST_PITCH_SEQUENCE_LENGTH: usize = 6;

/// Generation steps used by test configurations.
pub const TEST_STEPS: usize = 10;

/// C major arpeggio, one note every quarter second.
pub fn arpeggio(len: usize, root: u8) -> Vec<Note> {
    let shape = [0u8, 4, 7, 12];
    (0..len)
        .map(|i| Note::new(root + shape[i % 4], i as f64 * 0.25, 0.25))
        .collect()
}

/// Write `files` melodic MIDI files of `notes_per_file` notes each into `dir`.
pub fn write_corpus(dir: &Path, files: usize, notes_per_file: usize) {
    for i in 0..files {
        let notes = arpeggio(notes_per_file, 60 + i as u8 * 2);
        write_notes(
            dir.join(format!("song_{i}.mid")),
            &notes,
            &WriteOptions::default(),
        )
        .expect("Failed to write corpus file");
    }
}

/// Write a drum-only file (channel 10) into `dir`.
pub fn write_drum_file(dir: &Path, name: &str) {
    let hits: Vec<Note> = (0..8).map(|i| Note::new(36, i as f64 * 0.5, 0.1)).collect();
    let options = WriteOptions {
        channel: DRUM_CHANNEL,
        ..WriteOptions::default()
    };
    write_notes(dir.join(name), &hits, &options).expect("Failed to write drum file");
}

/// Configuration rooted at `root`, with tiny lengths and two epochs.
pub fn test_config(root: &Path) -> MoodtrackConfig {
    let mut config = MoodtrackConfig::default();
    config.data.midi_dir = root.join("data");
    config.data.sequence_length = TEST_SEQUENCE_LENGTH;
    config.data.pitch_sequence_length = TEST_PITCH_SEQUENCE_LENGTH;
    config.train.epochs = 2;
    config.train.batch_size = 8;
    config.train.learning_rate = 1.0e-2;
    config.train.model_dir = root.join("models");
    config.generate.steps = TEST_STEPS;
    config.generate.pitch_seed_length = 8;
    config.generate.output_dir = root.join("generated");
    config
}

/// CPU session with one-layer, eight-unit models.
pub fn test_session(config: MoodtrackConfig) -> Session {
    Session::builder()
        .config(config)
        .placement(DevicePlacement::Cpu)
        .note_rnn(NoteRnnConfig::new().with_hidden_size(8).with_num_layers(1))
        .conditioned_rnn(
            ConditionedRnnConfig::new()
                .with_hidden_size(8)
                .with_num_layers(1),
        )
        .pitch_lstm(
            PitchLstmConfig::new(0)
                .with_embedding_size(4)
                .with_hidden_size(8)
                .with_num_layers(1),
        )
        .build()
        .expect("Failed to create test session")
}

/// Scratch directory holding a three-file corpus under `data/`.
pub fn corpus_fixture() -> tempfile::TempDir {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let data = root.path().join("data");
    std::fs::create_dir_all(&data).expect("Failed to create data dir");
    write_corpus(&data, 3, 16);
    root
}
