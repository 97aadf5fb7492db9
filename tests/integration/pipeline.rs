//! End-to-end workflows: train, checkpoint, generate, write

use crate::helpers::*;
use approx::assert_relative_eq;
use moodtrack::midi::ParsedMidiFile;
use moodtrack::models::{
    generate_pitches, load_pitch_lstm, read_manifest, CpuBackend, GenerateOptions, NdArrayDevice,
    MANIFEST_FILE,
};
use moodtrack::prelude::*;
use moodtrack::Error;

#[test]
fn test_note_rnn_workflow() {
    let root = corpus_fixture();
    let session = test_session(test_config(root.path()));
    let corpus = session.load_corpus().unwrap();

    let report = session.train_note_rnn(&corpus).unwrap();
    assert_eq!(report.epoch_losses.len(), 2);
    assert!(report.final_loss().unwrap().is_finite());

    let dir = session.checkpoint_dir(Architecture::NoteRnn);
    assert!(dir.join(MANIFEST_FILE).exists());
    let manifest = read_manifest(&dir).unwrap();
    assert_eq!(manifest.architecture, Architecture::NoteRnn);
    assert_eq!(manifest.sequence_length, TEST_SEQUENCE_LENGTH);

    let notes = session.generate_notes(None).unwrap();
    assert_eq!(notes.len(), TEST_SEQUENCE_LENGTH + TEST_STEPS);
    assert!(notes.iter().all(|n| n.pitch <= 127 && n.duration > 0.0));
    assert!(notes.iter().all(|n| n.velocity == 100));

    let out = root.path().join("generated/note.mid");
    session.write_notes(&notes, &out).unwrap();
    let parsed = ParsedMidiFile::load(&out).unwrap();
    assert_eq!(parsed.notes.len(), notes.len());
}

#[test]
fn test_seeded_generation_keeps_seed() {
    let root = corpus_fixture();
    let session = test_session(test_config(root.path()));
    let corpus = session.load_corpus().unwrap();
    session.train_note_rnn(&corpus).unwrap();

    let seed = [[60.0, 0.0, 0.5], [64.0, 0.5, 0.5]];
    let notes = session.generate_notes(Some(&seed)).unwrap();
    assert_eq!(notes.len(), TEST_SEQUENCE_LENGTH + TEST_STEPS);
    // Left padding repeats the first seed row
    assert_eq!(notes[0].pitch, 60);
    assert_eq!(notes[1].pitch, 60);
    assert_eq!(notes[2].pitch, 60);
    assert_eq!(notes[3].pitch, 64);
}

#[test]
fn test_conditioned_workflow_with_three_act_schedule() {
    let root = corpus_fixture();
    let session = test_session(test_config(root.path()));
    let corpus = session.load_corpus().unwrap();

    let report = session.train_conditioned(&corpus).unwrap();
    assert_eq!(report.epoch_losses.len(), 2);

    let schedule = ConditionSchedule::three_act(TEST_STEPS);
    let notes = session.generate_conditioned(&schedule, None).unwrap();
    assert_eq!(notes.len(), TEST_SEQUENCE_LENGTH + TEST_STEPS);

    let out = root.path().join("generated/adaptive.mid");
    session.write_notes(&notes, &out).unwrap();
    let parsed = ParsedMidiFile::load(&out).unwrap();
    assert_eq!(parsed.notes.len(), notes.len());
}

#[test]
fn test_pitch_workflow_renders_mood() {
    let root = corpus_fixture();
    let mut config = test_config(root.path());
    config.generate.mood = Mood::Battle;
    let session = test_session(config);
    let corpus = session.load_corpus().unwrap();
    let pitches = corpus.pitches();

    session.train_pitch_lstm(&pitches).unwrap();
    let manifest = read_manifest(session.checkpoint_dir(Architecture::PitchLstm)).unwrap();
    let vocab = manifest.vocabulary.unwrap();
    assert_eq!(vocab.len(), corpus.vocabulary().len());

    let generated = session.generate_pitches(&pitches).unwrap();
    // Seed is cut to pitch_seed_length
    assert_eq!(generated.len(), 8 + TEST_STEPS);
    assert_eq!(&generated[..8], &pitches[..8]);
    assert!(generated.iter().all(|p| vocab.encode(*p).is_some()));

    let out = root.path().join("generated/adaptive_battle.mid");
    let written = session.write_pitches(&generated, &out).unwrap();
    assert_eq!(written, generated.len());

    let parsed = ParsedMidiFile::load(&out).unwrap();
    assert_relative_eq!(parsed.tempo_bpm, 140.0, epsilon = 0.01);
    // Battle transposes up three semitones
    assert_eq!(parsed.pitches()[0], pitches[0] + 3);
}

#[test]
fn test_pitch_sampling_looks_back_further_than_training() {
    let root = corpus_fixture();
    let mut config = test_config(root.path());
    config.generate.pitch_seed_length = 12;
    let session = test_session(config);
    let pitches = session.load_corpus().unwrap().pitches();
    session.train_pitch_lstm(&pitches).unwrap();

    let dir = session.checkpoint_dir(Architecture::PitchLstm);
    let device = NdArrayDevice::default();
    let (model, vocab, manifest) = load_pitch_lstm::<CpuBackend>(&dir, &device).unwrap();
    assert_eq!(manifest.sequence_length, TEST_PITCH_SEQUENCE_LENGTH);

    let generated = session.generate_pitches(&pitches).unwrap();
    assert_eq!(generated.len(), 12 + TEST_STEPS);

    let options = GenerateOptions::new(TEST_STEPS, 12);
    let expected = generate_pitches(&model, &vocab, &pitches[..12], &options, &device).unwrap();
    assert_eq!(generated, expected);
}

#[test]
fn test_generate_without_checkpoint_fails() {
    let root = corpus_fixture();
    let session = test_session(test_config(root.path()));
    assert!(matches!(
        session.generate_notes(None),
        Err(Error::Model(moodtrack::models::Error::Io(_)))
    ));
}

#[test]
fn test_corpus_shorter_than_window() {
    let root = tempfile::tempdir().unwrap();
    let data = root.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    write_corpus(&data, 2, TEST_SEQUENCE_LENGTH);

    let session = test_session(test_config(root.path()));
    let corpus = session.load_corpus().unwrap();
    assert!(matches!(
        session.train_note_rnn(&corpus),
        Err(Error::Model(moodtrack::models::Error::EmptyDataset(_)))
    ));
}

#[test]
fn test_unknown_seed_pitch() {
    let root = corpus_fixture();
    let session = test_session(test_config(root.path()));
    let corpus = session.load_corpus().unwrap();
    session.train_pitch_lstm(&corpus.pitches()).unwrap();

    let err = session.generate_pitches(&[61]).unwrap_err();
    assert!(matches!(
        err,
        Error::Model(moodtrack::models::Error::Core(moodtrack::core::Error::UnknownPitch(61)))
    ));
}
