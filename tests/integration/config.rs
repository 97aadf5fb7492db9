//! Configuration files driving a session

use crate::helpers::*;
use moodtrack::prelude::*;

#[test]
fn test_toml_file_configures_session() {
    let root = corpus_fixture();
    let text = format!(
        r#"
[data]
midi_dir = "{data}"
sequence_length = 4

[train]
epochs = 1
batch_size = 16
model_dir = "{models}"

[generate]
steps = 5
mood = "calm"
"#,
        data = root.path().join("data").display(),
        models = root.path().join("models").display(),
    );
    let path = root.path().join("moodtrack.toml");
    std::fs::write(&path, text).unwrap();

    let config = MoodtrackConfig::load(&path).unwrap();
    assert_eq!(config.generate.mood, Mood::Calm);
    // Unlisted fields keep their defaults
    assert_eq!(config.train.learning_rate, 1.0e-3);
    assert_eq!(config.generate.velocity, 100);

    let session = test_session(config);
    assert_eq!(session.training_config().num_epochs, 1);
    assert_eq!(session.training_config().batch_size, 16);
    assert_eq!(session.training_config().seed, 42);

    let corpus = session.load_corpus().unwrap();
    let report = session.train_note_rnn(&corpus).unwrap();
    assert_eq!(report.epoch_losses.len(), 1);
    assert_eq!(report.batches_per_epoch, 3);

    let notes = session.generate_notes(None).unwrap();
    assert_eq!(notes.len(), 4 + 5);
}

#[test]
fn test_invalid_config_rejected_at_load() {
    let root = tempfile::tempdir().unwrap();
    let path = root.path().join("bad.toml");
    std::fs::write(&path, "[train]\nbatch_size = 0\n").unwrap();
    assert!(MoodtrackConfig::load(&path).is_err());

    std::fs::write(&path, "[generate]\nmood = \"sleepy\"\n").unwrap();
    assert!(MoodtrackConfig::load(&path).is_err());
}

#[test]
fn test_checkpoints_are_per_architecture() {
    let root = corpus_fixture();
    let session = test_session(test_config(root.path()));
    let note = session.checkpoint_dir(Architecture::NoteRnn);
    let conditioned = session.checkpoint_dir(Architecture::ConditionedRnn);
    let pitch = session.checkpoint_dir(Architecture::PitchLstm);

    assert!(note.starts_with(root.path().join("models")));
    assert_ne!(note, conditioned);
    assert_ne!(conditioned, pitch);
    assert!(pitch.ends_with("pitch_lstm"));
}
