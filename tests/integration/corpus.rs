//! Corpus loading tests

use crate::helpers::*;
use moodtrack::{read_pitches_json, Corpus, Error};

#[test]
fn test_corpus_loads_every_file() {
    let root = corpus_fixture();
    let corpus = Corpus::load(root.path().join("data")).unwrap();

    assert_eq!(corpus.len(), 3);
    assert_eq!(corpus.note_count(), 48);

    let sequences = corpus.note_sequences();
    assert_eq!(sequences.len(), 3);
    assert!(sequences.iter().all(|s| s.len() == 16));
    // Sorted by onset
    assert!(sequences[0].windows(2).all(|w| w[0].start <= w[1].start));
}

#[test]
fn test_pitch_stream_follows_file_order() {
    let root = corpus_fixture();
    let corpus = Corpus::load(root.path().join("data")).unwrap();

    let pitches = corpus.pitches();
    assert_eq!(pitches.len(), 48);
    assert_eq!(&pitches[..4], &[60, 64, 67, 72]);
    assert_eq!(&pitches[16..20], &[62, 66, 69, 74]);

    let vocab = corpus.vocabulary();
    assert_eq!(vocab.pitches().first(), Some(&60));
    assert_eq!(vocab.pitches().last(), Some(&76));
}

#[test]
fn test_drums_are_not_melody() {
    let root = corpus_fixture();
    let data = root.path().join("data");
    write_drum_file(&data, "drums.mid");

    let corpus = Corpus::load(&data).unwrap();
    // The drum file loads, but contributes nothing melodic
    assert_eq!(corpus.len(), 4);
    assert_eq!(corpus.note_sequences().len(), 3);
    assert!(!corpus.pitches().contains(&36));
}

#[test]
fn test_unreadable_files_are_skipped() {
    let root = corpus_fixture();
    let data = root.path().join("data");
    std::fs::write(data.join("broken.mid"), b"not a midi file").unwrap();
    std::fs::write(data.join("notes.txt"), b"ignored").unwrap();

    let corpus = Corpus::load(&data).unwrap();
    assert_eq!(corpus.len(), 3);
}

#[test]
fn test_directory_without_midi_is_empty_corpus() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("readme.txt"), b"no music here").unwrap();
    assert!(matches!(
        Corpus::load(root.path()),
        Err(Error::EmptyCorpus(_))
    ));
}

#[test]
fn test_extract_writes_json_array() {
    let root = corpus_fixture();
    let corpus = Corpus::load(root.path().join("data")).unwrap();

    let out = root.path().join("extracted/notes.json");
    let count = corpus.write_pitches_json(&out).unwrap();
    assert_eq!(count, 48);

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("[60,64,67,72,"));
    assert_eq!(read_pitches_json(&out).unwrap(), corpus.pitches());
}
