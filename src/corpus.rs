//! Training corpus loaded from a directory of MIDI files.

use crate::error::{Error, Result};
use moodtrack_core::{NoteSequence, Vocabulary};
use moodtrack_midi_io::{load_dir, note_sequences, pitch_corpus, LoadedMidi};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Corpus {
    dir: PathBuf,
    files: Vec<LoadedMidi>,
}

impl Corpus {
    /// Load every MIDI file in `dir`. Fails if none could be read.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let files = load_dir(&dir)?;
        if files.is_empty() {
            return Err(Error::EmptyCorpus(dir));
        }

        let corpus = Self { dir, files };
        info!(
            "Loaded {} MIDI files ({} melodic notes) from {}",
            corpus.len(),
            corpus.note_count(),
            corpus.dir.display()
        );
        Ok(corpus)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn files(&self) -> &[LoadedMidi] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn note_count(&self) -> usize {
        self.files.iter().map(|f| f.file.melodic_notes().len()).sum()
    }

    /// One sorted melodic sequence per non-empty file.
    pub fn note_sequences(&self) -> Vec<NoteSequence> {
        note_sequences(&self.files)
    }

    /// Pitch stream of the whole corpus, file after file.
    pub fn pitches(&self) -> Vec<u8> {
        pitch_corpus(&self.files)
    }

    pub fn vocabulary(&self) -> Vocabulary {
        Vocabulary::from_pitches(&self.pitches())
    }

    /// Dump the pitch stream as a JSON array of MIDI note numbers.
    pub fn write_pitches_json(&self, path: impl AsRef<Path>) -> Result<usize> {
        let pitches = self.pitches();
        write_pitches_json(path, &pitches)?;
        Ok(pitches.len())
    }
}

pub fn write_pitches_json(path: impl AsRef<Path>, pitches: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string(pitches)?)?;
    Ok(())
}

pub fn read_pitches_json(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
