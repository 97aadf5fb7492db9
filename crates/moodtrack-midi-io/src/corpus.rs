//! Directory-level loading of training material.

use crate::error::{Error, Result};
use crate::file::ParsedMidiFile;
use moodtrack_core::NoteSequence;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A MIDI file loaded from disk, with its origin.
#[derive(Debug, Clone)]
pub struct LoadedMidi {
    pub path: PathBuf,
    pub file: ParsedMidiFile,
}

fn is_midi(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("mid") || e.eq_ignore_ascii_case("midi"))
        .unwrap_or(false)
}

/// Parse every `.mid`/`.midi` file directly inside `dir`, in file name order.
///
/// Files that fail to parse are logged and skipped.
pub fn load_dir(dir: impl AsRef<Path>) -> Result<Vec<LoadedMidi>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::NotADirectory(dir.display().to_string()));
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_midi(p))
        .collect();
    paths.sort();

    let mut loaded = Vec::with_capacity(paths.len());
    for path in paths {
        match ParsedMidiFile::load(&path) {
            Ok(file) => {
                debug!("Loaded {} ({} notes)", path.display(), file.notes.len());
                loaded.push(LoadedMidi { path, file });
            }
            Err(e) => warn!("Failed to load {}: {}", path.display(), e),
        }
    }

    debug!("Loaded {} MIDI files from {}", loaded.len(), dir.display());
    Ok(loaded)
}

/// One melodic note sequence per file; files without notes are dropped.
pub fn note_sequences(files: &[LoadedMidi]) -> Vec<NoteSequence> {
    files
        .iter()
        .map(|f| f.file.melodic_notes())
        .filter(|seq| !seq.is_empty())
        .collect()
}

/// All melodic pitches of all files, concatenated in file order.
pub fn pitch_corpus(files: &[LoadedMidi]) -> Vec<u8> {
    files.iter().flat_map(|f| f.file.pitches()).collect()
}
