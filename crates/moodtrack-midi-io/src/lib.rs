//! MIDI file I/O for moodtrack.
//!
//! Reads Standard MIDI Files into note sequences with timing in seconds and
//! writes generated notes back out. Parsing and encoding are done by `midly`.

pub mod error;
pub use error::{Error, Result};

mod tempo;
pub use tempo::TempoMap;

pub(crate) mod file;
pub use file::{ParsedMidiFile, DRUM_CHANNEL};

mod corpus;
pub use corpus::{load_dir, note_sequences, pitch_corpus, LoadedMidi};

mod writer;
pub use writer::{
    render_pitches, to_smf_bytes, write_notes, WriteOptions, DEFAULT_TOKEN_BEATS,
    TICKS_PER_QUARTER,
};
