//! Standard MIDI File output for generated note sequences.
//!
//! Output is SMF Format 0: one track holding the tempo, a program change and
//! the notes. Notes are placed at absolute ticks derived from their onset in
//! seconds at a single tempo.

use crate::error::{Error, Result};
use midly::num::{u15, u24, u28, u4, u7};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use moodtrack_core::{Mood, Note, MIN_NOTE_DURATION};
use std::path::Path;
use tracing::{debug, warn};

/// Ticks per quarter note in MIDI output.
pub const TICKS_PER_QUARTER: u16 = 480;

/// Largest delta a variable-length quantity can hold.
const MAX_DELTA: u64 = (1 << 28) - 1;

/// Length of one rendered pitch token, in quarter notes.
pub const DEFAULT_TOKEN_BEATS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteOptions {
    pub tempo_bpm: f64,
    /// General MIDI program (0 = acoustic grand piano)
    pub program: u8,
    pub channel: u8,
    pub ticks_per_beat: u16,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            tempo_bpm: 120.0,
            program: 0,
            channel: 0,
            ticks_per_beat: TICKS_PER_QUARTER,
        }
    }
}

impl WriteOptions {
    pub fn with_tempo(mut self, tempo_bpm: f64) -> Self {
        self.tempo_bpm = tempo_bpm;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.tempo_bpm.is_finite() && self.tempo_bpm > 0.0) {
            return Err(Error::InvalidTempo(self.tempo_bpm));
        }
        // Tempo meta events are 24-bit microseconds per quarter
        let us = 60_000_000.0 / self.tempo_bpm;
        if !(1.0..=16_777_215.0).contains(&us) {
            return Err(Error::InvalidTempo(self.tempo_bpm));
        }
        Ok(())
    }

    fn ticks(&self, seconds: f64) -> u64 {
        let beats = seconds.max(0.0) * self.tempo_bpm / 60.0;
        (beats * self.ticks_per_beat as f64).round() as u64
    }
}

/// Encode notes as an in-memory SMF.
pub fn to_smf_bytes(notes: &[Note], options: &WriteOptions) -> Result<Vec<u8>> {
    options.validate()?;

    let smf = notes_to_smf(notes, options);
    let mut buf = Vec::new();
    smf.write_std(&mut buf)
        .map_err(|e| Error::MidiFileWrite(e.to_string()))?;
    Ok(buf)
}

/// Encode notes and write them to `path`, creating parent directories.
pub fn write_notes(path: impl AsRef<Path>, notes: &[Note], options: &WriteOptions) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_smf_bytes(notes, options)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &bytes)?;
    debug!("Wrote {} notes to {}", notes.len(), path.display());
    Ok(())
}

fn notes_to_smf(notes: &[Note], options: &WriteOptions) -> Smf<'static> {
    let channel = u4::new(options.channel.min(15));
    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(options.ticks_per_beat)),
    ));

    // (tick, is_note_on, key, velocity); offs sort before ons at the same tick
    let mut timeline: Vec<(u64, bool, u8, u8)> = Vec::with_capacity(notes.len() * 2);
    for note in notes {
        let key = note.pitch.min(127);
        let start = options.ticks(note.start);
        let end = options
            .ticks(note.start + note.duration.max(MIN_NOTE_DURATION))
            .max(start + 1);
        timeline.push((start, true, key, note.velocity.clamp(1, 127)));
        timeline.push((end, false, key, 0));
    }
    timeline.sort_by_key(|&(tick, is_on, _, _)| (tick, is_on));

    let mut track: Track<'static> = Vec::with_capacity(timeline.len() + 3);
    let us_per_quarter = (60_000_000.0 / options.tempo_bpm).round() as u32;
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(us_per_quarter))),
    });
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::ProgramChange {
                program: u7::new(options.program.min(127)),
            },
        },
    });

    let mut last_tick = 0u64;
    for (tick, is_on, key, vel) in timeline {
        let delta = (tick - last_tick).min(MAX_DELTA) as u32;
        last_tick = tick;
        let message = if is_on {
            MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(vel),
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            }
        };
        track.push(TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi { channel, message },
        });
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);
    smf
}

/// Lay out pitch tokens back-to-back in a mood's tempo and key.
///
/// Each token lasts `token_beats` quarter notes. Pitches pushed outside
/// 0-127 by the transposition are skipped and do not advance time.
pub fn render_pitches(pitches: &[u8], mood: Mood, token_beats: f64) -> (Vec<Note>, WriteOptions) {
    let settings = mood.settings();
    let options = WriteOptions::default().with_tempo(settings.tempo_bpm);
    let step = token_beats * 60.0 / settings.tempo_bpm;
    let shift = mood.semitones();

    let mut notes = Vec::with_capacity(pitches.len());
    let mut skipped = 0usize;
    for &pitch in pitches {
        let transposed = pitch as i32 + shift;
        if !(0..=127).contains(&transposed) {
            skipped += 1;
            continue;
        }
        notes.push(Note::new(transposed as u8, notes.len() as f64 * step, step));
    }

    if skipped > 0 {
        warn!("Skipped {} pitches outside the MIDI range after transposing", skipped);
    }

    (notes, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::ParsedMidiFile;
    use approx::assert_relative_eq;

    #[test]
    fn test_write_then_read_timing() {
        let notes = vec![
            Note::new(60, 0.0, 0.5),
            Note::new(64, 0.5, 0.25),
            Note::new(67, 1.0, 1.0),
        ];
        let bytes = to_smf_bytes(&notes, &WriteOptions::default().with_tempo(90.0)).unwrap();
        let parsed = ParsedMidiFile::parse(&bytes).unwrap();

        assert_relative_eq!(parsed.tempo_bpm, 90.0, epsilon = 1e-3);
        assert_eq!(parsed.notes.len(), 3);
        for (written, read) in notes.iter().zip(parsed.notes.iter()) {
            assert_eq!(written.pitch, read.pitch);
            assert_relative_eq!(written.start, read.start, epsilon = 1e-3);
            assert_relative_eq!(written.duration, read.duration, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_repeated_pitch_back_to_back() {
        // The off of the first note and the on of the second share a tick
        let notes = vec![Note::new(60, 0.0, 0.5), Note::new(60, 0.5, 0.5)];
        let bytes = to_smf_bytes(&notes, &WriteOptions::default()).unwrap();
        let parsed = ParsedMidiFile::parse(&bytes).unwrap();
        assert_eq!(parsed.notes.len(), 2);
        assert_relative_eq!(parsed.notes[1].start, 0.5, epsilon = 1e-3);
    }

    #[test]
    fn test_tiny_duration_is_kept() {
        let notes = vec![Note::new(60, 0.0, 0.0)];
        let bytes = to_smf_bytes(&notes, &WriteOptions::default()).unwrap();
        let parsed = ParsedMidiFile::parse(&bytes).unwrap();
        assert_eq!(parsed.notes.len(), 1);
        assert!(parsed.notes[0].duration > 0.0);
    }

    #[test]
    fn test_invalid_tempo() {
        let result = to_smf_bytes(&[], &WriteOptions::default().with_tempo(0.0));
        assert!(matches!(result, Err(Error::InvalidTempo(_))));
    }

    #[test]
    fn test_write_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.mid");
        write_notes(&path, &[Note::new(72, 0.0, 0.5)], &WriteOptions::default()).unwrap();
        assert_eq!(ParsedMidiFile::load(&path).unwrap().notes.len(), 1);
    }

    #[test]
    fn test_render_pitches_for_mood() {
        let (notes, options) = render_pitches(&[60, 62, 126], Mood::Battle, DEFAULT_TOKEN_BEATS);
        assert_relative_eq!(options.tempo_bpm, 140.0);
        // 126 + 3 leaves the MIDI range
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].pitch, 63);
        assert_eq!(notes[1].pitch, 65);
        let step = 0.5 * 60.0 / 140.0;
        assert_relative_eq!(notes[1].start, step);
        assert_relative_eq!(notes[1].duration, step);

        let (calm, _) = render_pitches(&[1, 60], Mood::Calm, DEFAULT_TOKEN_BEATS);
        assert_eq!(calm.len(), 1);
        assert_eq!(calm[0].pitch, 58);
    }
}
