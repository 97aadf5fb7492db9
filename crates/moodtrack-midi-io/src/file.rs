//! MIDI file ingestion
//!
//! Parses Standard MIDI Files with `midly` and pairs note-on/note-off events
//! into [`Note`]s with absolute timing in seconds, following every tempo
//! change in the file.

use crate::error::{Error, Result};
use crate::tempo::TempoMap;
use midly::{MidiMessage, Smf, Timing, Track, TrackEventKind};
use moodtrack_core::{sort_by_start, Note, NoteSequence};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use tracing::debug;

/// General MIDI percussion channel (channel 10, zero-based 9).
pub const DRUM_CHANNEL: u8 = 9;

/// A parsed MIDI file reduced to its notes.
#[derive(Debug, Clone)]
pub struct ParsedMidiFile {
    /// Every closed note of every track, sorted by onset
    pub notes: Vec<Note>,

    /// Non-drum notes struck alone, sorted by onset. Notes that start on the
    /// same tick as another note of their track and channel form a chord and
    /// are left out.
    pub melody: Vec<Note>,

    /// Ticks per quarter note
    pub ticks_per_beat: u16,

    /// Tempo at the start of the file in BPM (120 if none)
    pub tempo_bpm: f64,

    /// End of the last note in seconds
    pub duration_seconds: f64,

    pub track_count: usize,
}

impl ParsedMidiFile {
    /// Load and parse a MIDI file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::parse(&data)
    }

    /// Parse MIDI file from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        let smf = Smf::parse(data)?;

        let ticks_per_beat = match smf.header.timing {
            Timing::Metrical(tpb) => tpb.as_int(),
            Timing::Timecode(_, _) => {
                return Err(Error::MidiUnsupportedTiming);
            }
        };

        debug!(
            "Parsing MIDI file: {} tracks, {} ticks per beat",
            smf.tracks.len(),
            ticks_per_beat
        );

        let tempo_map = TempoMap::from_tracks(&smf.tracks, ticks_per_beat);

        let mut notes = Vec::new();
        let mut melody = Vec::new();
        for track in smf.tracks.iter() {
            let timed = Self::parse_track(track, &tempo_map);
            melody.extend(struck_alone(&timed));
            notes.extend(timed.into_iter().map(|(_, note)| note));
        }
        sort_by_start(&mut notes);
        sort_by_start(&mut melody);

        let duration_seconds = notes.iter().map(Note::end).fold(0.0, f64::max);

        debug!(
            "Parsed {} notes, {} tempo changes, duration: {:.2}s",
            notes.len(),
            tempo_map.tempo_changes(),
            duration_seconds
        );

        Ok(Self {
            notes,
            melody,
            ticks_per_beat,
            tempo_bpm: tempo_map.initial_bpm(),
            duration_seconds,
            track_count: smf.tracks.len(),
        })
    }

    /// Pair note-ons with note-offs, oldest open note first.
    ///
    /// Zero-length notes and notes still open at the end of the track are
    /// dropped. Each note comes with its onset tick.
    fn parse_track(track: &Track, tempo_map: &TempoMap) -> Vec<(u64, Note)> {
        let mut open: HashMap<(u8, u8), VecDeque<(u64, u8)>> = HashMap::new();
        let mut notes = Vec::new();
        let mut current_tick = 0u64;

        for event in track.iter() {
            current_tick += event.delta.as_int() as u64;

            let TrackEventKind::Midi { channel, message } = &event.kind else {
                continue;
            };
            let channel = channel.as_int();

            match message {
                MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                    open.entry((channel, key.as_int()))
                        .or_default()
                        .push_back((current_tick, vel.as_int()));
                }
                // NoteOn with velocity 0 is a NoteOff
                MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                    let Some(queue) = open.get_mut(&(channel, key.as_int())) else {
                        continue;
                    };
                    let Some((start_tick, velocity)) = queue.pop_front() else {
                        continue;
                    };
                    if start_tick == current_tick {
                        continue;
                    }
                    let start = tempo_map.seconds_at(start_tick);
                    let end = tempo_map.seconds_at(current_tick);
                    notes.push((
                        start_tick,
                        Note {
                            pitch: key.as_int(),
                            start,
                            duration: end - start,
                            velocity,
                            channel,
                        },
                    ));
                }
                _ => {}
            }
        }

        notes
    }

    /// Non-drum notes sorted by onset.
    pub fn melodic_notes(&self) -> NoteSequence {
        self.notes
            .iter()
            .filter(|n| n.channel != DRUM_CHANNEL)
            .copied()
            .collect()
    }

    /// Pitches of [`melody`](Self::melody) in onset order.
    pub fn pitches(&self) -> Vec<u8> {
        self.melody.iter().map(|n| n.pitch).collect()
    }
}

/// Non-drum notes of one track that share their onset tick with no other
/// note on the same channel.
fn struck_alone(timed: &[(u64, Note)]) -> Vec<Note> {
    let mut onsets: HashMap<(u8, u64), usize> = HashMap::new();
    for (tick, note) in timed {
        *onsets.entry((note.channel, *tick)).or_default() += 1;
    }

    timed
        .iter()
        .filter(|(tick, note)| {
            note.channel != DRUM_CHANNEL && onsets.get(&(note.channel, *tick)) == Some(&1)
        })
        .map(|(_, note)| *note)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use midly::num::{u15, u24, u28, u4, u7};
    use midly::{Format, Header, MetaMessage, TrackEvent};

    fn midi(channel: u8, message: MidiMessage, delta: u32) -> TrackEvent<'static> {
        TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi {
                channel: u4::new(channel),
                message,
            },
        }
    }

    fn on(channel: u8, key: u8, vel: u8, delta: u32) -> TrackEvent<'static> {
        midi(
            channel,
            MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(vel),
            },
            delta,
        )
    }

    fn off(channel: u8, key: u8, delta: u32) -> TrackEvent<'static> {
        midi(
            channel,
            MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            },
            delta,
        )
    }

    fn end_of_track() -> TrackEvent<'static> {
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        }
    }

    fn encode(tracks: Vec<Vec<TrackEvent<'static>>>) -> Vec<u8> {
        let mut smf = Smf::new(Header::new(
            Format::Parallel,
            Timing::Metrical(u15::new(480)),
        ));
        smf.tracks = tracks
            .into_iter()
            .map(|mut track| {
                track.push(end_of_track());
                track
            })
            .collect();
        let mut buf = Vec::new();
        smf.write_std(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_parse_empty_midi() {
        // Minimal valid MIDI file (header only)
        let data = [
            // MThd
            0x4D, 0x54, 0x68, 0x64, // Header length (6)
            0x00, 0x00, 0x00, 0x06, // Format 0
            0x00, 0x00, // 1 track
            0x00, 0x01, // 480 ticks per beat
            0x01, 0xE0, // MTrk
            0x4D, 0x54, 0x72, 0x6B, // Track length (4)
            0x00, 0x00, 0x00, 0x04, // End of track
            0x00, 0xFF, 0x2F, 0x00,
        ];

        let file = ParsedMidiFile::parse(&data).unwrap();
        assert_eq!(file.ticks_per_beat, 480);
        assert!(file.notes.is_empty());
        assert_relative_eq!(file.tempo_bpm, 120.0);
    }

    #[test]
    fn test_note_pairing_and_seconds() {
        let data = encode(vec![vec![
            on(0, 60, 90, 0),
            // velocity 0 closes the note
            on(0, 60, 0, 480),
            on(0, 64, 80, 0),
            off(0, 64, 960),
        ]]);

        let file = ParsedMidiFile::parse(&data).unwrap();
        assert_eq!(file.notes.len(), 2);
        assert_eq!(file.notes[0].pitch, 60);
        assert_eq!(file.notes[0].velocity, 90);
        assert_relative_eq!(file.notes[0].duration, 0.5);
        assert_relative_eq!(file.notes[1].start, 0.5);
        assert_relative_eq!(file.notes[1].duration, 1.0);
        assert_relative_eq!(file.duration_seconds, 1.5);
    }

    #[test]
    fn test_overlapping_same_pitch_is_fifo() {
        let data = encode(vec![vec![
            on(0, 60, 100, 0),
            on(0, 60, 50, 240),
            off(0, 60, 240),
            off(0, 60, 480),
        ]]);

        let file = ParsedMidiFile::parse(&data).unwrap();
        assert_eq!(file.notes.len(), 2);
        // First note-off closes the first note-on
        assert_eq!(file.notes[0].velocity, 100);
        assert_relative_eq!(file.notes[0].duration, 0.5);
        assert_eq!(file.notes[1].velocity, 50);
        assert_relative_eq!(file.notes[1].duration, 0.75);
    }

    #[test]
    fn test_drums_and_dangling_notes_excluded() {
        let data = encode(vec![
            vec![on(9, 36, 100, 0), off(9, 36, 120), on(0, 72, 100, 0)],
            vec![on(1, 48, 100, 0), off(1, 48, 480), on(1, 50, 100, 0), off(1, 50, 0)],
        ]);

        let file = ParsedMidiFile::parse(&data).unwrap();
        // drum note + bass note; the dangling 72 and the zero-length 50 are dropped
        assert_eq!(file.notes.len(), 2);
        assert_eq!(file.melodic_notes().len(), 1);
        assert_eq!(file.pitches(), vec![48]);
    }

    #[test]
    fn test_tempo_track_applies_to_all_tracks() {
        let tempo = TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(1_000_000))),
        };
        let data = encode(vec![vec![tempo], vec![on(0, 60, 100, 480), off(0, 60, 480)]]);

        let file = ParsedMidiFile::parse(&data).unwrap();
        assert_relative_eq!(file.tempo_bpm, 60.0);
        assert_relative_eq!(file.notes[0].start, 1.0);
        assert_relative_eq!(file.notes[0].duration, 1.0);
    }

    #[test]
    fn test_chords_left_out_of_pitches() {
        let data = encode(vec![
            vec![
                on(0, 60, 100, 0),
                off(0, 60, 480),
                // C-E-G-B struck together
                on(0, 60, 100, 0),
                on(0, 64, 100, 0),
                on(0, 67, 100, 0),
                on(0, 71, 100, 0),
                off(0, 60, 480),
                off(0, 64, 0),
                off(0, 67, 0),
                off(0, 71, 0),
                on(0, 62, 100, 0),
                off(0, 62, 480),
            ],
            // Same tick on another channel and track is not a chord
            vec![on(1, 48, 100, 960), off(1, 48, 480)],
        ]);

        let file = ParsedMidiFile::parse(&data).unwrap();
        assert_eq!(file.notes.len(), 7);
        assert_eq!(file.melodic_notes().len(), 7);
        assert_eq!(file.pitches(), vec![60, 62, 48]);
        assert_relative_eq!(file.melody[1].start, 1.0);
    }

    #[test]
    fn test_timecode_rejected() {
        let mut smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Timecode(midly::Fps::Fps25, 40),
        ));
        smf.tracks.push(vec![end_of_track()]);
        let mut buf = Vec::new();
        smf.write_std(&mut buf).unwrap();

        assert!(matches!(
            ParsedMidiFile::parse(&buf),
            Err(Error::MidiUnsupportedTiming)
        ));
    }
}
