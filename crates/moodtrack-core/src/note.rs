//! Note events and the three-feature view the models train on.

use serde::{Deserialize, Serialize};

/// Shortest duration a rendered note may have, in seconds.
pub const MIN_NOTE_DURATION: f64 = 0.01;

/// Pitch used when a rollout has no seed at all (middle C).
pub const DEFAULT_SEED_FEATURES: NoteFeatures = [60.0, 0.0, 0.5];

/// `(pitch, start, duration)` as fed to and produced by the note models.
pub type NoteFeatures = [f32; 3];

/// A single note with absolute timing in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// MIDI note number (0-127)
    pub pitch: u8,

    /// Onset in seconds from the start of the file
    pub start: f64,

    /// Length in seconds
    pub duration: f64,

    /// Note-on velocity (0-127)
    pub velocity: u8,

    /// MIDI channel (0-15)
    pub channel: u8,
}

impl Note {
    pub fn new(pitch: u8, start: f64, duration: f64) -> Self {
        Self {
            pitch,
            start,
            duration,
            velocity: 100,
            channel: 0,
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    pub fn features(&self) -> NoteFeatures {
        [self.pitch as f32, self.start as f32, self.duration as f32]
    }
}

/// Notes of one file, sorted by onset.
pub type NoteSequence = Vec<Note>;

/// Sort notes by onset, keeping the original order for equal onsets.
pub fn sort_by_start(notes: &mut [Note]) {
    notes.sort_by(|a, b| a.start.total_cmp(&b.start));
}

/// Coerce an arbitrary model output row into exactly three finite features.
///
/// Short rows are zero-padded, long rows are truncated and NaN/inf become 0.
pub fn sanitize_features(values: &[f32]) -> NoteFeatures {
    let mut out = [0.0f32; 3];
    for (slot, v) in out.iter_mut().zip(values.iter()) {
        *slot = if v.is_finite() { *v } else { 0.0 };
    }
    out
}

/// Turn a predicted feature row back into a playable note.
pub fn features_to_note(features: NoteFeatures, velocity: u8) -> Note {
    let [pitch, start, duration] = sanitize_features(&features);
    Note {
        pitch: pitch.round().clamp(0.0, 127.0) as u8,
        start: (start as f64).max(0.0),
        duration: (duration as f64).max(MIN_NOTE_DURATION),
        velocity: velocity.min(127),
        channel: 0,
    }
}
