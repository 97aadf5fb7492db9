//! Tick to seconds conversion across tempo changes.

use midly::{MetaMessage, Track, TrackEventKind};

/// 120 BPM, the SMF default when no tempo event is present.
pub const DEFAULT_US_PER_QUARTER: u32 = 500_000;

#[derive(Debug, Clone, Copy, PartialEq)]
struct TempoSegment {
    tick: u64,
    /// Seconds elapsed at `tick`
    seconds: f64,
    us_per_quarter: u32,
}

/// Piecewise-linear map from absolute ticks to seconds.
#[derive(Debug, Clone)]
pub struct TempoMap {
    ticks_per_beat: u16,
    segments: Vec<TempoSegment>,
}

impl TempoMap {
    /// Collect every Set Tempo event of every track.
    pub fn from_tracks(tracks: &[Track], ticks_per_beat: u16) -> Self {
        let mut changes: Vec<(u64, u32)> = Vec::new();
        for track in tracks {
            let mut tick = 0u64;
            for event in track.iter() {
                tick += event.delta.as_int() as u64;
                if let TrackEventKind::Meta(MetaMessage::Tempo(tempo)) = &event.kind {
                    changes.push((tick, tempo.as_int()));
                }
            }
        }
        Self::from_changes(changes, ticks_per_beat)
    }

    /// Build from `(tick, microseconds per quarter)` pairs in any order.
    pub fn from_changes(mut changes: Vec<(u64, u32)>, ticks_per_beat: u16) -> Self {
        changes.sort_by_key(|&(tick, _)| tick);

        let mut segments = vec![TempoSegment {
            tick: 0,
            seconds: 0.0,
            us_per_quarter: DEFAULT_US_PER_QUARTER,
        }];

        for (tick, us_per_quarter) in changes {
            if us_per_quarter == 0 {
                continue;
            }
            let last = segments[segments.len() - 1];
            let seconds =
                last.seconds + Self::span(last.us_per_quarter, tick - last.tick, ticks_per_beat);
            if tick == last.tick {
                // Later event at the same tick wins
                segments.pop();
            }
            segments.push(TempoSegment {
                tick,
                seconds,
                us_per_quarter,
            });
        }

        Self {
            ticks_per_beat: ticks_per_beat.max(1),
            segments,
        }
    }

    fn span(us_per_quarter: u32, ticks: u64, ticks_per_beat: u16) -> f64 {
        ticks as f64 * us_per_quarter as f64 / (1_000_000.0 * ticks_per_beat.max(1) as f64)
    }

    pub fn seconds_at(&self, tick: u64) -> f64 {
        let idx = self.segments.partition_point(|s| s.tick <= tick);
        let seg = &self.segments[idx.saturating_sub(1)];
        seg.seconds + Self::span(seg.us_per_quarter, tick - seg.tick, self.ticks_per_beat)
    }

    /// Tempo in effect at tick 0, in BPM.
    pub fn initial_bpm(&self) -> f64 {
        let seg = self
            .segments
            .iter()
            .take_while(|s| s.tick == 0)
            .last()
            .unwrap_or(&self.segments[0]);
        60_000_000.0 / seg.us_per_quarter as f64
    }

    pub fn tempo_changes(&self) -> usize {
        self.segments.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_tempo() {
        let map = TempoMap::from_changes(vec![], 480);
        assert_relative_eq!(map.seconds_at(480), 0.5);
        assert_relative_eq!(map.initial_bpm(), 120.0);
    }

    #[test]
    fn test_tempo_change() {
        // 60 BPM from beat 2 onwards
        let map = TempoMap::from_changes(vec![(960, 1_000_000)], 480);
        assert_relative_eq!(map.seconds_at(960), 1.0);
        assert_relative_eq!(map.seconds_at(1440), 2.0);
        assert_relative_eq!(map.initial_bpm(), 120.0);
        assert_eq!(map.tempo_changes(), 1);
    }

    #[test]
    fn test_tempo_at_zero_replaces_default() {
        let map = TempoMap::from_changes(vec![(0, 1_000_000)], 96);
        assert_relative_eq!(map.seconds_at(96), 1.0);
        assert_relative_eq!(map.initial_bpm(), 60.0);
    }
}
