//! Per-step conditioning signals for adaptive generation.

use crate::mood::Mood;

/// Length of every condition vector.
pub const CONDITION_SIZE: usize = 3;

/// `[combat_intensity, tempo_factor, tension]`
pub type ConditionVector = [f32; CONDITION_SIZE];

/// Used when nothing else is known about the game state.
pub const NEUTRAL_CONDITION: ConditionVector = [1.0, 1.0, 0.0];

/// Condition vectors indexed by generation step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionSchedule {
    steps: Vec<ConditionVector>,
}

impl ConditionSchedule {
    pub fn new(steps: Vec<ConditionVector>) -> Self {
        Self { steps }
    }

    pub fn constant(condition: ConditionVector, steps: usize) -> Self {
        Self {
            steps: vec![condition; steps],
        }
    }

    /// Concatenate mood segments, each held for its number of steps.
    pub fn from_moods(segments: &[(Mood, usize)]) -> Self {
        let steps = segments
            .iter()
            .flat_map(|&(mood, len)| std::iter::repeat(mood.condition()).take(len))
            .collect();
        Self { steps }
    }

    /// Calm for the first third, battle for the second, exploration for the rest.
    pub fn three_act(steps: usize) -> Self {
        let first = steps / 3;
        let second = 2 * steps / 3;
        Self::from_moods(&[
            (Mood::Calm, first),
            (Mood::Battle, second - first),
            (Mood::Exploration, steps - second),
        ])
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Condition for `step`; the last entry holds once the schedule runs out.
    pub fn at(&self, step: usize) -> ConditionVector {
        self.steps
            .get(step)
            .or_else(|| self.steps.last())
            .copied()
            .unwrap_or(NEUTRAL_CONDITION)
    }
}
