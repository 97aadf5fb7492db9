//! Pitch vocabulary for the token model.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sorted set of pitches seen in a corpus, indexed densely from zero.
///
/// Serialized as its pitch list; the lookup table is rebuilt on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PitchList")]
pub struct Vocabulary {
    pitches: Vec<u8>,
    #[serde(skip)]
    index: BTreeMap<u8, usize>,
}

#[derive(Deserialize)]
struct PitchList {
    pitches: Vec<u8>,
}

impl From<PitchList> for Vocabulary {
    fn from(list: PitchList) -> Self {
        Self::from_pitches(&list.pitches)
    }
}

impl Vocabulary {
    pub fn from_pitches(corpus: &[u8]) -> Self {
        let mut pitches = corpus.to_vec();
        pitches.sort_unstable();
        pitches.dedup();
        Self::from_sorted(pitches)
    }

    fn from_sorted(pitches: Vec<u8>) -> Self {
        let index = pitches.iter().enumerate().map(|(i, &p)| (p, i)).collect();
        Self { pitches, index }
    }

    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    pub fn pitches(&self) -> &[u8] {
        &self.pitches
    }

    pub fn encode(&self, pitch: u8) -> Option<usize> {
        self.index.get(&pitch).copied()
    }

    pub fn decode(&self, token: usize) -> Option<u8> {
        self.pitches.get(token).copied()
    }

    pub fn encode_all(&self, pitches: &[u8]) -> Result<Vec<usize>> {
        pitches
            .iter()
            .map(|&p| self.encode(p).ok_or(Error::UnknownPitch(p)))
            .collect()
    }
}
