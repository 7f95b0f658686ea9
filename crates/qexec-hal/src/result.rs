//! Raw backend output.
//!
//! Bit strings follow the group convention documented in
//! [`crate::program`]: groups separated by a space, rightmost character of
//! a group is its lowest classical bit. Decoders must tolerate the
//! separators being absent.

use num_complex::Complex64;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Measurement counts from a sampling run.
///
/// Maps bit strings to occurrence counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    /// Map from bit string to count.
    counts: FxHashMap<String, u64>,
}

impl Counts {
    /// Create empty counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create counts from an iterator of (bitstring, count) pairs.
    /// Duplicate bitstrings are accumulated (summed), consistent with `insert()`.
    pub fn from_pairs(iter: impl IntoIterator<Item = (impl Into<String>, u64)>) -> Self {
        let mut counts = Self::new();
        for (k, v) in iter {
            counts.insert(k, v);
        }
        counts
    }

    /// Insert a count for a bitstring.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        let key = bitstring.into();
        *self.counts.entry(key).or_default() += count;
    }

    /// Get the count for a bitstring.
    pub fn get(&self, bitstring: &str) -> u64 {
        self.counts.get(bitstring).copied().unwrap_or(0)
    }

    /// Iterate over (bitstring, count) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.counts.iter()
    }

    /// Get the total number of shots.
    pub fn total_shots(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Get the most frequent bitstring.
    pub fn most_frequent(&self) -> Option<(&String, &u64)> {
        self.counts.iter().max_by_key(|&(_, count)| count)
    }

    /// Get counts ordered by bitstring, for deterministic traversal.
    pub fn sorted_by_outcome(&self) -> Vec<(&String, &u64)> {
        let mut items: Vec<_> = self.counts.iter().collect();
        items.sort_by(|a, b| a.0.cmp(b.0));
        items
    }

    /// Get the number of unique bitstrings.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if counts are empty.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(String, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut counts = Self::new();
        for (key, value) in iter {
            counts.insert(key, value);
        }
        counts
    }
}

/// What a backend returns from one execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawOutput {
    /// Outcome histogram (aggregate sampling).
    Counts(Counts),
    /// One outcome per shot, in shot order (memory sampling).
    Memory(Vec<String>),
    /// Dense amplitudes or flattened density matrix.
    Dense(Vec<Complex64>),
}

impl RawOutput {
    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            RawOutput::Counts(_) => "counts",
            RawOutput::Memory(_) => "memory",
            RawOutput::Dense(_) => "dense",
        }
    }

    /// Number of shots represented, for sampling output.
    pub fn shots(&self) -> Option<u64> {
        match self {
            RawOutput::Counts(counts) => Some(counts.total_shots()),
            RawOutput::Memory(memory) => Some(memory.len() as u64),
            RawOutput::Dense(_) => None,
        }
    }
}
