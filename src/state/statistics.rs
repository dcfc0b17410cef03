// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Statistics
//!
//! Counters are stored in the mining context and incremented by the search
//! as it goes. Frequent patterns are additionally counted by shape and size.

use crate::config::PatternKind;
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{Display, EnumCount as EnumCountMacro, EnumIter};
use tracing::info;

#[derive(EnumCountMacro, EnumIter, Display, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Counters {
    FramesVisited,
    JoinsAttempted,
    JoinsSucceeded,
    CanonicalChecks,
    CanonicalRejections,
    PrunedSubtrees,
    PatternsEmitted,
    BackboneFlushes,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Statistics {
    stats: [u64; Counters::COUNT],
    /// Frequent patterns per node count, indexed by size.
    paths: Vec<u64>,
    trees: Vec<u64>,
    graphs: Vec<u64>,
}

impl Statistics {
    pub fn new() -> Self {
        Statistics::default()
    }

    /// Increment the specified counter by 1.
    pub fn increment(&mut self, counter: Counters) {
        self.stats[counter as usize] += 1;
    }

    /// Get the current value of the specified counter.
    pub fn get(&self, counter: Counters) -> u64 {
        self.stats[counter as usize]
    }

    /// Counts one frequent pattern of the given shape.
    pub fn record_frequent(&mut self, kind: PatternKind, size: usize) {
        let histogram = match kind {
            PatternKind::Path => &mut self.paths,
            PatternKind::Tree => &mut self.trees,
            PatternKind::Graph => &mut self.graphs,
        };
        if histogram.len() <= size {
            histogram.resize(size + 1, 0);
        }
        histogram[size] += 1;
    }

    pub fn histogram(&self, kind: PatternKind) -> &[u64] {
        match kind {
            PatternKind::Path => &self.paths,
            PatternKind::Tree => &self.trees,
            PatternKind::Graph => &self.graphs,
        }
    }

    pub fn frequent_total(&self, kind: PatternKind) -> u64 {
        self.histogram(kind).iter().sum()
    }

    /// Adds the counts of another run to these.
    pub fn merge(&mut self, other: &Statistics) {
        for (mine, theirs) in self.stats.iter_mut().zip(other.stats) {
            *mine += theirs;
        }
        for kind in PatternKind::iter() {
            let source = other.histogram(kind);
            let target = match kind {
                PatternKind::Path => &mut self.paths,
                PatternKind::Tree => &mut self.trees,
                PatternKind::Graph => &mut self.graphs,
            };
            if target.len() < source.len() {
                target.resize(source.len(), 0);
            }
            for (t, s) in target.iter_mut().zip(source) {
                *t += s;
            }
        }
    }

    pub fn log_summary(&self) {
        for counter in Counters::iter() {
            info!(counter = %counter, value = self.get(counter), "search statistics");
        }
        for kind in PatternKind::iter() {
            info!(
                kind = %kind,
                total = self.frequent_total(kind),
                by_size = ?self.histogram(kind),
                "frequent patterns"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let mut stats = Statistics::new();
        assert_eq!(stats.get(Counters::JoinsAttempted), 0);
        stats.increment(Counters::JoinsAttempted);
        stats.increment(Counters::JoinsAttempted);
        assert_eq!(stats.get(Counters::JoinsAttempted), 2);
        assert_eq!(stats.get(Counters::JoinsSucceeded), 0);
    }

    #[test]
    fn test_histogram_grows_with_size() {
        let mut stats = Statistics::new();
        stats.record_frequent(PatternKind::Tree, 4);
        stats.record_frequent(PatternKind::Tree, 4);
        stats.record_frequent(PatternKind::Path, 2);
        assert_eq!(stats.histogram(PatternKind::Tree), &[0, 0, 0, 0, 2]);
        assert_eq!(stats.frequent_total(PatternKind::Path), 1);
        assert!(stats.histogram(PatternKind::Graph).is_empty());
    }

    #[test]
    fn test_merge_adds_counters_and_histograms() {
        let mut a = Statistics::new();
        a.increment(Counters::FramesVisited);
        a.record_frequent(PatternKind::Path, 2);
        let mut b = Statistics::new();
        b.increment(Counters::FramesVisited);
        b.record_frequent(PatternKind::Path, 3);
        a.merge(&b);
        assert_eq!(a.get(Counters::FramesVisited), 2);
        assert_eq!(a.histogram(PatternKind::Path), &[0, 0, 1, 1]);
    }
}
