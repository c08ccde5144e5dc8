//! The division planner: even partitioning of samples across annotators.
//!
//! Runs once, when a project transitions from `open-for-joining` to
//! `annotating`. Join order is significant: when the sample count does
//! not divide evenly, the earliest joiners receive the extra samples.

use crate::types::DbId;

/// A planned sample-index range for one annotator.
///
/// `start_sample..=end_sample` is inclusive over 0-based sample
/// indices. An empty range (more annotators than samples) is encoded as
/// `end_sample = start_sample - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRange {
    pub annotator_id: DbId,
    pub start_sample: i64,
    pub end_sample: i64,
}

impl PlannedRange {
    /// Number of samples in this range.
    pub fn len(&self) -> i64 {
        self.end_sample - self.start_sample + 1
    }

    /// Whether the range contains no samples.
    pub fn is_empty(&self) -> bool {
        self.end_sample < self.start_sample
    }

    /// Whether the 0-based sample index falls inside this range.
    pub fn contains(&self, index: i64) -> bool {
        index >= self.start_sample && index <= self.end_sample
    }
}

/// Partition `[0, number_of_samples)` across the annotators as evenly
/// as possible, preserving join order.
///
/// The first `number_of_samples % k` annotators get one extra sample;
/// ranges are contiguous, non-overlapping, cover the whole index space,
/// and no two range sizes differ by more than 1. With more annotators
/// than samples the trailing annotators receive empty ranges.
pub fn compute_ranges(number_of_samples: i64, annotator_ids: &[DbId]) -> Vec<PlannedRange> {
    if annotator_ids.is_empty() {
        return Vec::new();
    }
    let k = annotator_ids.len() as i64;
    let base = number_of_samples / k;
    let remainder = number_of_samples % k;

    let mut offset = 0i64;
    annotator_ids
        .iter()
        .enumerate()
        .map(|(i, &annotator_id)| {
            let size = if (i as i64) < remainder { base + 1 } else { base };
            let range = PlannedRange {
                annotator_id,
                start_sample: offset,
                end_sample: offset + size - 1,
            };
            offset += size;
            range
        })
        .collect()
}
