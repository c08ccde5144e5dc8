//! Monthly productivity tally arithmetic.
//!
//! The engine runs this when a project completes: annotated samples are
//! counted per division and merged into each annotator's per-month
//! running totals. Only the pure arithmetic lives here; loading
//! samples and writing user documents is the engine's job.

use serde::{Deserialize, Serialize};

use crate::division::PlannedRange;
use crate::phase::SampleStatus;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// MonthlyTotal
// ---------------------------------------------------------------------------

/// One per-annotator, per-(month, year) annotation counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// Calendar month, 1-12.
    pub month: u32,
    pub year: i32,
    pub annotation_total: i64,
}

/// Merge `count` into the entry for `(month, year)`, appending a new
/// entry if none exists. At most one entry per pair is kept.
pub fn merge_month(totals: &mut Vec<MonthlyTotal>, month: u32, year: i32, count: i64) {
    match totals.iter_mut().find(|t| t.month == month && t.year == year) {
        Some(entry) => entry.annotation_total += count,
        None => totals.push(MonthlyTotal {
            month,
            year,
            annotation_total: count,
        }),
    }
}

/// The `(month, year)` pair of a timestamp, for the current tally bucket.
pub fn month_of(now: Timestamp) -> (u32, i32) {
    use chrono::Datelike;
    (now.month(), now.year())
}

// ---------------------------------------------------------------------------
// Per-division counts
// ---------------------------------------------------------------------------

/// Count annotated samples per division.
///
/// `samples` carries `(number, status)` pairs where `number` is the
/// 1-based sample index; a sample belongs to the division whose range
/// contains `number - 1`. Returns one `(annotator_id, count)` pair per
/// division, in division order. By the time the engine calls this the
/// completion precondition guarantees every in-range sample is
/// annotated, so each count equals its division size; counting instead
/// of assuming keeps the function honest on partial inputs.
pub fn annotated_counts(
    ranges: &[PlannedRange],
    samples: &[(i64, SampleStatus)],
) -> Vec<(DbId, i64)> {
    ranges
        .iter()
        .map(|range| {
            let count = samples
                .iter()
                .filter(|(number, status)| {
                    *status == SampleStatus::Annotated && range.contains(number - 1)
                })
                .count() as i64;
            (range.annotator_id, count)
        })
        .collect()
}
