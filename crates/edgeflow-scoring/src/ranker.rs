//! Deterministic ranking of collected device scores.

use std::cmp::Ordering;

use edgeflow_core::types::DeviceScore;

/// Sort scores descending, best candidate first.
///
/// The sort is stable: candidates with equal scores keep the order in
/// which their reports arrived, so a tie is won by the earliest arrival
/// and re-ranking an already-ranked list changes nothing.
pub fn rank(mut scores: Vec<DeviceScore>) -> Vec<DeviceScore> {
    scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scores
}
