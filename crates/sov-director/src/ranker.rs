//! Deterministic drama ranking, the layer that never fails on non-empty input.

use sov_core::Event;

use crate::error::{DirectorError, DirectorResult};

/// Candidates ordered by descending drama weight; ties keep input order.
pub fn ordered<'a>(candidates: &[&'a Event]) -> Vec<&'a Event> {
    let mut sorted = candidates.to_vec();
    // Stable sort, so equal weights stay in catalog order.
    sorted.sort_by(|a, b| b.drama_weight.cmp(&a.drama_weight));
    sorted
}

/// The most dramatic candidate, earliest first on ties.
///
/// `year` is only used to label the error on empty input.
pub fn rank<'a>(candidates: &[&'a Event], year: u32) -> DirectorResult<&'a Event> {
    candidates
        .iter()
        .copied()
        .reduce(|best, e| if e.drama_weight > best.drama_weight { e } else { best })
        .ok_or(DirectorError::NoFeasibleEvent { year })
}
