//! Ranking and top-K selection of momentum candidates.

use std::cmp::Ordering;

use crate::domain::scorer::MomentumCandidate;

/// Best first: descending momentum, ties by ascending universe index.
pub fn compare_candidates(a: &MomentumCandidate, b: &MomentumCandidate) -> Ordering {
    b.momentum
        .total_cmp(&a.momentum)
        .then_with(|| a.universe_index.cmp(&b.universe_index))
}

/// Order `candidates` best first and keep at most `k`. Never pads.
pub fn rank_top(mut candidates: Vec<MomentumCandidate>, k: usize) -> Vec<MomentumCandidate> {
    candidates.sort_by(compare_candidates);
    candidates.truncate(k);
    candidates
}
